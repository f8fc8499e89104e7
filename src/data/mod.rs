//! Reading question documents from disk.

mod error;
mod loader;
mod options;

pub use error::LoadError;
pub use loader::{load_questions, load_questions_with, parse_questions};
pub use options::{LoadOptions, UnknownRecordPolicy};
