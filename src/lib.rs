//! # question-bank
//!
//! A question bank engine: loads multiple-choice and true/false questions
//! from a YAML file and serves them by index, to Rust callers through
//! [`QuestionStore`] and to C hosts through the functions in [`ffi`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use question_bank::{QuestionKind, QuestionStore, LoadError};
//!
//! fn main() -> Result<(), LoadError> {
//!     let mut store = QuestionStore::new();
//!     store.load("questions.yaml")?;
//!
//!     for i in 0..store.count() {
//!         if store.type_of(i) == QuestionKind::MultipleChoice {
//!             println!("{:?}: {:?}", store.text_of(i), store.options_of(i));
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Document format
//!
//! ```yaml
//! - question: "2+2=?"
//!   options: ["3", "4", "5"]
//!   correct_answer: 1
//! - statements:
//!     - statement: "Paris is the capital of France"
//!       answer: true
//!     - "The sun is cold": false
//! ```

mod data;
pub mod ffi;
pub mod logging;
mod models;
pub mod report;
mod store;

use std::io;

use thiserror::Error;

pub use data::{
    LoadError, LoadOptions, UnknownRecordPolicy, load_questions, load_questions_with,
    parse_questions,
};
pub use models::{MultipleChoice, Question, QuestionKind, Statement, TrueFalse};
pub use store::QuestionStore;

/// Error type for the command-line host.
#[derive(Debug, Error)]
pub enum Error {
    /// Error loading questions from file.
    #[error("failed to load questions: {0}")]
    Load(#[from] LoadError),
    /// Error writing the report.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Error encoding the bank as JSON.
    #[error("failed to encode questions: {0}")]
    Json(#[from] serde_json::Error),
}
