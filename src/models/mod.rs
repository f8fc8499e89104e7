mod question;

pub use question::{MultipleChoice, Question, QuestionKind, Statement, TrueFalse};
