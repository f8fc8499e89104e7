//! The question store.
//!
//! Holds at most one loaded bank and replaces it wholesale on every
//! successful load. All read accessors hand out owned copies, so nothing a
//! caller holds can alias the bank.

use std::path::Path;

use tracing::{debug, warn};

use crate::data::{LoadError, LoadOptions, load_questions_with};
use crate::models::{Question, QuestionKind};

/// A single-slot repository for the current question bank.
#[derive(Debug, Default)]
pub struct QuestionStore {
    questions: Vec<Question>,
    /// Bumped whenever the bank changes: every successful load and every clear.
    generation: u64,
    last_error: Option<String>,
}

impl QuestionStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            questions: Vec::new(),
            generation: 0,
            last_error: None,
        }
    }

    /// Load a YAML document and replace the current bank with it.
    ///
    /// On error the current bank is left exactly as it was.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        self.load_with(path, &LoadOptions::default())
    }

    pub fn load_with<P: AsRef<Path>>(
        &mut self,
        path: P,
        options: &LoadOptions,
    ) -> Result<(), LoadError> {
        match load_questions_with(path, options) {
            Ok(questions) => {
                self.replace(questions);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "load failed, keeping current questions");
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Install a new bank, discarding the old one.
    pub fn replace(&mut self, questions: Vec<Question>) {
        debug!(
            previous = self.questions.len(),
            next = questions.len(),
            "replacing question bank"
        );
        self.questions = questions;
        self.generation += 1;
        self.last_error = None;
    }

    /// Drop the current bank, leaving the store empty.
    pub fn clear(&mut self) {
        self.questions = Vec::new();
        self.generation += 1;
        self.last_error = None;
    }

    pub(crate) fn record_failure(&mut self, err: &LoadError) {
        self.last_error = Some(err.to_string());
    }

    /// Message of the most recent failed load, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Changes whenever the bank is replaced or cleared.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn count(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn type_of(&self, index: usize) -> QuestionKind {
        self.get(index).map_or(QuestionKind::Unknown, Question::kind)
    }

    /// Prompt of a multiple-choice question, or heading of a true/false
    /// block if it has one.
    pub fn text_of(&self, index: usize) -> Option<String> {
        self.get(index)?.text().map(str::to_owned)
    }

    pub fn options_of(&self, index: usize) -> Option<Vec<String>> {
        let mc = self.get(index)?.as_multiple_choice()?;
        Some(mc.options.clone())
    }

    /// `None` unless the question at `index` is multiple choice.
    pub fn correct_option_index_of(&self, index: usize) -> Option<usize> {
        let mc = self.get(index)?.as_multiple_choice()?;
        Some(mc.correct_index)
    }

    pub fn statements_of(&self, index: usize) -> Option<Vec<String>> {
        let tf = self.get(index)?.as_true_false()?;
        Some(tf.statement_texts())
    }

    /// Truth values in the same order and of the same length as
    /// [`statements_of`](Self::statements_of).
    pub fn statement_truth_of(&self, index: usize) -> Option<Vec<bool>> {
        let tf = self.get(index)?.as_true_false()?;
        Some(tf.truth_values())
    }
}
