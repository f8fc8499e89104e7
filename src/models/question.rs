use serde::Serialize;

/// Which shape a question record has.
///
/// The discriminants are part of the C ABI (`QuestionTypeC` in
/// `include/question_bank.h`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice = 0,
    TrueFalse = 1,
    /// Out-of-range index, or a record that matched neither shape.
    Unknown = 2,
}

/// A multiple-choice question with exactly one correct option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultipleChoice {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl MultipleChoice {
    /// Build a multiple-choice question, checking that `options` is
    /// non-empty and `correct_index` points into it.
    pub fn new(prompt: String, options: Vec<String>, correct_index: usize) -> Result<Self, String> {
        if options.is_empty() {
            return Err("multiple-choice question has no options".to_string());
        }
        if correct_index >= options.len() {
            return Err(format!(
                "correct answer index {} is out of range for {} options",
                correct_index,
                options.len()
            ));
        }

        Ok(Self {
            prompt,
            options,
            correct_index,
        })
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_index).map(String::as_str)
    }
}

/// One statement of a true/false block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub text: String,
    pub is_true: bool,
}

/// A block of statements, each to be judged true or false.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TrueFalse {
    /// Optional heading shown above the statements.
    pub prompt: Option<String>,
    pub statements: Vec<Statement>,
}

impl TrueFalse {
    pub fn statement_texts(&self) -> Vec<String> {
        self.statements.iter().map(|s| s.text.clone()).collect()
    }

    pub fn truth_values(&self) -> Vec<bool> {
        self.statements.iter().map(|s| s.is_true).collect()
    }
}

/// A single record of the question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Question {
    MultipleChoice(MultipleChoice),
    TrueFalse(TrueFalse),
    /// A record that could not be read as either shape. Keeps its position
    /// in the bank so indices match the source document.
    Unknown { reason: String },
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        match self {
            Question::MultipleChoice(_) => QuestionKind::MultipleChoice,
            Question::TrueFalse(_) => QuestionKind::TrueFalse,
            Question::Unknown { .. } => QuestionKind::Unknown,
        }
    }

    /// The prompt of a multiple-choice question or the heading of a
    /// true/false block, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Question::MultipleChoice(mc) => Some(&mc.prompt),
            Question::TrueFalse(tf) => tf.prompt.as_deref(),
            Question::Unknown { .. } => None,
        }
    }

    pub fn as_multiple_choice(&self) -> Option<&MultipleChoice> {
        match self {
            Question::MultipleChoice(mc) => Some(mc),
            _ => None,
        }
    }

    pub fn as_true_false(&self) -> Option<&TrueFalse> {
        match self {
            Question::TrueFalse(tf) => Some(tf),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Question::Unknown { .. })
    }
}
