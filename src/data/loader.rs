use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info, warn};

use super::{LoadError, LoadOptions, UnknownRecordPolicy};
use crate::models::{MultipleChoice, Question, Statement, TrueFalse};

const QUESTIONS_KEY: &str = "questions";
const TYPE_KEY: &str = "type";
const SOURCE_IN_MEMORY: &str = "<memory>";

/// Load questions from a YAML file with the default options.
pub fn load_questions<P: AsRef<Path>>(path: P) -> Result<Vec<Question>, LoadError> {
    load_questions_with(path, &LoadOptions::default())
}

/// Load questions from a YAML file.
///
/// The file is read and parsed in full before anything is returned, so a
/// caller that only swaps in the result on `Ok` never observes a partial
/// bank.
pub fn load_questions_with<P: AsRef<Path>>(
    path: P,
    options: &LoadOptions,
) -> Result<Vec<Question>, LoadError> {
    let path = path.as_ref();

    let source =
        fs::read_to_string(path).map_err(|err| LoadError::from_io(path.to_path_buf(), err))?;

    let questions = parse_document(&source, path, options)?;
    let invalid = questions.iter().filter(|q| !q.is_valid()).count();
    info!(
        path = %path.display(),
        count = questions.len(),
        invalid,
        "loaded questions"
    );

    Ok(questions)
}

/// Parse questions from an in-memory YAML document.
pub fn parse_questions(source: &str, options: &LoadOptions) -> Result<Vec<Question>, LoadError> {
    parse_document(source, Path::new(SOURCE_IN_MEMORY), options)
}

fn parse_document(
    source: &str,
    path: &Path,
    options: &LoadOptions,
) -> Result<Vec<Question>, LoadError> {
    let document: Value = serde_yaml::from_str(source).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let records = top_level_records(document, path)?;
    let mut questions = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        match classify(record) {
            Ok(question) => questions.push(question),
            Err(reason) => match options.unknown_records {
                UnknownRecordPolicy::Surface => {
                    warn!(index, %reason, "question record kept as unknown");
                    questions.push(Question::Unknown { reason });
                }
                UnknownRecordPolicy::Skip => {
                    warn!(index, %reason, "question record skipped");
                }
                UnknownRecordPolicy::Reject => {
                    return Err(LoadError::UnsupportedRecord {
                        path: path.to_path_buf(),
                        index,
                        reason,
                    });
                }
            },
        }
    }

    debug!(records = records.len(), kept = questions.len(), "parsed document");
    Ok(questions)
}

/// Accepts either a bare list of records or a mapping with a `questions`
/// list. An empty document is an empty bank.
fn top_level_records(document: Value, path: &Path) -> Result<Vec<Value>, LoadError> {
    let structure = |message: String| LoadError::Structure {
        path: PathBuf::from(path),
        message,
    };

    match document {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(records) => Ok(records),
        Value::Mapping(mut map) => match map.remove(QUESTIONS_KEY) {
            Some(Value::Sequence(records)) => Ok(records),
            Some(Value::Null) => Ok(Vec::new()),
            Some(other) => Err(structure(format!(
                "`{}` must be a list, found {}",
                QUESTIONS_KEY,
                Kind(&other)
            ))),
            None => Err(structure(format!(
                "expected a list of questions or a `{}` key",
                QUESTIONS_KEY
            ))),
        },
        other => Err(structure(format!(
            "expected a list of questions, found {}",
            Kind(&other)
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    MultipleChoice,
    TrueFalse,
}

impl Shape {
    fn from_tag(tag: &str) -> Option<Self> {
        let normalized: String = tag
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' ' | '/'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "multiplechoice" | "mc" | "choice" => Some(Shape::MultipleChoice),
            "truefalse" | "tf" | "statements" => Some(Shape::TrueFalse),
            _ => None,
        }
    }

    fn infer(map: &Mapping) -> Result<Self, String> {
        match map.get(TYPE_KEY) {
            Some(Value::String(tag)) => {
                Shape::from_tag(tag).ok_or_else(|| format!("unknown question type `{}`", tag))
            }
            Some(other) => Err(format!("`type` must be text, found {}", Kind(other))),
            None if map.contains_key("options") => Ok(Shape::MultipleChoice),
            None if map.contains_key("statements") => Ok(Shape::TrueFalse),
            None => Err("record has neither `options` nor `statements`".to_string()),
        }
    }
}

/// Turn one record into a question, or explain why it can't be one.
fn classify(record: &Value) -> Result<Question, String> {
    let Value::Mapping(map) = record else {
        return Err(format!("expected a mapping, found {}", Kind(record)));
    };

    match Shape::infer(map)? {
        Shape::MultipleChoice => {
            let raw: RawMultipleChoice =
                serde_yaml::from_value(record.clone()).map_err(|e| e.to_string())?;
            let options: Vec<String> = raw.options.into_iter().map(|t| t.0).collect();
            check_text("question", &raw.question.0)?;
            for (i, option) in options.iter().enumerate() {
                check_text(&format!("option {}", i), option)?;
            }
            MultipleChoice::new(raw.question.0, options, raw.correct_answer)
                .map(Question::MultipleChoice)
        }
        Shape::TrueFalse => {
            let raw: RawTrueFalse =
                serde_yaml::from_value(record.clone()).map_err(|e| e.to_string())?;
            let statements = raw
                .statements
                .into_iter()
                .enumerate()
                .map(|(i, s)| -> Result<Statement, String> {
                    let statement = s
                        .into_statement()
                        .map_err(|e| format!("statement {}: {}", i, e))?;
                    check_text(&format!("statement {}", i), &statement.text)?;
                    Ok(statement)
                })
                .collect::<Result<Vec<_>, _>>()?;
            let prompt = raw.question.map(|t| t.0);
            if let Some(prompt) = &prompt {
                check_text("question", prompt)?;
            }
            Ok(Question::TrueFalse(TrueFalse { prompt, statements }))
        }
    }
}

/// Every text field must be representable as a C string.
fn check_text(field: &str, text: &str) -> Result<(), String> {
    if text.contains('\0') {
        return Err(format!("{} contains a NUL byte", field));
    }
    Ok(())
}

#[derive(Deserialize)]
struct RawMultipleChoice {
    #[serde(alias = "text", alias = "prompt")]
    question: Text,
    options: Vec<Text>,
    #[serde(alias = "answer", alias = "correct_index")]
    correct_answer: usize,
}

#[derive(Deserialize)]
struct RawTrueFalse {
    #[serde(default, alias = "text", alias = "prompt")]
    question: Option<Text>,
    statements: Vec<RawStatement>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStatement {
    /// `{ statement: "...", answer: true }`
    Full {
        #[serde(alias = "text")]
        statement: Text,
        #[serde(alias = "correct", alias = "is_true")]
        answer: bool,
    },
    /// `"...": true`
    Short(BTreeMap<Text, bool>),
}

impl RawStatement {
    fn into_statement(self) -> Result<Statement, String> {
        match self {
            RawStatement::Full { statement, answer } => Ok(Statement {
                text: statement.0,
                is_true: answer,
            }),
            RawStatement::Short(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "expected a single `statement: true|false` pair, found {} entries",
                        map.len()
                    ));
                }
                let (text, is_true) = map
                    .into_iter()
                    .next()
                    .ok_or_else(|| "empty statement".to_string())?;
                Ok(Statement {
                    text: text.0,
                    is_true,
                })
            }
        }
    }
}

/// A text field that also accepts plain YAML numbers and booleans, so
/// `options: [3, 4, 5]` reads as the strings "3", "4", "5".
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct Text(String);

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Text(s)),
            Value::Number(n) => Ok(Text(n.to_string())),
            Value::Bool(b) => Ok(Text(b.to_string())),
            other => Err(de::Error::custom(format!(
                "expected text, found {}",
                Kind(&other)
            ))),
        }
    }
}

/// Short description of a YAML node for error messages.
struct Kind<'a>(&'a Value);

impl fmt::Display for Kind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.0 {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "text",
            Value::Sequence(_) => "a list",
            Value::Mapping(_) => "a mapping",
            Value::Tagged(_) => "a tagged value",
        };
        f.write_str(name)
    }
}
