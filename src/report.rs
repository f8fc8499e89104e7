//! Plain-text and JSON listings of a loaded bank, walking it by index the
//! same way a GUI host does.

use std::io::Write;

use crate::Error;
use crate::models::{Question, QuestionKind};
use crate::store::QuestionStore;

/// Write every question in `store` as readable text.
pub fn write_text<W: Write>(store: &QuestionStore, out: &mut W) -> Result<(), Error> {
    let total = store.count();
    writeln!(out, "Total questions found: {}", total)?;

    for i in 0..total {
        writeln!(out)?;
        writeln!(out, "--- Question {} ---", i + 1)?;
        match store.text_of(i) {
            Some(text) => writeln!(out, "Question Text: {}", text)?,
            None => writeln!(out, "Question Text: (none)")?,
        }

        match store.type_of(i) {
            QuestionKind::MultipleChoice => {
                writeln!(out, "Type: Multiple Choice")?;
                writeln!(out, "Options:")?;
                for (j, option) in store.options_of(i).unwrap_or_default().iter().enumerate() {
                    writeln!(out, "  {}: {}", j, option)?;
                }
                if let Some(correct) = store.correct_option_index_of(i) {
                    writeln!(out, "Correct Answer Index: {}", correct)?;
                }
            }
            QuestionKind::TrueFalse => {
                writeln!(out, "Type: True/False")?;
                let statements = store.statements_of(i).unwrap_or_default();
                let truths = store.statement_truth_of(i).unwrap_or_default();
                if statements.is_empty() {
                    writeln!(out, "Statements: (none)")?;
                } else {
                    writeln!(out, "Statements:")?;
                }
                for (statement, is_true) in statements.iter().zip(truths) {
                    let verdict = if is_true { "TRUE" } else { "FALSE" };
                    writeln!(out, "  - \"{}\" -> {}", statement, verdict)?;
                }
            }
            QuestionKind::Unknown => {
                writeln!(out, "Type: Unknown or Invalid")?;
                if let Some(Question::Unknown { reason }) = store.get(i) {
                    writeln!(out, "Reason: {}", reason)?;
                }
            }
        }
    }

    Ok(())
}

/// Write the whole bank as a JSON array.
pub fn write_json<W: Write>(store: &QuestionStore, out: &mut W) -> Result<(), Error> {
    serde_json::to_writer_pretty(&mut *out, store.questions())?;
    writeln!(out)?;
    Ok(())
}
