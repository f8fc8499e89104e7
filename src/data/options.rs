use clap::ValueEnum;

/// What the loader does with a record that is neither a valid
/// multiple-choice question nor a valid true/false block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum UnknownRecordPolicy {
    /// Keep the record at its index as an unknown question.
    #[default]
    Surface,
    /// Drop the record; the remaining questions are renumbered.
    Skip,
    /// Fail the whole load.
    Reject,
}

impl UnknownRecordPolicy {
    /// Decode the integer form used by the C API (`0` surface, `1` skip,
    /// `2` reject).
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(UnknownRecordPolicy::Surface),
            1 => Some(UnknownRecordPolicy::Skip),
            2 => Some(UnknownRecordPolicy::Reject),
            _ => None,
        }
    }
}

/// Knobs for a single load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub unknown_records: UnknownRecordPolicy,
}

impl LoadOptions {
    pub fn with_unknown_records(mut self, policy: UnknownRecordPolicy) -> Self {
        self.unknown_records = policy;
        self
    }
}
