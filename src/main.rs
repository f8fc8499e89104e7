use std::io;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use question_bank::{LoadOptions, QuestionStore, UnknownRecordPolicy, logging, report};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// YAML file to load the questions from
    #[arg(short, long)]
    questions: PathBuf,

    /// What to do with records that are neither multiple choice nor true/false
    #[arg(long, value_enum, default_value_t = UnknownRecordPolicy::Surface)]
    unknown_records: UnknownRecordPolicy,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Log level for this crate (error|warn|info|debug|trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Explicit tracing filter directive (overrides --log-level)
    #[arg(long)]
    log_filter: Option<String>,
}

fn main() {
    let args = Args::parse();
    logging::init(&logging::compute_spec(
        args.log_level.as_deref(),
        args.log_filter.as_deref(),
    ));

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), question_bank::Error> {
    let options = LoadOptions::default().with_unknown_records(args.unknown_records);
    let mut store = QuestionStore::new();
    store.load_with(&args.questions, &options)?;

    let mut out = io::stdout().lock();
    match args.format {
        Format::Text => report::write_text(&store, &mut out),
        Format::Json => report::write_json(&store, &mut out),
    }
}
