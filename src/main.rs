//! Tabledoc - build a grid document and query it from the command line

mod args;
mod error;
mod settings;

use std::env;

use anyhow::{Context, Result};
use tabledoc_core::{ActorId, CellValue, Document, MemorySequence};
use tracing_subscriber::EnvFilter;

use args::{Command, Options, Request};

const LOCAL_ACTOR: ActorId = ActorId(1);

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Run every request in order. Returns whether any printed value was a failure.
fn run(options: &Options) -> Result<bool> {
    let config = settings::resolve(options)?;
    let mut doc = Document::create(MemorySequence::new(LOCAL_ACTOR), &config)
        .context("Failed to create document")?;

    let mut failed = false;
    let mut report = |value: CellValue| {
        failed |= value.is_failure();
        println!("{}", value);
    };

    for request in &options.requests {
        match request {
            Request::Set { cell, text } => doc
                .set_cell_text(cell.row, cell.col, text)
                .with_context(|| format!("Failed to set {}", cell))?,
            Request::CreateRange { label, from, to } => doc
                .create_range(
                    label,
                    from.row.min(to.row),
                    from.col.min(to.col),
                    from.row.max(to.row),
                    from.col.max(to.col),
                )
                .with_context(|| format!("Failed to create range {}", label))?,
            Request::GetRange(label) => println!("{}", doc.get_range(label)?),
            Request::Evaluate(cell) => report(
                doc.evaluate_cell(cell.row, cell.col)
                    .with_context(|| format!("Failed to evaluate {}", cell))?,
            ),
            Request::Formula(formula) => report(doc.evaluate_formula(formula)),
        }
    }

    let summary = doc.reconcile()?;
    tracing::debug!(local = summary.local, "session finished");
    Ok(failed)
}

fn main() {
    init_logging();

    let options = match args::parse_args(env::args().skip(1)) {
        Ok(Command::Help) => {
            args::print_usage();
            return;
        }
        Ok(Command::Run(options)) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            args::print_usage();
            std::process::exit(1);
        }
    };

    match run(&options) {
        Ok(false) => {}
        Ok(true) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
