//! CLI for layout-driven PDF form inspection

use clap::{Parser, Subcommand, ValueEnum};
use pdf_formview::examine::key_candidates_to_text;
use pdf_formview::{
    display_view, examine, inspect_pdf, inspect_to_json, inspect_to_text, render_json,
    render_text, InspectError, LayoutConfig, View,
};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "formview")]
#[command(about = "Layout-driven PDF inspection and examination tool")]
#[command(version)]
struct Cli {
    /// PDF file to inspect
    #[arg(long)]
    src: PathBuf,

    /// Emit JSON output where applicable
    #[arg(long)]
    json: bool,

    /// Enable verbose diagnostics
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    verb: Verb,
}

#[derive(Subcommand)]
enum Verb {
    /// Measure physical PDF properties
    Inspect,
    /// Infer document structure
    Examine,
    /// Display views over examined structure
    Display {
        object: DisplayObject,
        /// Exact key, /regex/, or document mode (summary|details)
        selector: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DisplayObject {
    Document,
    Keys,
    Records,
}

impl From<DisplayObject> for View {
    fn from(object: DisplayObject) -> Self {
        match object {
            DisplayObject::Document => View::Document,
            DisplayObject::Keys => View::Keys,
            DisplayObject::Records => View::Records,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), InspectError> {
    let config = LayoutConfig::default();
    let inspection = inspect_pdf(&cli.src)?;

    if let Verb::Inspect = cli.verb {
        if cli.json {
            println!("{}", inspect_to_json(&inspection)?);
        } else {
            println!("{}", inspect_to_text(&inspection));
        }
        return Ok(());
    }

    let examination = examine(&inspection, &config);

    match &cli.verb {
        Verb::Inspect => {}
        Verb::Examine => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&examination.records)?);
            } else {
                println!(
                    "{} records, key column x={:.1}, value column x={:.1}",
                    examination.records.len(),
                    examination.anchors.anchor_x1,
                    examination.anchors.anchor_x2
                );
                if cli.verbose {
                    println!("{}", key_candidates_to_text(&examination));
                }
            }
        }
        Verb::Display { object, selector } => {
            let payload = display_view(
                &examination.records,
                (*object).into(),
                selector.as_deref(),
                (config.ticket_type_key.as_str(), config.ticket_number_key.as_str()),
            )?;
            if cli.json {
                println!("{}", render_json(&payload)?);
            } else {
                print!("{}", render_text(&payload));
            }
        }
    }

    Ok(())
}
