//! Form engine command-line interface
//!
//! `clinform parse` prints the AST of a field expression; `clinform run`
//! replays a JSON scenario (form definition, saved domain data, a sequence
//! of value changes) against a form session and reports visibility,
//! computed values and diagnostics per field.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clinform::model::{DomainSource, FieldValue, Form, SessionContext, SessionMode};
use clinform::{parse_expression, FormSession};
use colored::Colorize;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Form engine command-line tool
#[derive(Parser)]
#[command(name = "clinform")]
#[command(author, version, about = "Clinical-data-entry form engine tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a field expression and print the AST
    Parse {
        /// Expression text, e.g. "hasFever !== 'true'"
        expression: String,
        /// Emit the AST as JSON instead of the debug tree
        #[arg(long)]
        json: bool,
    },
    /// Run a JSON scenario against a form session
    Run {
        /// Scenario file
        file: PathBuf,
        /// Assemble and print the submission bundle at the end
        #[arg(long)]
        submit: bool,
    },
}

/// A replayable session scenario
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Scenario {
    form: Form,
    #[serde(default = "Scenario::default_mode")]
    mode: SessionMode,
    #[serde(default = "Scenario::default_person")]
    person: String,
    location: Option<String>,
    /// Previously saved domain data (edit/view modes)
    source: Option<DomainSource>,
    /// Value changes applied in order after materialization
    #[serde(default)]
    set: Vec<SetStep>,
}

#[derive(Deserialize)]
struct SetStep {
    field: String,
    value: FieldValue,
}

impl Scenario {
    fn default_mode() -> SessionMode {
        SessionMode::Enter
    }

    fn default_person() -> String {
        "anonymous".to_string()
    }
}

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Parse { expression, json } => parse(&expression, json),
        Commands::Run { file, submit } => run(&file, submit).await,
    };

    if let Err(e) = result {
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}

fn parse(expression: &str, json: bool) -> Result<()> {
    let ast = parse_expression(expression)
        .with_context(|| format!("failed to parse `{expression}`"))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&ast)?);
    } else {
        println!("{ast:#?}");
    }
    Ok(())
}

async fn run(file: &PathBuf, submit: bool) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("failed to read scenario file {}", file.display()))?;
    let scenario: Scenario = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse scenario file {}", file.display()))?;

    let mut context = SessionContext::new(scenario.mode, scenario.person);
    if let Some(location) = scenario.location {
        context = context.with_location(location);
    }

    let mut session = FormSession::new(scenario.form, context);
    if let Some(source) = &scenario.source {
        session
            .load_initial_values(source)
            .await
            .context("failed to load saved domain data")?;
    }
    session.materialize();

    for step in scenario.set {
        session
            .set_value(&step.field, step.value)
            .with_context(|| format!("failed to set value on field `{}`", step.field))?;
    }

    report(&session);

    if submit {
        match session.submit() {
            Ok(bundle) => {
                println!();
                println!("{}", "Submission bundle:".green().bold());
                println!("{}", serde_json::to_string_pretty(&bundle.obs)?);
                if !bundle.diagnoses.is_empty() {
                    println!("{}", serde_json::to_string_pretty(&bundle.diagnoses)?);
                }
                if !bundle.program_states.is_empty() {
                    println!("{}", serde_json::to_string_pretty(&bundle.program_states)?);
                }
                if !bundle.identifiers.is_empty() {
                    println!("{}", serde_json::to_string_pretty(&bundle.identifiers)?);
                }
            }
            Err(rejection) => {
                anyhow::bail!("{rejection}");
            }
        }
    }

    session.tear_down();
    Ok(())
}

fn report(session: &FormSession) {
    for field in session.form().fields.values() {
        let state = if field.hidden() {
            "hidden".dimmed()
        } else if field.is_readonly {
            "readonly".yellow()
        } else {
            "visible".green()
        };
        println!("{:<24} {:<8} {:?}", field.id.bold(), state, field.value);

        for issue in &field.meta.submission.errors {
            println!("  {} {}", "error:".red().bold(), issue.message);
        }
        for issue in &field.meta.submission.warnings {
            println!("  {} {}", "warning:".yellow().bold(), issue.message);
        }
    }
}
