use clap::{Parser, Subcommand};
use schemaflow::codegen::generate_sql;
use schemaflow::config::DesignerConfig;
use schemaflow::document::{DocumentError, export_document, read_document, write_document};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "schemaflow", about = "Schema document tools: SQL generation and validation")]
struct CommandLine {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print or write CREATE TABLE statements for a schema document
    Generate {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a schema document and report what it contains
    Validate { input: PathBuf },
    /// Import a schema document and export it again with defaults filled in
    Normalize {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let args = CommandLine::parse();
    init_logging(args.verbose);

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e {
                DocumentError::Format(e) => eprintln!("Failed to import schema: {}", e),
                other => eprintln!("{}", other),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> Result<(), DocumentError> {
    let config = DesignerConfig::default();

    match command {
        Command::Generate { input, output } => {
            let graph = read_document(&input, &config)?;
            let sql = generate_sql(&graph);
            match output {
                Some(path) => {
                    fs::write(&path, format!("{}\n", sql))
                        .map_err(|source| DocumentError::Write { path, source })?;
                }
                None => println!("{}", sql),
            }
        }
        Command::Validate { input } => {
            let graph = read_document(&input, &config)?;
            let fields: usize = graph.tables.iter().map(|t| t.fields.len()).sum();
            info!(path = %input.display(), "schema document is valid");
            println!(
                "{}: {} tables, {} fields, {} edges",
                input.display(),
                graph.tables.len(),
                fields,
                graph.edges.len()
            );
        }
        Command::Normalize { input, output } => {
            let graph = read_document(&input, &config)?;
            match output {
                Some(path) => write_document(&path, &graph, &config)?,
                None => {
                    let json = export_document(&graph, &config)
                        .map_err(DocumentError::Encode)?;
                    println!("{}", json);
                }
            }
        }
    }

    Ok(())
}
