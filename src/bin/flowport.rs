use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use flowport::{Converter, loader::load_make_from_path, registry::NodeTypeTable};
use std::{fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "flowport", about = "Convert Make.com exports into n8n workflows")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a Make.com export into an n8n workflow document.
    Convert(ConvertArgs),
    /// Validate a Make.com export without converting it.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Path to the Make.com export JSON.
    #[arg(long = "input")]
    input: PathBuf,
    /// Write the n8n workflow here instead of stdout.
    #[arg(long = "out")]
    out: Option<PathBuf>,
    /// Mappings file extending the default module-type table.
    #[arg(long = "mappings")]
    mappings: Option<PathBuf>,
    /// Print the conversion log to stderr.
    #[arg(long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Path to the Make.com export JSON.
    #[arg(long = "input")]
    input: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Convert(args) => run_convert(args).await,
        Commands::Check(args) => run_check(args),
    }
}

async fn run_convert(args: ConvertArgs) -> Result<()> {
    let doc = load_make_from_path(&args.input)
        .with_context(|| format!("load {}", args.input.display()))?;

    let mut table = NodeTypeTable::default();
    if let Some(path) = &args.mappings {
        table.extend_with(NodeTypeTable::load_from_file(path)?);
    }

    let outcome = Converter::new().with_table(table).convert(doc).await;
    if args.verbose {
        for line in outcome.logs() {
            eprintln!("{line}");
        }
    }

    match (&outcome.error, outcome.workflow()) {
        (None, Some(workflow)) => {
            let rendered = serde_json::to_string_pretty(workflow)?;
            match &args.out {
                Some(path) => {
                    fs::write(path, format!("{rendered}\n"))
                        .with_context(|| format!("write {}", path.display()))?;
                    eprintln!("wrote {}", path.display());
                }
                None => println!("{rendered}"),
            }
            Ok(())
        }
        (error, _) => {
            for line in outcome.logs() {
                eprintln!("{line}");
            }
            match error {
                Some(err) => anyhow::bail!("conversion failed: {err}"),
                None => anyhow::bail!("conversion produced no workflow"),
            }
        }
    }
}

fn run_check(args: CheckArgs) -> Result<()> {
    let doc = load_make_from_path(&args.input)
        .with_context(|| format!("check {}", args.input.display()))?;
    println!(
        "ok: '{}' with {} flow items",
        doc.name.as_deref().unwrap_or("unnamed"),
        doc.flow.len()
    );
    Ok(())
}
