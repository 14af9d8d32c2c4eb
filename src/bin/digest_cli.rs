//! Command line front end.
//!
//! Runs one processing pass over a local file and prints the preview, summary, and answer blocks.
//! The declared MIME type comes from `--mime` or, failing that, from the file extension. With
//! `--interactive`, further questions are read from stdin and answered against the same text.
use anyhow::{Context, Result};
use clap::Parser;
use rustydigest::{
    config::Config,
    extraction::UploadedDocument,
    logging,
    pipeline::Pipeline,
    render,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "digest-cli",
    about = "Summarize a PDF, DOCX, or TXT document and answer questions about it"
)]
struct Cli {
    /// Document to process.
    file: PathBuf,
    /// Declared MIME type; guessed from the file extension when omitted.
    #[arg(long)]
    mime: Option<String>,
    /// Question to answer against the document text.
    #[arg(long, short)]
    question: Option<String>,
    /// Keep reading questions from stdin after the first pass.
    #[arg(long, short)]
    interactive: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    logging::init_cli_tracing();

    let config = Config::from_env().context("failed to load configuration")?;
    let pipeline = Pipeline::from_config(&config).context("failed to initialize inference clients")?;

    let bytes = tokio::fs::read(&cli.file)
        .await
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    let mime_type = cli.mime.clone().unwrap_or_else(|| {
        mime_guess::from_path(&cli.file)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    });
    let mut document = UploadedDocument::new(bytes, mime_type);
    if let Some(name) = cli.file.file_name().and_then(|name| name.to_str()) {
        document = document.with_file_name(name);
    }

    let report = match pipeline.process(document, cli.question.as_deref()).await {
        Ok(report) => report,
        Err(error) => {
            println!("{}", render::error_message(&error));
            std::process::exit(2);
        }
    };
    print!("{}", render::render_report(&report));

    if cli.interactive {
        let stdin = std::io::stdin();
        loop {
            print!("\nAsk a question about the document (empty line to quit): ");
            std::io::stdout().flush().context("failed to flush stdout")?;
            let mut line = String::new();
            if stdin.lock().read_line(&mut line).context("failed to read stdin")? == 0 {
                break;
            }
            let question = line.trim_end_matches(['\r', '\n']);
            let Some(answer) = pipeline.ask(&report.text, question).await else {
                break;
            };
            println!("\nAnswer:\n{}", render::answer_block(&answer));
        }
    }

    Ok(())
}
