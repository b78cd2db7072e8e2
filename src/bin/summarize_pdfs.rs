use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use article_summarizer::{
    config::{self, Config},
    logging,
    processing::{Document, PDF_CONTENT_TYPE, ProcessingService, assemble_batch},
};
use clap::Parser;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "summarize-pdfs",
    about = "Summarize PDF research articles into structured JSON records"
)]
struct Cli {
    /// PDF files or directories; directories are searched recursively for `*.pdf`.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Documents processed concurrently (overrides `BATCH_CONCURRENCY`).
    #[arg(long)]
    concurrency: Option<usize>,
    /// Write the JSON result to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Emit compact JSON instead of pretty-printed output.
    #[arg(long)]
    compact: bool,
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
    config::init_config();
    logging::init_tracing(true);

    let mut config: Config = config::get_config().clone();
    if let Some(concurrency) = cli.concurrency {
        if concurrency == 0 {
            bail!("--concurrency must be at least 1");
        }
        config.batch_concurrency = concurrency;
    }

    let service = ProcessingService::from_config(&config);
    let status = service.status();
    if !status.summarizer_available {
        bail!(
            "summarizer unavailable: {}",
            status
                .unavailable_reason
                .unwrap_or_else(|| "no backend configured".into())
        );
    }

    let documents = collect_documents(&cli.paths)?;
    tracing::info!(documents = documents.len(), "Collected input files");

    let results = service.process(documents).await;
    let records = assemble_batch(&results);
    let json = if cli.compact {
        serde_json::to_string(&records)?
    } else {
        serde_json::to_string_pretty(&records)?
    };

    match cli.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(&path, json.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            let snapshot = service.metrics_snapshot();
            eprintln!(
                "wrote {} records ({} succeeded, {} failed) to {}",
                records.len(),
                snapshot.documents_succeeded,
                snapshot.documents_failed,
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("failed to write to stdout")?;
        }
    }
    Ok(())
}

/// Expand the given paths into documents, in command-line order.
///
/// Explicit files are taken as-is so that non-PDF inputs surface as failed records;
/// directories contribute only `*.pdf` files, sorted by name.
fn collect_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file() && has_pdf_extension(e.path()))
            {
                documents.push(read_document(entry.path())?);
            }
        } else {
            documents.push(read_document(path)?);
        }
    }
    Ok(documents)
}

fn read_document(path: &Path) -> Result<Document> {
    let content = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let content_type = if has_pdf_extension(path) {
        PDF_CONTENT_TYPE
    } else {
        "application/octet-stream"
    };
    Ok(Document::new(
        path.display().to_string(),
        content,
        Some(content_type.to_string()),
    ))
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
