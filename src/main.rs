use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use refile::{Config, DocPath, ExecutionMode, MemoryStore, Migration, RunReport};

#[derive(Parser)]
#[command(
    name = "refile",
    about = "Find stray feedback records in a document tree and copy them into buckets"
)]
struct Cli {
    /// JSON snapshot of the document tree to scan.
    #[arg(long)]
    snapshot: PathBuf,

    /// Rules file layered over the built-in defaults
    /// (default: ~/.config/refile/rules.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Perform the writes. Without this flag nothing is written.
    #[arg(long)]
    apply: bool,

    /// Where to save the tree after an --apply run (default: the snapshot).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Only walk these root collections (repeatable).
    #[arg(long = "root")]
    roots: Vec<String>,

    /// Also write a `_meta` document into every destination bucket.
    #[arg(long)]
    init_structure: bool,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Write debug logs to this file.
    #[arg(long)]
    debug: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug.as_deref())?;

    let config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to built-in rules");
            Config::defaults()
        }),
    };

    let store = MemoryStore::load(&cli.snapshot)
        .await
        .with_context(|| format!("cannot open snapshot {}", cli.snapshot.display()))?;

    let mode = if cli.apply {
        ExecutionMode::Apply
    } else {
        ExecutionMode::ReportOnly
    };

    let report = Migration::new(&store, &config)?
        .with_roots(cli.roots.iter().map(|r| DocPath::parse(r)))
        .with_structure_init(cli.init_structure)
        .run(mode)
        .await?;

    if mode.writes() {
        let out = cli.out.as_ref().unwrap_or(&cli.snapshot);
        store
            .save(out)
            .await
            .with_context(|| format!("cannot save tree to {}", out.display()))?;
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render(&report)?);
    }
    Ok(())
}

fn init_logging(debug: Option<&std::path::Path>) -> anyhow::Result<()> {
    fn env_filter(default: &str) -> tracing_subscriber::EnvFilter {
        tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default))
    }

    match debug {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_env_filter(env_filter("debug"))
                .init();
            tracing::info!("refile debug log started: tail -f {}", path.display());
        }
        None => tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter("info"))
            .init(),
    }
    Ok(())
}

fn render(report: &RunReport) -> Result<String, std::fmt::Error> {
    use refile::Classification;
    use std::fmt::Write;

    let mut out = String::new();
    let rule = "=".repeat(60);
    writeln!(out, "{rule}\nREPORT ({})\n{rule}", report.mode)?;
    writeln!(out, "Documents scanned: {}", report.documents_scanned)?;
    writeln!(out, "Feedback documents: {}", report.candidates())?;
    for class in Classification::FEEDBACK {
        writeln!(out, "  - {class}: {}", report.count(class))?;
    }

    writeln!(out, "\nSource paths:")?;
    for path in &report.distinct_source_parent_paths {
        writeln!(out, "  - {path}")?;
    }

    writeln!(out, "\nNormalized values:")?;
    if report.normalization_records.is_empty() {
        writeln!(out, "  (no values were normalized)")?;
    }
    for change in &report.normalization_records {
        writeln!(out, "  - {}: {}", change.source_path, change.record)?;
    }

    let verb = if report.mode.writes() { "Copied" } else { "Would copy" };
    writeln!(out, "\n{verb}: {} of {}", report.written(), report.writes.len())?;
    if !report.mode.writes() {
        for write in &report.writes {
            writeln!(out, "  - {} → {}", write.source_path, write.target_path)?;
        }
    }

    if !report.bucket_writes.is_empty() {
        writeln!(out, "\nBucket metadata:")?;
        for bucket in &report.bucket_writes {
            match &bucket.error {
                Some(error) => writeln!(out, "  - {}: failed: {error}", bucket.target_path)?,
                None if bucket.written => writeln!(out, "  - {}: written", bucket.target_path)?,
                None => writeln!(out, "  - {}: would write", bucket.target_path)?,
            }
        }
    }

    if !report.write_failures.is_empty() {
        writeln!(out, "\nFailed writes:")?;
        for failure in &report.write_failures {
            writeln!(
                out,
                "  - {} → {}: {}",
                failure.source_path, failure.target_path, failure.error
            )?;
        }
    }
    if !report.read_failures.is_empty() {
        writeln!(out, "\nSkipped branches (documents below were not scanned):")?;
        for failure in &report.read_failures {
            writeln!(out, "  - {}: {}", failure.path, failure.error)?;
        }
    }
    if report.cancelled {
        writeln!(out, "\nRun was cancelled before completion.")?;
    }
    Ok(out)
}
