use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "imglabel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a batch of object notifications against a directory-backed store.
    Process(ProcessArgs),
    /// Label a single local image file.
    Stamp(StampArgs),
}

#[derive(Parser, Debug)]
struct ProcessArgs {
    /// Event JSON: a notification document with `Records`, or an array of `{bucket, key}`.
    #[arg(long)]
    events: PathBuf,

    /// Store root; each bucket is a sub-directory.
    #[arg(long)]
    root: PathBuf,

    /// Pipeline config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override worker thread count.
    #[arg(long)]
    threads: Option<usize>,

    /// Stop starting new records after the first failure.
    #[arg(long, default_value_t = false)]
    fail_fast: bool,
}

#[derive(Parser, Debug)]
struct StampArgs {
    /// Input image (.jpg, .jpeg or .png).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path. The input's extension decides the output codec.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Process(args) => cmd_process(args),
        Command::Stamp(args) => cmd_stamp(args),
    }
}

fn cmd_process(args: ProcessArgs) -> anyhow::Result<()> {
    let mut cfg = match &args.config {
        Some(path) => imglabel::PipelineConfig::from_path(path)?,
        None => imglabel::PipelineConfig::default(),
    };
    if args.threads.is_some() {
        cfg.concurrency = args.threads;
    }
    if args.fail_fast {
        cfg.failure_policy = imglabel::FailurePolicy::FailFast;
    }
    cfg.validate()?;

    let records = imglabel::read_event_file(&args.events)?;
    let store = Arc::new(imglabel::FsStore::new(&args.root));
    let processor = imglabel::BatchProcessor::new(store, cfg.to_options());
    let report = processor.process(&records)?;

    for (record, err) in report.failures() {
        eprintln!("failed {}/{}: {err}", record.bucket, record.key);
    }
    eprintln!(
        "written {}, skipped {}, failed {}, cancelled {}",
        report.written(),
        report.skipped(),
        report.failed(),
        report.cancelled()
    );

    anyhow::ensure!(
        report.is_clean(),
        "{} of {} records did not complete",
        report.failed() + report.cancelled(),
        records.len()
    );
    Ok(())
}

fn cmd_stamp(args: StampArgs) -> anyhow::Result<()> {
    let name = args.in_path.to_string_lossy();
    let ext = imglabel::classify(&name)
        .with_context(|| format!("not a supported image file: '{}'", args.in_path.display()))?;

    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read image '{}'", args.in_path.display()))?;
    let decoded = imglabel::decode(&bytes)?;
    let output = imglabel::codec::resolve_output_format(
        ext,
        decoded.codec,
        imglabel::MismatchPolicy::default(),
    )?;

    let anchor = imglabel::placement_for(decoded.width(), decoded.height());
    let labeled = imglabel::annotate(&decoded.image, anchor, &imglabel::Label::watermark());
    let body = imglabel::encode(&labeled, output.codec)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &body)
        .with_context(|| format!("write image '{}'", args.out.display()))?;

    eprintln!("wrote {} (label at {anchor})", args.out.display());
    Ok(())
}
