use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scan_artifact_removal::{
    ArtifactRemover, PipelineConfig, ProcessOptions, ProcessReport, ProcessResult,
};

#[derive(Parser)]
#[command(
    name = "artifact-removal",
    about = "Remove border-touching artifacts from scanned document images",
    version,
    after_help = "Simple usage: artifact-removal <image>  (writes <name>-fixed.png and \
                  diagnostic images to the current directory)"
)]
struct Cli {
    /// Input image file or directory
    input: PathBuf,

    /// Output directory (default: current directory)
    #[arg(short, long, env = "ARTIFACT_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Only write <name>-fixed.png, skip the intermediate images
    #[arg(long)]
    no_diagnostics: bool,

    /// Adaptive threshold neighborhood size (odd, > 1)
    #[arg(long, env = "ARTIFACT_BLOCK_SIZE", default_value_t = scan_artifact_removal::DEFAULT_BLOCK_SIZE)]
    block_size: u32,

    /// Constant subtracted from the local mean; higher is stricter
    #[arg(long, env = "ARTIFACT_OFFSET", default_value_t = scan_artifact_removal::DEFAULT_OFFSET, allow_negative_numbers = true)]
    offset: i32,

    /// Width of the elliptical dilation kernel
    #[arg(long, env = "ARTIFACT_DILATE_X", default_value_t = scan_artifact_removal::DEFAULT_DILATE_X)]
    dilate_x: u32,

    /// Height of the elliptical dilation kernel
    #[arg(long, env = "ARTIFACT_DILATE_Y", default_value_t = scan_artifact_removal::DEFAULT_DILATE_Y)]
    dilate_y: u32,

    /// Distance in pixels from the top or bottom edge that marks an artifact
    #[arg(long, env = "ARTIFACT_Y_THRESHOLD", default_value_t = scan_artifact_removal::DEFAULT_Y_THRESHOLD)]
    y_threshold: u32,

    /// Enable verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = PipelineConfig {
        block_size: cli.block_size,
        offset: cli.offset,
        dilate_x: cli.dilate_x,
        dilate_y: cli.dilate_y,
        y_threshold: cli.y_threshold,
    };

    let remover = match ArtifactRemover::new(config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let opts = ProcessOptions {
        output_dir: cli.output_dir.clone(),
        diagnostics: !cli.no_diagnostics,
    };

    if !cli.input.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input.display());
        process::exit(1);
    }

    tracing::debug!(?config, ?opts, "starting");

    let results = if cli.input.is_dir() {
        remover.process_directory(&cli.input, &opts)
    } else {
        vec![ProcessResult {
            path: cli.input.clone(),
            outcome: remover.process_file(&cli.input, &opts),
        }]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &cli);
        if r.outcome.is_ok() {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    )
}

fn print_result(result: &ProcessResult, cli: &Cli) {
    let filename = display_name(&result.path);

    match &result.outcome {
        Ok(report) => {
            if !cli.quiet {
                eprintln!(
                    "[OK] {filename}: {} of {} regions erased",
                    report.artifacts, report.regions
                );
            }
            if cli.verbose {
                print_written(report);
            }
        }
        Err(e) => eprintln!("[FAIL] {filename}: {e}"),
    }
}

fn print_written(report: &ProcessReport) {
    for path in &report.written {
        eprintln!("  -> {}", path.display());
    }
}
