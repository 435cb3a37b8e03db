use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::{LevelFilter, Log, Metadata, Record};

use red_watermark_removal::{
    default_output_path, DetectorConfig, ProcessOptions, ProcessResult, WatermarkEngine,
};

#[derive(Parser)]
#[command(
    name = "red-watermark",
    about = "Remove red text watermarks placed as side borders or horizontal bars",
    version,
    after_help = "Simple usage: red-watermark <image>  (writes {name}_cleaned.{ext})\n\n\
                  Side borders are cropped away; a horizontal bar is painted white."
)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_cleaned.{ext})
    #[arg(short, long)]
    output: Option<String>,

    /// Do not write output for images without a watermark
    #[arg(short, long)]
    skip_clean: bool,

    /// Border red ratio that must be exceeded to trim (0.0-1.0)
    #[arg(long, default_value = "0.3")]
    trigger_ratio: f64,

    /// Column red ratio below which the border ends (0.0-1.0)
    #[arg(long, default_value = "0.1")]
    stop_ratio: f64,

    /// Minimum width/height ratio of a horizontal bar
    #[arg(long, default_value = "5.0")]
    min_aspect: f64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::Error
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    for (name, value) in [("trigger", cli.trigger_ratio), ("stop", cli.stop_ratio)] {
        if !(0.0..=1.0).contains(&value) {
            eprintln!("Error: {name} ratio must be between 0.0 and 1.0");
            process::exit(1);
        }
    }

    let config = DetectorConfig {
        border_trigger_ratio: cli.trigger_ratio,
        border_stop_ratio: cli.stop_ratio,
        bar_min_aspect_ratio: cli.min_aspect,
        ..DetectorConfig::default()
    };

    let engine = match WatermarkEngine::with_config(config) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Fatal: Failed to initialize engine: {e}");
            process::exit(1);
        }
    };

    let opts = ProcessOptions {
        skip_clean: cli.skip_clean,
    };

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: red-watermark <input_dir> -o <output_dir>");
            process::exit(1);
        };
        engine.process_directory(input_path, &output_dir, &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![engine.process_file(input_path, &output_path, &opts)]
    };

    let mut success_count = 0u32;
    let mut skip_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &cli);
        if r.skipped {
            skip_count += 1;
        } else if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if skip_count > 0 {
            eprint!(", Skipped: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, cli: &Cli) {
    if cli.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        eprintln!("[SKIP] {filename}: {}", result.message);
    } else if result.success {
        if result.watermark_found {
            eprintln!("[OK] {filename}: {}", result.message);
        } else {
            eprintln!("[OK] {filename} (no watermark)");
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }
}
