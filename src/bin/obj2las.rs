//! Convert a textured OBJ mesh into a colored LAS 1.3 point cloud
//!
//! `obj2las <input.obj> <output.las> [options]`

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use texcloud::{ConversionOptions, ConversionReport, ObjToLasConverter};
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Convert a textured OBJ mesh into a colored LAS 1.3 point cloud")]
struct Args {
    /// Input OBJ file (MTL libraries and textures are resolved next to it)
    input: PathBuf,
    /// Output LAS file
    output: PathBuf,
    /// Brightness factor for texture samples that are not near white (1.03 to 1.2)
    #[arg(long, default_value_t = texcloud::algorithms::DEFAULT_BRIGHTNESS_BOOST)]
    brightness: f32,
    /// Gamma exponent applied to textured colors
    #[arg(long, default_value_t = texcloud::algorithms::DEFAULT_GAMMA)]
    gamma: f32,
    /// Minimum value of each color channel, in [0, 1]
    #[arg(long, default_value_t = texcloud::pipeline::DEFAULT_COLOR_FLOOR)]
    color_floor: f32,
    /// Do not write the <output>_transform.txt file
    #[arg(long, action = clap::ArgAction::SetTrue)]
    no_sidecar: bool,
    /// Directory used to resolve relative texture names
    #[arg(long)]
    texture_dir: Option<PathBuf>,
    /// Write a JSON report of the conversion to this file
    #[arg(long)]
    report: Option<PathBuf>,
    /// Set the log level, RUST_LOG takes precedence when set
    #[arg(short, long, default_value = "info")]
    log_level: LogLevel,
}

impl Args {
    fn conversion_options(&self) -> ConversionOptions {
        let mut options = ConversionOptions::default()
            .with_brightness_boost(self.brightness)
            .with_gamma(self.gamma)
            .with_color_floor(self.color_floor)
            .with_sidecar(!self.no_sidecar);
        if let Some(dir) = &self.texture_dir {
            options = options.with_texture_dir(dir);
        }
        options
    }
}

fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn write_report(report: &ConversionReport, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize conversion report")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write report to {}", path.display()))?;
    info!(report = %path.display(), "Conversion report written");
    Ok(())
}

fn run(args: &Args) -> anyhow::Result<()> {
    let converter = ObjToLasConverter::new(args.conversion_options());
    let report = converter.convert(&args.input, &args.output)?;
    info!(
        points = report.las.point_count,
        failed_textures = report.failed_textures.len(),
        "LAS file saved as {}",
        report.output.display()
    );
    if let Some(path) = &args.report {
        write_report(&report, path)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_level);

    let start = Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "obj2las starting");

    match run(&args) {
        Ok(()) => {
            info!(elapsed_s = start.elapsed().as_secs_f64(), "Done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let kind = err
                .downcast_ref::<texcloud::Error>()
                .map(|e| e.kind().to_string())
                .unwrap_or_else(|| "error".to_string());
            error!(kind = %kind, "Conversion failed");
            eprintln!("error[{}]: {:#}", kind, err);
            eprintln!("  input: {}", args.input.display());
            eprintln!("  output: {}", args.output.display());
            ExitCode::FAILURE
        }
    }
}
