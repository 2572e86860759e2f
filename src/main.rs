use analog_payload::PayloadDecoder;
use analog_payload::export::{self, ExportConfig, OutputFormat};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt;

/// Decode base64 analog transmitter payloads into measurements
#[derive(Parser, Debug)]
#[command(name = "analog-payload", version)]
struct Cli {
    /// Base64-encoded payloads
    #[arg(required = true, value_name = "PAYLOAD")]
    payloads: Vec<String>,

    /// Output format; csv writes a timestamped file
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Directory for CSV output
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// CSV file name prefix
    #[arg(long)]
    file_prefix: Option<String>,

    /// Directory for log files
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

impl Cli {
    fn export_config(&self) -> ExportConfig {
        let defaults = ExportConfig::default();
        ExportConfig {
            output_dir: self.output_dir.clone().unwrap_or(defaults.output_dir),
            file_prefix: self.file_prefix.clone().unwrap_or(defaults.file_prefix),
            format: self.format,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _guard = setup_logging(&cli.log_dir);
    info!("Starting analog-payload with {} payload(s)", cli.payloads.len());

    let config = cli.export_config();
    let decoder = PayloadDecoder::new();
    let report = export::decode_batch(&decoder, &cli.payloads);

    match config.format {
        OutputFormat::Csv => {
            let path = export::save_measurements_to_csv(&report.records, &config).map_err(|e| {
                error!("Failed to save CSV: {}", e);
                e
            })?;
            println!("Measurements saved to: {}", path.display());
        }
        format => print!("{}", export::render(&report, format)?),
    }

    if !report.is_success() {
        // The table already lists failures inline.
        if config.format != OutputFormat::Table {
            for failure in &report.failures {
                eprintln!("payload #{}: {}", failure.index, failure.error);
            }
        }
        let message = format!(
            "{} of {} payloads failed to decode",
            report.failures.len(),
            report.total
        );
        error!("{}", message);
        return Err(message.into());
    }

    info!("Application shutting down");
    Ok(())
}

fn setup_logging(log_dir: &Path) -> WorkerGuard {
    // File-based logging with daily rotation
    let file_appender = rolling::daily(log_dir, "analog-payload.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    fmt()
        .with_writer(non_blocking)
        .with_ansi(false) // No ANSI colors in log files
        .with_level(true)
        .init();

    guard
}
