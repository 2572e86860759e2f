pub mod data;

use crate::decoder::{DecodeError, PayloadDecoder};
use chrono::Utc;
use clap::ValueEnum;
use csv::Writer;
use data::MeasurementRecord;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// How decoded measurements are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

/// Configuration for a batch export
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub output_dir: PathBuf, // Directory for CSV files
    pub file_prefix: String, // CSV file name prefix, before the timestamp
    pub format: OutputFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("logs"),
            file_prefix: "analog_payload".to_string(),
            format: OutputFormat::Table,
        }
    }
}

/// A payload that could not be decoded
#[derive(Debug)]
pub struct PayloadFailure {
    pub index: usize,
    pub payload: String,
    pub error: DecodeError,
}

/// Outcome of decoding a batch of payloads
#[derive(Debug, Default)]
pub struct BatchReport {
    pub total: usize,
    pub records: Vec<MeasurementRecord>,
    pub failures: Vec<PayloadFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Decode every payload, keeping going past failures
pub fn decode_batch<S: AsRef<str>>(decoder: &PayloadDecoder, payloads: &[S]) -> BatchReport {
    let timestamp = Utc::now().to_rfc3339();
    let mut report = BatchReport {
        total: payloads.len(),
        ..BatchReport::default()
    };

    for (index, payload) in payloads.iter().enumerate() {
        let payload = payload.as_ref();
        match decoder.decode(payload) {
            Ok(measurements) => {
                info!("Payload #{} decoded into {} measurements", index, measurements.len());
                report
                    .records
                    .extend(measurements.into_iter().map(|m| MeasurementRecord {
                        timestamp: timestamp.clone(),
                        payload_index: index,
                        payload: payload.to_string(),
                        name: m.name,
                        value: m.value,
                    }));
            }
            Err(error) => {
                warn!("Payload #{} ({}) failed to decode: {}", index, payload, error);
                report.failures.push(PayloadFailure {
                    index,
                    payload: payload.to_string(),
                    error,
                });
            }
        }
    }

    report
}

/// Render a report as text; `Csv` gives the same rows a saved file holds
pub fn render(report: &BatchReport, format: OutputFormat) -> Result<String, ExportError> {
    match format {
        OutputFormat::Table => Ok(render_table(report)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&report.records)?),
        OutputFormat::Csv => {
            let mut writer = Writer::from_writer(Vec::new());
            write_records(&mut writer, &report.records)?;
            let bytes = writer.into_inner().map_err(|e| e.into_error())?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

fn render_table(report: &BatchReport) -> String {
    let mut lines = Vec::new();
    for index in 0..report.total {
        if let Some(failure) = report.failures.iter().find(|f| f.index == index) {
            lines.push(format!("payload #{}: {}", index, failure.error));
            continue;
        }
        lines.push(format!("payload #{}", index));
        for record in report.records.iter().filter(|r| r.payload_index == index) {
            lines.push(format!("  {} = {}", record.name, record.value));
        }
    }
    lines.into_iter().map(|line| line + "\n").collect()
}

fn write_records<W: io::Write>(
    writer: &mut Writer<W>,
    records: &[MeasurementRecord],
) -> Result<(), ExportError> {
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Save the records to a timestamped CSV file under `config.output_dir`
pub fn save_measurements_to_csv(
    records: &[MeasurementRecord],
    config: &ExportConfig,
) -> Result<PathBuf, ExportError> {
    let file_name = chrono::Local::now()
        .format(&format!("{}_%Y-%m-%d_%H-%M-%S.csv", config.file_prefix))
        .to_string();

    std::fs::create_dir_all(&config.output_dir)?;
    let path = config.output_dir.join(file_name);

    let file = File::create(&path)?;
    let mut writer = Writer::from_writer(file);
    write_records(&mut writer, records)?;

    info!("Measurements saved to {}", path.display());
    Ok(path)
}
