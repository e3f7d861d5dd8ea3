use crate::error::CliError;
use async_trait::async_trait;
use engine_core::{
    error::ImportError,
    importer::Importer,
    report::{ChannelOutcome, RunReport},
};
use model::records::record::Record;
use std::path::{Path, PathBuf};
use tokio::{
    fs::OpenOptions,
    io::{self, AsyncWriteExt},
};

/// Writes records as JSON lines, appending to a file or to stdout.
pub struct JsonLinesImporter {
    path: Option<PathBuf>,
}

impl JsonLinesImporter {
    pub fn new(path: Option<PathBuf>) -> Self {
        JsonLinesImporter { path }
    }
}

#[async_trait]
impl Importer for JsonLinesImporter {
    async fn import(&self, records: &[Record]) -> Result<(), ImportError> {
        let mut lines = String::new();
        for record in records {
            lines.push_str(&serde_json::to_string(record)?);
            lines.push('\n');
        }

        match &self.path {
            Some(path) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                file.write_all(lines.as_bytes()).await?;
                file.flush().await?;
            }
            None => {
                let mut stdout = io::stdout();
                stdout.write_all(lines.as_bytes()).await?;
                stdout.flush().await?;
            }
        }
        Ok(())
    }
}

pub async fn write_report(report: &RunReport, path: &Path) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// Summary table on stderr; stdout may carry the records.
pub fn print_summary(report: &RunReport) {
    if report.disabled {
        eprintln!("Source '{}' is disabled", report.source);
        return;
    }

    eprintln!("Run of source '{}':", report.source);
    eprintln!("-----------------------------");
    for channel in &report.channels {
        match &channel.outcome {
            ChannelOutcome::Completed {
                imported, skipped, ..
            } => eprintln!(
                "{:<24} ok      imported {imported}, skipped {skipped}",
                channel.channel
            ),
            ChannelOutcome::Failed { error } => {
                eprintln!("{:<24} failed  {error}", channel.channel)
            }
        }
    }
}
