use hicfront_common::ReloadKind;
use hicfront_pipeline::PipelineReport;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;

/// Messages pushed to connected browsers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ReloadMessage {
    /// Sent once when a client connects
    Connected,

    /// Stylesheets changed; URL paths under the site root
    StyleUpdate { paths: Vec<String>, timestamp: u64 },

    /// Anything else changed
    FullReload { reason: String },

    /// A pipeline diagnostic
    Error { message: String },
}

/// Broadcasts reload messages to every connected client
#[derive(Debug)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadMessage>,
    output_dir: PathBuf,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// `dist/css/main.css` → `/css/main.css`
fn url_path(output_dir: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(output_dir).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(format!("/{}", parts.join("/")))
}

impl ReloadHub {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let (tx, _) = broadcast::channel(100);
        Self {
            tx,
            output_dir: output_dir.into(),
        }
    }

    /// Send to every subscriber; a hub without clients drops the message
    pub fn send(&self, message: ReloadMessage) {
        tracing::debug!("Reload message: {:?}", message);
        let _ = self.tx.send(message);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Announce the outcome of a pipeline run.
    ///
    /// Each diagnostic becomes an `error` message. If anything was written, a
    /// style update or a full reload follows depending on the pipeline.
    pub fn publish(&self, report: &PipelineReport) {
        for diagnostic in &report.diagnostics {
            self.send(ReloadMessage::Error {
                message: diagnostic.to_string(),
            });
        }
        if report.written.is_empty() {
            return;
        }

        let message = match report.reload_kind() {
            ReloadKind::StyleOnly => ReloadMessage::StyleUpdate {
                paths: report
                    .written
                    .iter()
                    .filter_map(|file| url_path(&self.output_dir, file))
                    .collect(),
                timestamp: now_millis(),
            },
            ReloadKind::Full => ReloadMessage::FullReload {
                reason: format!("{} changed", report.kind),
            },
        };
        self.send(message);
    }
}
