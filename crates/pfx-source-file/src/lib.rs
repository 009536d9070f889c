// # File Event Source
//
// Replays advertise/withdraw events from a JSON-lines file.
//
// ## Purpose
//
// Stands in for the link-state distribution layer:
// - Replaying captured event sequences
// - CI and contract testing
// - Debugging route computation against a known history
//
// ## Format
//
// One `PrefixEvent` per line. Blank lines and lines starting with `#` are
// ignored.
//
// ```text
// # nodeA comes up
// {"op":"advertise","key":"prefix:nodeA:area1:[10.0.0.0/24]","entry":{}}
// {"op":"withdraw","key":"prefix:nodeA:area1:[10.0.0.0/24]"}
// ```
//
// `watch()` skips malformed lines with a warning; `read_events()` rejects
// the whole file on the first one.

use pfx_core::SourceRegistry;
use pfx_core::config::EventSourceConfig;
use pfx_core::traits::{PrefixEvent, PrefixEventSource, PrefixEventSourceFactory};
use pfx_core::{Error, Result};

use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Event source replaying a JSON-lines file
#[derive(Debug, Clone)]
pub struct FileEventSource {
    path: PathBuf,
    name: String,
}

impl FileEventSource {
    /// Create a source for the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }

    /// Path being replayed
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse one line; `Ok(None)` for blank and comment lines
fn parse_line(line: &str) -> std::result::Result<Option<PrefixEvent>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Read every event from a JSON-lines file
///
/// Fails on the first malformed line, naming its line number.
pub async fn read_events(path: impl AsRef<Path>) -> Result<Vec<PrefixEvent>> {
    let path = path.as_ref();
    let file = tokio::fs::File::open(path).await?;
    let mut lines = BufReader::new(file).lines();

    let mut events = Vec::new();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        match parse_line(&line) {
            Ok(Some(event)) => events.push(event),
            Ok(None) => {}
            Err(e) => {
                return Err(Error::event_source(format!(
                    "{}:{}: {}",
                    path.display(),
                    line_no,
                    e
                )));
            }
        }
    }

    Ok(events)
}

impl PrefixEventSource for FileEventSource {
    fn watch(&self) -> Pin<Box<dyn Stream<Item = PrefixEvent> + Send + 'static>> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let path = self.path.clone();

        tokio::spawn(async move {
            tracing::info!("Replaying prefix events from {}", path.display());

            let file = match tokio::fs::File::open(&path).await {
                Ok(file) => file,
                Err(e) => {
                    tracing::error!("Failed to open {}: {}", path.display(), e);
                    return;
                }
            };

            let mut lines = BufReader::new(file).lines();
            let mut line_no = 0usize;
            let mut replayed = 0usize;

            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!("Failed to read {}: {}", path.display(), e);
                        break;
                    }
                };
                line_no += 1;

                match parse_line(&line) {
                    Ok(Some(event)) => {
                        if tx.send(event).is_err() {
                            tracing::debug!("Receiver dropped, stopping replay");
                            return;
                        }
                        replayed += 1;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(
                            "Skipping malformed event at {}:{}: {}",
                            path.display(),
                            line_no,
                            e
                        );
                    }
                }
            }

            tracing::info!("Replayed {} prefix event(s) from {}", replayed, path.display());
        });

        Box::pin(UnboundedReceiverStream::new(rx))
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

/// Factory for creating file event sources
pub struct FileSourceFactory;

impl PrefixEventSourceFactory for FileSourceFactory {
    fn create(&self, config: &EventSourceConfig) -> Result<Box<dyn PrefixEventSource>> {
        match config {
            EventSourceConfig::File { path } => {
                if path.is_empty() {
                    return Err(Error::config("File event source path cannot be empty"));
                }
                Ok(Box::new(FileEventSource::new(path)))
            }
            _ => Err(Error::config("Invalid config for file event source")),
        }
    }
}

/// Register the file event source with a registry
pub fn register(registry: &SourceRegistry) {
    registry.register_event_source("file", Box::new(FileSourceFactory));
}
