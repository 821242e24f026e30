use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::error::ReplayError;
use crate::event::ReplayEvent;
use crate::source::EventSource;

/// Streaming reader over a recorded history file.
///
/// The format is one JSON object per line, each carrying a `type` tag
/// (`updateLocation`, `setRoute`, `getStatus`). Records are parsed lazily as
/// the buffer pulls them. Unknown record types and malformed lines are
/// skipped with a diagnostic so one bad record never halts playback; read
/// errors after open close the source, degrading the scheduler to idle
/// polling instead of crashing it.
pub struct HistoryFileSource {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    peeked: Option<ReplayEvent>,
    line_number: usize,
}

impl HistoryFileSource {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await?;
        Ok(Self {
            path,
            reader: Some(BufReader::new(file)),
            peeked: None,
            line_number: 0,
        })
    }

    /// Read lines until one yields a usable event or the file ends.
    async fn read_next(&mut self) -> Option<ReplayEvent> {
        let mut line = String::new();
        loop {
            let reader = self.reader.as_mut()?;
            line.clear();
            self.line_number += 1;
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    self.close_inner();
                    return None;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(path = %self.path.display(), %err, "history read failed, closing source");
                    self.close_inner();
                    return None;
                }
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match parse_record(trimmed) {
                Ok(Some(event)) => return Some(event),
                Ok(None) => {
                    debug!(line = self.line_number, "skipping unsupported history record");
                }
                Err(err) => {
                    warn!(line = self.line_number, %err, "skipping malformed history record");
                }
            }
        }
    }

    fn close_inner(&mut self) {
        self.reader = None;
    }
}

#[async_trait]
impl EventSource for HistoryFileSource {
    async fn has_next(&mut self) -> bool {
        if self.peeked.is_none() {
            self.peeked = self.read_next().await;
        }
        self.peeked.is_some()
    }

    async fn next_event(&mut self) -> Option<ReplayEvent> {
        if let Some(event) = self.peeked.take() {
            return Some(event);
        }
        self.read_next().await
    }

    async fn restart(&mut self) -> Result<(), ReplayError> {
        let file = File::open(&self.path).await?;
        self.reader = Some(BufReader::new(file));
        self.peeked = None;
        self.line_number = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.close_inner();
        self.peeked = None;
    }
}

/// Parse one history record.
///
/// `Ok(None)` means the record is recognized but not replayable: an unknown
/// `type`, or a `setRoute` whose route payload is absent or unusable (a
/// recorded null route carries nothing worth replaying from a file).
/// `Err` means the record is malformed; callers log and drop it.
fn parse_record(line: &str) -> anyhow::Result<Option<ReplayEvent>> {
    let value: serde_json::Value =
        serde_json::from_str(line).context("record is not valid JSON")?;
    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .context("record has no type tag")?;

    match kind {
        "updateLocation" | "getStatus" => {
            let event = serde_json::from_value(value).context("record fields are malformed")?;
            Ok(Some(event))
        }
        "setRoute" => {
            if value.get("route").map_or(true, |r| r.is_null()) {
                return Ok(None);
            }
            match serde_json::from_value(value) {
                Ok(event) => Ok(Some(event)),
                Err(err) => {
                    debug!(%err, "dropping setRoute record with unusable route payload");
                    Ok(None)
                }
            }
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_history(name: &str, lines: &[&str]) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "tracesim-{}-{}.jsonl",
            name,
            std::process::id()
        ));
        std::fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    #[tokio::test]
    async fn test_reads_valid_records_in_order() {
        let path = write_history(
            "valid",
            &[
                r#"{"type":"getStatus","eventTimestamp":1.0}"#,
                r#"{"type":"updateLocation","eventTimestamp":2.0,"location":{"lon":8.85,"lat":49.24,"provider":"fused"}}"#,
            ],
        );
        let mut source = HistoryFileSource::open(&path).await.unwrap();

        assert!(source.has_next().await);
        assert_eq!(source.next_event().await.unwrap().event_timestamp(), 1.0);
        let second = source.next_event().await.unwrap();
        assert!(second.is_location());
        assert!(source.next_event().await.is_none());
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_garbage_records_are_skipped() {
        let path = write_history(
            "garbage",
            &[
                r#"{"type":"setRoute","eventTimestamp":0.5,"route":null}"#,
                r#"{this is not json"#,
                r#"{"type":"updateLocation","eventTimestamp":2.0,"location":{"lon":8.85,"lat":49.24}}"#,
            ],
        );
        let mut source = HistoryFileSource::open(&path).await.unwrap();

        let only = source.next_event().await.unwrap();
        assert!(only.is_location());
        assert!(source.next_event().await.is_none());
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_unknown_type_skipped() {
        let path = write_history(
            "unknown",
            &[
                r#"{"type":"somethingNew","eventTimestamp":1.0}"#,
                r#"{"type":"getStatus","eventTimestamp":2.0}"#,
            ],
        );
        let mut source = HistoryFileSource::open(&path).await.unwrap();
        assert_eq!(source.next_event().await.unwrap().event_timestamp(), 2.0);
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_restart_rereads_from_start(){
        let path = write_history(
            "restart",
            &[r#"{"type":"getStatus","eventTimestamp":7.0}"#],
        );
        let mut source = HistoryFileSource::open(&path).await.unwrap();
        assert!(source.next_event().await.is_some());
        assert!(source.next_event().await.is_none());

        source.restart().await.unwrap();
        assert_eq!(source.next_event().await.unwrap().event_timestamp(), 7.0);
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let path = write_history(
            "close",
            &[r#"{"type":"getStatus","eventTimestamp":1.0}"#],
        );
        let mut source = HistoryFileSource::open(&path).await.unwrap();
        source.close();
        source.close();
        assert!(!source.has_next().await);
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let result = HistoryFileSource::open("/nonexistent/trace.jsonl").await;
        assert!(matches!(result, Err(ReplayError::Io(_))));
    }
}
