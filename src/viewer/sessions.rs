//! Post-processing of the JSON-lines log into sessions.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message marking the beginning of one program run.
pub const SESSION_START: &str = "session start";

/// Message marking the end of one program run.
pub const SESSION_END: &str = "session end";

/// Viewer errors.
#[derive(Error, Debug)]
pub enum ViewerError {
    /// The log could not be read.
    #[error("cannot read log: {0}")]
    Io(#[from] std::io::Error),

    /// A log line is not a valid event record.
    #[error("invalid log line {line}: {source}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Underlying JSON failure.
        source: serde_json::Error,
    },

    /// Events appear before any session start marker.
    #[error("invalid log: missing session start marker")]
    MissingStart,
}

/// One structured record from the JSON-lines log.
///
/// Unknown fields are ignored, so the model stays tolerant of extra
/// context the subscriber may add.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// Event timestamp.
    pub timestamp: DateTime<Utc>,
    /// Log level as written by the subscriber.
    pub level: String,
    /// Event message.
    #[serde(default)]
    pub message: String,
    /// Scraper that produced the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraper: Option<String>,
    /// Stock the event refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<String>,
    /// Price as printed on the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Quote date as printed on the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall time of the attempt, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    /// Identifier of the program run that wrote the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

/// All events of one program run.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// Run identifier from the start marker, when present.
    pub run_id: Option<String>,
    /// Timestamp of the start marker.
    pub start: DateTime<Utc>,
    /// Timestamp of the end marker; `None` for an interrupted run.
    pub finish: Option<DateTime<Utc>>,
    /// Events between the markers, in log order.
    pub events: Vec<LogEvent>,
}

impl Session {
    /// Wall time covered by the session, when it finished.
    pub fn elapsed(&self) -> Option<Duration> {
        self.finish.map(|finish| finish - self.start)
    }
}

/// Sessions parsed from one log file, oldest first.
#[derive(Debug, Clone, Default)]
pub struct Sessions(Vec<Session>);

impl Sessions {
    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the log contained no sessions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The n-th session, oldest first.
    pub fn get(&self, index: usize) -> Option<&Session> {
        self.0.get(index)
    }
}

/// Parse a JSON-lines log into sessions.
pub fn load_sessions<R: BufRead>(reader: R) -> Result<Sessions, ViewerError> {
    let mut sessions: Vec<Session> = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: LogEvent = serde_json::from_str(&line).map_err(|source| ViewerError::Parse {
            line: number + 1,
            source,
        })?;

        if event.message == SESSION_START {
            sessions.push(Session {
                run_id: event.run_id,
                start: event.timestamp,
                finish: None,
                events: Vec::new(),
            });
            continue;
        }

        let Some(current) = sessions.last_mut() else {
            return Err(ViewerError::MissingStart);
        };
        if event.message == SESSION_END {
            current.finish = Some(event.timestamp);
        } else {
            current.events.push(event);
        }
    }

    Ok(Sessions(sessions))
}

/// Load sessions from a log file on disk.
pub fn load_sessions_from_path(path: impl AsRef<Path>) -> Result<Sessions, ViewerError> {
    let file = File::open(path.as_ref())?;
    load_sessions(BufReader::new(file))
}
