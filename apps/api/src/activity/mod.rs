//! In-memory activity log: request records, provider calls and user interactions.
//!
//! Each channel keeps only its most recent `CHANNEL_CAPACITY` entries. Nothing is
//! persisted; a restart starts from an empty log.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

pub mod handlers;
pub mod middleware;

pub const CHANNEL_CAPACITY: usize = 5000;

const REDACTED: &str = "[REDACTED]";
const SENSITIVE_KEYS: [&str; 5] = ["api_key", "key", "token", "password", "secret"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogChannel {
    Api,
    Llm,
    App,
}

impl FromStr for LogChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api" => Ok(Self::Api),
            "llm" => Ok(Self::Llm),
            "app" => Ok(Self::App),
            other => Err(format!(
                "Invalid log type '{other}'. Must be one of: api, llm, app"
            )),
        }
    }
}

impl fmt::Display for LogChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Api => "api",
            Self::Llm => "llm",
            Self::App => "app",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub channel: LogChannel,
    pub level: LogLevel,
    pub message: String,
    pub data: Value,
}

#[derive(Debug, Default)]
struct Channels {
    api: Mutex<VecDeque<LogEntry>>,
    llm: Mutex<VecDeque<LogEntry>>,
    app: Mutex<VecDeque<LogEntry>>,
}

impl Channels {
    fn get(&self, channel: LogChannel) -> &Mutex<VecDeque<LogEntry>> {
        match channel {
            LogChannel::Api => &self.api,
            LogChannel::Llm => &self.llm,
            LogChannel::App => &self.app,
        }
    }
}

/// Shared handle to the log. Clones refer to the same entries.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    channels: Arc<Channels>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, evicting the oldest one when the channel is full.
    pub fn record(
        &self,
        channel: LogChannel,
        level: LogLevel,
        message: impl Into<String>,
        mut data: Value,
    ) -> Uuid {
        redact(&mut data);
        let entry = LogEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            channel,
            level,
            message: message.into(),
            data,
        };
        let id = entry.id;

        let mut guard = self.channels.get(channel).lock();
        if guard.len() == CHANNEL_CAPACITY {
            guard.pop_front();
        }
        guard.push_back(entry);
        id
    }

    pub fn info(&self, channel: LogChannel, message: impl Into<String>, data: Value) -> Uuid {
        self.record(channel, LogLevel::Info, message, data)
    }

    /// Entries recorded on `date` (UTC), newest first.
    pub fn entries(&self, channel: LogChannel, date: NaiveDate) -> Vec<LogEntry> {
        self.channels
            .get(channel)
            .lock()
            .iter()
            .rev()
            .filter(|e| e.timestamp.date_naive() == date)
            .cloned()
            .collect()
    }

    pub fn len(&self, channel: LogChannel) -> usize {
        self.channels.get(channel).lock().len()
    }
}

/// Replaces the value of every sensitive key, at any depth.
fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (k, v) in map.iter_mut() {
                if SENSITIVE_KEYS.contains(&k.to_ascii_lowercase().as_str()) {
                    *v = Value::String(REDACTED.to_string());
                } else {
                    redact(v);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}
