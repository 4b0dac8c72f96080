use std::{
    fs::OpenOptions,
    io::Write,
    path::PathBuf,
    sync::Arc,
};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::{config::Config, errors::Error, Result};

const AUDIT_MAX_TEXT: usize = 500;

/// RFC3339 timestamp in UTC.
pub fn iso_timestamp_utc() -> String {
    Utc::now().to_rfc3339()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pack_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiles: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized: Option<bool>,
}

impl AuditEvent {
    fn base(event: &str, user_id: Option<u64>, chat_id: i64) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: event.to_string(),
            user_id,
            chat_id: Some(chat_id),
            stage: None,
            success: None,
            error_kind: None,
            error: None,
            pack_name: None,
            tiles: None,
            authorized: None,
        }
    }

    pub fn stage(user_id: Option<u64>, chat_id: i64, stage: &str) -> Self {
        Self {
            stage: Some(stage.to_string()),
            ..Self::base("stage", user_id, chat_id)
        }
    }

    pub fn tiled(user_id: Option<u64>, chat_id: i64, tiles: usize) -> Self {
        Self {
            tiles: Some(tiles),
            ..Self::base("tiled", user_id, chat_id)
        }
    }

    pub fn published(user_id: Option<u64>, chat_id: i64, pack_name: &str, tiles: usize) -> Self {
        Self {
            success: Some(true),
            pack_name: Some(pack_name.to_string()),
            tiles: Some(tiles),
            ..Self::base("outcome", user_id, chat_id)
        }
    }

    pub fn failed(user_id: Option<u64>, chat_id: i64, stage: &str, error: &Error) -> Self {
        Self {
            stage: Some(stage.to_string()),
            success: Some(false),
            error_kind: Some(error.kind().to_string()),
            error: Some(error.to_string()),
            ..Self::base("outcome", user_id, chat_id)
        }
    }

    pub fn auth(user_id: Option<u64>, chat_id: i64, authorized: bool) -> Self {
        Self {
            authorized: Some(authorized),
            ..Self::base("auth", user_id, chat_id)
        }
    }
}

/// Observability capability handed to the components that report progress.
///
/// Recording never fails the caller; sinks log their own write errors.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Emits audit events as `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAudit;

impl AuditSink for TracingAudit {
    fn record(&self, event: AuditEvent) {
        match (&event.error_kind, &event.error) {
            (Some(kind), Some(error)) => warn!(
                event = %event.event,
                user_id = ?event.user_id,
                chat_id = ?event.chat_id,
                stage = ?event.stage,
                error_kind = %kind,
                error = %error,
                "audit"
            ),
            _ => info!(
                event = %event.event,
                user_id = ?event.user_id,
                chat_id = ?event.chat_id,
                stage = ?event.stage,
                pack_name = ?event.pack_name,
                tiles = ?event.tiles,
                authorized = ?event.authorized,
                "audit"
            ),
        }
    }
}

/// Appends audit events to a file, as JSON lines or a readable block format.
#[derive(Clone, Debug)]
pub struct FileAudit {
    path: PathBuf,
    json: bool,
}

impl FileAudit {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn write(&self, mut event: AuditEvent) -> Result<()> {
        if let Some(s) = &event.error {
            event.error = Some(truncate_text(s, AUDIT_MAX_TEXT));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if self.json {
            let line = serde_json::to_string(&event)?;
            writeln!(file, "{line}")?;
            return Ok(());
        }

        // Plain text format for readability.
        let mut out = String::new();
        out.push('\n');
        out.push_str(&"=".repeat(60));

        let value = serde_json::to_value(&event)?;
        let Some(obj) = value.as_object() else {
            return Err(Error::External(
                "audit event is not a JSON object".to_string(),
            ));
        };
        for (k, v) in obj {
            out.push('\n');
            out.push_str(k);
            out.push_str(": ");
            out.push_str(&json_value_to_display(v));
        }
        out.push('\n');

        file.write_all(out.as_bytes())?;
        Ok(())
    }
}

impl AuditSink for FileAudit {
    fn record(&self, event: AuditEvent) {
        if let Err(e) = self.write(event) {
            warn!(path = %self.path.display(), error = %e, "failed to write audit event");
        }
    }
}

/// Forwards every event to each inner sink.
pub struct FanOut(pub Vec<Arc<dyn AuditSink>>);

impl AuditSink for FanOut {
    fn record(&self, event: AuditEvent) {
        for sink in &self.0 {
            sink.record(event.clone());
        }
    }
}

/// Process-wide default: tracing only.
pub fn default_sink() -> Arc<dyn AuditSink> {
    Arc::new(TracingAudit)
}

/// Tracing, plus a file when `AUDIT_LOG_PATH` is set.
pub fn from_config(cfg: &Config) -> Arc<dyn AuditSink> {
    match &cfg.audit_log_path {
        Some(path) => Arc::new(FanOut(vec![
            default_sink(),
            Arc::new(FileAudit::new(path.clone(), cfg.audit_log_json)),
        ])),
        None => default_sink(),
    }
}

pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}

fn json_value_to_display(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.to_string(),
        other => serde_json::to_string(other).unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}
