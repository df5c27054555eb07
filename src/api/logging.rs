use serde_json::Value;
use std::fs::OpenOptions;
use std::io::{IsTerminal, Write};

const DEFAULT_API_LOG_PATH: &str = "/tmp/achat-debug.log";
const DEBUG_PAYLOAD_ENV: &str = "ACHAT_DEBUG_PAYLOAD";
const API_LOG_PATH_ENV: &str = "ACHAT_API_LOG_PATH";

pub fn debug_payload_enabled() -> bool {
    std::env::var(DEBUG_PAYLOAD_ENV)
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

pub fn emit_debug_payload(request_url: &str, payload: &Value) {
    let formatted_payload = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|_| "<payload serialization error>".to_string());
    let message =
        format!("ACHAT DEBUG request url={request_url}\npayload:\n{formatted_payload}\n");
    emit_log_message(&message);
}

/// A frame that failed JSON decode is skipped, not fatal; keep a trace of it.
pub fn emit_frame_decode_error(payload: &str, decode_error: &serde_json::Error) {
    let message =
        format!("ACHAT WARN frame_skipped error={decode_error}\npayload:\n{payload}\n");
    emit_log_message(&message);
}

/// The interrupt call is best-effort; a failure must never escape `cancel`.
pub fn emit_interrupt_failure(session_id: &str, error: &anyhow::Error) {
    let message = format!("ACHAT WARN interrupt_failed session={session_id} error={error}\n");
    emit_log_message(&message);
}

fn emit_log_message(message: &str) {
    if let Some(path) = resolve_log_path() {
        if append_log_file(&path, message).is_ok() {
            return;
        }
    }

    eprintln!("{message}");
}

fn resolve_log_path() -> Option<String> {
    std::env::var(API_LOG_PATH_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            // Raw-mode TUI owns stderr; divert to a file instead of scribbling
            // over the alternate screen.
            if std::io::stderr().is_terminal() {
                Some(DEFAULT_API_LOG_PATH.to_string())
            } else {
                None
            }
        })
}

fn append_log_file(path: &str, message: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(message.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_payload_enabled_accepts_true_variants() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(DEBUG_PAYLOAD_ENV, "1");
        assert!(debug_payload_enabled());
        std::env::set_var(DEBUG_PAYLOAD_ENV, "TRUE");
        assert!(debug_payload_enabled());
        std::env::set_var(DEBUG_PAYLOAD_ENV, "0");
        assert!(!debug_payload_enabled());
        std::env::remove_var(DEBUG_PAYLOAD_ENV);
    }

    #[test]
    fn test_resolve_log_path_uses_api_log_path() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(API_LOG_PATH_ENV, "/tmp/test-achat.log");
        assert_eq!(resolve_log_path().as_deref(), Some("/tmp/test-achat.log"));
        std::env::remove_var(API_LOG_PATH_ENV);
    }

    #[test]
    fn test_append_log_file_appends_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("api.log");
        let path = path.to_str().expect("utf-8 path");

        append_log_file(path, "first\n").expect("first write");
        append_log_file(path, "second\n").expect("second write");

        let written = std::fs::read_to_string(path).expect("read back");
        assert_eq!(written, "first\nsecond\n");
    }
}
