use crate::severity::LogSeverity;
use crate::systime::now;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU8, Ordering};

const THRESHOLD_ENV: &str = "WORLDBRIDGE_LOG";

static MIN_SEVERITY: Lazy<AtomicU8> = Lazy::new(|| {
    let initial = std::env::var(THRESHOLD_ENV)
        .ok()
        .and_then(|value| LogSeverity::parse(&value))
        .unwrap_or(LogSeverity::Info);
    AtomicU8::new(initial as u8)
});

fn from_level(level: u8) -> LogSeverity {
    match level {
        0 => LogSeverity::Debug,
        1 => LogSeverity::Info,
        2 => LogSeverity::Warning,
        3 => LogSeverity::Error,
        _ => LogSeverity::Fatal,
    }
}

/// Current threshold; messages below it are dropped.
pub fn min_severity() -> LogSeverity {
    from_level(MIN_SEVERITY.load(Ordering::Relaxed))
}

pub fn set_min_severity(severity: LogSeverity) {
    MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
}

pub fn enabled(severity: LogSeverity) -> bool {
    severity >= min_severity()
}

/// Formats a log line without printing it.
pub fn format_line(msg: &str, log_severity: LogSeverity) -> String {
    format!("[{}] {} {}", log_severity, now(), msg)
}

pub fn log(msg: String, log_severity: LogSeverity) {
    if !enabled(log_severity) {
        return;
    }
    let line = format_line(&msg, log_severity);
    if log_severity >= LogSeverity::Error {
        eprintln!("{}", line);
    } else {
        println!("{}", line);
    }
}
