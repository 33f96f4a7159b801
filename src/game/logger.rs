//! Combat logger with verbosity levels and in-memory capture
//!
//! Messages go to stdout, to an in-memory buffer, or both. Capture mode is
//! what tests use to assert on output without touching stdout. Event lines
//! are formatted through a bump arena that is reset after each message.

use bumpalo::collections::String as BumpString;
use bumpalo::Bump;
use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::fmt::Write as FmtWrite;
use std::ops::Deref;

use crate::game::events::CombatEvent;

/// Verbosity level for combat output
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum VerbosityLevel {
    /// Silent - no output during the battle
    Silent = 0,
    /// Minimal - only the outcome
    Minimal = 1,
    /// Normal - rounds, answers and hits (default)
    #[default]
    Normal = 2,
    /// Verbose - every state change
    Verbose = 3,
}

/// Output format for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Machine-readable JSON output (one object per line)
    Json,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stdout (default)
    #[default]
    Stdout,
    /// Capture only to in-memory buffer (no stdout)
    Memory,
    /// Both stdout and in-memory buffer
    Both,
}

/// A captured log line
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
    /// Optional category, e.g. "event" or "warning"
    pub category: Option<String>,
}

/// Read-only access to captured entries
pub struct LogGuard<'a> {
    guard: Ref<'a, Vec<LogEntry>>,
}

impl<'a> LogGuard<'a> {
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.guard.iter()
    }

    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }
}

impl<'a> Deref for LogGuard<'a> {
    type Target = [LogEntry];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Logger shared by the battle, its phases and the arena
pub struct CombatLogger {
    verbosity: VerbosityLevel,
    output_format: OutputFormat,
    output_mode: OutputMode,

    /// Scratch arena for formatting event lines
    format_bump: RefCell<Bump>,

    log_buffer: RefCell<Vec<LogEntry>>,
}

impl CombatLogger {
    pub fn new() -> Self {
        CombatLogger::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        CombatLogger {
            verbosity,
            output_format: OutputFormat::default(),
            output_mode: OutputMode::default(),
            format_bump: RefCell::new(Bump::new()),
            log_buffer: RefCell::new(Vec::new()),
        }
    }

    /// Silent logger that captures everything; handy for tests
    pub fn capturing() -> Self {
        let mut logger = CombatLogger::with_verbosity(VerbosityLevel::Verbose);
        logger.enable_capture();
        logger
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Capture to memory and suppress stdout
    pub fn enable_capture(&mut self) {
        self.output_mode = OutputMode::Memory;
    }

    pub fn disable_capture(&mut self) {
        self.output_mode = OutputMode::Stdout;
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.output_mode, OutputMode::Memory | OutputMode::Both)
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    /// Print buffered entries allowed by the verbosity, then clear the buffer
    pub fn flush_buffer(&mut self) {
        {
            let buffer = self.log_buffer.borrow();
            for entry in buffer.iter().filter(|e| e.level <= self.verbosity) {
                self.write_stdout(entry.level, &entry.message);
            }
        }
        self.clear_logs();
    }

    /// Captured entries
    ///
    /// ```ignore
    /// let hits = logger.logs().iter()
    ///     .filter(|log| log.message.starts_with("hit"))
    ///     .count();
    /// ```
    pub fn logs(&self) -> LogGuard<'_> {
        LogGuard {
            guard: self.log_buffer.borrow(),
        }
    }

    pub fn clear_logs(&mut self) {
        self.log_buffer.borrow_mut().clear();
        self.format_bump.borrow_mut().reset();
    }

    #[inline]
    fn write_stdout(&self, level: VerbosityLevel, message: &str) {
        match self.output_format {
            OutputFormat::Json => println!("{}", message),
            OutputFormat::Text if level == VerbosityLevel::Minimal => println!("{}", message),
            OutputFormat::Text => println!("  {}", message),
        }
    }

    fn record(&self, level: VerbosityLevel, message: &str, category: Option<&str>) {
        let should_capture = self.is_capturing();
        let should_output = matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both);

        if level > self.verbosity && !should_capture {
            return;
        }

        if should_capture {
            self.log_buffer.borrow_mut().push(LogEntry {
                level,
                message: message.to_string(),
                category: category.map(str::to_string),
            });
        }

        if should_output && level <= self.verbosity {
            self.write_stdout(level, message);
        }
    }

    fn record_text(&self, level: VerbosityLevel, message: &str) {
        match self.output_format {
            OutputFormat::Text => self.record(level, message, None),
            OutputFormat::Json => {
                let line = serde_json::json!({ "level": level, "message": message }).to_string();
                self.record(level, &line, None);
            }
        }
    }

    /// Silent messages are never printed or captured
    #[inline]
    pub fn silent(&self, _message: &str) {}

    #[inline]
    pub fn minimal(&self, message: &str) {
        self.record_text(VerbosityLevel::Minimal, message);
    }

    #[inline]
    pub fn normal(&self, message: &str) {
        self.record_text(VerbosityLevel::Normal, message);
    }

    #[inline]
    pub fn verbose(&self, message: &str) {
        self.record_text(VerbosityLevel::Verbose, message);
    }

    /// Recoverable misuse (out-of-range index and the like)
    ///
    /// Goes to stderr unless the logger is silent, and is always captured.
    pub fn warn(&self, message: &str) {
        if self.is_capturing() {
            self.log_buffer.borrow_mut().push(LogEntry {
                level: VerbosityLevel::Minimal,
                message: message.to_string(),
                category: Some("warning".to_string()),
            });
        }
        if self.verbosity > VerbosityLevel::Silent
            && matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both)
        {
            eprintln!("warning: {}", message);
        }
    }

    /// Log a combat event at Normal level
    pub fn event(&self, event: &CombatEvent) {
        if VerbosityLevel::Normal > self.verbosity && !self.is_capturing() {
            return;
        }

        let message = match self.output_format {
            OutputFormat::Json => match serde_json::to_string(event) {
                Ok(json) => json,
                Err(e) => {
                    self.warn(&format!("failed to encode event: {}", e));
                    return;
                }
            },
            OutputFormat::Text => {
                let bump = self.format_bump.borrow();
                let mut text = BumpString::new_in(&bump);
                let _ = write!(text, "{}", event);
                text.as_str().to_owned()
            }
        };
        self.format_bump.borrow_mut().reset();

        self.record(VerbosityLevel::Normal, &message, Some("event"));
    }
}

impl Default for CombatLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CombatLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombatLogger")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("log_count", &self.log_buffer.borrow().len())
            .finish()
    }
}

/// Clones settings only; the capture buffer starts empty
impl Clone for CombatLogger {
    fn clone(&self) -> Self {
        CombatLogger {
            verbosity: self.verbosity,
            output_format: self.output_format,
            output_mode: self.output_mode,
            format_bump: RefCell::new(Bump::new()),
            log_buffer: RefCell::new(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MixedNumber;
    use crate::game::events::PhaseKind;

    #[test]
    fn test_logger_creation() {
        let logger = CombatLogger::new();
        assert_eq!(logger.verbosity(), VerbosityLevel::Normal);
        assert!(!logger.is_capturing());
    }

    #[test]
    fn test_log_capture() {
        let mut logger = CombatLogger::new();
        logger.enable_capture();

        logger.normal("test message");
        logger.minimal("minimal message");

        let logs = logger.logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message, "test message");
        assert_eq!(logs[1].level, VerbosityLevel::Minimal);
    }

    #[test]
    fn test_capture_keeps_verbose_lines() {
        let mut logger = CombatLogger::with_verbosity(VerbosityLevel::Minimal);
        logger.enable_capture();

        logger.verbose("detail");
        assert_eq!(logger.logs().len(), 1);
        assert_eq!(logger.logs()[0].level, VerbosityLevel::Verbose);
    }

    #[test]
    fn test_event_text_and_json() {
        let mut logger = CombatLogger::capturing();
        let event = CombatEvent::AnswerAccepted {
            phase: PhaseKind::Attack,
            answer: MixedNumber::from_fraction(3, 4),
        };

        logger.event(&event);
        assert_eq!(logger.logs()[0].message, "attack: correct answer 3/4");
        assert_eq!(logger.logs()[0].category.as_deref(), Some("event"));

        logger.clear_logs();
        logger.set_output_format(OutputFormat::Json);
        logger.event(&event);
        let parsed: CombatEvent = serde_json::from_str(&logger.logs()[0].message).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_warnings_are_tagged() {
        let logger = CombatLogger::capturing();
        logger.warn("slot 9 out of range");
        let logs = logger.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].category.as_deref(), Some("warning"));
    }

    #[test]
    fn test_flush_buffer_clears() {
        let mut logger = CombatLogger::capturing();
        logger.normal("message 1");
        logger.normal("message 2");
        assert_eq!(logger.logs().len(), 2);

        logger.set_verbosity(VerbosityLevel::Silent);
        logger.flush_buffer();
        assert!(logger.logs().is_empty());
    }

    #[test]
    fn test_clone_starts_empty() {
        let logger = CombatLogger::capturing();
        logger.normal("kept");
        let copy = logger.clone();
        assert!(copy.is_capturing());
        assert!(copy.logs().is_empty());
    }
}
