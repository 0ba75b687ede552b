use chrono::Local;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Maximum number of log entries to keep in memory
const MAX_LOG_ENTRIES: usize = 1000;

/// A log entry with timestamp and message
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: Level, target: &str, message: String) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S.%3f").to_string(),
            level: level.to_string().to_uppercase(),
            target: target.to_string(),
            message,
        }
    }

    /// Format for display in the log pane and the log file
    pub fn format_for_display(&self) -> String {
        format!(
            "[{}] {} [{}] {}",
            self.timestamp, self.level, self.target, self.message
        )
    }
}

/// Thread-safe ring buffer for log entries
#[derive(Clone)]
pub struct LogRingBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl Default for LogRingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LogRingBuffer {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_LOG_ENTRIES))),
        }
    }

    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= MAX_LOG_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn get_recent(&self, count: usize) -> Vec<LogEntry> {
        let entries = self.entries.lock().unwrap();
        entries.iter().rev().take(count).rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split a compact-format line, `LEVEL target: message`, into an entry
pub fn parse_compact_line(line: &str) -> Option<LogEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (level, rest) = match line.split_once(' ') {
        Some(("TRACE", rest)) => (Level::TRACE, rest),
        Some(("DEBUG", rest)) => (Level::DEBUG, rest),
        Some(("INFO", rest)) => (Level::INFO, rest),
        Some(("WARN", rest)) => (Level::WARN, rest),
        Some(("ERROR", rest)) => (Level::ERROR, rest),
        _ => return Some(LogEntry::new(Level::INFO, "general", line.to_string())),
    };

    let rest = rest.trim_start();
    let (target, message) = match rest.split_once(':') {
        Some((target, message)) if !target.contains(' ') => (target, message.trim()),
        _ => ("general", rest),
    };

    Some(LogEntry::new(level, target, message.to_string()))
}

/// Writer for the fmt layer: every line goes to the ring buffer and, when
/// configured, to the log file.
#[derive(Clone)]
pub struct RingBufferWriter {
    buffer: LogRingBuffer,
    file: Option<Arc<Mutex<File>>>,
}

impl RingBufferWriter {
    pub fn new(buffer: LogRingBuffer) -> Self {
        Self { buffer, file: None }
    }

    pub fn with_file(buffer: LogRingBuffer, file: File) -> Self {
        Self {
            buffer,
            file: Some(Arc::new(Mutex::new(file))),
        }
    }
}

impl std::io::Write for RingBufferWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = std::str::from_utf8(buf) {
            for entry in text.lines().filter_map(parse_compact_line) {
                if let Some(file) = &self.file {
                    if let Ok(mut file) = file.lock() {
                        let _ = writeln!(file, "{}", entry.format_for_display());
                    }
                }
                self.buffer.push(entry);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                file.flush()?;
            }
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for RingBufferWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Where the interactive session keeps its logs
pub struct LogHandle {
    pub buffer: LogRingBuffer,
    pub log_path: Option<PathBuf>,
}

/// Cross-platform log directory
pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("lookup-cli").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("lookup-cli"))
}

/// Open a timestamped log file in `dir` and point `latest.log` at it
fn open_log_file(dir: &Path) -> Option<(File, PathBuf)> {
    std::fs::create_dir_all(dir).ok()?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let log_path = dir.join(format!("lookup-cli_{timestamp}.log"));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok()?;

    #[cfg(unix)]
    {
        let latest = dir.join("latest.log");
        let _ = std::fs::remove_file(&latest);
        let _ = std::os::unix::fs::symlink(&log_path, &latest);
    }

    Some((file, log_path))
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize tracing for the TUI: nothing may reach the terminal, so
/// everything goes to the ring buffer (and optionally a file in `file_dir`).
pub fn init_tracing(default_level: &str, file_dir: Option<&Path>) -> LogHandle {
    let buffer = LogRingBuffer::new();
    let (writer, log_path) = match file_dir.and_then(open_log_file) {
        Some((file, path)) => (RingBufferWriter::with_file(buffer.clone(), file), Some(path)),
        None => (RingBufferWriter::new(buffer.clone()), None),
    };

    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .without_time()
        .compact();

    let _ = tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(fmt_layer)
        .try_init();

    tracing::info!(target: "system", "Tracing initialized");

    LogHandle { buffer, log_path }
}

/// Initialize tracing for one-shot commands, logging to stderr
pub fn init_stderr_tracing(default_level: &str) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compact_line() {
        let entry = parse_compact_line(" INFO search: Lookup #1 for \"Jane\"").unwrap();
        assert_eq!(entry.level, "INFO");
        assert_eq!(entry.target, "search");
        assert_eq!(entry.message, "Lookup #1 for \"Jane\"");

        let entry = parse_compact_line("WARN something odd: happened").unwrap();
        assert_eq!(entry.target, "general");
        assert_eq!(entry.message, "something odd: happened");

        let entry = parse_compact_line("no level here").unwrap();
        assert_eq!(entry.level, "INFO");
        assert!(parse_compact_line("   ").is_none());
    }

    #[test]
    fn test_ring_buffer_caps_entries() {
        let buffer = LogRingBuffer::new();
        for i in 0..(MAX_LOG_ENTRIES + 5) {
            buffer.push(LogEntry::new(Level::DEBUG, "test", format!("entry {i}")));
        }
        assert_eq!(buffer.len(), MAX_LOG_ENTRIES);
        let recent = buffer.get_recent(2);
        assert_eq!(recent[1].message, format!("entry {}", MAX_LOG_ENTRIES + 4));
    }

    #[test]
    fn test_writer_feeds_buffer_and_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("test.log");
        let file = File::create(&path).unwrap();
        let buffer = LogRingBuffer::new();
        let mut writer = RingBufferWriter::with_file(buffer.clone(), file);

        writer.write_all(b" INFO api: first\nDEBUG dispatch: second\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(buffer.len(), 2);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("INFO [api] first"));
        assert!(contents.contains("DEBUG [dispatch] second"));
    }
}
