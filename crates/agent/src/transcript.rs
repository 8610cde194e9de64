//! Human-readable run transcripts.
//!
//! A [`Transcript`] receives every line the repair loop produces (iteration
//! headers, raw backend text, tool calls, observations, corrections) and fans
//! it out to any number of sinks. Every line is also emitted as a `debug!`
//! event. Sink failures are logged and otherwise ignored.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// Receives transcript lines.
pub trait TranscriptSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Writes lines to a file, truncated on open.
///
/// Lines are handed to a dedicated writer thread that appends and flushes
/// each one, keeping disk I/O off the async runtime. Dropping the sink drains
/// whatever is still queued.
pub struct FileSink {
    sender: Option<mpsc::Sender<String>>,
    writer: Option<JoinHandle<()>>,
}

impl FileSink {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        let (sender, receiver) = mpsc::channel::<String>();
        let writer = std::thread::Builder::new()
            .name("transcript-writer".into())
            .spawn(move || {
                for line in receiver {
                    if let Err(e) = writeln!(file, "{line}").and_then(|()| file.flush()) {
                        warn!("Failed to write transcript line: {e}");
                    }
                }
            })?;

        Ok(Self {
            sender: Some(sender),
            writer: Some(writer),
        })
    }
}

impl TranscriptSink for FileSink {
    fn write_line(&self, line: &str) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(line.to_string()).is_err() {
            warn!("Transcript writer stopped, dropping line");
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Closing the channel ends the writer loop
        self.sender.take();
        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                warn!("Transcript writer panicked");
            }
        }
    }
}

/// Hands each line to a closure (e.g. to stream progress to a caller).
pub struct CallbackSink<F>
where
    F: Fn(&str) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackSink<F>
where
    F: Fn(&str) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> TranscriptSink for CallbackSink<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn write_line(&self, line: &str) {
        (self.callback)(line);
    }
}

/// Fan-out over the attached sinks.
#[derive(Clone, Default)]
pub struct Transcript {
    sinks: Vec<Arc<dyn TranscriptSink>>,
}

impl Transcript {
    /// A transcript that only mirrors to `tracing`.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn TranscriptSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_file(self, path: &Path) -> std::io::Result<Self> {
        Ok(self.with_sink(Arc::new(FileSink::create(path)?)))
    }

    pub fn with_callback<F>(self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.with_sink(Arc::new(CallbackSink::new(callback)))
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn line(&self, line: impl AsRef<str>) {
        let line = line.as_ref();
        debug!(target: "catalogist::transcript", "{line}");
        for sink in &self.sinks {
            sink.write_line(line);
        }
    }
}

impl std::fmt::Debug for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcript")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

/// Truncate to `max` characters, appending `...` when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn none_has_no_sinks() {
        let transcript = Transcript::none();
        assert_eq!(transcript.sink_count(), 0);
        transcript.line("ignored");
    }

    #[test]
    fn callback_receives_lines_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let transcript =
            Transcript::none().with_callback(move |line| captured.lock().unwrap().push(line.to_string()));

        transcript.line("[iteration 1]");
        transcript.line(String::from("Action: get_default_template"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["[iteration 1]", "Action: get_default_template"]
        );
    }

    #[test]
    fn file_sink_truncates_and_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("agent.log");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale content\n").unwrap();

        let transcript = Transcript::none().with_file(&path).unwrap();
        transcript.line("第一行");
        transcript.line("second");
        drop(transcript);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "第一行\nsecond\n");
    }

    #[tokio::test]
    async fn file_sink_keeps_order_across_clones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");

        let transcript = Transcript::none().with_file(&path).unwrap();
        let clone = transcript.clone();
        for i in 0..50 {
            if i % 2 == 0 {
                transcript.line(format!("line {i}"));
            } else {
                clone.line(format!("line {i}"));
            }
        }
        drop(clone);
        // The sink lives on while one handle remains
        transcript.line("tail");
        drop(transcript);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 51);
        assert_eq!(lines[0], "line 0");
        assert_eq!(lines[49], "line 49");
        assert_eq!(lines[50], "tail");
    }

    #[test]
    fn fans_out_to_every_sink() {
        let count = Arc::new(Mutex::new(0usize));
        let a = count.clone();
        let b = count.clone();
        let transcript = Transcript::none()
            .with_callback(move |_| *a.lock().unwrap() += 1)
            .with_callback(move |_| *b.lock().unwrap() += 1);
        transcript.line("x");
        assert_eq!(transcript.sink_count(), 2);
        assert_eq!(*count.lock().unwrap(), 2);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("投标函模板", 3), "投标函...");
        assert_eq!(truncate_chars("abcdef", 6), "abcdef");
    }
}
