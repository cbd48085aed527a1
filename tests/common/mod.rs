//! Shared utilities for integration tests.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use gcplog::{LogConfig, LogWriter, Logger};

/// An in-memory sink that captures everything the logger writes.
#[derive(Clone, Default)]
pub struct CaptureSink(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CaptureSink {
    /// Everything written so far, split into lines.
    #[allow(dead_code)]
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// A logger wired to a capture sink instead of stdout.
#[allow(dead_code)]
pub fn capturing_logger(project_id: &str) -> (Logger, CaptureSink) {
    let sink = CaptureSink::default();
    let config = LogConfig::builder().project_id(project_id).build().unwrap();
    let logger = Logger::with_writer(config, LogWriter::with_sink(Box::new(sink.clone())));
    (logger, sink)
}
