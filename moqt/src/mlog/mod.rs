//! MoQT event logging (mlog).
//!
//! Records protocol events as a qlog-compatible JSON-SEQ stream (RFC 7464),
//! one record per line, so they can be correlated with the transport's own
//! qlog output by connection id. The peer is symmetric, so unlike QUIC qlog
//! no vantage point is recorded; the reader tells client from server by
//! which side sent CLIENT_SETUP. Enabled per session by passing an
//! [MlogWriter] to connect/accept.

mod events;

pub use events::*;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use serde::Serialize;

/// Serializes [Event] records to any byte sink.
///
/// The first record is the stream header naming the event schema; every
/// record is flushed immediately so a crashed session still leaves a
/// readable log.
pub struct MlogWriter {
    sink: Box<dyn Write + Send>,
    started: Instant,
    records: u64,
}

impl MlogWriter {
    pub fn new(sink: Box<dyn Write + Send>) -> io::Result<Self> {
        let mut writer = Self {
            sink,
            started: Instant::now(),
            records: 0,
        };

        writer.record(&serde_json::json!({
            "qlog_version": "0.3",
            "qlog_format": "JSON-SEQ",
            "title": "moqt",
            "event_schemas": ["urn:ietf:params:qlog:events:moqt"],
        }))?;

        Ok(writer)
    }

    /// Log to a file, created fresh.
    pub fn to_file(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::new(Box::new(BufWriter::new(File::create(path)?)))
    }

    fn record<T: Serialize>(&mut self, value: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.sink, value)?;
        self.sink.write_all(b"\n")?;
        self.sink.flush()?;
        self.records += 1;
        Ok(())
    }

    /// Milliseconds since the session started, for event timestamps.
    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    pub fn add_event(&mut self, event: Event) -> io::Result<()> {
        self.record(&event)
    }

    /// Records written so far, the header included.
    pub fn records(&self) -> u64 {
        self.records
    }
}
