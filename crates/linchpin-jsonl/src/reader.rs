//! JSONL reading operations.
//!
//! This module provides async functionality for reading JSONL files line-by-line
//! with efficient buffering and line number tracking for error reporting.

use crate::warning::{Warning, WarningCollector};
use crate::{Error, Result};
use futures::stream::{self, Stream, StreamExt};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Async reader for JSONL (JSON Lines) data.
///
/// `JsonlReader` wraps an async reader and provides buffered reading of JSONL
/// formatted data. It tracks line numbers to provide useful context in error
/// messages when parsing fails.
///
/// # Examples
///
/// ```no_run
/// use linchpin_jsonl::reader::JsonlReader;
/// use tokio::fs::File;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let file = File::open("edges.jsonl").await?;
/// let mut reader = JsonlReader::new(file);
/// while let Some(value) = reader.read_value::<serde_json::Value>().await? {
///     println!("{value}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct JsonlReader<R> {
    /// Buffered reader wrapping the underlying async reader.
    reader: BufReader<R>,
    /// Current line number (1-based counting, 0 before any lines are read).
    line_number: usize,
}

impl<R: AsyncRead + Unpin> JsonlReader<R> {
    /// Creates a new `JsonlReader` wrapping the given async reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
        }
    }

    /// Creates a new `JsonlReader` with a custom buffer capacity.
    #[must_use]
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
        }
    }

    /// Returns the 1-based number of the last line read, or 0 before any read.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Reads the next raw line without its trailing newline.
    ///
    /// Returns `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the underlying reader fails or the line is not
    /// valid UTF-8.
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }

    /// Reads and deserializes the next non-blank line.
    ///
    /// Returns `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] carrying the line number when a line does not
    /// deserialize into `T`, or [`Error::Io`] on read failure.
    pub async fn read_value<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        while let Some(line) = self.read_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return serde_json::from_str(trimmed)
                .map(Some)
                .map_err(|source| Error::Json {
                    line_number: self.line_number,
                    source,
                });
        }
        Ok(None)
    }

    /// Converts the reader into a stream that yields every parseable record.
    ///
    /// Malformed lines are skipped and reported to `collector` as
    /// [`Warning::MalformedJson`]. An I/O failure ends the stream after a
    /// [`Warning::SkippedLine`] is recorded for the line being read.
    pub fn stream_resilient<T>(self, collector: WarningCollector) -> impl Stream<Item = T>
    where
        T: DeserializeOwned,
    {
        stream::unfold((self, collector), |(mut reader, collector)| async move {
            loop {
                match reader.read_line().await {
                    Ok(None) => return None,
                    Ok(Some(line)) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<T>(trimmed) {
                            Ok(value) => return Some((value, (reader, collector))),
                            Err(e) => collector.add(Warning::MalformedJson {
                                line_number: reader.line_number(),
                                error: e.to_string(),
                            }),
                        }
                    }
                    Err(e) => {
                        collector.add(Warning::SkippedLine {
                            line_number: reader.line_number() + 1,
                            reason: e.to_string(),
                        });
                        return None;
                    }
                }
            }
        })
    }
}

/// Reads every parseable record from a JSONL file.
///
/// Malformed lines do not abort the load; they are returned as warnings next to
/// the records that did parse.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened.
pub async fn read_jsonl_resilient<T, P>(path: P) -> Result<(Vec<T>, Vec<Warning>)>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref()).await?;
    let collector = WarningCollector::new();
    let records: Vec<T> = JsonlReader::new(file)
        .stream_resilient(collector.clone())
        .collect()
        .await;

    let warnings = collector.into_warnings();
    if !warnings.is_empty() {
        tracing::warn!(
            path = %path.as_ref().display(),
            count = warnings.len(),
            "Skipped malformed JSONL lines"
        );
    }
    Ok((records, warnings))
}
