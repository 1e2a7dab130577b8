//! Warning types for non-fatal errors during JSONL processing.
//!
//! Resilient loading keeps going past bad lines. Each skipped line becomes a
//! [`Warning`], accumulated in a shared [`WarningCollector`].
//!
//! ```
//! use linchpin_jsonl::warning::{Warning, WarningCollector};
//!
//! let collector = WarningCollector::new();
//! collector.add(Warning::MalformedJson {
//!     line_number: 5,
//!     error: "unexpected end of input".to_string(),
//! });
//!
//! let warnings = collector.into_warnings();
//! assert_eq!(warnings[0].line_number(), 5);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A non-fatal warning that occurred during JSONL processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A non-empty line did not parse into the expected record type.
    MalformedJson {
        /// The 1-based line number where the error occurred.
        line_number: usize,
        /// A description of the JSON parsing error.
        error: String,
    },

    /// A line could not be read at all (for example invalid UTF-8).
    SkippedLine {
        /// The 1-based line number that was skipped.
        line_number: usize,
        /// The reason the line was skipped.
        reason: String,
    },
}

impl Warning {
    /// Returns the line number associated with this warning.
    #[must_use]
    pub fn line_number(&self) -> usize {
        match self {
            Self::MalformedJson { line_number, .. } | Self::SkippedLine { line_number, .. } => {
                *line_number
            }
        }
    }

    /// Returns a static string identifying the warning kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedJson { .. } => "malformed_json",
            Self::SkippedLine { .. } => "skipped_line",
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: malformed JSON: {error}")
            }
            Self::SkippedLine {
                line_number,
                reason,
            } => write!(f, "line {line_number}: skipped: {reason}"),
        }
    }
}

impl std::error::Error for Warning {}

/// A cloneable, thread-safe sink for warnings.
///
/// Clones share the same storage, so a collector can be handed to a stream
/// and inspected by the caller once the stream has been drained.
#[derive(Debug, Clone, Default)]
pub struct WarningCollector {
    warnings: Arc<Mutex<Vec<Warning>>>,
}

impl WarningCollector {
    /// Creates a new empty `WarningCollector`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while pushing to a Vec cannot leave it inconsistent, so a
    // poisoned lock is still safe to use.
    fn guard(&self) -> MutexGuard<'_, Vec<Warning>> {
        self.warnings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a warning to the collector.
    pub fn add(&self, warning: Warning) {
        self.guard().push(warning);
    }

    /// Returns the number of warnings collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Returns `true` if no warnings have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of all collected warnings without consuming the collector.
    #[must_use]
    pub fn warnings(&self) -> Vec<Warning> {
        self.guard().clone()
    }

    /// Consumes the collector and returns all collected warnings.
    ///
    /// Moves the warnings out when this is the last handle, clones otherwise.
    #[must_use]
    pub fn into_warnings(self) -> Vec<Warning> {
        match Arc::try_unwrap(self.warnings) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => shared
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_line_and_detail() {
        let warning = Warning::MalformedJson {
            line_number: 7,
            error: "expected value".to_string(),
        };
        let text = warning.to_string();
        assert!(text.contains("line 7"));
        assert!(text.contains("expected value"));
        assert_eq!(warning.kind(), "malformed_json");
    }

    #[test]
    fn clones_share_state() {
        let collector = WarningCollector::new();
        let clone = collector.clone();

        clone.add(Warning::SkippedLine {
            line_number: 1,
            reason: "invalid utf-8".to_string(),
        });

        assert_eq!(collector.len(), 1);
        assert_eq!(collector.warnings(), clone.warnings());
    }

    #[test]
    fn into_warnings_with_live_clone_copies() {
        let collector = WarningCollector::new();
        let clone = collector.clone();
        collector.add(Warning::SkippedLine {
            line_number: 3,
            reason: "test".to_string(),
        });

        let warnings = collector.into_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(clone.len(), 1);
    }

    #[test]
    fn concurrent_adds_are_all_kept() {
        let collector = WarningCollector::new();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let c = collector.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        c.add(Warning::SkippedLine {
                            line_number: t * 100 + i,
                            reason: "load".to_string(),
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(collector.len(), 100);
    }
}
