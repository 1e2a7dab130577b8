//! Hash-based edge ID generation.
//!
//! Edge IDs look like `dep-a3f8`: a fixed prefix plus a base36 slice of a
//! SHA-256 digest over the edge endpoints, creator, timestamp and a nonce.
//! The hash part grows from 4 to 6 characters as the store grows, keeping
//! collisions rare while IDs stay short enough to type.
//!
//! ```
//! use linchpin::id_generation::EdgeIdGenerator;
//!
//! let mut generator = EdgeIdGenerator::new(0);
//! let id = generator.generate("task-b", "task-a", "alice").unwrap();
//! assert!(id.as_str().starts_with("dep-"));
//! ```

use crate::domain::EdgeId;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

/// Prefix shared by all edge IDs
pub const EDGE_ID_PREFIX: &str = "dep";

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;
const MAX_HASH_LENGTH: usize = 6;

/// Errors that can occur during ID generation
#[derive(Debug, Error)]
pub enum IdGenerationError {
    /// Every nonce and length produced an ID that is already taken
    #[error("Unable to generate unique edge ID after {attempts} attempts")]
    CollisionExhausted {
        /// Number of nonces tried
        attempts: u32,
    },
}

/// Collision-checked generator for [`EdgeId`]s.
///
/// Register every ID already in the store before generating new ones.
#[derive(Debug, Default)]
pub struct EdgeIdGenerator {
    existing_ids: HashSet<String>,
    store_size: usize,
}

impl EdgeIdGenerator {
    /// Create a generator sized for a store holding `store_size` edges.
    #[must_use]
    pub fn new(store_size: usize) -> Self {
        Self {
            existing_ids: HashSet::new(),
            store_size,
        }
    }

    /// Register an existing ID to prevent collisions.
    pub fn register(&mut self, id: &EdgeId) {
        self.existing_ids.insert(id.as_str().to_string());
        self.store_size = self.store_size.max(self.existing_ids.len());
    }

    /// Forget a removed ID so the store size estimate stays honest.
    pub fn release(&mut self, id: &EdgeId) {
        self.existing_ids.remove(id.as_str());
        self.store_size = self.existing_ids.len();
    }

    /// Generate a new unique edge ID.
    ///
    /// # Errors
    ///
    /// Returns [`IdGenerationError::CollisionExhausted`] if no free ID is found
    /// at any length.
    pub fn generate(
        &mut self,
        from: &str,
        to: &str,
        creator: &str,
    ) -> Result<EdgeId, IdGenerationError> {
        let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();

        for length in self.adaptive_length()..=MAX_HASH_LENGTH {
            for nonce in 0..MAX_NONCE {
                let id = hash_id(from, to, creator, timestamp, nonce, length);
                if self.existing_ids.insert(id.clone()) {
                    if nonce > 0 {
                        debug!(nonce, length, "Generated unique edge ID after collisions");
                    }
                    self.store_size += 1;
                    return Ok(EdgeId::new(id));
                }
            }
            warn!(length, max_nonce = MAX_NONCE, "Edge ID nonces exhausted, growing length");
        }

        Err(IdGenerationError::CollisionExhausted {
            attempts: MAX_NONCE,
        })
    }

    /// Hash length for the current store size.
    ///
    /// - 0-500 edges: 4 chars
    /// - 501-1,500: 5 chars
    /// - 1,500+: 6 chars
    fn adaptive_length(&self) -> usize {
        match self.store_size {
            0..=500 => 4,
            501..=1500 => 5,
            _ => 6,
        }
    }
}

fn hash_id(from: &str, to: &str, creator: &str, timestamp: i64, nonce: u32, length: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{from}|{to}|{creator}|{timestamp}|{nonce}").as_bytes());
    let digest = hasher.finalize();
    format!("{EDGE_ID_PREFIX}-{}", encode_base36(&digest[..8], length))
}

/// Encode up to 8 bytes as a fixed-length base36 string.
fn encode_base36(bytes: &[u8], length: usize) -> String {
    let mut n = bytes
        .iter()
        .fold(0u64, |acc, &b| acc.wrapping_shl(8).wrapping_add(u64::from(b)));

    let mut out = vec![b'0'; length];
    for slot in out.iter_mut().rev() {
        *slot = BASE36_CHARS[(n % 36) as usize];
        n /= 36;
    }
    out.into_iter().map(char::from).collect()
}
