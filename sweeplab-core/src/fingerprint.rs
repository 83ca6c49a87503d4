//! Run fingerprinting — deterministic identification of a replay run.
//!
//! Two runs with byte-identical configuration and input data share a
//! fingerprint; anything else differs. blake3 keeps the hashes stable
//! across builds and platforms.

use crate::config::{OrderParams, StrategyParams};
use crate::domain::Bar;
use crate::sim::SimParams;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex blake3 digest newtype.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest(pub String);

impl Digest {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content hash of the full run configuration (strategy + order + sim).
pub fn config_hash(
    strategy: &StrategyParams,
    order: &OrderParams,
    sim: &SimParams,
) -> Digest {
    let canonical = serde_json::json!({
        "strategy": strategy,
        "order": order,
        "sim": sim,
    });
    Digest::from_bytes(canonical.to_string().as_bytes())
}

/// Content hash of a bar stream: every field of every bar contributes.
pub fn dataset_hash(bars: &[Bar]) -> Digest {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.timestamp_millis().to_le_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    Digest(hasher.finalize().to_hex().to_string())
}

/// Complete fingerprint of a replay run, persisted with its artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub config_hash: Digest,
    pub dataset_hash: Digest,
}

impl RunFingerprint {
    pub fn new(
        strategy: &StrategyParams,
        order: &OrderParams,
        sim: &SimParams,
        bars: &[Bar],
    ) -> Self {
        Self {
            config_hash: config_hash(strategy, order, sim),
            dataset_hash: dataset_hash(bars),
        }
    }

    /// Single run identity combining both hashes.
    pub fn run_id(&self) -> Digest {
        Digest::from_bytes(format!("{}:{}", self.config_hash, self.dataset_hash).as_bytes())
    }
}
