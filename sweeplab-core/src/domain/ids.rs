//! Typed identifiers and the injectable id generator.
//!
//! Ids are monotonic within one generator. Each `SetupEngine` owns its own
//! `IdGen`, so parallel runs never share id space and eviction order can be
//! derived from ids without relying on collection iteration order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process-lifetime-unique setup identifier, monotonic per engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SetupId(pub u64);

impl fmt::Display for SetupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Zone identifier, monotonic per zone book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub u64);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Z{}", self.0)
    }
}

/// Monotonic id source. Not shared between engine instances.
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    next: u64,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn next_setup(&mut self) -> SetupId {
        SetupId(self.next())
    }

    pub fn next_zone(&mut self) -> ZoneId {
        ZoneId(self.next())
    }
}
