//! SweepLab Core — setup detection state machine and execution simulation.
//!
//! This crate contains the algorithmic heart of the toolkit:
//! - Domain types (bars, levels, zones, swing points, orders, trade records)
//! - Time-series alignment for irregularly sampled level snapshots
//! - Swing/structure extraction and three-bar imbalance (zone) detection
//! - The multi-phase setup state machine (sweep → structure shift →
//!   entry zone → entry pending), arena-backed, event-emitting
//! - The signal-to-order compiler with risk filtering
//! - The deterministic worst-case-first execution simulator
//!
//! The core performs no I/O, reads no clock, and logs nothing: diagnostics
//! leave the crate as structured `TransitionEvent` values, and identical
//! inputs always reproduce identical outputs.

pub mod compiler;
pub mod config;
pub mod domain;
pub mod fingerprint;
pub mod series;
pub mod setups;
pub mod sim;
pub mod structure;
