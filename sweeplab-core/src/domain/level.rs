//! Market-structure levels supplied by the external data layer.
//!
//! Level snapshots arrive at coarse, irregular intervals (dealer
//! gamma-exposure recalculations, liquidity-trigger updates) and are looked
//! up by nearest-prior-timestamp through `SampledSeries`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Semantic category of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    Support,
    Resistance,
    Pivot,
}

/// Provenance of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelSource {
    /// Dealer-hedging-derived wall (call wall, put wall, gamma flip).
    GexWall,
    /// Session extreme carried as support/resistance.
    SessionExtreme,
    /// Liquidity-trigger level from the external feed.
    LiquidityTrigger,
}

/// A single scalar price level with category and provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub price: f64,
    pub kind: LevelKind,
    pub source: LevelSource,
}

/// One snapshot of all known levels at a point in time.
///
/// Mirrors the upstream feed shape: GEX walls and support/resistance arrays
/// from the options-derived calculator, plus liquidity-trigger levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub support: Vec<f64>,
    #[serde(default)]
    pub resistance: Vec<f64>,
    #[serde(default)]
    pub gamma_flip: Option<f64>,
    #[serde(default)]
    pub call_wall: Option<f64>,
    #[serde(default)]
    pub put_wall: Option<f64>,
    #[serde(default)]
    pub liquidity: Vec<f64>,
}

impl LevelSnapshot {
    /// Flatten the snapshot into categorized levels, in a stable order:
    /// walls first, then support, resistance, liquidity triggers.
    pub fn levels(&self) -> Vec<Level> {
        let mut out = Vec::new();
        if let Some(p) = self.put_wall {
            out.push(Level { price: p, kind: LevelKind::Support, source: LevelSource::GexWall });
        }
        if let Some(p) = self.call_wall {
            out.push(Level { price: p, kind: LevelKind::Resistance, source: LevelSource::GexWall });
        }
        if let Some(p) = self.gamma_flip {
            out.push(Level { price: p, kind: LevelKind::Pivot, source: LevelSource::GexWall });
        }
        for &p in &self.support {
            out.push(Level { price: p, kind: LevelKind::Support, source: LevelSource::SessionExtreme });
        }
        for &p in &self.resistance {
            out.push(Level { price: p, kind: LevelKind::Resistance, source: LevelSource::SessionExtreme });
        }
        for &p in &self.liquidity {
            out.push(Level { price: p, kind: LevelKind::Pivot, source: LevelSource::LiquidityTrigger });
        }
        out
    }

    /// Count levels strictly below `price` — used by the liquidity filter.
    pub fn count_below(&self, price: f64) -> usize {
        self.levels().iter().filter(|l| l.price < price).count()
    }

    /// Count levels strictly above `price`.
    pub fn count_above(&self, price: f64) -> usize {
        self.levels().iter().filter(|l| l.price > price).count()
    }
}
