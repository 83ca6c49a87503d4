//! Domain types shared across the engine, compiler, and simulator.

pub mod bar;
pub mod ids;
pub mod level;
pub mod order;
pub mod swing;
pub mod trade;
pub mod zone;

pub use bar::{Bar, Direction, Timeframe};
pub use ids::{IdGen, SetupId, ZoneId};
pub use level::{Level, LevelKind, LevelSnapshot, LevelSource};
pub use order::{EntryModel, Order, Side, TrailingSpec};
pub use swing::{SwingKind, SwingPoint};
pub use trade::{ExitReason, TradeRecord};
pub use zone::{Zone, ZoneTrigger};
