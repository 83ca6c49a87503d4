//! Market-structure extraction: swing points, imbalance zones, and the
//! retracement admissibility filter.

pub mod fib;
pub mod swings;
pub mod zones;

pub use fib::admissible;
pub use swings::SwingTracker;
pub use zones::ZoneBook;
