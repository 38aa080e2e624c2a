pub mod gauge;
pub mod header;
pub mod indicators;

pub use gauge::ConcentrationGauge;
pub use header::Header;
pub use indicators::{LearningModeIndicator, StatusIndicator, WarningIndicator};
