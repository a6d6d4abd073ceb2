pub mod detector;
pub mod telescope;

pub use detector::DetectorConfig;
pub use telescope::TelescopeConfig;
