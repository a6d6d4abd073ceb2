//! Telescope light collection.
//!
//! The calculator only needs the light-collecting geometry and the names of
//! the coating transmission and thermal emission resources. Collecting
//! area is the primary disk minus the central obstruction:
//! `A = π(R² - r²)`.
//!
//! # Examples
//!
//! ```rust
//! use itc::hardware::telescope::{models::EIGHT_METER, TelescopeConfig};
//!
//! let telescope = EIGHT_METER.clone();
//! assert!(telescope.collecting_area_m2() > 50.0);
//!
//! let custom = TelescopeConfig::new("1m", 0.5, 0.1, "telescope/aluminium.dat");
//! assert!((custom.collecting_area_m2() - std::f64::consts::PI * 0.24).abs() < 1e-12);
//! ```

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Telescope geometry and optical resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelescopeConfig {
    /// Telescope model name or identifier
    pub name: String,
    /// Radius of the primary mirror in meters
    pub primary_radius_m: f64,
    /// Radius of the central obstruction in meters
    pub obstruction_radius_m: f64,
    /// Resource name of the mirror coating transmission curve
    pub coating: String,
    /// Resource name of the thermal emission curve, if modelled
    #[serde(default)]
    pub thermal_background: Option<String>,
}

impl TelescopeConfig {
    /// Create a new telescope configuration
    pub fn new(
        name: impl Into<String>,
        primary_radius_m: f64,
        obstruction_radius_m: f64,
        coating: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            primary_radius_m,
            obstruction_radius_m,
            coating: coating.into(),
            thermal_background: None,
        }
    }

    /// Add a thermal emission resource
    pub fn with_thermal_background(mut self, resource: impl Into<String>) -> Self {
        self.thermal_background = Some(resource.into());
        self
    }

    /// Unobstructed light-collecting area in m²
    pub fn collecting_area_m2(&self) -> f64 {
        PI * (self.primary_radius_m.powi(2) - self.obstruction_radius_m.powi(2))
    }
}

/// Standard telescope models
pub mod models {
    use super::*;

    /// 8.1m Cassegrain with a 1m secondary obstruction
    pub static EIGHT_METER: Lazy<TelescopeConfig> = Lazy::new(|| {
        TelescopeConfig::new(
            "8m Cassegrain",
            4.05, // 8.1m primary
            0.5,  // 1m obstruction
            "telescope/aluminium.dat",
        )
        .with_thermal_background("telescope/thermal_background.dat")
    });

    /// 4m class telescope
    pub static FOUR_METER: Lazy<TelescopeConfig> = Lazy::new(|| {
        TelescopeConfig::new("4m", 2.0, 0.35, "telescope/aluminium.dat")
    });
}
