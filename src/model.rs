use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DashError;

/// Dropdown value meaning "every launch site".
pub const ALL_SITES: &str = "ALL";

pub const SLIDER_MIN_KG: f64 = 0.0;
pub const SLIDER_MAX_KG: f64 = 10000.0;
pub const SLIDER_STEP_KG: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRecord {
    pub launch_site: String,
    pub payload_mass_kg: f64,
    /// 1 = success, 0 = failure.
    pub outcome: u8,
    pub booster_category: String,
}

impl LaunchRecord {
    pub fn is_success(&self) -> bool {
        self.outcome == 1
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "site", rename_all = "lowercase")]
pub enum SiteSelection {
    #[default]
    All,
    Site(String),
}

impl SiteSelection {
    /// Maps a raw dropdown value. `ALL` is the sentinel, anything else is a site name.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == ALL_SITES {
            SiteSelection::All
        } else {
            SiteSelection::Site(trimmed.to_string())
        }
    }

    pub fn as_value(&self) -> &str {
        match self {
            SiteSelection::All => ALL_SITES,
            SiteSelection::Site(name) => name,
        }
    }

    pub fn matches(&self, launch_site: &str) -> bool {
        match self {
            SiteSelection::All => true,
            SiteSelection::Site(name) => name == launch_site,
        }
    }
}

impl fmt::Display for SiteSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_value())
    }
}

/// Inclusive payload window. Always ordered: an inverted pair is swapped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PayloadRange {
    low: f64,
    high: f64,
}

impl PayloadRange {
    pub fn new(a: f64, b: f64) -> Result<Self, DashError> {
        if !a.is_finite() || !b.is_finite() {
            return Err(DashError::InvalidRange { low: a, high: b });
        }
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Ok(Self { low, high })
    }

    /// Range as submitted from the slider: ordered, then clamped to the slider bounds.
    pub fn from_slider(a: f64, b: f64) -> Result<Self, DashError> {
        let range = Self::new(a, b)?;
        Ok(Self {
            low: range.low.clamp(SLIDER_MIN_KG, SLIDER_MAX_KG),
            high: range.high.clamp(SLIDER_MIN_KG, SLIDER_MAX_KG),
        })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn contains(&self, payload_mass_kg: f64) -> bool {
        self.low <= payload_mass_kg && payload_mass_kg <= self.high
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieSlice {
    pub label: String,
    pub value: u64,
}

impl PieSlice {
    pub fn new(label: impl Into<String>, value: u64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub payload_mass_kg: f64,
    pub outcome: u8,
    pub booster_category: String,
}

impl From<&LaunchRecord> for ScatterPoint {
    fn from(rec: &LaunchRecord) -> Self {
        Self {
            payload_mass_kg: rec.payload_mass_kg,
            outcome: rec.outcome,
            booster_category: rec.booster_category.clone(),
        }
    }
}
