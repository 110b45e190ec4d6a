use serde::{Deserialize, Serialize};

/// Calibration of one optical filter. Limits and step size are focuser ticks
/// relative to the filter's focus position.
#[derive(Deserialize, Debug, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Filter {
    pub name: String,
    pub empty_slot_offset: Option<i64>,
    pub relative_lower_limit: i64,
    pub relative_upper_limit: i64,
    pub step_size: i64,
    pub exposure_factor: f64,
    pub focus_offset: Option<i64>,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            name: String::new(),
            empty_slot_offset: None,
            relative_lower_limit: 0,
            relative_upper_limit: 0,
            step_size: 0,
            exposure_factor: 1.0,
            focus_offset: None,
        }
    }
}

impl Filter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Relative positions swept for this filter, lower to upper limit inclusive.
    pub fn steps(&self) -> Vec<i64> {
        if self.step_size <= 0 || self.relative_lower_limit > self.relative_upper_limit {
            return Vec::new();
        }

        (self.relative_lower_limit..=self.relative_upper_limit)
            .step_by(self.step_size as usize)
            .collect()
    }

    pub fn exposure(&self, base_exposure: f64) -> f64 {
        base_exposure * self.exposure_factor
    }
}
