//! Slider scales and their index → label mappings.

use leadwizard_core::error::{WizardError, WizardResult};
use serde::{Deserialize, Serialize};

const DURATION_LABELS: [&str; 4] = [
    "Just noticed",
    "Less than 1 month",
    "1–6 months",
    "More than 6 months",
];

/// A bounded numeric input whose position is stored as a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    /// Roof age in years, 0..=10.
    Age,
    /// Number of stories, 1..=3.
    Stories,
    /// How long the problem has been present, 0..=3.
    Duration,
}

impl Scale {
    pub fn name(self) -> &'static str {
        match self {
            Scale::Age => "age",
            Scale::Stories => "stories",
            Scale::Duration => "duration",
        }
    }

    pub fn min(self) -> u8 {
        match self {
            Scale::Age | Scale::Duration => 0,
            Scale::Stories => 1,
        }
    }

    pub fn max(self) -> u8 {
        match self {
            Scale::Age => 10,
            Scale::Stories => 3,
            Scale::Duration => 3,
        }
    }

    /// Label the slider shows before the visitor touches it.
    pub fn default_label(self) -> &'static str {
        match self {
            Scale::Age => "Less than 1 Year",
            Scale::Stories => "1 Story",
            Scale::Duration => DURATION_LABELS[0],
        }
    }

    pub fn label(self, index: u8) -> WizardResult<String> {
        if index < self.min() || index > self.max() {
            return Err(WizardError::ScaleOutOfRange {
                scale: self.name(),
                index,
                min: self.min(),
                max: self.max(),
            });
        }
        let label = match self {
            Scale::Age => match index {
                0 => self.default_label().to_string(),
                10 => "10+ Years".to_string(),
                1 => "1 Year".to_string(),
                n => format!("{n} Years"),
            },
            Scale::Stories => match index {
                1 => self.default_label().to_string(),
                3 => "3+ Stories".to_string(),
                n => format!("{n} Stories"),
            },
            Scale::Duration => DURATION_LABELS[usize::from(index)].to_string(),
        };
        Ok(label)
    }

    /// Every label the scale can produce, in index order.
    pub fn labels(self) -> Vec<String> {
        (self.min()..=self.max())
            .filter_map(|index| self.label(index).ok())
            .collect()
    }
}
