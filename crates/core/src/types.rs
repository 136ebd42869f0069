//! Shared wizard vocabulary: steps, field keys, field values and coordinates.

use crate::error::{WizardError, WizardResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─── Steps ──────────────────────────────────────────────────────────────────

/// One stage of the wizard. `Complete` is terminal and owns no fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Map pin and the visitor's relation to the property.
    Property,
    /// Roof type, age, stories and size.
    Roof,
    /// The problem and how long it has been going on.
    Problem,
    Complete,
}

pub const ALL_STEPS: [Step; 4] = [Step::Property, Step::Roof, Step::Problem, Step::Complete];

/// Progress status of a step relative to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Active,
    Upcoming,
}

impl Step {
    pub fn number(self) -> u8 {
        match self {
            Step::Property => 1,
            Step::Roof => 2,
            Step::Problem => 3,
            Step::Complete => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Step> {
        match n {
            1 => Some(Step::Property),
            2 => Some(Step::Roof),
            3 => Some(Step::Problem),
            4 => Some(Step::Complete),
            _ => None,
        }
    }

    pub fn next(self) -> Option<Step> {
        Step::from_number(self.number() + 1)
    }

    pub fn prev(self) -> Option<Step> {
        Step::from_number(self.number() - 1)
    }

    pub fn is_terminal(self) -> bool {
        self == Step::Complete
    }

    /// Width of the progress bar: three intervals between four steps.
    pub fn progress_percent(self) -> f64 {
        f64::from(self.number() - 1) / 3.0 * 100.0
    }

    /// Dot state for `self` when the wizard is currently on `current`.
    pub fn status_relative_to(self, current: Step) -> StepStatus {
        match self.cmp(&current) {
            std::cmp::Ordering::Less => StepStatus::Completed,
            std::cmp::Ordering::Equal => StepStatus::Active,
            std::cmp::Ordering::Greater => StepStatus::Upcoming,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

// ─── Field Keys ─────────────────────────────────────────────────────────────

/// The closed set of collectible fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Location,
    Relation,
    #[serde(rename = "type")]
    RoofType,
    Age,
    Stories,
    Size,
    Situation,
    Duration,
}

pub const ALL_FIELD_KEYS: [FieldKey; 8] = [
    FieldKey::Location,
    FieldKey::Relation,
    FieldKey::RoofType,
    FieldKey::Age,
    FieldKey::Stories,
    FieldKey::Size,
    FieldKey::Situation,
    FieldKey::Duration,
];

impl FieldKey {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::Location => "location",
            FieldKey::Relation => "relation",
            FieldKey::RoofType => "type",
            FieldKey::Age => "age",
            FieldKey::Stories => "stories",
            FieldKey::Size => "size",
            FieldKey::Situation => "situation",
            FieldKey::Duration => "duration",
        }
    }

    pub fn is_location(self) -> bool {
        self == FieldKey::Location
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = WizardError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        ALL_FIELD_KEYS
            .iter()
            .copied()
            .find(|key| key.as_str() == raw)
            .ok_or_else(|| WizardError::UnknownField(raw.to_string()))
    }
}

// ─── Coordinates ────────────────────────────────────────────────────────────

/// A pinned map location, kept at 6-decimal precision. Longitudes from a
/// repeated world copy are wrapped into `[-180, 180)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> WizardResult<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(WizardError::InvalidCoordinate(format!(
                "latitude {lat} out of range"
            )));
        }
        if !lng.is_finite() {
            return Err(WizardError::InvalidCoordinate(format!(
                "longitude {lng} is not a number"
            )));
        }
        Ok(Self {
            lat: round6(lat),
            lng: round6(wrap_longitude(lng)),
        })
    }

    /// Parse the `lat`/`lng` strings a map click produces.
    pub fn parse(lat: &str, lng: &str) -> WizardResult<Self> {
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| WizardError::InvalidCoordinate(format!("latitude `{lat}`")))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| WizardError::InvalidCoordinate(format!("longitude `{lng}`")))?;
        Self::new(lat, lng)
    }

    pub fn lat_str(&self) -> String {
        format!("{:.6}", self.lat)
    }

    pub fn lng_str(&self) -> String {
        format!("{:.6}", self.lng)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

fn wrap_longitude(lng: f64) -> f64 {
    if (-180.0..180.0).contains(&lng) {
        lng
    } else {
        (lng + 180.0).rem_euclid(360.0) - 180.0
    }
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

// ─── Field Values ───────────────────────────────────────────────────────────

/// Current value of a field slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum FieldValue {
    #[default]
    Unset,
    Label(String),
    Pinned(Coordinate),
}

impl FieldValue {
    pub fn label(label: impl Into<String>) -> Self {
        FieldValue::Label(label.into())
    }

    /// An empty label counts as unset.
    pub fn is_set(&self) -> bool {
        match self {
            FieldValue::Unset => false,
            FieldValue::Label(label) => !label.is_empty(),
            FieldValue::Pinned(_) => true,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            FieldValue::Label(label) => Some(label.as_str()),
            _ => None,
        }
    }

    pub fn as_coordinate(&self) -> Option<Coordinate> {
        match self {
            FieldValue::Pinned(coordinate) => Some(*coordinate),
            _ => None,
        }
    }
}
