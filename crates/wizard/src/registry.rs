//! Field registry: the closed set of wizard fields, their domains and owning
//! steps. Static and side-effect free.

use crate::scales::Scale;
use leadwizard_core::types::{FieldKey, Step};
use serde::Serialize;

/// Values a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FieldDomain {
    /// A pinned `{lat, lng}` pair.
    Coordinate,
    /// One of a fixed set of option values.
    Choice { options: &'static [&'static str] },
    /// A label derived from a slider position.
    Scale { scale: Scale },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Field {
    pub key: FieldKey,
    pub step: Step,
    pub domain: FieldDomain,
    pub required: bool,
    /// Caption used in the inquiry summary.
    pub caption: &'static str,
}

impl Field {
    /// Label the field holds before any interaction, if it has one.
    pub fn default_label(&self) -> Option<&'static str> {
        match self.domain {
            FieldDomain::Scale { scale } => Some(scale.default_label()),
            _ => None,
        }
    }
}

pub const RELATION_OPTIONS: &[&str] = &["owner", "tenant", "agent"];
pub const ROOF_TYPE_OPTIONS: &[&str] = &["gable", "hip", "flat", "mansard", "gambrel", "metal"];
pub const SIZE_OPTIONS: &[&str] = &["small", "medium", "large", "extra_large"];
pub const SITUATION_OPTIONS: &[&str] = &[
    "leak",
    "storm_damage",
    "missing_shingles",
    "sagging",
    "inspection",
    "replacement",
];

static FIELDS: [Field; 8] = [
    Field {
        key: FieldKey::Location,
        step: Step::Property,
        domain: FieldDomain::Coordinate,
        required: true,
        caption: "Location",
    },
    Field {
        key: FieldKey::Relation,
        step: Step::Property,
        domain: FieldDomain::Choice {
            options: RELATION_OPTIONS,
        },
        required: true,
        caption: "Property",
    },
    Field {
        key: FieldKey::RoofType,
        step: Step::Roof,
        domain: FieldDomain::Choice {
            options: ROOF_TYPE_OPTIONS,
        },
        required: true,
        caption: "Roof Type",
    },
    Field {
        key: FieldKey::Age,
        step: Step::Roof,
        domain: FieldDomain::Scale { scale: Scale::Age },
        required: true,
        caption: "Roof Age",
    },
    Field {
        key: FieldKey::Stories,
        step: Step::Roof,
        domain: FieldDomain::Scale {
            scale: Scale::Stories,
        },
        required: true,
        caption: "Number of Stories",
    },
    Field {
        key: FieldKey::Size,
        step: Step::Roof,
        domain: FieldDomain::Choice {
            options: SIZE_OPTIONS,
        },
        required: true,
        caption: "Roof Size",
    },
    Field {
        key: FieldKey::Situation,
        step: Step::Problem,
        domain: FieldDomain::Choice {
            options: SITUATION_OPTIONS,
        },
        required: true,
        caption: "Problem",
    },
    Field {
        key: FieldKey::Duration,
        step: Step::Problem,
        domain: FieldDomain::Scale {
            scale: Scale::Duration,
        },
        required: true,
        caption: "Duration",
    },
];

/// All fields in wizard order.
pub fn all_fields() -> &'static [Field] {
    &FIELDS
}

/// Fields owned by `step`. Empty for the terminal step.
pub fn fields_for_step(step: Step) -> impl Iterator<Item = &'static Field> {
    FIELDS.iter().filter(move |field| field.step == step)
}

pub fn field(key: FieldKey) -> &'static Field {
    // FIELDS covers every FieldKey variant.
    FIELDS
        .iter()
        .find(|field| field.key == key)
        .unwrap_or_else(|| unreachable!("field registry is missing {key}"))
}

/// The slider scale backing `key`, if any.
pub fn scale_for(key: FieldKey) -> Option<Scale> {
    match field(key).domain {
        FieldDomain::Scale { scale } => Some(scale),
        _ => None,
    }
}
