//! Wizard state: the current step and the value of every field.

use crate::registry::{self, FieldDomain};
use leadwizard_core::error::{WizardError, WizardResult};
use leadwizard_core::types::{Coordinate, FieldKey, FieldValue, Step};
use serde::Serialize;
use std::collections::BTreeMap;

/// One visitor's progress through the wizard. Created at session start; only
/// the transition controller moves `step`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardState {
    step: Step,
    values: BTreeMap<FieldKey, FieldValue>,
}

impl WizardState {
    /// Fresh state on step 1. Slider-backed fields start at their default
    /// label, everything else unset.
    pub fn new() -> Self {
        let values = registry::all_fields()
            .iter()
            .map(|field| {
                let value = field
                    .default_label()
                    .map(FieldValue::label)
                    .unwrap_or_default();
                (field.key, value)
            })
            .collect();
        Self {
            step: Step::Property,
            values,
        }
    }

    pub fn current_step(&self) -> Step {
        self.step
    }

    pub(crate) fn set_step(&mut self, step: Step) {
        self.step = step;
    }

    /// Overwrite a field. Labels are not checked against the option set; only
    /// the value shape (coordinate vs. label) must match the field.
    pub fn set_field(&mut self, key: FieldKey, value: FieldValue) -> WizardResult<()> {
        let field = registry::field(key);
        match (&field.domain, &value) {
            (_, FieldValue::Unset) => {}
            (FieldDomain::Coordinate, FieldValue::Pinned(_)) => {}
            (FieldDomain::Coordinate, FieldValue::Label(_)) => {
                return Err(WizardError::ValueMismatch {
                    field: key.as_str(),
                    expected: "coordinate",
                });
            }
            (_, FieldValue::Pinned(_)) => {
                return Err(WizardError::ValueMismatch {
                    field: key.as_str(),
                    expected: "label",
                });
            }
            (_, FieldValue::Label(_)) => {}
        }
        self.values.insert(key, value);
        Ok(())
    }

    /// String-keyed entry point for untyped callers. Unknown keys are rejected.
    pub fn set_field_by_name(&mut self, key: &str, value: FieldValue) -> WizardResult<()> {
        self.set_field(key.parse()?, value)
    }

    pub fn value(&self, key: FieldKey) -> &FieldValue {
        static UNSET: FieldValue = FieldValue::Unset;
        self.values.get(&key).unwrap_or(&UNSET)
    }

    pub fn is_set(&self, key: FieldKey) -> bool {
        self.value(key).is_set()
    }

    /// Label of a choice/scale field, empty when unset.
    pub fn label(&self, key: FieldKey) -> &str {
        self.value(key).as_label().unwrap_or("")
    }

    pub fn location(&self) -> Option<Coordinate> {
        self.value(FieldKey::Location).as_coordinate()
    }
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}
