//! Decides whether a step's required fields are filled.
//!
//! Pure: reads the state, never mutates it.

use crate::registry;
use crate::state::WizardState;
use leadwizard_core::types::{FieldKey, Step};
use std::collections::BTreeSet;

/// Evaluates step completion rules against a wizard state.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepValidator;

impl StepValidator {
    pub fn new() -> Self {
        Self
    }

    /// `true` when every required field owned by `step` is set. The terminal
    /// step owns nothing and is always satisfied.
    ///
    /// Step 2 checks `age` and `stories` too, even though their defaults mean
    /// they are never empty in normal flow.
    pub fn is_step_satisfied(&self, step: Step, state: &WizardState) -> bool {
        self.missing_fields(step, state).is_empty()
    }

    /// Required fields of `step` that are still unset.
    pub fn missing_fields(&self, step: Step, state: &WizardState) -> BTreeSet<FieldKey> {
        registry::fields_for_step(step)
            .filter(|field| field.required && !state.is_set(field.key))
            .map(|field| field.key)
            .collect()
    }
}
