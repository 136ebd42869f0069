//! Transition controller — owns one visitor's wizard state and is the only
//! thing that moves it between steps.
//!
//! Forward moves are gated by the [`StepValidator`]; backward moves are not.
//! Entering the terminal step assembles the submission. Completing step 1
//! asks the caller to schedule an auto-advance, and the guard is checked
//! again when that timer fires.

use crate::events::{noop_sink, EventSink, WizardEvent};
use crate::payload::Submission;
use crate::registry;
use crate::state::WizardState;
use crate::validator::StepValidator;
use chrono::{DateTime, Utc};
use leadwizard_core::config::AutoAdvanceConfig;
use leadwizard_core::error::{WizardError, WizardResult};
use leadwizard_core::tenant::TenantConfig;
use leadwizard_core::types::{Coordinate, FieldKey, FieldValue, Step};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// When and whether step 1 advances on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoAdvancePolicy {
    pub enabled: bool,
    pub delay: Duration,
}

impl From<&AutoAdvanceConfig> for AutoAdvancePolicy {
    fn from(config: &AutoAdvanceConfig) -> Self {
        Self {
            enabled: config.enabled,
            delay: config.delay(),
        }
    }
}

impl Default for AutoAdvancePolicy {
    fn default() -> Self {
        Self::from(&AutoAdvanceConfig::default())
    }
}

/// Result of an `advance()` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum AdvanceOutcome {
    Advanced {
        from: Step,
        to: Step,
        /// Present when `to` is the terminal step.
        submission: Option<Box<Submission>>,
    },
    Rejected {
        step: Step,
        missing: BTreeSet<FieldKey>,
    },
    /// Already on the terminal step; nothing lies beyond it.
    AtTerminal,
}

impl AdvanceOutcome {
    pub fn is_advanced(&self) -> bool {
        matches!(self, AdvanceOutcome::Advanced { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum RetreatOutcome {
    Retreated { from: Step, to: Step },
    AtFirstStep,
}

/// What the caller must do after a field write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldUpdate {
    /// Schedule `Wizard::on_auto_advance_due` after this delay.
    pub auto_advance_after: Option<Duration>,
}

pub struct Wizard {
    id: Uuid,
    started_at: DateTime<Utc>,
    state: WizardState,
    validator: StepValidator,
    tenant: TenantConfig,
    auto_advance: AutoAdvancePolicy,
    event_sink: Arc<dyn EventSink>,
}

impl Wizard {
    pub fn new(tenant: TenantConfig, auto_advance: AutoAdvancePolicy) -> Self {
        let id = Uuid::new_v4();
        info!(wizard_id = %id, tenant = %tenant.display_name(), "Wizard session started");
        Self {
            id,
            started_at: Utc::now(),
            state: WizardState::new(),
            validator: StepValidator::new(),
            tenant,
            auto_advance,
            event_sink: noop_sink(),
        }
    }

    /// Attach an event sink for presentation updates.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> Step {
        self.state.current_step()
    }

    pub fn tenant(&self) -> &TenantConfig {
        &self.tenant
    }

    /// Swap in the tenant record once it has been resolved.
    pub fn apply_tenant(&mut self, tenant: TenantConfig) {
        info!(wizard_id = %self.id, tenant = %tenant.display_name(), "Tenant applied");
        self.tenant = tenant;
    }

    /// Missing required fields on the current step.
    pub fn missing_fields(&self) -> BTreeSet<FieldKey> {
        self.validator
            .missing_fields(self.state.current_step(), &self.state)
    }

    // ------------------------------------------------------------------
    // Field updates
    // ------------------------------------------------------------------

    pub fn set_field(&mut self, key: FieldKey, value: FieldValue) -> WizardResult<FieldUpdate> {
        self.state.set_field(key, value.clone())?;
        debug!(wizard_id = %self.id, field = %key, "Field updated");
        self.event_sink
            .emit(WizardEvent::FieldChanged { field: key, value });

        let mut update = FieldUpdate::default();
        let triggers = matches!(key, FieldKey::Relation | FieldKey::Location);
        if self.auto_advance.enabled && triggers && self.step_one_ready() {
            let delay = self.auto_advance.delay;
            let delay_ms = delay.as_millis() as u64;
            debug!(wizard_id = %self.id, delay_ms, "Auto-advance scheduled");
            self.event_sink
                .emit(WizardEvent::AutoAdvanceScheduled { delay_ms });
            update.auto_advance_after = Some(delay);
        }
        Ok(update)
    }

    /// Record a map click.
    pub fn pin_location(&mut self, coordinate: Coordinate) -> WizardResult<FieldUpdate> {
        self.set_field(FieldKey::Location, FieldValue::Pinned(coordinate))
    }

    /// Record a slider position on a scale-backed field.
    pub fn set_scale(&mut self, key: FieldKey, index: u8) -> WizardResult<FieldUpdate> {
        let scale = registry::scale_for(key).ok_or(WizardError::ValueMismatch {
            field: key.as_str(),
            expected: "label",
        })?;
        let label = scale.label(index)?;
        self.set_field(key, FieldValue::Label(label))
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    pub fn advance(&mut self) -> AdvanceOutcome {
        let from = self.state.current_step();
        let Some(to) = from.next() else {
            debug!(wizard_id = %self.id, "Advance requested on terminal step");
            return AdvanceOutcome::AtTerminal;
        };

        let missing = self.validator.missing_fields(from, &self.state);
        if !missing.is_empty() {
            info!(
                wizard_id = %self.id,
                step = from.number(),
                missing = ?missing,
                "Advance rejected"
            );
            metrics::counter!("wizard.advance_rejected").increment(1);
            self.event_sink.emit(WizardEvent::AdvanceRejected {
                step: from,
                missing: missing.clone(),
            });
            return AdvanceOutcome::Rejected {
                step: from,
                missing,
            };
        }

        self.state.set_step(to);
        info!(wizard_id = %self.id, from = from.number(), to = to.number(), "Step advanced");
        metrics::counter!("wizard.steps_advanced").increment(1);
        self.event_sink.emit(WizardEvent::StepChanged {
            from,
            to,
            progress_percent: to.progress_percent(),
        });

        let submission = if to.is_terminal() {
            let submission = Box::new(Submission::prepare(&self.state, &self.tenant));
            info!(
                wizard_id = %self.id,
                location_pinned = submission.payload.location_pinned,
                channels = ?submission.contacts.enabled_channels(),
                "Submission ready"
            );
            metrics::counter!("wizard.submissions").increment(1);
            self.event_sink.emit(WizardEvent::SubmissionReady {
                submission: submission.clone(),
            });
            Some(submission)
        } else {
            None
        };

        AdvanceOutcome::Advanced {
            from,
            to,
            submission,
        }
    }

    pub fn retreat(&mut self) -> RetreatOutcome {
        let from = self.state.current_step();
        let Some(to) = from.prev() else {
            return RetreatOutcome::AtFirstStep;
        };
        self.state.set_step(to);
        info!(wizard_id = %self.id, from = from.number(), to = to.number(), "Step retreated");
        metrics::counter!("wizard.steps_retreated").increment(1);
        self.event_sink.emit(WizardEvent::StepChanged {
            from,
            to,
            progress_percent: to.progress_percent(),
        });
        RetreatOutcome::Retreated { from, to }
    }

    /// Timer callback for a scheduled auto-advance. The guard is re-evaluated
    /// here rather than trusted from scheduling time: the visitor may have
    /// moved on or cleared a field in the meantime.
    pub fn on_auto_advance_due(&mut self) -> Option<AdvanceOutcome> {
        if !self.step_one_ready() {
            let step = self.state.current_step();
            debug!(wizard_id = %self.id, step = step.number(), "Auto-advance skipped");
            metrics::counter!("wizard.auto_advance_skipped").increment(1);
            self.event_sink.emit(WizardEvent::AutoAdvanceSkipped { step });
            return None;
        }
        metrics::counter!("wizard.auto_advance_fired").increment(1);
        Some(self.advance())
    }

    /// The submission for the current state, if the wizard is complete.
    pub fn submission(&self) -> Option<Submission> {
        self.state
            .current_step()
            .is_terminal()
            .then(|| Submission::prepare(&self.state, &self.tenant))
    }

    fn step_one_ready(&self) -> bool {
        self.state.current_step() == Step::Property
            && self.validator.is_step_satisfied(Step::Property, &self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::capture_sink;
    use leadwizard_channels::ContactChannel;

    fn wizard() -> Wizard {
        Wizard::new(TenantConfig::default(), AutoAdvancePolicy::default())
    }

    fn nyc() -> Coordinate {
        Coordinate::new(40.7128, -74.006).unwrap()
    }

    fn label(wizard: &mut Wizard, key: FieldKey, value: &str) -> FieldUpdate {
        wizard.set_field(key, FieldValue::label(value)).unwrap()
    }

    fn complete_step_one(wizard: &mut Wizard) {
        label(wizard, FieldKey::Relation, "owner");
        wizard.pin_location(nyc()).unwrap();
        assert!(wizard.advance().is_advanced());
    }

    fn complete_step_two(wizard: &mut Wizard) {
        label(wizard, FieldKey::RoofType, "gable");
        label(wizard, FieldKey::Size, "large");
        assert!(wizard.advance().is_advanced());
    }

    #[test]
    fn test_advance_with_step_one_filled() {
        let mut wizard = wizard();
        label(&mut wizard, FieldKey::Relation, "owner");
        wizard.pin_location(nyc()).unwrap();
        let outcome = wizard.advance();
        assert_eq!(
            outcome,
            AdvanceOutcome::Advanced {
                from: Step::Property,
                to: Step::Roof,
                submission: None
            }
        );
        assert_eq!(wizard.current_step(), Step::Roof);
    }

    #[test]
    fn test_advance_rejected_reports_missing() {
        let sink = capture_sink();
        let mut wizard = wizard().with_event_sink(sink.clone());
        label(&mut wizard, FieldKey::Relation, "owner");

        for _ in 0..3 {
            let outcome = wizard.advance();
            assert_eq!(
                outcome,
                AdvanceOutcome::Rejected {
                    step: Step::Property,
                    missing: [FieldKey::Location].into_iter().collect()
                }
            );
            assert_eq!(wizard.current_step(), Step::Property);
        }
        assert_eq!(sink.count_kind("advance_rejected"), 3);
        assert_eq!(sink.count_kind("step_changed"), 0);
    }

    #[test]
    fn test_retreat_then_advance_round_trip() {
        let mut wizard = wizard();
        complete_step_one(&mut wizard);
        complete_step_two(&mut wizard);
        assert_eq!(wizard.current_step(), Step::Problem);

        assert_eq!(
            wizard.retreat(),
            RetreatOutcome::Retreated {
                from: Step::Problem,
                to: Step::Roof
            }
        );
        assert!(wizard.advance().is_advanced());
        assert_eq!(wizard.current_step(), Step::Problem);
    }

    #[test]
    fn test_retreat_needs_no_validation_and_stops_at_one() {
        let mut wizard = wizard();
        complete_step_one(&mut wizard);
        label(&mut wizard, FieldKey::Relation, "");
        assert!(matches!(wizard.retreat(), RetreatOutcome::Retreated { .. }));
        assert_eq!(wizard.retreat(), RetreatOutcome::AtFirstStep);
        assert_eq!(wizard.current_step(), Step::Property);
    }

    #[test]
    fn test_completion_assembles_submission() {
        let sink = capture_sink();
        let mut wizard = wizard().with_event_sink(sink.clone());
        complete_step_one(&mut wizard);
        complete_step_two(&mut wizard);
        label(&mut wizard, FieldKey::Situation, "storm_damage");

        let outcome = wizard.advance();
        let AdvanceOutcome::Advanced {
            to, submission, ..
        } = outcome
        else {
            panic!("expected the wizard to advance");
        };
        assert_eq!(to, Step::Complete);
        let submission = submission.expect("terminal step carries a submission");
        assert!(submission.payload.location_pinned);
        assert!(submission.contacts.is_enabled(ContactChannel::WhatsApp));
        assert!(!submission.contacts.is_enabled(ContactChannel::Email));
        assert_eq!(sink.count_kind("submission_ready"), 1);

        assert_eq!(wizard.advance(), AdvanceOutcome::AtTerminal);
        assert_eq!(wizard.submission().unwrap(), *submission);
    }

    #[test]
    fn test_pin_from_repeated_world_copy_completes_step_one() {
        let sink = capture_sink();
        let mut wizard = wizard().with_event_sink(sink.clone());
        label(&mut wizard, FieldKey::Relation, "owner");
        let coordinate = Coordinate::parse("40.712800", "285.994000").unwrap();
        let update = wizard.pin_location(coordinate).unwrap();
        assert!(update.auto_advance_after.is_some());
        assert_eq!(
            wizard.state().location().map(|c| c.to_string()),
            Some("40.712800,-74.006000".to_string())
        );

        assert!(wizard.advance().is_advanced());
        assert_eq!(
            sink.kinds(),
            vec![
                "field_changed",
                "field_changed",
                "auto_advance_scheduled",
                "step_changed"
            ]
        );
    }

    #[test]
    fn test_submission_only_on_terminal_step() {
        let wizard = wizard();
        assert!(wizard.submission().is_none());
    }

    #[test]
    fn test_auto_advance_requested_in_either_order() {
        let mut a = wizard();
        assert_eq!(label(&mut a, FieldKey::Relation, "owner").auto_advance_after, None);
        let update = a.pin_location(nyc()).unwrap();
        assert_eq!(update.auto_advance_after, Some(Duration::from_millis(1000)));

        let mut b = wizard();
        assert_eq!(b.pin_location(nyc()).unwrap().auto_advance_after, None);
        let update = label(&mut b, FieldKey::Relation, "agent");
        assert_eq!(update.auto_advance_after, Some(Duration::from_millis(1000)));
    }

    #[test]
    fn test_auto_advance_not_requested_for_other_fields_or_steps() {
        let mut wizard = wizard();
        label(&mut wizard, FieldKey::Relation, "owner");
        wizard.pin_location(nyc()).unwrap();
        assert_eq!(label(&mut wizard, FieldKey::Size, "small").auto_advance_after, None);

        wizard.advance();
        assert_eq!(
            label(&mut wizard, FieldKey::Relation, "tenant").auto_advance_after,
            None
        );
    }

    #[test]
    fn test_auto_advance_disabled_by_policy() {
        let policy = AutoAdvancePolicy {
            enabled: false,
            delay: Duration::from_millis(1000),
        };
        let mut wizard = Wizard::new(TenantConfig::default(), policy);
        label(&mut wizard, FieldKey::Relation, "owner");
        assert_eq!(wizard.pin_location(nyc()).unwrap().auto_advance_after, None);
    }

    #[test]
    fn test_auto_advance_rechecks_guard_at_fire_time() {
        let sink = capture_sink();
        let mut wizard = wizard().with_event_sink(sink.clone());
        label(&mut wizard, FieldKey::Relation, "owner");
        wizard.pin_location(nyc()).unwrap();

        label(&mut wizard, FieldKey::Relation, "");
        assert_eq!(wizard.on_auto_advance_due(), None);
        assert_eq!(wizard.current_step(), Step::Property);
        assert_eq!(sink.count_kind("auto_advance_skipped"), 1);

        label(&mut wizard, FieldKey::Relation, "owner");
        let outcome = wizard.on_auto_advance_due().unwrap();
        assert!(outcome.is_advanced());
        assert_eq!(wizard.current_step(), Step::Roof);

        // A second timer from the earlier write finds the wizard past step 1.
        assert_eq!(wizard.on_auto_advance_due(), None);
        assert_eq!(wizard.current_step(), Step::Roof);
    }

    #[test]
    fn test_set_scale() {
        let mut wizard = wizard();
        wizard.set_scale(FieldKey::Age, 10).unwrap();
        wizard.set_scale(FieldKey::Stories, 3).unwrap();
        wizard.set_scale(FieldKey::Duration, 2).unwrap();
        assert_eq!(wizard.state().label(FieldKey::Age), "10+ Years");
        assert_eq!(wizard.state().label(FieldKey::Stories), "3+ Stories");
        assert_eq!(wizard.state().label(FieldKey::Duration), "1–6 months");

        assert!(matches!(
            wizard.set_scale(FieldKey::Age, 11),
            Err(WizardError::ScaleOutOfRange { .. })
        ));
        assert!(matches!(
            wizard.set_scale(FieldKey::Size, 1),
            Err(WizardError::ValueMismatch { .. })
        ));
        assert_eq!(wizard.state().label(FieldKey::Age), "10+ Years");
    }

    #[test]
    fn test_late_tenant_is_used_for_submission() {
        let mut wizard = wizard();
        wizard.apply_tenant(TenantConfig {
            name: "Summit".to_string(),
            email: "leads@summit.example".to_string(),
            ..TenantConfig::default()
        });
        complete_step_one(&mut wizard);
        complete_step_two(&mut wizard);
        label(&mut wizard, FieldKey::Situation, "leak");
        wizard.advance();

        let submission = wizard.submission().unwrap();
        assert!(submission.payload.message.starts_with("Hello Summit,"));
        assert!(submission.contacts.is_enabled(ContactChannel::Email));
    }

    #[test]
    fn test_field_changes_are_observed() {
        let sink = capture_sink();
        let mut wizard = wizard().with_event_sink(sink.clone());
        label(&mut wizard, FieldKey::RoofType, "flat");
        assert_eq!(
            sink.events(),
            vec![WizardEvent::FieldChanged {
                field: FieldKey::RoofType,
                value: FieldValue::label("flat")
            }]
        );
    }
}
