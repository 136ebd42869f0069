//! Wizard event bus — trait for notifying the presentation layer of state
//! changes, rejected advances and the completed submission.
//!
//! The controller holds an `Arc<dyn EventSink>`; the presentation side picks
//! the sink: nothing, an in-memory capture, or a channel it drains.

use crate::payload::Submission;
use leadwizard_core::types::{FieldKey, FieldValue, Step};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Something the presentation layer may want to react to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum WizardEvent {
    FieldChanged {
        field: FieldKey,
        value: FieldValue,
    },
    StepChanged {
        from: Step,
        to: Step,
        progress_percent: f64,
    },
    /// Distinct failure cue: shake the step and highlight `missing`.
    AdvanceRejected {
        step: Step,
        missing: BTreeSet<FieldKey>,
    },
    AutoAdvanceScheduled {
        delay_ms: u64,
    },
    AutoAdvanceSkipped {
        step: Step,
    },
    SubmissionReady {
        submission: Box<Submission>,
    },
}

impl WizardEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            WizardEvent::FieldChanged { .. } => "field_changed",
            WizardEvent::StepChanged { .. } => "step_changed",
            WizardEvent::AdvanceRejected { .. } => "advance_rejected",
            WizardEvent::AutoAdvanceScheduled { .. } => "auto_advance_scheduled",
            WizardEvent::AutoAdvanceSkipped { .. } => "auto_advance_skipped",
            WizardEvent::SubmissionReady { .. } => "submission_ready",
        }
    }
}

/// Trait for receiving wizard events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: WizardEvent);
}

/// No-op sink for callers that poll state instead.
pub struct NoOpSink;

impl EventSink for NoOpSink {
    fn emit(&self, _event: WizardEvent) {}
}

/// In-memory sink that captures events for testing.
#[derive(Default)]
pub struct CaptureSink {
    events: Mutex<Vec<WizardEvent>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<WizardEvent> {
        self.events.lock().expect("event bus mutex poisoned").clone()
    }

    /// Event kinds in emission order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .expect("event bus mutex poisoned")
            .iter()
            .map(WizardEvent::kind)
            .collect()
    }

    pub fn count_kind(&self, kind: &str) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }
}

impl EventSink for CaptureSink {
    fn emit(&self, event: WizardEvent) {
        self.events.lock().expect("event bus mutex poisoned").push(event);
    }
}

/// Forwards events into an unbounded channel. Events are dropped once the
/// receiver is gone.
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<WizardEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WizardEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: WizardEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("Wizard event receiver dropped");
        }
    }
}

/// Convenience: create a no-op event bus.
pub fn noop_sink() -> Arc<dyn EventSink> {
    Arc::new(NoOpSink)
}

/// Convenience: create a capture sink for tests.
pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}
