//! Roofing lead wizard engine.
//!
//! A four-step form (property, roof, problem, result) with per-step
//! validation, a delayed auto-advance out of step 1, and a final payload that
//! is turned into WhatsApp, SMS and email links for the tenant.

pub mod controller;
pub mod events;
pub mod payload;
pub mod registry;
pub mod scales;
pub mod session;
pub mod state;
pub mod validator;

pub use controller::{AdvanceOutcome, AutoAdvancePolicy, FieldUpdate, RetreatOutcome, Wizard};
pub use events::{EventSink, WizardEvent};
pub use payload::{Payload, PayloadAssembler, Submission};
pub use session::{Session, SessionHandle, SessionSnapshot};
pub use state::WizardState;
pub use validator::StepValidator;
