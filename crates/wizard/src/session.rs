//! Session driver — runs one [`Wizard`] on a background task and serializes
//! every input through a command channel.
//!
//! User actions, tenant resolution and auto-advance timers all arrive as
//! [`SessionCommand`]s, so they never interleave inside a transition. Timers
//! hold a weak sender: once every [`SessionHandle`] is dropped the session
//! ends even if a timer is still pending.

use crate::controller::{AdvanceOutcome, FieldUpdate, RetreatOutcome, Wizard};
use crate::payload::Submission;
use crate::state::WizardState;
use chrono::{DateTime, Utc};
use leadwizard_core::error::{WizardError, WizardResult};
use leadwizard_core::tenant::TenantConfig;
use leadwizard_core::types::{Coordinate, FieldKey, FieldValue, Step, StepStatus, ALL_STEPS};
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

const COMMAND_BUFFER: usize = 64;

/// Inputs accepted by a running session.
#[derive(Debug)]
pub enum SessionCommand {
    SetField {
        key: FieldKey,
        value: FieldValue,
        reply: oneshot::Sender<WizardResult<()>>,
    },
    SetScale {
        key: FieldKey,
        index: u8,
        reply: oneshot::Sender<WizardResult<()>>,
    },
    PinLocation {
        coordinate: Coordinate,
        reply: oneshot::Sender<WizardResult<()>>,
    },
    Advance {
        reply: oneshot::Sender<AdvanceOutcome>,
    },
    Retreat {
        reply: oneshot::Sender<RetreatOutcome>,
    },
    ApplyTenant {
        tenant: TenantConfig,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// Fired by a timer scheduled after step 1 became complete.
    AutoAdvanceDue,
    Shutdown {
        reply: oneshot::Sender<WizardState>,
    },
}

/// Dot state of one step indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepIndicator {
    pub step: Step,
    pub status: StepStatus,
}

/// Point-in-time view of a session for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub step: Step,
    pub progress_percent: f64,
    pub indicators: Vec<StepIndicator>,
    pub missing: BTreeSet<FieldKey>,
    pub page_title: String,
    pub state: WizardState,
    pub tenant: TenantConfig,
    pub submission: Option<Submission>,
}

impl SessionSnapshot {
    fn capture(wizard: &Wizard) -> Self {
        let step = wizard.current_step();
        Self {
            session_id: wizard.id(),
            started_at: wizard.started_at(),
            step,
            progress_percent: step.progress_percent(),
            indicators: ALL_STEPS
                .iter()
                .map(|s| StepIndicator {
                    step: *s,
                    status: s.status_relative_to(step),
                })
                .collect(),
            missing: wizard.missing_fields(),
            page_title: wizard.tenant().page_title(),
            state: wizard.state().clone(),
            tenant: wizard.tenant().clone(),
            submission: wizard.submission(),
        }
    }
}

pub struct Session {
    wizard: Wizard,
    receiver: mpsc::Receiver<SessionCommand>,
    timers: mpsc::WeakSender<SessionCommand>,
}

impl Session {
    /// Spawn the session task and return a handle to it.
    pub fn spawn(wizard: Wizard) -> (SessionHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
        let session = Session {
            wizard,
            receiver,
            timers: sender.downgrade(),
        };
        let task = tokio::spawn(session.run());
        (SessionHandle { sender }, task)
    }

    async fn run(mut self) {
        let id = self.wizard.id();
        info!(session_id = %id, "Wizard session loop started");

        while let Some(command) = self.receiver.recv().await {
            match command {
                SessionCommand::SetField { key, value, reply } => {
                    let result = self.wizard.set_field(key, value);
                    let _ = reply.send(self.schedule(result));
                }
                SessionCommand::SetScale { key, index, reply } => {
                    let result = self.wizard.set_scale(key, index);
                    let _ = reply.send(self.schedule(result));
                }
                SessionCommand::PinLocation { coordinate, reply } => {
                    let result = self.wizard.pin_location(coordinate);
                    let _ = reply.send(self.schedule(result));
                }
                SessionCommand::Advance { reply } => {
                    let _ = reply.send(self.wizard.advance());
                }
                SessionCommand::Retreat { reply } => {
                    let _ = reply.send(self.wizard.retreat());
                }
                SessionCommand::ApplyTenant { tenant } => {
                    self.wizard.apply_tenant(tenant);
                }
                SessionCommand::Snapshot { reply } => {
                    let _ = reply.send(SessionSnapshot::capture(&self.wizard));
                }
                SessionCommand::AutoAdvanceDue => {
                    self.wizard.on_auto_advance_due();
                }
                SessionCommand::Shutdown { reply } => {
                    let _ = reply.send(self.wizard.state().clone());
                    break;
                }
            }
        }

        info!(session_id = %id, step = self.wizard.current_step().number(), "Wizard session loop stopped");
    }

    fn schedule(&self, result: WizardResult<FieldUpdate>) -> WizardResult<()> {
        let update = result?;
        if let Some(delay) = update.auto_advance_after {
            spawn_timer(self.timers.clone(), delay);
        }
        Ok(())
    }
}

fn spawn_timer(timers: mpsc::WeakSender<SessionCommand>, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match timers.upgrade() {
            Some(sender) => {
                let _ = sender.send(SessionCommand::AutoAdvanceDue).await;
            }
            None => debug!("Session gone before auto-advance fired"),
        }
    });
}

/// Cloneable front door to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub async fn set_field(&self, key: FieldKey, value: FieldValue) -> WizardResult<()> {
        self.request(|reply| SessionCommand::SetField { key, value, reply })
            .await?
    }

    pub async fn set_scale(&self, key: FieldKey, index: u8) -> WizardResult<()> {
        self.request(|reply| SessionCommand::SetScale { key, index, reply })
            .await?
    }

    pub async fn pin_location(&self, coordinate: Coordinate) -> WizardResult<()> {
        self.request(|reply| SessionCommand::PinLocation { coordinate, reply })
            .await?
    }

    pub async fn advance(&self) -> WizardResult<AdvanceOutcome> {
        self.request(|reply| SessionCommand::Advance { reply }).await
    }

    pub async fn retreat(&self) -> WizardResult<RetreatOutcome> {
        self.request(|reply| SessionCommand::Retreat { reply }).await
    }

    /// Hand over a tenant resolved after the session started.
    pub async fn apply_tenant(&self, tenant: TenantConfig) -> WizardResult<()> {
        self.sender
            .send(SessionCommand::ApplyTenant { tenant })
            .await
            .map_err(|_| WizardError::SessionClosed)
    }

    pub async fn snapshot(&self) -> WizardResult<SessionSnapshot> {
        self.request(|reply| SessionCommand::Snapshot { reply }).await
    }

    /// Stop the session and return its final state.
    pub async fn shutdown(&self) -> WizardResult<WizardState> {
        self.request(|reply| SessionCommand::Shutdown { reply }).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> WizardResult<T> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_| WizardError::SessionClosed)?;
        response.await.map_err(|_| WizardError::SessionClosed)
    }
}
