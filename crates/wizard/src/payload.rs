//! Payload assembler — turns the final wizard state into the inquiry message
//! handed to the contact channels.

use crate::registry;
use crate::state::WizardState;
use leadwizard_channels::ContactSet;
use leadwizard_core::tenant::TenantConfig;
use leadwizard_core::types::{Coordinate, FieldKey};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

const MAP_LINK_BASE: &str = "https://www.google.com/maps?q=";
const NOT_PINNED: &str = "Not pinned";

/// Structured summary of a finished wizard. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    /// Label of every non-location field.
    pub labels: BTreeMap<FieldKey, String>,
    pub location: Option<Coordinate>,
    pub location_pinned: bool,
    pub map_link: Option<String>,
    /// Human-readable message body shared by every contact channel.
    pub message: String,
}

/// What the result step needs: the payload and one link per channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub payload: Payload,
    pub contacts: ContactSet,
}

impl Submission {
    pub fn prepare(state: &WizardState, tenant: &TenantConfig) -> Self {
        let payload = PayloadAssembler::new().assemble(state, tenant);
        let contacts = ContactSet::build(tenant, &payload.message);
        Self { payload, contacts }
    }
}

pub fn map_link(coordinate: &Coordinate) -> String {
    format!(
        "{MAP_LINK_BASE}{},{}",
        coordinate.lat_str(),
        coordinate.lng_str()
    )
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadAssembler;

impl PayloadAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Deterministic for a given state and tenant.
    pub fn assemble(&self, state: &WizardState, tenant: &TenantConfig) -> Payload {
        let location = state.location();
        let map_link = location.as_ref().map(map_link);

        let labels: BTreeMap<FieldKey, String> = registry::all_fields()
            .iter()
            .filter(|field| !field.key.is_location())
            .map(|field| (field.key, state.label(field.key).to_string()))
            .collect();

        let mut message = format!(
            "Hello {}, I'd like to reach out regarding my roof.\n\nDetails:\n",
            tenant.name
        );
        for field in registry::all_fields() {
            let value = if field.key.is_location() {
                map_link.as_deref().unwrap_or(NOT_PINNED)
            } else {
                state.label(field.key)
            };
            // Writing to a String cannot fail.
            let _ = writeln!(message, "- {}: {}", field.caption, value);
        }
        message.push_str("\nPlease contact me to discuss next steps.");

        Payload {
            labels,
            location,
            location_pinned: location.is_some(),
            map_link,
            message,
        }
    }
}
