//! One contact link per channel, each enabled only when the tenant
//! configures an endpoint for it.

use crate::{email, sms, whatsapp};
use leadwizard_core::tenant::TenantConfig;
use serde::Serialize;
use tracing::{debug, info};

/// Outbound channels offered on the result step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactChannel {
    #[serde(rename = "whatsapp")]
    WhatsApp,
    Sms,
    Email,
}

pub const ALL_CONTACT_CHANNELS: [ContactChannel; 3] = [
    ContactChannel::WhatsApp,
    ContactChannel::Sms,
    ContactChannel::Email,
];

impl ContactChannel {
    pub fn display_name(&self) -> &'static str {
        match self {
            ContactChannel::WhatsApp => "WhatsApp",
            ContactChannel::Sms => "SMS",
            ContactChannel::Email => "Email",
        }
    }

    fn endpoint<'a>(&self, tenant: &'a TenantConfig) -> Option<&'a str> {
        match self {
            ContactChannel::WhatsApp => tenant.whatsapp(),
            ContactChannel::Sms => tenant.phone(),
            ContactChannel::Email => tenant.email(),
        }
    }

    fn link(&self, endpoint: &str, message: &str) -> Option<String> {
        match self {
            ContactChannel::WhatsApp => whatsapp::chat_link(endpoint, message),
            ContactChannel::Sms => sms::compose_link(endpoint, message),
            ContactChannel::Email => email::compose_link(endpoint, message),
        }
    }
}

/// A single channel's link. `href` is `None` exactly when disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactLink {
    pub channel: ContactChannel,
    pub enabled: bool,
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactSet {
    pub links: Vec<ContactLink>,
}

impl ContactSet {
    /// Derive every channel's link from the tenant endpoints and the shared
    /// message body.
    pub fn build(tenant: &TenantConfig, message: &str) -> Self {
        let links: Vec<ContactLink> = ALL_CONTACT_CHANNELS
            .iter()
            .map(|channel| {
                let href = channel
                    .endpoint(tenant)
                    .and_then(|endpoint| channel.link(endpoint, message));
                if href.is_some() {
                    metrics::counter!(
                        "contacts.links_built",
                        "channel" => channel.display_name()
                    )
                    .increment(1);
                } else {
                    debug!(channel = channel.display_name(), "Contact channel disabled");
                }
                ContactLink {
                    channel: *channel,
                    enabled: href.is_some(),
                    href,
                }
            })
            .collect();

        let set = Self { links };
        info!(
            tenant = %tenant.display_name(),
            enabled = ?set.enabled_channels(),
            "Contact links prepared"
        );
        set
    }

    pub fn get(&self, channel: ContactChannel) -> Option<&ContactLink> {
        self.links.iter().find(|link| link.channel == channel)
    }

    pub fn is_enabled(&self, channel: ContactChannel) -> bool {
        self.get(channel).is_some_and(|link| link.enabled)
    }

    pub fn enabled_channels(&self) -> Vec<ContactChannel> {
        self.links
            .iter()
            .filter(|link| link.enabled)
            .map(|link| link.channel)
            .collect()
    }
}
