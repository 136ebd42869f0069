//! Contact-link channels.
//!
//! Each channel turns the assembled inquiry message plus one tenant endpoint
//! into a deep link the visitor can open: WhatsApp chat, SMS compose, or an
//! email draft. A channel without an endpoint is disabled, never broken.

pub mod contacts;
pub mod email;
pub mod sms;
pub mod whatsapp;

pub use contacts::{ContactChannel, ContactLink, ContactSet};
