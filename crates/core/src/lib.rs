//! Shared foundations for the roofing lead wizard: configuration, error
//! taxonomy, field/step vocabulary and tenant resolution.

pub mod config;
pub mod error;
pub mod tenant;
pub mod types;

pub use config::AppConfig;
pub use error::{WizardError, WizardResult};
pub use tenant::{TenantConfig, TenantLoader};
pub use types::{Coordinate, FieldKey, FieldValue, Step};
