//! Tenant configuration: per-client branding and contact endpoints.
//!
//! The client is picked from the landing-page URL (an explicit `?config=`
//! parameter, else the subdomain), its JSON record is fetched from a
//! [`TenantSource`] and merged over the built-in defaults. A failed fetch falls
//! back to the default tenant, then to the built-in record.

use crate::config::{ContactDefaults, TenantsConfig};
use crate::error::{WizardError, WizardResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use url::{Host, Url};

const FALLBACK_DISPLAY_NAME: &str = "Roofer";
const DEFAULT_PAGE_TITLE: &str = "Roofing Cost Estimate";

// ─── Records ────────────────────────────────────────────────────────────────

/// Fully resolved tenant record. Read-only once handed to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub phone_number: String,
    pub whatsapp_number: String,
    pub email: String,
}

/// A tenant file as found on disk: every key optional, present keys win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantOverlay {
    pub name: Option<String>,
    pub company_name: Option<String>,
    pub phone_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
}

impl TenantConfig {
    pub fn builtin(defaults: &ContactDefaults) -> Self {
        Self {
            name: defaults.name.clone(),
            company_name: None,
            phone_number: defaults.phone_number.clone(),
            whatsapp_number: defaults.whatsapp_number.clone(),
            email: defaults.email.clone(),
        }
    }

    /// Shallow merge: each key present in `overlay` replaces the current one.
    pub fn merged(mut self, overlay: TenantOverlay) -> Self {
        if let Some(name) = overlay.name {
            self.name = name;
        }
        if overlay.company_name.is_some() {
            self.company_name = overlay.company_name;
        }
        if let Some(phone) = overlay.phone_number {
            self.phone_number = phone;
        }
        if let Some(whatsapp) = overlay.whatsapp_number {
            self.whatsapp_number = whatsapp;
        }
        if let Some(email) = overlay.email {
            self.email = email;
        }
        self
    }

    fn company(&self) -> Option<&str> {
        self.company_name.as_deref().filter(|c| !c.is_empty())
    }

    /// Brand shown to the visitor.
    pub fn display_name(&self) -> &str {
        self.company()
            .or_else(|| Some(self.name.as_str()).filter(|n| !n.is_empty()))
            .unwrap_or(FALLBACK_DISPLAY_NAME)
    }

    pub fn page_title(&self) -> String {
        match self.company() {
            Some(company) => format!("{company} - Roofing Estimate"),
            None => DEFAULT_PAGE_TITLE.to_string(),
        }
    }

    pub fn phone(&self) -> Option<&str> {
        non_empty(&self.phone_number)
    }

    pub fn whatsapp(&self) -> Option<&str> {
        non_empty(&self.whatsapp_number)
    }

    pub fn email(&self) -> Option<&str> {
        non_empty(&self.email)
    }
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self::builtin(&ContactDefaults::default())
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

// ─── Client Resolution ──────────────────────────────────────────────────────

/// Which tenant record the page asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientSelection {
    Named(String),
    /// Page opened from disk; tenant files cannot be fetched.
    Offline,
}

/// Picks the client name from a landing-page URL.
#[derive(Debug, Clone)]
pub struct ClientResolver {
    default_tenant: String,
}

impl ClientResolver {
    pub fn new(default_tenant: impl Into<String>) -> Self {
        Self {
            default_tenant: default_tenant.into(),
        }
    }

    pub fn resolve(&self, page: &Url) -> ClientSelection {
        if page.scheme() == "file" {
            warn!(url = %page, "Page opened from disk, tenant files will not be fetched");
            return ClientSelection::Offline;
        }

        let host = page.host_str().unwrap_or_default();
        let local = is_local_host(page);

        let explicit = page
            .query_pairs()
            .find(|(key, value)| key == "config" && !value.is_empty())
            .map(|(_, value)| value.into_owned());

        let detected = explicit.or_else(|| {
            if local {
                return None;
            }
            let labels: Vec<&str> = host.split('.').collect();
            (labels.len() > 2).then(|| labels[0].to_string())
        });

        let client = match detected {
            Some(name) if is_valid_client_name(&name) => name,
            Some(name) => {
                warn!(client = %name, "Rejected malformed client name, using default tenant");
                self.default_tenant.clone()
            }
            None => self.default_tenant.clone(),
        };

        debug!(host = %host, local, client = %client, "Client resolved");
        ClientSelection::Named(client)
    }
}

fn is_local_host(page: &Url) -> bool {
    match page.host() {
        Some(Host::Domain(domain)) => domain == "localhost" || !domain.contains('.'),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => true,
        None => true,
    }
}

/// Client names become file names, so only ASCII letters, digits, '-' and '_'.
fn is_valid_client_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

// ─── Sources ────────────────────────────────────────────────────────────────

/// Asynchronous provider of raw tenant records.
pub trait TenantSource: Send + Sync {
    fn fetch(&self, client: &str) -> impl Future<Output = WizardResult<TenantOverlay>> + Send;
}

/// Reads `<dir>/<client>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TenantSource for DirectorySource {
    async fn fetch(&self, client: &str) -> WizardResult<TenantOverlay> {
        let path = self.dir.join(format!("{client}.json"));
        debug!(path = %path.display(), "Loading tenant file");
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| WizardError::TenantUnavailable {
                client: client.to_string(),
                reason: format!("{}: {e}", path.display()),
            })?;
        serde_json::from_str(&raw).map_err(|e| WizardError::TenantUnavailable {
            client: client.to_string(),
            reason: format!("invalid json in {}: {e}", path.display()),
        })
    }
}

/// Fixed set of tenant records, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    tenants: HashMap<String, TenantOverlay>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(mut self, client: impl Into<String>, overlay: TenantOverlay) -> Self {
        self.tenants.insert(client.into(), overlay);
        self
    }
}

impl TenantSource for InMemorySource {
    async fn fetch(&self, client: &str) -> WizardResult<TenantOverlay> {
        self.tenants
            .get(client)
            .cloned()
            .ok_or_else(|| WizardError::TenantUnavailable {
                client: client.to_string(),
                reason: "not found".to_string(),
            })
    }
}

// ─── Loader ─────────────────────────────────────────────────────────────────

/// Which link of the fallback chain supplied the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantOrigin {
    Client,
    DefaultTenant,
    BuiltIn,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTenant {
    pub requested: Option<String>,
    pub origin: TenantOrigin,
    pub config: TenantConfig,
}

/// Resolves a tenant through the chain: requested client, default tenant,
/// built-in record. Never fails.
pub struct TenantLoader<S> {
    source: S,
    default_tenant: String,
    builtin: TenantConfig,
}

impl<S: TenantSource> TenantLoader<S> {
    pub fn new(source: S, tenants: &TenantsConfig, defaults: &ContactDefaults) -> Self {
        Self {
            source,
            default_tenant: tenants.default_tenant.clone(),
            builtin: TenantConfig::builtin(defaults),
        }
    }

    pub async fn load(&self, selection: &ClientSelection) -> ResolvedTenant {
        let client = match selection {
            ClientSelection::Offline => {
                return self.builtin_for(None);
            }
            ClientSelection::Named(client) => client.as_str(),
        };

        match self.source.fetch(client).await {
            Ok(overlay) => {
                let origin = if client == self.default_tenant {
                    TenantOrigin::DefaultTenant
                } else {
                    TenantOrigin::Client
                };
                info!(client = %client, origin = ?origin, "Tenant config merged");
                return self.resolved(Some(client), origin, overlay);
            }
            Err(e) => {
                warn!(client = %client, error = %e, "Failed to load tenant config");
                metrics::counter!("tenant.fallbacks").increment(1);
            }
        }

        if client != self.default_tenant {
            info!(default = %self.default_tenant, "Falling back to default tenant config");
            match self.source.fetch(&self.default_tenant).await {
                Ok(overlay) => {
                    return self.resolved(Some(client), TenantOrigin::DefaultTenant, overlay);
                }
                Err(e) => {
                    warn!(error = %e, "Could not load fallback tenant config");
                    metrics::counter!("tenant.fallbacks").increment(1);
                }
            }
        }

        self.builtin_for(Some(client))
    }

    fn resolved(
        &self,
        requested: Option<&str>,
        origin: TenantOrigin,
        overlay: TenantOverlay,
    ) -> ResolvedTenant {
        ResolvedTenant {
            requested: requested.map(str::to_string),
            origin,
            config: self.builtin.clone().merged(overlay),
        }
    }

    fn builtin_for(&self, requested: Option<&str>) -> ResolvedTenant {
        ResolvedTenant {
            requested: requested.map(str::to_string),
            origin: TenantOrigin::BuiltIn,
            config: self.builtin.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ClientResolver {
        ClientResolver::new("roofer_config")
    }

    fn named(name: &str) -> ClientSelection {
        ClientSelection::Named(name.to_string())
    }

    fn resolve(url: &str) -> ClientSelection {
        resolver().resolve(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_config_param_wins() {
        assert_eq!(resolve("https://acme.quotes.example.com/?config=summit"), named("summit"));
        assert_eq!(resolve("http://localhost:8080/?config=summit"), named("summit"));
    }

    #[test]
    fn test_subdomain_detection() {
        assert_eq!(resolve("https://acme.quotes.example.com/"), named("acme"));
        assert_eq!(resolve("https://example.com/"), named("roofer_config"));
    }

    #[test]
    fn test_local_hosts_use_default() {
        assert_eq!(resolve("http://localhost:3000/"), named("roofer_config"));
        assert_eq!(resolve("http://127.0.0.1:5500/index.html"), named("roofer_config"));
        assert_eq!(resolve("http://192.168.1.20/"), named("roofer_config"));
        assert_eq!(resolve("http://devbox/"), named("roofer_config"));
    }

    #[test]
    fn test_empty_param_is_ignored() {
        assert_eq!(resolve("https://acme.quotes.example.com/?config="), named("acme"));
    }

    #[test]
    fn test_malformed_client_name_rejected() {
        assert_eq!(resolve("https://x.example.com/?config=../secrets"), named("roofer_config"));
    }

    #[test]
    fn test_file_scheme_is_offline() {
        assert_eq!(resolve("file:///home/user/site/index.html"), ClientSelection::Offline);
    }

    #[test]
    fn test_merge_overrides_present_keys_only() {
        let overlay = TenantOverlay {
            name: Some("Summit Roofing".to_string()),
            email: Some("hello@summit.example".to_string()),
            ..Default::default()
        };
        let merged = TenantConfig::default().merged(overlay);
        assert_eq!(merged.name, "Summit Roofing");
        assert_eq!(merged.email(), Some("hello@summit.example"));
        assert_eq!(merged.phone_number, "9987412299");
        assert_eq!(merged.whatsapp_number, "9987412299");
    }

    #[test]
    fn test_overlay_parses_camel_case_and_ignores_unknown_keys() {
        let overlay: TenantOverlay = serde_json::from_str(
            r#"{"companyName":"Summit","phoneNumber":"5551234","theme":"dark"}"#,
        )
        .unwrap();
        assert_eq!(overlay.company_name.as_deref(), Some("Summit"));
        assert_eq!(overlay.phone_number.as_deref(), Some("5551234"));
        assert_eq!(overlay.email, None);
    }

    #[test]
    fn test_display_name_and_title() {
        let mut config = TenantConfig::default();
        assert_eq!(config.display_name(), "Roofer");
        assert_eq!(config.page_title(), "Roofing Cost Estimate");

        config.name = String::new();
        assert_eq!(config.display_name(), "Roofer");

        config.company_name = Some("Summit Roofing".to_string());
        assert_eq!(config.display_name(), "Summit Roofing");
        assert_eq!(config.page_title(), "Summit Roofing - Roofing Estimate");
    }

    #[test]
    fn test_empty_endpoints_are_absent() {
        let config = TenantConfig {
            phone_number: "  ".to_string(),
            ..TenantConfig::default()
        };
        assert_eq!(config.phone(), None);
        assert_eq!(config.email(), None);
        assert_eq!(config.whatsapp(), Some("9987412299"));
    }

    fn loader(source: InMemorySource) -> TenantLoader<InMemorySource> {
        TenantLoader::new(source, &TenantsConfig::default(), &ContactDefaults::default())
    }

    #[tokio::test]
    async fn test_loader_specific_tenant() {
        let source = InMemorySource::new().with_tenant(
            "summit",
            TenantOverlay {
                company_name: Some("Summit".to_string()),
                ..Default::default()
            },
        );
        let resolved = loader(source).load(&named("summit")).await;
        assert_eq!(resolved.origin, TenantOrigin::Client);
        assert_eq!(resolved.config.display_name(), "Summit");
    }

    #[tokio::test]
    async fn test_loader_falls_back_to_default_tenant() {
        let source = InMemorySource::new().with_tenant(
            "roofer_config",
            TenantOverlay {
                name: Some("Default Roofer".to_string()),
                ..Default::default()
            },
        );
        let resolved = loader(source).load(&named("missing")).await;
        assert_eq!(resolved.origin, TenantOrigin::DefaultTenant);
        assert_eq!(resolved.requested.as_deref(), Some("missing"));
        assert_eq!(resolved.config.name, "Default Roofer");
    }

    #[tokio::test]
    async fn test_loader_falls_back_to_builtin() {
        let resolved = loader(InMemorySource::new()).load(&named("missing")).await;
        assert_eq!(resolved.origin, TenantOrigin::BuiltIn);
        assert_eq!(resolved.config, TenantConfig::default());
    }

    #[tokio::test]
    async fn test_loader_offline_uses_builtin() {
        let source = InMemorySource::new().with_tenant("roofer_config", TenantOverlay::default());
        let resolved = loader(source).load(&ClientSelection::Offline).await;
        assert_eq!(resolved.origin, TenantOrigin::BuiltIn);
        assert_eq!(resolved.requested, None);
    }
}
