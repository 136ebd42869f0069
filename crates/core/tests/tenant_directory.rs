//! Tenant loading from a configs directory on disk.

use leadwizard_core::config::{ContactDefaults, TenantsConfig};
use leadwizard_core::tenant::{
    ClientResolver, ClientSelection, DirectorySource, TenantLoader, TenantOrigin,
};
use std::path::Path;
use url::Url;

fn write(dir: &Path, name: &str, body: &str) {
    std::fs::write(dir.join(name), body).unwrap();
}

fn loader(dir: &Path) -> TenantLoader<DirectorySource> {
    TenantLoader::new(
        DirectorySource::new(dir),
        &TenantsConfig::default(),
        &ContactDefaults::default(),
    )
}

#[tokio::test]
async fn test_subdomain_tenant_file_is_merged() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "summit.json",
        r#"{"name":"Summit","companyName":"Summit Roofing Co","whatsappNumber":"15551234567","email":"leads@summit.example"}"#,
    );

    let page = Url::parse("https://summit.roofquotes.example.com/").unwrap();
    let selection = ClientResolver::new("roofer_config").resolve(&page);
    assert_eq!(selection, ClientSelection::Named("summit".to_string()));

    let resolved = loader(dir.path()).load(&selection).await;
    assert_eq!(resolved.origin, TenantOrigin::Client);
    assert_eq!(resolved.config.display_name(), "Summit Roofing Co");
    assert_eq!(resolved.config.whatsapp(), Some("15551234567"));
    assert_eq!(resolved.config.phone(), Some("9987412299"));
    assert_eq!(resolved.config.email(), Some("leads@summit.example"));
}

#[tokio::test]
async fn test_broken_tenant_file_falls_back_to_default_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "summit.json", "{ not json");
    write(dir.path(), "roofer_config.json", r#"{"name":"Local Roofer"}"#);

    let resolved = loader(dir.path())
        .load(&ClientSelection::Named("summit".to_string()))
        .await;
    assert_eq!(resolved.origin, TenantOrigin::DefaultTenant);
    assert_eq!(resolved.config.name, "Local Roofer");
}

#[tokio::test]
async fn test_empty_directory_keeps_builtin_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let resolved = loader(dir.path())
        .load(&ClientSelection::Named("summit".to_string()))
        .await;
    assert_eq!(resolved.origin, TenantOrigin::BuiltIn);
    assert_eq!(resolved.config.name, "Roofer");
    assert_eq!(resolved.config.email(), None);
}
