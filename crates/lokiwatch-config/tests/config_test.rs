#![allow(clippy::unwrap_used)]
// Loading, saving and translating profiles against real files.

use std::time::Duration;

use pretty_assertions::assert_eq;

use lokiwatch_config::{
    Config, ConfigError, Defaults, PageSizeOverrides, Profile, load_config_from,
    profile_to_dashboard_config, save_config_to,
};
use lokiwatch_core::TlsVerification;

const SAMPLE: &str = r#"
default_profile = "lab"

[defaults]
output = "json"
timeout = 15

[profiles.lab]
url = "http://10.0.0.5:8080"
websocket = false
debounce_ms = 150

[profiles.lab.page_sizes]
alerts = 50

[profiles.edge]
url = "https://edge.example:8443"
ca_cert = "/etc/lokiwatch/ca.pem"
summary_interval_secs = 0
"#;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg.default_profile.as_deref(), Some("default"));
    assert_eq!(cfg.defaults, Defaults::default());
    assert!(cfg.profiles.is_empty());
}

#[test]
fn profiles_load_from_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, SAMPLE).unwrap();

    let cfg = load_config_from(&path).unwrap();
    assert_eq!(cfg.defaults.output, "json");
    assert_eq!(cfg.defaults.color, "auto");

    let (name, lab) = cfg.profile(None).unwrap();
    assert_eq!(name, "lab");
    assert_eq!(lab.page_sizes.alerts, Some(50));

    let dash = profile_to_dashboard_config(lab, &cfg.defaults).unwrap();
    assert_eq!(dash.url.as_str(), "http://10.0.0.5:8080/");
    assert!(!dash.websocket_enabled);
    assert_eq!(dash.timeout, Duration::from_secs(15));
    assert_eq!(dash.debounce, Duration::from_millis(150));
    assert_eq!(dash.page_sizes.alerts, 50);
    assert_eq!(dash.page_sizes.signatures, 20);
    assert_eq!(dash.tls, TlsVerification::SystemDefaults);
    assert_eq!(dash.reconnect_delay, Duration::from_secs(5));

    let (_, edge) = cfg.profile(Some("edge")).unwrap();
    let dash = profile_to_dashboard_config(edge, &cfg.defaults).unwrap();
    assert_eq!(
        dash.tls,
        TlsVerification::CustomCa("/etc/lokiwatch/ca.pem".into())
    );
    assert!(dash.summary_interval.is_zero());
}

#[test]
fn save_then_load_keeps_profiles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut cfg = Config::default();
    let mut profile = Profile::new("http://ids.local:8080");
    profile.insecure = Some(true);
    profile.page_sizes = PageSizeOverrides {
        devices: Some(5),
        ..PageSizeOverrides::default()
    };
    cfg.profiles.insert("default".into(), profile);

    save_config_to(&cfg, &path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("[profiles.default]"));

    let loaded = load_config_from(&path).unwrap();
    assert_eq!(loaded, cfg);
}

#[test]
fn insecure_default_applies_to_profiles() {
    let defaults = Defaults {
        insecure: true,
        ..Defaults::default()
    };
    let dash = profile_to_dashboard_config(&Profile::new("https://ids.local"), &defaults).unwrap();
    assert_eq!(dash.tls, TlsVerification::DangerAcceptInvalid);
}

#[test]
fn invalid_profiles_are_rejected() {
    let defaults = Defaults::default();

    let err = profile_to_dashboard_config(&Profile::new("not a url"), &defaults).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "url"));

    let err = profile_to_dashboard_config(&Profile::new("ftp://ids.local"), &defaults).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { .. }));

    let mut zero_timeout = Profile::new("http://ids.local");
    zero_timeout.timeout = Some(0);
    assert!(profile_to_dashboard_config(&zero_timeout, &defaults).is_err());

    let mut huge_page = Profile::new("http://ids.local");
    huge_page.page_sizes.alerts = Some(500);
    let err = profile_to_dashboard_config(&huge_page, &defaults).unwrap_err();
    assert!(err.to_string().contains("page_sizes.alerts"));
}
