#![cfg(feature = "serde")]

use restguard::{ClientConfig, RestClient, Timeouts};

#[test]
fn only_base_url_is_required() {
    let config: ClientConfig =
        serde_json::from_str(r#"{ "base_url": "https://api.example.com/" }"#).unwrap();
    assert_eq!(config.timeouts, Timeouts::default());
    assert!(!config.follow_redirects);
    assert!(config.user_agent.starts_with("restguard/"));
    assert!(RestClient::new(config).is_ok());
}

#[test]
fn full_config_deserializes() {
    let config: ClientConfig = serde_json::from_str(
        r#"{
            "base_url": "https://api.example.com/",
            "credentials": { "username": "svc", "password": "secret" },
            "proxy": { "host": "proxy.local", "port": 3128 },
            "timeouts": { "read_ms": 500 },
            "hostname_overrides": ["internal.example.com"]
        }"#,
    )
    .unwrap();

    assert_eq!(config.timeouts, Timeouts::from_millis(500, 2000, 2000));
    assert_eq!(config.credentials.as_ref().map(|c| c.username.as_str()), Some("svc"));
    assert_eq!(config.effective_proxy().map(|p| p.port), Some(3128));
    assert_eq!(config.hostname_overrides, vec!["internal.example.com".to_string()]);
}
