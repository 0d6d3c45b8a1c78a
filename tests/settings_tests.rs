use scritique_backend::settings::{AppConfig, TransportKind};

fn proxy_config(api_base_url: &str) -> AppConfig {
    AppConfig {
        transport: TransportKind::Proxy,
        host: "127.0.0.1".to_string(),
        port: 8080,
        api_base_url: api_base_url.to_string(),
        ..AppConfig::default()
    }
}

#[test]
fn test_defaults_are_valid() {
    assert!(AppConfig::default().validate().is_ok());
}

#[test]
fn test_proxy_without_base_url_is_accepted_but_unset() {
    let config = proxy_config("");

    assert!(config.validate().is_ok());
    assert_eq!(AppConfig::default().api_base_url, "");
}

#[test]
fn test_proxy_pointing_at_itself_is_rejected() {
    for url in [
        "http://127.0.0.1:8080/api",
        "http://localhost:8080/api",
        "http://[::1]:8080/api/",
    ] {
        let err = proxy_config(url).validate().unwrap_err();
        assert!(
            err.to_string().contains("must not point at this service"),
            "{url} should be rejected"
        );
    }
}

#[test]
fn test_proxy_to_another_backend_is_accepted() {
    assert!(proxy_config("http://127.0.0.1:9090/api").validate().is_ok());
    assert!(proxy_config("https://mailer.scritique.com/api").validate().is_ok());
}

#[test]
fn test_proxy_with_relative_base_url_is_rejected() {
    let err = proxy_config("/api").validate().unwrap_err();
    assert!(err.to_string().contains("API_BASE_URL must be an absolute URL"));
}

#[test]
fn test_oversized_cooldown_is_rejected() {
    let config = AppConfig {
        cooldown_period_ms: u64::MAX,
        ..AppConfig::default()
    };

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("COOLDOWN_PERIOD_MS is out of range"));

    // Even unvalidated, the policy never turns into a negative cooldown.
    assert!(config.rate_limit_policy().cooldown > chrono::Duration::zero());
}

#[test]
fn test_cooldown_converts_to_policy() {
    let config = AppConfig {
        cooldown_period_ms: 1_500,
        ..AppConfig::default()
    };

    assert_eq!(config.rate_limit_policy().cooldown, chrono::Duration::milliseconds(1_500));
}
