use std::{env, fs, time::Duration};

use taskhub_server::StorageBackend;
use taskhub_server::config::loader::load_config;

// Env overrides are process-wide, so everything that touches them lives in one test.
#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("taskhub.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081
request_timeout_ms = 1000
body_limit_bytes = 2048

[logging]
level = "debug"
format = "json"

[auth]
algorithm = "HS256"
jwt_secret = "file-secret"
password_pepper = "file-pepper"
access_ttl = "5m"
refresh_ttl = "1h"

[storage]
backend = "memory"

[cache]
enabled = true
ttl_secs = 30
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.server.body_limit_bytes, 2048);
    assert_eq!(cfg.storage.backend, StorageBackend::Memory);
    assert_eq!(cfg.auth.access_ttl, Duration::from_secs(300));
    assert_eq!(cfg.auth.refresh_ttl, Duration::from_secs(3600));
    assert_eq!(cfg.cache.ttl_secs, 30);
    assert!(!cfg.redis.enabled);

    // 2) Env override should win over file
    unsafe {
        env::set_var("TASKHUB__SERVER__PORT", "9090");
        env::set_var("TASKHUB__AUTH__JWT_SECRET", "env-secret");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.server.port, 9090);
    assert_eq!(cfg_env.auth.jwt_secret.as_deref(), Some("env-secret"));
    unsafe {
        env::remove_var("TASKHUB__SERVER__PORT");
        env::remove_var("TASKHUB__AUTH__JWT_SECRET");
    }

    // 3) Missing pepper fails validation
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[auth]
jwt_secret = "secret"

[storage]
backend = "memory"
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("auth config error"), "{err}");

    // 4) RS256 without keys fails validation
    let rs_path = dir.path().join("rs256.toml");
    let rs_toml = r#"
[auth]
algorithm = "RS256"
password_pepper = "pepper"

[storage]
backend = "memory"
"#;
    fs::write(&rs_path, rs_toml).expect("write rs256 toml");
    assert!(load_config(rs_path.to_str()).is_err());
}
