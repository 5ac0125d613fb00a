//! Secret-literal guard
//!
//! GREEN when:
//! - A token-looking literal anywhere in the merged config aborts the load
//!   with CONFIG_SECRET_DETECTED and the value is not echoed.
//! - Env var NAMES are accepted.
//! - A secret introduced by an overlay is caught just like one in the base.

use nest_config::{load_layered_yaml_from_strings, DEFAULT_CONFIG_YAML};

const UPSTREAM_WITH_SECRET: &str = r#"
catalog:
  upstream:
    api_key: "sk-live-abc123secretvalue"
"#;

const UPSTREAM_WITH_ENV_NAME: &str = r#"
catalog:
  upstream:
    api_key_env: "NEST_UPSTREAM_API_KEY"
"#;

const SECRET_IN_ARRAY: &str = r#"
hooks:
  - url: "https://example.com"
    token: "ghp_0123456789abcdef"
"#;

#[test]
fn literal_secret_is_rejected_without_echo() {
    let err = load_layered_yaml_from_strings(&[UPSTREAM_WITH_SECRET]).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("CONFIG_SECRET_DETECTED"), "{msg}");
    assert!(msg.contains("/catalog/upstream/api_key"), "{msg}");
    assert!(!msg.contains("abc123secretvalue"), "{msg}");
}

#[test]
fn env_var_names_are_accepted() {
    let loaded = load_layered_yaml_from_strings(&[UPSTREAM_WITH_ENV_NAME]).unwrap();
    let name = loaded
        .config_json
        .pointer("/catalog/upstream/api_key_env")
        .and_then(|v| v.as_str())
        .unwrap();
    assert_eq!(name, "NEST_UPSTREAM_API_KEY");
}

#[test]
fn secrets_in_arrays_and_overlays_are_caught() {
    let err = load_layered_yaml_from_strings(&[DEFAULT_CONFIG_YAML, SECRET_IN_ARRAY]).unwrap_err();
    assert!(format!("{err:#}").contains("/hooks/0/token"));
}
