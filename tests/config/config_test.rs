use std::io::Write;

use tablediff::config::{ConfigError, EngineConfig};
use tablediff::orchestrator::Algorithm;

fn write_temp_toml(name: &str, content: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("tablediff-config-test-{name}-{}.toml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn loads_defaults_and_named_profiles_from_a_toml_file() {
    let path = write_temp_toml(
        "profiles",
        r#"
        [defaults]
        bisection_factor = 8

        [profiles.quick_check]
        algorithm = "hash_diff"
        bisection_threshold = 500

        [profiles.nightly_full]
        algorithm = "join_diff"
        threads = 16
        "#,
    );

    let config = EngineConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.defaults.bisection_factor, Some(8));

    let quick = config.resolve(Some("quick_check"));
    assert_eq!(quick.algorithm, Algorithm::HashDiff);
    assert_eq!(quick.bisection_threshold, 500);
    // Unset fields in the profile fall back to the engine's own defaults,
    // not to `[defaults]` in the file.
    assert_eq!(quick.bisection_factor, tablediff::orchestrator::DiffOptions::default().bisection_factor);

    let nightly = config.resolve(Some("nightly_full"));
    assert_eq!(nightly.algorithm, Algorithm::JoinDiff);
    assert_eq!(nightly.threads, 16);

    let unnamed = config.resolve(None);
    assert_eq!(unnamed.bisection_factor, 8);
}

#[test]
fn unknown_profile_name_falls_back_to_defaults() {
    let path = write_temp_toml(
        "unknown-profile",
        r#"
        [defaults]
        threads = 4
        "#,
    );
    let config = EngineConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let resolved = config.resolve(Some("does_not_exist"));
    assert_eq!(resolved.threads, 4);
}

#[test]
fn expands_environment_variables_before_parsing() {
    std::env::set_var("TABLEDIFF_CONFIG_TEST_THRESHOLD", "777");
    let path = write_temp_toml(
        "env-expansion",
        r#"
        [defaults]
        bisection_threshold = ${TABLEDIFF_CONFIG_TEST_THRESHOLD}
        "#,
    );

    let config = EngineConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();
    std::env::remove_var("TABLEDIFF_CONFIG_TEST_THRESHOLD");

    assert_eq!(config.defaults.bisection_threshold, Some(777));
}

#[test]
fn missing_environment_variable_reference_is_a_parse_time_error() {
    let path = write_temp_toml(
        "missing-env",
        r#"
        [defaults]
        threads = ${TABLEDIFF_CONFIG_TEST_DEFINITELY_UNSET}
        "#,
    );

    let err = EngineConfig::from_file(&path).unwrap_err();
    std::fs::remove_file(&path).ok();
    assert!(matches!(err, ConfigError::MissingEnvVar(_)));
}

#[test]
fn load_honors_the_explicit_config_path_override() {
    let path = write_temp_toml(
        "explicit-path",
        r#"
        [defaults]
        case_sensitive = false
        "#,
    );
    std::env::set_var("TABLEDIFF_CONFIG", &path);

    let config = EngineConfig::load().unwrap();
    std::fs::remove_file(&path).ok();
    std::env::remove_var("TABLEDIFF_CONFIG");

    assert_eq!(config.defaults.case_sensitive, Some(false));
}

#[test]
fn malformed_toml_is_reported_as_a_parse_error() {
    let path = write_temp_toml("malformed", "this is not valid toml {{{");
    let err = EngineConfig::from_file(&path).unwrap_err();
    std::fs::remove_file(&path).ok();
    assert!(matches!(err, ConfigError::ParseError(_)));
}
