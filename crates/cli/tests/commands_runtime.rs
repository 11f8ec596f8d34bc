use std::env;
use std::sync::{Mutex, OnceLock};

use rfq_cli::commands::{config, doctor, migrate, seed};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("RFQ_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["error_class"], Value::Null);
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("RFQ_DATABASE_URL", "postgres://localhost/rfq")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_reports_catalog_summary() {
    with_env(&[("RFQ_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected seed success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.starts_with("product catalog seeded: 7 product(s), 6 active"));
        assert!(message.contains("  - prod-cnc-machining"));
        assert!(message.contains("  - prod-legacy-casting"));
    });
}

#[test]
fn seed_is_idempotent_against_a_file_database() {
    let dir = std::env::temp_dir().join(format!("rfq-cli-seed-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let url = format!("sqlite://{}", dir.join("seed.db").display());

    with_env(&[("RFQ_DATABASE_URL", url.as_str())], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");

        assert_eq!(parse_payload(&first.output)["message"], parse_payload(&second.output)["message"]);
    });

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn doctor_json_reports_every_check() {
    with_env(&[("RFQ_DATABASE_URL", "sqlite::memory:")], || {
        let report: Value =
            serde_json::from_str(&doctor::run(true)).expect("doctor output should be JSON");

        let names: Vec<&str> = report["checks"]
            .as_array()
            .expect("checks")
            .iter()
            .filter_map(|check| check["name"].as_str())
            .collect();
        assert_eq!(
            names,
            vec!["config_validation", "database_connectivity", "schema_migrations", "product_catalog"]
        );
        // A fresh in-memory database has no migrations applied.
        assert_eq!(report["overall_status"], "fail");
        assert_eq!(report["checks"][2]["status"], "fail");
    });
}

#[test]
fn doctor_skips_database_checks_when_config_invalid() {
    with_env(&[("RFQ_SERVER_PORT", "not-a-port")], || {
        let output = doctor::run(false);
        assert!(output.starts_with("doctor: one or more readiness checks failed"));
        assert!(output.contains("- [fail] config_validation"));
        assert!(output.contains("- [skip] database_connectivity"));
    });
}

#[test]
fn config_attributes_env_sources() {
    let vars = [
        ("RFQ_SERVER_PORT", "9191"),
        ("RFQ_LOG_LEVEL", "debug"),
        ("RFQ_SERVER_SESSION_IDLE_SECS", "600"),
    ];
    with_env(&vars, || {
        let output = config::run();
        assert!(output.contains("- server.port = 9191 (source: env (RFQ_SERVER_PORT))"));
        assert!(output.contains("- logging.level = debug (source: env (RFQ_LOG_LEVEL))"));
        assert!(output.contains("- server.session_capacity = 1024 (source: default)"));
        assert!(output
            .contains("- server.session_idle_secs = 600 (source: env (RFQ_SERVER_SESSION_IDLE_SECS))"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "RFQ_DATABASE_URL",
        "RFQ_DATABASE_MAX_CONNECTIONS",
        "RFQ_DATABASE_TIMEOUT_SECS",
        "RFQ_SERVER_BIND_ADDRESS",
        "RFQ_SERVER_PORT",
        "RFQ_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "RFQ_SERVER_SESSION_CAPACITY",
        "RFQ_SERVER_SESSION_IDLE_SECS",
        "RFQ_LOGGING_LEVEL",
        "RFQ_LOGGING_FORMAT",
        "RFQ_LOG_LEVEL",
        "RFQ_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
