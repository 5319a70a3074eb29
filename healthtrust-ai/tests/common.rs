#![allow(dead_code)]

use std::sync::OnceLock;

use healthtrust_common::observability::{LogConfig, LogFormat};
use healthtrust_config::AiSettings;

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "healthtrust-tests",
            emit_stderr: true,
            format: if std::env::var("HEALTHTRUST_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".to_string(),
            log_dir: Some(std::env::temp_dir().join("healthtrust-tests")),
        };

        healthtrust_common::observability::init_logging(config).unwrap_or_default()
    });
}

pub fn settings_for(uri: &str) -> AiSettings {
    AiSettings {
        api_key: Some("test-key".to_string()),
        base_url: format!("{uri}/api/v1"),
        timeout_secs: 2,
        ..AiSettings::default()
    }
}
