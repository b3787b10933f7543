//! Console configuration loaded via OrthoConfig.

use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::telemetry::{LogFormat, UnknownLogFormat};

const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const SESSION_FILE_NAME: &str = ".crm_session.json";
const SESSION_KEY_FILE_NAME: &str = ".crm_session.key";

fn in_home(name: &str) -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(name)
}

/// Settings read from `CRM_*` environment variables and the optional
/// configuration file.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CRM")]
pub struct CrmSettings {
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Maximum number of pooled connections.
    #[ortho_config(default = 4)]
    pub pool_max_size: u32,
    /// Session token location override.
    pub session_file: Option<PathBuf>,
    /// Session signing key location override.
    pub session_key_file: Option<PathBuf>,
    /// `text` or `json`.
    pub log_format: Option<String>,
    /// Password given to the bootstrap administrator.
    pub admin_password: Option<String>,
}

impl Default for CrmSettings {
    fn default() -> Self {
        Self {
            database_url: None,
            pool_max_size: Self::DEFAULT_POOL_MAX_SIZE,
            session_file: None,
            session_key_file: None,
            log_format: None,
            admin_password: None,
        }
    }
}

impl CrmSettings {
    /// Pool size used when none is configured.
    pub const DEFAULT_POOL_MAX_SIZE: u32 = 4;

    /// Configured token path, defaulting to `~/.crm_session.json`.
    pub fn session_file(&self) -> PathBuf {
        self.session_file
            .clone()
            .unwrap_or_else(|| in_home(SESSION_FILE_NAME))
    }

    /// Configured key path, defaulting to `~/.crm_session.key`.
    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| in_home(SESSION_KEY_FILE_NAME))
    }

    /// Log output format, defaulting to plain text.
    pub fn log_format(&self) -> Result<LogFormat, UnknownLogFormat> {
        self.log_format
            .as_deref()
            .map_or(Ok(LogFormat::Text), str::parse)
    }

    /// Bootstrap administrator password.
    pub fn admin_password(&self) -> &str {
        self.admin_password
            .as_deref()
            .unwrap_or(DEFAULT_ADMIN_PASSWORD)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 6] = [
        "CRM_DATABASE_URL",
        "CRM_POOL_MAX_SIZE",
        "CRM_SESSION_FILE",
        "CRM_SESSION_KEY_FILE",
        "CRM_LOG_FORMAT",
        "CRM_ADMIN_PASSWORD",
    ];

    fn load_from_empty_args() -> CrmSettings {
        CrmSettings::load_from_iter([OsString::from("crm")]).expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert!(settings.database_url.is_none());
        assert_eq!(settings.pool_max_size, 4);
        assert_eq!(settings.admin_password(), DEFAULT_ADMIN_PASSWORD);
        assert_eq!(settings.log_format(), Ok(LogFormat::Text));
        assert!(settings.session_file().ends_with(SESSION_FILE_NAME));
        assert!(settings.session_key_file().ends_with(SESSION_KEY_FILE_NAME));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("CRM_DATABASE_URL", Some("postgres://crm@localhost/crm".to_owned())),
            ("CRM_POOL_MAX_SIZE", Some("2".to_owned())),
            ("CRM_SESSION_FILE", Some("/tmp/crm/session.json".to_owned())),
            ("CRM_SESSION_KEY_FILE", Some("/tmp/crm/session.key".to_owned())),
            ("CRM_LOG_FORMAT", Some("json".to_owned())),
            ("CRM_ADMIN_PASSWORD", Some("s3cret!".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://crm@localhost/crm")
        );
        assert_eq!(settings.pool_max_size, 2);
        assert_eq!(settings.session_file(), PathBuf::from("/tmp/crm/session.json"));
        assert_eq!(
            settings.session_key_file(),
            PathBuf::from("/tmp/crm/session.key")
        );
        assert_eq!(settings.log_format(), Ok(LogFormat::Json));
        assert_eq!(settings.admin_password(), "s3cret!");
    }

    #[rstest]
    fn unknown_log_format_is_reported() {
        let _guard = lock_env(
            VARS.map(|name| (name, (name == "CRM_LOG_FORMAT").then(|| "yaml".to_owned()))),
        );

        let settings = load_from_empty_args();
        assert_eq!(
            settings.log_format(),
            Err(UnknownLogFormat("yaml".to_owned()))
        );
    }
}
