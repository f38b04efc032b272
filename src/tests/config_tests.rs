#[cfg(test)]
mod tests {
    use crate::config::{self, AppConfig};
    use std::env;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Environment variables are process wide; tests touching them run one at a time
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn write_temp_config(content: &str) -> NamedTempFile {
        let temp_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        fs::write(temp_file.path(), content).unwrap();
        temp_file
    }

    fn load_with_env(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for (k, v) in vars {
            env::set_var(k, v);
        }
        let result = config::load();
        for (k, _) in vars {
            env::remove_var(k);
        }
        result
    }

    #[test]
    fn test_valid_config_does_not_error() {
        assert!(load_with_env(&[]).is_ok());
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "sqlite://data/bookmarker.db");
        assert_eq!(config.database.max_connections, 16);
        assert_eq!(config.provisioning.favorite_name, "Default");
        assert_eq!(config.provisioning.seed_title, "Introduction");
        assert_eq!(config.media.avatar_dir, "avatar");
        assert_eq!(config.media.thumbnail_dir, "thumbnail");
        assert!(config.maintenance.reconcile_counts_on_startup);
        assert!(config.security.is_none());
        assert!(config::validate(&config).is_ok());
    }

    #[test]
    fn test_config_from_env() {
        let config = load_with_env(&[
            ("BOOKMARKER__SERVER__HOST", "0.0.0.0"),
            ("BOOKMARKER__SERVER__PORT", "3000"),
            ("BOOKMARKER__DATABASE__URL", "sqlite://test.db"),
            ("BOOKMARKER__PROVISIONING__FAVORITE_NAME", "Inbox"),
        ])
        .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite://test.db");
        assert_eq!(config.provisioning.favorite_name, "Inbox");
    }

    #[test]
    fn test_config_from_file() {
        let temp_file = write_temp_config(
            r#"
[server]
port = 9000

[provisioning]
seed_url = "https://example.org/welcome"

[media]
avatar_dir = "uploads/avatars"

[security]
enable_hsts = true
"#,
        );
        let path = temp_file.path().to_str().unwrap().to_string();
        let config = load_with_env(&[("BOOKMARKER_CONFIG", path.as_str())]).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.provisioning.seed_url, "https://example.org/welcome");
        assert_eq!(config.media.avatar_dir, "uploads/avatars");
        assert_eq!(config.security.and_then(|s| s.enable_hsts), Some(true));
    }

    #[test]
    fn test_config_priority() {
        let temp_file = write_temp_config("[server]\nport = 7000\n");
        let path = temp_file.path().to_str().unwrap().to_string();
        let config =
            load_with_env(&[("BOOKMARKER_CONFIG", path.as_str()), ("BOOKMARKER__SERVER__PORT", "8888")]).unwrap();
        assert_eq!(config.server.port, 8888);
    }

    #[test]
    fn test_invalid_server_port() {
        let err = load_with_env(&[("BOOKMARKER__SERVER__PORT", "0")]).unwrap_err();
        assert!(err.to_string().contains("invalid server.port"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut cfg = AppConfig::default();
        cfg.database.max_connections = 0;
        assert!(config::validate(&cfg).unwrap_err().to_string().contains("max_connections"));

        let mut cfg = AppConfig::default();
        cfg.provisioning.favorite_name = "x".repeat(33);
        assert!(config::validate(&cfg).unwrap_err().to_string().contains("favorite_name"));

        let mut cfg = AppConfig::default();
        cfg.provisioning.seed_url = "javascript:alert(1)".to_string();
        assert!(config::validate(&cfg).unwrap_err().to_string().contains("seed_url"));

        let mut cfg = AppConfig::default();
        cfg.media.thumbnail_dir = "../outside".to_string();
        assert!(config::validate(&cfg).unwrap_err().to_string().contains("media.thumbnail_dir"));

        let mut cfg = AppConfig::default();
        cfg.media.avatar_dir = "  ".to_string();
        assert!(config::validate(&cfg).is_err());
    }

    #[test]
    fn test_ensure_sqlite_parent_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("subdir/test.db");
        let db_url = format!("sqlite://{}", db_path.display());

        assert!(!db_path.parent().unwrap().exists());
        config::ensure_sqlite_parent_dir(&db_url).unwrap();
        assert!(db_path.parent().unwrap().exists());
    }

    #[test]
    fn test_ensure_sqlite_parent_dir_non_sqlite() {
        assert!(config::ensure_sqlite_parent_dir("postgres://localhost/db").is_ok());
    }
}
