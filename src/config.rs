use std::path::Path;

use serde::Deserialize;

use crate::error::validation::{MAX_FAVORITE_NAME_LEN, MAX_REMARK_LEN, MAX_TITLE_LEN};

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Content of the resources every new user receives.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisioningConfig {
    pub favorite_name: String,
    pub seed_title: String,
    pub seed_url: String,
    pub seed_remark: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub avatar_dir: String,
    pub thumbnail_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceConfig {
    pub reconcile_counts_on_startup: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecurityConfig {
    pub enable_hsts: Option<bool>,
    pub hsts_max_age: Option<u64>,
    pub hsts_include_subdomains: Option<bool>,
    pub csp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub provisioning: ProvisioningConfig,
    pub media: MediaConfig,
    pub maintenance: MaintenanceConfig,
    pub security: Option<SecurityConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        let defaults: &str = include_str!("../config/default.toml");
        match ::config::Config::builder()
            .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => {
                    eprintln!("FATAL: Failed to deserialize default config: {}", e);
                    panic!("Failed to deserialize default config: {}", e);
                }
            },
            Err(e) => {
                eprintln!("FATAL: Failed to parse default config: {}", e);
                panic!("Failed to parse default config: {}", e);
            }
        }
    }
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        // Mirror defaults from config/default.toml
        Self {
            favorite_name: crate::store::favorites::DEFAULT_FAVORITE_NAME.to_string(),
            seed_title: "Introduction".to_string(),
            seed_url: "http://ivwsyygyfnhv-lbm.daoapp.io".to_string(),
            seed_remark: "This is a sample bookmark".to_string(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self { avatar_dir: "avatar".to_string(), thumbnail_dir: "thumbnail".to_string() }
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let defaults: &str = include_str!("../config/default.toml");
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
        // Optional local file: bookmarker.toml (in CWD)
        .add_source(::config::File::with_name("bookmarker").required(false));

    if let Ok(custom_path) = std::env::var("BOOKMARKER_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("BOOKMARKER").separator("__"));

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    // Server
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    // Database
    if cfg.database.max_connections == 0 {
        return Err(anyhow::anyhow!("database.max_connections must be > 0"));
    }

    // Provisioning
    let p = &cfg.provisioning;
    let name_len = p.favorite_name.trim().chars().count();
    if name_len == 0 || name_len > MAX_FAVORITE_NAME_LEN {
        return Err(anyhow::anyhow!(
            "provisioning.favorite_name must be 1..={} characters",
            MAX_FAVORITE_NAME_LEN
        ));
    }
    if p.seed_title.chars().count() > MAX_TITLE_LEN {
        return Err(anyhow::anyhow!("provisioning.seed_title exceeds {} characters", MAX_TITLE_LEN));
    }
    if p.seed_remark.chars().count() > MAX_REMARK_LEN {
        return Err(anyhow::anyhow!("provisioning.seed_remark exceeds {} characters", MAX_REMARK_LEN));
    }
    if crate::error::validation::validate_url(&p.seed_url).is_err() {
        return Err(anyhow::anyhow!("provisioning.seed_url is not a valid http(s) URL: {}", p.seed_url));
    }

    // Media
    for (field, dir) in [("media.avatar_dir", &cfg.media.avatar_dir), ("media.thumbnail_dir", &cfg.media.thumbnail_dir)] {
        let trimmed = dir.trim();
        if trimmed.is_empty() {
            return Err(anyhow::anyhow!("{} must not be empty", field));
        }
        if trimmed.starts_with('/') || trimmed.contains("..") {
            return Err(anyhow::anyhow!("{} must be a relative path without '..': {}", field, dir));
        }
    }

    Ok(())
}

pub fn ensure_sqlite_parent_dir(url: &str) -> anyhow::Result<()> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        // On Windows, handle URLs like sqlite:///C:/... by stripping the leading '/'
        #[cfg(windows)]
        let path = {
            let bytes = path.as_bytes();
            if bytes.len() >= 3 && bytes[0] == b'/' && bytes[2] == b':' && bytes[1].is_ascii_alphabetic() {
                &path[1..]
            } else {
                path
            }
        };
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }
    Ok(())
}
