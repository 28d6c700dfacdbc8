use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::constants::DEFAULT_PORT;

/// Persistent disk root provided by the hosting platform
pub const DISK_PATH_ENV: &str = "RENDER_DISK_PATH";
pub const PORT_ENV: &str = "PORT";

fn default_max_upload_mb() -> usize {
    25
}

/// Server configuration file structure (TOML). Every key is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on (default: 5050)
    pub port: Option<u16>,
    /// SQLite database file (default: skipp.sqlite)
    pub database: Option<PathBuf>,
    /// Directory uploaded images are written to (default: uploads)
    pub uploads_dir: Option<PathBuf>,
    /// Built client served as static assets (default: client/dist)
    pub client_dist: Option<PathBuf>,
    /// Base used for returned image URLs instead of the request's host
    pub public_url: Option<String>,
    /// Request body limit for uploads in MiB (default: 25)
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: None,
            database: None,
            uploads_dir: None,
            client_dist: None,
            public_url: None,
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

/// Values read from the process environment
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub port: Option<String>,
    pub disk_path: Option<PathBuf>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var(PORT_ENV).ok().filter(|v| !v.is_empty()),
            disk_path: std::env::var_os(DISK_PATH_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Fully resolved settings the server runs with
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub database: PathBuf,
    pub uploads_dir: PathBuf,
    pub client_dist: PathBuf,
    pub public_url: Option<Url>,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Apply precedence: CLI port > PORT env > file > default, and
    /// RENDER_DISK_PATH/uploads > file > default for the upload directory.
    pub fn resolve(self, env: &EnvOverrides, cli_port: Option<u16>) -> Result<Settings, String> {
        let env_port = match &env.port {
            Some(raw) => Some(
                raw.parse::<u16>()
                    .map_err(|_| format!("{} is not a valid port: '{}'", PORT_ENV, raw))?,
            ),
            None => None,
        };
        let port = cli_port.or(env_port).or(self.port).unwrap_or(DEFAULT_PORT);

        let uploads_dir = match &env.disk_path {
            Some(root) => root.join("uploads"),
            None => self.uploads_dir.unwrap_or_else(|| PathBuf::from("uploads")),
        };

        let public_url = match self.public_url {
            Some(raw) => Some(
                Url::parse(&raw).map_err(|e| format!("public_url '{}' is invalid: {}", raw, e))?,
            ),
            None => None,
        };

        if self.max_upload_mb == 0 {
            return Err("max_upload_mb must be greater than 0".to_string());
        }
        let max_upload_bytes = self
            .max_upload_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| format!("max_upload_mb is too large: {}", self.max_upload_mb))?;

        Ok(Settings {
            port,
            database: self.database.unwrap_or_else(|| PathBuf::from("skipp.sqlite")),
            uploads_dir,
            client_dist: self.client_dist.unwrap_or_else(|| PathBuf::from("client/dist")),
            public_url,
            max_upload_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ServerConfig::default()
            .resolve(&EnvOverrides::default(), None)
            .unwrap();
        assert_eq!(settings.port, 5050);
        assert_eq!(settings.uploads_dir, PathBuf::from("uploads"));
        assert_eq!(settings.database, PathBuf::from("skipp.sqlite"));
        assert_eq!(settings.client_dist, PathBuf::from("client/dist"));
        assert!(settings.public_url.is_none());
        assert_eq!(settings.max_upload_bytes, 25 * 1024 * 1024);
    }

    #[test]
    fn test_parse_toml() {
        let config: ServerConfig = toml::from_str(
            r#"
            port = 8080
            uploads_dir = "/data/img"
            public_url = "https://skipp.example.org"
            "#,
        )
        .unwrap();
        assert_eq!(config.port, Some(8080));
        assert_eq!(config.max_upload_mb, 25);

        let settings = config.resolve(&EnvOverrides::default(), None).unwrap();
        assert_eq!(settings.uploads_dir, PathBuf::from("/data/img"));
        assert_eq!(
            settings.public_url.unwrap().as_str(),
            "https://skipp.example.org/"
        );
    }

    #[test]
    fn test_port_precedence() {
        let config = ServerConfig {
            port: Some(7000),
            ..Default::default()
        };
        let env = EnvOverrides {
            port: Some("8000".to_string()),
            disk_path: None,
        };

        assert_eq!(config.clone().resolve(&env, Some(9000)).unwrap().port, 9000);
        assert_eq!(config.clone().resolve(&env, None).unwrap().port, 8000);
        assert_eq!(
            config.resolve(&EnvOverrides::default(), None).unwrap().port,
            7000
        );
    }

    #[test]
    fn test_disk_path_overrides_uploads_dir() {
        let config = ServerConfig {
            uploads_dir: Some(PathBuf::from("local")),
            ..Default::default()
        };
        let env = EnvOverrides {
            port: None,
            disk_path: Some(PathBuf::from("/var/data")),
        };
        let settings = config.resolve(&env, None).unwrap();
        assert_eq!(settings.uploads_dir, PathBuf::from("/var/data/uploads"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let env = EnvOverrides {
            port: Some("eighty".to_string()),
            disk_path: None,
        };
        assert!(ServerConfig::default().resolve(&env, None).is_err());

        let config = ServerConfig {
            public_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(config.resolve(&EnvOverrides::default(), None).is_err());
    }

    #[test]
    fn test_upload_limit_bounds() {
        let huge = ServerConfig {
            max_upload_mb: usize::MAX,
            ..Default::default()
        };
        let err = huge.resolve(&EnvOverrides::default(), None).unwrap_err();
        assert!(err.contains("too large"));

        let zero = ServerConfig {
            max_upload_mb: 0,
            ..Default::default()
        };
        assert!(zero.resolve(&EnvOverrides::default(), None).is_err());
    }
}
