//! Server configuration
//!
//! Loaded from an optional TOML file with `PASVD_*` environment overrides,
//! then overridden again by command line flags.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default control port.
pub const DEFAULT_CONTROL_PORT: u16 = 1235;

/// Chunk size for file transfers.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address for the control listener
    pub bind_address: String,

    /// Port for the control listener
    pub control_port: u16,

    /// Initial working directory of every session
    pub home_dir: PathBuf,

    /// Address passive listeners bind to and advertise. IPv4 only.
    pub pasv_address: Ipv4Addr,

    /// Buffer size for file transfers
    pub buffer_size: usize,

    /// Control channel inactivity before the session is closed
    pub idle_timeout_secs: u64,

    /// How long a transfer waits for the client to connect to the passive listener
    pub data_accept_timeout_secs: u64,

    /// Data channel inactivity that ends an upload
    pub data_idle_timeout_secs: u64,

    /// Lets PASV and RETR run before login
    pub allow_anonymous_reads: bool,
}

/// Values supplied on the command line, applied over file and environment.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub control_port: Option<u16>,
    pub home_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            control_port: DEFAULT_CONTROL_PORT,
            home_dir: default_home_dir(),
            pasv_address: Ipv4Addr::LOCALHOST,
            buffer_size: DEFAULT_BUFFER_SIZE,
            idle_timeout_secs: 300,
            data_accept_timeout_secs: 30,
            data_idle_timeout_secs: 30,
            allow_anonymous_reads: false,
        }
    }
}

/// `$HOME`, or the process working directory when unset.
fn default_home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("/"))
}

impl ServerConfig {
    /// Load configuration from `path` (optional) with environment and CLI overrides.
    pub fn load(path: &str, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();

        let mut builder = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("control_port", defaults.control_port as i64)?
            .set_default("home_dir", defaults.home_dir.to_string_lossy().into_owned())?
            .set_default("pasv_address", defaults.pasv_address.to_string())?
            .set_default("buffer_size", defaults.buffer_size as i64)?
            .set_default("idle_timeout_secs", defaults.idle_timeout_secs as i64)?
            .set_default(
                "data_accept_timeout_secs",
                defaults.data_accept_timeout_secs as i64,
            )?
            .set_default(
                "data_idle_timeout_secs",
                defaults.data_idle_timeout_secs as i64,
            )?
            .set_default("allow_anonymous_reads", defaults.allow_anonymous_reads)?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("PASVD").try_parsing(true));

        if let Some(port) = overrides.control_port {
            builder = builder.set_override("control_port", port as i64)?;
        }
        if let Some(home) = &overrides.home_dir {
            builder = builder.set_override("home_dir", home.to_string_lossy().into_owned())?;
        }

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()
    }

    /// Builds a configuration rooted at `home` with every other value defaulted.
    pub fn with_home(home: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        ServerConfig {
            home_dir: home.into(),
            ..ServerConfig::default()
        }
        .validate()
    }

    /// Validates the configuration and canonicalises the home directory.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::Message(
                "buffer_size must be greater than 0".into(),
            ));
        }

        if self.idle_timeout_secs == 0
            || self.data_accept_timeout_secs == 0
            || self.data_idle_timeout_secs == 0
        {
            return Err(ConfigError::Message("timeouts must be greater than 0".into()));
        }

        self.home_dir = canonical_home(&self.home_dir)?;
        Ok(self)
    }

    /// Get bind address and control port as socket address
    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.control_port)
    }

    pub fn pasv_ip(&self) -> Ipv4Addr {
        self.pasv_address
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn data_accept_timeout(&self) -> Duration {
        Duration::from_secs(self.data_accept_timeout_secs)
    }

    pub fn data_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.data_idle_timeout_secs)
    }
}

fn canonical_home(path: &Path) -> Result<PathBuf, ConfigError> {
    let canonical = path.canonicalize().map_err(|e| {
        ConfigError::Message(format!("home_dir {} is not accessible: {}", path.display(), e))
    })?;
    if !canonical.is_dir() {
        return Err(ConfigError::Message(format!(
            "home_dir {} is not a directory",
            canonical.display()
        )));
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn with_home_canonicalises_directory() {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig::with_home(dir.path()).unwrap();
        assert!(config.home_dir.is_absolute());
        assert_eq!(config.home_dir, dir.path().canonicalize().unwrap());
        assert_eq!(config.pasv_ip(), Ipv4Addr::LOCALHOST);
    }

    #[test]
    fn rejects_missing_home_and_bad_values() {
        let dir = TempDir::new().unwrap();
        assert!(ServerConfig::with_home(dir.path().join("missing")).is_err());

        let file = dir.path().join("file");
        std::fs::write(&file, b"").unwrap();
        assert!(ServerConfig::with_home(&file).is_err());

        let zero_buffer = ServerConfig {
            home_dir: dir.path().to_path_buf(),
            buffer_size: 0,
            ..ServerConfig::default()
        };
        assert!(zero_buffer.validate().is_err());
    }

    #[test]
    fn loads_file_and_applies_overrides() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("pasvd.toml");
        std::fs::write(
            &config_path,
            "buffer_size = 4096\ndata_idle_timeout_secs = 5\nallow_anonymous_reads = true\n",
        )
        .unwrap();

        let overrides = ConfigOverrides {
            control_port: Some(2121),
            home_dir: Some(dir.path().to_path_buf()),
        };
        let config = ServerConfig::load(config_path.to_str().unwrap(), &overrides).unwrap();

        assert_eq!(config.buffer_size, 4096);
        assert_eq!(config.data_idle_timeout(), Duration::from_secs(5));
        assert!(config.allow_anonymous_reads);
        assert_eq!(config.control_port, 2121);
        assert_eq!(config.home_dir, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn pasv_address_is_parsed_at_load() {
        let dir = TempDir::new().unwrap();
        let overrides = ConfigOverrides {
            control_port: None,
            home_dir: Some(dir.path().to_path_buf()),
        };

        let good = dir.path().join("good.toml");
        std::fs::write(&good, "pasv_address = \"10.0.0.7\"\n").unwrap();
        let config = ServerConfig::load(good.to_str().unwrap(), &overrides).unwrap();
        assert_eq!(config.pasv_ip(), Ipv4Addr::new(10, 0, 0, 7));

        for bad in ["pasv_address = \"::1\"\n", "pasv_address = \"example.org\"\n"] {
            let path = dir.path().join("bad.toml");
            std::fs::write(&path, bad).unwrap();
            assert!(ServerConfig::load(path.to_str().unwrap(), &overrides).is_err());
        }
    }
}
