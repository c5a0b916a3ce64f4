//! Configuration for the filestore server.
//!
//! Configuration can be loaded from multiple sources with the following precedence (highest to
//! lowest):
//!
//! 1. Environment variables (prefixed with `FS__`)
//! 2. YAML configuration file (specified via `-c` or `--config` flag)
//! 3. Defaults
//!
//! See [`Config`] for a description of all configuration fields and their defaults.
//!
//! # Environment Variables
//!
//! Environment variables use `FS__` as a prefix and double underscores (`__`) to denote nested
//! configuration structures. For example:
//!
//! - `FS__HTTP_ADDR=0.0.0.0:8888` sets the HTTP server address
//! - `FS__STORAGE__TYPE=filesystem` sets the storage type
//! - `FS__STORAGE__PATH=/data` sets the directory name
//! - `FS__AUTH__API_KEYS__CONSOLE=secret` adds a privileged API key named `console`
//!
//! # YAML Configuration File
//!
//! The above configuration in YAML format would look like this:
//!
//! ```yaml
//! http_addr: 0.0.0.0:8888
//!
//! storage:
//!   type: filesystem
//!   path: /data
//!
//! auth:
//!   api_keys:
//!     console: secret
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Yaml};
use secrecy::{CloneableSecret, SecretBox, SerializableSecret, zeroize::Zeroize};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "FS__";

/// Newtype around `String` that may protect against accidental logging of secrets in our
/// configuration struct. Use with [`secrecy::SecretBox`].
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigSecret(String);

impl ConfigSecret {
    /// Returns the secret as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ConfigSecret {
    fn from(str: &str) -> Self {
        ConfigSecret(str.to_string())
    }
}

impl std::ops::Deref for ConfigSecret {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for ConfigSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "[redacted]")
    }
}

impl CloneableSecret for ConfigSecret {}
impl SerializableSecret for ConfigSecret {}
impl Zeroize for ConfigSecret {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Payload storage configuration.
///
/// The `type` field in YAML or `__TYPE` in environment variables determines which variant is used.
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Storage {
    /// In-memory storage (type `"memory"`).
    ///
    /// All payloads are lost on shutdown. Suitable for tests only.
    Memory,

    /// Local filesystem storage (type `"filesystem"`).
    ///
    /// # Example
    ///
    /// ```yaml
    /// storage:
    ///   type: filesystem
    ///   path: /data
    /// ```
    FileSystem {
        /// Directory path for storing payloads.
        ///
        /// The directory will be created if it doesn't exist. Relative paths are resolved from
        /// the server's working directory.
        ///
        /// # Default
        ///
        /// `"data/files"`
        path: PathBuf,
    },
}

/// Runtime configuration for the Tokio async runtime.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Runtime {
    /// Number of worker threads for the server runtime.
    ///
    /// # Default
    ///
    /// Defaults to the number of CPU cores on the host machine.
    ///
    /// # Environment Variable
    ///
    /// `FS__RUNTIME__WORKER_THREADS`
    pub worker_threads: usize,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get(),
        }
    }
}

/// [Sentry](https://sentry.io/) error tracking and performance monitoring configuration.
///
/// Sentry is disabled by default and only enabled when a DSN is provided.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Sentry {
    /// Sentry DSN (Data Source Name).
    ///
    /// # Environment Variable
    ///
    /// `FS__SENTRY__DSN`
    pub dsn: Option<SecretBox<ConfigSecret>>,

    /// Environment name for this deployment, such as `production`.
    pub environment: Option<Cow<'static, str>>,

    /// Server name or identifier, such as the hostname or pod name.
    pub server_name: Option<Cow<'static, str>>,

    /// Error event sample rate between `0.0` and `1.0`.
    ///
    /// # Default
    ///
    /// `1.0`
    pub sample_rate: f32,

    /// Transaction sample rate between `0.0` and `1.0`.
    ///
    /// # Default
    ///
    /// `0.01`
    pub traces_sample_rate: f32,

    /// Enables debug output of the Sentry SDK.
    pub debug: bool,

    /// Additional tags attached to all events.
    ///
    /// # Environment Variables
    ///
    /// `FS__SENTRY__TAGS__<KEY>=<VALUE>`
    pub tags: BTreeMap<String, String>,
}

impl Sentry {
    /// Returns whether Sentry integration is enabled.
    pub fn is_enabled(&self) -> bool {
        self.dsn.is_some()
    }
}

impl Default for Sentry {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            server_name: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.01,
            debug: false,
            tags: BTreeMap::new(),
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Pretty output when logging to a terminal, simplified output otherwise.
    Auto,
    /// Multi-line output with colors.
    Pretty,
    /// Compact single-line output without colors.
    Simplified,
    /// One JSON object per line.
    Json,
}

/// Error returned when parsing an invalid [`LogFormat`].
#[derive(Clone, Debug)]
pub struct FormatParseError(String);

impl fmt::Display for FormatParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"error parsing "{}" as format: expected one of "auto", "pretty", "simplified", "json""#,
            self.0
        )
    }
}

impl std::str::FromStr for LogFormat {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let result = match s {
            "" => LogFormat::Auto,
            s if s.eq_ignore_ascii_case("auto") => LogFormat::Auto,
            s if s.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            s if s.eq_ignore_ascii_case("simplified") => LogFormat::Simplified,
            s if s.eq_ignore_ascii_case("json") => LogFormat::Json,
            s => return Err(FormatParseError(s.into())),
        };

        Ok(result)
    }
}

impl std::error::Error for FormatParseError {}

mod display_fromstr {
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
        T: std::fmt::Display,
    {
        serializer.collect_str(&value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: std::str::FromStr,
        <T as std::str::FromStr>::Err: std::fmt::Display,
    {
        use serde::Deserialize;
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Logging configuration.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    /// Minimum log level. `RUST_LOG` takes precedence if set.
    ///
    /// # Default
    ///
    /// `info`
    #[serde(with = "display_fromstr")]
    pub level: LevelFilter,

    /// Output format.
    ///
    /// # Default
    ///
    /// `auto`
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Auto,
        }
    }
}

/// The public keys verifying session tokens signed with one `kid`.
#[derive(Debug, Deserialize, Serialize)]
pub struct SessionKey {
    /// Paths to PEM-encoded EdDSA public keys.
    ///
    /// During key rotation, both the old and the new key should be listed.
    pub key_files: Vec<PathBuf>,
}

/// Credential configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Auth {
    /// Privileged API keys, by name.
    ///
    /// Requests presenting one of these in the `x-filestore-key` header act with administrative
    /// privileges: they can manage buckets and grant any role.
    ///
    /// # Environment Variables
    ///
    /// `FS__AUTH__API_KEYS__<NAME>=<SECRET>`
    pub api_keys: BTreeMap<String, SecretBox<ConfigSecret>>,

    /// Keys verifying user session tokens, by `kid`.
    ///
    /// Session tokens are EdDSA-signed JWTs passed as `Authorization: Bearer <token>`.
    pub session_keys: BTreeMap<String, SessionKey>,
}

/// Request and upload limits.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum file size in bytes for buckets that do not set their own limit. `0` disables it.
    ///
    /// # Default
    ///
    /// `30000000`
    pub max_file_size: u64,

    /// Maximum size of a request body in bytes.
    ///
    /// Buckets cannot set a `maximumFileSize` above this value.
    ///
    /// # Default
    ///
    /// `104857600` (100 MiB)
    pub max_request_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size: 30_000_000,
            max_request_size: 100 * 1024 * 1024,
        }
    }
}

/// Main configuration struct for the filestore server.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Network address the HTTP server binds to.
    ///
    /// # Default
    ///
    /// `0.0.0.0:8888`
    pub http_addr: SocketAddr,

    /// Payload storage.
    pub storage: Storage,

    /// Tokio runtime configuration.
    pub runtime: Runtime,

    /// Logging configuration.
    pub logging: Logging,

    /// Sentry configuration.
    pub sentry: Sentry,

    /// Credential configuration.
    pub auth: Auth,

    /// Request and upload limits.
    pub limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8888)),
            storage: Storage::FileSystem {
                path: PathBuf::from("data/files"),
            },
            runtime: Runtime::default(),
            logging: Logging::default(),
            sentry: Sentry::default(),
            auth: Auth::default(),
            limits: Limits::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from defaults, an optional YAML file, and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }
}
