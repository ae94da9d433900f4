//! Connection configuration sets and user resolution.
//!
//! A [`DbConfig`] is the per-environment connection document, in the shape
//! of a `dbconfig.json` file:
//!
//! ```json
//! {
//!   "DEV": {
//!     "connectString": "localhost:1521/DEVPDB",
//!     "users": [
//!       { "user": "hr", "password": "${HR_PASSWORD}", "default": true },
//!       { "user": "scott", "password": "tiger" }
//!     ]
//!   }
//! }
//! ```
//!
//! [`DbConfig::resolve`] picks exactly one [`ConnectionConfig`] for an
//! environment and an optional user, or fails with a [`ConfigError`].

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

static ENV_VAR: LazyLock<regex_lite::Regex> =
    LazyLock::new(|| regex_lite::Regex::new(r"\$\{([^}]+)\}").unwrap());

/// Per-environment connection configuration set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DbConfig {
    environments: IndexMap<String, EnvironmentConfig>,
}

/// Configuration of a single environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Connect descriptor shared by every user of the environment.
    #[serde(rename = "connectString", default)]
    pub connect_string: String,

    /// Users in declaration order. `None` means the document is malformed.
    #[serde(default)]
    pub users: Option<Vec<UserEntry>>,
}

/// A single user entry of an environment.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserEntry {
    /// Database user name.
    pub user: String,

    /// Password, possibly holding `${VAR}` references.
    #[serde(default)]
    pub password: String,

    /// Whether this entry is the environment's default.
    #[serde(default)]
    pub default: bool,
}

impl fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserEntry")
            .field("user", &self.user)
            .field("password", &"***")
            .field("default", &self.default)
            .finish()
    }
}

impl DbConfig {
    /// Create an empty configuration set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration set from JSON text.
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Add or replace an environment.
    pub fn with_environment(mut self, name: impl Into<String>, env: EnvironmentConfig) -> Self {
        self.environments.insert(name.into(), env);
        self
    }

    /// Environment names in declaration order.
    pub fn environments(&self) -> impl Iterator<Item = &str> {
        self.environments.keys().map(String::as_str)
    }

    /// Look up an environment by name.
    pub fn environment(&self, name: &str) -> Option<&EnvironmentConfig> {
        self.environments.get(name)
    }

    /// Configured users of an environment, uppercased and de-duplicated.
    ///
    /// Returns an empty list for unknown or malformed environments.
    pub fn users(&self, env: &str) -> Vec<String> {
        let mut users: Vec<String> = Vec::new();
        let entries = self
            .environments
            .get(env)
            .and_then(|e| e.users.as_deref())
            .unwrap_or_default();

        for entry in entries {
            let name = entry.user.to_uppercase();
            if !users.contains(&name) {
                users.push(name);
            }
        }
        users
    }

    /// Select the connection configuration for `env` and an optional user.
    ///
    /// 1. A single configured user is returned whatever user was requested.
    /// 2. Otherwise a case-insensitive match on the requested user wins when
    ///    it is unique.
    /// 3. Otherwise the unique entry flagged `default` wins.
    pub fn resolve(&self, env: &str, user: Option<&str>) -> ConfigResult<ConnectionConfig> {
        if env.is_empty() {
            return Err(ConfigError::MissingEnvironment);
        }

        let environment = self
            .environments
            .get(env)
            .ok_or_else(|| ConfigError::UnknownEnvironment(env.to_string()))?;
        let users = environment
            .users
            .as_deref()
            .ok_or_else(|| ConfigError::InvalidStructure(env.to_string()))?;

        let entry = match users {
            [] => return Err(ConfigError::NoUsers(env.to_string())),
            [only] => only,
            _ => {
                let by_user = user.and_then(|wanted| {
                    unique(users.iter().filter(|e| e.user.eq_ignore_ascii_case(wanted)))
                });
                match by_user {
                    Some(entry) => entry,
                    None => unique(users.iter().filter(|e| e.default))
                        .ok_or_else(|| ConfigError::NoDefault(env.to_string()))?,
                }
            }
        };

        Ok(ConnectionConfig {
            env: env.to_string(),
            user: entry.user.clone(),
            password: expand_env_vars(&entry.password),
            connect_string: environment.connect_string.clone(),
            is_default: entry.default,
        })
    }
}

fn unique<'a>(mut matches: impl Iterator<Item = &'a UserEntry>) -> Option<&'a UserEntry> {
    let first = matches.next()?;
    match matches.next() {
        Some(_) => None,
        None => Some(first),
    }
}

/// Replace `${VAR}` references with environment values.
///
/// Unset variables are left as written.
pub fn expand_env_vars(content: &str) -> String {
    ENV_VAR
        .replace_all(content, |caps: &regex_lite::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// A fully resolved connection configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Environment the configuration belongs to.
    pub env: String,
    /// Database user.
    pub user: String,
    /// Password with environment references expanded.
    pub password: String,
    /// Connect descriptor.
    pub connect_string: String,
    /// Whether the entry is the environment's default.
    pub is_default: bool,
}

impl ConnectionConfig {
    /// Render as `user/password@connect_string`.
    pub fn connection_string(&self) -> String {
        format!("{}/{}@{}", self.user, self.password, self.connect_string)
    }

    /// The owner objects default to when none is embedded in their path.
    pub fn effective_owner(&self) -> String {
        self.user.to_uppercase()
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("env", &self.env)
            .field("user", &self.user)
            .field("password", &"***")
            .field("connect_string", &self.connect_string)
            .field("is_default", &self.is_default)
            .finish()
    }
}
