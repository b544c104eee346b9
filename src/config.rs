//! Endpoint and runtime configuration.
//!
//! Defaults point at the production gateway. A `config.json` next to the
//! executable (or a file named on the command line) can override any field;
//! fields left out keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::error::PortalError;

/// Default SSO (CAS) host.
pub const DEFAULT_SSO_BASE: &str = "https://cas-443.wvpn.hrbeu.edu.cn";
/// Default academic portal host.
pub const DEFAULT_PORTAL_BASE: &str = "https://jwgl-443.wvpn.hrbeu.edu.cn";
/// Default bare gateway host.
pub const DEFAULT_GATEWAY_BASE: &str = "https://wvpn.hrbeu.edu.cn";

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default total request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Default maximum number of GETs in one redirect walk.
pub const DEFAULT_MAX_REDIRECT_HOPS: usize = 50;

/// File name looked up next to the executable.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Errors for loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid JSON for [`PortalConfig`].
    #[error("invalid config file {path}: {source}")]
    Json {
        /// Path that was read.
        path: PathBuf,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// A value is outside its accepted range.
    #[error("invalid config value for `{field}`: {value}. Expected range: {range}")]
    OutOfRange {
        /// Field name as written in the file.
        field: &'static str,
        /// Offending value.
        value: u64,
        /// Accepted range, for the message.
        range: &'static str,
    },
}

/// Base URLs of the three hosts the login flow crosses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalEndpoints {
    /// CAS host serving the captcha API and the login form.
    pub sso_base: String,
    /// Academic portal host.
    pub portal_base: String,
    /// Bare gateway host that also scopes some session cookies.
    pub gateway_base: String,
}

impl Default for PortalEndpoints {
    fn default() -> Self {
        Self {
            sso_base: DEFAULT_SSO_BASE.to_string(),
            portal_base: DEFAULT_PORTAL_BASE.to_string(),
            gateway_base: DEFAULT_GATEWAY_BASE.to_string(),
        }
    }
}

impl PortalEndpoints {
    /// Points all three hosts at a single base URL (used by integration tests).
    #[must_use]
    pub fn single_host(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            sso_base: base.clone(),
            portal_base: base.clone(),
            gateway_base: base,
        }
    }

    /// Builds an absolute URL on the SSO host.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::InvalidUrl`] if the base cannot be parsed.
    pub fn sso_url(&self, path: &str) -> Result<Url, PortalError> {
        join_base(&self.sso_base, path)
    }

    /// Builds an absolute URL on the portal host.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::InvalidUrl`] if the base cannot be parsed.
    pub fn portal_url(&self, path: &str) -> Result<Url, PortalError> {
        join_base(&self.portal_base, path)
    }

    /// The three origins swept for cookies at the end of a redirect walk.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::InvalidUrl`] if any base cannot be parsed.
    pub fn sweep_origins(&self) -> Result<[Url; 3], PortalError> {
        Ok([
            parse_base(&self.sso_base)?,
            parse_base(&self.portal_base)?,
            parse_base(&self.gateway_base)?,
        ])
    }

    /// Host name of the portal, as used in the SSO entry `reason` parameter.
    #[must_use]
    pub fn portal_host(&self) -> String {
        Url::parse(&self.portal_base)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| self.portal_base.clone())
    }
}

fn parse_base(base: &str) -> Result<Url, PortalError> {
    Url::parse(base).map_err(|e| PortalError::invalid_url(base, &e))
}

fn join_base(base: &str, path: &str) -> Result<Url, PortalError> {
    let joined = format!("{}{}", base.trim_end_matches('/'), path);
    Url::parse(&joined).map_err(|e| PortalError::invalid_url(joined.clone(), &e))
}

/// Full runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Hosts the flow talks to.
    pub endpoints: PortalEndpoints,
    /// Connect timeout per request, in seconds.
    pub connect_timeout_secs: u64,
    /// Total timeout per request, in seconds.
    pub request_timeout_secs: u64,
    /// Maximum GETs in one redirect walk before failing with a loop error.
    pub max_redirect_hops: usize,
    /// Where grade reports are written. Defaults to `grade_data.json` next to the executable.
    pub output_file: Option<PathBuf>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            endpoints: PortalEndpoints::default(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_redirect_hops: DEFAULT_MAX_REDIRECT_HOPS,
            output_file: None,
        }
    }
}

impl PortalConfig {
    /// Config with every host pointed at `base`.
    #[must_use]
    pub fn for_single_host(base: impl Into<String>) -> Self {
        Self {
            endpoints: PortalEndpoints::single_host(base),
            ..Self::default()
        }
    }

    /// Validates numeric fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for the first field outside its range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("request_timeout_secs", self.request_timeout_secs)?;
        if !(1..=1000).contains(&self.max_redirect_hops) {
            return Err(ConfigError::OutOfRange {
                field: "max_redirect_hops",
                value: self.max_redirect_hops as u64,
                range: "1..=1000",
            });
        }
        Ok(())
    }

    /// Reads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, decoded, or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Loads `path` when given, otherwise `config.json` next to the executable
    /// if it exists, otherwise defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an existing or explicitly named file is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Resolved path for grade reports.
    #[must_use]
    pub fn grade_output_path(&self) -> PathBuf {
        self.output_file
            .clone()
            .unwrap_or_else(crate::grades::default_grade_path)
    }
}

fn validate_timeout_secs(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if !(1..=3600).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            range: "1..=3600",
        });
    }
    Ok(())
}

/// Directory containing the running executable, falling back to `.`.
#[must_use]
pub fn program_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `config.json` next to the executable, if the executable path is known.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = PortalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_redirect_hops, 50);
        assert_eq!(config.endpoints.sso_base, DEFAULT_SSO_BASE);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"endpoints": {"portal_base": "http://127.0.0.1:9000"}, "max_redirect_hops": 5}"#,
        )
        .unwrap();

        let config = PortalConfig::from_file(&path).unwrap();
        assert_eq!(config.endpoints.portal_base, "http://127.0.0.1:9000");
        assert_eq!(config.endpoints.sso_base, DEFAULT_SSO_BASE);
        assert_eq!(config.max_redirect_hops, 5);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_out_of_range_timeout_rejected() {
        let config = PortalConfig {
            request_timeout_secs: 0,
            ..PortalConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));
    }

    #[test]
    fn test_zero_hop_cap_rejected() {
        let config = PortalConfig {
            max_redirect_hops: 0,
            ..PortalConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "max_redirect_hops",
                ..
            })
        ));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = PortalConfig::load(Some(&dir.path().join("absent.json")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(matches!(
            PortalConfig::from_file(&path),
            Err(ConfigError::Json { .. })
        ));
    }

    #[test]
    fn test_endpoint_urls_join_paths() {
        let endpoints = PortalEndpoints::single_host("http://127.0.0.1:8080/");
        let url = endpoints.sso_url("/cas/login").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/cas/login");
        assert_eq!(endpoints.portal_host(), "127.0.0.1");
        assert_eq!(endpoints.sweep_origins().unwrap().len(), 3);
    }

    #[test]
    fn test_invalid_base_reports_invalid_url() {
        let endpoints = PortalEndpoints::single_host("not a url");
        assert!(matches!(
            endpoints.portal_url("/x"),
            Err(PortalError::InvalidUrl { .. })
        ));
    }
}
