//! Configuration types for the countries web service.

use crate::country::Country;
use crate::error::ServiceError;
use crate::repository::CountryRepository;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Namespace of the countries messages.
pub const COUNTRIES_NS: &str = "http://raidencentral.com/countries";

/// Main configuration for the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Config version
    pub version: String,

    /// HTTP listener settings
    pub server: ServerConfig,

    /// Message namespace settings
    pub service: EndpointConfig,

    /// Request limits
    pub settings: SettingsConfig,

    /// Country data set; empty means the built-in data set
    pub countries: Vec<Country>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            server: ServerConfig::default(),
            service: EndpointConfig::default(),
            settings: SettingsConfig::default(),
            countries: Vec::new(),
        }
    }
}

impl ServiceConfig {
    /// Read a YAML config file.
    pub fn from_file(path: &Path) -> Result<Self, ServiceError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ServiceError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), ServiceError> {
        self.server.socket_addr()?;

        if !self.server.path.starts_with('/') || self.server.path.len() < 2 {
            return Err(ServiceError::Config(format!(
                "server.path must be a non-root absolute path, got {:?}",
                self.server.path
            )));
        }
        if self.server.path.ends_with('/') {
            return Err(ServiceError::Config(format!(
                "server.path must not end with '/', got {:?}",
                self.server.path
            )));
        }
        if self.service.namespace.is_empty() {
            return Err(ServiceError::Config(
                "service.namespace must not be empty".to_string(),
            ));
        }
        if self.settings.allowed_content_types.is_empty() {
            return Err(ServiceError::Config(
                "settings.allowed_content_types must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Build the repository for the configured data set.
    pub fn repository(&self) -> Result<CountryRepository, ServiceError> {
        if self.countries.is_empty() {
            Ok(CountryRepository::builtin())
        } else {
            CountryRepository::from_records(self.countries.iter().cloned())
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub bind_address: String,

    /// Mount path of the SOAP endpoint
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            path: "/ws".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ServiceError> {
        self.bind_address
            .parse()
            .map_err(|_| ServiceError::InvalidBindAddress(self.bind_address.clone()))
    }
}

/// Message namespace settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Namespace of request and response payloads
    pub namespace: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            namespace: COUNTRIES_NS.to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Maximum body size to process (bytes)
    pub max_body_size: usize,

    /// Maximum nesting depth in SOAP Body
    pub max_body_depth: u32,

    /// Allowed Content-Type headers for SOAP requests
    pub allowed_content_types: Vec<String>,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1_048_576, // 1MB
            max_body_depth: 20,
            allowed_content_types: vec![
                "text/xml".to_string(),
                "application/soap+xml".to_string(),
                "application/xml".to_string(),
            ],
        }
    }
}
