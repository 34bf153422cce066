use std::net::SocketAddr;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TicketingError};

/// Comprehensive ticketing engine configuration
///
/// This is the main configuration structure that encompasses all aspects of
/// ticketing operation, from the pinned service clock to queue defaults and
/// the REST surface.
///
/// # Configuration Sections
///
/// - [`general`](TicketingConfig::general): service clock and storage location
/// - [`queue`](TicketingConfig::queue): queue behavior defaults and event history depth
/// - [`api`](TicketingConfig::api): REST listener settings
///
/// # Examples
///
/// ## Default Configuration
///
/// ```
/// use queuehub_ticket_engine::prelude::TicketingConfig;
///
/// let config = TicketingConfig::default();
/// assert_eq!(config.general.timezone_offset_minutes, 0);
/// assert_eq!(config.queue.default_priority, 1);
/// assert_eq!(config.queue.default_service_minutes, 15);
/// ```
///
/// ## Custom Configuration
///
/// ```
/// use queuehub_ticket_engine::prelude::TicketingConfig;
///
/// let mut config = TicketingConfig::default();
///
/// // Pin the service clock to UTC+3
/// config.general.timezone_offset_minutes = 180;
///
/// // Persist to a database file
/// config.general.database_path = Some("queuehub.db".to_string());
///
/// // Validate configuration
/// config.validate().expect("Configuration should be valid");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketingConfig {
    /// General settings: service clock and storage location
    #[serde(default)]
    pub general: GeneralConfig,

    /// Queue behavior defaults
    #[serde(default)]
    pub queue: QueueBehaviorConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

/// General engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Fixed UTC offset of the service clock, in minutes
    ///
    /// Daily ticket counters and day-scoped queries partition on the
    /// calendar day under this offset, so all branches of a deployment
    /// roll over at the same wall-clock midnight. Default 0 (UTC).
    pub timezone_offset_minutes: i32,

    /// Database file path
    ///
    /// `None` selects the in-memory store. Relative paths resolve against
    /// the process working directory.
    pub database_path: Option<String>,
}

/// Queue behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueBehaviorConfig {
    /// Priority assigned to tickets created without an explicit priority
    ///
    /// Must be at least 1; higher values are serviced first.
    pub default_priority: i32,

    /// Fallback per-ticket service duration in minutes
    ///
    /// Used for wait estimates when a service has no `estimated_duration`
    /// of its own.
    pub default_service_minutes: i64,

    /// Number of recent ticket events retained for late subscribers
    pub event_history_limit: usize,
}

/// REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Whether the server starts the REST listener
    pub enabled: bool,

    /// Address the REST listener binds to
    pub bind_addr: SocketAddr,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            timezone_offset_minutes: 0,
            database_path: None,
        }
    }
}

impl Default for QueueBehaviorConfig {
    fn default() -> Self {
        Self {
            default_priority: 1,
            default_service_minutes: 15,
            event_history_limit: 1000,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: "127.0.0.1:8080".parse().expect("valid default bind addr"),
        }
    }
}

impl Default for TicketingConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            queue: QueueBehaviorConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl TicketingConfig {
    /// Validate the configuration
    ///
    /// # Examples
    ///
    /// ```
    /// use queuehub_ticket_engine::prelude::TicketingConfig;
    ///
    /// let mut config = TicketingConfig::default();
    /// config.queue.default_priority = 0;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        // A day is 1440 minutes; anything beyond that is a typo
        if self.general.timezone_offset_minutes.abs() > 1440 {
            return Err(TicketingError::configuration(format!(
                "timezone_offset_minutes out of range: {}",
                self.general.timezone_offset_minutes
            )));
        }

        if let Some(path) = &self.general.database_path {
            if path.is_empty() {
                return Err(TicketingError::configuration(
                    "database_path cannot be empty".to_string(),
                ));
            }
        }

        if self.queue.default_priority < 1 {
            return Err(TicketingError::configuration(
                "default_priority must be at least 1".to_string(),
            ));
        }

        if self.queue.default_service_minutes < 1 {
            return Err(TicketingError::configuration(
                "default_service_minutes must be at least 1".to_string(),
            ));
        }

        if self.queue.event_history_limit == 0 {
            return Err(TicketingError::configuration(
                "event_history_limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TicketingError::configuration(format!("Failed to export config: {}", e)))
    }

    /// Parse from JSON; missing sections fall back to defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| TicketingError::configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(TicketingConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = TicketingConfig::default();
        config.queue.default_service_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = TicketingConfig::default();
        config.general.timezone_offset_minutes = 2000;
        assert!(config.validate().is_err());

        let mut config = TicketingConfig::default();
        config.general.database_path = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_round_trip_with_partial_input() {
        let config = TicketingConfig::default();
        let json = config.to_json().unwrap();
        let parsed = TicketingConfig::from_json(&json).unwrap();
        assert_eq!(
            parsed.queue.default_service_minutes,
            config.queue.default_service_minutes
        );

        // Missing sections fall back to defaults
        let partial = TicketingConfig::from_json(r#"{"general":{"timezone_offset_minutes":60}}"#)
            .unwrap();
        assert_eq!(partial.general.timezone_offset_minutes, 60);
        assert_eq!(partial.queue.default_priority, 1);
    }
}
