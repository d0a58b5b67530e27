//! Host configuration.

use gameroom_room::RoomConfig;
use gameroom_session::DirectoryConfig;
use serde::{Deserialize, Serialize};

use crate::GameroomError;

/// Everything a [`Host`](crate::Host) needs to start.
///
/// Every section has defaults, so `{}` is a valid configuration:
///
/// ```
/// use gameroom::HostConfig;
///
/// let config = HostConfig::from_json(r#"{ "room": { "chat_log_limit": 20 } }"#).unwrap();
/// assert_eq!(config.room.chat_log_limit, 20);
/// assert_eq!(config.directory.guest_prefix, "Guest");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub directory: DirectoryConfig,
    pub room: RoomConfig,
}

impl HostConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    /// [`GameroomError::Config`] if the text isn't valid JSON or a field
    /// has the wrong type.
    pub fn from_json(text: &str) -> Result<Self, GameroomError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_empty_object_is_default() {
        let config = HostConfig::from_json("{}").unwrap();
        assert_eq!(config.room.chat_log_limit, RoomConfig::default().chat_log_limit);
        assert_eq!(config.directory.guest_prefix, "Guest");
    }

    #[test]
    fn test_from_json_overrides_guest_prefix() {
        let config =
            HostConfig::from_json(r#"{ "directory": { "guest_prefix": "Visitor" } }"#).unwrap();
        assert_eq!(config.directory.guest_prefix, "Visitor");
    }

    #[test]
    fn test_from_json_wrong_type_is_config_error() {
        let result = HostConfig::from_json(r#"{ "room": { "chat_log_limit": "lots" } }"#);
        assert!(matches!(result, Err(GameroomError::Config(_))));
    }
}
