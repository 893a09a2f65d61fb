//! Request DTOs.

use serde::Deserialize;

use kindred_core::error::AppError;
use kindred_core::types::UserId;

/// Query parameters on the WebSocket upgrade.
#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    /// Optional access token authenticating the socket right after upgrade.
    pub token: Option<String>,
}

/// Query parameters for a bulk presence lookup.
#[derive(Debug, Deserialize)]
pub struct PresenceQuery {
    /// Comma-separated user IDs.
    pub user_ids: String,
}

impl PresenceQuery {
    /// Parse the comma-separated list, skipping empty segments.
    pub fn parse_user_ids(&self) -> Result<Vec<UserId>, AppError> {
        self.user_ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<UserId>()
                    .map_err(|_| AppError::validation(format!("Invalid user id: {s}")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_ids_skips_blanks() {
        let a = UserId::new();
        let b = UserId::new();
        let query = PresenceQuery {
            user_ids: format!("{a}, ,{b},"),
        };
        assert_eq!(query.parse_user_ids().unwrap(), vec![a, b]);
    }

    #[test]
    fn test_parse_user_ids_rejects_garbage() {
        let query = PresenceQuery {
            user_ids: "not-a-uuid".to_string(),
        };
        let err = query.parse_user_ids().unwrap_err();
        assert_eq!(err.kind, kindred_core::error::ErrorKind::Validation);
    }
}
