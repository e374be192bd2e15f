use serde::{Deserialize, Serialize};

/// JWT claims carried by the signed session cookie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub session_id: String,
    pub user_id: i64,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

/// JWT claims carried by a password-reset link.
///
/// The `purpose` field keeps the two token kinds disjoint: a session token
/// deserializes without it and is rejected by reset validation, and a reset
/// token has no `session_id` to present as a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResetClaims {
    pub user_id: i64,
    pub purpose: String,
    pub exp: usize,
    pub iat: usize,
}

/// Required value of [`ResetClaims::purpose`]
pub const RESET_PURPOSE: &str = "password_reset";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_claims_serialization() {
        let claims = SessionClaims {
            session_id: "test-id".to_string(),
            user_id: 42,
            exp: 1234567890,
            iat: 1234567800,
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("test-id"));
        assert!(json.contains("42"));

        let deserialized: SessionClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, claims);
    }

    #[test]
    fn test_reset_claims_require_purpose() {
        // A session-shaped payload must not deserialize as reset claims.
        let session_json = r#"{"session_id":"s","user_id":1,"exp":2,"iat":1}"#;
        assert!(serde_json::from_str::<ResetClaims>(session_json).is_err());
    }
}
