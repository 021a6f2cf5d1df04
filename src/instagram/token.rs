use super::error::InstagramError;
use serde::{Deserialize, Deserializer};

/// A validated credential for Graph API calls on behalf of one user.
///
/// Immutable once built; a refresh produces a new value.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    access_code: String,
    user_id: String,
}

impl AccessToken {
    pub fn new(
        access_code: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Self, InstagramError> {
        let access_code = access_code.into();
        let user_id = user_id.into();
        if access_code.trim().is_empty() {
            return Err(InstagramError::InvalidToken("access code is empty"));
        }
        if user_id.trim().is_empty() {
            return Err(InstagramError::InvalidToken("user id is empty"));
        }
        Ok(Self {
            access_code,
            user_id,
        })
    }

    pub fn from_short_lived(token: &ShortLivedToken) -> Result<Self, InstagramError> {
        Self::new(token.access_token.clone(), token.user_id.clone())
    }

    pub fn access_code(&self) -> &str {
        &self.access_code
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_code", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Response of the authorization-code exchange.
#[derive(Clone, Deserialize)]
pub struct ShortLivedToken {
    pub access_token: String,
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
}

impl std::fmt::Debug for ShortLivedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShortLivedToken")
            .field("access_token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Response of the long-lived exchange and refresh endpoints.
#[derive(Clone, Deserialize)]
pub struct LongLivedToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Seconds until expiry.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl LongLivedToken {
    pub fn into_access_token(self, user_id: &str) -> Result<AccessToken, InstagramError> {
        AccessToken::new(self.access_token, user_id)
    }
}

impl std::fmt::Debug for LongLivedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LongLivedToken")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, serde::Serialize)]
pub struct UserDetails {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub username: String,
}

/// Query parameters Instagram appends to the OAuth redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_reason: Option<String>,
    pub error_description: Option<String>,
}

impl AuthCallback {
    /// Parses a raw query string (with or without a leading `?`).
    pub fn from_query(query: &str) -> Self {
        let mut callback = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "code" => callback.code = value,
                "state" => callback.state = value,
                "error" => callback.error = value,
                "error_reason" => callback.error_reason = value,
                "error_description" => callback.error_description = value,
                _ => {}
            }
        }
        callback
    }

    /// Returns the authorization code once the CSRF state has been verified.
    pub fn code_for_state(&self, expected_state: &str) -> Result<&str, InstagramError> {
        if let Some(error) = &self.error {
            let reason = self
                .error_description
                .as_deref()
                .or(self.error_reason.as_deref())
                .unwrap_or(error);
            return Err(InstagramError::AuthDenied(reason.to_string()));
        }
        if self.state.as_deref() != Some(expected_state) {
            return Err(InstagramError::StateMismatch);
        }
        match self.code.as_deref() {
            // Instagram appends `#_` to the redirect which can leak into the code
            Some(code) if !code.is_empty() => Ok(code.trim_end_matches("#_")),
            _ => Err(InstagramError::AuthDenied("no authorization code".to_string())),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_access_token_rejects_empty_fields() {
        assert!(matches!(
            AccessToken::new("", "123"),
            Err(InstagramError::InvalidToken(_))
        ));
        assert!(matches!(
            AccessToken::new("tok", "  "),
            Err(InstagramError::InvalidToken(_))
        ));
        let token = AccessToken::new("tok", "123").unwrap();
        assert_eq!(token.access_code(), "tok");
        assert_eq!(token.user_id(), "123");
    }

    #[test]
    fn test_debug_masks_access_code() {
        let token = AccessToken::new("super-secret-token", "123").unwrap();
        let debug_output = format!("{:?}", token);
        assert!(!debug_output.contains("super-secret-token"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(debug_output.contains("123"));
    }

    #[test]
    fn test_short_lived_token_numeric_user_id() {
        let token: ShortLivedToken =
            serde_json::from_value(json!({"access_token": "abc", "user_id": 17841400123u64}))
                .unwrap();
        assert_eq!(token.user_id, "17841400123");

        let access = AccessToken::from_short_lived(&token).unwrap();
        assert_eq!(access.access_code(), "abc");
    }

    #[test]
    fn test_long_lived_token_into_access_token() {
        let token: LongLivedToken = serde_json::from_value(json!({
            "access_token": "long",
            "token_type": "bearer",
            "expires_in": 5183944
        }))
        .unwrap();
        assert_eq!(token.expires_in, Some(5183944));
        let access = token.into_access_token("42").unwrap();
        assert_eq!(access.access_code(), "long");
        assert_eq!(access.user_id(), "42");
    }

    #[test]
    fn test_callback_with_matching_state() {
        let callback = AuthCallback::from_query("?code=AQB123%23_&state=csrf-1");
        assert_eq!(callback.code_for_state("csrf-1").unwrap(), "AQB123");
    }

    #[test]
    fn test_callback_state_mismatch() {
        let callback = AuthCallback::from_query("code=AQB123&state=other");
        assert!(matches!(
            callback.code_for_state("csrf-1"),
            Err(InstagramError::StateMismatch)
        ));
    }

    #[test]
    fn test_callback_user_denied() {
        let callback = AuthCallback::from_query(
            "error=access_denied&error_reason=user_denied&error_description=The+user+denied+your+request.&state=csrf-1",
        );
        match callback.code_for_state("csrf-1") {
            Err(InstagramError::AuthDenied(reason)) => {
                assert_eq!(reason, "The user denied your request.");
            }
            other => panic!("Expected AuthDenied, got {:?}", other),
        }
    }

    #[test]
    fn test_callback_missing_code() {
        let callback = AuthCallback::from_query("state=csrf-1");
        assert!(matches!(
            callback.code_for_state("csrf-1"),
            Err(InstagramError::AuthDenied(_))
        ));
    }
}
