use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;

/// Bearer credential held by a session.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// `None` for static tokens, which never expire
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthToken {
    /// A configured static token
    pub fn fixed(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Token issued by the login or refresh endpoint, with a lifetime in
    /// milliseconds as the API reports it.
    ///
    /// A lifetime past the representable date range is treated as
    /// non-expiring.
    pub fn issued(
        access_token: String,
        refresh_token: Option<String>,
        expires_in_ms: Option<i64>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: expires_in_ms.and_then(|ms| {
                Duration::try_milliseconds(ms)
                    .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            }),
        }
    }

    /// Check whether the token expires within `buffer_seconds`
    pub fn needs_refresh(&self, buffer_seconds: i64) -> bool {
        match self.expires_at {
            None => false,
            Some(expires_at) => {
                let refresh_at = Duration::try_seconds(buffer_seconds)
                    .and_then(|buffer| expires_at.checked_sub_signed(buffer))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                Utc::now() >= refresh_at
            }
        }
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Envelope returned by `/auth/login` and `/auth/refresh`
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub data: TokenData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenData {
    pub access_token: String,
    /// Lifetime in milliseconds
    #[serde(default)]
    pub expires: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_token_never_needs_refresh() {
        let token = AuthToken::fixed("static");
        assert!(!token.needs_refresh(60));
        assert!(!token.needs_refresh(i64::from(i32::MAX)));
    }

    #[test]
    fn test_issued_token_needs_refresh_within_buffer() {
        let token = AuthToken::issued("a".to_string(), Some("r".to_string()), Some(600_000));

        assert!(!token.needs_refresh(60));
        assert!(token.needs_refresh(900));
    }

    #[test]
    fn test_out_of_range_lifetime_never_expires() {
        let token = AuthToken::issued("a".to_string(), None, Some(i64::MAX));

        assert_eq!(token.expires_at, None);
        assert!(!token.needs_refresh(60));
    }

    #[test]
    fn test_debug_hides_token_values() {
        let token = AuthToken::issued("secret-access".to_string(), Some("secret-refresh".to_string()), None);
        let rendered = format!("{:?}", token);

        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
    }

    #[test]
    fn test_token_response_parses_directus_envelope() {
        let body = r#"{"data":{"access_token":"abc","expires":900000,"refresh_token":"def"}}"#;
        let parsed: TokenResponse = serde_json::from_str(body).unwrap();

        assert_eq!(parsed.data.access_token, "abc");
        assert_eq!(parsed.data.expires, Some(900_000));
        assert_eq!(parsed.data.refresh_token.as_deref(), Some("def"));
    }
}
