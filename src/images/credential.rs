//! Short-lived bearer credential
//!
//! Owned by the client that uses it; there is no process-wide token cache.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};

/// OAuth client-credentials pair
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Bearer token with its expiry
#[derive(Clone)]
pub struct AccessToken {
    secret: SecretString,
    expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            secret: SecretString::from(secret.into()),
            expires_at,
        }
    }

    /// Token issued at `issued_at` and valid for `expires_in_secs`
    pub fn issued(secret: impl Into<String>, issued_at: DateTime<Utc>, expires_in_secs: i64) -> Self {
        Self::new(secret, issued_at + Duration::seconds(expires_in_secs))
    }

    /// Usable at `now` with at least `margin_secs` to spare
    pub fn is_fresh(&self, now: DateTime<Utc>, margin_secs: i64) -> bool {
        now + Duration::seconds(margin_secs) < self.expires_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_refreshes_inside_margin() {
        let issued = Utc::now();
        let token = AccessToken::issued("abc", issued, 3600);

        assert!(token.is_fresh(issued, 60));
        assert!(token.is_fresh(issued + Duration::seconds(3500), 60));
        assert!(!token.is_fresh(issued + Duration::seconds(3541), 60));
        assert!(!token.is_fresh(issued + Duration::seconds(4000), 0));
    }

    #[test]
    fn test_debug_hides_secret() {
        let token = AccessToken::issued("very-secret", Utc::now(), 10);
        assert!(!format!("{:?}", token).contains("very-secret"));
        assert_eq!(token.expose(), "very-secret");
    }
}
