//! OAuth access token with expiry tracking.

use chrono::{DateTime, Duration, Utc};

/// Safety margin subtracted from the provider's stated expiry, so a token
/// that is about to lapse is never used for a request.
const EXPIRY_MARGIN_MS: i64 = 1000;

/// An OAuth2 access token and the instant it stops being usable.
///
/// The stored header value keeps the token type prefix (e.g. `bearer ey...`)
/// so it can be placed directly into an `Authorization` header. Tokens are
/// never mutated; a stale token is replaced wholesale by a fresh exchange.
#[derive(Debug, Clone)]
pub struct OAuthToken {
    header_value: String,
    valid_until: DateTime<Utc>,
}

impl OAuthToken {
    /// Issue a token valid for `expires_in_millis` from `now`, minus the
    /// one-second margin.
    pub fn issue(
        token_type: &str,
        access_token: &str,
        expires_in_millis: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            header_value: format!("{} {}", token_type, access_token),
            valid_until: now + Duration::milliseconds(expires_in_millis - EXPIRY_MARGIN_MS),
        }
    }

    /// Whether the token is still usable at `now`. Strict comparison: a
    /// token is already invalid at the exact expiry instant.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.valid_until
    }

    /// Value for the `Authorization` header, token type included.
    pub fn header_value(&self) -> &str {
        &self.header_value
    }

    pub fn valid_until(&self) -> DateTime<Utc> {
        self.valid_until
    }
}
