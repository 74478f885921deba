//! Public share links for proposals.
//!
//! A share session hands a customer a bearer token that opens a read-only
//! view of one proposal. Only the SHA-256 digest of the token is persisted.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::user::EmailAddress;

/// Random bytes per token.
pub const TOKEN_BYTES: usize = 24;

/// Attempts made when a freshly generated token collides with a stored one.
pub const MAX_TOKEN_ATTEMPTS: usize = 3;

/// Plain share token as handed to the recipient.
#[derive(Clone, PartialEq, Eq)]
pub struct ShareToken(String);

impl ShareToken {
    /// Generate a token from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap a token received from a client.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex SHA-256 digest used as the lookup key.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }
}

impl std::fmt::Debug for ShareToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ShareToken(<redacted>)")
    }
}

/// Persisted share session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareSession {
    pub id: Uuid,
    pub proposal_id: Uuid,
    pub token_hash: String,
    pub recipient_email: Option<EmailAddress>,
    pub created_by: Option<crate::domain::UserId>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ShareSession {
    /// Sessions are unusable from `expires_at` onwards.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Lifetime of new share sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareTtl(Duration);

impl ShareTtl {
    pub const DEFAULT_MINUTES: i64 = 24 * 60;

    /// Non-positive values fall back to the default.
    pub fn from_minutes(minutes: i64) -> Self {
        if minutes > 0 {
            Self(Duration::minutes(minutes))
        } else {
            Self(Duration::minutes(Self::DEFAULT_MINUTES))
        }
    }

    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.0
    }
}

impl Default for ShareTtl {
    fn default() -> Self {
        Self::from_minutes(Self::DEFAULT_MINUTES)
    }
}
