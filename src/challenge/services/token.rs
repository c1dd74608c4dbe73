//! Signed, time-boxed invitation tokens.
//!
//! Tokens bind a `(user, challenge)` pair and expire 24 hours after
//! issuance. They carry no mutable state: the one-time-use guarantee lives
//! in the invitation row's pending → accepted transition, so a replayed but
//! still-valid token fails at the invitation status check, not here.

use crate::challenge::domain::{ChallengeId, UserId};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Seconds an invitation token stays valid after issuance.
const TOKEN_VALIDITY_SECS: i64 = 24 * 60 * 60;

/// Claims carried by an invitation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationClaims {
    /// Invited user.
    pub user_id: Uuid,
    /// Challenge the invitation is for.
    pub challenge_id: Uuid,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

impl InvitationClaims {
    /// Returns the invited user's identifier.
    #[must_use]
    pub const fn user(&self) -> UserId {
        UserId::from_uuid(self.user_id)
    }

    /// Returns the challenge identifier.
    #[must_use]
    pub const fn challenge(&self) -> ChallengeId {
        ChallengeId::from_uuid(self.challenge_id)
    }
}

/// Errors returned while issuing or verifying invitation tokens.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvitationTokenError {
    /// The token's validity window has passed.
    #[error("invitation token has expired")]
    Expired,

    /// The token is malformed or its signature does not verify.
    #[error("invitation token is malformed or has a bad signature")]
    Malformed,

    /// The token was issued to a different user than the caller.
    #[error("invitation token was issued to a different user")]
    WrongRecipient,

    /// Token encoding failed.
    #[error("invitation token could not be issued: {0}")]
    Issuance(String),
}

/// Issues and verifies HS256-signed invitation tokens.
pub struct InvitationTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl InvitationTokenService {
    /// Creates a token service from a shared signing secret.
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issues a token for the given user and challenge, valid for 24 hours
    /// from the clock's current instant.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationTokenError::Issuance`] when encoding fails.
    pub fn issue(
        &self,
        user: UserId,
        challenge: ChallengeId,
        clock: &impl Clock,
    ) -> Result<String, InvitationTokenError> {
        let claims = InvitationClaims {
            user_id: user.into_inner(),
            challenge_id: challenge.into_inner(),
            exp: clock.utc().timestamp() + TOKEN_VALIDITY_SECS,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| InvitationTokenError::Issuance(err.to_string()))
    }

    /// Verifies a token's signature and expiry and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationTokenError::Expired`] for a stale token and
    /// [`InvitationTokenError::Malformed`] for anything else that fails
    /// verification.
    pub fn verify(&self, token: &str) -> Result<InvitationClaims, InvitationTokenError> {
        decode::<InvitationClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => InvitationTokenError::Expired,
                _ => InvitationTokenError::Malformed,
            })
    }
}
