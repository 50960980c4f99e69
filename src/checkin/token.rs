use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::clock;

type HmacSha256 = Hmac<Sha256>;

/// Derives the HMAC key for a member's rotating token.
///
/// Kept behind a trait so the keying strategy can be swapped without
/// touching the generate/validate contracts.
pub trait Keying: Send + Sync {
    fn key_material(&self, member_id: &str) -> Vec<u8>;
}

/// Reference keying: the member's own identifier is the sole key input.
/// The resulting token is a deterministic fingerprint of (member, step),
/// not a secret-backed credential.
pub struct MemberFingerprint;

impl Keying for MemberFingerprint {
    fn key_material(&self, member_id: &str) -> Vec<u8> {
        member_id.as_bytes().to_vec()
    }
}

/// Keying that mixes a per-deployment secret into the member key, for
/// installations that want unforgeable tokens.
pub struct DeploymentSecret {
    secret: Vec<u8>,
}

impl DeploymentSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl Keying for DeploymentSecret {
    fn key_material(&self, member_id: &str) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(member_id.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Generates and validates rotating check-in tokens.
///
/// A token is the lowercase hex digest of HMAC-SHA256 keyed per member,
/// over the decimal string of a time step. Tokens are never stored; they
/// are recomputed on demand for comparison.
pub struct TokenService {
    keying: Box<dyn Keying>,
    step_size_seconds: u64,
    tolerance_steps: i64,
}

impl TokenService {
    pub fn new(step_size_seconds: u64, tolerance_steps: i64) -> Self {
        Self::with_keying(Box::new(MemberFingerprint), step_size_seconds, tolerance_steps)
    }

    pub fn with_keying(
        keying: Box<dyn Keying>,
        step_size_seconds: u64,
        tolerance_steps: i64,
    ) -> Self {
        Self {
            keying,
            step_size_seconds,
            tolerance_steps,
        }
    }

    /// Deterministic token for (member, step). Same inputs always yield the
    /// same output; any well-formed string is accepted as a member id.
    pub fn generate(&self, member_id: &str, step: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.keying.key_material(member_id))
            .expect("HMAC accepts keys of any length");
        mac.update(step.to_string().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Checks a submitted token against every step within the tolerance
    /// window around `now`. A linear scan over 2·tolerance+1 candidates;
    /// tolerance is small by configuration.
    ///
    /// A `false` result is a negative validation, not an error.
    pub fn validate_at(&self, member_id: &str, submitted: &str, now: DateTime<Utc>) -> bool {
        let current = clock::step_at(now, self.step_size_seconds);
        (current - self.tolerance_steps..=current + self.tolerance_steps)
            .any(|step| self.generate(member_id, step) == submitted)
    }

    /// Validates against the wall clock.
    pub fn validate(&self, member_id: &str, submitted: &str) -> bool {
        self.validate_at(member_id, submitted, Utc::now())
    }

    /// The token a member's device should be displaying at `now`.
    pub fn token_at(&self, member_id: &str, now: DateTime<Utc>) -> String {
        self.generate(member_id, clock::step_at(now, self.step_size_seconds))
    }
}
