//! JWT service for token issuance and verification
//!
//! Tokens are HS256-signed with a symmetric secret injected through
//! [`JwtConfig`]. They live for a fixed 24 hours and there is no server-side
//! revocation: a token is valid iff its signature checks out and `now` has
//! not passed its `exp`.
//!
//! Both directions take the current time as an argument so the same clock
//! reading is used for the whole verification.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{error::AuthError, models::Role, principal::Principal};

/// Scheme expected in the `Authorization` header.
pub const AUTH_SCHEME: &str = "Bearer";

/// The one signing algorithm issued and accepted.
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Fixed token lifetime.
pub fn token_ttl() -> Duration {
    Duration::hours(24)
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Symmetric signing secret
    pub secret: String,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: HMAC signing secret (required, non-empty)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        if secret.len() < 32 {
            warn!("JWT_SECRET is shorter than 32 bytes; use a longer secret in production");
        }

        Ok(Self { secret })
    }
}

/// JWT claims as they travel on the wire.
///
/// Everything in here is adversary-controlled until [`Claims::into_principal`]
/// has validated it.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Role ordinals
    pub roles: Vec<i64>,
    /// Issued at (Unix seconds); informational only
    #[serde(default)]
    pub iat: i64,
    /// Expiration time (Unix seconds)
    pub exp: i64,
}

impl Claims {
    fn for_principal(principal: &Principal, now: DateTime<Utc>) -> Self {
        let issued_at = now.timestamp();
        Self {
            sub: principal.id().to_string(),
            roles: principal
                .roles()
                .iter()
                .map(|role| i64::from(role.ordinal()))
                .collect(),
            iat: issued_at,
            exp: issued_at + token_ttl().num_seconds(),
        }
    }

    /// Materialize a principal; any unusable field rejects the whole token.
    fn into_principal(self) -> Result<Principal, AuthError> {
        let id = Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)?;
        let roles = self
            .roles
            .into_iter()
            .map(Role::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| AuthError::InvalidToken)?;

        Principal::new(id, roles).ok_or(AuthError::InvalidToken)
    }
}

/// Pull the raw token out of an `Authorization` header value.
///
/// The value must be exactly `<scheme> <token>` with a non-empty token.
pub fn extract_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingToken)?;
    let token = value
        .strip_prefix(AUTH_SCHEME)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or(AuthError::MissingToken)?;

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.as_bytes();

        // Only HS256 is listed, so tokens claiming any other `alg` (including
        // `none`) fail before the signature is looked at. Expiry is checked
        // by `verify_token` against the caller's clock instead.
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token for `principal`, valid for 24 hours from `now`.
    pub fn issue(&self, principal: &Principal, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims::for_principal(principal, now);
        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verify a raw token string.
    pub fn verify_token(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                AuthError::InvalidToken
            })?
            .claims;

        if now.timestamp() > claims.exp {
            return Err(AuthError::ExpiredToken);
        }

        claims.into_principal()
    }

    /// Verify the value of an `Authorization` header.
    pub fn verify_header(
        &self,
        header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Principal, AuthError> {
        let token = extract_token(header)?;
        self.verify_token(token, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use serde_json::json;

    const SECRET: &str = "unit-test-secret-that-is-long-enough";

    fn service() -> JwtService {
        JwtService::new(&JwtConfig::new(SECRET))
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    fn principal(roles: Vec<Role>) -> Principal {
        Principal::new(Uuid::new_v4(), roles).unwrap()
    }

    fn b64(value: &serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(value.to_string())
    }

    /// Sign an arbitrary payload with the test secret.
    fn signed(payload: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn issue_then_verify_round_trips() {
        let p = principal(vec![Role::Member, Role::Guest]);
        let token = service().issue(&p, at(1_000)).unwrap();

        assert_eq!(service().verify_token(&token, at(1_000)), Ok(p));
    }

    #[test]
    fn admin_scenario_valid_for_an_hour_expired_after_a_day() {
        let p = principal(vec![Role::Admin]);
        let token = service().issue(&p, at(0)).unwrap();

        let verified = service().verify_token(&token, at(3_600)).unwrap();
        assert_eq!(verified.roles(), &[Role::Admin]);

        assert_eq!(
            service().verify_token(&token, at(90_000)),
            Err(AuthError::ExpiredToken)
        );
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let p = principal(vec![Role::Guest]);
        let issued = at(50_000);
        let token = service().issue(&p, issued).unwrap();
        let expiry = issued + token_ttl();

        assert!(service().verify_token(&token, expiry).is_ok());
        assert!(service().verify_token(&token, expiry - Duration::seconds(1)).is_ok());
        assert_eq!(
            service().verify_token(&token, expiry + Duration::seconds(1)),
            Err(AuthError::ExpiredToken)
        );
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = service().issue(&principal(vec![Role::Guest]), at(0)).unwrap();
        let other = JwtService::new(&JwtConfig::new("a-completely-different-secret"));

        assert_eq!(other.verify_token(&token, at(0)), Err(AuthError::InvalidToken));
    }

    #[test]
    fn tampered_signature_is_invalid() {
        let token = service().issue(&principal(vec![Role::Admin]), at(0)).unwrap();
        let (head, signature) = token.rsplit_once('.').unwrap();

        let mut sig: Vec<char> = signature.chars().collect();
        sig[0] = if sig[0] == 'A' { 'B' } else { 'A' };
        let tampered = format!("{}.{}", head, sig.into_iter().collect::<String>());

        assert_eq!(
            service().verify_token(&tampered, at(0)),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn tampered_payload_is_invalid() {
        let token = service().issue(&principal(vec![Role::Guest]), at(0)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_payload = b64(&json!({
            "sub": Uuid::new_v4().to_string(),
            "roles": [4],
            "iat": 0,
            "exp": 86_400,
        }));
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(
            service().verify_token(&forged, at(0)),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn alg_none_is_rejected() {
        let header = b64(&json!({"alg": "none", "typ": "JWT"}));
        let payload = b64(&json!({
            "sub": Uuid::new_v4().to_string(),
            "roles": [4],
            "iat": 0,
            "exp": 86_400,
        }));

        for token in [
            format!("{}.{}.", header, payload),
            format!("{}.{}", header, payload),
        ] {
            assert_eq!(
                service().verify_token(&token, at(0)),
                Err(AuthError::InvalidToken)
            );
        }
    }

    #[test]
    fn other_hmac_algorithms_are_rejected() {
        let claims = json!({
            "sub": Uuid::new_v4().to_string(),
            "roles": [4],
            "iat": 0,
            "exp": 86_400,
        });
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(
            service().verify_token(&token, at(0)),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn missing_fields_are_rejected() {
        let id = Uuid::new_v4().to_string();
        let payloads = [
            json!({"roles": [1], "exp": 86_400}),
            json!({"sub": id, "exp": 86_400}),
            json!({"sub": id, "roles": [1]}),
        ];

        for payload in payloads {
            assert_eq!(
                service().verify_token(&signed(payload), at(0)),
                Err(AuthError::InvalidToken)
            );
        }
    }

    #[test]
    fn unusable_claims_fail_closed() {
        let id = Uuid::new_v4().to_string();
        let payloads = [
            json!({"sub": "not-a-uuid", "roles": [1], "iat": 0, "exp": 86_400}),
            json!({"sub": id, "roles": [], "iat": 0, "exp": 86_400}),
            json!({"sub": id, "roles": [5], "iat": 0, "exp": 86_400}),
            json!({"sub": id, "roles": [0], "iat": 0, "exp": 86_400}),
            json!({"sub": id, "roles": [4.0], "iat": 0, "exp": 86_400}),
            json!({"sub": id, "roles": ["4"], "iat": 0, "exp": 86_400}),
            json!({"sub": id, "roles": [1, 99], "iat": 0, "exp": 86_400}),
        ];

        for payload in payloads {
            assert_eq!(
                service().verify_token(&signed(payload.clone()), at(0)),
                Err(AuthError::InvalidToken),
                "payload {payload} should be rejected"
            );
        }
    }

    #[test]
    fn garbage_is_invalid() {
        for token in ["", "not-a-token", "a.b.c", "...."] {
            assert_eq!(
                service().verify_token(token, at(0)),
                Err(AuthError::InvalidToken)
            );
        }
    }

    #[test]
    fn extract_token_requires_scheme_and_single_space() {
        assert_eq!(extract_token(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));

        for header in [
            None,
            Some(""),
            Some("Bearer"),
            Some("Bearer "),
            Some("Bearerabc"),
            Some("Token abc"),
            Some("bearer abc"),
            Some("Bearer  abc"),
            Some("Bearer abc def"),
        ] {
            assert_eq!(
                extract_token(header),
                Err(AuthError::MissingToken),
                "header {header:?}"
            );
        }
    }

    #[test]
    fn verify_header_runs_the_whole_pipeline() {
        let p = principal(vec![Role::Moderator]);
        let token = service().issue(&p, at(10)).unwrap();
        let header = format!("{} {}", AUTH_SCHEME, token);

        assert_eq!(service().verify_header(Some(&header), at(20)), Ok(p));
        assert_eq!(
            service().verify_header(None, at(20)),
            Err(AuthError::MissingToken)
        );
    }
}
