//! JWT token generation and validation.
//!
//! The service is bound to one signing algorithm for its whole lifetime:
//!
//! - **HS256**: HMAC with SHA-256 over a shared secret
//! - **RS256**: RSA with SHA-256 over a PEM key pair
//!
//! Validation rejects tokens whose header names any other algorithm.
//!
//! ## Example
//!
//! ```ignore
//! use taskhub_auth::token::jwt::{JwtService, SigningKey};
//!
//! let key = SigningKey::from_secret(b"secret")?;
//! let jwt = JwtService::new(key, access_ttl, refresh_ttl);
//!
//! let token = jwt.issue_access(user_id, "alice@example.com", "user")?;
//! let claims = jwt.validate(&token)?;
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token claims are invalid.
    #[error("Invalid claims: {message}")]
    InvalidClaims {
        /// Description of why claims are invalid.
        message: String,
    },

    /// Invalid key format or data.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key is invalid.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClaims` error.
    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a validation error (expired, invalid signature, etc.).
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Expired
                | Self::InvalidSignature
                | Self::InvalidClaims { .. }
                | Self::DecodingError { .. }
        )
    }

    /// Returns `true` if this is a key-related error.
    #[must_use]
    pub fn is_key_error(&self) -> bool {
        matches!(self, Self::InvalidKey { .. })
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm => Self::decoding_error(err.to_string()),
            ErrorKind::ImmatureSignature
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_) => Self::invalid_claims(err.to_string()),
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                Self::invalid_key(err.to_string())
            }
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

// ============================================================================
// Signing Algorithm
// ============================================================================

/// Supported signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256 over a shared secret.
    HS256,
    /// RSA with SHA-256.
    RS256,
}

impl SigningAlgorithm {
    /// Converts to the `jsonwebtoken` Algorithm type.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::HS256 => Algorithm::HS256,
            Self::RS256 => Algorithm::RS256,
        }
    }

    /// Returns the algorithm name as used in JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::RS256 => "RS256",
        }
    }

    /// Returns `true` if this is an RSA-based algorithm.
    #[must_use]
    pub fn is_rsa(&self) -> bool {
        matches!(self, Self::RS256)
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = JwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(Self::HS256),
            "RS256" => Ok(Self::RS256),
            other => Err(JwtError::invalid_key(format!(
                "unsupported signing algorithm: {other}"
            ))),
        }
    }
}

// ============================================================================
// Token Claims
// ============================================================================

/// Which lifetime a token was issued with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    #[serde(rename = "access_token")]
    Access,
    #[serde(rename = "refresh_token")]
    Refresh,
}

impl TokenKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access_token",
            Self::Refresh => "refresh_token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims carried by every token.
///
/// `iat` and `exp` are plain integers so that a token lacking either fails
/// to deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Account id.
    pub user_id: String,

    pub email: String,

    pub role: String,

    /// Token kind. Advisory only.
    #[serde(rename = "type")]
    pub kind: TokenKind,

    /// Subject, set on refresh tokens to the account id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    fn new(kind: TokenKind, user_id: Uuid, email: &str, role: &str, ttl: Duration) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            user_id: user_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            kind,
            sub: (kind == TokenKind::Refresh).then(|| user_id.to_string()),
            iat: now,
            exp: now.saturating_add(ttl),
        }
    }

    /// Parses the `user_id` claim.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::InvalidClaims` if the claim is not a UUID.
    pub fn principal_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.user_id)
            .map_err(|_| JwtError::invalid_claims("user_id is not a valid identifier"))
    }
}

// ============================================================================
// Signing Key
// ============================================================================

/// Key material for one algorithm.
pub struct SigningKey {
    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,

    /// Encoding key (secret or private key) for signing.
    encoding_key: EncodingKey,

    /// Decoding key (secret or public key) for verification.
    decoding_key: DecodingKey,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// HS256 key from a shared secret.
    ///
    /// # Errors
    /// Returns an error if the secret is empty.
    pub fn from_secret(secret: &[u8]) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::invalid_key("HS256 secret is empty"));
        }
        Ok(Self {
            algorithm: SigningAlgorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        })
    }

    /// RS256 key pair from PEM strings.
    ///
    /// # Arguments
    /// * `private_pem` - PEM-encoded private key
    /// * `public_pem` - PEM-encoded public key
    ///
    /// # Errors
    /// Returns an error if the PEM data is invalid.
    pub fn from_rsa_pem(private_pem: &str, public_pem: &str) -> Result<Self, JwtError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| JwtError::invalid_key(format!("private key: {e}")))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| JwtError::invalid_key(format!("public key: {e}")))?;

        Ok(Self {
            algorithm: SigningAlgorithm::RS256,
            encoding_key,
            decoding_key,
        })
    }
}

// ============================================================================
// JWT Service
// ============================================================================

/// Issues and validates tokens.
///
/// This service is thread-safe (`Send + Sync`) and can be shared across
/// async tasks.
pub struct JwtService {
    signing_key: SigningKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtService {
    /// Creates a new JWT service.
    #[must_use]
    pub fn new(signing_key: SigningKey, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            signing_key,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Builds the service from configuration.
    ///
    /// # Errors
    /// Returns `AuthError::Configuration` if the algorithm is unknown or the
    /// key material for it is absent or unparseable.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let algorithm = config
            .signing_algorithm()
            .map_err(|e| AuthError::configuration(e.to_string()))?;

        let key = match algorithm {
            SigningAlgorithm::HS256 => {
                let secret = config
                    .jwt_secret
                    .as_deref()
                    .ok_or_else(|| AuthError::configuration("HS256 requires jwt_secret"))?;
                SigningKey::from_secret(secret.as_bytes())?
            }
            SigningAlgorithm::RS256 => {
                let (Some(private_pem), Some(public_pem)) = (
                    config.private_key_pem.as_deref(),
                    config.public_key_pem.as_deref(),
                ) else {
                    return Err(AuthError::configuration(
                        "RS256 requires private_key_pem and public_key_pem",
                    ));
                };
                SigningKey::from_rsa_pem(private_pem, public_pem)?
            }
        };

        Ok(Self::new(key, config.access_ttl, config.refresh_ttl))
    }

    /// The algorithm every token is signed and checked with.
    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.signing_key.algorithm
    }

    /// Issues a short-lived access token.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn issue_access(&self, user_id: Uuid, email: &str, role: &str) -> Result<String, JwtError> {
        self.encode(&Claims::new(
            TokenKind::Access,
            user_id,
            email,
            role,
            self.access_ttl,
        ))
    }

    /// Issues a refresh token. Its `sub` claim echoes the account id.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn issue_refresh(
        &self,
        user_id: Uuid,
        email: &str,
        role: &str,
    ) -> Result<String, JwtError> {
        self.encode(&Claims::new(
            TokenKind::Refresh,
            user_id,
            email,
            role,
            self.refresh_ttl,
        ))
    }

    /// Validates a token and returns its claims.
    ///
    /// Checks the signature with the configured key, rejects other
    /// algorithms, requires `iat` and `exp`, and rejects expired tokens or
    /// tokens issued in the future.
    ///
    /// # Errors
    /// Returns an error if decoding or any check fails.
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let claims: Claims = self.decode(token)?;

        let now = OffsetDateTime::now_utc().unix_timestamp();
        if claims.iat > now {
            return Err(JwtError::invalid_claims("token used before issued"));
        }

        Ok(claims)
    }

    /// Encodes claims into a JWT string.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.signing_key.algorithm.to_jwt_algorithm());

        encode(&header, claims, &self.signing_key.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Decodes and verifies a JWT string without the issued-at check.
    ///
    /// # Errors
    /// Returns an error if decoding or validation fails.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, JwtError> {
        let mut validation = Validation::new(self.signing_key.algorithm.to_jwt_algorithm());
        validation.set_required_spec_claims(&["exp"]);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = 0;

        decode::<T>(token, &self.signing_key.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(JwtError::from)
    }
}

impl fmt::Debug for JwtService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtService")
            .field("algorithm", &self.signing_key.algorithm)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};
    use rand::rngs::OsRng;
    use rsa::RsaPrivateKey;
    use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};

    const TTL: Duration = Duration::from_secs(900);

    fn hs256(secret: &str) -> JwtService {
        JwtService::new(SigningKey::from_secret(secret.as_bytes()).unwrap(), TTL, TTL)
    }

    fn rsa_pems() -> (String, String) {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let private_pem = private_key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string();
        let public_pem = private_key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap();
        (private_pem, public_pem)
    }

    fn now() -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }

    #[test]
    fn test_hs256_issue_validate() {
        let service = hs256("secret");
        let id = Uuid::new_v4();

        let token = service.issue_access(id, "alice@example.com", "user").unwrap();
        let claims = service.validate(&token).unwrap();

        assert_eq!(claims.principal_id().unwrap(), id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, "user");
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.sub.is_none());
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_refresh_token_echoes_subject() {
        let service = JwtService::new(
            SigningKey::from_secret(b"secret").unwrap(),
            TTL,
            Duration::from_secs(3600),
        );
        let id = Uuid::new_v4();

        let claims = service
            .validate(&service.issue_refresh(id, "a@b.io", "user").unwrap())
            .unwrap();

        assert_eq!(claims.kind, TokenKind::Refresh);
        assert_eq!(claims.sub.as_deref(), Some(id.to_string().as_str()));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_claims_wire_format() {
        let claims = Claims::new(TokenKind::Access, Uuid::nil(), "a@b.io", "user", TTL);
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["type"], "access_token");
        assert_eq!(json["user_id"], Uuid::nil().to_string());
        assert!(json.get("sub").is_none());
    }

    #[test]
    fn test_rs256_issue_validate() {
        let (private_pem, public_pem) = rsa_pems();
        let key = SigningKey::from_rsa_pem(&private_pem, &public_pem).unwrap();
        let service = JwtService::new(key, TTL, TTL);
        assert_eq!(service.algorithm(), SigningAlgorithm::RS256);

        let token = service.issue_access(Uuid::new_v4(), "a@b.io", "user").unwrap();
        assert_ok!(service.validate(&token));
    }

    #[test]
    fn test_invalid_signature_rejected() {
        let token = hs256("one").issue_access(Uuid::new_v4(), "a@b.io", "user").unwrap();
        let result = hs256("two").validate(&token);

        assert!(matches!(result.unwrap_err(), JwtError::InvalidSignature));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = hs256("secret");
        let claims = Claims {
            iat: now() - 7200,
            exp: now() - 3600,
            ..Claims::new(TokenKind::Access, Uuid::new_v4(), "a@b.io", "user", TTL)
        };

        let token = service.encode(&claims).unwrap();
        assert!(matches!(service.validate(&token).unwrap_err(), JwtError::Expired));
    }

    #[test]
    fn test_missing_exp_rejected() {
        #[derive(Serialize)]
        struct NoExp {
            user_id: String,
            email: String,
            role: String,
            #[serde(rename = "type")]
            kind: TokenKind,
            iat: i64,
        }

        let service = hs256("secret");
        let token = service
            .encode(&NoExp {
                user_id: Uuid::new_v4().to_string(),
                email: "a@b.io".into(),
                role: "user".into(),
                kind: TokenKind::Access,
                iat: now(),
            })
            .unwrap();

        let err = service.validate(&token).unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_missing_iat_rejected() {
        #[derive(Serialize)]
        struct NoIat {
            user_id: String,
            email: String,
            role: String,
            #[serde(rename = "type")]
            kind: TokenKind,
            exp: i64,
        }

        let service = hs256("secret");
        let token = service
            .encode(&NoIat {
                user_id: Uuid::new_v4().to_string(),
                email: "a@b.io".into(),
                role: "user".into(),
                kind: TokenKind::Access,
                exp: now() + 600,
            })
            .unwrap();

        assert_err!(service.validate(&token));
    }

    #[test]
    fn test_future_iat_rejected() {
        let service = hs256("secret");
        let claims = Claims {
            iat: now() + 3600,
            exp: now() + 7200,
            ..Claims::new(TokenKind::Access, Uuid::new_v4(), "a@b.io", "user", TTL)
        };

        let token = service.encode(&claims).unwrap();
        assert!(matches!(
            service.validate(&token).unwrap_err(),
            JwtError::InvalidClaims { .. }
        ));
    }

    #[test]
    fn test_wrong_algorithm_rejected() {
        let claims = Claims::new(TokenKind::Access, Uuid::new_v4(), "a@b.io", "user", TTL);
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let err = hs256("secret").validate(&token).unwrap_err();
        assert!(matches!(err, JwtError::DecodingError { .. }));
    }

    #[test]
    fn test_rs256_rejects_hmac_signed_with_public_key() {
        let (private_pem, public_pem) = rsa_pems();
        let service = JwtService::new(
            SigningKey::from_rsa_pem(&private_pem, &public_pem).unwrap(),
            TTL,
            TTL,
        );

        let claims = Claims::new(TokenKind::Access, Uuid::new_v4(), "a@b.io", "user", TTL);
        let forged = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(public_pem.as_bytes()),
        )
        .unwrap();

        assert_err!(service.validate(&forged));
    }

    #[test]
    fn test_garbled_token_rejected() {
        let service = hs256("secret");
        for token in ["", "abc", "a.b.c", "not a token at all"] {
            let err = service.validate(token).unwrap_err();
            assert!(err.is_validation_error(), "{token:?} -> {err:?}");
        }
    }

    #[test]
    fn test_invalid_pem_is_key_error() {
        let err = SigningKey::from_rsa_pem("garbage", "garbage").unwrap_err();
        assert!(err.is_key_error());
        assert!(SigningKey::from_secret(b"").unwrap_err().is_key_error());
    }

    #[test]
    fn test_signing_key_debug_hides_material() {
        let key = SigningKey::from_secret(b"top-secret-value").unwrap();
        let debug = format!("{key:?}");
        assert!(debug.contains("HS256"));
        assert!(!debug.contains("top-secret-value"));
    }

    #[test]
    fn test_from_config() {
        let config = AuthConfig {
            jwt_secret: Some("secret".into()),
            password_pepper: "pepper".into(),
            ..AuthConfig::default()
        };
        let service = JwtService::from_config(&config).unwrap();
        assert_eq!(service.algorithm(), SigningAlgorithm::HS256);

        let missing = AuthConfig {
            algorithm: "RS256".into(),
            ..config
        };
        assert!(matches!(
            JwtService::from_config(&missing).unwrap_err(),
            AuthError::Configuration { .. }
        ));
    }

    #[test]
    fn test_signing_algorithm_parse() {
        assert_eq!("HS256".parse::<SigningAlgorithm>().unwrap(), SigningAlgorithm::HS256);
        assert_eq!("RS256".parse::<SigningAlgorithm>().unwrap(), SigningAlgorithm::RS256);
        assert_err!("none".parse::<SigningAlgorithm>());
        assert!(SigningAlgorithm::RS256.is_rsa());
        assert_eq!(SigningAlgorithm::HS256.to_string(), "HS256");
    }
}
