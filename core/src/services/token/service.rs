//! Main token service implementation

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Header, Validation};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::entities::refresh_token::RefreshToken;
use crate::domain::entities::signing_key::SigningAlgorithm;
use crate::domain::entities::token::{Claims, TokenPair};
use crate::errors::{DomainError, KeyError, TokenError};
use crate::repositories::SigningKeyRepository;
use crate::services::signing_key::SigningKeyManager;

use super::config::TokenServiceConfig;

/// Entropy of a refresh secret in bytes (256 bits)
pub const REFRESH_SECRET_BYTES: usize = 32;

/// Name of the query parameter accepted when no Authorization header is sent
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Service for issuing and validating access tokens
///
/// Signing keys are resolved through the [`SigningKeyManager`] on every call,
/// so a rotation takes effect immediately for new tokens while tokens signed
/// by the previous key keep validating until that key expires.
pub struct TokenService<K: SigningKeyRepository> {
    key_manager: Arc<SigningKeyManager<K>>,
    config: TokenServiceConfig,
}

impl<K: SigningKeyRepository> TokenService<K> {
    pub fn new(key_manager: Arc<SigningKeyManager<K>>, config: TokenServiceConfig) -> Self {
        Self { key_manager, config }
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    pub fn key_manager(&self) -> &Arc<SigningKeyManager<K>> {
        &self.key_manager
    }

    /// Issue a signed access token for `user_id`
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Compact JWT with the active key's `kid` in its header
    /// * `Err(DomainError)` - No key could be ensured or signing failed
    pub async fn issue_access_token(&self, user_id: Uuid) -> Result<String, DomainError> {
        let material = self.key_manager.get_signing_material().await?;
        let claims = Claims::new_access_token(user_id, self.config.access_token_lifetime());

        let mut header = Header::new(material.algorithm.jwt_algorithm());
        header.kid = Some(material.key_id);

        encode(&header, &claims, &material.encoding_key).map_err(|e| {
            warn!(error = %e, "Failed to sign access token");
            DomainError::Token(TokenError::TokenGenerationFailed)
        })
    }

    /// Validate an access token and return its claims
    ///
    /// The header algorithm must be the configured RSA algorithm before the
    /// `kid` is even looked up, so a token cannot choose how it is verified.
    ///
    /// # Returns
    ///
    /// * `Ok(Claims)` - Signature and expiry are valid
    /// * `Err(TokenError::InvalidToken)` - Malformed token or missing `kid`
    /// * `Err(TokenError::InvalidSignature)` - Wrong algorithm, unknown or expired key, bad signature
    /// * `Err(TokenError::TokenExpired)` - Past `exp`
    pub async fn validate_access_token(&self, token: &str) -> Result<Claims, DomainError> {
        let header = decode_header(token).map_err(|_| TokenError::InvalidToken)?;

        let key_id = match header.kid {
            Some(kid) if !kid.is_empty() => kid,
            _ => return Err(TokenError::InvalidToken.into()),
        };

        match SigningAlgorithm::from_jwt_algorithm(header.alg) {
            Some(algorithm) if algorithm == self.config.algorithm => {}
            _ => {
                warn!(algorithm = ?header.alg, "Rejected token signed with unexpected algorithm");
                return Err(TokenError::InvalidSignature.into());
            }
        }

        let decoding_key = match self.key_manager.get_verification_material(&key_id).await {
            Ok(key) => key,
            Err(DomainError::Key(KeyError::KeyNotFound { .. }))
            | Err(DomainError::Key(KeyError::KeyExpired { .. })) => {
                debug!(key_id = %key_id, "Token signed by unknown or expired key");
                return Err(TokenError::InvalidSignature.into());
            }
            Err(e) => return Err(e),
        };

        let mut validation = Validation::new(self.config.algorithm.jwt_algorithm());
        validation.leeway = 0;
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::TokenExpired,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidRsaKey(_)
                | ErrorKind::Crypto(_) => TokenError::InvalidSignature,
                _ => TokenError::InvalidToken,
            }
        })?;

        token_data
            .claims
            .user_id()
            .map_err(|_| TokenError::InvalidToken)?;

        Ok(token_data.claims)
    }

    /// Read the bearer token from a request's Authorization header or `token` query parameter
    pub fn extract_from_request(
        &self,
        authorization: Option<&str>,
        query_token: Option<&str>,
    ) -> Result<String, DomainError> {
        extract_token(authorization, query_token)
    }

    /// Issue an access token and a fresh refresh secret for `user_id`
    ///
    /// The returned [`RefreshToken`] holds only the secret's hash; the caller
    /// persists it and hands the plain secret in [`TokenPair`] to the client.
    pub async fn issue_token_pair(
        &self,
        user_id: Uuid,
    ) -> Result<(TokenPair, RefreshToken), DomainError> {
        let access_token = self.issue_access_token(user_id).await?;
        let secret = self.generate_refresh_secret();
        let record = RefreshToken::new(
            user_id,
            hash_refresh_secret(&secret),
            self.config.refresh_token_lifetime(),
        );

        let pair = TokenPair {
            access_token,
            refresh_token: secret,
            expires_in: self.config.access_token_lifetime().num_seconds(),
            refresh_expires_at: record.expires_at,
        };
        Ok((pair, record))
    }

    /// A new 256-bit refresh secret, hex encoded
    pub fn generate_refresh_secret(&self) -> String {
        let mut bytes = [0u8; REFRESH_SECRET_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// SHA-256 digest of a refresh secret as stored by the repository
pub fn hash_refresh_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Pull a bearer token out of an Authorization header value, falling back to a query parameter
///
/// # Returns
///
/// * `Ok(String)` - The raw token
/// * `Err(TokenError::TokenNotFound)` - Neither source carried a token
pub fn extract_token(
    authorization: Option<&str>,
    query_token: Option<&str>,
) -> Result<String, DomainError> {
    let from_header = authorization.and_then(|value| {
        let (scheme, token) = value.trim().split_once(' ')?;
        let token = token.trim();
        (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
    });

    from_header
        .or_else(|| {
            query_token
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
        })
        .ok_or_else(|| TokenError::TokenNotFound.into())
}
