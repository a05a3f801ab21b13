/// JWT Token Generation and Validation
///
/// The token issuer mints an access/refresh pair for a user and parses access
/// tokens back into their subject. Only the HMAC family is accepted on parse.

use chrono::Duration;
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use crate::auth::claims::Claims;
use crate::auth::refresh_token::generate_refresh_token;
use crate::configuration::JwtSettings;

const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("unexpected signing method: {0:?}")]
    UnexpectedSigningMethod(Algorithm),
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("token generation failed: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
    #[error("random source failed: {0}")]
    Random(#[from] rand::Error),
}

/// Freshly minted tokens. Expiry is not part of the pair: the access token
/// carries its own `exp` and the session manager owns the refresh TTL.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub trait TokenManager: Send + Sync {
    fn create_tokens_pair(
        &self,
        user_id: &str,
        access_ttl: Duration,
    ) -> Result<TokenPair, TokenError>;

    /// Returns the subject of a valid, unexpired access token.
    fn parse(&self, access_token: &str) -> Result<String, TokenError>;
}

pub struct JwtTokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtTokenManager {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn from_settings(config: &JwtSettings) -> Self {
        Self::new(&config.secret)
    }

    fn new_jwt(&self, user_id: &str, ttl: Duration) -> Result<String, TokenError> {
        let claims = Claims::new(user_id, ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encode)
    }
}

impl TokenManager for JwtTokenManager {
    fn create_tokens_pair(
        &self,
        user_id: &str,
        access_ttl: Duration,
    ) -> Result<TokenPair, TokenError> {
        let access_token = self.new_jwt(user_id, access_ttl)?;
        let refresh_token = generate_refresh_token()?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    fn parse(&self, access_token: &str) -> Result<String, TokenError> {
        let header = decode_header(access_token).map_err(TokenError::Invalid)?;
        if !HMAC_ALGORITHMS.contains(&header.alg) {
            return Err(TokenError::UnexpectedSigningMethod(header.alg));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.set_required_spec_claims(&["exp", "sub"]);
        // Expired means expired: no grace period past `exp`.
        validation.leeway = 0;

        decode::<Claims>(access_token, &self.decoding_key, &validation)
            .map(|data| data.claims.sub)
            .map_err(|e| {
                tracing::debug!("JWT validation error: {}", e);
                TokenError::Invalid(e)
            })
    }
}
