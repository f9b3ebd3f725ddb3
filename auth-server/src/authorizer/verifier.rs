use super::jwks::JwksCache;
use super::VerifyError;
use crate::config::cognito::CognitoConfig;
use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use log::debug;
use serde::Deserialize;

/// Claims the gateway reads from a user pool token
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "custom:customer_id")]
    pub customer_id: Option<String>,
    #[serde(default, rename = "custom:cpf")]
    pub cpf: Option<String>,
    #[serde(default)]
    pub token_use: Option<String>,
    /// Present on access tokens, which carry no audience
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Verifies bearer tokens and returns their claims
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<TokenClaims, VerifyError>;
}

/// Verifier for tokens minted by a Cognito user pool
pub struct CognitoJwtVerifier {
    keys: JwksCache,
    jwks_uri: String,
    issuer: String,
    client_id: String,
    token_use: String,
    leeway: u64,
}

impl CognitoJwtVerifier {
    pub fn new(config: &CognitoConfig) -> Result<Self, String> {
        let token_use = config.token_use.to_lowercase();
        if token_use != "id" && token_use != "access" {
            return Err(format!(
                "COGNITO_TOKEN_USE must be \"id\" or \"access\", got \"{}\"",
                config.token_use
            ));
        }

        Ok(Self {
            keys: JwksCache::new(
                config.jwks_ttl,
                config.jwks_timeout,
                config.jwks_refresh_interval,
            )?,
            jwks_uri: config.jwks_uri(),
            issuer: config.issuer(),
            client_id: config.client_id.clone(),
            token_use,
            leeway: config.clock_skew,
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = self.leeway;
        validation.set_issuer(&[self.issuer.as_str()]);
        if self.token_use == "id" {
            validation.set_audience(&[self.client_id.as_str()]);
            validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        } else {
            validation.validate_aud = false;
            validation.set_required_spec_claims(&["exp", "iss"]);
        }
        validation
    }

    /// Checks jsonwebtoken does not know about
    fn check_claims(&self, claims: &TokenClaims) -> Result<(), VerifyError> {
        if claims.token_use.as_deref() != Some(self.token_use.as_str()) {
            return Err(VerifyError::InvalidClaims(format!(
                "token_use is {:?}, expected {}",
                claims.token_use, self.token_use
            )));
        }
        let client_matches = claims.client_id.as_deref() == Some(self.client_id.as_str());
        if self.token_use == "access" && !client_matches {
            return Err(VerifyError::InvalidClaims(
                "client_id does not match".to_string(),
            ));
        }
        if claims.sub.is_empty() {
            return Err(VerifyError::InvalidClaims("empty sub".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenVerifier for CognitoJwtVerifier {
    async fn verify(&self, token: &str) -> Result<TokenClaims, VerifyError> {
        let header = decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(VerifyError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }
        let kid = header.kid.ok_or(VerifyError::MissingKeyId)?;

        let jwk = self.keys.get_key(&self.jwks_uri, &kid).await?;
        let key = DecodingKey::from_jwk(&jwk)?;

        let data = decode::<TokenClaims>(token, &key, &self.validation())?;
        self.check_claims(&data.claims)?;

        debug!("Token verified for subject {}", data.claims.sub);
        Ok(data.claims)
    }
}
