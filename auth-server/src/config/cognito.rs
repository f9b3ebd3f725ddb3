use confique::Config;

const DEFAULT_REGION: &str = "us-east-1";

/// Configuration for the Cognito user pool
#[derive(Debug, Config, Clone)]
pub struct CognitoConfig {
    /// AWS region of the user pool. Falls back to AWS_REGION, then us-east-1.
    #[config(env = "AWS_REGION_CUSTOM")]
    pub region: Option<String>,

    /// User pool identifier (e.g. us-east-1_AbCdEf)
    #[config(env = "COGNITO_USER_POOL_ID")]
    pub user_pool_id: String,

    /// App client identifier, used for admin auth and as expected audience
    #[config(env = "COGNITO_CLIENT_ID")]
    pub client_id: String,

    /// Token kind accepted by the authorizer: "id" or "access" (default: id)
    #[config(env = "COGNITO_TOKEN_USE", default = "id")]
    pub token_use: String,

    /// Override of the token issuer URL, mainly for local user pool emulators
    #[config(env = "COGNITO_ISSUER_URL")]
    pub issuer_url: Option<String>,

    /// How long a fetched key set is reused, in seconds (default: 3600)
    #[config(env = "COGNITO_JWKS_TTL", default = 3600)]
    pub jwks_ttl: u64,

    /// Timeout of a key set download in seconds (default: 5)
    #[config(env = "COGNITO_JWKS_TIMEOUT", default = 5)]
    pub jwks_timeout: u64,

    /// Minimum seconds between key set downloads forced by an unknown key
    /// id (default: 10)
    #[config(env = "COGNITO_JWKS_REFRESH_INTERVAL", default = 10)]
    pub jwks_refresh_interval: u64,

    /// Accepted clock skew when checking token expiry, in seconds (default: 0)
    #[config(env = "COGNITO_CLOCK_SKEW", default = 0)]
    pub clock_skew: u64,

    /// Fixed account credential replacing the derived one
    #[config(env = "COGNITO_CREDENTIAL_OVERRIDE")]
    pub credential_override: Option<String>,
}

impl CognitoConfig {
    /// Region used for the SDK client and the issuer URL
    pub fn resolved_region(&self) -> String {
        self.region
            .clone()
            .filter(|r| !r.is_empty())
            .or_else(|| std::env::var("AWS_REGION").ok().filter(|r| !r.is_empty()))
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    /// Issuer expected in the `iss` claim of tokens minted by the user pool
    pub fn issuer(&self) -> String {
        match &self.issuer_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!(
                "https://cognito-idp.{}.amazonaws.com/{}",
                self.resolved_region(),
                self.user_pool_id
            ),
        }
    }

    /// Location of the user pool's published key set
    pub fn jwks_uri(&self) -> String {
        format!("{}/.well-known/jwks.json", self.issuer())
    }
}
