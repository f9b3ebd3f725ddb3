use crate::config::cognito::CognitoConfig;
use crate::config::database::DatabaseConfig;
use confique::Config;

pub mod cognito;
pub mod database;

/// Main configuration structure for the auth server
#[derive(Debug, Config, Clone)]
pub struct AuthConfig {
    /// The port the auth server will listen to (default: 8080)
    #[config(env = "PORT", default = 8080)]
    pub port: u16,

    /// Customer database configuration
    #[config(nested)]
    pub database: DatabaseConfig,

    /// Cognito user pool configuration
    #[config(nested)]
    pub cognito: CognitoConfig,
}

impl AuthConfig {
    /// Creates a new Config instance from environment variables
    pub fn new() -> Result<Self, String> {
        AuthConfig::builder()
            .env()
            .load()
            .map_err(|e: confique::Error| e.to_string())
    }

    #[cfg(test)]
    pub fn for_test_with_mocks(jwks_mock: &wiremock::MockServer) -> Self {
        Self::for_test_with_mocks_uri(&jwks_mock.uri())
    }

    /// Test configuration whose issuer (and key set) lives at `issuer_url`
    #[cfg(test)]
    pub fn for_test_with_mocks_uri(issuer_url: &str) -> Self {
        Self {
            port: 0, // Let the OS choose a port
            database: DatabaseConfig {
                host: "127.0.0.1".to_string(),
                port: 3306,
                name: "customers".to_string(),
                user: "test".to_string(),
                password: "test".to_string(),
                connection_limit: 1,
                acquire_timeout: 1,
            },
            cognito: CognitoConfig {
                region: Some("us-east-1".to_string()),
                user_pool_id: "us-east-1_TestPool".to_string(),
                client_id: "test-client-id".to_string(),
                token_use: "id".to_string(),
                issuer_url: Some(issuer_url.to_string()),
                jwks_ttl: 3600,
                jwks_timeout: 5,
                jwks_refresh_interval: 10,
                clock_skew: 0,
                credential_override: None,
            },
        }
    }
}
