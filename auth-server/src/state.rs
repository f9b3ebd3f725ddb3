use crate::authorizer::verifier::{CognitoJwtVerifier, TokenVerifier};
use crate::config::AuthConfig;
use crate::identity::cognito::CognitoIdentityProvider;
use crate::identity::credential::CredentialPolicy;
use crate::identity::IdentityProvider;
use crate::store::mysql::MySqlCustomerStore;
use crate::store::CustomerStore;
use log::{info, warn};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AuthConfig>,
    pub store: Arc<dyn CustomerStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub credentials: Arc<CredentialPolicy>,
}

impl AppState {
    /// Build the production state. The database pool is only created on the
    /// first customer lookup.
    pub async fn new(config: &AuthConfig) -> Result<Self, String> {
        let verifier = CognitoJwtVerifier::new(&config.cognito)?;
        let identity = CognitoIdentityProvider::new(&config.cognito).await;

        info!(
            "Using user pool {} in {} (token use: {})",
            config.cognito.user_pool_id,
            config.cognito.resolved_region(),
            config.cognito.token_use
        );
        if config.cognito.credential_override.is_some() {
            warn!("Fixed account credential configured, derived credentials are disabled");
        }

        Ok(Self {
            config: Arc::new(config.clone()),
            store: Arc::new(MySqlCustomerStore::new(config.database.clone())),
            identity: Arc::new(identity),
            verifier: Arc::new(verifier),
            credentials: Arc::new(CredentialPolicy::new(
                config.cognito.credential_override.clone(),
            )),
        })
    }

    /// Check if all components are healthy
    pub async fn health_check(&self) -> Result<(), String> {
        self.store.health_check().await
    }

    /// Release external resources once the server stopped accepting requests
    pub async fn shutdown(&self) {
        self.store.close().await;
    }
}
