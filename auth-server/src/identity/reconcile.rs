//! Account reconciliation and session issuance

use super::credential::CredentialPolicy;
use super::{
    AccountAttribute, IdentityAccount, IdentityError, IdentityProvider, ATTR_CPF,
    ATTR_CUSTOMER_ID, ATTR_EMAIL, ATTR_EMAIL_VERIFIED,
};
use crate::models::{Customer, SessionTokens};
use log::{debug, error, info};

/// What reconciliation did to the identity account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated { fields: Vec<String> },
    Unchanged,
}

/// Mirrors customers into the identity provider and mints their sessions
pub struct SessionIssuer<'a> {
    identity: &'a dyn IdentityProvider,
    credentials: &'a CredentialPolicy,
}

impl<'a> SessionIssuer<'a> {
    pub fn new(identity: &'a dyn IdentityProvider, credentials: &'a CredentialPolicy) -> Self {
        Self {
            identity,
            credentials,
        }
    }

    /// Ensure the customer's account exists, matches the record and accepts
    /// the derived credential.
    pub async fn sync_account(&self, customer: &Customer) -> Result<SyncOutcome, IdentityError> {
        let username = customer.email.as_str();
        let credential = self.credentials.credential_for(&customer.cpf, &customer.email);

        match self.identity.get_account(username).await {
            Ok(account) => {
                let drifted = drifted_attributes(&account, customer);
                let outcome = if drifted.is_empty() {
                    info!("User {} already up to date in Cognito", username);
                    SyncOutcome::Unchanged
                } else {
                    let fields: Vec<String> = drifted.iter().map(|a| a.name.clone()).collect();
                    self.identity.update_attributes(username, &drifted).await?;
                    info!("User {} updated in Cognito: {:?}", username, fields);
                    SyncOutcome::Updated { fields }
                };

                // Reset even when nothing drifted so admin auth cannot fail on
                // a password changed out of band.
                self.identity
                    .set_credential(username, &credential, true)
                    .await?;
                Ok(outcome)
            }
            Err(IdentityError::AccountNotFound(_)) => {
                debug!("User {} not found in Cognito, creating it", username);
                self.identity
                    .create_account(username, &creation_attributes(customer), &credential)
                    .await?;
                self.identity
                    .set_credential(username, &credential, true)
                    .await?;
                info!("User {} created in Cognito", username);
                Ok(SyncOutcome::Created)
            }
            Err(e) => {
                error!("Error syncing user to Cognito: {}", e);
                Err(e)
            }
        }
    }

    /// Reconcile the account, then exchange the credential for a session
    pub async fn issue_session(&self, customer: &Customer) -> Result<SessionTokens, IdentityError> {
        self.sync_account(customer).await?;

        let credential = self.credentials.credential_for(&customer.cpf, &customer.email);
        self.identity
            .authenticate(&customer.email, &credential)
            .await
            .inspect_err(|e| error!("Error generating token: {}", e))
    }
}

/// Attributes written when the account is first provisioned
fn creation_attributes(customer: &Customer) -> Vec<AccountAttribute> {
    vec![
        AccountAttribute::new(ATTR_EMAIL, customer.email.as_str()),
        AccountAttribute::new(ATTR_EMAIL_VERIFIED, "true"),
        AccountAttribute::new(ATTR_CUSTOMER_ID, customer.id.to_string()),
        AccountAttribute::new(ATTR_CPF, customer.cpf.as_str()),
    ]
}

/// Mutable attributes whose account value differs from the customer record.
/// The CPF attribute is immutable and never part of the result.
fn drifted_attributes(account: &IdentityAccount, customer: &Customer) -> Vec<AccountAttribute> {
    let desired = [
        (ATTR_EMAIL, customer.email.clone()),
        (ATTR_CUSTOMER_ID, customer.id.to_string()),
    ];

    desired
        .into_iter()
        .filter(|(name, value)| account.attribute(name) != Some(value.as_str()))
        .map(|(name, value)| AccountAttribute::new(name, value))
        .collect()
}
