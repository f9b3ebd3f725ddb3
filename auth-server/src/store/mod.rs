use crate::models::Customer;
use thiserror::Error;

pub mod mysql;

/// Errors that can occur while reading customer records
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Invalid customer row: {0}")]
    InvalidRow(String),
}

/// Read-only access to the customer records.
///
/// Implementations own their connection resources and must be safe to share
/// across concurrent requests.
#[async_trait::async_trait]
pub trait CustomerStore: Send + Sync {
    /// Fetch a single customer by CPF. No matching row is `Ok(None)`.
    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<Customer>, StoreError>;

    /// Checks that the backing database is reachable
    async fn health_check(&self) -> Result<(), String>;

    /// Releases pooled connections. Safe to call more than once.
    async fn close(&self);
}
