use super::{CustomerStore, StoreError};
use crate::config::database::DatabaseConfig;
use crate::models::Customer;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use tokio::sync::OnceCell;

const SELECT_BY_CPF: &str = "SELECT id, first_name, last_name, cpf, email, created_at, updated_at \
     FROM customers WHERE cpf = ?";

/// Row type for customer queries.
#[derive(FromRow)]
struct CustomerRow {
    id: i64,
    first_name: Option<String>,
    last_name: Option<String>,
    cpf: Option<String>,
    email: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl CustomerRow {
    fn try_into_customer(self) -> Result<Customer, StoreError> {
        let cpf = self
            .cpf
            .ok_or_else(|| StoreError::InvalidRow(format!("customer {} has no cpf", self.id)))?;
        let email = self
            .email
            .ok_or_else(|| StoreError::InvalidRow(format!("customer {} has no email", self.id)))?;
        Ok(Customer {
            id: self.id,
            cpf,
            email,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// MySQL customer store with a pool created on first use
pub struct MySqlCustomerStore {
    config: DatabaseConfig,
    pool: OnceCell<MySqlPool>,
}

impl MySqlCustomerStore {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: OnceCell::new(),
        }
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .database(&self.config.name)
            .username(&self.config.user)
            .password(&self.config.password)
    }

    /// Returns the shared pool, creating it on the first call
    async fn pool(&self) -> Result<&MySqlPool, StoreError> {
        self.pool
            .get_or_try_init(|| async {
                info!(
                    "Creating MySQL pool for {}:{}/{} (max {} connections)",
                    self.config.host,
                    self.config.port,
                    self.config.name,
                    self.config.connection_limit
                );
                MySqlPoolOptions::new()
                    .max_connections(self.config.connection_limit)
                    .acquire_timeout(Duration::from_secs(self.config.acquire_timeout))
                    .connect_with(self.connect_options())
                    .await
            })
            .await
            .map_err(StoreError::Database)
    }
}

#[async_trait]
impl CustomerStore for MySqlCustomerStore {
    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<Customer>, StoreError> {
        let pool = self.pool().await?;

        let row: Option<CustomerRow> = sqlx::query_as(SELECT_BY_CPF)
            .bind(cpf)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                error!("Error querying customer by CPF: {}", e);
                StoreError::Database(e)
            })?;

        debug!("Customer lookup by CPF matched: {}", row.is_some());
        row.map(CustomerRow::try_into_customer).transpose()
    }

    async fn health_check(&self) -> Result<(), String> {
        let pool = self.pool().await.map_err(|e| e.to_string())?;
        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map(|_| ())
            .map_err(|e| format!("MySQL ping failed: {e}"))
    }

    async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            info!("MySQL pool closed");
        }
    }
}
