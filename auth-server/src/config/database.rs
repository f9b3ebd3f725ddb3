use confique::Config;

/// Configuration for the customer database
#[derive(Debug, Config, Clone)]
pub struct DatabaseConfig {
    /// MySQL hostname
    #[config(env = "DB_HOST")]
    pub host: String,

    /// MySQL port (default: 3306)
    #[config(env = "DB_PORT", default = 3306)]
    pub port: u16,

    /// Database name
    #[config(env = "DB_NAME")]
    pub name: String,

    /// Database user
    #[config(env = "DB_USER")]
    pub user: String,

    /// Database password
    #[config(env = "DB_PASSWORD")]
    pub password: String,

    /// Maximum number of pooled connections (default: 10)
    #[config(env = "DB_CONNECTION_LIMIT", default = 10)]
    pub connection_limit: u32,

    /// Time to wait for a pooled connection in seconds (default: 5)
    #[config(env = "DB_ACQUIRE_TIMEOUT", default = 5)]
    pub acquire_timeout: u64,
}
