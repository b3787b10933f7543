//! bb8 pool of `diesel-async` PostgreSQL connections.
//!
//! A unit of work keeps its connection for as long as its transaction is
//! open, so checkouts are owned rather than borrowed from the pool.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

use crate::config::CrmSettings;

const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(10);

/// Pool construction and checkout failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("no database URL configured (set CRM_DATABASE_URL)")]
    MissingDatabaseUrl,
    #[error("could not build the connection pool: {message}")]
    Build { message: String },
    #[error("no database connection available: {message}")]
    Checkout { message: String },
}

impl PoolError {
    /// Pool construction failure.
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }

    /// Checkout failure.
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }
}

/// Where to connect and how many connections to hold.
///
/// ```
/// use std::time::Duration;
/// use crm::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://crm@localhost/crm")
///     .with_max_size(2)
///     .with_checkout_timeout(Duration::from_secs(3));
/// assert_eq!(config.database_url(), "postgres://crm@localhost/crm");
/// assert_eq!(config.max_size(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    checkout_timeout: Duration,
}

impl PoolConfig {
    /// Default size and timeout for `database_url`.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: CrmSettings::DEFAULT_POOL_MAX_SIZE,
            checkout_timeout: DEFAULT_CHECKOUT_TIMEOUT,
        }
    }

    /// Pool settings from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::MissingDatabaseUrl`] when the URL is absent or
    /// blank.
    pub fn from_settings(settings: &CrmSettings) -> Result<Self, PoolError> {
        let url = settings
            .database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(PoolError::MissingDatabaseUrl)?;
        Ok(Self::new(url).with_max_size(settings.pool_max_size))
    }

    /// Zero is raised to one.
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    /// How long a checkout waits for a free connection.
    pub fn with_checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = timeout;
        self
    }

    /// Connection string.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Upper bound on open connections.
    pub fn max_size(&self) -> u32 {
        self.max_size
    }
}

/// Connection checked out for the lifetime of one unit of work.
pub type OwnedConnection = PooledConnection<'static, AsyncPgConnection>;

/// Shared connection pool.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Build the pool. Connections are opened lazily on first checkout.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Build`] when bb8 rejects the configuration.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url);
        let inner = Pool::builder()
            .max_size(config.max_size)
            .min_idle(None)
            .connection_timeout(config.checkout_timeout)
            .test_on_check_out(true)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;
        Ok(Self { inner })
    }

    /// Check out a connection that outlives the borrow of `self`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Checkout`] when no connection is available in time.
    pub async fn get_owned(&self) -> Result<OwnedConnection, PoolError> {
        self.inner
            .get_owned()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}
