//! For interacting with the database.

use super::{config::DatabaseConfig, error::ApiResult};
use sqlx::{
    migrate::MigrateError,
    pool::PoolOptions,
    postgres::{PgConnectOptions, PgSslMode},
    ConnectOptions, PgPool, Postgres, Transaction,
};
use std::time::Duration;
use tracing::log::LevelFilter;

/// A common transaction type.
/// Use this for the business and persistence layer.
pub type Tx = Transaction<'static, Postgres>;

/// A common database pool type.
pub type DbPool = PgPool;

/// Connects to the database based on some configuration.
pub fn init_db(config: &DatabaseConfig) -> PgPool {
    let db_options = PgConnectOptions::default()
        .username(&config.username)
        .password(&config.password)
        .host(&config.host)
        .port(config.port)
        .database(&config.database_name)
        .ssl_mode(PgSslMode::Prefer)
        .log_statements(LevelFilter::Debug);
    let db: PgPool = PoolOptions::default()
        .acquire_timeout(Duration::from_secs(5))
        .min_connections(1)
        .max_connections(100)
        .connect_lazy_with(db_options);
    db
}

/// Applies the migrations in `migrations/`.
pub async fn migrate(db: &DbPool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(db).await
}

/// Storage for all aggregates, backed by some executor.
///
/// The repository traits of each feature are implemented for
/// `Repository<Tx>`, so one repository spans one transaction.
#[derive(Debug)]
pub struct Repository<E> {
    pub(crate) executor: E,
}

impl<E> Repository<E> {
    /// Creates a new repository.
    pub fn new(executor: E) -> Self {
        Self { executor }
    }
}

impl Repository<Tx> {
    /// Starts a transaction and wraps it in a repository.
    pub async fn begin(db: &DbPool) -> ApiResult<Self> {
        Ok(Self::new(db.begin().await?))
    }

    /// Commits the underlying transaction.
    pub async fn commit(self) -> ApiResult<()> {
        self.executor.commit().await?;
        Ok(())
    }
}
