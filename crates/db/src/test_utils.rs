//! Throwaway `PostgreSQL` databases for integration tests.
//!
//! Each test gets its own migrated database. Call
//! [`TestDatabase::drop_database`] at the end of the test to remove it again.

use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::migrations::Migrator;

/// Name prefix of every database created by [`TestDatabase::create_unique`].
pub const TEST_DATABASE_PREFIX: &str = "mwb_test_";

/// Connection settings for the test server, read from `TEST_DB_*` variables.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "mwb_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "mwb_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// URL of database `name` on the test server.
    #[must_use]
    pub fn database_url(&self, name: &str) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{name}",
            self.username, self.password, self.host, self.port
        )
    }

    /// URL of the maintenance database used to create and drop test databases.
    #[must_use]
    pub fn postgres_url(&self) -> String {
        self.database_url("postgres")
    }
}

/// A migrated database that exists for the duration of one test.
pub struct TestDatabase {
    conn: Arc<DatabaseConnection>,
    config: TestDbConfig,
    name: String,
}

impl TestDatabase {
    /// Create and migrate a database with a unique name.
    pub async fn create_unique() -> Result<Self, DbErr> {
        let config = TestDbConfig::default();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let name = format!("{TEST_DATABASE_PREFIX}{}", &suffix[..12]);

        let admin = Database::connect(&config.postgres_url()).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{name}\""),
            ))
            .await?;
        admin.close().await?;

        let conn = Database::connect(&config.database_url(&name)).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %name, "Created test database");

        Ok(Self {
            conn: Arc::new(conn),
            config,
            name,
        })
    }

    /// Shared connection for building repositories.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Name of the database on the test server.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Drop the database, terminating any connections still held by
    /// repositories built from [`Self::connection`].
    pub async fn drop_database(self) -> Result<(), DbErr> {
        let Self { conn, config, name } = self;
        if let Ok(conn) = Arc::try_unwrap(conn) {
            conn.close().await?;
        }

        let admin = Database::connect(&config.postgres_url()).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{name}\" WITH (FORCE)"),
            ))
            .await?;
        admin.close().await?;

        info!(database = %name, "Dropped test database");
        Ok(())
    }
}
