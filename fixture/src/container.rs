//! Lifecycle of an ephemeral PostgreSQL container.
//!
//! [`start_container`] provisions the database, connects a pool, enables the
//! configured extension and applies migrations, in that order.
//! [`stop_container`] stops the container and closes the pool.

use crate::error::FixtureError;
use crate::migrations;
use config::{FixtureConfig, POSTGRES_CONTAINER_PORT, Validate};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{AssertSqlSafe, ConnectOptions, PgPool};
use testcontainers::core::{AccessMode, Mount};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt, TestcontainersError};
use testcontainers_modules::postgres::Postgres;

/// Connection parameters of a running fixture database.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String
}

impl ConnectionInfo {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    /// Options with TLS disabled. Statement logging stays off unless
    /// `log_statements` is set.
    pub fn connect_options(&self, log_statements: bool) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database)
            .ssl_mode(PgSslMode::Disable);

        if log_statements {
            options
        } else {
            options.disable_statement_logging()
        }
    }
}

impl std::fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

impl std::fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "postgres://{}@{}:{}/{}",
            self.username, self.host, self.port, self.database
        )
    }
}

/// A running PostgreSQL container and the pool connected to it.
///
/// The handle owns both. Pass it to [`stop_container`] to tear them down;
/// dropping it without stopping still removes the container.
pub struct ContainerInstance {
    container: ContainerAsync<Postgres>,
    pool: PgPool,
    connection: ConnectionInfo
}

impl ContainerInstance {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn connection(&self) -> &ConnectionInfo {
        &self.connection
    }

    pub fn url(&self) -> String {
        self.connection.url()
    }

    pub fn container_id(&self) -> &str {
        self.container.id()
    }

    pub async fn stop(self) -> Result<(), FixtureError> {
        stop_container(self).await
    }
}

impl std::fmt::Debug for ContainerInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerInstance")
            .field("container_id", &self.container.id())
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

/// Starts a fixture with the default configuration.
pub async fn start_container() -> Result<ContainerInstance, FixtureError> {
    start_container_with(&FixtureConfig::default()).await
}

/// Starts a fixture with `config`.
///
/// If connecting, creating the extension or migrating fails, the container
/// is stopped and the pool closed before the error is returned.
pub async fn start_container_with(config: &FixtureConfig) -> Result<ContainerInstance, FixtureError> {
    config.validate()?;

    let (container, connection) = provision(config).await?;

    let pool = match connect(&connection, config).await {
        Ok(pool) => pool,
        Err(e) => {
            release(container, None).await;
            return Err(e);
        }
    };

    if let Err(e) = prepare_schema(&pool, &connection, config).await {
        release(container, Some(&pool)).await;
        return Err(e);
    }

    tracing::info!(
        "PostgreSQL fixture ready at {} (container {})",
        connection,
        container.id()
    );

    Ok(ContainerInstance {
        container,
        pool,
        connection
    })
}

/// Stops the container, then closes the pool.
///
/// The pool is closed even if stopping the container fails; that failure is
/// returned afterwards.
pub async fn stop_container(instance: ContainerInstance) -> Result<(), FixtureError> {
    let ContainerInstance {
        container,
        pool,
        connection
    } = instance;

    let stopped = container.stop().await;
    finish_stop(stopped, container.id(), &pool, &connection).await
}

// The pool is closed whatever the outcome of stopping the container.
async fn finish_stop(
    stopped: Result<(), TestcontainersError>,
    container_id: &str,
    pool: &PgPool,
    connection: &ConnectionInfo
) -> Result<(), FixtureError> {
    pool.close().await;

    match stopped {
        Ok(()) => {
            tracing::info!("PostgreSQL fixture at {} stopped", connection.endpoint());
            Ok(())
        }
        Err(source) => {
            let err = FixtureError::Teardown {
                container_id: container_id.to_string(),
                source
            };
            tracing::warn!("PostgreSQL fixture at {}: {}", connection.endpoint(), err);
            Err(err)
        }
    }
}

async fn provision(
    config: &FixtureConfig
) -> Result<(ContainerAsync<Postgres>, ConnectionInfo), FixtureError> {
    let image = config.image.reference();
    let provision_err = |source: TestcontainersError| FixtureError::Provision {
        image: image.clone(),
        source
    };

    let credentials = &config.credentials;

    tracing::debug!(
        "Starting {} with tmpfs at {}",
        image,
        config.tmpfs.mount_point
    );

    let container = Postgres::default()
        .with_db_name(&credentials.database)
        .with_user(&credentials.username)
        .with_password(&credentials.password)
        .with_name(config.image.name.as_str())
        .with_tag(config.image.tag.as_str())
        .with_mount(
            Mount::tmpfs_mount(config.tmpfs.mount_point.as_str())
                .with_access_mode(AccessMode::ReadWrite)
        )
        .with_startup_timeout(config.startup_timeout())
        .start()
        .await
        .map_err(provision_err)?;

    // Dropping the container on the error paths below removes it.
    let host = container.get_host().await.map_err(provision_err)?;
    let port = container
        .get_host_port_ipv4(POSTGRES_CONTAINER_PORT)
        .await
        .map_err(provision_err)?;

    let connection = ConnectionInfo {
        host: host.to_string(),
        port,
        username: credentials.username.clone(),
        password: credentials.password.clone(),
        database: credentials.database.clone()
    };
    tracing::info!(
        "Provisioned {} as container {} on port {}",
        image,
        container.id(),
        port
    );

    Ok((container, connection))
}

async fn connect(connection: &ConnectionInfo, config: &FixtureConfig) -> Result<PgPool, FixtureError> {
    PgPoolOptions::new()
        .min_connections(config.pool.min_connections)
        .max_connections(config.pool.max_connections)
        .acquire_timeout(config.pool.acquire_timeout())
        .connect_with(connection.connect_options(config.pool.log_statements))
        .await
        .map_err(|source| FixtureError::Connect {
            endpoint: connection.endpoint(),
            source
        })
}

async fn prepare_schema(
    pool: &PgPool,
    connection: &ConnectionInfo,
    config: &FixtureConfig
) -> Result<(), FixtureError> {
    let extension = &config.schema.extension;
    let statement = format!("CREATE EXTENSION IF NOT EXISTS \"{}\"", extension);
    sqlx::query(AssertSqlSafe(statement.as_str()))
        .execute(pool)
        .await
        .map_err(|source| FixtureError::Extension {
            extension: extension.clone(),
            source
        })?;

    migrations::run(pool, &config.schema)
        .await
        .map_err(|source| FixtureError::Migration {
            endpoint: connection.endpoint(),
            source
        })?;
    tracing::info!("Schema ready with extension {}", extension);
    Ok(())
}

async fn release(container: ContainerAsync<Postgres>, pool: Option<&PgPool>) {
    tracing::warn!(
        "Releasing container {} after failed fixture setup",
        container.id()
    );
    if let Err(e) = container.stop().await {
        tracing::warn!("Failed to stop container {}: {:?}", container.id(), e);
    }
    if let Some(pool) = pool {
        pool.close().await;
    }
}
