use testcontainers::TestcontainersError;
use thiserror::Error;

/// Failures while setting up or tearing down a fixture.
///
/// Each variant keeps the underlying error as its source so the test run
/// fails with the original message intact.
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Invalid fixture configuration: {0}")]
    InvalidConfig(#[from] validator::ValidationErrors),

    #[error("Failed to provision {image}: {source}")]
    Provision {
        image: String,
        #[source]
        source: TestcontainersError
    },

    #[error("Failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: sqlx::Error
    },

    #[error("Failed to create extension {extension}: {source}")]
    Extension {
        extension: String,
        #[source]
        source: sqlx::Error
    },

    #[error("Migration failed on {endpoint}: {source}")]
    Migration {
        endpoint: String,
        #[source]
        source: sqlx::migrate::MigrateError
    },

    #[error("Failed to stop container {container_id}: {source}")]
    Teardown {
        container_id: String,
        #[source]
        source: TestcontainersError
    }
}

impl FixtureError {
    /// True when the container runtime could not start the database,
    /// typically because Docker is unavailable.
    pub fn is_provisioning(&self) -> bool {
        matches!(self, Self::Provision { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_error_keeps_source_message() {
        let err = FixtureError::Connect {
            endpoint: "localhost:49153".to_string(),
            source: sqlx::Error::PoolTimedOut
        };
        let rendered = err.to_string();
        assert!(rendered.starts_with("Failed to connect to localhost:49153"));
        assert!(rendered.contains(&sqlx::Error::PoolTimedOut.to_string()));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_provisioning());
    }

    #[test]
    fn test_migration_error_names_endpoint() {
        let err = FixtureError::Migration {
            endpoint: "localhost:49153".to_string(),
            source: sqlx::migrate::MigrateError::VersionMissing(20210301090000)
        };
        let rendered = err.to_string();
        assert!(rendered.starts_with("Migration failed on localhost:49153"));
        assert!(rendered.contains("20210301090000"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_provision_error_is_provisioning() {
        let err = FixtureError::Provision {
            image: "postgres:11.11-alpine".to_string(),
            source: TestcontainersError::other("docker socket not found")
        };
        assert!(err.is_provisioning());
        assert!(err.to_string().contains("postgres:11.11-alpine"));
    }
}
