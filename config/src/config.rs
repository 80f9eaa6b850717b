//! # Fixture Configuration Structures
//!
//! All values default to the fixed settings the test fixture is pinned to.
//! Structures:
//! - Use `serde` for serialization/deserialization
//! - Use `validator` for input validation
//! - Offer `with_*` builders for suites that need a variation

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Upper bound a test suite should apply around fixture setup.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Port PostgreSQL listens on inside the container.
pub const POSTGRES_CONTAINER_PORT: u16 = 5432;

/// Top-level configuration of an ephemeral PostgreSQL fixture.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Describes everything needed to provision a disposable PostgreSQL
/// container, connect a pool to it and prepare its schema.
///
/// ## Usage
/// ```rust
/// use config::{FixtureConfig, Validate};
///
/// let config = FixtureConfig::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.image.reference(), "postgres:11.11-alpine");
/// ```
///
/// ## Fields
/// - `image`: Container image name and pinned tag
/// - `credentials`: Database name, user and password
/// - `pool`: Connection pool bounds
/// - `tmpfs`: In-memory data directory mounted into the container
/// - `schema`: Extension and migrations applied after connecting
/// - `startup_timeout_seconds`: How long to wait for the server to be ready
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct FixtureConfig {
    /// Container image
    #[serde(default)]
    #[validate(nested)]
    pub image: ImageConfig,

    /// Database credentials
    #[serde(default)]
    #[validate(nested)]
    pub credentials: CredentialsConfig,

    /// Connection pool bounds
    #[serde(default)]
    #[validate(nested)]
    pub pool: PoolConfig,

    /// Temporary data directory
    #[serde(default)]
    #[validate(nested)]
    pub tmpfs: TmpfsConfig,

    /// Extension and migrations
    #[serde(default)]
    #[validate(nested)]
    pub schema: SchemaConfig,

    /// Container startup timeout in seconds
    #[serde(default = "default_startup_timeout_seconds")]
    #[validate(range(min = 1, max = 600))]
    pub startup_timeout_seconds: u64
}

fn default_startup_timeout_seconds() -> u64 {
    TEST_TIMEOUT.as_secs()
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            image: ImageConfig::default(),
            credentials: CredentialsConfig::default(),
            pool: PoolConfig::default(),
            tmpfs: TmpfsConfig::default(),
            schema: SchemaConfig::default(),
            startup_timeout_seconds: default_startup_timeout_seconds()
        }
    }
}

impl FixtureConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_seconds)
    }

    pub fn with_image_tag(mut self, tag: impl Into<String>) -> Self {
        self.image.tag = tag.into();
        self
    }

    pub fn with_pool_bounds(mut self, min_connections: u32, max_connections: u32) -> Self {
        self.pool.min_connections = min_connections;
        self.pool.max_connections = max_connections;
        self
    }

    /// Use migrations read from `directory` at runtime instead of the set
    /// embedded in the fixture crate.
    pub fn with_migrations_dir(mut self, directory: impl Into<PathBuf>) -> Self {
        self.schema.migrations_dir = Some(directory.into());
        self
    }

    pub fn with_statement_logging(mut self, enabled: bool) -> Self {
        self.pool.log_statements = enabled;
        self
    }
}

/// Container image reference.
///
/// ## Fields
/// - `name`: Image repository (default: "postgres")
/// - `tag`: Pinned engine version (default: "11.11-alpine")
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ImageConfig {
    #[serde(default = "default_image_name")]
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default = "default_image_tag")]
    #[validate(length(min = 1, max = 128))]
    pub tag: String
}

fn default_image_name() -> String {
    "postgres".to_string()
}

fn default_image_tag() -> String {
    "11.11-alpine".to_string()
}

impl ImageConfig {
    /// `name:tag` as Docker prints it.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.name, self.tag)
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            name: default_image_name(),
            tag: default_image_tag()
        }
    }
}

/// Credentials the container is initialised with and the pool connects with.
///
/// ## Fields
/// - `database`: Database name (default: "postgres")
/// - `username`: Superuser name (default: "postgres")
/// - `password`: Superuser password (default: "secret")
#[derive(Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct CredentialsConfig {
    #[serde(default = "default_database")]
    #[validate(length(min = 1, max = 63))]
    pub database: String,

    #[serde(default = "default_username")]
    #[validate(length(min = 1, max = 63))]
    pub username: String,

    #[serde(default = "default_password")]
    #[validate(length(min = 1))]
    pub password: String
}

fn default_database() -> String {
    "postgres".to_string()
}

fn default_username() -> String {
    "postgres".to_string()
}

fn default_password() -> String {
    "secret".to_string()
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            username: default_username(),
            password: default_password()
        }
    }
}

/// Connection pool settings.
///
/// ## Fields
/// - `min_connections`: Connections kept open (default: 3)
/// - `max_connections`: Upper bound of the pool (default: 10)
/// - `acquire_timeout_seconds`: Wait for a free connection (default: 30)
/// - `log_statements`: Emit executed statements through `tracing`
///   (default: false)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[validate(schema(function = "validate_pool_bounds"))]
pub struct PoolConfig {
    #[serde(default = "default_min_connections")]
    #[validate(range(max = 100))]
    pub min_connections: u32,

    #[serde(default = "default_max_connections")]
    #[validate(range(min = 1, max = 100))]
    pub max_connections: u32,

    #[serde(default = "default_acquire_timeout_seconds")]
    #[validate(range(min = 1, max = 300))]
    pub acquire_timeout_seconds: u64,

    #[serde(default)]
    pub log_statements: bool
}

fn default_min_connections() -> u32 {
    3
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_seconds() -> u64 {
    30
}

fn validate_pool_bounds(pool: &PoolConfig) -> Result<(), validator::ValidationError> {
    if pool.min_connections > pool.max_connections {
        return Err(validator::ValidationError::new(
            "min_connections exceeds max_connections"
        ));
    }
    Ok(())
}

impl PoolConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            acquire_timeout_seconds: default_acquire_timeout_seconds(),
            log_statements: false
        }
    }
}

/// In-memory filesystem mounted into the container.
///
/// Always mounted read-write; Docker mounts tmpfs `noexec,nosuid`.
///
/// ## Fields
/// - `mount_point`: Absolute path inside the container (default:
///   "/temp_pgdata")
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct TmpfsConfig {
    #[serde(default = "default_mount_point")]
    #[validate(custom(function = "validate_mount_point"))]
    pub mount_point: String
}

fn default_mount_point() -> String {
    "/temp_pgdata".to_string()
}

fn validate_mount_point(value: &str) -> Result<(), validator::ValidationError> {
    if value.len() > 1 && value.starts_with('/') {
        Ok(())
    } else {
        Err(validator::ValidationError::new(
            "Mount point must be an absolute path other than /"
        ))
    }
}

impl Default for TmpfsConfig {
    fn default() -> Self {
        Self {
            mount_point: default_mount_point()
        }
    }
}

/// Schema preparation applied once the pool is connected.
///
/// ## Fields
/// - `extension`: Extension created before migrations run (default:
///   "uuid-ossp")
/// - `migrations_dir`: Runtime migrations directory; `None` uses the set
///   embedded in the fixture crate (default: None)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct SchemaConfig {
    #[serde(default = "default_extension")]
    #[validate(custom(function = "validate_extension_name"))]
    pub extension: String,

    #[serde(default)]
    pub migrations_dir: Option<PathBuf>
}

fn default_extension() -> String {
    "uuid-ossp".to_string()
}

// The name is interpolated into a quoted identifier.
fn validate_extension_name(value: &str) -> Result<(), validator::ValidationError> {
    let valid = !value.is_empty()
        && value.len() <= 63
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(validator::ValidationError::new("Invalid extension name"))
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            migrations_dir: None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_config_default() {
        let config = FixtureConfig::default();
        assert_eq!(config.image.reference(), "postgres:11.11-alpine");
        assert_eq!(config.credentials.database, "postgres");
        assert_eq!(config.credentials.username, "postgres");
        assert_eq!(config.credentials.password, "secret");
        assert_eq!(config.pool.min_connections, 3);
        assert_eq!(config.pool.max_connections, 10);
        assert_eq!(config.tmpfs.mount_point, "/temp_pgdata");
        assert_eq!(config.schema.extension, "uuid-ossp");
        assert!(config.schema.migrations_dir.is_none());
        assert_eq!(config.startup_timeout(), TEST_TIMEOUT);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(FixtureConfig::default().validate().is_ok());
    }

    #[test]
    fn test_pool_bounds_validation() {
        let config = FixtureConfig::default().with_pool_bounds(11, 10);
        assert!(config.validate().is_err());

        let config = FixtureConfig::default().with_pool_bounds(0, 1);
        assert!(config.validate().is_ok());

        let config = FixtureConfig::default().with_pool_bounds(0, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_validation() {
        let mut config = FixtureConfig::default();
        config.credentials.password = "".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extension_name_validation() {
        assert!(validate_extension_name("uuid-ossp").is_ok());
        assert!(validate_extension_name("pg_trgm").is_ok());
        assert!(validate_extension_name("").is_err());
        assert!(validate_extension_name("x\"; DROP TABLE t; --").is_err());
    }

    #[test]
    fn test_mount_point_validation() {
        assert!(validate_mount_point("/temp_pgdata").is_ok());
        assert!(validate_mount_point("/").is_err());
        assert!(validate_mount_point("relative").is_err());
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let rendered = format!("{:?}", CredentialsConfig::default());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: FixtureConfig =
            serde_json::from_str(r#"{"image": {"tag": "16-alpine"}, "pool": {"max_connections": 4}}"#)
                .unwrap();
        assert_eq!(config.image.reference(), "postgres:16-alpine");
        assert_eq!(config.pool.min_connections, 3);
        assert_eq!(config.pool.max_connections, 4);
        assert_eq!(config.credentials, CredentialsConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = FixtureConfig::default()
            .with_image_tag("15-alpine")
            .with_migrations_dir("/tmp/migrations")
            .with_statement_logging(true);
        assert_eq!(config.image.tag, "15-alpine");
        assert_eq!(
            config.schema.migrations_dir,
            Some(PathBuf::from("/tmp/migrations"))
        );
        assert!(config.pool.log_statements);
    }
}
