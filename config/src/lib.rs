//! # Fixture Configuration
//!
//! Configuration of the ephemeral PostgreSQL test fixture.
//!
//! This crate provides:
//! - Configuration structures with defaults pinned to the fixture's fixed
//!   image, credentials, pool bounds and data directory
//! - Validation through the `validator` crate
//! - Builders for suites that need a variation

pub mod config;

pub use config::{
    CredentialsConfig, FixtureConfig, ImageConfig, POSTGRES_CONTAINER_PORT, PoolConfig,
    SchemaConfig, TEST_TIMEOUT, TmpfsConfig,
};
pub use validator::Validate;
