//! Ephemeral PostgreSQL fixtures for integration tests.
//!
//! Each fixture is an isolated container started from a pinned PostgreSQL
//! image, with a pooled `sqlx` client, the `uuid-ossp` extension enabled and
//! every migration under `fixture/migrations` applied:
//!
//! ```rust,no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use pg_fixture::{start_container, stop_container};
//!
//! let instance = start_container().await?;
//! let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(instance.pool()).await?;
//! assert_eq!(one, 1);
//! stop_container(instance).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Fixtures share no state; concurrent tests each get their own container.
//! Wrap setup in [`TEST_TIMEOUT`] to bound it.

mod container;
mod error;
pub mod migrations;
mod scoped;
mod telemetry;

pub use config::{FixtureConfig, TEST_TIMEOUT};
pub use container::{
    ConnectionInfo, ContainerInstance, start_container, start_container_with, stop_container,
};
pub use error::FixtureError;
pub use scoped::{with_container, with_container_config};
pub use telemetry::init_tracing;
