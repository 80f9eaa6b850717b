//! Scoped fixtures that are always torn down.

use crate::container::{start_container_with, stop_container};
use crate::error::FixtureError;
use config::FixtureConfig;
use sqlx::PgPool;
use std::future::Future;

/// Runs `body` against a fresh fixture with the default configuration and
/// stops the fixture afterwards.
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let one: i32 = pg_fixture::with_container(|pool| async move {
///     sqlx::query_scalar("SELECT 1").fetch_one(&pool).await
/// })
/// .await??;
/// assert_eq!(one, 1);
/// # Ok(())
/// # }
/// ```
pub async fn with_container<F, Fut, T>(body: F) -> Result<T, FixtureError>
where
    F: FnOnce(PgPool) -> Fut,
    Fut: Future<Output = T>
{
    with_container_config(&FixtureConfig::default(), body).await
}

/// Like [`with_container`] with an explicit configuration.
///
/// The body receives a clone of the fixture's pool. If the body panics the
/// container is still removed when the handle is dropped during unwinding.
pub async fn with_container_config<F, Fut, T>(
    config: &FixtureConfig,
    body: F
) -> Result<T, FixtureError>
where
    F: FnOnce(PgPool) -> Fut,
    Fut: Future<Output = T>
{
    let instance = start_container_with(config).await?;
    let output = body(instance.pool().clone()).await;
    stop_container(instance).await?;
    Ok(output)
}
