//! Component runtime: runs long-lived units (the HTTP channel, the session
//! sweeper) side by side under one shutdown token.
//!
//! A [`Component`] captures its shared state at construction and exposes a
//! single `run` future. [`run_components`] drives them all on a `JoinSet`;
//! the first failure or panic cancels the token so the rest wind down, and
//! that first error is what the caller gets back.

use std::future::Future;
use std::pin::Pin;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::AppError;

/// A boxed, owned future returned by [`Component::run`].
pub type ComponentFuture = Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'static>>;

/// A self-contained, concurrently-runnable unit.
///
/// `run` is called exactly once and should return when `shutdown` is
/// cancelled or the component's work is done.
pub trait Component: Send + 'static {
    /// Stable identifier used in log messages.
    fn id(&self) -> &str;

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture;
}

/// Run every component to completion and return the first error, if any.
pub async fn run_components(
    components: Vec<Box<dyn Component>>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let mut set = JoinSet::new();
    for component in components {
        let id = component.id().to_string();
        debug!(component = %id, "spawning component");
        let fut = component.run(shutdown.clone());
        set.spawn(async move { (id, fut.await) });
    }

    let mut first_err: Option<AppError> = None;
    while let Some(joined) = set.join_next().await {
        let failure = match joined {
            Ok((id, Ok(()))) => {
                debug!(component = %id, "component exited");
                None
            }
            Ok((id, Err(e))) => {
                error!(component = %id, error = %e, "component failed");
                Some(e)
            }
            Err(e) => {
                error!(error = %e, "component panicked");
                Some(AppError::Comms(format!("component panicked: {e}")))
            }
        };
        if let Some(e) = failure {
            shutdown.cancel();
            first_err.get_or_insert(e);
        }
    }

    first_err.map_or(Ok(()), Err)
}
