use std::future::Future;
use std::pin::Pin;

pub type CheckFuture<'a> = Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

/// A lightweight reachability check against one external service.
///
/// Implementations swallow every failure and report it as `false`.
pub trait ConnectivityCheck: Send + Sync {
    fn name(&self) -> &str;

    fn test_connection(&self) -> CheckFuture<'_>;
}
