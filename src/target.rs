//! Target function abstraction
//!
//! The engine only needs one thing from a precomputed function: given a
//! full set of arguments, produce a JSON-serializable result or an error.

use crate::combination::Arguments;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::marker::PhantomData;

/// A function whose results can be precomputed
///
/// Implement this directly for stateful functions (e.g. ones holding a
/// database pool), or pass a closure to
/// [`Precomputer::wrap`](crate::Precomputer::wrap).
#[async_trait]
pub trait TargetFunction: Send + Sync {
    /// Compute the result for one combination of arguments
    ///
    /// The error string is recorded in the run summary; the combination is
    /// left uncached and retried on the next run.
    async fn invoke(&self, args: Arguments) -> Result<serde_json::Value, String>;
}

/// Adapts an async closure returning a serializable value
pub struct FnTarget<F, T> {
    f: F,
    _result: PhantomData<fn() -> T>,
}

impl<F, T> FnTarget<F, T> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _result: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut, T, E> TargetFunction for FnTarget<F, T>
where
    F: Fn(Arguments) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Serialize + 'static,
    E: Display + 'static,
{
    async fn invoke(&self, args: Arguments) -> Result<serde_json::Value, String> {
        let result = (self.f)(args).await.map_err(|e| e.to_string())?;
        serde_json::to_value(result).map_err(|e| format!("serializing result: {}", e))
    }
}
