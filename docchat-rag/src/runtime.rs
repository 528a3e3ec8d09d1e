//! Per-worker execution context for blocking callers.
//!
//! The pipeline is async. Synchronous callers (the command line, tests
//! without `#[tokio::test]`, embedding applications with their own thread
//! pools) drive it through [`block_on`], which lazily builds one
//! current-thread Tokio runtime per OS thread and reuses it for every later
//! call on that thread. The runtime lives until its thread exits.
//!
//! Calling [`block_on`] from inside an async context panics, as with any
//! nested Tokio runtime; async callers should await the pipeline directly.

use std::cell::OnceCell;
use std::future::Future;

use tokio::runtime::{Builder, Runtime};

use crate::error::{RagError, Result};

thread_local! {
    static WORKER_RUNTIME: OnceCell<Runtime> = const { OnceCell::new() };
}

fn build_runtime() -> Result<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| RagError::ConfigError(format!("failed to start worker runtime: {e}")))
}

/// Run `future` to completion on this thread's worker runtime.
///
/// # Errors
///
/// Returns [`RagError::ConfigError`] if the runtime cannot be created;
/// otherwise returns whatever the future returns.
pub fn block_on<F, T>(future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    WORKER_RUNTIME.with(|cell| {
        if cell.get().is_none() {
            let runtime = build_runtime()?;
            let _ = cell.set(runtime);
        }
        match cell.get() {
            Some(runtime) => runtime.block_on(future),
            None => Err(RagError::ConfigError("worker runtime unavailable".to_string())),
        }
    })
}

/// Whether this thread has already created its worker runtime.
pub fn is_initialized() -> bool {
    WORKER_RUNTIME.with(|cell| cell.get().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_is_created_lazily_and_reused() {
        std::thread::spawn(|| {
            assert!(!is_initialized());
            let first = block_on(async {
                tokio::task::yield_now().await;
                Ok(())
            });
            assert!(first.is_ok());
            assert!(is_initialized());

            let value = block_on(async { Ok(21 * 2) }).unwrap();
            assert_eq!(value, 42);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn each_thread_gets_its_own_runtime() {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                std::thread::spawn(|| {
                    let before = is_initialized();
                    block_on(async { Ok(()) }).unwrap();
                    (before, is_initialized())
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), (false, true));
        }
    }

    #[test]
    fn errors_from_the_future_pass_through() {
        let err = block_on(async { Err::<(), _>(RagError::EmptyResult("nothing".into())) }).unwrap_err();
        assert!(matches!(err, RagError::EmptyResult(_)));
    }
}
