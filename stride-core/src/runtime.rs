use std::future::Future;

use anyhow::{Context, Result};
use log::debug;
use tokio::runtime::Runtime;
use tokio::sync::OnceCell;

static GLOBAL_RUNTIME: OnceCell<Runtime> = OnceCell::const_new();

pub async fn init_global_runtime() -> Result<&'static Runtime> {
    GLOBAL_RUNTIME
        .get_or_try_init(|| async {
            let threads = std::cmp::max(num_cpus::get(), 2);
            debug!("Initializing global runtime with {} threads", threads);
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(threads)
                .thread_name("stride-worker")
                .enable_all()
                .build()
                .context("failed to build tokio runtime")
        })
        .await
}

/// Run `fut` on the global runtime. Foreign callers poll exported futures
/// from their own executor, which has no tokio reactor for timers.
pub async fn run_on_global<F, T>(fut: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let rt = init_global_runtime().await?;
    rt.spawn(fut).await.context("workout task panicked")?
}
