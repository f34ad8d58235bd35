use std::io;
use tokio::runtime::Runtime;
use tracing::info;

/// Builds the multi-thread runtime. `threads` overrides the worker count, which
/// otherwise defaults to the number of cores.
pub fn build(threads: Option<usize>) -> io::Result<Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all().thread_name("simulator-worker");
    match threads {
        Some(0) | None => {}
        Some(threads) => {
            info!("custom runtime threads: {}", threads);
            builder.worker_threads(threads);
        }
    }

    builder.build()
}
