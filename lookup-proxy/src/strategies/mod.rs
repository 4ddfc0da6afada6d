//! The three lookups a batch request can ask for.
//!
//! Each strategy owns its upstream calls and the fallback applied when a call
//! fails. Failures never escape a strategy: a failed title gets a conservative
//! default and the rest of the batch carries on.

mod descriptions;
mod existence;
mod images;

pub use descriptions::DescriptionFetch;
pub use existence::ExistenceCheck;
pub use images::ImageFetch;

use std::future::Future;
use tokio::task::JoinSet;

/// Runs `task` for every item concurrently and waits for all of them.
///
/// Outputs are returned in item order, whatever order the tasks finish in.
/// A task that panicked leaves `None` in its slot.
async fn fan_out<I, F, Fut>(items: I, task: F) -> Vec<Option<Fut::Output>>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future + Send + 'static,
    Fut::Output: Send + 'static,
{
    let mut join_set = JoinSet::new();
    let mut len = 0;

    for (index, item) in items.into_iter().enumerate() {
        let future = task(item);
        join_set.spawn(async move { (index, future.await) });
        len += 1;
    }

    let mut results: Vec<Option<Fut::Output>> = (0..len).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, output)) => results[index] = Some(output),
            Err(e) => tracing::error!(error = %e, "Per-item lookup task panicked"),
        }
    }

    results
}
