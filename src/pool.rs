// src/pool.rs
//! Bounded fan-out with an end-of-phase barrier.

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};

/// Run `f` over `inputs` with at most `concurrency` calls in flight and return the
/// outputs in input order, whatever order they completed in.
pub async fn fan_out<I, T, F, Fut>(inputs: Vec<I>, concurrency: usize, f: F) -> Vec<T>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = T>,
{
    let total = inputs.len();
    if total == 0 {
        return Vec::new();
    }

    let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();
    let completed: Vec<(usize, T)> =
        stream::iter(inputs.into_iter().enumerate().map(|(idx, input)| {
            let fut = f(input);
            async move { (idx, fut.await) }
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    for (idx, out) in completed {
        slots[idx] = Some(out);
    }

    // Every index is filled exactly once by the loop above.
    slots.into_iter().flatten().collect()
}

/// Bound a collaborator call by `limit`, folding the elapsed timeout into an `anyhow` error.
pub async fn with_timeout<T, Fut>(limit: Duration, what: &str, fut: Fut) -> anyhow::Result<T>
where
    Fut: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => anyhow::bail!("{what} timed out after {}s", limit.as_secs_f32()),
    }
}
