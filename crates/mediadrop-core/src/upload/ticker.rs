//! Pacing of the progress cadence.

use std::task::Poll;

use async_trait::async_trait;
use futures::future::poll_fn;

/// Suspends the orchestrator between progress ticks so the host stays
/// responsive.
#[async_trait(?Send)]
pub trait Ticker {
    async fn tick(&self);
}

/// Yields to the executor once per tick, without any delay.
#[derive(Debug, Default, Clone, Copy)]
pub struct YieldTicker;

#[async_trait(?Send)]
impl Ticker for YieldTicker {
    async fn tick(&self) {
        // `futures::pending!` never wakes, so schedule the wake-up ourselves.
        let mut yielded = false;
        poll_fn(|cx| {
            if yielded {
                return Poll::Ready(());
            }
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        })
        .await
    }
}
