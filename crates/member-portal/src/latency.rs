use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Simulated backend latency, measured in executor turns.
///
/// Each poll consumes one turn and wakes the task again, so a tree pump
/// advances it by exactly one step per round.
#[derive(Debug, Clone, Copy)]
pub struct Latency {
    remaining: u32,
}

pub fn latency(turns: u32) -> Latency {
    Latency { remaining: turns }
}

impl Future for Latency {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.remaining == 0 {
            return Poll::Ready(());
        }
        self.remaining -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
