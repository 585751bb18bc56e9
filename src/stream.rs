use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::{
    channel::mpsc::{unbounded, UnboundedReceiver},
    pin_mut, Stream, StreamExt,
};

use crate::{Listener, Lookable, Observable, Subscription};

#[cfg(test)]
mod tests;

/// Stream of the values published by a cell.
///
/// Dropping the stream unsubscribes. The stream ends when the cell is dropped.
#[must_use = "streams do nothing unless polled"]
pub struct Changes<T> {
    receiver: UnboundedReceiver<T>,
    _subscription: Subscription,
}

pub fn changes<L: Lookable>(cell: &L) -> Changes<L::Value> {
    let (sender, receiver) = unbounded();
    let subscription = cell.subscribe(Listener::new(move |value: &L::Value| {
        let _ = sender.unbounded_send(value.clone());
    }));
    Changes {
        receiver,
        _subscription: subscription,
    }
}

impl<T> Stream for Changes<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_next_unpin(cx)
    }
}

/// Sets `target` to every item of `stream`. Returns how many items were received.
pub async fn feed<T, S>(target: &Observable<T>, stream: S) -> usize
where
    T: Clone + 'static,
    S: Stream<Item = T>,
{
    pin_mut!(stream);
    let mut count = 0;
    while let Some(value) = stream.next().await {
        target.set(value);
        count += 1;
    }
    count
}
