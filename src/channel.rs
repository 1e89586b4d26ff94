//! Rendezvous transport between two stages.
//!
//! A [`Sender`]/[`Receiver`] pair carries one typed item sequence from
//! exactly one writer to one reader. `send` completes only once the reader
//! has taken the item, so at most one item is ever in flight.
//!
//! Closing is tied to ownership: [`Sender::close`] consumes the writer and
//! dropping it has the same effect, so a transport is closed exactly once and
//! can never be written to afterwards. The reader observes the close as
//! `None` from [`Receiver::recv`].

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::{mpsc, oneshot};

use crate::core::{Error, Result};

struct Envelope<T> {
    item: T,
    accepted: oneshot::Sender<()>,
}

/// Create a new rendezvous transport.
pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    // One slot is enough: a sender always waits for the hand-off to be
    // acknowledged before it can queue the next envelope.
    let (tx, rx) = mpsc::channel(1);
    (
        Sender { tx, sent: 0 },
        Receiver {
            rx,
            received: 0,
            terminated: false,
        },
    )
}

/// The single writing end of a transport.
pub struct Sender<T> {
    tx: mpsc::Sender<Envelope<T>>,
    sent: u64,
}

impl<T> Sender<T> {
    /// Hand `item` to the receiver, waiting until it has been taken.
    ///
    /// Fails with [`Error::ChannelClosed`] if the receiver was dropped before
    /// accepting the item; the item is discarded in that case.
    pub async fn send(&mut self, item: T) -> Result<()> {
        let (accepted, ack) = oneshot::channel();
        self.tx
            .send(Envelope { item, accepted })
            .await
            .map_err(|_| Error::ChannelClosed)?;
        ack.await.map_err(|_| Error::ChannelClosed)?;
        self.sent += 1;
        Ok(())
    }

    /// Number of items the receiver has accepted so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Close the transport. The receiver sees end-of-sequence once it has
    /// drained any hand-off already in progress.
    pub fn close(self) {
        drop(self);
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        tracing::trace!(sent = self.sent, "transport closed");
    }
}

impl<T> std::fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender").field("sent", &self.sent).finish()
    }
}

/// The reading end of a transport.
pub struct Receiver<T> {
    rx: mpsc::Receiver<Envelope<T>>,
    received: u64,
    terminated: bool,
}

impl<T> Receiver<T> {
    /// Wait for the next item.
    ///
    /// Returns `None` once the sender has closed; every later call returns
    /// `None` again.
    pub async fn recv(&mut self) -> Option<T> {
        if self.terminated {
            return None;
        }
        match self.rx.recv().await {
            Some(envelope) => Some(self.accept(envelope)),
            None => {
                self.terminated = true;
                None
            }
        }
    }

    /// Number of items taken from this transport so far.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Whether end-of-sequence has already been observed.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn accept(&mut self, envelope: Envelope<T>) -> T {
        let Envelope { item, accepted } = envelope;
        // The sender may have given up waiting; the item is still ours.
        let _ = accepted.send(());
        self.received += 1;
        item
    }
}

impl<T> Stream for Receiver<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        if self.terminated {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(envelope)) => Poll::Ready(Some(self.accept(envelope))),
            Poll::Ready(None) => {
                self.terminated = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> std::fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Receiver")
            .field("received", &self.received)
            .field("terminated", &self.terminated)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;
    use tokio_test::{assert_pending, assert_ready, assert_ready_eq, task};

    #[tokio::test]
    async fn test_send_waits_for_receiver() {
        let (mut tx, mut rx) = channel::<u32>();

        let mut send = task::spawn(async move {
            tx.send(7).await.unwrap();
            tx
        });
        // Nothing has taken the item yet, so the sender must still be parked.
        assert_pending!(send.poll());
        assert_pending!(send.poll());

        let mut recv = task::spawn(rx.recv());
        assert_ready_eq!(recv.poll(), Some(7));
        drop(recv);

        assert!(send.is_woken());
        let tx = assert_ready!(send.poll());
        assert_eq!(tx.sent(), 1);
        assert_eq!(rx.received(), 1);
    }

    #[tokio::test]
    async fn test_recv_waits_for_item_or_close() {
        let (tx, mut rx) = channel::<u32>();

        let mut recv = task::spawn(rx.recv());
        assert_pending!(recv.poll());

        tx.close();
        assert!(recv.is_woken());
        assert_ready_eq!(recv.poll(), None);
    }

    #[tokio::test]
    async fn test_close_is_sticky() {
        let (tx, mut rx) = channel::<u32>();
        drop(tx);

        assert_eq!(rx.recv().await, None);
        assert!(rx.is_terminated());
        assert_eq!(rx.recv().await, None);
        assert_eq!(rx.received(), 0);
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let (mut tx, rx) = channel::<u32>();
        drop(rx);

        let err = tx.send(1).await.unwrap_err();
        assert!(matches!(err, Error::ChannelClosed));
        assert_eq!(tx.sent(), 0);
    }

    #[tokio::test]
    async fn test_receiver_dropped_mid_hand_off_wakes_sender() {
        let (mut tx, rx) = channel::<u32>();

        let mut send = task::spawn(async move { tx.send(1).await });
        assert_pending!(send.poll());

        drop(rx);
        assert!(send.is_woken());
        let result = assert_ready!(send.poll());
        assert!(matches!(result, Err(Error::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_preserves_order_as_stream() {
        let (mut tx, rx) = channel::<usize>();

        let writer = tokio::spawn(async move {
            for i in 0..50 {
                tx.send(i).await.unwrap();
            }
        });

        let items: Vec<usize> = rx.collect().await;
        writer.await.unwrap();
        assert_eq!(items, (0..50).collect::<Vec<_>>());
    }
}
