use crate::metrics::ChannelMetrics;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Bounded feed channel that reports queue depth and backpressure drops.
pub struct FeedSender<T> {
    sender: mpsc::Sender<T>,
    capacity: usize,
    metrics: Option<ChannelMetrics>,
}

pub struct FeedReceiver<T> {
    receiver: mpsc::Receiver<T>,
    capacity: usize,
    metrics: Option<ChannelMetrics>,
}

pub fn tracked_channel<T>(
    capacity: usize,
    metrics: Option<ChannelMetrics>,
) -> (FeedSender<T>, FeedReceiver<T>) {
    let (sender, receiver) = mpsc::channel(capacity);
    (
        FeedSender {
            sender,
            capacity,
            metrics: metrics.clone(),
        },
        FeedReceiver {
            receiver,
            capacity,
            metrics,
        },
    )
}

impl<T> FeedSender<T> {
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        let result = self.sender.try_send(value);
        match &result {
            Ok(()) => {
                if let Some(metrics) = &self.metrics {
                    metrics.set_queue_depth(self.capacity - self.sender.capacity());
                }
            }
            Err(TrySendError::Full(_)) => {
                if let Some(metrics) = &self.metrics {
                    metrics.inc_dropped();
                }
            }
            Err(TrySendError::Closed(_)) => {}
        }
        result
    }
}

impl<T> FeedReceiver<T> {
    pub async fn recv(&mut self) -> Option<T> {
        let item = self.receiver.recv().await;
        if let Some(metrics) = &self.metrics {
            metrics.set_queue_depth(self.capacity - self.receiver.capacity());
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::tracked_channel;

    #[tokio::test]
    async fn channel_delivers_in_order() {
        let (tx, mut rx) = tracked_channel(4, None);
        tx.try_send(1).unwrap();
        tx.try_send(2).unwrap();
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
    }

    #[tokio::test]
    async fn full_channel_rejects_without_blocking() {
        let (tx, mut rx) = tracked_channel(1, None);
        tx.try_send(1).unwrap();
        assert!(tx.try_send(2).is_err());
        assert_eq!(rx.recv().await, Some(1));
        tx.try_send(3).unwrap();
        assert_eq!(rx.recv().await, Some(3));
    }
}
