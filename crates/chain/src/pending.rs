use crate::channel::{tracked_channel, FeedReceiver};
use crate::metrics::ChannelMetrics;
use crate::reconnect::ReconnectConfig;
use alloy::primitives::B256;
use alloy::providers::{Provider, ProviderBuilder};
use anyhow::Result;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// One live feed connection: the chain id observed at connect time and the
/// hash stream. Dropping it tears the whole connection down.
pub struct FeedConnection {
    pub chain_id: u64,
    pub hashes: BoxStream<'static, B256>,
}

/// Connect side of the feed; the WebSocket connector implements it, tests
/// drive the supervised loop with fakes.
#[async_trait]
pub trait FeedConnector: Send + Sync + 'static {
    async fn connect(&self) -> Result<FeedConnection>;
}

pub struct WsFeedConnector {
    url: String,
}

impl WsFeedConnector {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

#[async_trait]
impl FeedConnector for WsFeedConnector {
    async fn connect(&self) -> Result<FeedConnection> {
        let provider = ProviderBuilder::new().connect(&self.url).await?.erased();
        let chain_id = provider.get_chain_id().await?;
        let sub = provider.subscribe_pending_transactions().await?;
        // The provider rides inside the stream so the connection lives
        // exactly as long as the hashes do.
        let hashes = sub
            .into_stream()
            .map(move |hash| {
                let _keep = &provider;
                hash
            })
            .boxed();
        Ok(FeedConnection { chain_id, hashes })
    }
}

/// Supervised pending-transaction subscription. Owns its connection
/// exclusively; on any failure the connection is dropped wholesale and the
/// full connect/subscribe sequence restarts after the fixed delay.
pub struct PendingTxStream<C> {
    connector: C,
    channel_size: usize,
    reconnect: ReconnectConfig,
    metrics: Option<ChannelMetrics>,
}

impl PendingTxStream<WsFeedConnector> {
    pub fn new(
        ws_url: String,
        channel_size: usize,
        reconnect: ReconnectConfig,
        metrics: Option<ChannelMetrics>,
    ) -> Self {
        Self::with_connector(WsFeedConnector::new(ws_url), channel_size, reconnect, metrics)
    }
}

impl<C> PendingTxStream<C>
where
    C: FeedConnector,
{
    pub fn with_connector(
        connector: C,
        channel_size: usize,
        reconnect: ReconnectConfig,
        metrics: Option<ChannelMetrics>,
    ) -> Self {
        Self {
            connector,
            channel_size,
            reconnect,
            metrics,
        }
    }

    pub fn spawn(self) -> FeedReceiver<B256> {
        let Self {
            connector,
            channel_size,
            reconnect,
            metrics,
        } = self;
        let (tx, rx) = tracked_channel(channel_size, metrics);
        let delay = reconnect.delay;

        tokio::spawn(async move {
            loop {
                let mut conn = match connector.connect().await {
                    Ok(conn) => conn,
                    Err(err) => {
                        error!(?err, delay_secs = delay.as_secs(), "feed connect failed");
                        sleep(delay).await;
                        continue;
                    }
                };

                // Logged on every (re)connect so an operator can spot a
                // silent network switch behind the endpoint.
                info!(chain_id = conn.chain_id, "pending feed connected");

                while let Some(hash) = conn.hashes.next().await {
                    match tx.try_send(hash) {
                        Ok(()) => {}
                        // Feed order is best-effort; dropping under
                        // backpressure costs timeliness, not correctness.
                        Err(TrySendError::Full(_)) => {}
                        Err(TrySendError::Closed(_)) => {
                            warn!("pending feed receiver dropped; stopping");
                            return;
                        }
                    }
                }

                warn!(
                    delay_secs = delay.as_secs(),
                    "pending feed disconnected; reconnecting"
                );
                drop(conn);
                sleep(delay).await;
            }
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Fails the first `fail_first` connects, then serves one batch of
    /// hashes per successful connect; once the batches run out the stream
    /// stays open forever.
    struct FlakyConnector {
        calls: Arc<AtomicUsize>,
        fail_first: usize,
        batches: Mutex<VecDeque<Vec<B256>>>,
    }

    #[async_trait]
    impl FeedConnector for FlakyConnector {
        async fn connect(&self) -> Result<FeedConnection> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                anyhow::bail!("connection refused");
            }
            let hashes = match self.batches.lock().unwrap().pop_front() {
                Some(batch) => stream::iter(batch).boxed(),
                None => stream::pending().boxed(),
            };
            Ok(FeedConnection {
                chain_id: 31_337,
                hashes,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn each_failed_connect_retries_after_the_fixed_delay() {
        let calls = Arc::new(AtomicUsize::new(0));
        let connector = FlakyConnector {
            calls: calls.clone(),
            fail_first: 3,
            batches: Mutex::new(VecDeque::from([vec![B256::repeat_byte(0x01)]])),
        };
        let stream = PendingTxStream::with_connector(
            connector,
            8,
            ReconnectConfig::from_secs(3),
            None,
        );
        let started = tokio::time::Instant::now();
        let mut feed = stream.spawn();

        assert_eq!(feed.recv().await, Some(B256::repeat_byte(0x01)));
        // 3 refused connects, each followed by the 3s delay, then success.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(started.elapsed() >= Duration::from_secs(9));
    }

    #[tokio::test(start_paused = true)]
    async fn delivery_resumes_after_the_feed_closes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let connector = FlakyConnector {
            calls: calls.clone(),
            fail_first: 0,
            batches: Mutex::new(VecDeque::from([
                vec![B256::repeat_byte(0x01)],
                vec![B256::repeat_byte(0x02)],
            ])),
        };
        let stream = PendingTxStream::with_connector(
            connector,
            8,
            ReconnectConfig::from_secs(3),
            None,
        );
        let started = tokio::time::Instant::now();
        let mut feed = stream.spawn();

        assert_eq!(feed.recv().await, Some(B256::repeat_byte(0x01)));
        // The first batch's stream ends after one hash; the loop must wait
        // out the delay and reconnect before the second batch arrives.
        assert_eq!(feed.recv().await, Some(B256::repeat_byte(0x02)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(3));
    }
}
