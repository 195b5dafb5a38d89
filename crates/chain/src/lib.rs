pub mod channel;
pub mod client;
pub mod fetcher;
pub mod metrics;
pub mod pending;
pub mod reconnect;

pub use channel::FeedReceiver;
pub use client::NodeClient;
pub use fetcher::TxFetcher;
pub use metrics::ChannelMetrics;
pub use pending::{FeedConnection, FeedConnector, PendingTxStream, WsFeedConnector};
pub use reconnect::ReconnectConfig;
