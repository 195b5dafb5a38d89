use crate::filter::TargetFilter;
use crate::metrics::{spawn_metrics_server, BotMetrics};
use alloy::primitives::B256;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use forerun_chain::{NodeClient, PendingTxStream, ReconnectConfig, TxFetcher};
use forerun_core::config::{AppConfig, RaceConfig};
use forerun_core::dedupe::DedupeCache;
use forerun_core::types::PendingTx;
use forerun_core::utils::now_ms;
use forerun_executor::{FeeBump, RaceTxBuilder, TxOutcome, TxSender};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

const SUMMARY_INTERVAL_MS: u64 = 30_000;

/// Lookup side of the pipeline; the node client implements it, tests mock it.
#[async_trait]
pub trait TxLookup: Send + Sync + 'static {
    async fn lookup(&self, hash: B256) -> Result<Option<PendingTx>>;
}

/// Submission side of the pipeline. `submit` broadcasts and returns the race
/// hash; `confirm` waits out the receipt.
#[async_trait]
pub trait RaceSubmitter: Send + Sync + 'static {
    async fn submit(&self, tx: TransactionRequest) -> Result<B256>;
    async fn confirm(&self, hash: B256) -> Result<TxOutcome>;
}

#[async_trait]
impl TxLookup for TxFetcher {
    async fn lookup(&self, hash: B256) -> Result<Option<PendingTx>> {
        self.fetch(hash).await
    }
}

#[async_trait]
impl RaceSubmitter for TxSender {
    async fn submit(&self, tx: TransactionRequest) -> Result<B256> {
        self.send(tx).await
    }

    async fn confirm(&self, hash: B256) -> Result<TxOutcome> {
        TxSender::confirm(self, hash).await
    }
}

#[derive(Default)]
pub struct Counters {
    hashes_seen: AtomicU64,
    dedupe_dropped: AtomicU64,
    lookup_misses: AtomicU64,
    lookup_errors: AtomicU64,
    matches: AtomicU64,
    unraceable: AtomicU64,
    races_sent: AtomicU64,
    confirmed: AtomicU64,
    lost: AtomicU64,
    submit_failures: AtomicU64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub hashes_seen: u64,
    pub dedupe_dropped: u64,
    pub lookup_misses: u64,
    pub lookup_errors: u64,
    pub matches: u64,
    pub unraceable: u64,
    pub races_sent: u64,
    pub confirmed: u64,
    pub lost: u64,
    pub submit_failures: u64,
}

impl Counters {
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            hashes_seen: self.hashes_seen.load(Ordering::Relaxed),
            dedupe_dropped: self.dedupe_dropped.load(Ordering::Relaxed),
            lookup_misses: self.lookup_misses.load(Ordering::Relaxed),
            lookup_errors: self.lookup_errors.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
            unraceable: self.unraceable.load(Ordering::Relaxed),
            races_sent: self.races_sent.load(Ordering::Relaxed),
            confirmed: self.confirmed.load(Ordering::Relaxed),
            lost: self.lost.load(Ordering::Relaxed),
            submit_failures: self.submit_failures.load(Ordering::Relaxed),
        }
    }
}

impl CounterSnapshot {
    fn delta(&self, previous: &CounterSnapshot) -> CounterSnapshot {
        CounterSnapshot {
            hashes_seen: self.hashes_seen.saturating_sub(previous.hashes_seen),
            dedupe_dropped: self.dedupe_dropped.saturating_sub(previous.dedupe_dropped),
            lookup_misses: self.lookup_misses.saturating_sub(previous.lookup_misses),
            lookup_errors: self.lookup_errors.saturating_sub(previous.lookup_errors),
            matches: self.matches.saturating_sub(previous.matches),
            unraceable: self.unraceable.saturating_sub(previous.unraceable),
            races_sent: self.races_sent.saturating_sub(previous.races_sent),
            confirmed: self.confirmed.saturating_sub(previous.confirmed),
            lost: self.lost.saturating_sub(previous.lost),
            submit_failures: self.submit_failures.saturating_sub(previous.submit_failures),
        }
    }
}

struct CounterSummary {
    last: CounterSnapshot,
}

impl CounterSummary {
    fn log(&mut self, current: CounterSnapshot) {
        let delta = current.delta(&self.last);
        self.last = current;
        info!(
            hashes = delta.hashes_seen,
            dedupe_dropped = delta.dedupe_dropped,
            lookup_misses = delta.lookup_misses,
            lookup_errors = delta.lookup_errors,
            matches = delta.matches,
            unraceable = delta.unraceable,
            races_sent = delta.races_sent,
            confirmed = delta.confirmed,
            lost = delta.lost,
            submit_failures = delta.submit_failures,
            "counter summary (last 30s)"
        );
    }
}

/// One reaction per matched transaction, end to end: lookup, filter, derive,
/// submit, await outcome. Every failure is absorbed and logged here so a bad
/// race can never touch the delivery loop or a sibling reaction.
pub struct ReactionEngine<L, S> {
    filter: TargetFilter,
    builder: RaceTxBuilder,
    lookup: L,
    submitter: S,
    counters: Arc<Counters>,
    metrics: Option<Arc<BotMetrics>>,
}

impl<L, S> ReactionEngine<L, S>
where
    L: TxLookup,
    S: RaceSubmitter,
{
    pub fn new(
        filter: TargetFilter,
        builder: RaceTxBuilder,
        lookup: L,
        submitter: S,
        counters: Arc<Counters>,
        metrics: Option<Arc<BotMetrics>>,
    ) -> Self {
        Self {
            filter,
            builder,
            lookup,
            submitter,
            counters,
            metrics,
        }
    }

    pub async fn handle(&self, hash: B256) {
        let tx = match self.lookup.lookup(hash).await {
            Ok(Some(tx)) => tx,
            Ok(None) => {
                // Already mined or evicted; a normal miss, not an error.
                self.counters.lookup_misses.fetch_add(1, Ordering::Relaxed);
                if let Some(metrics) = &self.metrics {
                    metrics.lookup_misses.inc();
                }
                return;
            }
            Err(err) => {
                self.counters.lookup_errors.fetch_add(1, Ordering::Relaxed);
                warn!(%hash, ?err, "tx lookup failed");
                return;
            }
        };

        if !self.filter.is_target(&tx) {
            return;
        }
        self.counters.matches.fetch_add(1, Ordering::Relaxed);
        if let Some(metrics) = &self.metrics {
            metrics.matches_total.inc();
        }
        info!(%hash, from = %tx.from, to = ?tx.to, "target call observed; racing");

        let Some(race_tx) = self.builder.build(&tx) else {
            self.counters.unraceable.fetch_add(1, Ordering::Relaxed);
            debug!(%hash, "original has no 1559 fee pair or recipient; not raceable");
            return;
        };

        let race_hash = match self.submitter.submit(race_tx).await {
            Ok(race_hash) => race_hash,
            Err(err) => {
                // Underpriced, nonce conflict, insufficient funds: the
                // opportunity is abandoned, never retried.
                self.counters.submit_failures.fetch_add(1, Ordering::Relaxed);
                if let Some(metrics) = &self.metrics {
                    metrics.failures_total.with_label_values(&["submit"]).inc();
                }
                warn!(target_tx = %hash, ?err, "race submission rejected");
                return;
            }
        };
        self.counters.races_sent.fetch_add(1, Ordering::Relaxed);
        if let Some(metrics) = &self.metrics {
            metrics.races_total.inc();
        }
        let latency_ms = now_ms().saturating_sub(tx.first_seen_ms);
        info!(target_tx = %hash, race_tx = %race_hash, latency_ms, "race submitted");

        match self.submitter.confirm(race_hash).await {
            Ok(TxOutcome::Confirmed { block }) => {
                self.counters.confirmed.fetch_add(1, Ordering::Relaxed);
                if let Some(metrics) = &self.metrics {
                    metrics.confirmed_total.inc();
                }
                info!(race_tx = %race_hash, block, "race confirmed");
            }
            Ok(TxOutcome::Reverted) => {
                self.counters.lost.fetch_add(1, Ordering::Relaxed);
                if let Some(metrics) = &self.metrics {
                    metrics.failures_total.with_label_values(&["reverted"]).inc();
                }
                warn!(race_tx = %race_hash, "race reverted");
            }
            Ok(TxOutcome::TimedOut) => {
                self.counters.lost.fetch_add(1, Ordering::Relaxed);
                if let Some(metrics) = &self.metrics {
                    metrics.failures_total.with_label_values(&["timeout"]).inc();
                }
                warn!(race_tx = %race_hash, "race receipt timed out");
            }
            Err(err) => {
                self.counters.lost.fetch_add(1, Ordering::Relaxed);
                if let Some(metrics) = &self.metrics {
                    metrics.failures_total.with_label_values(&["confirm"]).inc();
                }
                warn!(race_tx = %race_hash, ?err, "race confirmation failed");
            }
        }
    }
}

pub struct Bot {
    cfg: AppConfig,
    engine: Arc<ReactionEngine<TxFetcher, TxSender>>,
    dedupe: DedupeCache<B256>,
    counters: Arc<Counters>,
    metrics: Option<Arc<BotMetrics>>,
}

impl Bot {
    pub async fn new(cfg: AppConfig) -> Result<Self> {
        let signer = load_signer(&cfg.race)?;
        let own_address = signer.address();
        // Address only; the key itself must never reach the logs.
        info!(address = %own_address, "signer loaded");

        let client = NodeClient::connect(&cfg.chain, signer).await?;

        let metrics = if cfg.observability.metrics_enabled {
            let metrics = Arc::new(BotMetrics::new()?);
            if let Err(err) = spawn_metrics_server(&cfg.observability.metrics_bind, metrics.clone())
            {
                warn!(?err, "metrics server failed to start");
            }
            Some(metrics)
        } else {
            None
        };

        let filter = TargetFilter::new(&cfg.watch.target_signature, own_address);
        info!(
            signature = %cfg.watch.target_signature,
            selector = %hex::encode(filter.selector()),
            "target selector armed"
        );

        let bump = FeeBump {
            priority_fee_pct: cfg.race.priority_fee_bump_pct,
            fee_cap_pct: cfg.race.fee_cap_bump_pct,
            gas_limit_pct: cfg.race.gas_limit_bump_pct,
        };
        let builder = RaceTxBuilder::new(own_address, bump);
        let fetcher = TxFetcher::new(client.provider.clone(), cfg.watch.tx_fetch_timeout_ms);
        let sender = TxSender::new(
            client.provider.clone(),
            cfg.race.receipt_poll_interval_ms,
            cfg.race.receipt_timeout_ms,
        );

        let counters = Arc::new(Counters::default());
        let engine = Arc::new(ReactionEngine::new(
            filter,
            builder,
            fetcher,
            sender,
            counters.clone(),
            metrics.clone(),
        ));
        let dedupe = DedupeCache::new(cfg.watch.dedup_capacity, cfg.watch.dedup_ttl_ms);

        Ok(Self {
            cfg,
            engine,
            dedupe,
            counters,
            metrics,
        })
    }

    /// Delivery loop. Never returns under normal operation: the feed task
    /// reconnects forever and each match runs on its own spawned task.
    pub async fn run(mut self) -> Result<()> {
        let stream = PendingTxStream::new(
            self.cfg.chain.rpc_ws.clone(),
            self.cfg.watch.feed_channel_size,
            ReconnectConfig::from_secs(self.cfg.watch.reconnect_delay_secs),
            self.metrics.as_ref().map(|m| m.feed.clone()),
        );
        let mut feed = stream.spawn();

        let mut summary = CounterSummary {
            last: self.counters.snapshot(),
        };
        let mut ticker = interval(Duration::from_millis(SUMMARY_INTERVAL_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                hash = feed.recv() => {
                    let Some(hash) = hash else {
                        return Err(anyhow!("pending feed channel closed"));
                    };
                    self.counters.hashes_seen.fetch_add(1, Ordering::Relaxed);
                    if !self.dedupe.check_and_update(hash, now_ms()) {
                        self.counters.dedupe_dropped.fetch_add(1, Ordering::Relaxed);
                        if let Some(metrics) = &self.metrics {
                            metrics.dedup_hits.inc();
                        }
                        continue;
                    }
                    let engine = self.engine.clone();
                    tokio::spawn(async move {
                        engine.handle(hash).await;
                    });
                }
                _ = ticker.tick() => {
                    summary.log(self.counters.snapshot());
                }
            }
        }
    }
}

fn load_signer(cfg: &RaceConfig) -> Result<PrivateKeySigner> {
    let raw = std::env::var(&cfg.signer_private_key_env)
        .map_err(|_| anyhow!("signing key env var {} is not set", cfg.signer_private_key_env))?;
    let signer = PrivateKeySigner::from_str(raw.trim())
        .map_err(|_| anyhow!("signing key in {} is not a valid key", cfg.signer_private_key_env))?;
    Ok(signer)
}
