use anyhow::Result;
use forerun_chain::ChannelMetrics;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

pub struct BotMetrics {
    registry: Registry,
    pub feed: ChannelMetrics,
    pub dedup_hits: IntCounter,
    pub lookup_misses: IntCounter,
    pub matches_total: IntCounter,
    pub races_total: IntCounter,
    pub confirmed_total: IntCounter,
    pub failures_total: IntCounterVec,
}

impl BotMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let feed = ChannelMetrics::new(&registry, "feed")?;
        let dedup_hits = IntCounter::with_opts(Opts::new(
            "forerun_dedup_hits_total",
            "Replayed feed hashes dropped by the deduper",
        ))?;
        registry.register(Box::new(dedup_hits.clone()))?;
        let lookup_misses = IntCounter::with_opts(Opts::new(
            "forerun_lookup_misses_total",
            "Feed hashes whose transaction was already gone at lookup",
        ))?;
        registry.register(Box::new(lookup_misses.clone()))?;
        let matches_total = IntCounter::with_opts(Opts::new(
            "forerun_matches_total",
            "Pending transactions matching the target call",
        ))?;
        registry.register(Box::new(matches_total.clone()))?;
        let races_total = IntCounter::with_opts(Opts::new(
            "forerun_races_total",
            "Competing transactions broadcast",
        ))?;
        registry.register(Box::new(races_total.clone()))?;
        let confirmed_total = IntCounter::with_opts(Opts::new(
            "forerun_confirmed_total",
            "Competing transactions confirmed on chain",
        ))?;
        registry.register(Box::new(confirmed_total.clone()))?;
        let failures_total = IntCounterVec::new(
            Opts::new("forerun_failures_total", "Race failures by kind"),
            &["kind"],
        )?;
        registry.register(Box::new(failures_total.clone()))?;

        Ok(Self {
            registry,
            feed,
            dedup_hits,
            lookup_misses,
            matches_total,
            races_total,
            confirmed_total,
            failures_total,
        })
    }

    pub fn gather(&self) -> String {
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        let mut buf = Vec::new();
        let _ = encoder.encode(&mf, &mut buf);
        String::from_utf8_lossy(&buf).to_string()
    }
}

pub fn spawn_metrics_server(bind: &str, metrics: Arc<BotMetrics>) -> Result<()> {
    let listener = TcpListener::bind(bind)?;
    let bind = bind.to_string();
    thread::spawn(move || {
        info!(%bind, "metrics server listening");
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(err) = handle_scrape(stream, &metrics) {
                        warn!(?err, "metrics scrape failed");
                    }
                }
                Err(err) => {
                    warn!(?err, "metrics server accept failed");
                }
            }
        }
    });
    Ok(())
}

fn handle_scrape(mut stream: TcpStream, metrics: &BotMetrics) -> Result<()> {
    let mut buffer = [0u8; 512];
    let _ = stream.read(&mut buffer);
    let body = metrics.gather();
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes())?;
    Ok(())
}
