//! metricscope demo
//!
//! - Load `metricscope.yaml` when present, defaults otherwise
//! - Instrument a sample `Orders` class (counted + timed members, one gauge)
//! - Drive it from concurrent tasks and log a summary per metric

use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use metricscope_core::error::Result;
use metricscope_core::{Metric, MetricKind};
use metricscope_registry::config::{self, MetricsConfig};
use metricscope_registry::instrument::{resolve, Annotation, CountedSite, GaugeSite, Member, Placement, TimedSite};
use metricscope_registry::{MetricFilter, MetricsContext};

const CONFIG_PATH: &str = "metricscope.yaml";
const ORDERS: &str = "demo.shop.Orders";

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, code = e.code().as_str(), "metricscope demo failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cfg = if Path::new(CONFIG_PATH).exists() {
        config::load_from_file(CONFIG_PATH)?
    } else {
        tracing::info!(path = CONFIG_PATH, "config not found, using defaults");
        MetricsConfig::default()
    };
    let ctx = MetricsContext::new(cfg)?;
    tracing::info!(scopes = ?ctx.scopes().list(), "metricscope demo starting");

    let members = [Member::method(ORDERS, "create"), Member::method(ORDERS, "cancel")];
    let counted = CountedSite::bind_class(ctx.scopes(), &Annotation::new().tags(&["tier=demo"]), &members)?;

    let timed = TimedSite::bind(
        ctx.scopes(),
        &resolve(
            &Annotation::new().name("checkout").unit("nanoseconds"),
            Placement::Member,
            &Member::method(ORDERS, "checkout"),
            MetricKind::Timer,
        )?,
    )?;

    let pending = Arc::new(AtomicI64::new(0));
    let pending_gauge = Arc::clone(&pending);
    GaugeSite::bind(
        ctx.scopes(),
        &resolve(
            &Annotation::new().name("pending").absolute(true),
            Placement::Member,
            &Member::method(ORDERS, "pending"),
            MetricKind::Gauge,
        )?,
        move || pending_gauge.load(Ordering::Relaxed),
    )?;

    let mut tasks = Vec::new();
    for worker in 0..4u64 {
        let counted = counted.clone();
        let timed = timed.clone();
        let pending = Arc::clone(&pending);
        tasks.push(tokio::spawn(async move {
            for i in 0..25u64 {
                let site = &counted[(i % 2) as usize];
                site.invoke(|| pending.fetch_add(1, Ordering::Relaxed))?;
                timed
                    .invoke_async(tokio::time::sleep(Duration::from_micros(100 * (worker + 1))))
                    .await?;
                pending.fetch_sub(1, Ordering::Relaxed);
            }
            Ok::<(), metricscope_core::MetricsError>(())
        }));
    }
    for t in tasks {
        match t.await {
            Ok(res) => res?,
            Err(e) => tracing::warn!(error = %e, "worker task failed"),
        }
    }

    log_summary(&ctx)
}

fn log_summary(ctx: &MetricsContext) -> Result<()> {
    let percentiles = ctx.cfg().histogram.percentiles.clone();
    for scope in ctx.scopes().list() {
        let registry = ctx.registry(&scope)?;
        for (id, metric) in registry.metrics(&MetricFilter::all()) {
            match metric {
                Metric::Counter(c) => tracing::info!(%scope, metric = %id, count = c.count(), "counter"),
                Metric::Gauge(g) => match g.value() {
                    Ok(v) => tracing::info!(%scope, metric = %id, value = %v, "gauge"),
                    Err(e) => tracing::warn!(%scope, metric = %id, error = %e, "gauge"),
                },
                Metric::Histogram(h) => {
                    let s = h.snapshot();
                    tracing::info!(%scope, metric = %id, count = h.count(), mean = s.mean(), p99 = s.value(0.99), "histogram");
                }
                Metric::Timer(t) => {
                    let s = t.snapshot();
                    let quantiles: Vec<String> = s
                        .percentile_values(&percentiles)
                        .iter()
                        .map(|p| format!("p{}={:.0}ns", p.percentile * 100.0, p.value))
                        .collect();
                    tracing::info!(
                        %scope,
                        metric = %id,
                        count = t.count(),
                        elapsed = ?t.elapsed_time(),
                        quantiles = %quantiles.join(" "),
                        "timer"
                    );
                }
            }
        }
    }
    Ok(())
}
