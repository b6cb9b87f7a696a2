#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use metricscope_core::{units, Metadata, Metric, MetricId, MetricKind, Number, Tags};
use metricscope_registry::{MetricFilter, Registry};

fn md(name: &str, kind: MetricKind) -> Metadata {
    Metadata::of(name, kind).unwrap()
}

#[test]
fn register_then_get_returns_same_kind() {
    let reg = Registry::new("application");
    for (name, kind) in [
        ("c", MetricKind::Counter),
        ("h", MetricKind::Histogram),
        ("t", MetricKind::Timer),
    ] {
        let id = MetricId::from_raw(name, &["k=v"]).unwrap();
        let registered = reg.register(md(name, kind), &id).unwrap();
        let got = reg.get(&id).expect("registered metric");
        assert_eq!(got.kind(), kind);
        assert!(got.ptr_eq(&registered));
    }
    assert_eq!(reg.len(), 3);
}

#[test]
fn get_never_creates() {
    let reg = Registry::new("application");
    assert!(reg.get(&MetricId::named("ghost").unwrap()).is_none());
    assert!(reg.is_empty());
}

#[test]
fn identical_reregistration_is_idempotent() {
    let reg = Registry::new("application");
    let id = MetricId::named("requests").unwrap();
    let metadata = Metadata::builder("requests")
        .kind(MetricKind::Counter)
        .description("served requests")
        .build()
        .unwrap();
    let a = reg.register(metadata.clone(), &id).unwrap();
    let b = reg.register(metadata, &id).unwrap();
    assert!(a.ptr_eq(&b));
}

#[test]
fn different_unit_is_a_conflict() {
    let reg = Registry::new("application");
    let id = MetricId::named("requests").unwrap();
    let ms = Metadata::builder("requests").kind(MetricKind::Timer).unit(units::MILLISECONDS).build().unwrap();
    let s = Metadata::builder("requests").kind(MetricKind::Timer).unit(units::SECONDS).build().unwrap();

    reg.register(ms, &id).unwrap();
    let err = reg.register(s, &id).unwrap_err();
    assert_eq!(err.code().as_str(), "DUPLICATE_METRIC");
}

#[test]
fn conflict_applies_across_tag_variants() {
    let reg = Registry::new("application");
    reg.register(md("requests", MetricKind::Counter), &MetricId::from_raw("requests", &["a=1"]).unwrap())
        .unwrap();
    let err = reg
        .register(md("requests", MetricKind::Histogram), &MetricId::from_raw("requests", &["a=2"]).unwrap())
        .unwrap_err();
    assert_eq!(err.code().as_str(), "DUPLICATE_METRIC");
    assert_eq!(reg.len(), 1);
}

#[test]
fn tag_variants_share_metadata() {
    let reg = Registry::new("application");
    let a = reg.counter("hits", Tags::parse(&["path=/a"])).unwrap();
    let b = reg.counter("hits", Tags::parse(&["path=/b"])).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(reg.names().len(), 1);
    assert_eq!(reg.metric_ids().len(), 2);
    assert_eq!(reg.metadata("hits").unwrap().kind(), MetricKind::Counter);
}

#[test]
fn removing_last_variant_frees_the_name() {
    let reg = Registry::new("application");
    let a = MetricId::from_raw("latency", &["path=/a"]).unwrap();
    let b = MetricId::from_raw("latency", &["path=/b"]).unwrap();
    reg.register(md("latency", MetricKind::Timer), &a).unwrap();
    reg.register(md("latency", MetricKind::Timer), &b).unwrap();

    assert!(reg.remove(&a));
    assert!(!reg.remove(&a));
    assert!(reg.metadata("latency").is_some());

    assert!(reg.remove(&b));
    assert!(reg.metadata("latency").is_none());

    let seconds = Metadata::builder("latency").kind(MetricKind::Histogram).unit(units::SECONDS).build().unwrap();
    reg.register(seconds, &a).expect("name is free again");
}

#[test]
fn remove_all_counts_variants() {
    let reg = Registry::new("application");
    for p in ["/a", "/b", "/c"] {
        reg.counter("hits", Tags::parse(&[format!("path={p}")])).unwrap();
    }
    reg.counter("other", Tags::new()).unwrap();
    assert_eq!(reg.remove_all("hits"), 3);
    assert_eq!(reg.remove_all("hits"), 0);
    assert_eq!(reg.len(), 1);
}

#[test]
fn remove_matching_uses_filter() {
    let reg = Registry::new("application");
    reg.counter("a", Tags::new()).unwrap();
    reg.timer("b", Tags::new()).unwrap();
    reg.timer("c", Tags::new()).unwrap();
    assert_eq!(reg.remove_matching(&MetricFilter::by_kind(MetricKind::Timer)), 2);
    assert_eq!(reg.names().into_iter().collect::<Vec<_>>(), vec!["a"]);
}

#[test]
fn convenience_creator_rejects_other_kind() {
    let reg = Registry::new("application");
    reg.counter("x", Tags::new()).unwrap();
    let err = reg.histogram("x", Tags::new()).unwrap_err();
    assert_eq!(err.code().as_str(), "DUPLICATE_METRIC");
}

#[test]
fn convenience_creator_reuses_described_metric() {
    let reg = Registry::new("application");
    let metadata = Metadata::builder("x").kind(MetricKind::Counter).description("described").build().unwrap();
    let id = MetricId::named("x").unwrap();
    let registered = reg.register(metadata, &id).unwrap();
    let c = reg.counter("x", Tags::new()).unwrap();
    assert!(registered.ptr_eq(&Metric::Counter(c)));
    assert_eq!(reg.metadata("x").unwrap().description(), Some("described"));
}

#[test]
fn register_metric_keeps_existing_instance() {
    let reg = Registry::new("application");
    let id = MetricId::named("jobs").unwrap();
    let first = Metric::Counter(Arc::new(metricscope_core::Counter::new()));
    let second = Metric::Counter(Arc::new(metricscope_core::Counter::new()));
    let a = reg.register_metric(md("jobs", MetricKind::Counter), &id, first.clone()).unwrap();
    let b = reg.register_metric(md("jobs", MetricKind::Counter), &id, second).unwrap();
    assert!(a.ptr_eq(&first));
    assert!(b.ptr_eq(&first));

    let err = reg
        .register_metric(md("jobs", MetricKind::Timer), &id, first)
        .unwrap_err();
    assert_eq!(err.code().as_str(), "INVALID_ARGUMENT");
}

#[test]
fn snapshot_is_sorted_and_restartable() {
    let reg = Registry::new("application");
    reg.counter("b", Tags::new()).unwrap();
    reg.counter("a", Tags::parse(&["z=1"])).unwrap();
    reg.counter("a", Tags::parse(&["k=1"])).unwrap();

    let snapshot = reg.metrics(&MetricFilter::all());
    let first: Vec<String> = snapshot.keys().map(|id| id.to_string()).collect();
    let second: Vec<String> = snapshot.keys().map(|id| id.to_string()).collect();
    assert_eq!(first, vec!["a{k=\"1\"}", "a{z=\"1\"}", "b"]);
    assert_eq!(first, second);

    // Later mutation does not touch an existing snapshot.
    reg.remove_all("a");
    assert_eq!(snapshot.len(), 3);
    assert_eq!(reg.len(), 1);
}

#[test]
fn typed_views_filter_by_kind() {
    let reg = Registry::new("application");
    reg.counter("c", Tags::new()).unwrap();
    reg.histogram("h", Tags::new()).unwrap();
    reg.timer("t", Tags::new()).unwrap();
    reg.gauge("g", Tags::new(), || 1i64).unwrap();

    let all = MetricFilter::all();
    assert_eq!(reg.counters(&all).len(), 1);
    assert_eq!(reg.histograms(&all).len(), 1);
    assert_eq!(reg.timers(&all).len(), 1);
    assert_eq!(reg.gauges(&all).len(), 1);
    assert_eq!(reg.metrics(&MetricFilter::by_name("h")).len(), 1);
}

#[test]
fn gauge_reads_producer_without_mutation() {
    let reg = Registry::new("application");
    let g = reg.gauge("answer", Tags::new(), || 42i64).unwrap();
    let before = reg.metric_ids();
    for _ in 0..3 {
        assert_eq!(g.value().unwrap(), Number::Int(42));
    }
    assert_eq!(reg.metric_ids(), before);

    g.rebind(|| 7i64);
    let again = reg.gauge_at(&MetricId::named("answer").unwrap()).unwrap();
    assert_eq!(again.value().unwrap(), Number::Int(7));
}

#[test]
fn gauge_tracks_bound_state() {
    let reg = Registry::new("application");
    let state = Arc::new(AtomicI64::new(0));
    let s = Arc::clone(&state);
    let id = MetricId::named("GaugeBean.gaugeMethod").unwrap();
    reg.register_gauge(md("GaugeBean.gaugeMethod", MetricKind::Gauge), &id, move || s.load(Ordering::Relaxed))
        .unwrap();

    let gauge = reg.gauge_at(&id).expect("gauge registered");
    assert_eq!(gauge.value().unwrap(), Number::Int(0));
    state.store(1_234_567_890_123, Ordering::Relaxed);
    assert_eq!(gauge.value().unwrap(), Number::Int(1_234_567_890_123));
}

#[test]
fn gauge_producer_failure_surfaces() {
    let reg = Registry::new("application");
    let id = MetricId::named("broken").unwrap();
    let g = reg
        .register_gauge_fallible(md("broken", MetricKind::Gauge), &id, || Err("sensor offline".into()))
        .unwrap();
    let err = g.value().unwrap_err();
    assert_eq!(err.code().as_str(), "METRIC_EVALUATION");
    assert!(reg.get(&id).is_some());
}

#[test]
fn register_gauge_rejects_non_gauge_metadata() {
    let reg = Registry::new("application");
    let id = MetricId::named("g").unwrap();
    let err = reg.register_gauge(md("g", MetricKind::Counter), &id, || 1i64).unwrap_err();
    assert_eq!(err.code().as_str(), "INVALID_ARGUMENT");
}
