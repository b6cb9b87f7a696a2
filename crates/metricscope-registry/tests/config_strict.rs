#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use metricscope_registry::{config, MetricsContext};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
histogram:
  reservoir_sise: 2048 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.registry.scopes, vec!["application", "base", "vendor"]);
    assert_eq!(cfg.histogram.reservoir_size, 1028);
    assert_eq!(cfg.histogram.percentiles.len(), 6);
}

#[test]
fn unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn reservoir_size_bounds() {
    let err = config::load_from_str("version: 1\nhistogram:\n  reservoir_size: 4\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn percentiles_must_be_fractions() {
    let err = config::load_from_str("version: 1\nhistogram:\n  percentiles: [0.5, 95]\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn global_tags_are_strict() {
    let bad = "version: 1\nregistry:\n  global_tags: [\"novalue\"]\n";
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");

    let bad_key = "version: 1\nregistry:\n  global_tags: [\"1app=shop\"]\n";
    let err = config::load_from_str(bad_key).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn duplicate_scopes_rejected() {
    let bad = "version: 1\nregistry:\n  scopes: [application, application]\n";
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn configured_scopes_are_created_eagerly() {
    let cfg = config::load_from_str(
        r#"
version: 1
registry:
  scopes: [application, custom]
  global_tags: ["app=shop"]
"#,
    )
    .unwrap();
    let ctx = MetricsContext::new(cfg).unwrap();
    assert_eq!(ctx.scopes().list(), vec!["application", "custom"]);

    let c = ctx.registry("custom").unwrap().counter("hits", Default::default()).unwrap();
    c.inc();
    let ids = ctx.registry("custom").unwrap().metric_ids();
    assert_eq!(ids.iter().next().unwrap().tags().get("app"), Some("shop"));
}

#[test]
fn missing_file_is_a_config_error() {
    let err = config::load_from_file("does/not/exist.yaml").expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}
