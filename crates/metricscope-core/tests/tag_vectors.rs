//! Lenient tag parsing vectors.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use metricscope_core::MetricId;


#[test]
fn lenient_tag_vectors() {
    for v in vector_loader::load("tags_lenient.json") {
        let res = MetricId::from_raw(v.name.clone(), &v.raw_tags);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let id = res.expect("expected ok id");
        let got: Vec<(String, String)> = id
            .tags()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(got, v.expect_tags, "vector={}", v.description);
        assert_eq!(id.name(), v.name, "vector={}", v.description);
    }
}
