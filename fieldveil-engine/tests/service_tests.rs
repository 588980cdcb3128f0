mod common;

use common::Fixture;
use fieldveil_engine::ReloadOutcome;
use fieldveil_types::{AuditOutcome, Operation, ProfileId, SortDirection};
use pretty_assertions::assert_eq;
use serde_json::json;

fn p(id: &str) -> ProfileId {
    ProfileId::new(id)
}

// ── permissive body handling ──────────────────────────────────────

#[test]
fn empty_and_trivial_bodies_pass_through_byte_for_byte() {
    let fixture = Fixture::standard();
    fixture.add_profile("p1", &[("a", Operation::Protect, "T1")]);

    for body in ["", "   ", "\n\t", "null", "{}", "[{}]", " {} ", " null "] {
        let outcome = fixture.service.transform(&p("p1"), body);
        assert_eq!(outcome.body, body);
        assert!(outcome.report.is_none());
    }
    assert!(fixture.audit.is_empty());
}

#[test]
fn unparsable_body_passes_through() {
    let fixture = Fixture::standard();
    fixture.add_profile("p1", &[("a", Operation::Protect, "T1")]);

    let body = "{ definitely not json ]";
    let outcome = fixture.service.transform(&p("p1"), body);
    assert_eq!(outcome.body, body);
    assert!(outcome.report.is_none());
}

#[test]
fn unknown_profile_passes_through() {
    let fixture = Fixture::standard();
    let body = r#"{"user":{"ssn":"123-45-6789"}}"#;
    let outcome = fixture.service.transform(&p("no-such-profile"), body);
    assert_eq!(outcome.body, body);
    assert!(outcome.report.is_none());
}

#[test]
fn config_feed_error_passes_through() {
    let fixture = Fixture::standard();
    fixture.add_profile("p1", &[("a", Operation::Protect, "T1")]);
    fixture.loader.set_fail_rules(true);

    let body = r#"{"a":"value"}"#;
    let outcome = fixture.service.transform(&p("p1"), body);
    assert_eq!(outcome.body, body);
    assert!(outcome.report.is_none());
}

// ── end to end ────────────────────────────────────────────────────

#[test]
fn protect_rewrites_exactly_the_ruled_leaf() {
    let fixture = Fixture::standard();
    fixture.add_profile("p1", &[("user.ssn", Operation::Protect, "T1")]);

    let body = r#"{"user":{"ssn":"123-45-6789","tags":["a","b"]}}"#;
    let outcome = fixture.service.transform(&p("p1"), body);
    let report = outcome.report.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.rules_applied, 1);

    let doc: serde_json::Value = serde_json::from_str(&outcome.body).unwrap();
    let ssn = doc["user"]["ssn"].as_str().unwrap();
    assert_ne!(ssn, "123-45-6789");
    assert_eq!(ssn.len(), 11);
    assert_eq!(&ssn[3..4], "-");
    assert_eq!(&ssn[6..7], "-");
    assert_eq!(doc["user"]["tags"], json!(["a", "b"]));

    let events = fixture.audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, AuditOutcome::Success);
    assert_eq!(events[0].path.as_str(), "user.ssn");
}

#[test]
fn protect_then_access_roundtrips_through_the_service() {
    let fixture = Fixture::standard();
    fixture.add_profile("p-protect", &[("user.ssn", Operation::Protect, "T1")]);
    fixture.add_profile("p-access", &[("user.ssn", Operation::Access, "T1")]);

    let body = r#"{"user":{"ssn":"123-45-6789"}}"#;
    let protected = fixture.service.transform(&p("p-protect"), body);
    let restored = fixture.service.transform(&p("p-access"), &protected.body);

    let doc: serde_json::Value = serde_json::from_str(&restored.body).unwrap();
    assert_eq!(doc["user"]["ssn"], json!("123-45-6789"));
}

#[test]
fn object_key_order_is_preserved() {
    let fixture = Fixture::standard();
    fixture.add_profile("p1", &[("a", Operation::Protect, "T1")]);

    let body = r#"{"zulu":1,"a":"xy","alpha":2}"#;
    let outcome = fixture.service.transform(&p("p1"), body);
    let zulu = outcome.body.find("zulu").unwrap();
    let a = outcome.body.find("\"a\"").unwrap();
    let alpha = outcome.body.find("alpha").unwrap();
    assert!(zulu < a && a < alpha);
}

#[test]
fn zero_matching_paths_is_a_quiet_pass() {
    let fixture = Fixture::standard();
    fixture.add_profile("p1", &[("nothing.here", Operation::Protect, "T1")]);

    let body = r#"{"user":{"name":"Ann"}}"#;
    let outcome = fixture.service.transform(&p("p1"), body);
    let report = outcome.report.unwrap();
    assert_eq!(report.rules_quiet, 1);

    let doc: serde_json::Value = serde_json::from_str(&outcome.body).unwrap();
    assert_eq!(doc, serde_json::from_str::<serde_json::Value>(body).unwrap());
}

// ── sorting ───────────────────────────────────────────────────────

#[test]
fn array_output_is_sorted_when_the_profile_asks() {
    let fixture = Fixture::standard();
    fixture.add_profile("p1", &[("secret", Operation::Protect, "T1")]);
    fixture.add_sort_rule("p1", "name", SortDirection::Ascending);

    let body = r#"[{"name":"cleo","secret":"x1"},{"name":"ann","secret":"x2"},{"name":"bo","secret":"x3"}]"#;
    let outcome = fixture.service.transform(&p("p1"), body);
    let doc: serde_json::Value = serde_json::from_str(&outcome.body).unwrap();

    let names: Vec<&str> = doc
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["ann", "bo", "cleo"]);
}

#[test]
fn sort_runs_after_transforms_so_protected_keys_order_by_ciphertext() {
    let fixture = Fixture::standard();
    fixture.add_profile("p1", &[("name", Operation::Protect, "T1")]);
    fixture.add_sort_rule("p1", "name", SortDirection::Ascending);

    let body = r#"[{"name":"bbb"},{"name":"aaa"}]"#;
    let outcome = fixture.service.transform(&p("p1"), body);
    let doc: serde_json::Value = serde_json::from_str(&outcome.body).unwrap();

    let names: Vec<&str> = doc
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    // Whatever the ciphertexts are, the output is ordered by them.
    assert!(names[0] <= names[1]);
    assert_ne!(names[0], "aaa");
    assert_ne!(names[1], "bbb");
}

#[test]
fn sort_rule_on_object_root_is_ignored() {
    let fixture = Fixture::standard();
    fixture.add_profile("p1", &[("a", Operation::Protect, "T1")]);
    fixture.add_sort_rule("p1", "a", SortDirection::Ascending);

    let body = r#"{"a":"value"}"#;
    let outcome = fixture.service.transform(&p("p1"), body);
    assert!(outcome.report.unwrap().is_clean());
}

#[test]
fn transform_value_sorts_parsed_documents_too() {
    let fixture = Fixture::standard();
    fixture.add_profile("p1", &[("secret", Operation::Protect, "T1")]);
    fixture.add_sort_rule("p1", "k", SortDirection::Descending);

    let mut doc = json!([{"k": "1"}, {"k": "3"}, {"k": "2"}]);
    let report = fixture.service.transform_value(&p("p1"), &mut doc);
    assert!(report.is_some());
    assert_eq!(doc, json!([{"k": "3"}, {"k": "2"}, {"k": "1"}]));
}

// ── probe and reload ──────────────────────────────────────────────

#[test]
fn probe_protects_a_sample_with_the_first_handle() {
    let fixture = Fixture::standard();
    let probed = fixture.service.probe("1234").unwrap();
    assert_ne!(probed, "1234");
    assert_eq!(probed.len(), 4);
}

#[test]
fn probe_is_none_without_handles() {
    let fixture = Fixture::new(); // never initialized
    assert!(fixture.service.probe("1234").is_none());
}

#[test]
fn service_reload_invalidates_the_config_cache() {
    let fixture = Fixture::standard();
    fixture.add_profile("p1", &[("a", Operation::Protect, "T1")]);

    // Prime the cache.
    fixture.service.transform(&p("p1"), r#"{"a":"x"}"#);
    assert_eq!(fixture.loader.rule_loads(), 1);

    // Rules change; a reload makes them visible immediately.
    fixture.add_profile("p1", &[("b", Operation::Protect, "T1")]);
    let outcome = fixture.service.reload().unwrap();
    assert!(matches!(outcome, ReloadOutcome::Completed(_)));

    let result = fixture.service.transform(&p("p1"), r#"{"a":"x","b":"y"}"#);
    let doc: serde_json::Value = serde_json::from_str(&result.body).unwrap();
    assert_eq!(doc["a"], json!("x")); // old rule gone
    assert_ne!(doc["b"], json!("y")); // new rule live
    assert_eq!(fixture.loader.rule_loads(), 2);
}

#[test]
fn passthrough_document_is_byte_identical() {
    let fixture = Fixture::standard();
    // Profile exists but its path matches nothing: the parsed document is
    // reserialized, so formatting may change, but an unknown profile's
    // body must come back untouched.
    let body = r#"{ "weird":   [1, 2,    3] }"#;
    let outcome = fixture.service.transform(&p("unknown"), body);
    assert_eq!(outcome.body, body);
}
