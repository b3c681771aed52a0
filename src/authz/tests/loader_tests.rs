//! Model and policy file loading tests

use std::io::Write;
use tempfile::NamedTempFile;
use warden_authz::{AuthzError, Enforcer, Model, PolicySource, Request, DEFAULT_MODEL_CONF};

fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_from_files() {
    let model = temp_file(DEFAULT_MODEL_CONF);
    let policy = temp_file(
        "p, bob, /dataset2/folder1/*, POST\n\
         g, carol, bob\n",
    );

    let enforcer = Enforcer::from_files(model.path(), policy.path()).unwrap();

    assert!(enforcer.enforce(&Request::new("carol", "/dataset2/folder1/item1", "POST")));
    assert!(!enforcer.enforce(&Request::new("carol", "/dataset2/folder1/item1", "GET")));
}

#[test]
fn test_missing_file_is_io_error() {
    let model = temp_file(DEFAULT_MODEL_CONF);

    let err = Enforcer::from_files(model.path(), "/nonexistent/warden/policy.csv").unwrap_err();
    assert!(matches!(err, AuthzError::Io(_)));
}

#[test]
fn test_malformed_policy_fails_load() {
    let model = temp_file(DEFAULT_MODEL_CONF);
    let policy = temp_file("p, alice, /dataset1/*, GET\np, alice, /data*, GET\n");

    match Enforcer::from_files(model.path(), policy.path()) {
        Err(AuthzError::PolicyFormat { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected PolicyFormat, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_malformed_model_fails_load() {
    let model = temp_file("[matchers]\nm = r.sub == p.sub\n");

    assert!(matches!(
        Model::from_file(model.path()),
        Err(AuthzError::PolicyFormat { .. })
    ));
}

#[test]
fn test_exact_model_disables_wildcards_and_roles() {
    let model = Model::from_conf(
        "[request_definition]\n\
         r = sub, obj, act\n\
         [policy_definition]\n\
         p = sub, obj, act\n\
         [policy_effect]\n\
         e = some(where (p.eft == allow))\n\
         [matchers]\n\
         m = r.sub == p.sub && r.obj == p.obj && (r.act == p.act || p.act == \"*\")\n",
    )
    .unwrap();
    let policy = PolicySource::parse(
        "p, alice, /dataset1/*, *\n\
         p, admin, /dataset1/resource1, GET\n\
         g, bob, admin\n",
    )
    .unwrap();

    let enforcer = Enforcer::with_policy(model, policy);

    assert!(enforcer.enforce(&Request::new("alice", "/dataset1/*", "DELETE")));
    assert!(!enforcer.enforce(&Request::new("alice", "/dataset1/resource1", "GET")));
    assert!(!enforcer.enforce(&Request::new("bob", "/dataset1/resource1", "GET")));
}
