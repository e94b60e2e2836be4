mod common;

use std::collections::HashSet;

use common::{harness, harness_with, ns};
use kestrel_labels::{FieldSelector, Selector};
use kestrel_quota::{match_resource_quota, quota_store_config, ResourceQuota};
use kestrel_registry::{Deleted, Predicate, RegistryError, StoreConfig};
use kestrel_types::{RequestContext, ResourceVersion};

// ---- create / get ----

#[tokio::test]
async fn create_get_and_stale_update() {
    let h = harness();
    let ctx = ns("ns-a");

    let created = h
        .quotas
        .create(&ctx, ResourceQuota::new("ns-a", "q1").with_hard("cpu", "4"))
        .await
        .unwrap();
    assert!(!created.metadata.resource_version.to_string().is_empty());

    let got = h.quotas.get(&ctx, "q1").await.unwrap();
    assert_eq!(got.spec.hard["cpu"], "4");
    assert_eq!(got, created);

    let mut first = got.clone();
    first.spec.hard.insert("cpu".into(), "8".into());
    h.quotas.update(&ctx, first).await.unwrap();

    let mut stale = got;
    stale.spec.hard.insert("cpu".into(), "2".into());
    let err = h.quotas.update(&ctx, stale).await.unwrap_err();
    assert!(err.is_conflict(), "{err}");
    assert_eq!(h.quotas.get(&ctx, "q1").await.unwrap().spec.hard["cpu"], "8");
}

#[tokio::test]
async fn round_trip_differs_only_in_server_fields() {
    let h = harness();
    let mut input = ResourceQuota::new("ns-a", "q1")
        .with_hard("cpu", "4")
        .with_hard("memory", "8Gi");
    input.metadata.labels.insert("team".into(), "infra".into());

    h.quotas.create(&ns("ns-a"), input.clone()).await.unwrap();
    let mut stored = h.quotas.get(&ns("ns-a"), "q1").await.unwrap();

    stored.metadata.resource_version = ResourceVersion::UNSET;
    stored.metadata.uid.clear();
    stored.metadata.creation_timestamp = None;
    assert_eq!(stored, input);
}

#[tokio::test]
async fn repeated_get_is_stable() {
    let h = harness();
    h.quotas
        .create(&ns("ns-a"), ResourceQuota::new("ns-a", "q1"))
        .await
        .unwrap();
    let a = h.quotas.get(&ns("ns-a"), "q1").await.unwrap();
    let b = h.quotas.get(&ns("ns-a"), "q1").await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn create_errors() {
    let h = harness();
    h.quotas
        .create(&ns("ns-a"), ResourceQuota::new("ns-a", "q1"))
        .await
        .unwrap();

    let dup = h
        .quotas
        .create(&ns("ns-a"), ResourceQuota::new("ns-a", "q1"))
        .await
        .unwrap_err();
    assert!(dup.is_already_exists());

    let bad_name = h
        .quotas
        .create(&ns("ns-a"), ResourceQuota::new("ns-a", "a/b"))
        .await
        .unwrap_err();
    assert!(matches!(bad_name, RegistryError::InvalidName { .. }));

    let negative = h
        .quotas
        .create(&ns("ns-a"), ResourceQuota::new("ns-a", "q2").with_hard("cpu", "-1"))
        .await
        .unwrap_err();
    assert!(negative.is_invalid());
    assert_eq!(negative.field_errors()[0].field, "spec.hard[cpu]");

    let wrong_ns = h
        .quotas
        .create(&ns("ns-a"), ResourceQuota::new("ns-b", "q3"))
        .await
        .unwrap_err();
    assert!(matches!(wrong_ns, RegistryError::BadRequest(_)));
}

// ---- update ----

#[tokio::test]
async fn concurrent_updates_have_one_winner() {
    let h = harness();
    let base = h
        .quotas
        .create(&ns("ns-a"), ResourceQuota::new("ns-a", "q1").with_hard("pods", "1"))
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for i in 0..8 {
        let quotas = h.quotas.clone();
        let mut attempt = base.clone();
        attempt.spec.hard.insert("pods".into(), (10 + i).to_string());
        tasks.push(tokio::spawn(async move {
            quotas.update(&RequestContext::namespaced("ns-a"), attempt).await
        }));
    }

    let mut winners = Vec::new();
    for task in tasks {
        match task.await.unwrap() {
            Ok((quota, created)) => {
                assert!(!created);
                winners.push(quota);
            }
            Err(e) => assert!(e.is_conflict(), "{e}"),
        }
    }
    assert_eq!(winners.len(), 1);
    let stored = h.quotas.get(&ns("ns-a"), "q1").await.unwrap();
    assert_eq!(stored, winners[0]);
}

#[tokio::test]
async fn update_missing_quota_is_not_found() {
    let h = harness();
    let err = h
        .quotas
        .update(&ns("ns-a"), ResourceQuota::new("ns-a", "ghost"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn full_update_preserves_status() {
    let h = harness();
    let quota = h
        .quotas
        .create(&ns("ns-a"), ResourceQuota::new("ns-a", "q1").with_hard("cpu", "4"))
        .await
        .unwrap();
    let mut with_status = quota;
    with_status.status.used.insert("cpu".into(), "1".into());
    let (with_status, _) = h.status.update(&ns("ns-a"), with_status).await.unwrap();

    let mut edit = with_status.clone();
    edit.spec.hard.insert("cpu".into(), "6".into());
    edit.status.used.clear();
    let (after, _) = h.quotas.update(&ns("ns-a"), edit).await.unwrap();
    assert_eq!(after.status, with_status.status);
    assert_eq!(after.spec.hard["cpu"], "6");
}

// ---- delete ----

#[tokio::test]
async fn delete_returns_the_quota() {
    let h = harness_with(quota_store_config());
    let created = h
        .quotas
        .create(&ns("ns-a"), ResourceQuota::new("ns-a", "q1").with_hard("cpu", "4"))
        .await
        .unwrap();

    match h.quotas.delete(&ns("ns-a"), "q1").await.unwrap() {
        Deleted::Object(q) => assert_eq!(q, created),
        other => panic!("expected the deleted quota, got {other:?}"),
    }
    assert!(h.quotas.get(&ns("ns-a"), "q1").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn delete_honours_explicit_config() {
    let h = harness_with(StoreConfig::from_toml_str("return_deleted_object = false").unwrap());
    assert!(!h.quotas.config().return_deleted_object);
    h.quotas
        .create(&ns("ns-a"), ResourceQuota::new("ns-a", "q1").with_hard("cpu", "4"))
        .await
        .unwrap();

    match h.quotas.delete(&ns("ns-a"), "q1").await.unwrap() {
        Deleted::Status(status) => {
            assert_eq!(status.kind, "ResourceQuota");
            assert_eq!(status.name, "q1");
        }
        other => panic!("expected a status, got {other:?}"),
    }
    assert!(h.quotas.get(&ns("ns-a"), "q1").await.unwrap_err().is_not_found());
}

// ---- list ----

#[tokio::test]
async fn list_matches_exactly_the_selected_set() {
    let h = harness();
    let mut expected = HashSet::new();
    for (namespace, name, team) in [
        ("ns-a", "q1", "web"),
        ("ns-a", "q2", "db"),
        ("ns-a", "q3", "web"),
        ("ns-ab", "q4", "web"),
        ("ns-b", "q5", "web"),
    ] {
        let mut quota = ResourceQuota::new(namespace, name);
        quota.metadata.labels.insert("team".into(), team.into());
        h.quotas.create(&ns(namespace), quota).await.unwrap();
        if namespace == "ns-a" && team == "web" {
            expected.insert(name.to_string());
        }
    }

    let p = match_resource_quota(Selector::parse("team=web").unwrap(), FieldSelector::everything());
    let list = h.quotas.list(&ns("ns-a"), &p).await.unwrap();
    let got: HashSet<_> = list.items.iter().map(|q| q.metadata.name.clone()).collect();
    assert_eq!(got, expected);
    assert_eq!(list.resource_version, ResourceVersion::new(5));

    let by_ns = match_resource_quota(
        Selector::everything(),
        FieldSelector::parse("metadata.namespace=ns-b").unwrap(),
    );
    let list = h.quotas.list(&RequestContext::cluster(), &by_ns).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list.items[0].metadata.name, "q5");

    let all = h
        .quotas
        .list(&RequestContext::cluster(), &Predicate::everything())
        .await
        .unwrap();
    assert_eq!(all.len(), 5);
}

#[tokio::test]
async fn list_of_empty_namespace() {
    let h = harness();
    let list = h.quotas.list(&ns("empty"), &Predicate::everything()).await.unwrap();
    assert!(list.is_empty());
}
