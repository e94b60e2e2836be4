#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use kestrel_quota::{new_storage, quota_store_config, QuotaStatusStore, QuotaStore, ResourceQuota};
use kestrel_registry::{StoreConfig, WatchEvent, Watcher};
use kestrel_storage::{KvStore, MemoryKvStore};
use kestrel_types::RequestContext;

pub struct Harness {
    pub kv: Arc<MemoryKvStore>,
    pub quotas: QuotaStore,
    pub status: QuotaStatusStore,
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("kestrel=debug")
        .with_test_writer()
        .try_init();
}

pub fn harness() -> Harness {
    harness_with(quota_store_config())
}

pub fn harness_with(config: StoreConfig) -> Harness {
    init_tracing();
    let kv = Arc::new(MemoryKvStore::new());
    let (quotas, status) = new_storage(kv.clone() as Arc<dyn KvStore>, config);
    Harness { kv, quotas, status }
}

pub fn ns(namespace: &str) -> RequestContext {
    RequestContext::namespaced(namespace)
}

pub async fn next_event(watcher: &mut Watcher<ResourceQuota>) -> WatchEvent<ResourceQuota> {
    tokio::time::timeout(Duration::from_secs(2), watcher.next())
        .await
        .expect("timed out waiting for a watch event")
        .expect("watch ended early")
}

pub async fn assert_no_event(watcher: &mut Watcher<ResourceQuota>) {
    let res = tokio::time::timeout(Duration::from_millis(50), watcher.next()).await;
    assert!(res.is_err(), "unexpected watch event: {res:?}");
}

pub async fn wait_for_no_watchers(kv: &MemoryKvStore) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while kv.watcher_count() > 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("watch subscription was not released");
}
