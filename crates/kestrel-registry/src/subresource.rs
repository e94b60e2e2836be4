use kestrel_types::{RequestContext, Resource};

use crate::error::Result;
use crate::store::GenericStore;

/// A write-only view of a resource that exposes nothing but update.
///
/// Wraps a [`GenericStore`] configured with the subresource's own update
/// strategy. It reads and writes the same record as the parent store, so
/// the strategy is what confines an update to the governed fields.
#[derive(Clone, Debug)]
pub struct SubresourceStore<T: Resource> {
    store: GenericStore<T>,
}

impl<T: Resource> SubresourceStore<T> {
    pub fn new(store: GenericStore<T>) -> Self {
        Self { store }
    }

    /// An empty object, for decoding request bodies.
    pub fn new_object(&self) -> T {
        T::default()
    }

    /// Apply an update through the subresource strategy.
    ///
    /// Never creates: the returned flag is `false` whenever the call
    /// succeeds.
    pub async fn update(&self, ctx: &RequestContext, obj: T) -> Result<(T, bool)> {
        self.store.update(ctx, obj).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyBuilder;
    use crate::testing::{Widget, WidgetStatusStrategy, WidgetStrategy};
    use kestrel_storage::{KvStore, MemoryKvStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn updates_only_through_status_strategy() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        let main: GenericStore<Widget> =
            GenericStore::new(kv, KeyBuilder::namespaced("/widgets"), Arc::new(WidgetStrategy));
        let status =
            SubresourceStore::new(main.clone().with_update_strategy(Arc::new(WidgetStatusStrategy)));
        let ctx = RequestContext::namespaced("ns-a");

        assert_eq!(status.new_object(), Widget::default());

        let mut w = main.create(&ctx, Widget::colored("ns-a", "w1", "red")).await.unwrap();
        w.status.phase = "Ready".into();
        let (w, created) = status.update(&ctx, w).await.unwrap();
        assert!(!created);
        assert_eq!(main.get(&ctx, "w1").await.unwrap(), w);

        let err = status.update(&ctx, Widget::new("ns-a", "ghost")).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
