//! The ResourceQuota resource.
//!
//! A quota caps the aggregate resources a namespace may consume. This crate
//! defines the quota types and their validation, and configures a
//! [`GenericStore`](kestrel_registry::GenericStore) for them: the main store
//! governs `spec`, and a status subresource store lets the quota controller
//! publish `status` without touching anything else.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use kestrel_quota::{new_storage, quota_store_config, ResourceQuota};
//! use kestrel_storage::MemoryKvStore;
//! use kestrel_types::RequestContext;
//!
//! # async fn demo() -> kestrel_registry::Result<()> {
//! let (quotas, status) = new_storage(Arc::new(MemoryKvStore::new()), quota_store_config());
//! let ctx = RequestContext::namespaced("ns-a");
//!
//! let mut quota = quotas
//!     .create(&ctx, ResourceQuota::new("ns-a", "q1").with_hard("cpu", "4"))
//!     .await?;
//! quota.status.used.insert("cpu".into(), "1".into());
//! status.update(&ctx, quota).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`error`] -- Quantity parse errors
//! - [`quantity`] -- [`Quantity`] parsing (`500m`, `8Gi`, ...)
//! - [`types`] -- [`ResourceQuota`] and its spec and status
//! - [`validation`] -- Field validation for create, update and status update
//! - [`strategy`] -- [`QuotaStrategy`] and [`QuotaStatusStrategy`]
//! - [`storage`] -- [`new_storage`], the registry wiring

pub mod error;
pub mod quantity;
pub mod storage;
pub mod strategy;
pub mod types;
pub mod validation;

pub use error::QuantityError;
pub use quantity::Quantity;
pub use storage::{
    match_resource_quota, new_storage, quota_store_config, QuotaStatusStore, QuotaStore, ENDPOINT_NAME,
    PREFIX,
};
pub use strategy::{QuotaStatusStrategy, QuotaStrategy};
pub use types::{
    ResourceAmounts, ResourceQuota, ResourceQuotaList, ResourceQuotaSpec, ResourceQuotaStatus,
    RESOURCE_CPU, RESOURCE_MEMORY, RESOURCE_PODS,
};
