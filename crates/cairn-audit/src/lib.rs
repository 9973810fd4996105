//! # cairn-audit: Fail-soft audit trail for monitored entity mutations
//!
//! Records every mutation to a monitored entity with full before/after state
//! and actor attribution, and exposes a filtered, paginated read surface.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Mutation (caller's transaction)             │
//! │  {entity, id, action, prior?, new?, actor?}  │
//! └─────────────────┬───────────────────────────┘
//!                   │ record() — never fails the caller
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  AuditTrailEngine                            │
//! │  ├─ Shape validation (created/updated/deleted)│
//! │  ├─ Actor/company attribution (AttributionMap)│
//! │  └─ Append, else bounded retry buffer        │
//! └─────────────────┬───────────────────────────┘
//!                   │ append (append-only)
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  AuditStore                 AuditQuerySurface│
//! │  (trait, MemoryAuditStore)  query(filter,page)│
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Failure isolation
//!
//! Auditing is best-effort by design: losing an audit record must never lose
//! a business transaction. [`AuditTrailEngine::record`] catches, logs, and
//! swallows every error. Storage failures divert the record into a bounded
//! write-behind buffer drained on later calls with a capped attempt count;
//! records that still cannot be persisted are counted in
//! [`AuditMetricsSnapshot::dropped`] rather than silently vanishing.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use cairn_audit::{
//!     AttributionMap, AuditQuery, AuditQuerySurface, AuditTrailEngine, MemoryAuditStore, Page,
//! };
//! use cairn_identity::IdentityDirectory;
//! use cairn_types::{ActionKind, ActorId, EntityName, StaffRole};
//! use serde_json::json;
//!
//! let directory = Arc::new(IdentityDirectory::new());
//! let staff = ActorId::new();
//! directory.register_internal(staff, StaffRole::Admin).unwrap();
//!
//! let store = Arc::new(MemoryAuditStore::new());
//! let engine = AuditTrailEngine::new(
//!     Arc::clone(&store),
//!     Arc::clone(&directory),
//!     AttributionMap::new(),
//! );
//!
//! engine.record(
//!     Some(staff),
//!     ActionKind::Created,
//!     EntityName::new("crm.task"),
//!     "task-17",
//!     None,
//!     Some(json!({"title": "call back"})),
//! );
//!
//! let surface = AuditQuerySurface::new(store);
//! let page = surface
//!     .query(&AuditQuery::default().with_entity_id("task-17"), Page::first(10))
//!     .unwrap();
//! assert_eq!(page.len(), 1);
//! assert_eq!(page[0].actor_id, Some(staff));
//! ```

pub mod attribution;
pub mod engine;
pub mod query;
pub mod record;
pub mod store;

pub use attribution::{AttributionMap, EntityAttribution};
pub use engine::{
    AuditEngineConfig, AuditError, AuditMetricsSnapshot, AuditTrailEngine, RecordOutcome,
};
pub use query::{AuditQuery, AuditQuerySurface, Page, TimeRange};
pub use record::AuditRecord;
pub use store::{AuditStore, MemoryAuditStore, StoreError};
