//! # Cairn
//!
//! Audit trail and access-scope core for multi-tenant CRM systems.
//!
//! Cairn is the piece of a CRM backend with actual design content: a generic,
//! fail-soft audit engine that captures every mutation with full before/after
//! state and actor attribution, and a hierarchical access-scope resolver that
//! computes visibility from explicit delegation edges rather than role flags
//! alone. The entity schemas themselves (tasks, documents, plans) are
//! external collaborators: they emit mutation events and relationship edges;
//! Cairn consumes them.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                            Cairn                               │
//! │  ┌──────────┐   ┌────────────┐   ┌──────────┐   ┌───────────┐ │
//! │  │ Identity │ ← │ Delegation │ ← │  Scope   │   │   Audit   │ │
//! │  │(directory)│  │   Graph    │   │ Resolver │   │Engine+Query│ │
//! │  └──────────┘   └────────────┘   └──────────┘   └───────────┘ │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The resolver reads the graph and the directory; the audit engine reads
//! the directory for attribution. The two sides share the identity model and
//! nothing else.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use cairn::{
//!     AccessScopeResolver, AttributionMap, AuditQuery, AuditQuerySurface, AuditTrailEngine,
//!     DelegationGraph, IdentityDirectory, MemoryAuditStore, Page,
//! };
//! use cairn::types::{ActionKind, ActorId, CompanyId, CompanyRole, EndClientId, EntityName};
//! use serde_json::json;
//!
//! let directory = Arc::new(IdentityDirectory::new());
//! let graph = Arc::new(DelegationGraph::new());
//!
//! let acme = CompanyId::new();
//! directory.register_company(acme, "Acme GmbH")?;
//! let client = EndClientId::new();
//! directory.register_end_client(client, acme)?;
//! let owner = ActorId::new();
//! directory.register_company_user(owner, acme, CompanyRole::Owner)?;
//!
//! // Visibility: owners see their whole company.
//! let resolver = AccessScopeResolver::new(Arc::clone(&directory), Arc::clone(&graph));
//! assert!(resolver.resolve(owner)?.can_see_end_client(client));
//!
//! // Auditing: fail-soft, append-only.
//! let store = Arc::new(MemoryAuditStore::new());
//! let engine =
//!     AuditTrailEngine::new(Arc::clone(&store), Arc::clone(&directory), AttributionMap::new());
//! engine.record(
//!     Some(owner),
//!     ActionKind::Created,
//!     EntityName::new("crm.task"),
//!     "task-1",
//!     None,
//!     Some(json!({"title": "follow up"})),
//! );
//!
//! let surface = AuditQuerySurface::new(store);
//! let records = surface.query(&AuditQuery::default().with_entity_id("task-1"), Page::first(10))?;
//! assert_eq!(records.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! - **Identity**: [`IdentityDirectory`] - who is this actor?
//! - **Delegation**: [`DelegationGraph`] - explicit visibility grants
//! - **Scope**: [`AccessScopeResolver`] - effective visibility sets
//! - **Audit**: [`AuditTrailEngine`], [`AuditQuerySurface`] - the trail

pub use cairn_audit::{
    AttributionMap, AuditEngineConfig, AuditError, AuditMetricsSnapshot, AuditQuery,
    AuditQuerySurface, AuditRecord, AuditStore, AuditTrailEngine, EntityAttribution,
    MemoryAuditStore, Page, RecordOutcome, StoreError, TimeRange,
};
pub use cairn_identity::{Company, IdentityDirectory, IdentityError};
pub use cairn_scope::{
    AccessScope, AccessScopeResolver, DelegationGraph, Edge, EdgeKind, EdgeTarget, GraphError,
    ScopeError,
};

/// Shared value types: IDs, roles, action kinds, actor model.
pub mod types {
    pub use cairn_types::*;
}
