//! # cairn-scope: Delegation graph and access-scope resolution
//!
//! Answers "which companies and end-clients can actor X currently see?" from
//! explicit delegation edges rather than role flags alone.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Authorization Check (caller)                │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  AccessScopeResolver                         │
//! │  ├─ Resolve actor via IdentityDirectory      │
//! │  ├─ Walk DelegationGraph per universe/role   │
//! │  └─ Collapse duplicate paths into a set      │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  AccessScope                                 │
//! │  - company_ids: HashSet<CompanyId>           │
//! │  - end_client_ids: HashSet<EndClientId>      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Visibility rules
//!
//! | Actor                    | No edges/grants       | With edges/grants               |
//! |--------------------------|-----------------------|---------------------------------|
//! | Internal staff           | ALL companies         | Exactly the granted companies   |
//! | Owner                    | Whole own company     | Edges never narrow owners       |
//! | Supervisor               | Empty scope           | Direct edges ∪ one collaborator hop |
//! | Collaborator             | Empty scope           | Direct edges only               |
//!
//! The two opposite defaults — unrestricted for internal staff with no
//! grants, empty for edge-limited company roles with no edges — are both
//! deliberate and load-bearing. See [`AccessScopeResolver::resolve`].

pub mod graph;
pub mod resolver;

pub use graph::{DelegationGraph, Edge, EdgeKind, EdgeTarget, GraphError};
pub use resolver::{AccessScope, AccessScopeResolver, ScopeError};
