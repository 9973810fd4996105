//! The delegation graph: directed visibility grants between actors and
//! end-clients, plus internal access grants restricting staff to companies.
//!
//! Mutations validate and insert under one write lock, so two concurrent
//! `add_edge` calls can never both pass the duplicate check — uniqueness is
//! enforced by the storage structure itself, not by a separate pre-check.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cairn_types::{ActorId, CompanyId, EndClientId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Delegation graph validation failures.
///
/// All variants are caller-visible: a failed mutation is a rejected
/// operation, never swallowed.
///
/// `Display` and `Error` are implemented by hand: the `source` fields below
/// are edge source actors, which the `thiserror` derive would otherwise
/// misread as the error's cause.
#[derive(Debug)]
pub enum GraphError {
    /// The (company, source, target) triple already exists for this kind.
    DuplicateEdge {
        kind: EdgeKind,
        company: CompanyId,
        source: ActorId,
        target: EdgeTarget,
    },

    /// A supervisor cannot supervise itself.
    SelfReference(ActorId),

    /// The edge kind and target shape do not match (supervision edges target
    /// actors; the two grant kinds target end-clients).
    KindTargetMismatch { kind: EdgeKind, target: EdgeTarget },

    /// Removal of an edge that does not exist.
    EdgeNotFound {
        kind: EdgeKind,
        company: CompanyId,
        source: ActorId,
        target: EdgeTarget,
    },

    /// The staff member already holds a grant for this company.
    DuplicateGrant { staff: ActorId, company: CompanyId },

    /// Removal of a grant that does not exist.
    GrantNotFound { staff: ActorId, company: CompanyId },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::DuplicateEdge {
                kind,
                company,
                source,
                target,
            } => write!(f, "duplicate edge: {kind:?} ({company}, {source} -> {target})"),
            GraphError::SelfReference(actor) => {
                write!(f, "self-referential supervision edge for actor {actor}")
            }
            GraphError::KindTargetMismatch { kind, target } => {
                write!(f, "edge kind {kind:?} cannot target {target}")
            }
            GraphError::EdgeNotFound {
                kind,
                company,
                source,
                target,
            } => write!(f, "edge not found: {kind:?} ({company}, {source} -> {target})"),
            GraphError::DuplicateGrant { staff, company } => {
                write!(f, "duplicate internal access grant: {staff} -> {company}")
            }
            GraphError::GrantNotFound { staff, company } => {
                write!(f, "internal access grant not found: {staff} -> {company}")
            }
        }
    }
}

impl std::error::Error for GraphError {}

pub type Result<T> = std::result::Result<T, GraphError>;

/// The three shapes a delegation edge can take, each scoped to a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Supervisor may act on this end-client.
    SupervisorToEndClient,
    /// Collaborator may act on this end-client.
    CollaboratorToEndClient,
    /// Supervisor oversees this collaborator's work. Hierarchy, not client
    /// visibility — client visibility flows through it at resolution time.
    SupervisorToCollaborator,
}

impl EdgeKind {
    fn accepts(&self, target: &EdgeTarget) -> bool {
        match self {
            EdgeKind::SupervisorToEndClient | EdgeKind::CollaboratorToEndClient => {
                matches!(target, EdgeTarget::EndClient(_))
            }
            EdgeKind::SupervisorToCollaborator => matches!(target, EdgeTarget::Actor(_)),
        }
    }
}

/// Target of a delegation edge: an end-client for the two grant kinds, a
/// collaborator for supervision edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeTarget {
    EndClient(EndClientId),
    Actor(ActorId),
}

impl std::fmt::Display for EdgeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeTarget::EndClient(id) => write!(f, "end-client {id}"),
            EdgeTarget::Actor(id) => write!(f, "actor {id}"),
        }
    }
}

/// One directed delegation edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub kind: EdgeKind,
    pub company_id: CompanyId,
    pub source: ActorId,
    pub target: EdgeTarget,
}

impl Edge {
    fn key(&self) -> (EdgeKind, CompanyId, ActorId, EdgeTarget) {
        (self.kind, self.company_id, self.source, self.target)
    }
}

#[derive(Debug, Default)]
struct GraphState {
    /// Edges in insertion order. The order carries no semantics but is the
    /// documented listing order for `edges_from` / `edges_to`.
    edges: Vec<Edge>,
    /// Uniqueness index for the (kind, company, source, target) key.
    edge_keys: HashSet<(EdgeKind, CompanyId, ActorId, EdgeTarget)>,
    /// Internal access grants in insertion order.
    grants: Vec<(ActorId, CompanyId)>,
    grant_keys: HashSet<(ActorId, CompanyId)>,
}

/// Stores delegation edges and internal access grants.
///
/// # Thread Safety
///
/// All methods take `&self`. A single `RwLock` guards the state; readers may
/// run concurrently with writers and may observe a snapshot that is stale by
/// the time they return, which is accepted.
#[derive(Debug, Default)]
pub struct DelegationGraph {
    state: RwLock<GraphState>,
}

impl DelegationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, GraphState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GraphState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a delegation edge.
    ///
    /// # Errors
    ///
    /// - [`GraphError::KindTargetMismatch`] if the target shape does not fit
    ///   the kind.
    /// - [`GraphError::SelfReference`] for a supervision edge whose source
    ///   and target are the same actor.
    /// - [`GraphError::DuplicateEdge`] if the (company, source, target)
    ///   triple already exists for this kind.
    pub fn add_edge(
        &self,
        kind: EdgeKind,
        company: CompanyId,
        source: ActorId,
        target: EdgeTarget,
    ) -> Result<()> {
        if !kind.accepts(&target) {
            return Err(GraphError::KindTargetMismatch { kind, target });
        }
        if kind == EdgeKind::SupervisorToCollaborator && target == EdgeTarget::Actor(source) {
            return Err(GraphError::SelfReference(source));
        }

        let edge = Edge {
            kind,
            company_id: company,
            source,
            target,
        };

        // Validation and insertion happen under the same write guard, so a
        // concurrent add of the same triple cannot slip past the check.
        let mut state = self.write();
        if !state.edge_keys.insert(edge.key()) {
            return Err(GraphError::DuplicateEdge {
                kind,
                company,
                source,
                target,
            });
        }
        state.edges.push(edge);
        debug!(?kind, company = %company, source = %source, target = %target, "edge added");
        Ok(())
    }

    /// Removes a delegation edge.
    pub fn remove_edge(
        &self,
        kind: EdgeKind,
        company: CompanyId,
        source: ActorId,
        target: EdgeTarget,
    ) -> Result<()> {
        let key = (kind, company, source, target);
        let mut state = self.write();
        if !state.edge_keys.remove(&key) {
            return Err(GraphError::EdgeNotFound {
                kind,
                company,
                source,
                target,
            });
        }
        state.edges.retain(|e| e.key() != key);
        debug!(?kind, company = %company, source = %source, target = %target, "edge removed");
        Ok(())
    }

    /// Edges originating at `source` of the given kind, in insertion order.
    pub fn edges_from(&self, source: ActorId, kind: EdgeKind) -> Vec<Edge> {
        self.read()
            .edges
            .iter()
            .filter(|e| e.source == source && e.kind == kind)
            .copied()
            .collect()
    }

    /// Edges pointing at `target` of the given kind, in insertion order.
    pub fn edges_to(&self, target: EdgeTarget, kind: EdgeKind) -> Vec<Edge> {
        self.read()
            .edges
            .iter()
            .filter(|e| e.target == target && e.kind == kind)
            .copied()
            .collect()
    }

    /// Grants the staff member visibility of the company.
    ///
    /// Holding any grant restricts the staff member to exactly the granted
    /// companies; holding none means unrestricted access.
    pub fn add_grant(&self, staff: ActorId, company: CompanyId) -> Result<()> {
        let mut state = self.write();
        if !state.grant_keys.insert((staff, company)) {
            return Err(GraphError::DuplicateGrant { staff, company });
        }
        state.grants.push((staff, company));
        debug!(staff = %staff, company = %company, "internal access grant added");
        Ok(())
    }

    /// Removes an internal access grant.
    pub fn remove_grant(&self, staff: ActorId, company: CompanyId) -> Result<()> {
        let mut state = self.write();
        if !state.grant_keys.remove(&(staff, company)) {
            return Err(GraphError::GrantNotFound { staff, company });
        }
        state.grants.retain(|g| *g != (staff, company));
        Ok(())
    }

    /// Companies granted to the staff member, in insertion order.
    ///
    /// An empty result means the staff member is unrestricted, not denied.
    pub fn list_grants(&self, staff: ActorId) -> Vec<CompanyId> {
        self.read()
            .grants
            .iter()
            .filter(|(s, _)| *s == staff)
            .map(|(_, c)| *c)
            .collect()
    }

    /// Drops every edge scoped to the company and every grant naming it.
    /// Invoked by the caller when a company is deleted.
    ///
    /// Returns the number of edges and grants removed.
    pub fn cascade_remove_company(&self, company: CompanyId) -> usize {
        let mut state = self.write();
        let before = state.edges.len() + state.grants.len();
        state.edge_keys.retain(|(_, c, _, _)| *c != company);
        state.edges.retain(|e| e.company_id != company);
        state.grant_keys.retain(|(_, c)| *c != company);
        state.grants.retain(|(_, c)| *c != company);
        let removed = before - (state.edges.len() + state.grants.len());
        debug!(company = %company, removed, "company delegation state cascaded");
        removed
    }
}
