//! # cairn-types: Core types for Cairn
//!
//! This crate contains the shared types used across the Cairn system:
//! - Entity IDs ([`CompanyId`], [`EndClientId`], [`ActorId`], [`AuditRecordId`])
//! - Actor universes and roles ([`Actor`], [`StaffRole`], [`CompanyRole`])
//! - Mutation kinds ([`ActionKind`])
//! - Namespace-qualified entity names ([`EntityName`])
//!
//! Everything here is a plain value type: `Copy` where cheap, serde-enabled
//! throughout, and free of behavior beyond small predicate methods. The
//! directory, graph, and audit crates all depend on this crate and nothing
//! else internal.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Entity IDs - All Copy (16-byte UUID values)
// ============================================================================

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random (v4) identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for a tenant company.
    CompanyId
}

uuid_id! {
    /// Unique identifier for an end-client (a customer of a company).
    EndClientId
}

uuid_id! {
    /// Unique identifier for an actor in either universe.
    ///
    /// Actor IDs are globally unique: an internal staff member and a company
    /// user never share an ID, and the directory rejects re-registration.
    ActorId
}

uuid_id! {
    /// Unique identifier for one audit record.
    AuditRecordId
}

// ============================================================================
// Entity names
// ============================================================================

/// A namespace-qualified entity name, e.g. `crm.task` or `crm.document`.
///
/// The audit trail stores entity names verbatim; the attribution map keys on
/// them. Construction does not validate the namespace — monitored entities
/// are declared by the surrounding schema layer, which owns naming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityName(String);

impl EntityName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ============================================================================
// Mutation kinds
// ============================================================================

/// The kind of mutation an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Created,
    Updated,
    Deleted,
}

impl ActionKind {
    /// Whether a record of this kind must carry a prior-state snapshot.
    pub fn requires_prior_state(&self) -> bool {
        match self {
            ActionKind::Created => false,
            ActionKind::Updated | ActionKind::Deleted => true,
        }
    }

    /// Whether a record of this kind must carry a new-state snapshot.
    pub fn requires_new_state(&self) -> bool {
        match self {
            ActionKind::Created | ActionKind::Updated => true,
            ActionKind::Deleted => false,
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::Created => "created",
            ActionKind::Updated => "updated",
            ActionKind::Deleted => "deleted",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// Roles
// ============================================================================

/// Role of an internal staff member.
///
/// Internal staff live outside any single company. Their visibility is
/// governed solely by internal access grants, never by delegation edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    /// Full administrative access to the platform.
    Admin,
    /// Support staff handling customer-facing issues.
    Support,
    /// Engineering staff with operational access.
    Developer,
}

/// Role of a company-scoped user.
///
/// Roles are ordered from most to least privileged within a company:
/// Owner > Supervisor > Collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyRole {
    /// Sees every end-client of the company, unconditionally.
    Owner,
    /// Sees directly-granted end-clients plus everything their supervised
    /// collaborators see (one supervision hop, never deeper).
    Supervisor,
    /// Sees only directly-granted end-clients.
    Collaborator,
}

impl CompanyRole {
    /// Whether delegation edges can narrow this role's visibility.
    ///
    /// Owners are never scope-limited; supervisors and collaborators see
    /// nothing without edges.
    pub fn is_edge_limited(&self) -> bool {
        match self {
            CompanyRole::Owner => false,
            CompanyRole::Supervisor | CompanyRole::Collaborator => true,
        }
    }

    /// Whether this role can be the source of a supervision edge.
    pub fn can_supervise(&self) -> bool {
        matches!(self, CompanyRole::Supervisor)
    }
}

// ============================================================================
// Actors
// ============================================================================

/// Which universe an actor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Universe {
    /// Platform-internal staff.
    Internal,
    /// A user belonging to exactly one tenant company.
    Company,
}

/// A fully-resolved actor: universe, role, and company membership.
///
/// This is what the identity directory's `resolve` returns and what the
/// scope resolver and audit engine branch on. A company user always carries
/// its company; internal staff never do (their company visibility is a grant
/// relation, not membership).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "universe", rename_all = "lowercase")]
pub enum Actor {
    Internal {
        id: ActorId,
        role: StaffRole,
    },
    Company {
        id: ActorId,
        role: CompanyRole,
        company_id: CompanyId,
    },
}

impl Actor {
    pub fn id(&self) -> ActorId {
        match self {
            Actor::Internal { id, .. } | Actor::Company { id, .. } => *id,
        }
    }

    pub fn universe(&self) -> Universe {
        match self {
            Actor::Internal { .. } => Universe::Internal,
            Actor::Company { .. } => Universe::Company,
        }
    }

    /// The company this actor belongs to, if company-scoped.
    pub fn company_id(&self) -> Option<CompanyId> {
        match self {
            Actor::Internal { .. } => None,
            Actor::Company { company_id, .. } => Some(*company_id),
        }
    }
}
