//! Read-side scope resolution: walks the delegation graph per actor
//! universe and role and collapses every reachability path into one set.

use std::collections::HashSet;
use std::sync::Arc;

use cairn_identity::{IdentityDirectory, IdentityError};
use cairn_types::{Actor, ActorId, CompanyId, CompanyRole, EndClientId};
use tracing::debug;

use crate::graph::{DelegationGraph, EdgeKind, EdgeTarget};

/// Scope resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// The acting identity could not be resolved.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

pub type Result<T> = std::result::Result<T, ScopeError>;

/// The effective visibility set of one actor: which companies and which
/// end-clients they may currently see.
///
/// Scope is a set — duplicate reachability paths collapse, and membership
/// checks are the only semantics. Ordering is meaningless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessScope {
    pub company_ids: HashSet<CompanyId>,
    pub end_client_ids: HashSet<EndClientId>,
}

impl AccessScope {
    pub fn can_see_company(&self, company: CompanyId) -> bool {
        self.company_ids.contains(&company)
    }

    pub fn can_see_end_client(&self, client: EndClientId) -> bool {
        self.end_client_ids.contains(&client)
    }

    pub fn is_empty(&self) -> bool {
        self.company_ids.is_empty() && self.end_client_ids.is_empty()
    }
}

/// Computes effective visibility from the identity directory and the
/// delegation graph.
///
/// Resolution is idempotent and side-effect-free. It reads the graph under
/// its read lock and tolerates concurrent edge mutation: a result may be
/// stale by the time it returns (eventual consistency of visibility, not
/// linearizable).
#[derive(Debug, Clone)]
pub struct AccessScopeResolver {
    directory: Arc<IdentityDirectory>,
    graph: Arc<DelegationGraph>,
}

impl AccessScopeResolver {
    pub fn new(directory: Arc<IdentityDirectory>, graph: Arc<DelegationGraph>) -> Self {
        Self { directory, graph }
    }

    /// Resolves the actor's effective visibility set.
    ///
    /// # Visibility rules
    ///
    /// - **Internal staff, no grants**: every company and every end-client.
    /// - **Internal staff, N grants**: exactly those N companies.
    /// - **Owner**: the whole own company, regardless of edges.
    /// - **Supervisor**: direct end-client edges, plus everything each
    ///   supervised collaborator can see directly. Two hops only.
    /// - **Collaborator**: direct end-client edges only.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Identity`] if the actor reference does not
    /// resolve.
    pub fn resolve(&self, actor: ActorId) -> Result<AccessScope> {
        let scope = match self.directory.resolve(actor)? {
            Actor::Internal { id, .. } => self.resolve_internal(id),
            Actor::Company {
                id,
                role,
                company_id,
            } => self.resolve_company_user(id, role, company_id),
        };
        debug!(
            actor = %actor,
            companies = scope.company_ids.len(),
            end_clients = scope.end_client_ids.len(),
            "scope resolved"
        );
        Ok(scope)
    }

    fn resolve_internal(&self, staff: ActorId) -> AccessScope {
        let grants = self.graph.list_grants(staff);

        // LOAD-BEARING DEFAULT: an internal staff member with no grant rows
        // has UNRESTRICTED access to every company. Absence of grants is the
        // documented allow-everything state, asymmetric with the default-deny
        // rule for supervisors/collaborators below. Do not "fix" this into
        // default-deny.
        let companies = if grants.is_empty() {
            self.directory.companies()
        } else {
            grants
        };

        let mut scope = AccessScope::default();
        for company in companies {
            // A grant may name a company removed since the grant was issued;
            // stale grants contribute nothing.
            let Ok(clients) = self.directory.end_clients_of(company) else {
                continue;
            };
            scope.company_ids.insert(company);
            scope.end_client_ids.extend(clients);
        }
        scope
    }

    fn resolve_company_user(
        &self,
        actor: ActorId,
        role: CompanyRole,
        company: CompanyId,
    ) -> AccessScope {
        let mut scope = AccessScope::default();
        match role {
            CompanyRole::Owner => {
                // Owners are never scope-limited by delegation edges.
                scope.company_ids.insert(company);
                if let Ok(clients) = self.directory.end_clients_of(company) {
                    scope.end_client_ids.extend(clients);
                }
            }
            CompanyRole::Supervisor => {
                self.collect_direct(actor, company, EdgeKind::SupervisorToEndClient, &mut scope);

                // One supervision hop: everything a supervised collaborator
                // can see directly. Deliberately NOT a transitive closure —
                // a collaborator-of-collaborator contributes nothing.
                for edge in self
                    .graph
                    .edges_from(actor, EdgeKind::SupervisorToCollaborator)
                {
                    if edge.company_id != company {
                        continue;
                    }
                    if let EdgeTarget::Actor(collaborator) = edge.target {
                        self.collect_direct(
                            collaborator,
                            company,
                            EdgeKind::CollaboratorToEndClient,
                            &mut scope,
                        );
                    }
                }
            }
            CompanyRole::Collaborator => {
                self.collect_direct(actor, company, EdgeKind::CollaboratorToEndClient, &mut scope);
            }
        }
        // Opposite default from internal staff: an edge-limited company user
        // with no edges sees nothing at all.
        scope
    }

    fn collect_direct(
        &self,
        actor: ActorId,
        company: CompanyId,
        kind: EdgeKind,
        scope: &mut AccessScope,
    ) {
        for edge in self.graph.edges_from(actor, kind) {
            if edge.company_id != company {
                continue;
            }
            if let EdgeTarget::EndClient(client) = edge.target {
                scope.company_ids.insert(company);
                scope.end_client_ids.insert(client);
            }
        }
    }
}
