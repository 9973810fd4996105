//! cairn-identity: Actor and tenant directory for Cairn
//!
//! The directory is the identity model the rest of the system leans on. It
//! answers exactly one question — "who is this actor?" — and maintains the
//! registries that make the unrestricted internal-staff scope computable:
//! which companies exist and which end-clients each one owns.
//!
//! Registration mirrors the surrounding CRUD layer: that layer owns entity
//! creation and supplies the IDs; the directory only indexes them. `resolve`
//! is a pure lookup with no side effects.
//!
//! # Example
//!
//! ```
//! use cairn_identity::IdentityDirectory;
//! use cairn_types::{Actor, ActorId, CompanyId, CompanyRole};
//!
//! let directory = IdentityDirectory::new();
//!
//! let acme = CompanyId::new();
//! directory.register_company(acme, "Acme GmbH").unwrap();
//!
//! let owner = ActorId::new();
//! directory
//!     .register_company_user(owner, acme, CompanyRole::Owner)
//!     .unwrap();
//!
//! match directory.resolve(owner).unwrap() {
//!     Actor::Company { company_id, .. } => assert_eq!(company_id, acme),
//!     Actor::Internal { .. } => unreachable!(),
//! }
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cairn_types::{Actor, ActorId, CompanyId, CompanyRole, EndClientId, StaffRole};
use serde::{Deserialize, Serialize};
use tracing::info;


/// Errors that can occur during directory lookups and registration.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The actor reference does not resolve to a registered actor.
    #[error("unknown actor: {0}")]
    UnknownActor(ActorId),

    /// The company reference does not resolve to a registered company.
    #[error("unknown company: {0}")]
    UnknownCompany(CompanyId),

    /// The actor ID is already registered (in either universe).
    #[error("actor already registered: {0}")]
    DuplicateActor(ActorId),

    /// The company ID is already registered.
    #[error("company already registered: {0}")]
    DuplicateCompany(CompanyId),

    /// The end-client ID is already registered.
    #[error("end-client already registered: {0}")]
    DuplicateEndClient(EndClientId),
}

pub type Result<T> = std::result::Result<T, IdentityError>;

/// A registered tenant company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
}

#[derive(Debug, Default)]
struct Registry {
    /// Companies in registration order. The order is surfaced by
    /// `companies()` so the unrestricted-staff scope is stable across calls.
    companies: Vec<Company>,
    /// End-clients owned by each company, in registration order.
    end_clients: HashMap<CompanyId, Vec<EndClientId>>,
    /// Reverse index: end-client to owning company.
    end_client_owner: HashMap<EndClientId, CompanyId>,
    /// All actors, both universes, keyed by ID.
    actors: HashMap<ActorId, Actor>,
}

impl Registry {
    fn company_exists(&self, id: CompanyId) -> bool {
        self.companies.iter().any(|c| c.id == id)
    }
}

/// Registry of companies, end-clients, and actors in both universes.
///
/// # Thread Safety
///
/// All methods take `&self`; interior state lives behind a single `RwLock`.
/// Lookups may run concurrently with registration and may observe a snapshot
/// that is stale by the time they return, which is accepted.
#[derive(Debug, Default)]
pub struct IdentityDirectory {
    inner: RwLock<Registry>,
}

impl IdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a tenant company under a caller-supplied ID.
    pub fn register_company(&self, id: CompanyId, name: impl Into<String>) -> Result<()> {
        let mut reg = self.write();
        if reg.company_exists(id) {
            return Err(IdentityError::DuplicateCompany(id));
        }
        let name = name.into();
        info!(company = %id, name = %name, "company registered");
        reg.companies.push(Company { id, name });
        reg.end_clients.insert(id, Vec::new());
        Ok(())
    }

    /// Registers an end-client under its owning company.
    pub fn register_end_client(&self, id: EndClientId, company: CompanyId) -> Result<()> {
        let mut reg = self.write();
        if !reg.company_exists(company) {
            return Err(IdentityError::UnknownCompany(company));
        }
        if reg.end_client_owner.contains_key(&id) {
            return Err(IdentityError::DuplicateEndClient(id));
        }
        reg.end_client_owner.insert(id, company);
        reg.end_clients.entry(company).or_default().push(id);
        Ok(())
    }

    /// Registers an internal staff member.
    pub fn register_internal(&self, id: ActorId, role: StaffRole) -> Result<()> {
        let mut reg = self.write();
        if reg.actors.contains_key(&id) {
            return Err(IdentityError::DuplicateActor(id));
        }
        reg.actors.insert(id, Actor::Internal { id, role });
        Ok(())
    }

    /// Registers a company user. A company user belongs to exactly one
    /// company, fixed at registration.
    pub fn register_company_user(
        &self,
        id: ActorId,
        company: CompanyId,
        role: CompanyRole,
    ) -> Result<()> {
        let mut reg = self.write();
        if !reg.company_exists(company) {
            return Err(IdentityError::UnknownCompany(company));
        }
        if reg.actors.contains_key(&id) {
            return Err(IdentityError::DuplicateActor(id));
        }
        reg.actors.insert(
            id,
            Actor::Company {
                id,
                role,
                company_id: company,
            },
        );
        Ok(())
    }

    /// Removes a company, cascading its end-clients and company users.
    ///
    /// Delegation edges scoped to the company are the graph's concern; the
    /// caller invokes that cascade separately.
    pub fn remove_company(&self, id: CompanyId) -> Result<()> {
        let mut reg = self.write();
        if !reg.company_exists(id) {
            return Err(IdentityError::UnknownCompany(id));
        }
        reg.companies.retain(|c| c.id != id);
        if let Some(clients) = reg.end_clients.remove(&id) {
            for client in &clients {
                reg.end_client_owner.remove(client);
            }
            info!(company = %id, end_clients = clients.len(), "company removed");
        }
        reg.actors
            .retain(|_, actor| actor.company_id() != Some(id));
        Ok(())
    }

    /// Resolves an actor reference into its universe, role, and company
    /// membership. Pure lookup, no side effects.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UnknownActor`] if the reference does not
    /// resolve.
    pub fn resolve(&self, id: ActorId) -> Result<Actor> {
        self.read()
            .actors
            .get(&id)
            .copied()
            .ok_or(IdentityError::UnknownActor(id))
    }

    /// Looks up a registered company.
    pub fn company(&self, id: CompanyId) -> Result<Company> {
        self.read()
            .companies
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(IdentityError::UnknownCompany(id))
    }

    /// All registered company IDs, in registration order.
    pub fn companies(&self) -> Vec<CompanyId> {
        self.read().companies.iter().map(|c| c.id).collect()
    }

    /// End-clients of a company, in registration order.
    pub fn end_clients_of(&self, company: CompanyId) -> Result<Vec<EndClientId>> {
        let reg = self.read();
        reg.end_clients
            .get(&company)
            .cloned()
            .ok_or(IdentityError::UnknownCompany(company))
    }
}
