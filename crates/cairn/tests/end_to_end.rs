//! End-to-end scenarios across identity, delegation, scope, and audit.

use std::sync::Arc;

use cairn::types::{ActionKind, ActorId, CompanyId, CompanyRole, EndClientId, EntityName, StaffRole};
use cairn::{
    AccessScopeResolver, AttributionMap, AuditQuery, AuditQuerySurface, AuditRecord, AuditStore,
    AuditTrailEngine, DelegationGraph, EdgeKind, EdgeTarget, EntityAttribution, IdentityDirectory,
    MemoryAuditStore, Page, StoreError,
};
use serde_json::json;

struct World {
    directory: Arc<IdentityDirectory>,
    graph: Arc<DelegationGraph>,
    resolver: AccessScopeResolver,
}

fn world() -> World {
    let directory = Arc::new(IdentityDirectory::new());
    let graph = Arc::new(DelegationGraph::new());
    let resolver = AccessScopeResolver::new(Arc::clone(&directory), Arc::clone(&graph));
    World {
        directory,
        graph,
        resolver,
    }
}

/// Spec scenario: company C has collaborator K granted end-client A;
/// supervisor S supervises K. S sees A; removing the supervision edge
/// revokes that, while K is unaffected.
#[test]
fn supervisor_inheritance_follows_supervision_edge() {
    let w = world();
    let company = CompanyId::new();
    w.directory.register_company(company, "C").unwrap();
    let client_a = EndClientId::new();
    w.directory.register_end_client(client_a, company).unwrap();

    let k = ActorId::new();
    w.directory
        .register_company_user(k, company, CompanyRole::Collaborator)
        .unwrap();
    let s = ActorId::new();
    w.directory
        .register_company_user(s, company, CompanyRole::Supervisor)
        .unwrap();

    w.graph
        .add_edge(
            EdgeKind::CollaboratorToEndClient,
            company,
            k,
            EdgeTarget::EndClient(client_a),
        )
        .unwrap();
    w.graph
        .add_edge(
            EdgeKind::SupervisorToCollaborator,
            company,
            s,
            EdgeTarget::Actor(k),
        )
        .unwrap();

    assert!(w.resolver.resolve(s).unwrap().can_see_end_client(client_a));

    w.graph
        .remove_edge(
            EdgeKind::SupervisorToCollaborator,
            company,
            s,
            EdgeTarget::Actor(k),
        )
        .unwrap();

    assert!(!w.resolver.resolve(s).unwrap().can_see_end_client(client_a));
    assert!(
        w.resolver.resolve(k).unwrap().can_see_end_client(client_a),
        "revoking supervision must not touch the collaborator's own scope"
    );
}

/// The two opposite defaults, side by side: ungranted staff see everything,
/// edge-less collaborators see nothing.
#[test]
fn staff_default_allow_vs_collaborator_default_deny() {
    let w = world();
    let company = CompanyId::new();
    w.directory.register_company(company, "C").unwrap();
    let client = EndClientId::new();
    w.directory.register_end_client(client, company).unwrap();

    let staff = ActorId::new();
    w.directory.register_internal(staff, StaffRole::Support).unwrap();
    let collaborator = ActorId::new();
    w.directory
        .register_company_user(collaborator, company, CompanyRole::Collaborator)
        .unwrap();

    let staff_scope = w.resolver.resolve(staff).unwrap();
    let collab_scope = w.resolver.resolve(collaborator).unwrap();

    assert!(staff_scope.can_see_end_client(client));
    assert!(collab_scope.is_empty());
}

/// Granting the staff member one company flips them from everything to
/// exactly that company.
#[test]
fn staff_grants_narrow_to_exactly_granted_companies() {
    let w = world();
    let granted = CompanyId::new();
    let other = CompanyId::new();
    w.directory.register_company(granted, "Granted").unwrap();
    w.directory.register_company(other, "Other").unwrap();

    let staff = ActorId::new();
    w.directory.register_internal(staff, StaffRole::Developer).unwrap();

    assert_eq!(w.resolver.resolve(staff).unwrap().company_ids.len(), 2);

    w.graph.add_grant(staff, granted).unwrap();
    let scope = w.resolver.resolve(staff).unwrap();
    assert!(scope.can_see_company(granted));
    assert!(!scope.can_see_company(other));
}

/// Spec round-trip: a successful record is queryable by entity ID with
/// byte-for-byte equal state snapshots.
#[test]
fn record_then_query_roundtrips_state_exactly() {
    let w = world();
    let company = CompanyId::new();
    w.directory.register_company(company, "C").unwrap();
    let actor = ActorId::new();
    w.directory
        .register_company_user(actor, company, CompanyRole::Owner)
        .unwrap();

    let store = Arc::new(MemoryAuditStore::new());
    let engine = AuditTrailEngine::new(
        Arc::clone(&store),
        Arc::clone(&w.directory),
        AttributionMap::new().with_entity(EntityName::new("crm.task"), EntityAttribution::crm_default()),
    );

    let prior = json!({
        "title": "draft",
        "tags": ["a", "b"],
        "nested": {"n": 1},
        "company_id": company.as_uuid().to_string(),
    });
    let new = json!({
        "title": "final",
        "tags": ["a"],
        "nested": {"n": 2},
        "company_id": company.as_uuid().to_string(),
    });
    engine.record(
        Some(actor),
        ActionKind::Updated,
        EntityName::new("crm.task"),
        "task-9",
        Some(prior.clone()),
        Some(new.clone()),
    );

    let surface = AuditQuerySurface::new(store);
    let records = surface
        .query(&AuditQuery::default().with_entity_id("task-9"), Page::first(10))
        .unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.prior_state.as_ref(), Some(&prior));
    assert_eq!(record.new_state.as_ref(), Some(&new));
    assert_eq!(record.actor_id, Some(actor));
    assert_eq!(record.company_id, Some(company));
    assert_eq!(record.action, ActionKind::Updated);

    // Byte-for-byte: the serialized snapshots are identical to the inputs.
    assert_eq!(
        serde_json::to_vec(record.prior_state.as_ref().unwrap()).unwrap(),
        serde_json::to_vec(&prior).unwrap()
    );
}

/// A store that fails every append, standing in for a broken backend.
struct BrokenStore;

impl AuditStore for BrokenStore {
    fn append(&self, _record: AuditRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("backend offline".into()))
    }

    fn scan(&self) -> Result<Vec<AuditRecord>, StoreError> {
        Err(StoreError::Unavailable("backend offline".into()))
    }
}

/// Spec failure-isolation scenario: a storage failure inside `record` must
/// not prevent the caller's own mutation from committing.
#[test]
fn audit_failure_never_aborts_the_callers_transaction() {
    let w = world();
    let engine = AuditTrailEngine::new(
        Arc::new(BrokenStore),
        Arc::clone(&w.directory),
        AttributionMap::new(),
    );

    // Stand-in for the caller's business transaction.
    let mut committed_tasks: Vec<String> = Vec::new();

    committed_tasks.push("task-1".into());
    engine.record(
        None,
        ActionKind::Created,
        EntityName::new("crm.task"),
        "task-1",
        None,
        Some(json!({"title": "survives"})),
    );

    // An invalid shape is equally silent on this surface.
    committed_tasks.push("task-2".into());
    engine.record(
        None,
        ActionKind::Created,
        EntityName::new("crm.task"),
        "task-2",
        Some(json!({"impossible": true})),
        Some(json!({})),
    );

    assert_eq!(
        committed_tasks.len(),
        2,
        "the outer transaction commits regardless of audit failures"
    );
    let metrics = engine.metrics();
    assert_eq!(metrics.recorded, 0);
    assert!(metrics.dropped >= 1, "losses are counted, not invisible");
}

/// Deleting a company cascades directory state and delegation state; a
/// previously-granted staff member falls back to the remaining companies.
#[test]
fn company_deletion_cascades_directory_and_graph() {
    let w = world();
    let doomed = CompanyId::new();
    let kept = CompanyId::new();
    w.directory.register_company(doomed, "Doomed").unwrap();
    w.directory.register_company(kept, "Kept").unwrap();
    let kept_client = EndClientId::new();
    w.directory.register_end_client(kept_client, kept).unwrap();

    let staff = ActorId::new();
    w.directory.register_internal(staff, StaffRole::Admin).unwrap();
    w.graph.add_grant(staff, doomed).unwrap();

    // Granted: scope is exactly the doomed company.
    assert!(w.resolver.resolve(staff).unwrap().can_see_company(doomed));

    w.directory.remove_company(doomed).unwrap();
    w.graph.cascade_remove_company(doomed);

    // Grant gone with the company: back to the unrestricted default.
    let scope = w.resolver.resolve(staff).unwrap();
    assert!(scope.can_see_company(kept));
    assert!(scope.can_see_end_client(kept_client));
    assert!(!scope.can_see_company(doomed));
}

/// Query filters compose across the whole pipeline: actor, company, action,
/// and entity filters all AND together.
#[test]
fn query_surface_filters_engine_output() {
    let w = world();
    let company = CompanyId::new();
    w.directory.register_company(company, "C").unwrap();
    let alice = ActorId::new();
    w.directory
        .register_company_user(alice, company, CompanyRole::Owner)
        .unwrap();
    let bob = ActorId::new();
    w.directory
        .register_company_user(bob, company, CompanyRole::Collaborator)
        .unwrap();

    let store = Arc::new(MemoryAuditStore::new());
    let engine = AuditTrailEngine::new(
        Arc::clone(&store),
        Arc::clone(&w.directory),
        AttributionMap::new()
            .with_entity(EntityName::new("crm.task"), EntityAttribution::crm_default()),
    );

    let company_ref = company.as_uuid().to_string();
    engine.record(
        Some(alice),
        ActionKind::Created,
        EntityName::new("crm.task"),
        "t1",
        None,
        Some(json!({"company_id": &company_ref})),
    );
    engine.record(
        Some(bob),
        ActionKind::Updated,
        EntityName::new("crm.task"),
        "t1",
        Some(json!({"company_id": &company_ref})),
        Some(json!({"company_id": &company_ref, "x": 1})),
    );
    // The document payload names no company; that record gets none.
    engine.record(
        Some(alice),
        ActionKind::Deleted,
        EntityName::new("crm.document"),
        "d1",
        Some(json!({})),
        None,
    );

    let surface = AuditQuerySurface::new(store);

    let by_actor = surface
        .query(&AuditQuery::default().with_actor(alice), Page::first(10))
        .unwrap();
    assert_eq!(by_actor.len(), 2);

    let by_actor_and_action = surface
        .query(
            &AuditQuery::default()
                .with_actor(alice)
                .with_action(ActionKind::Deleted),
            Page::first(10),
        )
        .unwrap();
    assert_eq!(by_actor_and_action.len(), 1);
    assert_eq!(by_actor_and_action[0].entity_name, EntityName::new("crm.document"));

    let by_company = surface
        .query(&AuditQuery::default().with_company(company), Page::first(10))
        .unwrap();
    assert_eq!(
        by_company.len(),
        2,
        "only payloads naming the company are attributed to it"
    );
}
