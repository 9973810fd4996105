//! The immutable audit record.

use cairn_types::{ActionKind, ActorId, AuditRecordId, CompanyId, EntityName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One immutable log entry capturing a single mutation.
///
/// Created exactly once per mutation by the engine; never updated or deleted
/// under normal operation — the store API provides no mutation methods, and
/// retention/purge is an external policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record identifier, assigned by the engine.
    pub id: AuditRecordId,
    /// Persist-order sequence, assigned by the store on append. Breaks
    /// timestamp ties so pagination is stable.
    pub sequence: u64,
    /// Company attribution, when the payload carries a declared company
    /// reference field. Absent otherwise.
    pub company_id: Option<CompanyId>,
    /// Actor attribution; absent when no actor could be attributed.
    pub actor_id: Option<ActorId>,
    /// The kind of mutation.
    pub action: ActionKind,
    /// Namespace-qualified entity name, e.g. `crm.task`.
    pub entity_name: EntityName,
    /// The mutated entity's identifier, verbatim from the caller.
    pub entity_id: String,
    /// Snapshot before the mutation. Absent for `created`.
    pub prior_state: Option<Value>,
    /// Snapshot after the mutation. Absent for `deleted`.
    pub new_state: Option<Value>,
    /// When the record was constructed.
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Whether the state-presence combination is legal for the action:
    /// `created` forbids a prior state, `deleted` forbids a new state,
    /// `updated` requires both.
    pub fn shape_is_valid(action: ActionKind, has_prior: bool, has_new: bool) -> bool {
        has_prior == action.requires_prior_state() && has_new == action.requires_new_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(ActionKind::Created, false, true, true; "created with only new state")]
    #[test_case(ActionKind::Created, true, true, false; "created with prior state is invalid")]
    #[test_case(ActionKind::Updated, true, true, true; "updated with both states")]
    #[test_case(ActionKind::Updated, false, true, false; "updated missing prior is invalid")]
    #[test_case(ActionKind::Updated, true, false, false; "updated missing new is invalid")]
    #[test_case(ActionKind::Deleted, true, false, true; "deleted with only prior state")]
    #[test_case(ActionKind::Deleted, true, true, false; "deleted with new state is invalid")]
    #[test_case(ActionKind::Created, false, false, false; "created missing new is invalid")]
    fn test_shape_validation(action: ActionKind, prior: bool, new: bool, valid: bool) {
        assert_eq!(AuditRecord::shape_is_valid(action, prior, new), valid);
    }
}
