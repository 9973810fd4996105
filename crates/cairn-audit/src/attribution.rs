//! Actor and company attribution from state payloads.
//!
//! The map is an explicit, testable contract supplied by the surrounding
//! schema layer: each monitored entity declares which payload fields name
//! the responsible actor and the owning company. Entities without an entry
//! get no payload attribution at all — there is no runtime sniffing of
//! arbitrary payload shapes.

use std::collections::HashMap;

use cairn_types::{ActorId, CompanyId, EntityName};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Attribution contract for one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityAttribution {
    /// Candidate actor fields, checked in declaration order. The first field
    /// present in the payload wins.
    pub actor_fields: Vec<String>,
    /// Field naming the owning company, if the entity carries one.
    pub company_field: Option<String>,
}

impl EntityAttribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a candidate actor field. Earlier fields take priority.
    pub fn with_actor_field(mut self, field: impl Into<String>) -> Self {
        self.actor_fields.push(field.into());
        self
    }

    pub fn with_company_field(mut self, field: impl Into<String>) -> Self {
        self.company_field = Some(field.into());
        self
    }

    /// The conventional CRM attribution: a responsible-user field, then a
    /// generic user field, then a creator field, with `company_id` as the
    /// company reference.
    pub fn crm_default() -> Self {
        Self::new()
            .with_actor_field("responsible_user_id")
            .with_actor_field("user_id")
            .with_actor_field("creator_id")
            .with_company_field("company_id")
    }

    /// First actor reference found in the payload, by field priority.
    pub fn extract_actor(&self, payload: &Value) -> Option<ActorId> {
        self.actor_fields
            .iter()
            .find_map(|field| uuid_field(payload, field))
            .map(ActorId::from)
    }

    /// Company reference from the payload, if declared and present.
    pub fn extract_company(&self, payload: &Value) -> Option<CompanyId> {
        let field = self.company_field.as_deref()?;
        uuid_field(payload, field).map(CompanyId::from)
    }
}

fn uuid_field(payload: &Value, field: &str) -> Option<Uuid> {
    payload.get(field)?.as_str()?.parse().ok()
}

/// Mapping from entity name to its attribution contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionMap {
    entries: HashMap<EntityName, EntityAttribution>,
}

impl AttributionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the attribution contract for one entity.
    pub fn with_entity(mut self, entity: EntityName, attribution: EntityAttribution) -> Self {
        self.entries.insert(entity, attribution);
        self
    }

    pub fn attribution_for(&self, entity: &EntityName) -> Option<&EntityAttribution> {
        self.entries.get(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_actor_fields_checked_in_priority_order() {
        let actor_a = Uuid::new_v4();
        let actor_b = Uuid::new_v4();
        let attribution = EntityAttribution::crm_default();

        let payload = json!({
            "user_id": actor_b.to_string(),
            "responsible_user_id": actor_a.to_string(),
        });
        assert_eq!(
            attribution.extract_actor(&payload),
            Some(ActorId::from(actor_a)),
            "responsible_user_id must win over user_id"
        );

        let payload = json!({ "creator_id": actor_b.to_string() });
        assert_eq!(
            attribution.extract_actor(&payload),
            Some(ActorId::from(actor_b))
        );
    }

    #[test]
    fn test_missing_fields_yield_no_attribution() {
        let attribution = EntityAttribution::crm_default();
        let payload = json!({ "title": "no actors here" });
        assert_eq!(attribution.extract_actor(&payload), None);
        assert_eq!(attribution.extract_company(&payload), None);
    }

    #[test]
    fn test_non_uuid_field_values_ignored() {
        let attribution = EntityAttribution::crm_default();
        let payload = json!({ "user_id": "not-a-uuid", "company_id": 42 });
        assert_eq!(attribution.extract_actor(&payload), None);
        assert_eq!(attribution.extract_company(&payload), None);
    }

    #[test]
    fn test_map_lookup_by_entity() {
        let map = AttributionMap::new()
            .with_entity(EntityName::new("crm.task"), EntityAttribution::crm_default())
            .with_entity(
                EntityName::new("crm.document"),
                EntityAttribution::new().with_actor_field("uploaded_by"),
            );

        assert!(map.attribution_for(&EntityName::new("crm.task")).is_some());
        assert!(map.attribution_for(&EntityName::new("crm.plan")).is_none());

        let doc = map
            .attribution_for(&EntityName::new("crm.document"))
            .unwrap();
        let actor = Uuid::new_v4();
        let payload = json!({ "uploaded_by": actor.to_string() });
        assert_eq!(doc.extract_actor(&payload), Some(ActorId::from(actor)));
    }
}
