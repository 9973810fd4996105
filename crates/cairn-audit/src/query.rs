//! Read-side access to audit records: filtered, paginated, ordered by
//! timestamp descending.

use std::sync::Arc;

use cairn_types::{ActionKind, ActorId, CompanyId, EntityName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::AuditRecord;
use crate::store::{AuditStore, StoreError};

/// Inclusive time range filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.from && at <= self.to
    }
}

/// Query filter for audit records.
///
/// All fields are optional; absent fields mean "any". When multiple fields
/// are set they combine with AND logic. Use the builder methods for
/// ergonomic construction.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AuditQuery {
    pub entity_name: Option<EntityName>,
    pub entity_id: Option<String>,
    pub actor_id: Option<ActorId>,
    pub company_id: Option<CompanyId>,
    pub action: Option<ActionKind>,
    pub time_range: Option<TimeRange>,
}

impl AuditQuery {
    /// Filter by namespace-qualified entity name.
    pub fn with_entity(mut self, entity: EntityName) -> Self {
        self.entity_name = Some(entity);
        self
    }

    /// Filter by the mutated entity's ID.
    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Filter by attributed actor.
    pub fn with_actor(mut self, actor: ActorId) -> Self {
        self.actor_id = Some(actor);
        self
    }

    /// Filter by attributed company.
    pub fn with_company(mut self, company: CompanyId) -> Self {
        self.company_id = Some(company);
        self
    }

    /// Filter by mutation kind.
    pub fn with_action(mut self, action: ActionKind) -> Self {
        self.action = Some(action);
        self
    }

    /// Filter to records within a time range (inclusive).
    pub fn with_time_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.time_range = Some(TimeRange { from, to });
        self
    }

    fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(entity) = &self.entity_name {
            if record.entity_name != *entity {
                return false;
            }
        }
        if let Some(entity_id) = &self.entity_id {
            if record.entity_id != *entity_id {
                return false;
            }
        }
        if let Some(actor) = self.actor_id {
            if record.actor_id != Some(actor) {
                return false;
            }
        }
        if let Some(company) = self.company_id {
            if record.company_id != Some(company) {
                return false;
            }
        }
        if let Some(action) = self.action {
            if record.action != action {
                return false;
            }
        }
        if let Some(range) = self.time_range {
            if !range.contains(record.recorded_at) {
                return false;
            }
        }
        true
    }
}

/// One page of a query: skip `offset` matching records, return at most
/// `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// The first page of the given size.
    pub fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }

    /// The page after this one.
    pub fn next(self) -> Self {
        Self {
            offset: self.offset + self.limit,
            limit: self.limit,
        }
    }
}

/// Read-only query surface over an audit store.
#[derive(Debug, Clone)]
pub struct AuditQuerySurface<S> {
    store: Arc<S>,
}

impl<S: AuditStore> AuditQuerySurface<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the page of records matching the filter, newest first.
    /// Timestamp ties break on the store-assigned sequence, so pagination
    /// is stable across calls over an unchanged store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying scan fails. Unlike the
    /// engine's write path, the read path is not fail-soft — a reporting
    /// caller needs to know its answer is incomplete.
    pub fn query(
        &self,
        filter: &AuditQuery,
        page: Page,
    ) -> Result<Vec<AuditRecord>, StoreError> {
        let mut records = self.store.scan()?;
        records.retain(|r| filter.matches(r));
        records.sort_by(|a, b| {
            (b.recorded_at, b.sequence).cmp(&(a.recorded_at, a.sequence))
        });
        Ok(records
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect())
    }
}
