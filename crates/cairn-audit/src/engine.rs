//! The audit trail engine: shape validation, attribution, and fail-soft
//! persistence with a bounded write-behind retry buffer.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cairn_identity::IdentityDirectory;
use cairn_types::{ActionKind, ActorId, AuditRecordId, CompanyId, EntityName};
use chrono::Utc;
use crossbeam_queue::ArrayQueue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use crate::attribution::AttributionMap;
use crate::record::AuditRecord;
use crate::store::{AuditStore, StoreError};

/// Audit engine failures.
///
/// These are produced internally and swallowed by [`AuditTrailEngine::record`];
/// only [`AuditTrailEngine::try_record`] surfaces them.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The state-presence combination is illegal for the action.
    #[error(
        "invalid audit shape for {action}: prior_state present={has_prior}, new_state present={has_new}"
    )]
    InvalidAuditShape {
        action: ActionKind,
        has_prior: bool,
        has_new: bool,
    },

    /// Storage failure (visible only through `try_record`).
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, AuditError>;

/// Tuning for the fail-soft side-channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEngineConfig {
    /// Capacity of the write-behind retry buffer. A record that cannot be
    /// appended and finds the buffer full is dropped (and counted).
    pub retry_capacity: usize,
    /// Append attempts per record before it is dropped.
    pub max_retry_attempts: u32,
}

impl Default for AuditEngineConfig {
    fn default() -> Self {
        Self {
            retry_capacity: 1024,
            max_retry_attempts: 3,
        }
    }
}

/// Point-in-time view of the engine's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditMetricsSnapshot {
    /// Records successfully persisted (including via retry).
    pub recorded: u64,
    /// Append attempts made from the retry buffer.
    pub retried: u64,
    /// Records permanently lost: invalid shape, buffer overflow, or retry
    /// exhaustion.
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct Metrics {
    recorded: AtomicU64,
    retried: AtomicU64,
    dropped: AtomicU64,
}

/// What became of one `record` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Appended to the store.
    Persisted(AuditRecordId),
    /// Store failed; the record sits in the retry buffer.
    Buffered(AuditRecordId),
    /// Store failed and the buffer was full; the record is lost.
    Dropped(AuditRecordId),
}

struct Pending {
    record: AuditRecord,
    attempts: u32,
}

/// Fail-soft, append-only recorder of entity mutations.
///
/// The engine runs in-line with the mutation that triggers it but behaves as
/// fire-and-forget from the caller's perspective: [`record`](Self::record)
/// never returns an error and never panics on a failing store. Concurrent
/// mutations each produce an independent record; there is no merging and no
/// locking between audit writes beyond the store's own append.
pub struct AuditTrailEngine<S> {
    store: Arc<S>,
    directory: Arc<IdentityDirectory>,
    attribution: AttributionMap,
    config: AuditEngineConfig,
    retries: ArrayQueue<Pending>,
    metrics: Metrics,
}

impl<S: AuditStore> AuditTrailEngine<S> {
    pub fn new(
        store: Arc<S>,
        directory: Arc<IdentityDirectory>,
        attribution: AttributionMap,
    ) -> Self {
        Self::with_config(store, directory, attribution, AuditEngineConfig::default())
    }

    pub fn with_config(
        store: Arc<S>,
        directory: Arc<IdentityDirectory>,
        attribution: AttributionMap,
        config: AuditEngineConfig,
    ) -> Self {
        let retries = ArrayQueue::new(config.retry_capacity.max(1));
        Self {
            store,
            directory,
            attribution,
            config,
            retries,
            metrics: Metrics::default(),
        }
    }

    /// Records one mutation. Fail-soft: every error — malformed shape,
    /// storage failure, anything — is caught, logged, and swallowed so the
    /// triggering mutation never fails or rolls back because of auditing.
    pub fn record(
        &self,
        actor: Option<ActorId>,
        action: ActionKind,
        entity_name: EntityName,
        entity_id: impl Into<String>,
        prior_state: Option<Value>,
        new_state: Option<Value>,
    ) {
        if let Err(err) = self.try_record(actor, action, entity_name, entity_id, prior_state, new_state)
        {
            // Deliberately swallowed: auditing must never abort the caller.
            error!(error = %err, "audit record rejected");
        }
    }

    /// Like [`record`](Self::record) but surfaces the failure, for callers
    /// that opt in to observing it. A storage failure is NOT an error here —
    /// the record is buffered or dropped and the outcome says which.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::InvalidAuditShape`] for an illegal
    /// state-presence combination; the record is counted as dropped.
    pub fn try_record(
        &self,
        actor: Option<ActorId>,
        action: ActionKind,
        entity_name: EntityName,
        entity_id: impl Into<String>,
        prior_state: Option<Value>,
        new_state: Option<Value>,
    ) -> Result<RecordOutcome> {
        let entity_id = entity_id.into();

        if !AuditRecord::shape_is_valid(action, prior_state.is_some(), new_state.is_some()) {
            self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(AuditError::InvalidAuditShape {
                action,
                has_prior: prior_state.is_some(),
                has_new: new_state.is_some(),
            });
        }

        let (actor_id, company_id) =
            self.attribute(actor, &entity_name, prior_state.as_ref(), new_state.as_ref());

        let record = AuditRecord {
            id: AuditRecordId::new(),
            sequence: 0, // assigned by the store
            company_id,
            actor_id,
            action,
            entity_name,
            entity_id,
            prior_state,
            new_state,
            recorded_at: Utc::now(),
        };

        self.drain_retries();
        Ok(self.persist(record, 1))
    }

    /// Current counter values.
    pub fn metrics(&self) -> AuditMetricsSnapshot {
        AuditMetricsSnapshot {
            recorded: self.metrics.recorded.load(Ordering::Relaxed),
            retried: self.metrics.retried.load(Ordering::Relaxed),
            dropped: self.metrics.dropped.load(Ordering::Relaxed),
        }
    }

    /// Records waiting in the retry buffer.
    pub fn pending_retries(&self) -> usize {
        self.retries.len()
    }

    /// Resolves who and which company the record is attributed to.
    ///
    /// Supplied actor context wins when it resolves; otherwise the entity's
    /// attribution contract is applied to the new state, then the prior
    /// state. An unattributable actor is recorded as absent, never an error.
    ///
    /// Company attribution comes from the payload's declared company field
    /// only. A payload that names no company yields an absent company even
    /// when the attributed actor belongs to one — the record attests what
    /// the mutation carried, not what could be inferred from membership.
    fn attribute(
        &self,
        actor: Option<ActorId>,
        entity_name: &EntityName,
        prior_state: Option<&Value>,
        new_state: Option<&Value>,
    ) -> (Option<ActorId>, Option<CompanyId>) {
        let contract = self.attribution.attribution_for(entity_name);

        let supplied = actor.and_then(|id| match self.directory.resolve(id) {
            Ok(resolved) => Some(resolved),
            Err(err) => {
                warn!(actor = %id, error = %err, "supplied audit actor does not resolve");
                None
            }
        });

        let resolved = supplied.or_else(|| {
            let contract = contract?;
            let id = new_state
                .and_then(|s| contract.extract_actor(s))
                .or_else(|| prior_state.and_then(|s| contract.extract_actor(s)))?;
            self.directory.resolve(id).ok()
        });

        let company = contract.and_then(|c| {
            new_state
                .and_then(|s| c.extract_company(s))
                .or_else(|| prior_state.and_then(|s| c.extract_company(s)))
        });

        (resolved.map(|a| a.id()), company)
    }

    /// Opportunistically re-appends buffered records, dropping any that
    /// exhaust their attempt budget. Bounded by the buffer length at entry,
    /// so a persistently failing store cannot spin here.
    fn drain_retries(&self) {
        for _ in 0..self.retries.len() {
            let Some(pending) = self.retries.pop() else {
                break;
            };
            self.metrics.retried.fetch_add(1, Ordering::Relaxed);
            match self.store.append(pending.record.clone()) {
                Ok(()) => {
                    self.metrics.recorded.fetch_add(1, Ordering::Relaxed);
                }
                Err(err) => {
                    let attempts = pending.attempts + 1;
                    if attempts >= self.config.max_retry_attempts {
                        self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                        error!(
                            record = %pending.record.id,
                            attempts,
                            error = %err,
                            "audit record dropped after retry exhaustion"
                        );
                    } else if self
                        .retries
                        .push(Pending {
                            record: pending.record,
                            attempts,
                        })
                        .is_err()
                    {
                        self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                        error!(error = %err, "audit retry buffer full; record dropped");
                    }
                }
            }
        }
    }

    fn persist(&self, record: AuditRecord, attempts: u32) -> RecordOutcome {
        let id = record.id;
        match self.store.append(record.clone()) {
            Ok(()) => {
                self.metrics.recorded.fetch_add(1, Ordering::Relaxed);
                RecordOutcome::Persisted(id)
            }
            Err(err) => {
                warn!(record = %id, error = %err, "audit append failed; buffering");
                if self.retries.push(Pending { record, attempts }).is_ok() {
                    RecordOutcome::Buffered(id)
                } else {
                    self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                    error!(record = %id, "audit retry buffer full; record dropped");
                    RecordOutcome::Dropped(id)
                }
            }
        }
    }
}
