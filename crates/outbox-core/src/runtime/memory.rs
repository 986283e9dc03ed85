// crates/outbox-core/src/runtime/memory.rs
// ============================================================================
// Module: Outbox In-Memory Queue Store
// Description: Non-durable QueueStore for tests and ephemeral hosts.
// Purpose: Provide a reference store implementation with full port semantics.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryQueueStore`] implements the full [`QueueStore`] contract over a
//! mutex-guarded map. It provides no durability and exists for tests and
//! hosts that explicitly opt out of persistence; replay ordering and status
//! transition semantics match the durable store exactly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::core::operation::OperationId;
use crate::core::operation::OperationStatus;
use crate::core::operation::QueueName;
use crate::core::operation::QueuedOperation;
use crate::core::operation::WriteRequest;
use crate::core::time::Timestamp;
use crate::interfaces::QueueStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Mutable store state behind the mutex.
#[derive(Debug, Default)]
struct MemoryState {
    /// Next identifier to assign.
    next_id: i64,
    /// Records keyed by identifier; key order matches assignment order.
    records: BTreeMap<i64, QueuedOperation>,
}

/// Non-durable queue store for tests and ephemeral hosts.
///
/// # Invariants
/// - Identifiers are assigned monotonically and never reused.
/// - `load_pending` order matches the durable store: (`created_at`, `id`).
#[derive(Debug)]
pub struct InMemoryQueueStore {
    /// Owning queue namespace.
    queue: QueueName,
    /// Guarded store state.
    state: Mutex<MemoryState>,
}

impl InMemoryQueueStore {
    /// Creates an empty store for the given queue namespace.
    #[must_use]
    pub fn new(queue: QueueName) -> Self {
        Self {
            queue,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Runs a closure over the locked state, mapping poisoning to a store error.
    fn with_state<T>(
        &self,
        apply: impl FnOnce(&mut MemoryState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| StoreError::Db("memory store mutex poisoned".to_string()))?;
        apply(&mut guard)
    }

    /// Applies a status transition to one record.
    fn transition(
        &self,
        id: OperationId,
        apply: impl FnOnce(&mut QueuedOperation),
    ) -> Result<(), StoreError> {
        self.with_state(|state| {
            let record = state.records.get_mut(&id.get()).ok_or(StoreError::NotFound(id))?;
            apply(record);
            Ok(())
        })
    }

    /// Loads records with the given status in replay order.
    fn load_by_status(&self, status: OperationStatus) -> Result<Vec<QueuedOperation>, StoreError> {
        self.with_state(|state| {
            let mut records: Vec<QueuedOperation> = state
                .records
                .values()
                .filter(|record| record.status == status)
                .cloned()
                .collect();
            records.sort_by_key(|record| (record.created_at.order_key(), record.id));
            Ok(records)
        })
    }

    /// Counts records with the given status.
    fn count_by_status(&self, status: OperationStatus) -> Result<u64, StoreError> {
        self.with_state(|state| {
            let count = state.records.values().filter(|record| record.status == status).count();
            Ok(count as u64)
        })
    }
}

impl QueueStore for InMemoryQueueStore {
    fn queue(&self) -> &QueueName {
        &self.queue
    }

    fn enqueue(
        &self,
        request: &WriteRequest,
        created_at: Timestamp,
    ) -> Result<QueuedOperation, StoreError> {
        self.with_state(|state| {
            state.next_id += 1;
            let record = QueuedOperation {
                id: OperationId::new(state.next_id),
                queue: self.queue.clone(),
                request: request.clone(),
                created_at,
                retry_count: 0,
                status: OperationStatus::Pending,
                last_error: None,
            };
            state.records.insert(state.next_id, record.clone());
            Ok(record)
        })
    }

    fn load_pending(&self) -> Result<Vec<QueuedOperation>, StoreError> {
        self.load_by_status(OperationStatus::Pending)
    }

    fn mark_syncing(&self, id: OperationId) -> Result<(), StoreError> {
        self.transition(id, |record| record.status = OperationStatus::Syncing)
    }

    fn mark_completed(&self, id: OperationId) -> Result<(), StoreError> {
        self.transition(id, |record| record.status = OperationStatus::Completed)
    }

    fn mark_pending_retry(
        &self,
        id: OperationId,
        retry_count: u32,
        last_error: &str,
    ) -> Result<(), StoreError> {
        self.transition(id, |record| {
            record.status = OperationStatus::Pending;
            record.retry_count = retry_count;
            record.last_error = Some(last_error.to_string());
        })
    }

    fn mark_failed(&self, id: OperationId, last_error: &str) -> Result<(), StoreError> {
        self.transition(id, |record| {
            record.status = OperationStatus::Failed;
            record.last_error = Some(last_error.to_string());
        })
    }

    fn delete(&self, id: OperationId) -> Result<(), StoreError> {
        self.with_state(|state| {
            state.records.remove(&id.get()).ok_or(StoreError::NotFound(id))?;
            Ok(())
        })
    }

    fn delete_completed(&self) -> Result<u64, StoreError> {
        self.with_state(|state| {
            let before = state.records.len();
            state.records.retain(|_, record| record.status != OperationStatus::Completed);
            Ok((before - state.records.len()) as u64)
        })
    }

    fn purge_failed(&self) -> Result<u64, StoreError> {
        self.with_state(|state| {
            let before = state.records.len();
            state.records.retain(|_, record| record.status != OperationStatus::Failed);
            Ok((before - state.records.len()) as u64)
        })
    }

    fn pending_count(&self) -> Result<u64, StoreError> {
        self.count_by_status(OperationStatus::Pending)
    }

    fn failed_count(&self) -> Result<u64, StoreError> {
        self.count_by_status(OperationStatus::Failed)
    }

    fn load_failed(&self) -> Result<Vec<QueuedOperation>, StoreError> {
        self.load_by_status(OperationStatus::Failed)
    }
}
