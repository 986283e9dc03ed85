// crates/outbox-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Doubles
// Description: Shared mocks for transport, notifier, probe, and store.
// Purpose: Drive runtime components deterministically in tests.
// Dependencies: outbox-core
// ============================================================================

//! Shared test doubles for the runtime test suites.

#![allow(
    dead_code,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only helpers; not every suite uses every double."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::mpsc::Receiver;

use outbox_core::Clock;
use outbox_core::ConnectivityProbe;
use outbox_core::InMemoryQueueStore;
use outbox_core::Notifier;
use outbox_core::NotifyError;
use outbox_core::OperationId;
use outbox_core::QueueName;
use outbox_core::QueueStore;
use outbox_core::QueuedOperation;
use outbox_core::ReplayTransport;
use outbox_core::StoreError;
use outbox_core::SyncEvent;
use outbox_core::Timestamp;
use outbox_core::TransportError;
use outbox_core::TransportReply;
use outbox_core::WriteMethod;
use outbox_core::WriteRequest;

/// Transport replaying a scripted sequence of results.
///
/// Once the script is exhausted every further send succeeds with a 200.
pub struct ScriptedTransport {
    /// Remaining scripted results, consumed front to back.
    script: Mutex<Vec<Result<TransportReply, TransportError>>>,
    /// Requests observed, in send order.
    sent: Mutex<Vec<WriteRequest>>,
}

impl ScriptedTransport {
    /// Creates a transport that always answers 200.
    pub fn always_ok() -> Self {
        Self::with_script(Vec::new())
    }

    /// Creates a transport with an explicit result script.
    pub fn with_script(script: Vec<Result<TransportReply, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of sends observed.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("sent lock").len()
    }

    /// Returns the URLs observed, in send order.
    pub fn sent_urls(&self) -> Vec<String> {
        self.sent.lock().expect("sent lock").iter().map(|request| request.url.clone()).collect()
    }
}

impl ReplayTransport for ScriptedTransport {
    fn send(&self, request: &WriteRequest) -> Result<TransportReply, TransportError> {
        self.sent.lock().expect("sent lock").push(request.clone());
        let mut script = self.script.lock().expect("script lock");
        if script.is_empty() {
            return Ok(TransportReply {
                status: 200,
                body: Vec::new(),
            });
        }
        script.remove(0)
    }
}

/// Transport that blocks each send until the test releases it.
pub struct GatedTransport {
    /// Release channel; one recv per send.
    gate: Mutex<Receiver<()>>,
    /// Number of sends observed.
    sent: AtomicUsize,
}

impl GatedTransport {
    /// Creates a transport gated by the given receiver.
    pub fn new(gate: Receiver<()>) -> Self {
        Self {
            gate: Mutex::new(gate),
            sent: AtomicUsize::new(0),
        }
    }

    /// Returns the number of sends observed.
    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

impl ReplayTransport for GatedTransport {
    fn send(&self, _request: &WriteRequest) -> Result<TransportReply, TransportError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().expect("gate lock");
        let _ = gate.recv();
        Ok(TransportReply {
            status: 200,
            body: Vec::new(),
        })
    }
}

/// Notifier collecting every event for later assertions.
#[derive(Default)]
pub struct CollectingNotifier {
    /// Events observed, in delivery order.
    events: Mutex<Vec<SyncEvent>>,
}

impl CollectingNotifier {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the observed events.
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().expect("events lock").clone()
    }

    /// Counts observed events matching the predicate.
    pub fn count_matching(&self, predicate: impl Fn(&SyncEvent) -> bool) -> usize {
        self.events.lock().expect("events lock").iter().filter(|event| predicate(event)).count()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, event: &SyncEvent) -> Result<(), NotifyError> {
        self.events.lock().expect("events lock").push(event.clone());
        Ok(())
    }
}

/// Probe backed by a shared atomic toggle.
pub struct ToggleProbe {
    /// Shared connectivity flag.
    online: Arc<AtomicBool>,
}

impl ToggleProbe {
    /// Creates a probe and returns the shared toggle alongside it.
    pub fn new(initially_online: bool) -> (Self, Arc<AtomicBool>) {
        let online = Arc::new(AtomicBool::new(initially_online));
        (
            Self {
                online: Arc::clone(&online),
            },
            online,
        )
    }
}

impl ConnectivityProbe for ToggleProbe {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Clock returning a fixed logical timestamp.
pub struct FixedClock {
    /// Timestamp returned by every call.
    pub at: Timestamp,
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.at
    }
}

/// Store that declines every call with `Unavailable`.
pub struct UnavailableStore {
    /// Queue namespace reported by the store.
    queue: QueueName,
}

impl UnavailableStore {
    /// Creates an unavailable store for the given namespace.
    pub fn new(queue: QueueName) -> Self {
        Self {
            queue,
        }
    }

    /// The error returned by every operation.
    fn unavailable<T>() -> Result<T, StoreError> {
        Err(StoreError::Unavailable("durable storage disabled on this host".to_string()))
    }
}

impl QueueStore for UnavailableStore {
    fn queue(&self) -> &QueueName {
        &self.queue
    }

    fn enqueue(
        &self,
        _request: &WriteRequest,
        _created_at: Timestamp,
    ) -> Result<QueuedOperation, StoreError> {
        Self::unavailable()
    }

    fn load_pending(&self) -> Result<Vec<QueuedOperation>, StoreError> {
        Self::unavailable()
    }

    fn mark_syncing(&self, _id: OperationId) -> Result<(), StoreError> {
        Self::unavailable()
    }

    fn mark_completed(&self, _id: OperationId) -> Result<(), StoreError> {
        Self::unavailable()
    }

    fn mark_pending_retry(
        &self,
        _id: OperationId,
        _retry_count: u32,
        _last_error: &str,
    ) -> Result<(), StoreError> {
        Self::unavailable()
    }

    fn mark_failed(&self, _id: OperationId, _last_error: &str) -> Result<(), StoreError> {
        Self::unavailable()
    }

    fn delete(&self, _id: OperationId) -> Result<(), StoreError> {
        Self::unavailable()
    }

    fn delete_completed(&self) -> Result<u64, StoreError> {
        Self::unavailable()
    }

    fn purge_failed(&self) -> Result<u64, StoreError> {
        Self::unavailable()
    }

    fn pending_count(&self) -> Result<u64, StoreError> {
        Self::unavailable()
    }

    fn failed_count(&self) -> Result<u64, StoreError> {
        Self::unavailable()
    }

    fn load_failed(&self) -> Result<Vec<QueuedOperation>, StoreError> {
        Self::unavailable()
    }
}

/// Store delegating to an in-memory queue with injected read failures.
pub struct FlakyStore {
    /// Backing store for the operations that still succeed.
    inner: InMemoryQueueStore,
    /// Whether `load_pending` fails.
    fail_loads: bool,
    /// Whether `pending_count` fails.
    fail_counts: bool,
}

impl FlakyStore {
    /// Creates a store whose `load_pending` always fails.
    pub fn failing_loads(queue: QueueName) -> Self {
        Self {
            inner: InMemoryQueueStore::new(queue),
            fail_loads: true,
            fail_counts: false,
        }
    }

    /// Creates a store whose `pending_count` always fails.
    pub fn failing_counts(queue: QueueName) -> Self {
        Self {
            inner: InMemoryQueueStore::new(queue),
            fail_loads: false,
            fail_counts: true,
        }
    }

    /// The injected read failure.
    fn broken<T>() -> Result<T, StoreError> {
        Err(StoreError::Db("database file is locked".to_string()))
    }
}

impl QueueStore for FlakyStore {
    fn queue(&self) -> &QueueName {
        self.inner.queue()
    }

    fn enqueue(
        &self,
        request: &WriteRequest,
        created_at: Timestamp,
    ) -> Result<QueuedOperation, StoreError> {
        self.inner.enqueue(request, created_at)
    }

    fn load_pending(&self) -> Result<Vec<QueuedOperation>, StoreError> {
        if self.fail_loads {
            return Self::broken();
        }
        self.inner.load_pending()
    }

    fn mark_syncing(&self, id: OperationId) -> Result<(), StoreError> {
        self.inner.mark_syncing(id)
    }

    fn mark_completed(&self, id: OperationId) -> Result<(), StoreError> {
        self.inner.mark_completed(id)
    }

    fn mark_pending_retry(
        &self,
        id: OperationId,
        retry_count: u32,
        last_error: &str,
    ) -> Result<(), StoreError> {
        self.inner.mark_pending_retry(id, retry_count, last_error)
    }

    fn mark_failed(&self, id: OperationId, last_error: &str) -> Result<(), StoreError> {
        self.inner.mark_failed(id, last_error)
    }

    fn delete(&self, id: OperationId) -> Result<(), StoreError> {
        self.inner.delete(id)
    }

    fn delete_completed(&self) -> Result<u64, StoreError> {
        self.inner.delete_completed()
    }

    fn purge_failed(&self) -> Result<u64, StoreError> {
        self.inner.purge_failed()
    }

    fn pending_count(&self) -> Result<u64, StoreError> {
        if self.fail_counts {
            return Self::broken();
        }
        self.inner.pending_count()
    }

    fn failed_count(&self) -> Result<u64, StoreError> {
        self.inner.failed_count()
    }

    fn load_failed(&self) -> Result<Vec<QueuedOperation>, StoreError> {
        self.inner.load_failed()
    }
}

/// Builds a POST request against the given path.
pub fn sample_request(path: &str) -> WriteRequest {
    WriteRequest::new(format!("https://api.example.com{path}"), WriteMethod::Post)
        .header("content-type", "application/json")
        .body(br#"{"op":"create"}"#.to_vec())
}
