use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use spherolink_frame::{Failure, Response};
use tracing::debug;

use crate::error::{DeviceError, Result};
use crate::sync::lock;

const FIRST_SEQUENCE: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum WaitKey {
    Sequence(u8),
    /// The forwarded level-1 diagnostic dump, which arrives as an async message.
    Diagnostic,
}

#[derive(Default)]
struct Waiter {
    slot: Mutex<Option<Response>>,
    ready: Condvar,
}

impl Waiter {
    fn fulfill(&self, response: Response) {
        *lock(&self.slot) = Some(response);
        self.ready.notify_all();
    }
}

struct Table {
    next: u8,
    waiters: HashMap<WaitKey, Arc<Waiter>>,
    closed: bool,
}

/// Matches replies to the requests waiting for them.
///
/// One lock guards both the sequence counter and the waiter table. It is held
/// only to look up, insert or remove entries, never while a caller waits.
pub struct Correlator {
    table: Mutex<Table>,
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

impl Correlator {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(Table {
                next: FIRST_SEQUENCE,
                waiters: HashMap::new(),
                closed: false,
            }),
        }
    }

    /// Allocate the next free sequence number and register a waiter for it.
    ///
    /// Numbers run 1..=255 and wrap, skipping 0 and any number whose request
    /// is still outstanding.
    pub fn reserve(self: &Arc<Self>) -> Result<Pending> {
        let mut table = lock(&self.table);
        if table.closed {
            return Err(DeviceError::Disconnected);
        }

        for _ in 0..u8::MAX {
            let candidate = table.next;
            table.next = if candidate == u8::MAX {
                FIRST_SEQUENCE
            } else {
                candidate + 1
            };

            let key = WaitKey::Sequence(candidate);
            if !table.waiters.contains_key(&key) {
                return Ok(self.register(&mut table, key));
            }
        }

        Err(DeviceError::SequenceExhausted)
    }

    /// Register the single diagnostic waiter.
    pub fn reserve_diagnostic(self: &Arc<Self>) -> Result<Pending> {
        let mut table = lock(&self.table);
        if table.closed {
            return Err(DeviceError::Disconnected);
        }
        if table.waiters.contains_key(&WaitKey::Diagnostic) {
            return Err(DeviceError::DiagnosticPending);
        }
        Ok(self.register(&mut table, WaitKey::Diagnostic))
    }

    fn register(self: &Arc<Self>, table: &mut Table, key: WaitKey) -> Pending {
        let waiter = Arc::new(Waiter::default());
        table.waiters.insert(key, Arc::clone(&waiter));
        Pending {
            correlator: Arc::clone(self),
            key,
            waiter,
        }
    }

    /// Deliver a reply. Returns `false` when nobody is waiting for `sequence`.
    pub fn complete(&self, sequence: u8, response: Response) -> bool {
        self.deliver(WaitKey::Sequence(sequence), response)
    }

    /// Deliver the forwarded diagnostic dump.
    pub fn complete_diagnostic(&self, response: Response) -> bool {
        self.deliver(WaitKey::Diagnostic, response)
    }

    fn deliver(&self, key: WaitKey, response: Response) -> bool {
        let waiter = lock(&self.table).waiters.remove(&key);
        match waiter {
            Some(waiter) => {
                waiter.fulfill(response);
                true
            }
            None => {
                debug!(?key, "dropping reply with no waiter");
                false
            }
        }
    }

    /// Complete every outstanding waiter and refuse new reservations.
    pub fn fail_all(&self, failure: Failure) {
        let waiters: Vec<_> = {
            let mut table = lock(&self.table);
            table.closed = true;
            table.waiters.drain().map(|(_, waiter)| waiter).collect()
        };
        if !waiters.is_empty() {
            debug!(count = waiters.len(), %failure, "failing outstanding requests");
        }
        for waiter in waiters {
            waiter.fulfill(Response::Failure(failure));
        }
    }

    /// Requests currently awaiting a reply.
    pub fn outstanding(&self) -> usize {
        lock(&self.table).waiters.len()
    }

    /// Whether [`fail_all`](Self::fail_all) has run.
    pub fn is_closed(&self) -> bool {
        lock(&self.table).closed
    }

    fn retire(&self, key: WaitKey, waiter: &Arc<Waiter>) {
        let mut table = lock(&self.table);
        if table
            .waiters
            .get(&key)
            .is_some_and(|current| Arc::ptr_eq(current, waiter))
        {
            table.waiters.remove(&key);
        }
    }
}

/// A registered waiter. Dropping it without a reply retires the registration.
pub struct Pending {
    correlator: Arc<Correlator>,
    key: WaitKey,
    waiter: Arc<Waiter>,
}

impl Pending {
    /// Sequence number to put on the wire; `0` for the diagnostic waiter.
    pub fn sequence(&self) -> u8 {
        match self.key {
            WaitKey::Sequence(sequence) => sequence,
            WaitKey::Diagnostic => 0,
        }
    }

    /// Block until the reply arrives or `timeout` elapses.
    pub fn wait(self, timeout: Duration) -> Response {
        let slot = lock(&self.waiter.slot);
        let (mut slot, _) = self
            .waiter
            .ready
            .wait_timeout_while(slot, timeout, |slot| slot.is_none())
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        match slot.take() {
            Some(response) => response,
            None => {
                debug!(key = ?self.key, ?timeout, "request timed out");
                Response::Failure(Failure::Timeout(timeout))
            }
        }
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        self.correlator.retire(self.key, &self.waiter);
    }
}

impl std::fmt::Debug for Pending {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pending").field("key", &self.key).finish()
    }
}
