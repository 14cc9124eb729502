use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use spherolink_frame::AsyncMessage;
use tracing::debug;

use crate::error::Result;
use crate::pool::{Backpressure, HandlerPool, Submitted};

/// Callback for one async event code.
pub type Handler = Arc<dyn Fn(AsyncMessage) + Send + Sync + 'static>;

/// Collects handlers before the router is built.
pub struct EventRouterBuilder {
    handlers: HashMap<u8, Handler>,
    workers: usize,
    queue_depth: usize,
    backpressure: Backpressure,
}

impl Default for EventRouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRouterBuilder {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            workers: 1,
            queue_depth: 1,
            backpressure: Backpressure::default(),
        }
    }

    /// Register `handler` for `code`, replacing any earlier registration.
    pub fn on(mut self, code: u8, handler: impl Fn(AsyncMessage) + Send + Sync + 'static) -> Self {
        self.handlers.insert(code, Arc::new(handler));
        self
    }

    pub(crate) fn on_shared(mut self, code: u8, handler: Handler) -> Self {
        self.handlers.insert(code, handler);
        self
    }

    /// Handler pool sizing.
    pub fn pool(mut self, workers: usize, queue_depth: usize, backpressure: Backpressure) -> Self {
        self.workers = workers;
        self.queue_depth = queue_depth;
        self.backpressure = backpressure;
        self
    }

    /// Freeze the table and start the handler pool.
    pub fn build(self) -> Result<EventRouter> {
        let pool = HandlerPool::new(self.workers, self.queue_depth, self.backpressure)?;
        Ok(EventRouter {
            handlers: self.handlers,
            pool,
        })
    }
}

/// Routes async messages to handlers by event code.
///
/// The table is immutable once built. Handlers run on the pool, never on the
/// caller's thread.
pub struct EventRouter {
    handlers: HashMap<u8, Handler>,
    pool: HandlerPool,
}

impl EventRouter {
    pub fn builder() -> EventRouterBuilder {
        EventRouterBuilder::new()
    }

    /// Queue `message` for its handler. Unknown codes are ignored.
    pub fn dispatch(&self, message: AsyncMessage) -> Option<Submitted> {
        let Some(handler) = self.handlers.get(&message.event) else {
            debug!(
                event = message.event,
                len = message.payload.len(),
                "ignoring async message with no handler"
            );
            return None;
        };

        let handler = Arc::clone(handler);
        Some(self.pool.submit(move || handler(message)))
    }

    pub fn handles(&self, code: u8) -> bool {
        self.handlers.contains_key(&code)
    }

    pub fn pool(&self) -> &HandlerPool {
        &self.pool
    }

    /// Stop the pool after draining queued events.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut codes: Vec<_> = self.handlers.keys().copied().collect();
        codes.sort_unstable();
        f.debug_struct("EventRouter").field("codes", &codes).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;

    fn message(event: u8, payload: &'static [u8]) -> AsyncMessage {
        AsyncMessage {
            event,
            payload: Bytes::from_static(payload),
        }
    }

    #[test]
    fn routes_by_code() {
        let (tx, rx) = mpsc::channel();
        let power_tx = tx.clone();
        let router = EventRouter::builder()
            .on(0x01, move |msg| power_tx.send(("power", msg.payload)).unwrap())
            .on(0x07, move |msg| tx.send(("collision", msg.payload)).unwrap())
            .pool(2, 8, Backpressure::Block)
            .build()
            .unwrap();

        assert_eq!(router.dispatch(message(0x07, b"c")), Some(Submitted::Queued));
        let (name, payload) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!((name, payload.as_ref()), ("collision", b"c".as_ref()));

        router.dispatch(message(0x01, b"\x02"));
        let (name, _) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(name, "power");
    }

    #[test]
    fn unknown_code_is_ignored() {
        let router = EventRouter::builder()
            .on(0x01, |_| panic!("must not run"))
            .build()
            .unwrap();
        assert_eq!(router.dispatch(message(0x42, b"")), None);
        assert!(router.handles(0x01));
        assert!(!router.handles(0x42));
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let (tx, rx) = mpsc::channel();
        let router = EventRouter::builder()
            .on(0x03, |_| panic!("replaced handler ran"))
            .on(0x03, move |_| tx.send(()).unwrap())
            .build()
            .unwrap();
        router.dispatch(message(0x03, b""));
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        router.shutdown();
    }
}
