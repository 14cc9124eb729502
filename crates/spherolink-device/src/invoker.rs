use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use spherolink_frame::{Envelope, EnvelopeWriter, FrameError, Response};
use spherolink_transport::{Transport, TransportError, TransportWriter};
use tracing::{debug, warn};

use crate::correlator::{Correlator, Pending};
use crate::error::{DeviceError, Result};
use crate::sync::lock;

/// Sends commands and waits for their acknowledgments.
///
/// One lock serializes encoding and transmission; waiting happens outside it,
/// so concurrent callers only contend for the wire.
pub struct Invoker {
    correlator: Arc<Correlator>,
    writer: Mutex<EnvelopeWriter<TransportWriter>>,
    response_timeout: Duration,
}

impl Invoker {
    pub fn new(
        transport: Arc<dyn Transport>,
        correlator: Arc<Correlator>,
        response_timeout: Duration,
    ) -> Self {
        Self {
            correlator,
            writer: Mutex::new(EnvelopeWriter::new(TransportWriter::new(transport))),
            response_timeout,
        }
    }

    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    /// Send one command.
    ///
    /// Without `expect_response` the envelope carries sequence 0 and an empty
    /// success is returned as soon as it is written.
    pub fn send(
        &self,
        device_id: u8,
        command_id: u8,
        payload: impl Into<Bytes>,
        expect_response: bool,
    ) -> Result<Response> {
        let envelope = Envelope::new(device_id, command_id, payload);
        if !expect_response {
            self.transmit(&envelope)?;
            return Ok(Response::empty());
        }

        let pending = self.correlator.reserve()?;
        let envelope = envelope.expecting_response(pending.sequence());
        self.transmit(&envelope)?;
        Ok(pending.wait(self.response_timeout))
    }

    /// Send a command until it succeeds or `max_attempts` are used up.
    ///
    /// Timeouts and device status failures are retried, each attempt under a
    /// fresh sequence number. Unsupported-length and disconnect failures are
    /// returned at once.
    pub fn send_with_retry(
        &self,
        device_id: u8,
        command_id: u8,
        payload: impl Into<Bytes>,
        expect_response: bool,
        max_attempts: u32,
    ) -> Result<Response> {
        let payload = payload.into();
        let attempts = max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let response = self.send(device_id, command_id, payload.clone(), expect_response)?;
            if response.is_success() || !response.is_retryable() {
                return Ok(response);
            }
            if attempt >= attempts {
                warn!(
                    device_id,
                    command_id,
                    attempts,
                    reason = response.description().as_deref().unwrap_or_default(),
                    "command failed after all attempts"
                );
                return Ok(response);
            }
            debug!(
                device_id,
                command_id,
                attempt,
                reason = response.description().as_deref().unwrap_or_default(),
                "retrying command"
            );
            attempt += 1;
        }
    }

    /// Transmit a no-answer envelope while `pending` waits for a reply that
    /// arrives by another route, then wait `timeout` for it.
    pub(crate) fn send_and_await(
        &self,
        envelope: &Envelope,
        pending: Pending,
        timeout: Duration,
    ) -> Result<Response> {
        self.transmit(envelope)?;
        Ok(pending.wait(timeout))
    }

    fn transmit(&self, envelope: &Envelope) -> Result<()> {
        debug!(
            device_id = envelope.device_id,
            command_id = envelope.command_id,
            sequence = envelope.sequence,
            len = envelope.payload.len(),
            "sending command"
        );
        lock(&self.writer).send(envelope).map_err(into_device_error)
    }
}

fn into_device_error(err: FrameError) -> DeviceError {
    match err {
        FrameError::Io(io) => DeviceError::Transport(TransportError::Io(io)),
        FrameError::ConnectionClosed => DeviceError::Disconnected,
        other => DeviceError::Frame(other),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use spherolink_frame::{decode_envelope, Failure, MAX_PAYLOAD};

    use super::*;

    /// Records writes; never replies.
    #[derive(Default)]
    struct SilentTransport {
        sends: AtomicUsize,
        written: Mutex<Vec<u8>>,
        broken: AtomicBool,
    }

    impl Transport for SilentTransport {
        fn connect(&self) -> spherolink_transport::Result<()> {
            Ok(())
        }

        fn send(&self, bytes: &[u8]) -> spherolink_transport::Result<()> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(TransportError::NotConnected);
            }
            self.sends.fetch_add(1, Ordering::SeqCst);
            lock(&self.written).extend_from_slice(bytes);
            Ok(())
        }

        fn receive(&self, _buf: &mut [u8]) -> spherolink_transport::Result<usize> {
            Ok(0)
        }

        fn is_connected(&self) -> bool {
            !self.broken.load(Ordering::SeqCst)
        }

        fn close(&self) {}
    }

    fn invoker(transport: &Arc<SilentTransport>) -> (Invoker, Arc<Correlator>) {
        let correlator = Arc::new(Correlator::new());
        let shared: Arc<dyn Transport> = transport.clone();
        let invoker = Invoker::new(shared, Arc::clone(&correlator), Duration::from_millis(10));
        (invoker, correlator)
    }

    #[test]
    fn fire_and_forget_uses_sequence_zero() {
        let transport = Arc::new(SilentTransport::default());
        let (invoker, correlator) = invoker(&transport);

        let response = invoker.send(0x02, 0x30, vec![0x40, 0x00, 0x5A, 0x01], false).unwrap();
        assert_eq!(response, Response::empty());
        assert_eq!(correlator.outstanding(), 0);

        let mut wire = bytes::BytesMut::from(lock(&transport.written).as_slice());
        let envelope = decode_envelope(&mut wire).unwrap().unwrap();
        assert_eq!(envelope.sequence, 0);
        assert!(!envelope.needs_response);
    }

    #[test]
    fn retry_sends_exactly_max_attempts_then_fails() {
        let transport = Arc::new(SilentTransport::default());
        let (invoker, correlator) = invoker(&transport);

        let response = invoker.send_with_retry(0x00, 0x01, Bytes::new(), true, 3).unwrap();

        assert_eq!(transport.sends.load(Ordering::SeqCst), 3);
        assert!(!response.is_success());
        assert!(matches!(response.failure(), Some(Failure::Timeout(_))));
        assert_eq!(correlator.outstanding(), 0);

        let mut wire = bytes::BytesMut::from(lock(&transport.written).as_slice());
        let sequences: Vec<u8> = (0..3)
            .map(|_| decode_envelope(&mut wire).unwrap().unwrap().sequence)
            .collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn no_response_is_sent_once() {
        let transport = Arc::new(SilentTransport::default());
        let (invoker, _) = invoker(&transport);
        let response = invoker.send_with_retry(0x00, 0x22, vec![0; 5], false, 5).unwrap();
        assert!(response.is_success());
        assert_eq!(transport.sends.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transport_fault_is_an_error_and_releases_sequence() {
        let transport = Arc::new(SilentTransport::default());
        transport.broken.store(true, Ordering::SeqCst);
        let (invoker, correlator) = invoker(&transport);

        let err = invoker.send(0x00, 0x01, Bytes::new(), true).unwrap_err();
        assert!(matches!(err, DeviceError::Transport(_)));
        assert_eq!(correlator.outstanding(), 0);
    }

    #[test]
    fn oversized_payload_is_a_frame_error() {
        let transport = Arc::new(SilentTransport::default());
        let (invoker, _) = invoker(&transport);
        let err = invoker
            .send(0x00, 0x10, vec![0u8; MAX_PAYLOAD + 1], true)
            .unwrap_err();
        assert!(matches!(
            err,
            DeviceError::Frame(FrameError::PayloadTooLarge { .. })
        ));
        assert_eq!(transport.sends.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn disconnected_correlator_fails_fast() {
        let transport = Arc::new(SilentTransport::default());
        let (invoker, correlator) = invoker(&transport);
        correlator.fail_all(Failure::Disconnected);
        let err = invoker.send_with_retry(0x00, 0x01, Bytes::new(), true, 3).unwrap_err();
        assert!(matches!(err, DeviceError::Disconnected));
        assert_eq!(transport.sends.load(Ordering::SeqCst), 0);
    }
}
