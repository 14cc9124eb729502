#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use spherolink_frame::{decode_envelope, encode_acknowledgment, encode_async, Envelope};
use spherolink_transport::{SocketTransport, Transport};

/// Device end of a socket pair, speaking the robot side of the protocol.
pub struct FakeDevice {
    stream: UnixStream,
    buf: BytesMut,
}

impl FakeDevice {
    /// A connected host transport and the device end behind it.
    pub fn pair() -> (Arc<dyn Transport>, FakeDevice) {
        let (host, device) = UnixStream::pair().expect("socket pair should open");
        device
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("read timeout should apply");
        let transport = SocketTransport::from_unix(host).expect("transport should wrap stream");
        (
            Arc::new(transport),
            FakeDevice {
                stream: device,
                buf: BytesMut::new(),
            },
        )
    }

    /// Next command from the host, or `None` once the host hangs up.
    pub fn try_next_command(&mut self) -> Option<Envelope> {
        loop {
            if let Some(envelope) = decode_envelope(&mut self.buf).expect("host sent a valid envelope")
            {
                return Some(envelope);
            }
            let mut chunk = [0u8; 256];
            match self.stream.read(&mut chunk) {
                Ok(0) => return None,
                Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
                Err(err) => panic!("reading from host failed: {err}"),
            }
        }
    }

    pub fn next_command(&mut self) -> Envelope {
        self.try_next_command().expect("host closed the link")
    }

    pub fn ack(&mut self, command: &Envelope, status: u8, payload: &[u8]) {
        self.ack_sequence(command.sequence, status, payload);
    }

    pub fn ack_sequence(&mut self, sequence: u8, status: u8, payload: &[u8]) {
        let mut wire = BytesMut::new();
        encode_acknowledgment(status, sequence, payload, &mut wire).expect("ack should encode");
        self.write_raw(&wire);
    }

    pub fn notify(&mut self, event: u8, payload: &[u8]) {
        let mut wire = BytesMut::new();
        encode_async(event, payload, &mut wire).expect("async message should encode");
        self.write_raw(&wire);
    }

    /// Stop accepting host traffic; the host's next write fails.
    pub fn stop_reading(&self) {
        self.stream
            .shutdown(Shutdown::Read)
            .expect("read half should shut down");
    }

    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).expect("write to host should succeed");
    }

    /// Answer every command that wants a reply with an empty success until
    /// the host hangs up. Returns the commands seen.
    pub fn serve_ok(mut self) -> Vec<Envelope> {
        let mut seen = Vec::new();
        while let Some(command) = self.try_next_command() {
            if command.needs_response {
                self.ack(&command, 0x00, b"");
            }
            seen.push(command);
        }
        seen
    }
}
