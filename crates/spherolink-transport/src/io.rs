use std::io::{ErrorKind, Read, Write};
use std::sync::Arc;

use crate::error::TransportError;
use crate::traits::Transport;

/// `std::io::Read` view over a shared [`Transport`].
///
/// End of stream (`Ok(0)`) is passed through unchanged.
pub struct TransportReader {
    inner: Arc<dyn Transport>,
}

impl TransportReader {
    pub fn new(inner: Arc<dyn Transport>) -> Self {
        Self { inner }
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner
    }
}

impl Read for TransportReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.receive(buf).map_err(into_io_error)
    }
}

/// `std::io::Write` view over a shared [`Transport`].
///
/// Every `write` hands the whole buffer to [`Transport::send`], which blocks
/// until it is fully written.
pub struct TransportWriter {
    inner: Arc<dyn Transport>,
}

impl TransportWriter {
    pub fn new(inner: Arc<dyn Transport>) -> Self {
        Self { inner }
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner
    }
}

impl Write for TransportWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.send(buf).map_err(into_io_error)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn into_io_error(err: TransportError) -> std::io::Error {
    match err {
        TransportError::Io(io) => io,
        TransportError::Connect { source, .. } => source,
        TransportError::NotConnected => {
            std::io::Error::new(ErrorKind::NotConnected, "transport not connected")
        }
        other => std::io::Error::other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Scripted {
        inbound: Mutex<Vec<u8>>,
        outbound: Mutex<Vec<u8>>,
        fail_send: bool,
    }

    impl Transport for Scripted {
        fn connect(&self) -> crate::Result<()> {
            Ok(())
        }

        fn send(&self, bytes: &[u8]) -> crate::Result<()> {
            if self.fail_send {
                return Err(TransportError::NotConnected);
            }
            self.outbound.lock().unwrap().extend_from_slice(bytes);
            Ok(())
        }

        fn receive(&self, buf: &mut [u8]) -> crate::Result<usize> {
            let mut inbound = self.inbound.lock().unwrap();
            let n = inbound.len().min(buf.len());
            buf[..n].copy_from_slice(&inbound[..n]);
            inbound.drain(..n);
            Ok(n)
        }

        fn is_connected(&self) -> bool {
            true
        }

        fn close(&self) {}
    }

    #[test]
    fn reader_drains_transport_then_reports_eof() {
        let transport = Arc::new(Scripted {
            inbound: Mutex::new(vec![1, 2, 3]),
            ..Scripted::default()
        });
        let mut reader = TransportReader::new(transport);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn writer_forwards_whole_buffer() {
        let transport = Arc::new(Scripted::default());
        let mut writer = TransportWriter::new(transport.clone());

        writer.write_all(b"\xff\xfe\x00\x01").unwrap();
        assert_eq!(
            transport.outbound.lock().unwrap().as_slice(),
            b"\xff\xfe\x00\x01"
        );
    }

    #[test]
    fn not_connected_maps_to_io_kind() {
        let transport = Arc::new(Scripted {
            fail_send: true,
            ..Scripted::default()
        });
        let mut writer = TransportWriter::new(transport);

        let err = writer.write(b"x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConnected);
    }
}
