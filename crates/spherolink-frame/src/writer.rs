use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_envelope, Envelope, ENVELOPE_HEADER_SIZE, MAX_PAYLOAD};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = ENVELOPE_HEADER_SIZE + MAX_PAYLOAD + 1;

/// Writes complete command envelopes to any `Write` stream.
///
/// One encode buffer is reused across sends.
pub struct EnvelopeWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> EnvelopeWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Encode and write one envelope (blocking), then flush.
    ///
    /// Nothing is written when encoding fails.
    pub fn send(&mut self, envelope: &Envelope) -> Result<()> {
        self.buf.clear();
        encode_envelope(envelope, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use bytes::{Bytes, BytesMut};

    use super::*;
    use crate::codec::decode_envelope;

    fn written(writer: EnvelopeWriter<Cursor<Vec<u8>>>) -> BytesMut {
        BytesMut::from(writer.into_inner().into_inner().as_slice())
    }

    #[test]
    fn writes_ping_bytes() {
        let mut writer = EnvelopeWriter::new(Cursor::new(Vec::<u8>::new()));
        writer
            .send(&Envelope::new(0x00, 0x01, Bytes::new()).expecting_response(0x52))
            .unwrap();

        assert_eq!(
            written(writer).as_ref(),
            &[0xFF, 0xFF, 0x00, 0x01, 0x52, 0x01, 0xAB]
        );
    }

    #[test]
    fn consecutive_envelopes_stay_delimited() {
        let mut writer = EnvelopeWriter::new(Cursor::new(Vec::<u8>::new()));
        let first = Envelope::new(0x02, 0x20, vec![0xFF, 0x00, 0x00, 0x00]).expecting_response(1);
        let second = Envelope::new(0x02, 0x30, vec![0x80, 0x00, 0x5A, 0x01]);
        writer.send(&first).unwrap();
        writer.send(&second).unwrap();

        let mut wire = written(writer);
        assert_eq!(decode_envelope(&mut wire).unwrap().unwrap(), first);
        assert_eq!(decode_envelope(&mut wire).unwrap().unwrap(), second);
        assert!(wire.is_empty());
    }

    #[test]
    fn oversized_payload_writes_nothing() {
        let mut writer = EnvelopeWriter::new(Cursor::new(Vec::<u8>::new()));
        let err = writer
            .send(&Envelope::new(0x02, 0x11, vec![0u8; MAX_PAYLOAD + 1]))
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        assert!(written(writer).is_empty());
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = EnvelopeWriter::new(sink);

        writer.send(&Envelope::new(0x00, 0x01, Bytes::new())).unwrap();

        assert!(flag.load(Ordering::SeqCst));
        assert_eq!(writer.get_ref().data.len(), 7);
    }

    #[test]
    fn handles_interrupted_and_would_block() {
        let mut writer = EnvelopeWriter::new(FlakyWriter::default());
        writer
            .send(&Envelope::new(0x00, 0x01, Bytes::new()).expecting_response(3))
            .unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data.len(), 7);
        assert_eq!(inner.failures, 0);
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = EnvelopeWriter::new(ZeroWriter);
        let err = writer.send(&Envelope::new(0x00, 0x01, Bytes::new())).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Fails with `Interrupted`, then `WouldBlock`, then accepts one byte at a time.
    struct FlakyWriter {
        failures: usize,
        data: Vec<u8>,
    }

    impl Default for FlakyWriter {
        fn default() -> Self {
            Self {
                failures: 2,
                data: Vec::new(),
            }
        }
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            match self.failures {
                2 => {
                    self.failures = 1;
                    Err(std::io::Error::from(ErrorKind::Interrupted))
                }
                1 => {
                    self.failures = 0;
                    Err(std::io::Error::from(ErrorKind::WouldBlock))
                }
                _ => {
                    self.data.push(buf[0]);
                    Ok(1)
                }
            }
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
