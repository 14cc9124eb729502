use crate::error::Result;

/// A reliable, ordered, bidirectional byte stream to one device.
///
/// Methods take `&self` so that one thread can sit in [`receive`](Self::receive)
/// while any number of others call [`send`](Self::send). Implementations
/// serialize each direction internally.
pub trait Transport: Send + Sync {
    /// Open the connection. An existing connection is closed first.
    fn connect(&self) -> Result<()>;

    /// Write all of `bytes`, blocking until fully written.
    fn send(&self, bytes: &[u8]) -> Result<()>;

    /// Block until at least one byte is available and copy up to `buf.len()`
    /// bytes into `buf`.
    ///
    /// Returns `Ok(0)` once the remote side has closed the stream or after
    /// [`close`](Self::close).
    fn receive(&self, buf: &mut [u8]) -> Result<usize>;

    /// Whether a connection is currently open.
    ///
    /// A `true` result does not guarantee the next send succeeds.
    fn is_connected(&self) -> bool;

    /// Close the connection and wake any thread blocked in `receive`.
    ///
    /// Closing an already-closed transport has no effect.
    fn close(&self);

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str {
        "transport"
    }
}
