use std::fmt;
use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Where the device bridge listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `host:port` of a TCP serial bridge.
    Tcp(String),
    /// Filesystem path of a Unix-domain socket bridge.
    #[cfg(unix)]
    Unix(PathBuf),
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(addr) = s.strip_prefix("tcp:") {
            if addr.is_empty() || !addr.contains(':') {
                return Err(TransportError::InvalidEndpoint(s.to_string()));
            }
            return Ok(Self::Tcp(addr.to_string()));
        }
        #[cfg(unix)]
        if let Some(path) = s.strip_prefix("unix:") {
            if path.is_empty() {
                return Err(TransportError::InvalidEndpoint(s.to_string()));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }
        Err(TransportError::InvalidEndpoint(s.to_string()))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(addr) => write!(f, "tcp:{addr}"),
            #[cfg(unix)]
            Self::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

enum SocketStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl SocketStream {
    fn try_clone(&self) -> std::io::Result<Self> {
        match self {
            Self::Tcp(stream) => stream.try_clone().map(Self::Tcp),
            #[cfg(unix)]
            Self::Unix(stream) => stream.try_clone().map(Self::Unix),
        }
    }

    fn shutdown(&self) -> std::io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Self::Unix(stream) => stream.shutdown(Shutdown::Both),
        }
    }
}

impl Read for SocketStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for SocketStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Socket-backed [`Transport`].
///
/// The connected socket is cloned into a read half and a write half, each behind
/// its own lock, so the receive loop never contends with senders. A third
/// handle is kept only to shut the socket down, which works whichever half is
/// busy or already gone.
pub struct SocketTransport {
    endpoint: Option<Endpoint>,
    reader: Mutex<Option<SocketStream>>,
    writer: Mutex<Option<SocketStream>>,
    control: Mutex<Option<SocketStream>>,
    connected: AtomicBool,
}

impl SocketTransport {
    /// Maximum socket path length.
    /// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Create an unconnected transport for `endpoint`.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint: Some(endpoint),
            reader: Mutex::new(None),
            writer: Mutex::new(None),
            control: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }

    /// Wrap an already connected TCP stream.
    pub fn from_tcp(stream: TcpStream) -> Result<Self> {
        let _ = stream.set_nodelay(true);
        Self::from_stream(SocketStream::Tcp(stream))
    }

    /// Wrap an already connected Unix-domain stream.
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Result<Self> {
        Self::from_stream(SocketStream::Unix(stream))
    }

    fn from_stream(stream: SocketStream) -> Result<Self> {
        let transport = Self {
            endpoint: None,
            reader: Mutex::new(None),
            writer: Mutex::new(None),
            control: Mutex::new(None),
            connected: AtomicBool::new(false),
        };
        transport.install(stream)?;
        Ok(transport)
    }

    /// The configured endpoint, if this transport was built from one.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    fn install(&self, stream: SocketStream) -> Result<()> {
        let read_half = stream.try_clone()?;
        let control = stream.try_clone()?;
        *lock(&self.control) = Some(control);
        *lock(&self.reader) = Some(read_half);
        *lock(&self.writer) = Some(stream);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn open(endpoint: &Endpoint) -> Result<SocketStream> {
        match endpoint {
            Endpoint::Tcp(addr) => {
                let stream = TcpStream::connect(addr.as_str()).map_err(|e| {
                    TransportError::Connect {
                        endpoint: endpoint.to_string(),
                        source: e,
                    }
                })?;
                let _ = stream.set_nodelay(true);
                Ok(SocketStream::Tcp(stream))
            }
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                let path_bytes = path.as_os_str().len();
                if path_bytes >= Self::MAX_PATH_LEN {
                    return Err(TransportError::PathTooLong {
                        path: path.clone(),
                        len: path_bytes,
                        max: Self::MAX_PATH_LEN,
                    });
                }
                let stream = std::os::unix::net::UnixStream::connect(path).map_err(|e| {
                    TransportError::Connect {
                        endpoint: endpoint.to_string(),
                        source: e,
                    }
                })?;
                Ok(SocketStream::Unix(stream))
            }
        }
    }

    /// A fault on either half ends the connection: shut the socket down so the
    /// other half wakes up, then drop `half`.
    fn fail(&self, half: &mut Option<SocketStream>) {
        if let Some(stream) = half.take() {
            let _ = stream.shutdown();
        }
        self.mark_closed();
    }

    fn mark_closed(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            debug!("transport marked closed");
        }
    }
}

impl Transport for SocketTransport {
    fn connect(&self) -> Result<()> {
        let Some(endpoint) = self.endpoint.as_ref() else {
            return if self.is_connected() {
                Ok(())
            } else {
                Err(TransportError::NotConnected)
            };
        };

        self.close();
        let stream = Self::open(endpoint)?;
        self.install(stream)?;
        info!(%endpoint, "connected to device bridge");
        Ok(())
    }

    fn send(&self, bytes: &[u8]) -> Result<()> {
        let mut guard = lock(&self.writer);
        let Some(stream) = guard.as_mut() else {
            return Err(TransportError::NotConnected);
        };

        let mut offset = 0usize;
        while offset < bytes.len() {
            match stream.write(&bytes[offset..]) {
                Ok(0) => {
                    self.fail(&mut guard);
                    return Err(TransportError::Io(std::io::Error::from(
                        ErrorKind::WriteZero,
                    )));
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.fail(&mut guard);
                    return Err(TransportError::Io(err));
                }
            }
        }
        if let Err(err) = stream.flush() {
            self.fail(&mut guard);
            return Err(TransportError::Io(err));
        }
        Ok(())
    }

    fn receive(&self, buf: &mut [u8]) -> Result<usize> {
        let mut guard = lock(&self.reader);
        let Some(stream) = guard.as_mut() else {
            return Ok(0);
        };

        loop {
            match stream.read(buf) {
                Ok(0) => {
                    *guard = None;
                    self.mark_closed();
                    return Ok(0);
                }
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.fail(&mut guard);
                    return Err(TransportError::Io(err));
                }
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn close(&self) {
        // Shutdown applies to the shared socket, so a reader parked in `receive`
        // sees end of stream and drops its own half.
        if let Some(control) = lock(&self.control).take() {
            let _ = control.shutdown();
            info!("transport closed");
        }
        lock(&self.writer).take();
        self.mark_closed();
    }

    fn transport_name(&self) -> &'static str {
        match self.endpoint {
            Some(Endpoint::Tcp(_)) => "tcp",
            #[cfg(unix)]
            Some(Endpoint::Unix(_)) => "unix-domain-socket",
            None => "socket",
        }
    }
}

impl fmt::Debug for SocketTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketTransport")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.is_connected())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
