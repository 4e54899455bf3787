//! A connection to a CQC backend.
//!
//! A [`Session`] owns one byte stream and the application id every message
//! is tagged with. It is connected once and closed once; after a fatal
//! transport or protocol failure it refuses further use.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

use cqc_proto::Header;
use tracing::debug;

use crate::error::{Error, Result};

/// Byte stream a [`Session`] can run over.
pub trait Transport: Read + Write {
    /// Shuts down both directions of the stream.
    fn shutdown(&mut self) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn shutdown(&mut self) -> io::Result<()> {
        Self::shutdown(self, Shutdown::Both)
    }
}

#[cfg(unix)]
impl Transport for std::os::unix::net::UnixStream {
    fn shutdown(&mut self) -> io::Result<()> {
        Self::shutdown(self, Shutdown::Both)
    }
}

/// A client session with a CQC backend.
///
/// Only one command may be outstanding at a time: every call that expects
/// a reply blocks until that reply has been read.
#[derive(Debug)]
pub struct Session<T: Transport = TcpStream> {
    /// The underlying stream.
    stream: T,
    /// Application id stamped on every outgoing message.
    app_id: u16,
    /// Set after a fatal error; the stream position is no longer trusted.
    poisoned: bool,
}

impl Session {
    /// Connects to a backend at `host:port` as application `app_id`.
    pub fn connect(app_id: u16, host: &str, port: u16) -> Result<Self> {
        let addr = format!("{host}:{port}");
        let stream = match TcpStream::connect((host, port)) {
            Ok(s) => s,
            Err(source) => return Err(Error::Connect { addr, source }),
        };
        if let Err(source) = stream.set_nodelay(true) {
            return Err(Error::Connect { addr, source });
        }
        debug!(app_id, %addr, "connected to backend");
        Ok(Self::with_transport(app_id, stream))
    }
}

impl<T: Transport> Session<T> {
    /// Wraps an already-connected stream.
    pub const fn with_transport(app_id: u16, stream: T) -> Self {
        Self {
            stream,
            app_id,
            poisoned: false,
        }
    }

    /// Application id of this session.
    pub const fn app_id(&self) -> u16 {
        self.app_id
    }

    /// Returns `true` once a fatal error has made the session unusable.
    pub const fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Returns a reference to the underlying stream.
    pub const fn get_ref(&self) -> &T {
        &self.stream
    }

    /// Writes all of `bytes` and flushes the stream.
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.check()?;
        let res = self
            .stream
            .write_all(bytes)
            .and_then(|()| self.stream.flush());
        res.map_err(|e| self.fail(Error::Io(e)))
    }

    /// Reads exactly `n` bytes.
    ///
    /// Fails with [`Error::ShortRead`] if the stream ends first.
    pub fn receive_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        self.check()?;
        let mut buf = vec![0u8; n];
        match self.stream.read_exact(&mut buf) {
            Ok(()) => Ok(buf),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(self.fail(Error::ShortRead { expected: n }))
            }
            Err(e) => Err(self.fail(Error::Io(e))),
        }
    }

    /// Reads and decodes one fixed-size header.
    pub(crate) fn read_header<H: Header>(&mut self) -> Result<H> {
        let buf = self.receive_exact(H::LEN)?;
        H::parse(&buf).map_err(|e| self.fail(Error::Malformed(e.to_string())))
    }

    /// Poisons the session if `err` is fatal and hands it back.
    pub(crate) fn fail(&mut self, err: Error) -> Error {
        if err.is_fatal() {
            self.poisoned = true;
        }
        err
    }

    /// Rejects use of a poisoned session.
    const fn check(&self) -> Result<()> {
        if self.poisoned {
            Err(Error::Poisoned)
        } else {
            Ok(())
        }
    }

    /// Shuts the stream down and releases it.
    pub fn close(mut self) -> Result<()> {
        debug!(app_id = self.app_id, "closing session");
        match self.stream.shutdown() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;

    #[test]
    fn short_read_poisons() {
        let mut s = Session::with_transport(1, MockBackend::scripted(vec![2, 4, 0]));
        let err = s.receive_exact(8).unwrap_err();
        assert!(matches!(err, Error::ShortRead { expected: 8 }));
        assert!(s.is_poisoned());
        assert!(matches!(s.send(&[0]), Err(Error::Poisoned)));
        assert!(matches!(s.receive_exact(1), Err(Error::Poisoned)));
    }

    #[test]
    fn send_writes_everything() {
        let mut s = Session::with_transport(1, MockBackend::scripted(Vec::new()));
        s.send(&[1, 2, 3]).unwrap();
        s.send(&[4]).unwrap();
        assert_eq!(s.get_ref().written(), &[1, 2, 3, 4]);
    }

    #[test]
    fn malformed_header_poisons() {
        let mut s = Session::with_transport(1, MockBackend::scripted(vec![2, 99, 0, 1, 0, 0, 0, 0]));
        let err = s.read_header::<cqc_proto::ProtocolHeader>().unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
        assert!(s.is_poisoned());
    }

    #[test]
    fn connect_failure_names_address() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        match Session::connect(10, "127.0.0.1", port) {
            Err(Error::Connect { addr, .. }) => assert_eq!(addr, format!("127.0.0.1:{port}")),
            other => panic!("expected connect error, got {other:?}"),
        }
    }
}
