use tokio::net::TcpStream;

use crate::error::{Error, ErrorKind};

/// Plain-TCP transport state. Fresh until [`super::Transport::connect`]
/// installs a socket.
#[derive(Default)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new() -> Self {
        TcpTransport { stream: None }
    }

    pub(super) fn set_stream(&mut self, stream: TcpStream) {
        let _ = stream.set_nodelay(true);
        self.stream = Some(stream);
    }

    pub(super) fn stream(&mut self) -> Result<&mut TcpStream, Error> {
        self.stream
            .as_mut()
            .ok_or_else(|| Error::new(ErrorKind::Write, "transport not connected"))
    }

    /// Reports whether the peer has already closed (`Ok(true)`, read
    /// returns `Ok(0)`) or sent unsolicited data (also `Ok(true)`: this
    /// session shouldn't be reused either way) versus still being quiet
    /// (`Ok(false)`, `WouldBlock`). Never blocks — safe to call from
    /// `Pool::acquire`.
    pub(super) fn idle_peer_closed(&self) -> std::io::Result<bool> {
        let Some(stream) = &self.stream else {
            return Ok(false);
        };
        let mut buf = [0u8; 1];
        match stream.try_read(&mut buf) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub(super) async fn shutdown(&mut self) {
        if let Some(s) = self.stream.take() {
            let _ = s.into_std().map(|s| s.shutdown(std::net::Shutdown::Both));
        }
    }
}
