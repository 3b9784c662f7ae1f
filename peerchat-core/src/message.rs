//! Input-line classification and incoming-message rendering.

use std::net::SocketAddr;

/// Receive buffer size. Datagrams larger than this are truncated silently;
/// the surviving prefix is still rendered.
pub const MAX_DATAGRAM: usize = 1024;

/// The literal line that ends a session.
pub const QUIT_COMMAND: &str = "/quit";

/// What one line of local input means to the send loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLine {
    /// Nothing to send; read the next line.
    Empty,
    /// The quit command: terminate the session.
    Quit,
    /// A chat message to forward to the peer.
    Message,
}

/// Classify one line of local input. The quit command must match exactly.
pub fn classify(line: &str) -> InputLine {
    if line.is_empty() {
        InputLine::Empty
    } else if line == QUIT_COMMAND {
        InputLine::Quit
    } else {
        InputLine::Message
    }
}

/// Render a received datagram for the terminal. Invalid UTF-8 is replaced
/// rather than rejected; a zero-length payload renders as empty text.
pub fn render_incoming(from: SocketAddr, payload: &[u8]) -> String {
    format!(
        "[Message from {}] {}",
        from,
        String::from_utf8_lossy(payload)
    )
}
