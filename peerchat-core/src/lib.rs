//! PeerChat protocol core.
//! I/O-free: the CLI owns sockets and stdin; this crate holds the state that
//! the send and receive paths share.

pub mod endpoint;
pub mod message;
pub mod registry;
pub mod session;

pub use endpoint::{parse_ip, parse_port, peer_endpoint, EndpointError};
pub use message::{classify, render_incoming, InputLine, MAX_DATAGRAM, QUIT_COMMAND};
pub use registry::PeerRegistry;
pub use session::{Role, Session, SessionState};
