//! The send and receive loops, and the controller that starts and joins them.
//!
//! Exactly two concurrent contexts run per session: the send loop on the
//! calling task (driven by local input) and the receive loop on a spawned task
//! (driven by the socket). The controller owns shutdown: it terminates the
//! session, releases the registry gate, and cancels the transport exactly once
//! after the send loop returns, all of it idempotent, then joins the receiver.

use std::net::SocketAddr;
use std::sync::Arc;

use peerchat_core::{
    classify, render_incoming, InputLine, PeerRegistry, Role, Session, MAX_DATAGRAM,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::transport::{RecvError, Transport};

/// First datagram a client sends, so the host learns the client's endpoint.
pub const PROBE_MESSAGE: &str = "Hello from client!";

/// Run one chat session to completion. For the client role the registry must
/// already be sealed with the target endpoint; the probe is sent from here.
pub async fn run_session<R>(
    transport: Arc<Transport>,
    registry: Arc<PeerRegistry>,
    session: Arc<Session>,
    role: Role,
    input: R,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    if role == Role::Client {
        if let Some(peer) = registry.get() {
            match transport.send_to(PROBE_MESSAGE.as_bytes(), peer).await {
                Ok(()) => println!("Test message sent to {}", peer),
                Err(e) => log::warn!("{}", e),
            }
        }
    }

    let receiver = {
        let transport = transport.clone();
        let registry = registry.clone();
        let session = session.clone();
        tokio::spawn(async move { recv_loop(transport, registry, session, role).await })
    };

    let result = send_loop(&transport, &registry, &session, role, input).await;

    // Shutdown runs even when the send loop failed, and repeats harmlessly
    // when the quit path already began it.
    session.begin_termination();
    registry.release_waiters();
    transport.cancel();
    let _ = receiver.await;
    session.mark_stopped();
    result
}

async fn recv_loop(
    transport: Arc<Transport>,
    registry: Arc<PeerRegistry>,
    session: Arc<Session>,
    role: Role,
) {
    let mut buf = [0u8; MAX_DATAGRAM];
    while !session.is_terminating() {
        match transport.recv_from(&mut buf).await {
            Ok((n, from)) => {
                println!("{}", render_incoming(from, &buf[..n]));
                if role == Role::Host {
                    if registry.try_set(from) {
                        log::info!("peer registered: {}", from);
                    } else if registry.get() != Some(from) {
                        // Printed above, but never becomes the send target.
                        log::warn!("ignoring sender {}: a peer is already registered", from);
                    }
                }
            }
            // Normal shutdown path, not an error.
            Err(RecvError::Cancelled) => break,
            Err(RecvError::Io(e)) => {
                log::error!("error receiving message: {}", e);
            }
        }
    }
}

async fn send_loop<R>(
    transport: &Transport,
    registry: &PeerRegistry,
    session: &Session,
    role: Role,
    input: R,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    if role == Role::Host {
        match wait_for_peer(registry, session, &mut lines).await? {
            Some(peer) => log::info!("sending to {}", peer),
            // Quit or end-of-input before any peer appeared.
            None => return Ok(()),
        }
    }
    println!("You can now start sending messages. Type '/quit' to exit.");

    while let Some(line) = lines.next_line().await? {
        match classify(&line) {
            InputLine::Empty => {}
            InputLine::Quit => {
                session.begin_termination();
                break;
            }
            InputLine::Message => {
                // Sealed by the wait gate (host) or at startup (client).
                let Some(peer) = registry.get() else {
                    eprintln!("No peer connected to send messages.");
                    continue;
                };
                if let Err(e) = transport.send_to(line.as_bytes(), peer).await {
                    log::warn!("{}", e);
                }
            }
        }
    }
    Ok(())
}

/// Host-side gate: wait for the first peer while still honoring `/quit` and
/// end-of-input typed before anyone connects. Lines typed meanwhile are not
/// sendable and say so.
async fn wait_for_peer<R>(
    registry: &PeerRegistry,
    session: &Session,
    lines: &mut Lines<R>,
) -> std::io::Result<Option<SocketAddr>>
where
    R: AsyncBufRead + Unpin,
{
    println!("Waiting for the client to connect...");
    loop {
        tokio::select! {
            // Biased: once a peer is sealed the gate always wins, even when a
            // typed line is ready at the same moment.
            biased;
            peer = registry.wait_until_set() => return Ok(peer),
            line = lines.next_line() => match line? {
                None => return Ok(None),
                Some(line) => match classify(&line) {
                    InputLine::Quit => {
                        session.begin_termination();
                        return Ok(None);
                    }
                    InputLine::Empty => {}
                    InputLine::Message => eprintln!("No client connected to send messages."),
                },
            },
        }
    }
}
