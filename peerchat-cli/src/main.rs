//! PeerChat CLI: minimal peer-to-peer UDP text chat, host/client roles.

mod config;
mod prompt;
mod resolver;
mod session;
mod transport;

use std::sync::Arc;

use anyhow::Context;
use peerchat_core::{PeerRegistry, Role, Session};
use tokio::io::BufReader;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    for arg in std::env::args().skip(1) {
        if arg == "--version" || arg == "-V" {
            println!("peerchat {}", VERSION);
            return Ok(());
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = config::load();
    if cfg.port_start > cfg.port_end {
        anyhow::bail!(
            "invalid port range {}-{} (start must not exceed end)",
            cfg.port_start,
            cfg.port_end
        );
    }

    let stdin = std::io::stdin();
    let mut prompts = stdin.lock();
    let role = prompt::ask_role(&mut prompts)?;

    let rt = tokio::runtime::Runtime::new().context("starting runtime")?;
    rt.block_on(async {
        let transport = transport::Transport::bind_in_range(cfg.port_start, cfg.port_end).await?;
        let port = transport.local_addr().context("reading bound address")?.port();
        println!("Assigned port: {}", port);

        let registry = Arc::new(PeerRegistry::new());
        match role {
            Role::Host => {
                println!("Fetching public IP address...");
                match resolver::public_ip(&cfg.ip_service).await {
                    Ok(ip) => println!(
                        "Your public endpoint (share this with the other peer): {}:{}",
                        ip, port
                    ),
                    Err(e) => {
                        log::warn!("{}", e);
                        println!(
                            "Proceeding without public endpoint. Ensure port {} is forwarded \
                             manually if connecting over the internet.",
                            port
                        );
                    }
                }
                match resolver::local_ip() {
                    Ok(ip) => println!(
                        "Your internal endpoint (for local network): {}:{}",
                        ip, port
                    ),
                    Err(e) => log::warn!("{}", e),
                }
            }
            Role::Client => {
                let target = prompt::ask_peer_endpoint(&mut prompts)?;
                registry.try_set(target);
            }
        }
        drop(prompts);

        session::run_session(
            Arc::new(transport),
            registry,
            Arc::new(Session::new()),
            role,
            BufReader::new(tokio::io::stdin()),
        )
        .await
        .context("session failed")
    })
}
