//! Interactive startup prompts. Blocking; everything here runs before the
//! session loops start. Invalid answers re-prompt; end-of-input during a
//! required prompt is a startup failure.

use std::io::{self, BufRead, Write};
use std::net::SocketAddr;

use anyhow::{bail, Context, Result};
use peerchat_core::{endpoint, Role};

fn ask(input: &mut impl BufRead, prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush().context("flushing prompt")?;
    let mut line = String::new();
    if input.read_line(&mut line).context("reading prompt answer")? == 0 {
        bail!("input ended before the prompt was answered");
    }
    Ok(line.trim().to_string())
}

/// Which side of the rendezvous to run.
pub fn ask_role(input: &mut impl BufRead) -> Result<Role> {
    loop {
        let answer = ask(input, "Are you the host? (y/n): ")?;
        match answer.as_str() {
            "y" | "Y" => return Ok(Role::Host),
            "n" | "N" => return Ok(Role::Client),
            _ => eprintln!("Please answer y or n."),
        }
    }
}

/// The host endpoint a client should contact: public/internal choice, then an
/// IP literal, then a port, each re-prompted until valid.
pub fn ask_peer_endpoint(input: &mut impl BufRead) -> Result<SocketAddr> {
    let ip_prompt = loop {
        let choice = ask(
            input,
            "Do you want to connect using (1) Public IP or (2) Internal IP? Enter 1 or 2: ",
        )?;
        match choice.as_str() {
            "1" => break "Enter the host's public IP address: ",
            "2" => break "Enter the host's internal IP address: ",
            _ => eprintln!("Invalid choice. Please enter 1 for Public IP or 2 for Internal IP."),
        }
    };

    let ip = loop {
        match endpoint::parse_ip(&ask(input, ip_prompt)?) {
            Ok(ip) => break ip,
            Err(e) => eprintln!("{}. Please try again.", e),
        }
    };

    let port = loop {
        match endpoint::parse_port(&ask(input, "Enter the host's port: ")?) {
            Ok(port) => break port,
            Err(e) => eprintln!("{}. Please try again.", e),
        }
    };

    Ok(endpoint::peer_endpoint(ip, port))
}
