//! Load config from file and environment.

use serde::Deserialize;
use std::path::PathBuf;

/// CLI configuration. File: ~/.config/peerchat/config.toml or
/// /etc/peerchat/config.toml.
/// Env overrides: PEERCHAT_PORT_START, PEERCHAT_PORT_END, PEERCHAT_IP_SERVICE.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// First port tried when binding (default 5000).
    #[serde(default = "default_port_start")]
    pub port_start: u16,
    /// Last port tried when binding (default 5999).
    #[serde(default = "default_port_end")]
    pub port_end: u16,
    /// HTTP service that returns the caller's public IP as plain text.
    #[serde(default = "default_ip_service")]
    pub ip_service: String,
}

fn default_port_start() -> u16 {
    5000
}
fn default_port_end() -> u16 {
    5999
}
fn default_ip_service() -> String {
    "https://api.ipify.org".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port_start: default_port_start(),
            port_end: default_port_end(),
            ip_service: default_ip_service(),
        }
    }
}

/// Load config: merge default, then config file (if present), then env vars.
pub fn load() -> Config {
    let mut c = load_file().unwrap_or_else(Config::default);
    apply_env(&mut c, |name| std::env::var(name).ok());
    c
}

/// Apply env overrides through a lookup, so the merge is testable without
/// mutating process env. Unparsable or empty values leave the field alone.
fn apply_env(c: &mut Config, get: impl Fn(&str) -> Option<String>) {
    if let Some(s) = get("PEERCHAT_PORT_START") {
        if let Ok(p) = s.parse::<u16>() {
            c.port_start = p;
        }
    }
    if let Some(s) = get("PEERCHAT_PORT_END") {
        if let Ok(p) = s.parse::<u16>() {
            c.port_end = p;
        }
    }
    if let Some(s) = get("PEERCHAT_IP_SERVICE") {
        if !s.is_empty() {
            c.ip_service = s;
        }
    }
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/peerchat/config.toml"));
    }
    out.push(PathBuf::from("/etc/peerchat/config.toml"));
    out
}

fn load_file() -> Option<Config> {
    for p in config_paths() {
        if p.exists() {
            if let Ok(s) = std::fs::read_to_string(&p) {
                if let Ok(c) = toml::from_str::<Config>(&s) {
                    return Some(c);
                }
            }
            break;
        }
    }
    None
}
