use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::roster::{Roster, RosterEntry};

const DEFAULT_PROFILES: &str = "miles:Miles,robert:Robert";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// Raw `RUST_LOG`; `None` selects the service default filter
    pub log_level: Option<String>,
    /// Set when `ENABLE_FILE_LOGS` is on
    pub log_dir: Option<PathBuf>,
    pub database_url: Option<String>,
    pub roster: Roster,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").ok().filter(|v| !v.trim().is_empty());
        let log_dir = file_log_dir(
            std::env::var("ENABLE_FILE_LOGS").ok().as_deref(),
            std::env::var("LOG_DIR").ok(),
        );

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let roster = std::env::var("MATHWIZ_PROFILES")
            .ok()
            .map(|raw| parse_roster(&raw))
            .filter(|roster| !roster.is_empty())
            .unwrap_or_else(|| parse_roster(DEFAULT_PROFILES));

        Self {
            host,
            port,
            log_level,
            log_dir,
            database_url,
            roster,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn file_log_dir(enabled: Option<&str>, dir: Option<String>) -> Option<PathBuf> {
    match enabled {
        Some("true") | Some("1") => Some(PathBuf::from(dir.unwrap_or_else(|| "./logs".to_string()))),
        _ => None,
    }
}

/// `id:Name,id:Name`; a bare `id` uses the id as its name
pub fn parse_roster(raw: &str) -> Roster {
    let entries = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .filter_map(|item| {
            let (id, name) = match item.split_once(':') {
                Some((id, name)) => (id.trim(), name.trim()),
                None => (item, item),
            };
            if id.is_empty() {
                return None;
            }
            let name = if name.is_empty() { id } else { name };
            Some(RosterEntry {
                id: id.to_string(),
                name: name.to_string(),
            })
        })
        .collect();
    Roster::new(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_bare_entries() {
        let roster = parse_roster(" miles:Miles , ada ,:ghost, robert: ");
        let ids: Vec<_> = roster.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["miles", "ada", "robert"]);
        assert_eq!(roster.get("ada").unwrap().name, "ada");
        assert_eq!(roster.get("robert").unwrap().name, "robert");
    }

    #[test]
    fn file_logs_only_when_enabled() {
        assert_eq!(file_log_dir(None, Some("/var/log".into())), None);
        assert_eq!(file_log_dir(Some("false"), None), None);
        assert_eq!(file_log_dir(Some("1"), None), Some(PathBuf::from("./logs")));
        assert_eq!(
            file_log_dir(Some("true"), Some("/var/log/mathwiz".into())),
            Some(PathBuf::from("/var/log/mathwiz"))
        );
    }

    #[test]
    fn default_roster_has_two_learners() {
        let roster = parse_roster(DEFAULT_PROFILES);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.get("miles").unwrap().name, "Miles");
    }
}
