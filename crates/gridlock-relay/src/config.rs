//! Relay configuration from command-line arguments.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub bind: String,
    pub players: usize,
    pub password: String,
    pub recv_timeout: Duration,
    pub teams: u8,
    /// Session serial; derived from the clock at startup when absent.
    pub serial: Option<u64>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:4444".to_string(),
            players: 4,
            password: "gridlock".to_string(),
            recv_timeout: Duration::from_millis(500),
            teams: 2,
            serial: None,
        }
    }
}

impl RelayConfig {
    /// Parse `--bind`, `--players`, `--password`, `--timeout-ms`,
    /// `--teams`, `--serial`. Unknown flags and bad values fall back to
    /// defaults rather than aborting a headless server.
    pub fn from_args<I: Iterator<Item = String>>(args: I) -> Self {
        let mut config = Self::default();
        let args: Vec<String> = args.collect();
        let mut i = 0;
        while i < args.len() {
            let value = args.get(i + 1);
            match (args[i].as_str(), value) {
                ("--bind", Some(v)) => config.bind = v.clone(),
                ("--players", Some(v)) => {
                    if let Ok(n) = v.parse() {
                        config.players = n;
                    }
                }
                ("--password", Some(v)) => config.password = v.clone(),
                ("--timeout-ms", Some(v)) => {
                    if let Ok(ms) = v.parse() {
                        config.recv_timeout = Duration::from_millis(ms);
                    }
                }
                ("--teams", Some(v)) => {
                    if let Ok(n) = v.parse::<u8>() {
                        config.teams = n.max(1);
                    }
                }
                ("--serial", Some(v)) => {
                    if let Ok(n) = v.parse() {
                        config.serial = Some(n);
                    }
                }
                _ => {
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> RelayConfig {
        RelayConfig::from_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults_without_args() {
        let config = parse(&[]);
        assert_eq!(config, RelayConfig::default());
    }

    #[test]
    fn parses_flags() {
        let config = parse(&[
            "--bind",
            "127.0.0.1:9000",
            "--players",
            "2",
            "--password",
            "sesame",
            "--timeout-ms",
            "250",
            "--teams",
            "4",
        ]);
        assert_eq!(config.bind, "127.0.0.1:9000");
        assert_eq!(config.players, 2);
        assert_eq!(config.password, "sesame");
        assert_eq!(config.recv_timeout, Duration::from_millis(250));
        assert_eq!(config.teams, 4);
    }

    #[test]
    fn bad_number_keeps_default() {
        let config = parse(&["--players", "lots"]);
        assert_eq!(config.players, RelayConfig::default().players);
    }
}
