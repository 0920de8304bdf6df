use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "ferry", version, about = "Interactive FTP client")]
pub struct Cli {
    /// Server host name or address.
    pub host: String,

    #[arg(short, long, help = "Control port (defaults to the settings file, then 21)")]
    pub port: Option<u16>,

    #[arg(short, long, value_name = "NAME", help = "User name for the first login attempt")]
    pub user: Option<String>,

    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(
        short,
        long,
        default_value = "info",
        help = "Log level or filter (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::try_parse_from(["ferry", "ftp.example.com"]).expect("parse");
        assert_eq!(cli.host, "ftp.example.com");
        assert!(cli.port.is_none());
        assert!(cli.user.is_none());
        assert!(cli.config.is_none());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn cli_requires_host() {
        assert!(Cli::try_parse_from(["ferry"]).is_err());
    }

    #[test]
    fn cli_parses_long_flags() {
        let cli = Cli::try_parse_from([
            "ferry",
            "10.0.0.5",
            "--port",
            "2121",
            "--user",
            "anonymous",
            "--config",
            "/etc/ferry.json",
        ])
        .expect("parse");
        assert_eq!(cli.port, Some(2121));
        assert_eq!(cli.user.as_deref(), Some("anonymous"));
        assert_eq!(cli.config.unwrap(), PathBuf::from("/etc/ferry.json"));
    }

    #[test]
    fn cli_parses_short_flags() {
        let cli = Cli::try_parse_from(["ferry", "host", "-p", "21", "-u", "bob", "-l", "debug"])
            .expect("parse");
        assert_eq!(cli.port, Some(21));
        assert_eq!(cli.user.as_deref(), Some("bob"));
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn cli_rejects_bad_port() {
        assert!(Cli::try_parse_from(["ferry", "host", "--port", "70000"]).is_err());
    }
}
