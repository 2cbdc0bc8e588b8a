use std::path::PathBuf;

use clap::Parser;

/// Atelier gallery service
#[derive(Debug, Parser)]
#[command(name = "atelier", about = "Mirrors an Alist image store into a local gallery cache")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "atelier.toml", env = "ATELIER_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "ATELIER_LISTEN")]
    pub listen: Option<std::net::SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_local_config_file() {
        let args = Args::try_parse_from(["atelier"]).unwrap();
        assert_eq!(args.config, PathBuf::from("atelier.toml"));
        assert!(args.listen.is_none());
    }

    #[test]
    fn listen_override_is_parsed() {
        let args = Args::try_parse_from(["atelier", "-c", "/etc/atelier.toml", "--listen", "127.0.0.1:8080"]).unwrap();
        assert_eq!(args.config, PathBuf::from("/etc/atelier.toml"));
        assert_eq!(args.listen, Some("127.0.0.1:8080".parse().unwrap()));
    }

    #[test]
    fn invalid_listen_address_is_rejected() {
        assert!(Args::try_parse_from(["atelier", "--listen", "nowhere"]).is_err());
    }
}
