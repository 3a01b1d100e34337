// Configuration module entry point
// Loads the process configuration once and holds the shared request state

mod state;
mod types;

use crate::cli::Args;
use std::net::{SocketAddr, ToSocketAddrs};

// Re-export public types
pub use state::AppState;
pub use types::{Config, ServerConfig, StoreBackend, DEFAULT_HOST, DEFAULT_PORT};

impl Config {
    /// Load configuration: defaults, then the config file named by `--config`
    /// (`config.toml` when not given), then `SPARQL_PROXY_*` environment
    /// variables, then command-line flags
    pub fn load(args: &Args) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&args.config).required(false))
            .add_source(
                config::Environment::with_prefix("SPARQL_PROXY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("server.enable_cors", false)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("store.backend", "memory")?
            .set_override_option("server.host", args.host.clone())?
            .set_override_option("server.port", args.port.map(i64::from))?
            .set_override_option("server.enable_cors", args.cors.then_some(true))?
            .set_override_option("server.index_file", args.index_file.clone())?
            .set_override_option("store.backend", args.endpoint.as_ref().map(|_| "remote"))?
            .set_override_option("store.endpoint", args.endpoint.clone())?
            .build()?;

        settings.try_deserialize()
    }

    /// Resolve the listen address; `host` may be an IP literal or a hostname
    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        let host = self.server.host.as_str();
        (host, self.server.port)
            .to_socket_addrs()
            .map_err(|e| format!("Invalid address '{host}': {e}"))?
            .next()
            .ok_or_else(|| format!("Invalid address '{host}': no address found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use std::path::Path;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("sparql-protocol-proxy").chain(extra.iter().copied()))
    }

    #[test]
    fn test_defaults_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let cfg = Config::load(&args(&["--config", missing.to_str().unwrap()])).unwrap();

        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8000);
        assert!(!cfg.server.enable_cors);
        assert_eq!(cfg.server.index_file, None);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_file_then_flags() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nhost = \"0.0.0.0\"\nport = 9000\nindex_file = \"site/index.html\"\n\n\
             [logging]\nlevel = \"warn\"\naccess_log = false"
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let cfg = Config::load(&args(&["--config", path, "-p", "9100", "--cors"])).unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 9100);
        assert!(cfg.server.enable_cors);
        assert_eq!(cfg.server.index_file.as_deref(), Some(Path::new("site/index.html")));
        assert_eq!(cfg.logging.level, "warn");
        assert!(!cfg.logging.access_log);
    }

    #[test]
    fn test_endpoint_flag_selects_remote_backend() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let cfg = Config::load(&args(&[
            "--config",
            missing.to_str().unwrap(),
            "--endpoint",
            "http://localhost:3030/ds/sparql",
        ]))
        .unwrap();
        assert_eq!(cfg.store.backend, StoreBackend::Remote);
        assert_eq!(cfg.store.endpoint.as_deref(), Some("http://localhost:3030/ds/sparql"));
    }

    #[test]
    fn test_socket_addr() {
        let cfg = Config::default();
        assert_eq!(cfg.get_socket_addr().unwrap().to_string(), "127.0.0.1:8000");

        let mut named = Config::default();
        named.server.host = "localhost".to_string();
        assert!(named.get_socket_addr().unwrap().ip().is_loopback());

        let mut bad = Config::default();
        bad.server.host = "not a host".to_string();
        assert!(bad.get_socket_addr().is_err());
    }
}
