use clap::Parser;

/// Command-line options; every value given here overrides the config file
/// and the environment.
#[derive(Debug, Parser)]
#[command(name = "sparql-protocol-proxy", version)]
#[command(about = "Small SPARQL protocol proxy server", long_about = None)]
pub struct Args {
    /// Configuration file, with or without extension
    #[arg(short, long, value_name = "PATH", default_value = "config")]
    pub config: String,

    /// Enable CORS, see http://enable-cors.org/
    #[arg(long, default_value_t = false)]
    pub cors: bool,

    /// Run server on HOST
    #[arg(short = 's', long, value_name = "HOST")]
    pub host: Option<String>,

    /// Run server on PORT
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Serve FILE as index.html
    #[arg(long = "index", value_name = "FILE")]
    pub index_file: Option<String>,

    /// Forward queries to the SPARQL endpoint at URL instead of the in-memory store
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["sparql-protocol-proxy"]);
        assert_eq!(args.config, "config");
        assert!(!args.cors);
        assert_eq!(args.host, None);
        assert_eq!(args.port, None);
        assert_eq!(args.index_file, None);
    }

    #[test]
    fn test_short_and_long_flags() {
        let args = Args::parse_from([
            "sparql-protocol-proxy",
            "--cors",
            "-s",
            "0.0.0.0",
            "-p",
            "9000",
            "--index",
            "index.html",
            "--endpoint",
            "http://localhost:3030/ds/sparql",
        ]);
        assert!(args.cors);
        assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.index_file.as_deref(), Some("index.html"));
        assert_eq!(args.endpoint.as_deref(), Some("http://localhost:3030/ds/sparql"));
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Args::try_parse_from(["sparql-protocol-proxy", "-p", "70000"]).is_err());
    }
}
