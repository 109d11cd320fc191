//! Command-line options for the candlewick server.
//!
//! | Option | Env | Default |
//! |--------|-----|---------|
//! | `--bind` | `CANDLEWICK_BIND` | `127.0.0.1` |
//! | `--port` | `CANDLEWICK_PORT` | `8080` |
//! | `--log-json` | `CANDLEWICK_LOG_JSON` | `false` |
//!
//! Upstream settings are read from the environment by `ServiceConfig`.

use clap::Parser;

/// Candle endpoint backed by the Polygon aggregates API.
#[derive(Debug, Parser)]
#[command(name = "candlewick", author, version, about)]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, env = "CANDLEWICK_BIND", default_value = "127.0.0.1")]
    pub bind: String,

    /// Port to listen on.
    #[arg(long, env = "CANDLEWICK_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Emit logs as JSON lines.
    #[arg(long, env = "CANDLEWICK_LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_loopback() {
        let cli = Cli::try_parse_from(["candlewick"]).expect("defaults parse");
        assert_eq!(cli.port, 8080);
        assert!(!cli.log_json);
    }

    #[test]
    fn reads_flags() {
        let cli = Cli::try_parse_from([
            "candlewick",
            "--bind",
            "0.0.0.0",
            "--port",
            "9000",
            "--log-json",
        ])
        .expect("flags parse");

        assert_eq!(cli.bind, "0.0.0.0");
        assert_eq!(cli.port, 9000);
        assert!(cli.log_json);
    }
}
