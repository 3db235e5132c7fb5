use anyhow::{Context, bail};
use clap::Parser;
use core::time::Duration;
use hashpass::ServiceConfig;
use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
};

/// Runtime configuration for the `hashpass-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file in the working directory is loaded first), with defaults that
/// match the reference behavior of the service.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "hashpass-server",
    version,
    about = "An HTTP service that hashes passwords in the background and lets clients poll for the result"
)]
pub struct CliArgs {
    /// The port the server will listen on.
    ///
    /// Environment variable: `PORT`
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Interface address to bind.
    ///
    /// Environment variable: `HOST`
    #[arg(long, env = "HOST", default_value_t = String::from("0.0.0.0"))]
    pub host: String,

    /// File name for logging information. If not specified, logging is to
    /// stderr. The file is created if missing and appended to otherwise.
    ///
    /// Environment variable: `LOGFILE`
    #[arg(long, env = "LOGFILE")]
    pub logfile: Option<PathBuf>,

    /// Artificial delay, in milliseconds, before each password is hashed.
    ///
    /// Environment variable: `HASH_DELAY_MS`
    #[arg(long, env = "HASH_DELAY_MS", default_value_t = 5_000)]
    pub hash_delay_ms: u64,

    /// Upper bound, in seconds, on how long shutdown waits for outstanding
    /// hashes. When unset, shutdown waits for as long as the work takes.
    ///
    /// Environment variable: `DRAIN_TIMEOUT_SECS`
    #[arg(long, env = "DRAIN_TIMEOUT_SECS")]
    pub drain_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub logfile: Option<PathBuf>,
    pub hash_delay: Duration,
    pub drain_timeout: Option<Duration>,
}

impl ServerConfig {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            hash_delay: self.hash_delay,
            drain_timeout: self.drain_timeout,
        }
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.port == 0 {
            bail!("PORT must be greater than 0");
        }

        if args.drain_timeout_secs == Some(0) {
            bail!("DRAIN_TIMEOUT_SECS must be greater than 0 when set");
        }

        let ip = args
            .host
            .parse::<IpAddr>()
            .with_context(|| format!("HOST `{}` is not an IP address", args.host))?;

        Ok(Self {
            addr: SocketAddr::new(ip, args.port),
            logfile: args.logfile,
            hash_delay: Duration::from_millis(args.hash_delay_ms),
            drain_timeout: args.drain_timeout_secs.map(Duration::from_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<ServerConfig> {
        let argv = core::iter::once("hashpass-server").chain(args.iter().copied());
        ServerConfig::try_from(CliArgs::try_parse_from(argv)?)
    }

    #[test]
    fn defaults_match_reference_behavior() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.hash_delay, Duration::from_secs(5));
        assert_eq!(config.drain_timeout, None);
        assert!(config.logfile.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--port",
            "9090",
            "--host",
            "127.0.0.1",
            "--logfile",
            "/tmp/hashpass.log",
            "--hash-delay-ms",
            "250",
            "--drain-timeout-secs",
            "30",
        ])
        .unwrap();

        assert_eq!(config.addr, "127.0.0.1:9090".parse().unwrap());
        assert_eq!(config.logfile, Some(PathBuf::from("/tmp/hashpass.log")));
        assert_eq!(
            config.service_config(),
            ServiceConfig {
                hash_delay: Duration::from_millis(250),
                drain_timeout: Some(Duration::from_secs(30)),
            }
        );
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(parse(&["--port", "0"]).is_err());
        assert!(parse(&["--host", "not an address"]).is_err());
        assert!(parse(&["--drain-timeout-secs", "0"]).is_err());
        assert!(parse(&["--port", "70000"]).is_err());
    }

    #[test]
    fn accepts_ipv6_hosts() {
        let config = parse(&["--host", "::1", "--port", "8081"]).unwrap();
        assert_eq!(config.addr, "[::1]:8081".parse().unwrap());
    }
}
