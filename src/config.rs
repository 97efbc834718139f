use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_RATE_LIMIT: u32 = 10;
pub const DEFAULT_RATE_WINDOW_SECS: u64 = 60;
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "api-simulation")]
#[command(about = "Greeting server with a fixed-window rate limit per client")]
pub struct Args {
    // Port to listen on (all interfaces)
    #[arg(short, long, env = "API_SIM_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    // Max requests per client per window
    #[arg(long, env = "API_SIM_RATE_LIMIT", default_value_t = DEFAULT_RATE_LIMIT)]
    pub rate_limit: u32,

    // Rate limit window in seconds, at least 1
    #[arg(
        long,
        env = "API_SIM_RATE_WINDOW",
        default_value_t = DEFAULT_RATE_WINDOW_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rate_window: u64,

    // How long shutdown waits for in-flight requests, in seconds
    #[arg(
        long,
        env = "API_SIM_SHUTDOWN_GRACE",
        default_value_t = DEFAULT_SHUTDOWN_GRACE_SECS
    )]
    pub shutdown_grace: u64,

    // Serve Prometheus metrics on /metrics
    #[arg(long, env = "API_SIM_METRICS")]
    pub metrics: bool,
}

impl Args {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            quota: self.rate_limit,
            window: Duration::from_secs(self.rate_window),
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace)
    }
}

/// Quota and window of the fixed-window limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Max admitted requests per client per window.
    pub quota: u32,
    /// Every window the whole counter table is cleared.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            quota: DEFAULT_RATE_LIMIT,
            window: Duration::from_secs(DEFAULT_RATE_WINDOW_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_constants() {
        let args = Args::try_parse_from(["api-simulation"]).unwrap();

        assert_eq!(args.listen_addr(), "0.0.0.0:8080".parse().unwrap());
        assert_eq!(args.rate_limit_config(), RateLimitConfig::default());
        assert_eq!(args.rate_limit_config().quota, 10);
        assert_eq!(args.rate_limit_config().window, Duration::from_secs(60));
        assert_eq!(args.shutdown_grace(), Duration::from_secs(5));
        assert!(!args.metrics);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "api-simulation",
            "--port",
            "9090",
            "--rate-limit",
            "3",
            "--rate-window",
            "2",
            "--shutdown-grace",
            "1",
            "--metrics",
        ])
        .unwrap();

        assert_eq!(args.listen_addr().port(), 9090);
        assert_eq!(
            args.rate_limit_config(),
            RateLimitConfig {
                quota: 3,
                window: Duration::from_secs(2),
            }
        );
        assert_eq!(args.shutdown_grace(), Duration::from_secs(1));
        assert!(args.metrics);
    }

    #[test]
    fn zero_rate_window_is_rejected() {
        let err = Args::try_parse_from(["api-simulation", "--rate-window", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let args = Args::try_parse_from(["api-simulation", "--rate-window", "1"]).unwrap();
        assert_eq!(args.rate_limit_config().window, Duration::from_secs(1));
    }
}
