use std::time::Duration;

/// Default port the service listens on.
pub const DEFAULT_PORT: u16 = 4000;

/// Runtime settings of a `Server`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub addr: String,
    /// Number of worker threads serving requests.
    pub threads: usize,
    /// Deadline for reading, handling and answering a single request.
    pub request_timeout: Duration,
    /// How long a connection may stay silent before it is closed.
    pub idle_timeout: Duration,
    /// How long in-flight requests may keep running after a shutdown signal.
    pub shutdown_timeout: Duration,
    /// Maximum size in bytes of a bulk request body.
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> ServerConfig {
        ServerConfig {
            addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            threads: 4,
            request_timeout: Duration::from_secs(15),
            idle_timeout: Duration::from_secs(60),
            shutdown_timeout: Duration::from_secs(15),
            body_limit: 1 << 20,
        }
    }
}
