use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Listen address
    pub listen_addr: SocketAddr,
    // log level for http tracing
    pub log_level: tracing::Level,
    // Requests still running after this are answered with 408
    pub request_timeout: Duration,
    // Largest accepted request body, uploads included
    pub max_body_bytes: usize,
}

impl Config {
    pub fn new(listen_addr: SocketAddr, request_timeout: Duration, max_body_bytes: usize) -> Self {
        tracing::info!(
            %listen_addr,
            request_timeout_secs = request_timeout.as_secs(),
            max_body_bytes,
            "creating HTTP server config"
        );
        Self {
            listen_addr,
            log_level: tracing::Level::INFO,
            request_timeout,
            max_body_bytes,
        }
    }
}
