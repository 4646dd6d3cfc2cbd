//! Configuration for the client
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::time::Duration;

use crate::error::{KuduError, Result};
use crate::session::FlushMode;

/// Port assumed when a master address omits one
pub const DEFAULT_MASTER_PORT: u16 = 7051;

/// Main configuration for a client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -------------------------------------------------------------------------
    // Connection Configuration
    // -------------------------------------------------------------------------
    /// Coordination (master) server addresses, `host` or `host:port`.
    /// Tried in order during the handshake.
    pub master_addrs: Vec<String>,

    // -------------------------------------------------------------------------
    // Session Defaults
    // -------------------------------------------------------------------------
    /// Flush mode of newly created sessions
    pub default_flush_mode: FlushMode,

    /// Background flush period (milliseconds)
    pub flush_interval_ms: u64,

    /// Buffered operations that trigger a background flush
    pub mutation_buffer_max_ops: usize,

    // -------------------------------------------------------------------------
    // Scan Defaults
    // -------------------------------------------------------------------------
    /// Rows per scan page requested from the engine
    pub scan_batch_size_rows: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            master_addrs: Vec::new(),
            default_flush_mode: FlushMode::AutoFlushSync,
            flush_interval_ms: 1000,
            mutation_buffer_max_ops: 1000,
            scan_batch_size_rows: 1000,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Background flush period; never shorter than one millisecond
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.max(1))
    }

    /// Parse every master address
    pub fn resolve_masters(&self) -> Result<Vec<HostPort>> {
        if self.master_addrs.is_empty() {
            return Err(KuduError::Connection(
                "no master server addresses configured".to_string(),
            ));
        }
        self.master_addrs.iter().map(|a| HostPort::parse(a)).collect()
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Add a master server address
    pub fn add_master_server_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.master_addrs.push(addr.into());
        self
    }

    /// Set the default flush mode for new sessions
    pub fn default_flush_mode(mut self, mode: FlushMode) -> Self {
        self.config.default_flush_mode = mode;
        self
    }

    /// Set the background flush interval (in milliseconds)
    pub fn flush_interval_ms(mut self, ms: u64) -> Self {
        self.config.flush_interval_ms = ms;
        self
    }

    /// Set the buffered operation count that triggers a background flush
    pub fn mutation_buffer_max_ops(mut self, count: usize) -> Self {
        self.config.mutation_buffer_max_ops = count;
        self
    }

    /// Set the number of rows per scan page
    pub fn scan_batch_size_rows(mut self, rows: usize) -> Self {
        self.config.scan_batch_size_rows = rows;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

// =============================================================================
// Host/Port
// =============================================================================

/// A resolved master address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostPort {
    pub host: String,
    pub port: u16,
}

impl HostPort {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host` or `host:port`; bracketed IPv6 (`[::1]:7051`) is accepted
    pub fn parse(addr: &str) -> Result<Self> {
        let addr = addr.trim();
        let invalid = |reason: &str| {
            KuduError::Connection(format!("invalid master address '{}': {}", addr, reason))
        };

        if addr.is_empty() {
            return Err(invalid("empty address"));
        }

        let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(|| invalid("missing ']'"))?;
            match tail.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None if tail.is_empty() => (host, None),
                None => return Err(invalid("unexpected characters after ']'")),
            }
        } else {
            match addr.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (addr, None),
            }
        };

        if host.is_empty() {
            return Err(invalid("empty host"));
        }
        let port = match port {
            Some(port) => port.parse::<u16>().map_err(|_| invalid("bad port"))?,
            None => DEFAULT_MASTER_PORT,
        };
        Ok(Self::new(host, port))
    }
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
