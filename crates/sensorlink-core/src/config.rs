// ── Runtime connection configuration ──
//
// These types describe *how* to reach the backend. They never touch disk;
// the CLI constructs a `ConsoleConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use sensorlink_api::transport::{TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed bench backends).
    DangerAcceptInvalid,
}

/// Everything the core needs to talk to one backend.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Backend root URL (e.g., `http://127.0.0.1:5000`).
    pub backend_url: Url,
    pub tls: TlsVerification,
    /// Client-side timeout applied to every request.
    pub timeout: Duration,
}

impl ConsoleConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(backend_url: Url) -> Self {
        Self {
            backend_url,
            tls: TlsVerification::default(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig::new(tls, self.timeout)
    }
}
