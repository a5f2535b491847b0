use tutorlink_transport::{Address, DEFAULT_PORT};

/// Host-side settings.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Port to listen on. Port 0 picks an ephemeral port.
    pub port: u16,
    /// When set, clients must register with this password.
    pub password: Option<String>,
}

impl Default for HostConfig {
    fn default() -> HostConfig {
        HostConfig {
            port: DEFAULT_PORT,
            password: None,
        }
    }
}

/// Client-side settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The host to connect to.
    pub address: Address,
    /// Sent during registration when the host requires one.
    pub password: Option<String>,
}

impl ClientConfig {
    pub fn new(address: Address) -> ClientConfig {
        ClientConfig {
            address,
            password: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> ClientConfig {
        self.password = Some(password.into());
        self
    }
}
