use crate::{InternalError, OrderdeskError, TransportOptions, Unit};
use envconfig::Envconfig;
use std::{
    fmt::{Display, Formatter},
    time::Duration,
};

/// Transport defaults applied to every connection descriptor.
#[derive(Envconfig, Clone)]
pub struct DatabaseConfig {
    #[envconfig(from = "DATABASE_CONNECT_TIMEOUT_SECS", default = "30")]
    pub connect_timeout_secs: u64,
    #[envconfig(from = "DATABASE_DEFAULT_PORT", default = "5432")]
    pub default_port: u16,
    #[envconfig(from = "DATABASE_ENCRYPT", default = "true")]
    pub encrypt: bool,
    #[envconfig(from = "DATABASE_TRUST_SERVER_CERTIFICATE", default = "false")]
    pub trust_server_certificate: bool,
}

impl DatabaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_secs = timeout.as_secs();
        self
    }

    pub fn validate(&self) -> Result<Unit, OrderdeskError> {
        if self.connect_timeout_secs == 0 {
            return Err(InternalError::configuration_error(
                "DATABASE_CONNECT_TIMEOUT_SECS must be at least 1",
                Some("connect_timeout"),
            ));
        }

        Ok(())
    }

    pub fn transport(&self) -> TransportOptions {
        TransportOptions {
            encrypt: self.encrypt,
            trust_server_certificate: self.trust_server_certificate,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            default_port: 5432,
            encrypt: true,
            trust_server_certificate: false,
        }
    }
}

impl Display for DatabaseConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "DATABASE_CONNECT_TIMEOUT_SECS: {}",
            self.connect_timeout_secs
        )?;
        writeln!(f, "DATABASE_DEFAULT_PORT: {}", self.default_port)?;
        writeln!(f, "DATABASE_ENCRYPT: {}", self.encrypt)?;
        writeln!(
            f,
            "DATABASE_TRUST_SERVER_CERTIFICATE: {}",
            self.trust_server_certificate
        )
    }
}
