use envconfig::Envconfig;
use orderdesk_domain::{database::DatabaseConfig, identity::IdentityConfig, secrets::SecretsConfig};
use std::{
    fmt::{Display, Formatter, Result},
    net::SocketAddr,
};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum RelationalStoreKind {
    Postgres,
    Memory,
}

#[derive(Envconfig, Clone)] // Intentionally no Debug so secret is not printed
pub struct ServerConfig {
    #[envconfig(from = "WORKER_THREADS")]
    pub worker_threads: Option<usize>,
    #[envconfig(from = "INTERNAL_SERVER_ADDRESS", default = "0.0.0.0:3005")]
    pub address: SocketAddr,
    #[envconfig(from = "RELATIONAL_STORE", default = "postgres")]
    pub relational_store: RelationalStoreKind,
    #[envconfig(from = "ORDERS_READ_LIMIT", default = "5")]
    pub orders_read_limit: u32,
    #[envconfig(from = "ENSURE_SCHEMA_ON_STARTUP", default = "true")]
    pub ensure_schema_on_startup: bool,
    #[envconfig(nested = true)]
    pub secrets_config: SecretsConfig,
    #[envconfig(nested = true)]
    pub identity_config: IdentityConfig,
    #[envconfig(nested = true)]
    pub db_config: DatabaseConfig,
}

impl Display for ServerConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "WORKER_THREADS: {:?}", self.worker_threads)?;
        writeln!(f, "INTERNAL_SERVER_ADDRESS: {}", self.address)?;
        writeln!(f, "RELATIONAL_STORE: {}", self.relational_store.as_ref())?;
        writeln!(f, "ORDERS_READ_LIMIT: {}", self.orders_read_limit)?;
        writeln!(
            f,
            "ENSURE_SCHEMA_ON_STARTUP: {}",
            self.ensure_schema_on_startup
        )?;
        write!(f, "{}", self.secrets_config)?;
        write!(f, "{}", self.identity_config)?;
        write!(f, "{}", self.db_config)
    }
}
