mod parser;

use crate::{database::DatabaseConfig, InternalError, OrderdeskError, SecretBundle, SecretKey};
use parser::{parse_bool, parse_pairs, parse_server, quote, DescriptorKey};
use secrecy::{ExposeSecret, SecretString};
use std::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    time::Duration,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    pub encrypt: bool,
    pub trust_server_certificate: bool,
    pub connect_timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            encrypt: true,
            trust_server_certificate: false,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Everything needed to open one database connection.
///
/// Built from a [`SecretBundle`] and never modified afterwards. The password is
/// never part of the `Debug` or `Display` output, and there is no `Serialize`.
#[derive(Clone)]
pub struct ConnectionDescriptor {
    host: String,
    port: u16,
    database: String,
    username: String,
    password: SecretString,
    transport: TransportOptions,
}

impl ConnectionDescriptor {
    /// Prefers discrete fields when the bundle carries all of them. Discrete
    /// fields are first assembled into a canonical connection string that
    /// carries the configured transport flags, so both shapes share one parser.
    pub fn from_bundle(
        bundle: &SecretBundle,
        config: &DatabaseConfig,
    ) -> Result<Self, OrderdeskError> {
        if bundle.has_discrete_fields() {
            let field = |key: SecretKey| {
                bundle
                    .get(key)
                    .map(|value| value.expose_secret().as_str())
                    .unwrap_or_default()
            };

            let assembled = assemble(
                field(SecretKey::Host),
                config.default_port,
                field(SecretKey::Database),
                field(SecretKey::Username),
                field(SecretKey::Password),
                &config.transport(),
            );

            return Self::parse(&assembled, config);
        }

        match bundle.get(SecretKey::ConnectionString) {
            Some(connection_string) => Self::parse(connection_string, config),
            None => Err(InternalError::configuration_error(
                "Secret bundle holds neither a connection string nor the discrete connection fields",
                Some("secret_bundle"),
            )),
        }
    }

    /// Parses a `key=value;` connection string. Flags present in the string
    /// override the configured transport defaults.
    pub fn parse(
        connection_string: &SecretString,
        config: &DatabaseConfig,
    ) -> Result<Self, OrderdeskError> {
        let mut host = None;
        let mut server_port = None;
        let mut port = None;
        let mut database = None;
        let mut username = None;
        let mut password = None;
        let mut transport = config.transport();

        for (key, value) in parse_pairs(connection_string.expose_secret())? {
            match key {
                DescriptorKey::Host => {
                    let (parsed_host, parsed_port) = parse_server(&value)?;
                    host = Some(parsed_host);
                    server_port = parsed_port;
                }
                DescriptorKey::Port => {
                    port = Some(value.trim().parse::<u16>().map_err(|_| {
                        InternalError::configuration_error(
                            &format!("Invalid port '{}'", value.trim()),
                            Some("connection_string"),
                        )
                    })?);
                }
                DescriptorKey::Database => database = Some(value),
                DescriptorKey::Username => username = Some(value),
                DescriptorKey::Password => password = Some(SecretString::new(value)),
                DescriptorKey::Encrypt => transport.encrypt = parse_bool("Encrypt", &value)?,
                DescriptorKey::TrustServerCertificate => {
                    transport.trust_server_certificate =
                        parse_bool("TrustServerCertificate", &value)?
                }
                DescriptorKey::ConnectTimeout => {
                    let secs = value.trim().parse::<u64>().map_err(|_| {
                        InternalError::configuration_error(
                            &format!("Invalid connection timeout '{}'", value.trim()),
                            Some("connection_string"),
                        )
                    })?;
                    transport.connect_timeout = Duration::from_secs(secs);
                }
            }
        }

        if transport.connect_timeout.is_zero() {
            return Err(InternalError::configuration_error(
                "Connection timeout must be at least one second",
                Some("connection_string"),
            ));
        }

        Ok(Self {
            host: required(host, "host")?,
            port: server_port.or(port).unwrap_or(config.default_port),
            database: required(database, "database")?,
            username: required(username, "username")?,
            password: password
                .filter(|p| !p.expose_secret().is_empty())
                .ok_or_else(|| missing("password"))?,
            transport,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    pub fn transport(&self) -> &TransportOptions {
        &self.transport
    }

    pub fn connect_timeout(&self) -> Duration {
        self.transport.connect_timeout
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, OrderdeskError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing(field))
}

fn missing(field: &str) -> OrderdeskError {
    InternalError::configuration_error(
        &format!("Connection string is missing the {field}"),
        Some("connection_string"),
    )
}

fn flag(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn assemble(
    host: &str,
    port: u16,
    database: &str,
    username: &str,
    password: &str,
    transport: &TransportOptions,
) -> SecretString {
    SecretString::new(format!(
        "Server={};Port={};Database={};User ID={};Password={};Encrypt={};TrustServerCertificate={};Connection Timeout={};",
        quote(host),
        port,
        quote(database),
        quote(username),
        quote(password),
        flag(transport.encrypt),
        flag(transport.trust_server_certificate),
        transport.connect_timeout.as_secs(),
    ))
}

impl Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"****")
            .field("transport", &self.transport)
            .finish()
    }
}

impl Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}@{}:{}/{} (encrypt: {}, timeout: {}s)",
            self.username,
            self.host,
            self.port,
            self.database,
            self.transport.encrypt,
            self.transport.connect_timeout.as_secs()
        )
    }
}
