use crate::{InternalError, OrderdeskError, SecretKey, Unit};
use envconfig::Envconfig;
use secrecy::SecretString;
use std::fmt::{Display, Formatter, Result};
use strum::{AsRefStr, EnumString};

/// Which secrets the vault is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr, Default)]
#[strum(serialize_all = "kebab-case")]
pub enum SecretLayout {
    /// Discrete fields when the username secret exists, the full connection string otherwise.
    #[default]
    Auto,
    ConnectionString,
    Discrete,
}

#[derive(Envconfig, Clone)] // Intentionally no Debug so secret is not printed
pub struct SecretsConfig {
    #[envconfig(from = "DB_CONNECTION_STRING")]
    pub connection_string: Option<SecretString>,
    #[envconfig(from = "KEYVAULT_URI")]
    pub keyvault_uri: Option<String>,
    #[envconfig(from = "KEYVAULT_API_VERSION", default = "7.4")]
    pub keyvault_api_version: String,
    #[envconfig(from = "SECRET_LAYOUT", default = "auto")]
    pub layout: SecretLayout,
    #[envconfig(from = "CONNECTION_STRING_SECRET_NAME", default = "SqlConnectionString")]
    pub connection_string_secret_name: String,
    #[envconfig(from = "DB_USERNAME_SECRET_NAME", default = "SqlUsername")]
    pub username_secret_name: String,
    #[envconfig(from = "DB_PASSWORD_SECRET_NAME", default = "SqlPassword")]
    pub password_secret_name: String,
    #[envconfig(from = "DB_HOST_SECRET_NAME", default = "SqlHost")]
    pub host_secret_name: String,
    #[envconfig(from = "DB_NAME_SECRET_NAME", default = "SqlDatabase")]
    pub database_secret_name: String,
    #[envconfig(from = "SECRET_STORE_TIMEOUT_SECS", default = "30")]
    pub timeout_secs: u64,
}

impl SecretsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keyvault_uri(mut self, uri: impl Into<String>) -> Self {
        self.keyvault_uri = Some(uri.into());
        self
    }

    pub fn with_connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = Some(SecretString::new(connection_string.into()));
        self
    }

    pub fn with_layout(mut self, layout: SecretLayout) -> Self {
        self.layout = layout;
        self
    }

    /// The vault endpoint, treating a blank value as unset.
    pub fn keyvault_uri(&self) -> Option<&str> {
        self.keyvault_uri
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
    }

    pub fn secret_name(&self, key: SecretKey) -> &str {
        match key {
            SecretKey::ConnectionString => &self.connection_string_secret_name,
            SecretKey::Username => &self.username_secret_name,
            SecretKey::Password => &self.password_secret_name,
            SecretKey::Host => &self.host_secret_name,
            SecretKey::Database => &self.database_secret_name,
        }
    }

    /// Rejects a configuration that can never produce a connection.
    pub fn validate(&self) -> std::result::Result<Unit, OrderdeskError> {
        if self.connection_string.is_none() && self.keyvault_uri().is_none() {
            return Err(InternalError::configuration_error(
                "KEYVAULT_URI is not set and no DB_CONNECTION_STRING was provided",
                Some("keyvault_uri"),
            ));
        }

        Ok(())
    }
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            keyvault_uri: None,
            keyvault_api_version: "7.4".to_owned(),
            layout: SecretLayout::Auto,
            connection_string_secret_name: "SqlConnectionString".to_owned(),
            username_secret_name: "SqlUsername".to_owned(),
            password_secret_name: "SqlPassword".to_owned(),
            host_secret_name: "SqlHost".to_owned(),
            database_secret_name: "SqlDatabase".to_owned(),
            timeout_secs: 30,
        }
    }
}

impl Display for SecretsConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(
            f,
            "DB_CONNECTION_STRING: {}",
            if self.connection_string.is_some() {
                "****"
            } else {
                "None"
            }
        )?;
        writeln!(f, "KEYVAULT_URI: {:?}", self.keyvault_uri)?;
        writeln!(f, "KEYVAULT_API_VERSION: {}", self.keyvault_api_version)?;
        writeln!(f, "SECRET_LAYOUT: {}", self.layout.as_ref())?;
        writeln!(
            f,
            "CONNECTION_STRING_SECRET_NAME: {}",
            self.connection_string_secret_name
        )?;
        writeln!(f, "DB_USERNAME_SECRET_NAME: {}", self.username_secret_name)?;
        writeln!(f, "DB_PASSWORD_SECRET_NAME: {}", self.password_secret_name)?;
        writeln!(f, "DB_HOST_SECRET_NAME: {}", self.host_secret_name)?;
        writeln!(f, "DB_NAME_SECRET_NAME: {}", self.database_secret_name)?;
        writeln!(f, "SECRET_STORE_TIMEOUT_SECS: {}", self.timeout_secs)
    }
}
