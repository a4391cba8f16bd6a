use envconfig::Envconfig;
use secrecy::SecretString;
use std::fmt::{Display, Formatter, Result};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr, Default)]
#[strum(serialize_all = "kebab-case")]
pub enum IdentityProvider {
    #[default]
    ManagedIdentity,
    StaticToken,
}

#[derive(Envconfig, Clone)] // Intentionally no Debug so secret is not printed
pub struct IdentityConfig {
    #[envconfig(from = "IDENTITY_PROVIDER", default = "managed-identity")]
    pub provider: IdentityProvider,
    #[envconfig(from = "IDENTITY_ENDPOINT")]
    pub endpoint: Option<String>,
    #[envconfig(from = "IDENTITY_HEADER")]
    pub header: Option<SecretString>,
    #[envconfig(
        from = "IMDS_ENDPOINT",
        default = "http://169.254.169.254/metadata/identity/oauth2/token"
    )]
    pub imds_endpoint: String,
    #[envconfig(from = "AZURE_CLIENT_ID")]
    pub client_id: Option<String>,
    #[envconfig(from = "IDENTITY_STATIC_TOKEN")]
    pub static_token: Option<SecretString>,
    #[envconfig(from = "KEYVAULT_RESOURCE", default = "https://vault.azure.net")]
    pub resource: String,
}

impl IdentityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_static_token(mut self, token: impl Into<String>) -> Self {
        self.provider = IdentityProvider::StaticToken;
        self.static_token = Some(SecretString::new(token.into()));
        self
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            provider: IdentityProvider::ManagedIdentity,
            endpoint: None,
            header: None,
            imds_endpoint: identity_token_fetcher::DEFAULT_IMDS_ENDPOINT.to_owned(),
            client_id: None,
            static_token: None,
            resource: "https://vault.azure.net".to_owned(),
        }
    }
}

impl Display for IdentityConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "IDENTITY_PROVIDER: {}", self.provider.as_ref())?;
        writeln!(f, "IDENTITY_ENDPOINT: {:?}", self.endpoint)?;
        writeln!(f, "IDENTITY_HEADER: ****")?;
        writeln!(f, "IMDS_ENDPOINT: {}", self.imds_endpoint)?;
        writeln!(f, "AZURE_CLIENT_ID: {:?}", self.client_id)?;
        writeln!(f, "IDENTITY_STATIC_TOKEN: ****")?;
        writeln!(f, "KEYVAULT_RESOURCE: {}", self.resource)
    }
}
