use crate::{
    identity::{IdentityConfig, IdentityProvider},
    InternalError, OrderdeskError,
};
use async_trait::async_trait;
use identity_token_fetcher::{IdentityEndpoint, IdentityTokenFetcher};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

/// An `Authorization` header value scoped to one resource.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    /// Accepts either a raw token or a value that already carries the `Bearer` scheme.
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.starts_with("Bearer ") {
            Self(SecretString::new(token))
        } else {
            Self(SecretString::new(format!("Bearer {token}")))
        }
    }

    pub fn authorization(&self) -> &str {
        self.0.expose_secret()
    }
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn token(&self, resource: &str) -> Result<AccessToken, OrderdeskError>;
}

/// Identity issued by the hosting platform.
#[derive(Clone)]
pub struct ManagedIdentityCredential {
    fetcher: IdentityTokenFetcher,
}

impl ManagedIdentityCredential {
    pub fn new(config: &IdentityConfig, client: Client) -> Self {
        let endpoint = match (&config.endpoint, &config.header) {
            (Some(endpoint), Some(header)) => IdentityEndpoint::AppService {
                endpoint: endpoint.clone(),
                header: header.expose_secret().clone(),
            },
            _ => IdentityEndpoint::Imds {
                endpoint: config.imds_endpoint.clone(),
            },
        };

        let fetcher = IdentityTokenFetcher::with_client(client, endpoint);
        let fetcher = match &config.client_id {
            Some(client_id) => fetcher.client_id(client_id.clone()),
            None => fetcher,
        };

        Self { fetcher }
    }
}

#[async_trait]
impl CredentialProvider for ManagedIdentityCredential {
    async fn token(&self, resource: &str) -> Result<AccessToken, OrderdeskError> {
        self.fetcher
            .get_token(resource)
            .await
            .map(AccessToken::new)
            .map_err(|e| {
                InternalError::authentication_error(
                    &format!("Could not acquire a managed identity token: {e}"),
                    Some("managed_identity"),
                )
            })
    }
}

/// A pre-issued bearer token, for local development.
#[derive(Clone)]
pub struct StaticTokenCredential {
    token: AccessToken,
}

impl StaticTokenCredential {
    pub fn new(token: &SecretString) -> Self {
        Self {
            token: AccessToken::new(token.expose_secret().clone()),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenCredential {
    async fn token(&self, _resource: &str) -> Result<AccessToken, OrderdeskError> {
        Ok(self.token.clone())
    }
}

pub fn credential_from_config(
    config: &IdentityConfig,
    client: Client,
) -> Result<Arc<dyn CredentialProvider>, OrderdeskError> {
    match config.provider {
        IdentityProvider::ManagedIdentity => {
            Ok(Arc::new(ManagedIdentityCredential::new(config, client)))
        }
        IdentityProvider::StaticToken => match &config.static_token {
            Some(token) => Ok(Arc::new(StaticTokenCredential::new(token))),
            None => Err(InternalError::configuration_error(
                "IDENTITY_PROVIDER is static-token but IDENTITY_STATIC_TOKEN is not set",
                Some("identity"),
            )),
        },
    }
}
