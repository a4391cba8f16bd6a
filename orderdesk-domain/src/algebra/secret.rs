use super::{AccessToken, CredentialProvider};
use crate::{InternalError, OrderdeskError};
use async_trait::async_trait;
use http::StatusCode;
use reqwest::{header::AUTHORIZATION, Client, Url};
use secrecy::SecretString;
use serde::Deserialize;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tokio::sync::OnceCell;

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, name: &str) -> Result<SecretString, OrderdeskError>;
}

/// Opens a [`SecretStore`] for a vault endpoint. Opening never performs network I/O.
pub trait SecretStoreFactory: Send + Sync {
    fn open(&self, endpoint: &str) -> Result<Arc<dyn SecretStore>, OrderdeskError>;
}

#[derive(Debug, Deserialize)]
struct KeyVaultSecret {
    value: String,
}

/// Azure Key Vault over its REST API. The bearer token is acquired on the
/// first lookup and reused for the lifetime of this store.
pub struct KeyVaultSecretStore {
    client: Client,
    vault: Url,
    api_version: String,
    resource: String,
    credential: Arc<dyn CredentialProvider>,
    token: OnceCell<AccessToken>,
}

impl KeyVaultSecretStore {
    async fn token(&self) -> Result<&AccessToken, OrderdeskError> {
        self.token
            .get_or_try_init(|| self.credential.token(&self.resource))
            .await
    }

    fn secret_url(&self, name: &str) -> Result<Url, OrderdeskError> {
        let mut url = self.vault.clone();
        url.path_segments_mut()
            .map_err(|_| {
                InternalError::configuration_error(
                    &format!("Secret store endpoint {} cannot be a base URL", self.vault),
                    Some("keyvault_uri"),
                )
            })?
            .pop_if_empty()
            .extend(["secrets", name]);
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);

        Ok(url)
    }
}

#[async_trait]
impl SecretStore for KeyVaultSecretStore {
    async fn get_secret(&self, name: &str) -> Result<SecretString, OrderdeskError> {
        let token = self.token().await?;
        let url = self.secret_url(name)?;

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, token.authorization())
            .send()
            .await
            .map_err(|e| {
                InternalError::io_err(
                    &format!("Failed to reach the secret store for {name}: {e}"),
                    Some("keyvault"),
                )
            })?;

        match response.status() {
            status if status.is_success() => {
                let secret = response.json::<KeyVaultSecret>().await.map_err(|e| {
                    InternalError::deserialize_error(
                        &format!("Failed to deserialize secret {name}: {e}"),
                        Some("keyvault"),
                    )
                })?;

                Ok(SecretString::new(secret.value))
            }
            StatusCode::NOT_FOUND => Err(InternalError::secret_not_found(
                &format!("Secret {name} was not found in {}", self.vault),
                None,
            )),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(InternalError::authentication_error(
                    &format!(
                        "Secret store rejected the identity with status {} for {name}",
                        response.status()
                    ),
                    Some("keyvault"),
                ))
            }
            status => Err(InternalError::io_err(
                &format!("Secret store responded with status {status} for {name}"),
                Some("keyvault"),
            )),
        }
    }
}

#[derive(Clone)]
pub struct KeyVaultSecretStoreFactory {
    client: Client,
    credential: Arc<dyn CredentialProvider>,
    api_version: String,
    resource: String,
}

impl KeyVaultSecretStoreFactory {
    pub fn new(
        client: Client,
        credential: Arc<dyn CredentialProvider>,
        api_version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            client,
            credential,
            api_version: api_version.into(),
            resource: resource.into(),
        }
    }
}

impl SecretStoreFactory for KeyVaultSecretStoreFactory {
    fn open(&self, endpoint: &str) -> Result<Arc<dyn SecretStore>, OrderdeskError> {
        let vault = Url::parse(endpoint.trim()).map_err(|e| {
            InternalError::configuration_error(
                &format!("KEYVAULT_URI is not a valid URL: {e}"),
                Some("keyvault_uri"),
            )
        })?;

        if !matches!(vault.scheme(), "https" | "http") {
            return Err(InternalError::configuration_error(
                &format!("KEYVAULT_URI must use http or https, got {}", vault.scheme()),
                Some("keyvault_uri"),
            ));
        }

        Ok(Arc::new(KeyVaultSecretStore {
            client: self.client.clone(),
            vault,
            api_version: self.api_version.clone(),
            resource: self.resource.clone(),
            credential: self.credential.clone(),
            token: OnceCell::new(),
        }))
    }
}

/// Secrets held in memory. Clones share their counters.
#[derive(Clone, Default)]
pub struct InMemorySecretStore {
    secrets: Arc<HashMap<String, SecretString>>,
    lookups: Arc<AtomicUsize>,
    opens: Arc<AtomicUsize>,
}

impl InMemorySecretStore {
    pub fn new<I, K, V>(secrets: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            secrets: Arc::new(
                secrets
                    .into_iter()
                    .map(|(k, v)| (k.into(), SecretString::new(v.into())))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get_secret(&self, name: &str) -> Result<SecretString, OrderdeskError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| InternalError::secret_not_found(&format!("Secret {name}"), None))
    }
}

impl SecretStoreFactory for InMemorySecretStore {
    fn open(&self, _endpoint: &str) -> Result<Arc<dyn SecretStore>, OrderdeskError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.clone()))
    }
}
