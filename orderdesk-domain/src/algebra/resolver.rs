use super::{credential_from_config, KeyVaultSecretStoreFactory, SecretStore, SecretStoreFactory};
use crate::{
    identity::IdentityConfig,
    secrets::{SecretLayout, SecretsConfig},
    InternalError, OrderdeskError, SecretBundle, SecretKey,
};
use futures::future::{try_join3, try_join4};
use reqwest::Client;
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};

/// Produces the secrets needed to reach the database. Every call goes back to
/// the secret store, nothing is cached between calls.
#[derive(Clone)]
pub struct SecretResolver {
    config: SecretsConfig,
    factory: Arc<dyn SecretStoreFactory>,
}

impl SecretResolver {
    pub fn new(config: SecretsConfig, factory: Arc<dyn SecretStoreFactory>) -> Self {
        Self { config, factory }
    }

    /// Wires the Key Vault store and the configured identity.
    pub fn from_config(
        secrets: &SecretsConfig,
        identity: &IdentityConfig,
    ) -> Result<Self, OrderdeskError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(secrets.timeout_secs))
            .build()
            .map_err(|e| {
                InternalError::io_err(&format!("Failed to build HTTP client: {e}"), None)
            })?;

        let credential = credential_from_config(identity, client.clone())?;
        let factory = KeyVaultSecretStoreFactory::new(
            client,
            credential,
            secrets.keyvault_api_version.clone(),
            identity.resource.clone(),
        );

        Ok(Self::new(secrets.clone(), Arc::new(factory)))
    }

    pub async fn resolve(&self) -> Result<SecretBundle, OrderdeskError> {
        if let Some(connection_string) = &self.config.connection_string {
            tracing::debug!("Using the pre-resolved connection string");
            return Ok(SecretBundle::from_connection_string(
                connection_string.clone(),
            ));
        }

        let endpoint = self.config.keyvault_uri().ok_or_else(|| {
            InternalError::configuration_error(
                "KEYVAULT_URI is not set and no DB_CONNECTION_STRING was provided",
                Some("keyvault_uri"),
            )
        })?;

        let store = self.factory.open(endpoint)?;

        tracing::debug!(
            layout = self.config.layout.as_ref(),
            "Resolving database secrets from {endpoint}"
        );

        match self.config.layout {
            SecretLayout::ConnectionString => self.connection_string(store.as_ref()).await,
            SecretLayout::Discrete => self.discrete(store.as_ref()).await,
            SecretLayout::Auto => {
                match self.fetch(store.as_ref(), SecretKey::Username).await {
                    Ok(username) => self.remaining_discrete(store.as_ref(), username).await,
                    Err(OrderdeskError::Internal(InternalError::SecretNotFound { .. })) => {
                        tracing::debug!(
                            "No username secret found, falling back to the connection string"
                        );
                        self.connection_string(store.as_ref()).await
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    async fn fetch(
        &self,
        store: &dyn SecretStore,
        key: SecretKey,
    ) -> Result<SecretString, OrderdeskError> {
        store.get_secret(self.config.secret_name(key)).await
    }

    async fn connection_string(
        &self,
        store: &dyn SecretStore,
    ) -> Result<SecretBundle, OrderdeskError> {
        self.fetch(store, SecretKey::ConnectionString)
            .await
            .map(SecretBundle::from_connection_string)
    }

    async fn discrete(&self, store: &dyn SecretStore) -> Result<SecretBundle, OrderdeskError> {
        let (username, password, host, database) = try_join4(
            self.fetch(store, SecretKey::Username),
            self.fetch(store, SecretKey::Password),
            self.fetch(store, SecretKey::Host),
            self.fetch(store, SecretKey::Database),
        )
        .await?;

        Ok(SecretBundle::from_iter([
            (SecretKey::Username, username),
            (SecretKey::Password, password),
            (SecretKey::Host, host),
            (SecretKey::Database, database),
        ]))
    }

    async fn remaining_discrete(
        &self,
        store: &dyn SecretStore,
        username: SecretString,
    ) -> Result<SecretBundle, OrderdeskError> {
        let (password, host, database) = try_join3(
            self.fetch(store, SecretKey::Password),
            self.fetch(store, SecretKey::Host),
            self.fetch(store, SecretKey::Database),
        )
        .await?;

        Ok(SecretBundle::from_iter([
            (SecretKey::Username, username),
            (SecretKey::Password, password),
            (SecretKey::Host, host),
            (SecretKey::Database, database),
        ]))
    }
}
