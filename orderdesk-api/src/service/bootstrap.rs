use super::guard::ConnectionGuard;
use crate::algebra::RelationalStore;
use orderdesk_domain::{
    database::DatabaseConfig, ConnectionDescriptor, OrderdeskError, SecretResolver,
};
use std::sync::Arc;

/// Resolves secrets and builds a fresh [`ConnectionGuard`] for every unit of work.
#[derive(Clone)]
pub struct Bootstrap {
    resolver: SecretResolver,
    store: Arc<dyn RelationalStore>,
    database: DatabaseConfig,
}

impl Bootstrap {
    pub fn new(
        resolver: SecretResolver,
        store: Arc<dyn RelationalStore>,
        database: DatabaseConfig,
    ) -> Self {
        Self {
            resolver,
            store,
            database,
        }
    }

    pub async fn guard(&self) -> Result<ConnectionGuard, OrderdeskError> {
        let bundle = self.resolver.resolve().await?;
        let descriptor = ConnectionDescriptor::from_bundle(&bundle, &self.database)?;

        Ok(ConnectionGuard::new(self.store.clone(), descriptor))
    }
}
