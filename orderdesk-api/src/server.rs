use crate::{
    algebra::RelationalStore,
    config::{RelationalStoreKind, ServerConfig},
    domain::{memory::InMemoryStore, postgres::PostgresStore},
    router,
    service::{bootstrap::Bootstrap, records},
    templates,
};
use anyhow::Result as AnyhowResult;
use handlebars::Handlebars;
use orderdesk_domain::{
    OrderdeskError, SecretResolver, TableSchema, Unit, ENTRIES_TABLE, ORDERS_TABLE,
};
use std::sync::Arc;
use tokio::net::TcpListener;

const SCHEMAS: &[&TableSchema] = &[&ORDERS_TABLE, &ENTRIES_TABLE];

#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub bootstrap: Bootstrap,
    pub templates: Arc<Handlebars<'static>>,
}

#[derive(Clone)]
pub struct Server {
    pub state: Arc<AppState>,
}

impl Server {
    pub async fn init(config: &ServerConfig) -> AnyhowResult<Self> {
        config.secrets_config.validate()?;
        config.db_config.validate()?;

        let resolver = SecretResolver::from_config(&config.secrets_config, &config.identity_config)?;

        let store: Arc<dyn RelationalStore> = match config.relational_store {
            RelationalStoreKind::Postgres => Arc::new(PostgresStore),
            RelationalStoreKind::Memory => Arc::new(InMemoryStore::new()),
        };

        Self::new(config, resolver, store)
    }

    pub fn new(
        config: &ServerConfig,
        resolver: SecretResolver,
        store: Arc<dyn RelationalStore>,
    ) -> AnyhowResult<Self> {
        let bootstrap = Bootstrap::new(resolver, store, config.db_config.clone());

        Ok(Self {
            state: Arc::new(AppState {
                config: config.clone(),
                bootstrap,
                templates: Arc::new(templates::registry()?),
            }),
        })
    }

    pub async fn run(&self) -> AnyhowResult<()> {
        let tcp_listener = TcpListener::bind(&self.state.config.address).await?;

        self.serve(tcp_listener).await
    }

    /// Serves requests on `tcp_listener`. The startup schema pass runs in the
    /// background and does not hold back the first response.
    pub async fn serve(&self, tcp_listener: TcpListener) -> AnyhowResult<()> {
        if self.state.config.ensure_schema_on_startup {
            let state = self.state.clone();
            tokio::spawn(async move {
                // Serving continues without the tables, each request ensures its own.
                if let Err(e) = ensure_schema(&state).await {
                    tracing::error!("Could not ensure the database schema on startup: {e}");
                }
            });
        }

        let app = router::get_router(&self.state);

        tracing::info!("Orderdesk server listening on {}", tcp_listener.local_addr()?);

        axum::serve(tcp_listener, app.into_make_service())
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))
    }
}

async fn ensure_schema(state: &AppState) -> Result<Unit, OrderdeskError> {
    let mut guard = state.bootstrap.guard().await?;
    records::ensure_schema(&mut guard, SCHEMAS).await?;

    tracing::info!("Database schema is in place");

    Ok(())
}
