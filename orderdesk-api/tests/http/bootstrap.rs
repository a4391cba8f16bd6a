use crate::context::{self, client, send_request, TestServer};
use async_trait::async_trait;
use envconfig::Envconfig;
use http::{Method, StatusCode};
use mockito::{Matcher, Server as MockServer};
use orderdesk_api::{
    algebra::{Connection, RelationalStore},
    config::ServerConfig,
    domain::memory::InMemoryStore,
    server::Server,
};
use orderdesk_domain::{ConnectionDescriptor, InMemorySecretStore, OrderdeskError, Unit};
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::net::TcpListener;

/// A database that never answers a connect attempt.
struct StalledStore;

#[async_trait]
impl RelationalStore for StalledStore {
    async fn connect(
        &self,
        _descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn Connection>, OrderdeskError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_init_requires_secret_store() {
    let config = ServerConfig::init_from_hashmap(&HashMap::from([(
        "RELATIONAL_STORE".to_string(),
        "memory".to_string(),
    )]))
    .expect("Failed to initialize server config");

    assert!(Server::init(&config).await.is_err());
}

#[tokio::test]
async fn test_missing_vault_uri_makes_no_lookups() -> Result<Unit, OrderdeskError> {
    let secrets = context::discrete_secrets();
    let store = InMemoryStore::new();

    let port = TestServer::spawn(
        HashMap::from([
            ("KEYVAULT_URI".to_string(), "".to_string()),
            ("ENSURE_SCHEMA_ON_STARTUP".to_string(), "false".to_string()),
        ]),
        secrets.clone(),
        Arc::new(store.clone()),
    )
    .await;

    let res = send_request::<Value, Value>(&client(), port, "api/orders", Method::GET, None).await?;

    assert_eq!(res.code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.data,
        json!({ "error": "The service is not configured to reach its secret store" })
    );
    assert_eq!(secrets.opens(), 0);
    assert_eq!(secrets.lookups(), 0);
    assert_eq!(store.connects(), 0);

    Ok(())
}

#[tokio::test]
async fn test_startup_schema_does_not_block_requests() -> Result<Unit, OrderdeskError> {
    let port = TestServer::spawn(
        HashMap::from([("ENSURE_SCHEMA_ON_STARTUP".to_string(), "true".to_string())]),
        context::discrete_secrets(),
        Arc::new(StalledStore),
    )
    .await;

    let res = tokio::time::timeout(
        Duration::from_secs(5),
        send_request::<Value, Value>(&client(), port, "api/unknown", Method::GET, None),
    )
    .await
    .expect("Server did not answer while the startup schema pass was pending")?;

    assert_eq!(res.code, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_zero_connect_timeout_fails_init() {
    let config = ServerConfig::init_from_hashmap(&HashMap::from([
        ("RELATIONAL_STORE".to_string(), "memory".to_string()),
        ("KEYVAULT_URI".to_string(), context::VAULT.to_string()),
        ("DATABASE_CONNECT_TIMEOUT_SECS".to_string(), "0".to_string()),
    ]))
    .expect("Failed to initialize server config");

    assert!(Server::init(&config).await.is_err());
}

#[tokio::test]
async fn test_missing_secret() -> Result<Unit, OrderdeskError> {
    let server = TestServer::with_secrets(InMemorySecretStore::new([
        ("SqlUsername", "orderdesk"),
        ("SqlPassword", "hunter2"),
        ("SqlDatabase", "orders"),
    ]))
    .await;

    let res = server
        .send_request::<Value, Value>("probe", Method::GET, None)
        .await?;

    assert_eq!(res.code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.data,
        json!({ "error": "A required secret is missing from the secret store" })
    );
    assert_eq!(server.store.connects(), 0);

    Ok(())
}

#[tokio::test]
async fn test_connection_string_secret() -> Result<Unit, OrderdeskError> {
    let server = TestServer::with_secrets(InMemorySecretStore::new([(
        "SqlConnectionString",
        "Server=tcp:orders.internal,5432;Database=orders;User ID=orderdesk;Password=hunter2;",
    )]))
    .await;

    let res = server
        .send_request::<Value, Value>(
            "api/orders",
            Method::POST,
            Some(&json!({ "name": "Carol", "item": "Gear", "quantity": 1 })),
        )
        .await?;

    assert_eq!(res.code, StatusCode::CREATED);
    assert_eq!(server.store.row_count("orders"), 1);

    Ok(())
}

#[tokio::test]
async fn test_pre_resolved_connection_string() -> Result<Unit, OrderdeskError> {
    let secrets = InMemorySecretStore::new(Vec::<(String, String)>::new());
    let store = InMemoryStore::new();

    let port = TestServer::spawn(
        HashMap::from([(
            "DB_CONNECTION_STRING".to_string(),
            "Server=orders.internal;Database=orders;User ID=orderdesk;Password=hunter2".to_string(),
        )]),
        secrets.clone(),
        Arc::new(store.clone()),
    )
    .await;

    let res = send_request::<Value, Value>(&client(), port, "probe", Method::GET, None).await?;

    assert_eq!(res.code, StatusCode::OK);
    assert_eq!(res.data, json!({ "success": true }));
    assert_eq!(secrets.lookups(), 0);

    Ok(())
}

#[tokio::test]
async fn test_key_vault_probe() -> Result<Unit, OrderdeskError> {
    context::init_tracing();

    let mut vault = MockServer::new_async().await;

    let mut mocks = Vec::new();
    for (name, value) in [
        ("SqlUsername", "orderdesk"),
        ("SqlPassword", "hunter2"),
        ("SqlHost", "orders.internal"),
        ("SqlDatabase", "orders"),
    ] {
        mocks.push(
            vault
                .mock("GET", format!("/secrets/{name}").as_str())
                .match_query(Matcher::UrlEncoded("api-version".into(), "7.4".into()))
                .match_header("authorization", "Bearer vault-token")
                .with_status(200)
                .with_body(json!({ "value": value }).to_string())
                .expect_at_least(1)
                .create_async()
                .await,
        );
    }

    let config = ServerConfig::init_from_hashmap(&HashMap::from([
        ("RELATIONAL_STORE".to_string(), "memory".to_string()),
        ("KEYVAULT_URI".to_string(), vault.url()),
        ("IDENTITY_PROVIDER".to_string(), "static-token".to_string()),
        ("IDENTITY_STATIC_TOKEN".to_string(), "vault-token".to_string()),
    ]))
    .expect("Failed to initialize server config");

    let server = Server::init(&config)
        .await
        .expect("Failed to initialize server");

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to port");
    let port = listener
        .local_addr()
        .expect("Failed to get local address")
        .port();

    tokio::task::spawn(async move { server.serve(listener).await });

    let res = send_request::<Value, Value>(&client(), port, "probe", Method::GET, None).await?;

    assert_eq!(res.code, StatusCode::OK);
    assert_eq!(res.data, json!({ "success": true }));

    for mock in mocks {
        mock.assert_async().await;
    }

    Ok(())
}

#[tokio::test]
async fn test_unknown_route() -> Result<Unit, OrderdeskError> {
    let server = TestServer::new().await;

    let res = server
        .send_request::<Value, Value>("api/unknown", Method::GET, None)
        .await?;

    assert_eq!(res.code, StatusCode::NOT_FOUND);
    assert_eq!(res.data, json!({ "error": "Not found" }));

    Ok(())
}
