use crate::context::{self, client, send_request};
use http::{Method, StatusCode};
use orderdesk_api::domain::postgres::PostgresStore;
use orderdesk_domain::{InMemorySecretStore, OrderdeskError, Unit};
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc, sync::OnceLock};
use testcontainers_modules::{
    postgres::Postgres,
    testcontainers::{clients::Cli as Docker, Container},
};
use uuid::Uuid;

static DOCKER: OnceLock<Docker> = OnceLock::new();
static POSTGRES: OnceLock<Container<'static, Postgres>> = OnceLock::new();

fn postgres_secrets() -> InMemorySecretStore {
    let docker = DOCKER.get_or_init(Default::default);
    let postgres = POSTGRES.get_or_init(|| docker.run(Postgres::default()));
    let port = postgres.get_host_port_ipv4(5432);

    InMemorySecretStore::new([(
        "SqlConnectionString".to_string(),
        format!(
            "Server=127.0.0.1;Port={port};Database=postgres;User ID=postgres;Password=postgres;Encrypt=False;"
        ),
    )])
}

async fn spawn() -> u16 {
    let env = HashMap::from([("SECRET_LAYOUT".to_string(), "connection-string".to_string())]);

    context::TestServer::spawn(env, postgres_secrets(), Arc::new(PostgresStore)).await
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn test_schema_is_ensured_concurrently() -> Result<Unit, OrderdeskError> {
    let port = spawn().await;
    let client = client();

    let (first, second) = futures::join!(
        send_request::<Value, Vec<Value>>(&client, port, "api/orders", Method::GET, None),
        send_request::<Value, Vec<Value>>(&client, port, "api/orders", Method::GET, None),
    );

    assert_eq!(first?.code, StatusCode::OK);
    assert_eq!(second?.code, StatusCode::OK);

    let res = send_request::<Value, Value>(&client, port, "probe", Method::GET, None).await?;
    assert_eq!(res.data, json!({ "success": true }));

    Ok(())
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn test_order_round_trip() -> Result<Unit, OrderdeskError> {
    let port = spawn().await;
    let item = Uuid::new_v4().to_string();

    let res = send_request::<Value, Value>(
        &client(),
        port,
        "api/orders",
        Method::POST,
        Some(&json!({ "name": "Alice", "item": item, "quantity": 3 })),
    )
    .await?;

    assert_eq!(res.code, StatusCode::CREATED);
    let id = res.data["id"].as_i64().expect("Failed to get id");

    let res =
        send_request::<Value, Vec<Value>>(&client(), port, "api/orders", Method::GET, None).await?;

    assert_eq!(res.code, StatusCode::OK);
    assert!(res.data.len() <= 5);
    assert_eq!(
        res.data.first(),
        Some(&json!({ "id": id, "name": "Alice", "item": item, "quantity": 3 }))
    );

    Ok(())
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn test_guestbook_round_trip() -> Result<Unit, OrderdeskError> {
    let port = spawn().await;
    let name = Uuid::new_v4().simple().to_string();

    let res = client()
        .post(format!("http://localhost:{port}/"))
        .form(&[("name", name.as_str()), ("message", "<i>hi</i>")])
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let page = client()
        .get(format!("http://localhost:{port}/"))
        .send()
        .await
        .expect("Failed to send request")
        .text()
        .await
        .expect("Failed to read page");

    assert!(page.contains(&name));
    assert!(page.contains("&lt;i&gt;hi&lt;/i&gt;"));

    Ok(())
}

