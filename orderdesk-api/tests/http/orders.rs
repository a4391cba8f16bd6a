use crate::context::TestServer;
use http::{Method, StatusCode};
use orderdesk_domain::{OrderdeskError, Unit};
use serde_json::{json, Value};

#[tokio::test]
async fn test_create_then_list_order() -> Result<Unit, OrderdeskError> {
    let server = TestServer::new().await;

    let res = server
        .send_request::<Value, Value>(
            "api/orders",
            Method::POST,
            Some(&json!({ "name": "Alice", "item": "Widget", "quantity": 3 })),
        )
        .await?;

    assert_eq!(res.code, StatusCode::CREATED);
    assert_eq!(res.data["message"], "Order inserted successfully!");
    let id = res.data["id"].as_i64().expect("Failed to get id");

    let res = server
        .send_request::<Value, Vec<Value>>("api/orders", Method::GET, None)
        .await?;

    assert_eq!(res.code, StatusCode::OK);
    assert_eq!(
        res.data,
        vec![json!({ "id": id, "name": "Alice", "item": "Widget", "quantity": 3 })]
    );

    Ok(())
}

#[tokio::test]
async fn test_missing_field_inserts_nothing() -> Result<Unit, OrderdeskError> {
    let server = TestServer::new().await;
    let connects = server.store.connects();

    let res = server
        .send_request::<Value, Value>(
            "api/orders",
            Method::POST,
            Some(&json!({ "name": "Alice", "item": "Widget" })),
        )
        .await?;

    assert_eq!(res.code, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.data,
        json!({ "error": "Missing required fields: quantity" })
    );
    assert_eq!(server.store.connects(), connects);
    assert_eq!(server.store.row_count("orders"), 0);

    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_rejected() -> Result<Unit, OrderdeskError> {
    let server = TestServer::new().await;

    let res = server
        .client
        .post(server.url("api/orders"))
        .header("content-type", "application/json")
        .body("{\"name\":")
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.expect("Failed to deserialize response");
    assert!(body["error"].is_string());
    assert_eq!(server.store.row_count("orders"), 0);

    Ok(())
}

#[tokio::test]
async fn test_list_returns_newest_five() -> Result<Unit, OrderdeskError> {
    let server = TestServer::new().await;

    for quantity in 1..=7 {
        let res = server
            .send_request::<Value, Value>(
                "api/orders",
                Method::POST,
                Some(&json!({ "name": "Bob", "item": "Bolt", "quantity": quantity })),
            )
            .await?;
        assert_eq!(res.code, StatusCode::CREATED);
    }

    let res = server
        .send_request::<Value, Vec<Value>>("api/orders", Method::GET, None)
        .await?;

    let quantities = res
        .data
        .iter()
        .map(|order| order["quantity"].as_i64().expect("Failed to get quantity"))
        .collect::<Vec<_>>();

    assert_eq!(quantities, vec![7, 6, 5, 4, 3]);

    Ok(())
}

#[tokio::test]
async fn test_every_request_refetches_secrets() -> Result<Unit, OrderdeskError> {
    let server = TestServer::new().await;

    let _ = server
        .send_request::<Value, Vec<Value>>("api/orders", Method::GET, None)
        .await?;
    let lookups = server.secrets.lookups();
    let connects = server.store.connects();

    let res = server
        .send_request::<Value, Vec<Value>>("api/orders", Method::GET, None)
        .await?;

    assert_eq!(res.code, StatusCode::OK);
    assert!(server.secrets.lookups() > lookups);
    assert_eq!(server.store.connects(), connects + 1);
    assert_eq!(server.store.closes(), server.store.connects());

    Ok(())
}

#[tokio::test]
async fn test_unreachable_database_is_sanitized() -> Result<Unit, OrderdeskError> {
    let server = TestServer::new().await;
    server.store.reject_connections(true);

    let res = server
        .send_request::<Value, Value>("api/orders", Method::GET, None)
        .await?;

    assert_eq!(res.code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.data,
        json!({ "error": "Could not connect to the database" })
    );

    let res = server
        .send_request::<Value, Value>(
            "api/orders",
            Method::POST,
            Some(&json!({ "name": "Alice", "item": "Widget", "quantity": 3 })),
        )
        .await?;

    assert_eq!(res.code, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!res.data.to_string().contains("hunter2"));
    assert!(!res.data.to_string().contains("orders.internal"));

    Ok(())
}
