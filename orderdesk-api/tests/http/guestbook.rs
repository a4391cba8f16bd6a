use crate::context::TestServer;
use http::{header::LOCATION, StatusCode};
use orderdesk_domain::{OrderdeskError, Unit};

#[tokio::test]
async fn test_sign_redirects_and_escapes() -> Result<Unit, OrderdeskError> {
    let server = TestServer::new().await;

    let res = server
        .client
        .post(server.url(""))
        .form(&[("name", "<b>Eve</b>"), ("message", "<script>alert(1)</script>")])
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        res.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
        Some("/")
    );

    let page = server.get_page("").await?;

    assert_eq!(page.code, StatusCode::OK);
    assert!(page.data.contains("&lt;b&gt;Eve&lt;/b&gt;"));
    assert!(page.data.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!page.data.contains("<script>"));
    assert_eq!(server.store.row_count("entries"), 1);

    Ok(())
}

#[tokio::test]
async fn test_entries_are_listed_newest_first() -> Result<Unit, OrderdeskError> {
    let server = TestServer::new().await;

    for name in ["first", "second"] {
        let res = server
            .send_form("", &[("name", name), ("message", "hello")])
            .await?;
        assert_eq!(res.code, StatusCode::SEE_OTHER);
    }

    let page = server.get_page("").await?;

    let first = page.data.find("first").expect("Missing first entry");
    let second = page.data.find("second").expect("Missing second entry");
    assert!(second < first);

    Ok(())
}

#[tokio::test]
async fn test_empty_guestbook_page() -> Result<Unit, OrderdeskError> {
    let server = TestServer::new().await;

    let page = server.get_page("").await?;

    assert_eq!(page.code, StatusCode::OK);
    assert!(page.data.contains("No entries yet."));

    Ok(())
}

#[tokio::test]
async fn test_blank_name_renders_error_page() -> Result<Unit, OrderdeskError> {
    let server = TestServer::new().await;

    let res = server
        .send_form("", &[("name", "   "), ("message", "hello")])
        .await?;

    assert_eq!(res.code, StatusCode::BAD_REQUEST);
    assert!(res.data.contains("Missing required fields: name"));
    assert_eq!(server.store.row_count("entries"), 0);

    Ok(())
}

#[tokio::test]
async fn test_unreachable_database_page() -> Result<Unit, OrderdeskError> {
    let server = TestServer::new().await;
    server.store.reject_connections(true);

    let page = server.get_page("").await?;

    assert_eq!(page.code, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(page
        .data
        .contains("Could not connect to the database. Check Key Vault and Managed Identity settings."));
    assert!(!page.data.contains("orders.internal"));

    Ok(())
}
