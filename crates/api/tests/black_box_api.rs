use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory backend, ephemeral port.
        let app = orderflow_api::app::build_in_memory_app();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create_item(
    client: &reqwest::Client,
    base_url: &str,
    name: &str,
    stock: i64,
    price: i64,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/inventory/items", base_url))
        .json(&json!({ "name": name, "stock": stock, "price": price }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn placing_an_order_decrements_stock_and_creates_delivery() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let item = create_item(&client, &srv.base_url, "Widget", 10, 250).await;
    let item_id = item["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "product_id": item_id,
            "qty": 3,
            "customer_id": "cust-1",
            "address": "1 Main St"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: serde_json::Value = res.json().await.unwrap();
    assert_eq!(order["product_id"], item["id"]);
    assert_eq!(order["qty"], 3);
    assert_eq!(order["status"], "PENDING");
    let order_id = order["id"].as_str().unwrap().to_string();

    // Stock decremented.
    let res = client
        .get(format!("{}/inventory/items/{}", srv.base_url, item_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let item: serde_json::Value = res.json().await.unwrap();
    assert_eq!(item["stock"], 7);

    // Exactly one delivery, paired with the order.
    let res = client
        .get(format!("{}/deliveries", srv.base_url))
        .send()
        .await
        .unwrap();
    let deliveries: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0]["order_id"].as_str().unwrap(), order_id);
    assert_eq!(deliveries[0]["qty"], 3);
    assert_eq!(deliveries[0]["address"], "1 Main St");
    assert_eq!(deliveries[0]["status"], "PENDING");
}

#[tokio::test]
async fn insufficient_stock_rejects_order_and_leaves_no_trace() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let item = create_item(&client, &srv.base_url, "Widget", 2, 100).await;
    let item_id = item["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "product_id": item_id,
            "qty": 5,
            "customer_id": "cust-1",
            "address": "1 Main St"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(body["available"], 2);

    // Stock untouched, no order, no delivery.
    let res = client
        .get(format!("{}/inventory/items/{}", srv.base_url, item_id))
        .send()
        .await
        .unwrap();
    let item: serde_json::Value = res.json().await.unwrap();
    assert_eq!(item["stock"], 2);

    let orders: Vec<serde_json::Value> = client
        .get(format!("{}/orders", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(orders.is_empty());

    let deliveries: Vec<serde_json::Value> = client
        .get(format!("{}/deliveries", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(deliveries.is_empty());
}

#[tokio::test]
async fn ordering_unknown_product_returns_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "product_id": uuid::Uuid::now_v7().to_string(),
            "qty": 1,
            "customer_id": "cust-1",
            "address": "1 Main St"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "product_not_found");
}

#[tokio::test]
async fn order_validation_is_rejected_before_storage() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let item = create_item(&client, &srv.base_url, "Widget", 5, 100).await;
    let item_id = item["id"].as_str().unwrap().to_string();

    // Non-positive quantity.
    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "product_id": item_id,
            "qty": 0,
            "customer_id": "cust-1",
            "address": "1 Main St"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    // Malformed product id.
    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "product_id": "not-a-uuid",
            "qty": 1,
            "customer_id": "cust-1",
            "address": "1 Main St"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn concurrent_orders_never_oversell() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let item = create_item(&client, &srv.base_url, "Widget", 5, 100).await;
    let item_id = item["id"].as_str().unwrap().to_string();

    let mut handles = Vec::new();
    for i in 0..10 {
        let client = client.clone();
        let url = format!("{}/orders", srv.base_url);
        let item_id = item_id.clone();
        handles.push(tokio::spawn(async move {
            client
                .post(url)
                .json(&json!({
                    "product_id": item_id,
                    "qty": 1,
                    "customer_id": format!("cust-{}", i),
                    "address": "1 Main St"
                }))
                .send()
                .await
                .unwrap()
                .status()
        }));
    }

    let mut created = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => rejected += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(created, 5);
    assert_eq!(rejected, 5);

    let res = client
        .get(format!("{}/inventory/items/{}", srv.base_url, item_id))
        .send()
        .await
        .unwrap();
    let item: serde_json::Value = res.json().await.unwrap();
    assert_eq!(item["stock"], 0);

    let orders: Vec<serde_json::Value> = client
        .get(format!("{}/orders", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(orders.len(), 5);
}

#[tokio::test]
async fn repeated_request_id_fulfills_once() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let item = create_item(&client, &srv.base_url, "Widget", 10, 100).await;
    let item_id = item["id"].as_str().unwrap().to_string();
    let request_id = uuid::Uuid::now_v7();

    let body = json!({
        "product_id": item_id,
        "qty": 4,
        "customer_id": "cust-1",
        "address": "1 Main St",
        "request_id": request_id
    });

    let first: serde_json::Value = client
        .post(format!("{}/orders", srv.base_url))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let second: serde_json::Value = client
        .post(format!("{}/orders", srv.base_url))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(first["id"], second["id"]);

    // Decremented once.
    let res = client
        .get(format!("{}/inventory/items/{}", srv.base_url, item_id))
        .send()
        .await
        .unwrap();
    let item: serde_json::Value = res.json().await.unwrap();
    assert_eq!(item["stock"], 6);
}

#[tokio::test]
async fn inventory_crud_and_adjust() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let item = create_item(&client, &srv.base_url, "Widget", 3, 100).await;
    let item_id = item["id"].as_str().unwrap().to_string();

    // Update name/price; stock stays under the adjust endpoint only.
    let res = client
        .put(format!("{}/inventory/items/{}", srv.base_url, item_id))
        .json(&json!({ "name": "Deluxe Widget", "price": 150 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["name"], "Deluxe Widget");
    assert_eq!(updated["price"], 150);
    assert_eq!(updated["stock"], 3);

    // Restock.
    let res = client
        .post(format!("{}/inventory/items/{}/adjust", srv.base_url, item_id))
        .json(&json!({ "delta": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let adjusted: serde_json::Value = res.json().await.unwrap();
    assert_eq!(adjusted["stock"], 10);

    // Overdraw is refused with the remaining stock reported.
    let res = client
        .post(format!("{}/inventory/items/{}/adjust", srv.base_url, item_id))
        .json(&json!({ "delta": -11 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(body["available"], 10);

    // Zero delta is a validation error.
    let res = client
        .post(format!("{}/inventory/items/{}/adjust", srv.base_url, item_id))
        .json(&json!({ "delta": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Delete.
    let res = client
        .delete(format!("{}/inventory/items/{}", srv.base_url, item_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/inventory/items/{}", srv.base_url, item_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn order_and_delivery_crud() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let item = create_item(&client, &srv.base_url, "Widget", 10, 100).await;
    let item_id = item["id"].as_str().unwrap().to_string();

    let order: serde_json::Value = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "product_id": item_id,
            "qty": 2,
            "customer_id": "cust-1",
            "address": "1 Main St"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order_id = order["id"].as_str().unwrap().to_string();

    // Update the shipping details on the order.
    let res = client
        .put(format!("{}/orders/{}", srv.base_url, order_id))
        .json(&json!({ "address": "2 Side St" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["address"], "2 Side St");
    assert_eq!(updated["qty"], 2);

    // Advance the paired delivery.
    let deliveries: Vec<serde_json::Value> = client
        .get(format!("{}/deliveries", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let delivery_id = deliveries[0]["id"].as_str().unwrap().to_string();

    let res = client
        .put(format!("{}/deliveries/{}", srv.base_url, delivery_id))
        .json(&json!({ "status": "SHIPPED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let shipped: serde_json::Value = res.json().await.unwrap();
    assert_eq!(shipped["status"], "SHIPPED");

    // Delete the order; the delivery record survives independently.
    let res = client
        .delete(format!("{}/orders/{}", srv.base_url, order_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/deliveries/{}", srv.base_url, delivery_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .delete(format!("{}/deliveries/{}", srv.base_url, delivery_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}
