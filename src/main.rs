mod database;
mod error;
mod handlers;
mod middleware;
mod models;
mod utils;

use axum::{
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use std::env;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use dotenvy::dotenv;

use database::{create_database_pool, Database};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    // Initialize database
    let database_url = env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set");

    let db = create_database_pool(&database_url).await
        .expect("Failed to connect to database");

    sqlx::migrate!()
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    // Build the application router
    let app = create_router(db);

    // Get port from environment or use default
    let port = env::var("PORT").unwrap_or_else(|_| "5000".to_string());
    let addr = format!("0.0.0.0:{}", port);

    println!("🚀 Store service starting on http://{}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn root() -> &'static str {
    "Oracle Language Centre store service is running..."
}

async fn fallback() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "message": "Endpoint not found" })),
    )
}

fn create_router(db: Database) -> Router {
    Router::new()
        .route("/", get(root))

        // Storekeeper routes
        .route("/storekeeper/dashboard", get(handlers::storekeeper::dashboard))
        .route("/storekeeper/items", get(handlers::storekeeper::list_items))
        .route("/storekeeper/suppliers", get(handlers::storekeeper::list_suppliers))
        .route("/storekeeper/categories", get(handlers::storekeeper::list_categories))
        .route("/storekeeper/request-item", post(handlers::storekeeper::request_item))
        .route("/storekeeper/requests", get(handlers::storekeeper::list_requests))
        .route("/storekeeper/requests/approved", get(handlers::storekeeper::list_approved_requests))
        .route("/storekeeper/requests/:id/receive", put(handlers::storekeeper::receive_request))

        // Finance routes (payment screen lives under /storekeeper for
        // compatibility with the mobile client)
        .route("/storekeeper/received", get(handlers::storekeeper::list_received_requests))
        .route("/storekeeper/pay", post(handlers::storekeeper::pay_supplier))

        // Supplier routes
        .route("/supplier/requests", get(handlers::supplier::list_pending_requests))
        .route("/supplier/request/:id", put(handlers::supplier::decide_request))
        .route("/supplier/approved-items", get(handlers::supplier::list_decided_requests))
        .route("/supplier/payments", get(handlers::supplier::list_payments))
        .route("/supplier/payments/confirm/:payment_id", put(handlers::supplier::confirm_payment))

        // Catch-all for unmatched endpoints
        .fallback(fallback)

        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(db)
}
