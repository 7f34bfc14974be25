use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::{
    database::Database,
    error::ApiError,
    handlers::MessageResponse,
    middleware::require_role,
    models::{
        ApprovedRequestDisplay, ItemSummary, PaymentMethod, ReceivedRequestDisplay,
        RequestDisplay, RequestStatus, StoreItem, StoreRequest, SupplierSummary,
        LOW_STOCK_THRESHOLD,
    },
    utils::Role,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    total_categories: i64,
    total_items: i64,
    low_stock_alerts: i64,
    pending_requests: i64,
}

// Storekeeper dashboard overview
pub async fn dashboard(
    State(db): State<Database>,
    headers: HeaderMap,
) -> Result<Json<DashboardResponse>, ApiError> {
    require_role(&headers, Role::Storekeeper)?;

    let total_categories =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT category) FROM store_items")
            .fetch_one(&db)
            .await?;

    let total_items = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM store_items")
        .fetch_one(&db)
        .await?;

    let low_stock_alerts =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM store_items WHERE quantity <= $1")
            .bind(LOW_STOCK_THRESHOLD)
            .fetch_one(&db)
            .await?;

    let pending_requests =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM store_requests WHERE status = 'pending'")
            .fetch_one(&db)
            .await?;

    Ok(Json(DashboardResponse {
        total_categories,
        total_items,
        low_stock_alerts,
        pending_requests,
    }))
}

#[derive(Deserialize)]
pub struct RequestItemBody {
    storekeeper_id: Option<Uuid>,
    item_id: Option<Uuid>,
    quantity_requested: Option<i32>,
    supplier_id: Option<Uuid>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestItemResponse {
    message: String,
    total_cost: Decimal,
}

// Storekeeper requests an item from a supplier. The total cost is frozen
// at request time; later changes to the item's cost do not touch it.
pub async fn request_item(
    State(db): State<Database>,
    headers: HeaderMap,
    Json(body): Json<RequestItemBody>,
) -> Result<(StatusCode, Json<RequestItemResponse>), ApiError> {
    require_role(&headers, Role::Storekeeper)?;

    let (storekeeper_id, item_id, quantity_requested, supplier_id) = match (
        body.storekeeper_id,
        body.item_id,
        body.quantity_requested,
        body.supplier_id,
    ) {
        (Some(sk), Some(item), Some(qty), Some(sup)) => (sk, item, qty, sup),
        _ => {
            return Err(ApiError::InvalidInput(
                "All fields are required".to_string(),
            ))
        }
    };

    if quantity_requested < 1 {
        return Err(ApiError::InvalidInput(
            "quantity_requested must be at least 1".to_string(),
        ));
    }

    let cost = sqlx::query_scalar::<_, Decimal>("SELECT cost FROM store_items WHERE id = $1")
        .bind(item_id)
        .fetch_optional(&db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?;

    let total_cost = cost * Decimal::from(quantity_requested);

    sqlx::query(
        "INSERT INTO store_requests (storekeeper_id, item_id, quantity_requested, total_cost, supplier_id) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(storekeeper_id)
    .bind(item_id)
    .bind(quantity_requested)
    .bind(total_cost)
    .bind(supplier_id)
    .execute(&db)
    .await
    .map_err(|err| {
        if err
            .as_database_error()
            .is_some_and(|e| e.is_foreign_key_violation())
        {
            ApiError::InvalidInput("Unknown storekeeper or supplier".to_string())
        } else {
            ApiError::Database(err)
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(RequestItemResponse {
            message: "Request submitted successfully".to_string(),
            total_cost,
        }),
    ))
}

// Fetch all suppliers (id & name)
pub async fn list_suppliers(
    State(db): State<Database>,
    headers: HeaderMap,
) -> Result<Json<Vec<SupplierSummary>>, ApiError> {
    require_role(&headers, Role::Storekeeper)?;

    let suppliers = sqlx::query_as::<_, SupplierSummary>(
        "SELECT id, CONCAT(first_name, ' ', last_name) AS name FROM suppliers ORDER BY first_name, last_name",
    )
    .fetch_all(&db)
    .await?;

    Ok(Json(suppliers))
}

// Fetch all items (id, name & unit cost)
pub async fn list_items(
    State(db): State<Database>,
    headers: HeaderMap,
) -> Result<Json<Vec<ItemSummary>>, ApiError> {
    require_role(&headers, Role::Storekeeper)?;

    let items =
        sqlx::query_as::<_, ItemSummary>("SELECT id, item_name, cost FROM store_items ORDER BY item_name")
            .fetch_all(&db)
            .await?;

    Ok(Json(items))
}

// Fetch the storekeeper's request history, newest first
pub async fn list_requests(
    State(db): State<Database>,
    headers: HeaderMap,
) -> Result<Json<Vec<RequestDisplay>>, ApiError> {
    require_role(&headers, Role::Storekeeper)?;

    let requests = sqlx::query_as::<_, RequestDisplay>(
        r#"
        SELECT
            sr.id,
            si.item_name,
            sr.quantity_requested,
            sr.total_cost,
            CONCAT(s.first_name, ' ', s.last_name) AS supplier_name,
            sr.status,
            sr.requested_at
        FROM store_requests sr
        JOIN store_items si ON sr.item_id = si.id
        JOIN suppliers s ON sr.supplier_id = s.id
        ORDER BY sr.requested_at DESC
        "#,
    )
    .fetch_all(&db)
    .await?;

    Ok(Json(requests))
}

#[derive(Serialize)]
pub struct CategoryEntry {
    item_name: String,
    quantity: i32,
    description: Option<String>,
}

#[derive(Serialize)]
pub struct CategoriesResponse {
    categories: BTreeMap<String, Vec<CategoryEntry>>,
}

// Store items grouped by category
pub async fn list_categories(
    State(db): State<Database>,
    headers: HeaderMap,
) -> Result<Json<CategoriesResponse>, ApiError> {
    require_role(&headers, Role::Storekeeper)?;

    let items = sqlx::query_as::<_, StoreItem>(
        "SELECT * FROM store_items ORDER BY category, item_name",
    )
    .fetch_all(&db)
    .await?;

    let mut categories: BTreeMap<String, Vec<CategoryEntry>> = BTreeMap::new();
    for item in items {
        categories.entry(item.category).or_default().push(CategoryEntry {
            item_name: item.item_name,
            quantity: item.quantity,
            description: item.description,
        });
    }

    Ok(Json(CategoriesResponse { categories }))
}

// Approved requests awaiting receipt
pub async fn list_approved_requests(
    State(db): State<Database>,
    headers: HeaderMap,
) -> Result<Json<Vec<ApprovedRequestDisplay>>, ApiError> {
    require_role(&headers, Role::Storekeeper)?;

    let requests = sqlx::query_as::<_, ApprovedRequestDisplay>(
        r#"
        SELECT sr.id, sr.storekeeper_id, sr.item_id, si.item_name,
               sr.quantity_requested, sr.supplier_id, sr.total_cost, sr.status
        FROM store_requests sr
        JOIN store_items si ON sr.item_id = si.id
        WHERE sr.status = 'approved'
        "#,
    )
    .fetch_all(&db)
    .await?;

    if requests.is_empty() {
        return Err(ApiError::NotFound("No approved requests found".to_string()));
    }

    Ok(Json(requests))
}

// Storekeeper receives approved stock. The status flip and the inventory
// increment commit together or not at all; the row is locked so a
// concurrent receive of the same request sees the already-updated status.
pub async fn receive_request(
    State(db): State<Database>,
    headers: HeaderMap,
    Path(request_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_role(&headers, Role::Storekeeper)?;

    let mut tx = db.begin().await?;

    let request = sqlx::query_as::<_, StoreRequest>(
        "SELECT * FROM store_requests WHERE id = $1 FOR UPDATE",
    )
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;

    if !request.status.can_transition_to(RequestStatus::Received) {
        return Err(ApiError::InvalidInput(
            "Only approved requests can be received.".to_string(),
        ));
    }

    sqlx::query("UPDATE store_requests SET status = 'received' WHERE id = $1")
        .bind(request_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE store_items SET quantity = quantity + $1 WHERE id = $2")
        .bind(request.quantity_requested)
        .bind(request.item_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Json(MessageResponse {
        message: "Stock received successfully and inventory updated.".to_string(),
    }))
}

// Received requests with their payment record, if any
pub async fn list_received_requests(
    State(db): State<Database>,
    headers: HeaderMap,
) -> Result<Json<Vec<ReceivedRequestDisplay>>, ApiError> {
    require_role(&headers, Role::Finance)?;

    let rows = sqlx::query_as::<_, ReceivedRequestDisplay>(
        r#"
        SELECT sr.id AS request_id, sr.item_id, sr.quantity_requested, sr.total_cost,
               sr.requested_at, s.first_name, s.last_name, sr.supplier_id,
               sp.status AS payment_status, sp.payment_method, sp.payment_reference
        FROM store_requests sr
        JOIN suppliers s ON sr.supplier_id = s.id
        LEFT JOIN supplier_payments sp ON sr.id = sp.request_id
        WHERE sr.status = 'received'
        "#,
    )
    .fetch_all(&db)
    .await?;

    if rows.is_empty() {
        return Err(ApiError::NotFound("No received requests found.".to_string()));
    }

    Ok(Json(rows))
}

#[derive(Deserialize)]
pub struct PayBody {
    request_id: Option<Uuid>,
    supplier_id: Option<Uuid>,
    total_cost: Option<Decimal>,
    payment_method: Option<String>,
    payment_reference: Option<String>,
}

// Finance records a payment against a received request. "At most one
// payment per request" is the UNIQUE constraint on request_id; a second
// submission loses the insert race and maps to DuplicatePayment.
pub async fn pay_supplier(
    State(db): State<Database>,
    headers: HeaderMap,
    Json(body): Json<PayBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_role(&headers, Role::Finance)?;

    let request_id = body
        .request_id
        .ok_or_else(|| ApiError::InvalidInput("Request ID is required".to_string()))?;
    let supplier_id = body
        .supplier_id
        .ok_or_else(|| ApiError::InvalidInput("Supplier ID is required".to_string()))?;
    let total_cost = body
        .total_cost
        .ok_or_else(|| ApiError::InvalidInput("Total cost is required".to_string()))?;

    let method = body
        .payment_method
        .as_deref()
        .and_then(PaymentMethod::parse)
        .ok_or_else(|| {
            ApiError::InvalidInput("Payment method must be 'mpesa' or 'bank'.".to_string())
        })?;

    let reference = body.payment_reference.unwrap_or_default();
    if !method.is_valid_reference(&reference) {
        return Err(ApiError::InvalidInput(format!(
            "{} reference must be {} characters long (letters and numbers).",
            method.label(),
            method.reference_length()
        )));
    }
    let reference = reference.to_uppercase();

    let status =
        sqlx::query_scalar::<_, RequestStatus>("SELECT status FROM store_requests WHERE id = $1")
            .bind(request_id)
            .fetch_optional(&db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;

    if status != RequestStatus::Received {
        return Err(ApiError::InvalidInput(
            "Only received requests can be paid.".to_string(),
        ));
    }

    sqlx::query(
        "INSERT INTO supplier_payments (request_id, supplier_id, total_cost, payment_method, payment_reference) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(request_id)
    .bind(supplier_id)
    .bind(total_cost)
    .bind(method)
    .bind(&reference)
    .execute(&db)
    .await
    .map_err(|err| match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => ApiError::DuplicatePayment,
        Some(db_err) if db_err.is_foreign_key_violation() => {
            ApiError::NotFound("Supplier not found".to_string())
        }
        _ => ApiError::Database(err),
    })?;

    Ok(Json(MessageResponse {
        message: "Payment recorded successfully.".to_string(),
    }))
}
