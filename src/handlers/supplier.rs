use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    database::Database,
    error::ApiError,
    handlers::MessageResponse,
    middleware::require_role,
    models::{DecidedRequestDisplay, PendingRequestDisplay, RequestStatus, SupplierPayment},
    utils::Role,
};

// Pending requests addressed to the logged-in supplier
pub async fn list_pending_requests(
    State(db): State<Database>,
    headers: HeaderMap,
) -> Result<Json<Vec<PendingRequestDisplay>>, ApiError> {
    let supplier = require_role(&headers, Role::Supplier)?;

    let requests = sqlx::query_as::<_, PendingRequestDisplay>(
        r#"
        SELECT
            sr.id, sr.storekeeper_id, sr.item_id, sr.supplier_id, sr.quantity_requested,
            sr.total_cost, sr.status, sr.requested_at,
            si.item_name, si.cost AS cost_per_item
        FROM store_requests sr
        JOIN store_items si ON sr.item_id = si.id
        WHERE sr.supplier_id = $1 AND sr.status = 'pending'
        "#,
    )
    .bind(supplier.id)
    .fetch_all(&db)
    .await?;

    Ok(Json(requests))
}

#[derive(Deserialize)]
pub struct DecisionBody {
    status: Option<String>,
}

fn parse_decision(status: &str) -> Result<RequestStatus, ApiError> {
    match status {
        "approved" => Ok(RequestStatus::Approved),
        "rejected" => Ok(RequestStatus::Rejected),
        _ => Err(ApiError::InvalidInput(
            "Invalid status. Use 'approved' or 'rejected'.".to_string(),
        )),
    }
}

// Supplier approves or rejects a pending request. The UPDATE is scoped to
// the supplier's own rows and guarded on the current status, so a request
// that is missing, foreign, or already decided affects zero rows.
pub async fn decide_request(
    State(db): State<Database>,
    headers: HeaderMap,
    Path(request_id): Path<Uuid>,
    Json(body): Json<DecisionBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    let supplier = require_role(&headers, Role::Supplier)?;

    let decision = parse_decision(body.status.as_deref().unwrap_or_default())?;
    debug_assert!(RequestStatus::Pending.can_transition_to(decision));

    let result = sqlx::query(
        "UPDATE store_requests SET status = $1 WHERE id = $2 AND supplier_id = $3 AND status = 'pending'",
    )
    .bind(decision)
    .bind(request_id)
    .bind(supplier.id)
    .execute(&db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(
            "Request not found or not authorized to update.".to_string(),
        ));
    }

    Ok(Json(MessageResponse {
        message: format!("Request {} successfully.", decision),
    }))
}

// The supplier's decided requests: approved, rejected or received
pub async fn list_decided_requests(
    State(db): State<Database>,
    headers: HeaderMap,
) -> Result<Json<Vec<DecidedRequestDisplay>>, ApiError> {
    let supplier = require_role(&headers, Role::Supplier)?;

    let requests = sqlx::query_as::<_, DecidedRequestDisplay>(
        r#"
        SELECT id, storekeeper_id, item_id, quantity_requested, total_cost, status, requested_at
        FROM store_requests
        WHERE supplier_id = $1 AND status IN ('approved', 'rejected', 'received')
        "#,
    )
    .bind(supplier.id)
    .fetch_all(&db)
    .await?;

    Ok(Json(requests))
}

// Payment records addressed to the logged-in supplier
pub async fn list_payments(
    State(db): State<Database>,
    headers: HeaderMap,
) -> Result<Json<Vec<SupplierPayment>>, ApiError> {
    let supplier = require_role(&headers, Role::Supplier)?;

    let payments = sqlx::query_as::<_, SupplierPayment>(
        "SELECT * FROM supplier_payments WHERE supplier_id = $1 ORDER BY paid_at DESC",
    )
    .bind(supplier.id)
    .fetch_all(&db)
    .await?;

    Ok(Json(payments))
}

// Supplier confirms a payment. Guarding on status = 'paid' makes a repeat
// confirmation a no-op; "not found" and "already confirmed" produce the
// same response.
pub async fn confirm_payment(
    State(db): State<Database>,
    headers: HeaderMap,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let supplier = require_role(&headers, Role::Supplier)?;

    let result = sqlx::query(
        "UPDATE supplier_payments SET status = 'confirmed' WHERE id = $1 AND supplier_id = $2 AND status = 'paid'",
    )
    .bind(payment_id)
    .bind(supplier.id)
    .execute(&db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(
            "Payment not found or already confirmed.".to_string(),
        ));
    }

    Ok(Json(MessageResponse {
        message: "Payment confirmed successfully.".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_parsing_accepts_only_the_two_outcomes() {
        assert_eq!(parse_decision("approved").unwrap(), RequestStatus::Approved);
        assert_eq!(parse_decision("rejected").unwrap(), RequestStatus::Rejected);

        for bad in ["pending", "received", "APPROVED", "", "cancelled"] {
            assert!(matches!(
                parse_decision(bad),
                Err(ApiError::InvalidInput(_))
            ));
        }
    }
}
