use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Items at or below this on-hand quantity raise the dashboard alert.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

/// Lifecycle of a store request. The only legal moves are
/// pending -> approved, pending -> rejected and approved -> received;
/// every UPDATE that transitions a request also guards on the expected
/// current status so a stale write affects zero rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Received,
}

impl RequestStatus {
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Approved)
                | (RequestStatus::Pending, RequestStatus::Rejected)
                | (RequestStatus::Approved, RequestStatus::Received)
        )
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Received => "received",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct StoreItem {
    pub id: Uuid,
    pub item_name: String,
    pub category: String,
    pub cost: Decimal,
    pub quantity: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct StoreRequest {
    pub id: Uuid,
    pub storekeeper_id: Uuid,
    pub item_id: Uuid,
    pub supplier_id: Uuid,
    pub quantity_requested: i32,
    pub total_cost: Decimal,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ItemSummary {
    pub id: Uuid,
    pub item_name: String,
    pub cost: Decimal,
}

#[derive(Debug, Serialize, FromRow)]
pub struct SupplierSummary {
    pub id: Uuid,
    pub name: String,
}

/// Storekeeper's request history, joined with item and supplier names.
#[derive(Debug, Serialize, FromRow)]
pub struct RequestDisplay {
    pub id: Uuid,
    pub item_name: String,
    pub quantity_requested: i32,
    pub total_cost: Decimal,
    pub supplier_name: String,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
}

/// Approved requests awaiting receipt, as shown on the receive-stock screen.
#[derive(Debug, Serialize, FromRow)]
pub struct ApprovedRequestDisplay {
    pub id: Uuid,
    pub storekeeper_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub quantity_requested: i32,
    pub supplier_id: Uuid,
    pub total_cost: Decimal,
    pub status: RequestStatus,
}

/// A pending request from the supplier's point of view.
#[derive(Debug, Serialize, FromRow)]
pub struct PendingRequestDisplay {
    pub id: Uuid,
    pub storekeeper_id: Uuid,
    pub item_id: Uuid,
    pub supplier_id: Uuid,
    pub quantity_requested: i32,
    pub total_cost: Decimal,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub item_name: String,
    pub cost_per_item: Decimal,
}

/// A decided request (approved, rejected or received) for the supplier.
#[derive(Debug, Serialize, FromRow)]
pub struct DecidedRequestDisplay {
    pub id: Uuid,
    pub storekeeper_id: Uuid,
    pub item_id: Uuid,
    pub quantity_requested: i32,
    pub total_cost: Decimal,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [RequestStatus; 4] = [
        RequestStatus::Pending,
        RequestStatus::Approved,
        RequestStatus::Rejected,
        RequestStatus::Received,
    ];

    #[test]
    fn only_three_transitions_are_legal() {
        let mut legal = Vec::new();
        for from in ALL {
            for to in ALL {
                if from.can_transition_to(to) {
                    legal.push((from, to));
                }
            }
        }
        assert_eq!(
            legal,
            vec![
                (RequestStatus::Pending, RequestStatus::Approved),
                (RequestStatus::Pending, RequestStatus::Rejected),
                (RequestStatus::Approved, RequestStatus::Received),
            ]
        );
    }

    #[test]
    fn nothing_returns_to_pending() {
        for from in ALL {
            assert!(!from.can_transition_to(RequestStatus::Pending));
        }
    }

    #[test]
    fn rejected_and_received_are_terminal() {
        for to in ALL {
            assert!(!RequestStatus::Rejected.can_transition_to(to));
            assert!(!RequestStatus::Received.can_transition_to(to));
        }
    }

    fn rank(status: RequestStatus) -> u8 {
        match status {
            RequestStatus::Pending => 0,
            RequestStatus::Approved | RequestStatus::Rejected => 1,
            RequestStatus::Received => 2,
        }
    }

    proptest! {
        // Whatever sequence of transition attempts arrives, a request's
        // status only ever moves forward through the lifecycle.
        #[test]
        fn status_never_moves_backwards(attempts in proptest::collection::vec(0usize..4, 0..32)) {
            let mut status = RequestStatus::Pending;
            for idx in attempts {
                let target = ALL[idx];
                let before = status;
                if status.can_transition_to(target) {
                    status = target;
                }
                prop_assert!(rank(status) >= rank(before));
            }
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RequestStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(RequestStatus::Received.to_string(), "received");
    }
}
