pub mod payment;
pub mod store;

// Re-export only the types we actually use
pub use payment::{
    PaymentMethod, PaymentStatus, ReceivedRequestDisplay, SupplierPayment,
};
pub use store::{
    ApprovedRequestDisplay, DecidedRequestDisplay, ItemSummary, PendingRequestDisplay,
    RequestDisplay, RequestStatus, StoreItem, StoreRequest, SupplierSummary,
    LOW_STOCK_THRESHOLD,
};
