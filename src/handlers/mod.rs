pub mod storekeeper;
pub mod supplier;

use serde::Serialize;

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}
