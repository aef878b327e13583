use serde::Serialize;
use serde_json::{json, Value};

pub fn error_json(detail: &str) -> Value {
    json!({
        "status": "error",
        "detail": detail,
    })
}

/// Envelope for successful admin/user responses: `{"success": true, ...body}`.
#[derive(Serialize, Debug)]
pub struct Success<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> Success<T> {
    pub fn new(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}
