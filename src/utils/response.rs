use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SuccessBody<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct FailureBody {
    pub code: u16,
    pub message: String,
}

pub fn success<T: Serialize>(data: T) -> Json<SuccessBody<T>> {
    Json(SuccessBody {
        success: true,
        data,
    })
}
