use axum::response::Json as ResponseJson;
use utils::response::ApiResponse;

pub async fn health_check() -> ResponseJson<ApiResponse<String>> {
    ResponseJson(ApiResponse::success("ok".to_string()))
}
