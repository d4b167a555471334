use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chara_core::CharaError;

#[derive(Debug)]
pub struct CharaAxumError(pub anyhow::Error);

impl From<anyhow::Error> for CharaAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<CharaError> for CharaAxumError {
    fn from(e: CharaError) -> Self {
        Self(anyhow::Error::new(e))
    }
}

impl IntoResponse for CharaAxumError {
    fn into_response(self) -> Response {
        // A CharaError anywhere in the chain keeps its kind and fields
        if let Some(chara) = self.0.chain().find_map(|e| e.downcast_ref::<CharaError>()) {
            return respond(chara);
        }

        respond(&CharaError::internal(self.0.to_string()))
    }
}

fn respond(error: &CharaError) -> Response {
    let safe = error.sanitize_for_client();
    let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(safe.to_json())).into_response()
}
