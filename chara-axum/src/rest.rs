use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    routing, Json, Router,
};
use chara_core::{requests::parse_id, Character};
use serde::Serialize;

use crate::{
    middlewares::{multipart::multipart_rejection, CharacterForm},
    CharaAxumError, CharaAxumState,
};

type Reply<T> = Result<Json<T>, CharaAxumError>;

#[derive(Serialize)]
struct Deleted {
    success: bool,
}

/// Routes for the character collection, relative to its mount point.
pub fn characters_router(state: CharaAxumState) -> Router<()> {
    Router::new()
        .route("/", routing::get(list).post(create).put(update_from_form))
        .route(
            "/{id}",
            routing::get(get_one).put(update_by_path).delete(remove),
        )
        .with_state(state)
}

async fn read_form(
    state: &CharaAxumState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<CharacterForm, CharaAxumError> {
    let multipart = multipart.map_err(multipart_rejection)?;
    Ok(CharacterForm::read(multipart, &state.form).await?)
}

async fn list(State(state): State<CharaAxumState>) -> Reply<Vec<Character>> {
    Ok(Json(state.lifecycle.list_characters().await?))
}

async fn get_one(State(state): State<CharaAxumState>, Path(id): Path<String>) -> Reply<Character> {
    let id = parse_id(&id)?;
    Ok(Json(state.lifecycle.get_character(id).await?))
}

async fn create(
    State(state): State<CharaAxumState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Reply<Character> {
    let req = read_form(&state, multipart).await?.into_create_request()?;
    Ok(Json(state.lifecycle.create_character(req).await?))
}

async fn update_from_form(
    State(state): State<CharaAxumState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Reply<Character> {
    let req = read_form(&state, multipart)
        .await?
        .into_update_request(None)?;
    Ok(Json(state.lifecycle.update_character(req).await?))
}

async fn update_by_path(
    State(state): State<CharaAxumState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Reply<Character> {
    let req = read_form(&state, multipart)
        .await?
        .into_update_request(Some(&id))?;
    Ok(Json(state.lifecycle.update_character(req).await?))
}

async fn remove(State(state): State<CharaAxumState>, Path(id): Path<String>) -> Reply<Deleted> {
    let id = parse_id(&id)?;
    state.lifecycle.delete_character(id).await?;
    Ok(Json(Deleted { success: true }))
}
