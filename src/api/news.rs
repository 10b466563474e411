use super::{deleted, found, not_found, AppState, IdParam, IdPath, JsonBody};
use crate::error::ApiError;
use crate::store::news::{News, NewsInput};
use crate::validation::require_text;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::Value;
use tracing::info;

fn validate_news(input: &NewsInput) -> Result<(), ApiError> {
    require_text("titulo", &input.titulo, 150)?;
    require_text("subtitulo", &input.subtitulo, 300)?;
    require_text("conteudo", &input.conteudo, 20_000)?;
    require_text("autor", &input.autor, 100)
}

/// GET /api/noticias
pub async fn list_news(State(state): State<AppState>) -> Result<Json<Vec<News>>, ApiError> {
    Ok(Json(state.db.list_news()?))
}

/// GET /api/noticias/:id
pub async fn get_news(
    State(state): State<AppState>,
    WithRejection(Path(IdPath { id }), _): IdParam,
) -> Result<Json<News>, ApiError> {
    found(state.db.get_news(id)?, "News", id)
}

/// POST /api/noticias (Employee)
pub async fn create_news(
    State(state): State<AppState>,
    WithRejection(Json(input), _): JsonBody<NewsInput>,
) -> Result<(StatusCode, Json<News>), ApiError> {
    validate_news(&input)?;
    let news = state.db.create_news(&input)?;
    info!("📰 News {} published: {}", news.id, news.titulo);
    Ok((StatusCode::CREATED, Json(news)))
}

/// PUT /api/noticias/:id (Employee)
pub async fn update_news(
    State(state): State<AppState>,
    WithRejection(Path(IdPath { id }), _): IdParam,
    WithRejection(Json(input), _): JsonBody<NewsInput>,
) -> Result<Json<News>, ApiError> {
    validate_news(&input)?;
    if !state.db.update_news(id, &input)? {
        return Err(not_found("News", id));
    }
    found(state.db.get_news(id)?, "News", id)
}

/// DELETE /api/noticias/:id (Employee)
pub async fn delete_news(
    State(state): State<AppState>,
    WithRejection(Path(IdPath { id }), _): IdParam,
) -> Result<Json<Value>, ApiError> {
    if !state.db.delete_news(id)? {
        return Err(not_found("News", id));
    }
    Ok(deleted("News", id))
}
