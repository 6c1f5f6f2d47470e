use crate::error::Result;
use crate::model::{UrlListResponse, UrlRequest};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use stubby_core::{ShortCode, ShortenedUrl};

pub async fn create_url_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UrlRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShortenedUrl>)> {
    let Json(request) = payload?;
    let record = state.shortener().create_short_url(&request.url).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_urls_handler(State(state): State<AppState>) -> Result<Json<UrlListResponse>> {
    let urls = state.shortener().list_urls().await?;
    let count = state.shortener().count_urls().await?;
    Ok(Json(UrlListResponse { count, urls }))
}

pub async fn resolve_url_handler(
    Path(shortcode): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ShortenedUrl>> {
    let code = ShortCode::new(shortcode)?;
    let record = state.shortener().resolve_shortcode(&code).await?;
    Ok(Json(record))
}

pub async fn replace_url_handler(
    Path(shortcode): Path<String>,
    State(state): State<AppState>,
    payload: std::result::Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<ShortenedUrl>> {
    let code = ShortCode::new(shortcode)?;
    let Json(request) = payload?;
    let record = state.shortener().replace_url(&code, &request.url).await?;
    Ok(Json(record))
}

pub async fn delete_url_handler(
    Path(shortcode): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    let code = ShortCode::new(shortcode)?;
    state.shortener().delete_shortcode(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn stats_handler(
    Path(shortcode): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ShortenedUrl>> {
    let code = ShortCode::new(shortcode)?;
    let record = state.shortener().get_stats(&code).await?;
    Ok(Json(record))
}
