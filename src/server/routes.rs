use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, State as AxumState},
    http::{header::SET_COOKIE, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};

use super::{error::AppError, pages, session, state::State};
use crate::storage::{db::MAX_RATING, db::MIN_RATING, Generation, Selections};

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Relative to `static/`
    pub image_path: String,
    /// Absolute URL path the browser can load
    pub image_url: String,
    pub selections: Selections,
    pub prompt: String,
}

impl From<Generation> for GenerateResponse {
    fn from(generation: Generation) -> Self {
        Self {
            image_url: format!("/static/{}", generation.image_path),
            image_path: generation.image_path,
            selections: generation.selections,
            prompt: generation.prompt,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RateForm {
    rating: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AlbumResponse {
    pub images: Vec<String>,
}

/// Parses a form rating, accepting only whole stars in range.
pub fn parse_rating(raw: Option<&str>) -> Option<u8> {
    raw?.trim()
        .parse::<u8>()
        .ok()
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
}

type SetCookie = AppendHeaders<[(HeaderName, HeaderValue); 1]>;

fn session_cookie(state: &State, generation: &Generation) -> Result<SetCookie, AppError> {
    let sealed = state
        .session_key
        .seal(generation)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(AppendHeaders([(SET_COOKIE, session::set_cookie(&sealed))]))
}

pub async fn index_handler() -> Html<String> {
    Html(pages::index_page())
}

pub async fn health_handler() -> &'static str {
    "ok"
}

pub async fn generate_handler(AxumState(state): AxumState<Arc<State>>) -> Response {
    match state.service.generate().await {
        Ok(generation) => match session_cookie(&state, &generation) {
            Ok(cookie) => (cookie, Html(pages::image_page(&generation))).into_response(),
            Err(e) => e.into_response(),
        },
        Err(e) => Html(pages::error_page(&e.to_string())).into_response(),
    }
}

pub async fn generate_async_handler(
    AxumState(state): AxumState<Arc<State>>,
) -> Result<Response, AppError> {
    let generation = state.service.generate().await?;
    let cookie = session_cookie(&state, &generation)?;
    Ok((cookie, Json(GenerateResponse::from(generation))).into_response())
}

pub async fn rate_handler(
    AxumState(state): AxumState<Arc<State>>,
    headers: HeaderMap,
    form: Result<Form<RateForm>, FormRejection>,
) -> Result<Response, AppError> {
    // A missing or malformed body counts as no rating.
    let rating = match &form {
        Ok(Form(form)) => parse_rating(form.rating.as_deref()),
        Err(rejection) => {
            tracing::debug!("Unreadable rating form: {}", rejection);
            None
        }
    };
    let generation = state.session_key.session_from(&headers);

    let (Some(rating), Some(generation)) = (rating, generation) else {
        tracing::debug!("Ignoring rating without a valid value or session");
        return Ok(Redirect::to("/").into_response());
    };

    state.service.rate(rating, &generation)?;

    Ok((
        AppendHeaders([(SET_COOKIE, session::clear_cookie())]),
        Redirect::to("/"),
    )
        .into_response())
}

pub async fn album_handler(
    AxumState(state): AxumState<Arc<State>>,
) -> Result<Json<AlbumResponse>, AppError> {
    let images = state
        .service
        .list_album()?
        .into_iter()
        .map(|p| format!("/static/{p}"))
        .collect();
    Ok(Json(AlbumResponse { images }))
}

/// Saves the session's current picture to the album without rating it.
pub async fn save_to_album_handler(
    AxumState(state): AxumState<Arc<State>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let Some(generation) = state.session_key.session_from(&headers) else {
        return Err(AppError::BadRequest("No picture to save".to_string()));
    };

    let saved = state.service.save_to_album(&generation.image_path)?;
    let status = if saved.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::NOT_FOUND
    };

    Ok((
        status,
        Json(serde_json::json!({ "saved": saved.map(|p| format!("/static/{p}")) })),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating(Some("5")), Some(5));
        assert_eq!(parse_rating(Some(" 1 ")), Some(1));
        assert_eq!(parse_rating(Some("0")), None);
        assert_eq!(parse_rating(Some("6")), None);
        assert_eq!(parse_rating(Some("-3")), None);
        assert_eq!(parse_rating(Some("great")), None);
        assert_eq!(parse_rating(None), None);
    }

    #[test]
    fn test_generate_response_from_generation() {
        let response = GenerateResponse::from(Generation {
            selections: Selections::new(),
            prompt: "p".to_string(),
            image_path: "generated/smile_x.png".to_string(),
        });
        assert_eq!(response.image_url, "/static/generated/smile_x.png");
        assert_eq!(response.image_path, "generated/smile_x.png");
    }
}
