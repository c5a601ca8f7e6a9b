// Handler for GET /xtz/delegations

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::cache;
use crate::error::{ApiError, ApiResult};
use crate::handlers::AppState;
use crate::models::DelegationsQuery;

pub const X_PAGE_CURRENT: HeaderName = HeaderName::from_static("x-page-current");
pub const X_PAGE_PER_PAGE: HeaderName = HeaderName::from_static("x-page-per-page");
pub const X_PAGE_PREV: HeaderName = HeaderName::from_static("x-page-prev");
pub const X_PAGE_NEXT: HeaderName = HeaderName::from_static("x-page-next");

/// Returns a page of delegations, newest first, with cache validators
pub async fn get_delegations(
    State(state): State<AppState>,
    Query(query): Query<DelegationsQuery>,
    request_headers: HeaderMap,
) -> ApiResult<Response> {
    let params = query.validate(state.default_limit)?;
    let response = state.delegations.list(params).await?;

    let body = serde_json::to_vec(&response)
        .map_err(|e| ApiError::Internal(format!("failed to encode response: {e}")))?;
    let etag = cache::etag(&body, params.page, params.limit);

    let mut headers = HeaderMap::new();
    headers.insert(header::CACHE_CONTROL, header_value(cache::cache_control(params.year))?);
    headers.insert(header::ETAG, header_value(etag.clone())?);

    let not_modified = request_headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| cache::if_none_match(v, &etag));
    if not_modified {
        return Ok((StatusCode::NOT_MODIFIED, headers).into_response());
    }

    let pagination = &response.pagination;
    headers.insert(X_PAGE_CURRENT, HeaderValue::from(pagination.current_page));
    headers.insert(X_PAGE_PER_PAGE, HeaderValue::from(pagination.per_page));
    if let Some(prev) = pagination.prev_page {
        headers.insert(X_PAGE_PREV, HeaderValue::from(prev));
    }
    if let Some(next) = pagination.next_page {
        headers.insert(X_PAGE_NEXT, HeaderValue::from(next));
    }
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    Ok((StatusCode::OK, headers, body).into_response())
}

fn header_value(value: String) -> ApiResult<HeaderValue> {
    HeaderValue::try_from(value).map_err(|e| ApiError::Internal(format!("invalid header: {e}")))
}
