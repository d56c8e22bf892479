use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};

use crate::{errors::AppError, AppState};

pub async fn require_bearer_token(
    State(state): State<AppState>,
    auth_header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Ok(TypedHeader(auth)) = auth_header else {
        return Err(AppError::unauthorized(
            "missing_token",
            "missing or malformed authorization header",
        ));
    };

    if auth.token() != state.auth_key.as_ref() {
        return Err(AppError::unauthorized(
            "invalid_token",
            "invalid bearer token",
        ));
    }

    Ok(next.run(request).await)
}
