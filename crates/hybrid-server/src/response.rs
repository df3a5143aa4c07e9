use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use hybrid_router::RouteError;

// ════════════════════════════════════════════════════════════
// 1. The Unified Application Error
// ════════════════════════════════════════════════════════════

/// Handler error so the dispatch path can use `?` throughout.
#[derive(Debug)]
pub enum AppError {
    /// Routing outcome surfaced to the client
    Route(RouteError),
    /// Anything else (500)
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Route(err) if err.is_not_found() => {
                (StatusCode::NOT_FOUND, err.to_string()).into_response()
            }
            AppError::Route(err) if err.is_expired() => {
                (StatusCode::GONE, err.to_string()).into_response()
            }
            AppError::Route(err @ RouteError::MalformedParameter { .. }) => {
                (StatusCode::BAD_REQUEST, err.to_string()).into_response()
            }
            AppError::Route(err) => {
                tracing::error!("Routing error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
            }
            AppError::Internal(err) => {
                tracing::error!("Internal server error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
            }
        }
    }
}

impl From<RouteError> for AppError {
    fn from(err: RouteError) -> Self {
        AppError::Route(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

// ════════════════════════════════════════════════════════════
// 2. Redirect to a hybrid URL
// ════════════════════════════════════════════════════════════

pub struct RedirectResponse {
    status: StatusCode,
    location: String,
}

impl RedirectResponse {
    /// `302 Found` to `location`
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FOUND,
            location: location.into(),
        }
    }
}

impl IntoResponse for RedirectResponse {
    fn into_response(self) -> Response {
        match HeaderValue::from_str(&self.location) {
            Ok(val) => (self.status, [(header::LOCATION, val)]).into_response(),
            Err(err) => {
                tracing::error!("Invalid redirect location {:?}: {}", self.location, err);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_router::ViewClass;

    #[test]
    fn test_route_error_statuses() {
        let cases = [
            (
                RouteError::RouteNotFound { path: "/x".into() },
                StatusCode::NOT_FOUND,
            ),
            (
                RouteError::InstanceExpired {
                    scope_name: None,
                    view_class: ViewClass::new("counter"),
                },
                StatusCode::GONE,
            ),
            (
                RouteError::MalformedParameter { segment: "%FF".into() },
                StatusCode::BAD_REQUEST,
            ),
            (
                RouteError::EncodingOverflow { segment: "x".into() },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_redirect_response() {
        let response = RedirectResponse::to("/counter.1").into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/counter.1");

        let response = RedirectResponse::to("bad\nlocation").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
