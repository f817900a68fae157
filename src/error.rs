use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt::{self, Debug, Display};

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

pub const CONFIGURATION: i32 = 1;
pub const STORAGE: i32 = 2;
pub const UPSTREAM: i32 = 3;
pub const UNEXPECTED: i32 = 5;
pub const INVALID_INPUT: i32 = 100;
pub const NO_ROUTE: i32 = 101;
pub const EMPTY_CORPUS: i32 = 102;

impl Error {
    pub fn body(&self) -> serde_json::Value {
        json!({
            "code": self.code,
            "error": self.message,
        })
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self.code, UPSTREAM | NO_ROUTE)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        reqwest_error(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        storage_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        storage_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self.code {
            UPSTREAM => StatusCode::BAD_GATEWAY,
            1..=99 => StatusCode::INTERNAL_SERVER_ERROR,
            NO_ROUTE => StatusCode::NOT_FOUND,
            EMPTY_CORPUS => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };

        (status, Json(self.body())).into_response()
    }
}

pub fn invalid_input_error(message: impl Into<String>) -> Error {
    Error {
        code: INVALID_INPUT,
        message: message.into(),
    }
}

pub fn no_route_error() -> Error {
    Error {
        code: NO_ROUTE,
        message: "No route found".into(),
    }
}

pub fn empty_corpus_error() -> Error {
    Error {
        code: EMPTY_CORPUS,
        message: "no places have been indexed for this route".into(),
    }
}

pub fn env_var_error(err: env::VarError) -> Error {
    Error {
        code: CONFIGURATION,
        message: format!("environment variable error: {}", err),
    }
}

pub fn config_error(message: impl Into<String>) -> Error {
    Error {
        code: CONFIGURATION,
        message: message.into(),
    }
}

pub fn storage_error<T: Display>(err: T) -> Error {
    Error {
        code: STORAGE,
        message: format!("storage error: {}", err),
    }
}

pub fn reqwest_error(err: reqwest::Error) -> Error {
    Error {
        code: UPSTREAM,
        message: format!("upstream request failed: {}", err),
    }
}

pub fn upstream_error(message: impl Into<String>) -> Error {
    Error {
        code: UPSTREAM,
        message: message.into(),
    }
}

pub fn unexpected_error<T: Debug>(err: T) -> Error {
    Error {
        code: UNEXPECTED,
        message: format!("unexpected error: {:?}", err),
    }
}

#[test]
fn upstream_kinds() {
    assert!(no_route_error().is_upstream());
    assert!(upstream_error("places provider returned INVALID_REQUEST").is_upstream());
    assert!(!invalid_input_error("bad time").is_upstream());
    assert!(!empty_corpus_error().is_upstream());
}

#[test]
fn response_carries_message() {
    let err = no_route_error();
    let body = err.body();
    assert_eq!(body["error"], "No route found");
    assert_eq!(body["code"], NO_ROUTE);

    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    assert_eq!(
        upstream_error("timeout").into_response().status(),
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(
        invalid_input_error("bad time").into_response().status(),
        StatusCode::BAD_REQUEST
    );
}
