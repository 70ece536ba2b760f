pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod server;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use actix_web::{web, HttpRequest};
use serde::Deserialize;
use services::StreamController;

#[derive(Debug, Deserialize)]
struct ApiKeyQuery {
    apikey: Option<String>,
}

/// Shared state handed to every HTTP handler
#[derive(Clone)]
pub struct AppState {
    pub controller: StreamController,
    pub identifier: String,
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(controller: StreamController, api_key: Option<String>) -> Self {
        let identifier = controller.publisher().identifier().to_string();
        Self {
            controller,
            identifier,
            api_key,
        }
    }

    /// Caller must present the API key in `X-Api-Key` or the `apikey` query
    /// parameter. With no key configured nobody is authorized.
    pub fn authorize(&self, req: &HttpRequest) -> Result<()> {
        let Some(expected) = self.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return Err(AppError::Forbidden);
        };

        let from_header = req
            .headers()
            .get("x-api-key")
            .and_then(|v| v.to_str().ok());
        let from_query = web::Query::<ApiKeyQuery>::from_query(req.query_string())
            .ok()
            .and_then(|query| query.into_inner().apikey);

        if from_header == Some(expected) || from_query.as_deref() == Some(expected) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn ensure_identifier(&self, identifier: &str) -> Result<()> {
        if identifier == self.identifier {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("unknown plugin '{identifier}'")))
        }
    }
}
