//! Request routing: method + path + body in, status + JSON body out.
//!
//! Kept free of socket handling so every route can be exercised
//! without a listening server.

use std::path::PathBuf;

use log::{error, warn};
use segviz_io::{ComposeError, Composer, ConfigError, ServiceConfig};
use serde::{Deserialize, Serialize};
use tiny_http::Method;

/// A JSON response ready to be written to the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// HTTP status code.
    pub status: u16,
    /// Serialized JSON body.
    pub body: String,
}

impl Reply {
    /// Serialize `value` as the body of a response with `status`.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status, body },
            Err(err) => {
                error!("failed to serialize response body: {err}");
                Self::error(500, "Internal server error")
            }
        }
    }

    /// An `{"error": message}` response.
    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message }).to_string(),
        }
    }
}

/// Body of `POST /get-images`.
#[derive(Debug, Deserialize)]
struct GetImagesRequest {
    #[serde(default)]
    selected_image: Option<String>,
}

/// The HTTP application: composition plus catalog listing.
#[derive(Debug)]
pub struct App {
    composer: Composer,
    catalog_path: PathBuf,
}

impl App {
    /// Create an app serving `composer` and the catalog at `catalog_path`.
    pub fn new(composer: Composer, catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            composer,
            catalog_path: catalog_path.into(),
        }
    }

    /// Build the app from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            Composer::from_config(config)?,
            config.catalog_path.clone(),
        ))
    }

    /// Route one request.
    ///
    /// `url` may carry a query string; it is ignored.
    pub fn handle(&self, method: &Method, url: &str, body: &[u8]) -> Reply {
        let path = url.split('?').next().unwrap_or(url);

        match (method, path) {
            (Method::Post, "/get-images") => self.get_images(body),
            (Method::Get, "/" | "/test-json") => self.catalog(),
            (_, "/get-images" | "/" | "/test-json") => Reply::error(405, "Method not allowed"),
            _ => {
                warn!("404 path: {path}");
                Reply::error(404, "Not found")
            }
        }
    }

    fn get_images(&self, body: &[u8]) -> Reply {
        let request: GetImagesRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(err) => {
                warn!("rejecting /get-images body: {err}");
                return Reply::error(400, "Invalid request body");
            }
        };
        let identifier = request.selected_image.unwrap_or_default();

        match self.composer.compose(&identifier) {
            Ok(result) => Reply::json(200, &result),
            Err(err) => compose_failure(&identifier, &err),
        }
    }

    fn catalog(&self) -> Reply {
        match segviz_io::load_catalog(&self.catalog_path) {
            Ok(catalog) => Reply::json(200, &catalog),
            Err(err) => {
                error!("{err}");
                Reply::error(500, "Failed to load JSON file")
            }
        }
    }
}

/// Map a composition failure to a status and a non-leaking message.
/// The full error chain only goes to the log.
fn compose_failure(identifier: &str, err: &ComposeError) -> Reply {
    if err.is_client_error() {
        warn!("bad /get-images request: {err}");
        Reply::error(400, err.public_message())
    } else {
        error!("failed to compose {identifier:?}: {err}");
        Reply::error(500, err.public_message())
    }
}
