//! Client for the external segmentation predictor.
//!
//! The predictor is a black-box HTTP service:
//!
//! ```text
//! POST {endpoint}   {"image": "<base64 raw frame>"}
//! 200 OK            {"predicted_image": "<base64 categorical image>"}
//! ```
//!
//! Every call is a single blocking attempt bounded by a timeout. Any
//! outcome other than a success status with a non-empty image is
//! reported as [`PredictionUnavailable`]; callers decide whether that
//! is fatal.
//!
//! The [`Predictor`] trait is the seam where a retrying or
//! circuit-breaking client could be substituted.

use std::time::Duration;

use segviz_render::EncodedImage;
use serde::{Deserialize, Serialize};

/// Why the predictor produced no usable image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictionUnavailable {
    /// No predictor endpoint is configured.
    #[error("no predictor endpoint configured")]
    Disabled,

    /// Connection failure, timeout, or other transport-level error.
    #[error("predictor request failed: {0}")]
    Transport(String),

    /// The predictor answered with a non-success HTTP status.
    #[error("predictor returned HTTP status {0}")]
    Status(u16),

    /// The response body was not the expected JSON shape.
    #[error("malformed predictor response: {0}")]
    MalformedResponse(String),

    /// The response carried no (or an empty) `predicted_image` field.
    #[error("predictor response contained no predicted image")]
    EmptyImage,
}

/// A source of predicted categorical images.
pub trait Predictor: Send + Sync {
    /// Predict a categorical image for the base64-encoded raw frame.
    ///
    /// Returns the predictor's base64-encoded categorical image.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionUnavailable`] when no usable prediction was
    /// obtained.
    fn predict(&self, image: &EncodedImage) -> Result<EncodedImage, PredictionUnavailable>;
}

impl<P: Predictor + ?Sized> Predictor for std::sync::Arc<P> {
    fn predict(&self, image: &EncodedImage) -> Result<EncodedImage, PredictionUnavailable> {
        (**self).predict(image)
    }
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn predict(&self, image: &EncodedImage) -> Result<EncodedImage, PredictionUnavailable> {
        (**self).predict(image)
    }
}

/// Request body sent to the predictor.
#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    image: &'a str,
}

/// Response body expected from the predictor.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predicted_image: Option<String>,
}

/// Predictor reached over HTTP with a blocking `ureq` agent.
#[derive(Debug, Clone)]
pub struct HttpPredictor {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpPredictor {
    /// Endpoint used when none is configured explicitly.
    pub const DEFAULT_ENDPOINT: &str = "http://localhost:5001/predict";

    /// Upper bound on one predictor round-trip.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a client for `endpoint` whose requests give up after
    /// `timeout` (connect, send, and receive combined).
    #[must_use]
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            endpoint: endpoint.into(),
            agent,
        }
    }

    /// The configured endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Predictor for HttpPredictor {
    fn predict(&self, image: &EncodedImage) -> Result<EncodedImage, PredictionUnavailable> {
        let request = PredictRequest {
            image: image.as_str(),
        };

        let response = match self.agent.post(&self.endpoint).send_json(&request) {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => return Err(PredictionUnavailable::Status(code)),
            Err(err) => return Err(PredictionUnavailable::Transport(err.to_string())),
        };

        // ureq only errors on 4xx/5xx; anything else outside 2xx is
        // still not a success.
        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(PredictionUnavailable::Status(status));
        }

        let body: PredictResponse = response
            .into_json()
            .map_err(|err| PredictionUnavailable::MalformedResponse(err.to_string()))?;

        match body.predicted_image {
            Some(text) if !text.is_empty() => Ok(EncodedImage::new(text)),
            _ => Err(PredictionUnavailable::EmptyImage),
        }
    }
}

/// Predictor used when no endpoint is configured: never predicts.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflinePredictor;

impl Predictor for OfflinePredictor {
    fn predict(&self, _image: &EncodedImage) -> Result<EncodedImage, PredictionUnavailable> {
        Err(PredictionUnavailable::Disabled)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Read as _;
    use std::thread::JoinHandle;

    use super::*;

    /// Serve exactly one request on an ephemeral port, answering with
    /// `status` and `body`. The join handle yields the request body.
    fn one_shot_server(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let handle = std::thread::spawn(move || {
            let mut request = server.recv().unwrap();
            let mut received = String::new();
            request.as_reader().read_to_string(&mut received).unwrap();
            let response = tiny_http::Response::from_string(body).with_status_code(status);
            request.respond(response).unwrap();
            received
        });
        (format!("http://127.0.0.1:{port}/predict"), handle)
    }

    fn client(url: &str) -> HttpPredictor {
        HttpPredictor::new(url, Duration::from_secs(5))
    }

    #[test]
    fn success_returns_predicted_image() {
        let (url, handle) = one_shot_server(200, r#"{"predicted_image": "AAAA"}"#);
        let result = client(&url).predict(&EncodedImage::new("cmF3".to_string()));
        assert_eq!(result.unwrap().as_str(), "AAAA");

        let sent: serde_json::Value = serde_json::from_str(&handle.join().unwrap()).unwrap();
        assert_eq!(sent, serde_json::json!({"image": "cmF3"}));
    }

    #[test]
    fn error_status_is_unavailable() {
        let (url, handle) = one_shot_server(500, "boom");
        let result = client(&url).predict(&EncodedImage::new("cmF3".to_string()));
        assert_eq!(result, Err(PredictionUnavailable::Status(500)));
        handle.join().unwrap();
    }

    #[test]
    fn empty_field_is_unavailable() {
        let (url, handle) = one_shot_server(200, r#"{"predicted_image": ""}"#);
        let result = client(&url).predict(&EncodedImage::new("cmF3".to_string()));
        assert_eq!(result, Err(PredictionUnavailable::EmptyImage));
        handle.join().unwrap();
    }

    #[test]
    fn missing_field_is_unavailable() {
        let (url, handle) = one_shot_server(200, r#"{"something_else": 1}"#);
        let result = client(&url).predict(&EncodedImage::new("cmF3".to_string()));
        assert_eq!(result, Err(PredictionUnavailable::EmptyImage));
        handle.join().unwrap();
    }

    #[test]
    fn non_json_body_is_malformed() {
        let (url, handle) = one_shot_server(200, "<html>oops</html>");
        let result = client(&url).predict(&EncodedImage::new("cmF3".to_string()));
        assert!(matches!(
            result,
            Err(PredictionUnavailable::MalformedResponse(_))
        ));
        handle.join().unwrap();
    }

    #[test]
    fn unreachable_endpoint_is_transport_error() {
        // Bind and immediately drop a server to get a port nobody listens on.
        let port = {
            let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
            server.server_addr().to_ip().unwrap().port()
        };
        let result = client(&format!("http://127.0.0.1:{port}/predict"))
            .predict(&EncodedImage::new("cmF3".to_string()));
        assert!(matches!(result, Err(PredictionUnavailable::Transport(_))));
    }

    #[test]
    fn offline_predictor_is_disabled() {
        let result = OfflinePredictor.predict(&EncodedImage::empty());
        assert_eq!(result, Err(PredictionUnavailable::Disabled));
    }
}
