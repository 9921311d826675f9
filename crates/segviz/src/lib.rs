//! segviz: HTTP surface over the segviz composition service.
//!
//! - `POST /get-images` composes the raw, ground-truth, and predicted
//!   views for `{"selected_image": "<id>"}`.
//! - `GET /` and `GET /test-json` return the dataset catalog.

pub mod routes;
pub mod server;

pub use routes::{App, Reply};
pub use server::{Server, ServerError};
