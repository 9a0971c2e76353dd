//! formrelay HTTP presentation layer
//!
//! Routes website form submissions to the submission service and maps
//! delivery outcomes to JSON responses.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod reporter;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use middleware::{FormPayload, REQUEST_ID_HEADER, RequestIdLayer};
pub use routes::{cors_layer, create_router};
pub use state::AppState;
