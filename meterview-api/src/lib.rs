// Library entry point for the binary and the integration tests.

pub mod api_docs;
pub mod app;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod settings;
pub mod version;

pub use app::AppState;
pub use error::ApiError;
pub use settings::Settings;
