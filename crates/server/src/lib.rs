pub mod app;
pub mod error;
pub mod jobs;
pub mod routes;
pub mod state;
pub mod ws;

pub use app::create_app;
pub use state::{AppState, StartupConfig};
