pub mod api;
pub mod config;
pub mod error;
pub mod state;
pub mod upstream;

pub use config::Config;
pub use error::ApiError;
pub use state::AppState;
