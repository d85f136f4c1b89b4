mod app;
mod state;
mod tls;

pub use app::create_app;
pub use state::AppState;
pub use tls::{load_rustls_config, tls_files};
