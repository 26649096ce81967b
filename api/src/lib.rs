pub mod error;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;

pub use error::AppError;
pub use routes::router;
pub use state::AppState;
