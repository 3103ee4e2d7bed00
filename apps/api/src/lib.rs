pub mod config;
pub mod db;
pub mod errors;
pub mod extract;
pub mod intake;
pub mod matcher;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod uploads;

pub use routes::build_router;
pub use state::AppState;
