pub mod app;
pub mod balance;
pub mod errors;
pub mod grid;
pub mod handlers;
pub mod models;
pub mod stats;
pub mod storage;
pub mod sync;
pub mod ui;
pub mod state;

pub use app::router;
pub use state::AppState;
pub use storage::{load_book, resolve_data_path};
