pub mod error;
pub mod handlers;
pub mod server;

pub use server::{AppState, build_router, start};
