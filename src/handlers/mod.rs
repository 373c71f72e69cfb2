pub mod ask;
pub mod health;
pub mod index;
pub mod metrics_handler;

pub use ask::AppState;
