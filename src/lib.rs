pub mod core;
pub mod inference;
pub mod logging;
pub mod pipeline;
pub mod search;
pub mod server;
pub mod state;
