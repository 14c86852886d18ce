pub mod api;
pub mod backend;
pub mod config;
pub mod history;
pub mod http_client;
pub mod logging;
pub mod photos;
pub mod prediction;
pub mod session;
pub mod state;
pub mod transform;
pub mod worker;
