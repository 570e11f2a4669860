pub mod assemble;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod geocode;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod types;
