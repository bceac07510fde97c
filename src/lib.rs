pub mod batch;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod load;
pub mod logging;
pub mod pipeline;
