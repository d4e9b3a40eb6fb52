pub mod config;
pub mod decode;
pub mod error;
pub mod pipeline;
pub mod preprocess;
pub mod server;
pub mod torch;
