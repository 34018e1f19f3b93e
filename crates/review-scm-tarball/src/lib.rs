pub mod client;
pub mod tool;

pub use client::TarballClient;
pub use tool::TarballTool;
