mod client;
mod responses;
mod types;

pub use client::GitLabClient;
pub use types::PipelineStatus;
