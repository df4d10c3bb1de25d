//! AI-generated operational insights over an equipment record set.

pub mod prompts;
pub mod requester;
pub mod transport;
pub mod types;

pub use requester::{parse_insights, request_insights, InsightProvider, InsightRequester};
pub use transport::{CompletionRequest, CompletionTransport, HttpTransport};
pub use types::*;
