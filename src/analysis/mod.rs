pub mod anonymizer;
pub mod client;
pub mod rate_limiter;
pub mod retry;
pub mod transport;
pub mod types;


pub use anonymizer::DataAnonymizer;
pub use client::AnalysisClient;
pub use rate_limiter::{RateLimiter, RateLimiterStatus, RatePermit};
pub use retry::RetryPolicy;
pub use transport::{
    ApiRequest, ApiResponse, HttpMethod, HttpTransport, ScriptedTransport, Transport,
    TransportError,
};
pub use types::*;
