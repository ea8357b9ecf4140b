//! Cache Module
//!
//! Request-interception cache: classification, versioned generations of
//! cached responses, and the manager applying the caching strategies.

mod classify;
mod entry;
mod fetch;
mod generations;
mod manager;
mod stats;


// Re-export public types
pub use classify::{classify, InterceptedRequest, RequestClass, RequestMode};
pub use entry::{normalize_url, RequestKey, ResponseSnapshot};
pub use fetch::{end_to_end_headers, Fetcher, HttpFetcher};
pub use generations::{Generation, GenerationTable};
pub use manager::{CacheManager, Intercepted, Lifecycle, SharedGenerations, Source};
pub use stats::CacheStats;

// == Public Constants ==
/// Response header naming where an intercepted response came from
pub const SOURCE_HEADER: &str = "x-pokevault-source";
