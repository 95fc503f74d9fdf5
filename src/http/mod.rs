pub mod accumulator;
pub mod builder;
pub mod client;
pub mod orderedheaders;
pub mod proxy;
pub mod request;
pub mod requestbody;
pub mod response;

// Re-exports for convenience
pub use accumulator::{split_header_line, ResponseAccumulator};
pub use builder::HttpRequestBuilder;
pub use client::{HttpClient, HttpClientBuilder, RequestBuilder};
pub use orderedheaders::OrderedHeaders;
pub use proxy::{ProxySettings, ProxyType};
pub use request::{AuthMode, Request};
pub use requestbody::RequestBody;
pub use response::Response;
