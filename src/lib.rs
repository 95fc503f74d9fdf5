//! # multinet
//!
//! An asynchronous HTTP(S) transfer multiplexer.
//!
//! `multinet` drives a multi-transfer engine (libcurl's multi interface, or
//! anything implementing [`engine::TransferEngine`]) from a single-threaded
//! event loop. Each registered transfer yields a future that resolves
//! exactly once with the accumulated response or the engine's error.
//!
//! ## Features
//!
//! - **Coordinator**: binds engine socket-interest and deadline requests to
//!   reactor watches and a single timer, and drains completions into futures
//! - **Transfer handles**: ordered options, callbacks, per-transfer side-table
//!   and post-completion info
//! - **Reactors**: tokio-backed ([`reactor::TokioReactor`]) or hand-driven
//!   ([`reactor::ManualReactor`])
//! - **HTTP layer**: request descriptions, method dispatch, streaming sinks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use multinet::engine::curl::CurlEngine;
//! use multinet::http::HttpClient;
//! use multinet::multi::Coordinator;
//! use multinet::reactor::TokioReactor;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let local = tokio::task::LocalSet::new();
//!     local.run_until(async {
//!         let coordinator = Coordinator::new(CurlEngine::new(), TokioReactor::new()).unwrap();
//!         let client = HttpClient::new(coordinator);
//!         let response = client.get("https://example.com").send().unwrap().await.unwrap();
//!         println!("Status: {:?}", response.status());
//!     }).await;
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error types and result codes
//! - [`transfer`] - Transfer handles, options, info and side-table
//! - [`engine`] - The transfer-engine contract and the libcurl backend
//! - [`reactor`] - Socket watches and timers
//! - [`multi`] - The coordinator and response futures
//! - [`http`] - Requests, responses and the HTTP client
//! - [`util`] - URL escaping and HTTP dates

pub mod base;
pub mod engine;
pub mod http;
pub mod multi;
pub mod reactor;
pub mod transfer;
pub mod util;

pub use base::error::{Error, ErrorKind};
pub use http::{HttpClient, Request, Response};
pub use multi::{Coordinator, ResponseFuture};
pub use transfer::TransferHandle;

/// A coordinator over libcurl on the tokio reactor. Must be called inside a
/// [`tokio::task::LocalSet`].
#[cfg(all(feature = "curl", unix))]
pub fn default_coordinator() -> Result<Coordinator<engine::curl::CurlEngine, reactor::TokioReactor>, Error> {
    Coordinator::new(engine::curl::CurlEngine::new(), reactor::TokioReactor::new())
}
