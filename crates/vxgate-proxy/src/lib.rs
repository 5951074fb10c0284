#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

mod error;
mod gateway;
mod headers;
mod relay;
mod request;
mod server;

pub use error::{GatewayError, SetupError};
pub use gateway::Gateway;
pub use headers::{USER_PROJECT_HEADER, merge_headers, should_forward_header};
pub use request::ProxyRequest;
pub use server::{PROXY_PATH, router, serve};

// Silence unused dev-dependency warnings
#[cfg(test)]
use async_trait as _;
#[cfg(test)]
use tokio_test as _;
#[cfg(test)]
use tower as _;
