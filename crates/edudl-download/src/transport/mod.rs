//! Network transport adapters.

mod http;

pub use http::ReqwestTransport;
