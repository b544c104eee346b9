//! HTTP plumbing: client policy and the hop-level transport seam.

mod client;
mod transport;

pub use client::build_http_client;
pub use transport::{
    FORM_CONTENT_TYPE, HopMethod, HopRequest, HopResponse, ReqwestTransport, Transport,
};
