//! HTTP protocol layer module
//!
//! Response building and MIME detection, decoupled from dispatch logic.

pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_asset_response, build_document_response, build_json_response, build_plain_response,
};
