//! HTTP protocol layer module
//!
//! Response builders shared by the router, decoupled from the index page.

pub mod response;

pub use response::{build_404_response, build_405_response, build_options_response};
