//! Single-page application host
//!
//! Serves one cached `index.html` with configurable
//! `Content-Security-Policy` headers.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
