//! Request handler module
//!
//! The cached index page, its resource resolution and CSP policy, and the
//! router that dispatches requests to it.

pub mod index;
pub mod policy;
pub mod resource;
pub mod router;

pub use index::{CachedPage, IndexHandler, INDEX_PATH};
pub use policy::SecurityPolicy;
pub use resource::{resolve_context, DirectoryResolver, LoadError, ResourceResolver};
pub use router::handle_request;
