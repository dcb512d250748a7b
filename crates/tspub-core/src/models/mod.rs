//! Data models for the publishing pipeline
//!
//! Bundle description types as read from disk, the attachment variants sent
//! to the draft endpoints, and the credential and upload job values the
//! upload path works with.

mod attachment;
mod bundle;
mod credentials;
mod draft;
mod upload;

pub use attachment::*;
pub use bundle::*;
pub use credentials::*;
pub use draft::*;
pub use upload::*;
