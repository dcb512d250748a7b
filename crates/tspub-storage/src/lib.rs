//! tspub Storage Library
//!
//! Object-storage sessions bound to the temporary credentials issued by the
//! publishing API, and streaming upload of local files into them.
//!
//! # Remote key format
//!
//! Every uploaded object lands at `{key_prefix}{file_name}`: the key prefix
//! handed out with the credentials, followed by the base name of the local
//! file. Key generation lives in the `keys` module.

pub mod factory;
pub mod keys;
pub mod session;

// Re-export commonly used types
pub use factory::{MemorySessionFactory, S3SessionFactory, SessionFactory};
pub use keys::remote_key;
pub use session::{StorageError, StorageResult, StorageSession};
