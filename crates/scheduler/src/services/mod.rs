//! External service clients: blob storage, the completion API, and email.

pub mod blob_store;
pub mod completion;
pub mod email;

pub use blob_store::BlobStoreService;
pub use completion::CompletionService;
pub use email::EmailService;
