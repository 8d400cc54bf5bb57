//! Generative backend access: the HTTP providers, the retrying model cascade
//! and repository summarization built on top of it.

pub mod backend;
pub mod cascade;
pub mod summarize;

pub use backend::{BackendError, GenerationParams, GenerativeBackend, HttpBackend};
pub use cascade::{Generation, ModelCascade};
pub use summarize::summarize_repo;
