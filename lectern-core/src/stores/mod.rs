//! Store ports and their client-side adapters.

pub mod remote;
pub mod resume;

pub use remote::{HttpProgressStore, ProgressStore};
pub use resume::{JsonResumeStore, ResumeStore};
