//! Narrative repositories.

mod file;
mod in_memory;

pub use file::FileNarrativeRepository;
pub use in_memory::InMemoryNarrativeRepository;
