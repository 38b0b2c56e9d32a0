//! Narrative state model for Fabulist.
//!
//! The state is a strict containment hierarchy:
//!
//! ```text
//! NarrativeContext
//! └── ChapterContext (chapter_number strictly increasing)
//!     └── SceneContext (scene_number strictly increasing)
//!         └── ScenePiece (piece_number sequential from 1, immutable)
//! ```
//!
//! Children hold no references to their parents; lookups go through
//! [`NarrativeContext::get_chapter`] and [`ChapterContext::get_scene`]. Every
//! entity converts to and from a plain JSON record through [`Record`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chapter;
mod narrative;
mod record;
mod scene;

pub use chapter::ChapterContext;
pub use narrative::{GenerationLogEntry, NarrativeContext, StoryInfo};
pub use record::Record;
pub use scene::{PIECE_SEPARATOR, SceneContext, ScenePiece};
