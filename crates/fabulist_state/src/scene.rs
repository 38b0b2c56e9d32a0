//! Scenes and the pieces they are assembled from.

use crate::Record;
use fabulist_core::word_count;
use fabulist_error::{FabulistResult, StateError, StateErrorKind};
use serde::{Deserialize, Serialize};

/// Separator placed between piece contents in a scene's text.
pub const PIECE_SEPARATOR: &str = "\n\n";

/// Smallest unit of narrative text. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ScenePiece {
    /// Position within the scene, starting at 1
    piece_number: u32,
    /// Prose of the piece
    content: String,
    /// Short digest of the piece
    #[serde(default)]
    summary: String,
}

/// One scene of a chapter, built from an ordered list of pieces.
///
/// The scene's text is never stored; [`SceneContext::generated_content`]
/// derives it from the pieces.
///
/// # Examples
///
/// ```
/// use fabulist_state::SceneContext;
///
/// let mut scene = SceneContext::new(1, "Mara tries the brass key on the chapel door.");
/// scene.add_piece("The key was warm.", "Mara holds the key.");
/// scene.add_piece("The door opened onto sky.", "The door opens elsewhere.");
///
/// assert_eq!(scene.pieces().len(), 2);
/// assert_eq!(
///     scene.generated_content(),
///     "The key was warm.\n\nThe door opened onto sky."
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct SceneContext {
    /// Position within the chapter, starting at 1
    scene_number: u32,
    /// Outline the scene was written from
    initial_outline: String,
    /// Pieces in order
    #[serde(default)]
    pieces: Vec<ScenePiece>,
    /// Digest of the finished scene
    #[serde(default)]
    final_summary: Option<String>,
    /// Facts the next scene must carry forward
    #[serde(default)]
    key_points_for_next_scene: Vec<String>,
}

impl SceneContext {
    /// Create an empty scene.
    pub fn new(scene_number: u32, initial_outline: impl Into<String>) -> Self {
        Self {
            scene_number,
            initial_outline: initial_outline.into(),
            pieces: Vec::new(),
            final_summary: None,
            key_points_for_next_scene: Vec::new(),
        }
    }

    /// Append a piece, numbering it after the last one.
    pub fn add_piece(&mut self, content: impl Into<String>, summary: impl Into<String>) -> &ScenePiece {
        let piece_number = self.pieces.len() as u32 + 1;
        self.pieces.push(ScenePiece {
            piece_number,
            content: content.into(),
            summary: summary.into(),
        });
        tracing::trace!(scene = self.scene_number, piece = piece_number, "Appended piece");
        &self.pieces[self.pieces.len() - 1]
    }

    /// Ordered join of piece contents.
    pub fn generated_content(&self) -> String {
        self.pieces
            .iter()
            .map(|piece| piece.content.as_str())
            .collect::<Vec<_>>()
            .join(PIECE_SEPARATOR)
    }

    /// Summaries of the pieces so far, in order.
    pub fn piece_summaries(&self) -> Vec<&str> {
        self.pieces.iter().map(|piece| piece.summary.as_str()).collect()
    }

    /// Words across all pieces.
    pub fn word_count(&self) -> usize {
        self.pieces.iter().map(|piece| word_count(&piece.content)).sum()
    }

    /// Record the digest of the finished scene.
    pub fn set_final_summary(&mut self, summary: impl Into<String>) {
        self.final_summary = Some(summary.into());
    }

    /// Accumulate key points for the next scene.
    pub fn add_key_points<I, S>(&mut self, points: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_points_for_next_scene
            .extend(points.into_iter().map(Into::into));
    }
}

impl Record for ScenePiece {}

impl Record for SceneContext {
    fn validate(&self) -> FabulistResult<()> {
        for (index, piece) in self.pieces.iter().enumerate() {
            let expected = index as u32 + 1;
            if piece.piece_number != expected {
                return Err(StateError::new(StateErrorKind::InvalidRecord(format!(
                    "scene {} has piece {} where piece {} was expected",
                    self.scene_number, piece.piece_number, expected
                )))
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_numbers_are_sequential() {
        let mut scene = SceneContext::new(2, "outline");
        for i in 0..5 {
            scene.add_piece(format!("piece {i}"), "");
        }
        let numbers: Vec<u32> = scene.pieces().iter().map(|p| *p.piece_number()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_empty_scene_has_empty_content() {
        let scene = SceneContext::new(1, "outline");
        assert_eq!(scene.generated_content(), "");
        assert_eq!(scene.word_count(), 0);
    }

    #[test]
    fn test_validate_rejects_gapped_pieces() {
        let record = serde_json::json!({
            "scene_number": 1,
            "initial_outline": "o",
            "pieces": [
                {"piece_number": 1, "content": "a", "summary": ""},
                {"piece_number": 3, "content": "b", "summary": ""}
            ]
        });
        assert!(SceneContext::from_record(record).is_err());
    }
}
