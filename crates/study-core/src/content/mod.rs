use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{info, warn};

use crate::error::CoreError;
use crate::model::{Chapter, ConceptCard};

/// Bundled content set, compiled into the crate.
const BUILTIN_CHAPTERS: &str = include_str!("chapters.json");

/// Immutable chapter and card definitions with id indexes.
#[derive(Debug)]
pub struct ContentStore {
    chapters: Vec<Chapter>,
    chapter_index: HashMap<String, usize>,
    /// card id -> (chapter position, card position)
    card_index: HashMap<String, (usize, usize)>,
}

impl ContentStore {
    pub fn new(chapters: Vec<Chapter>) -> Result<Self, CoreError> {
        if chapters.is_empty() {
            return Err(CoreError::InvalidContent(
                "content must contain at least one chapter".to_string(),
            ));
        }

        let mut chapter_index = HashMap::with_capacity(chapters.len());
        let mut card_index = HashMap::new();

        for (ci, chapter) in chapters.iter().enumerate() {
            if chapter.id.trim().is_empty() {
                return Err(CoreError::InvalidContent(format!(
                    "chapter at index {ci} has an empty id"
                )));
            }
            if chapter_index.insert(chapter.id.clone(), ci).is_some() {
                return Err(CoreError::InvalidContent(format!(
                    "duplicate chapter id: {}",
                    chapter.id
                )));
            }

            for (ki, card) in chapter.cards.iter().enumerate() {
                if card.id.trim().is_empty() {
                    return Err(CoreError::InvalidContent(format!(
                        "card at index {ki} in chapter {} has an empty id",
                        chapter.id
                    )));
                }
                if let Some((prev, _)) = card_index.insert(card.id.clone(), (ci, ki)) {
                    return Err(CoreError::InvalidContent(format!(
                        "duplicate card id {} (chapters {} and {})",
                        card.id, chapters[prev].id, chapter.id
                    )));
                }
            }
        }

        let known: HashSet<&str> = card_index.keys().map(|s| s.as_str()).collect();
        for chapter in &chapters {
            for card in &chapter.cards {
                for related in &card.related_card_ids {
                    if !known.contains(related.as_str()) {
                        warn!(card = %card.id, related = %related, "related card id does not exist");
                    }
                }
            }
        }

        Ok(Self {
            chapters,
            chapter_index,
            card_index,
        })
    }

    pub fn builtin() -> Result<Self, CoreError> {
        Self::from_json(BUILTIN_CHAPTERS)
    }

    /// Parses the authoring format: a JSON array of chapter records.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let chapters: Vec<Chapter> = serde_json::from_str(json)?;
        Self::new(chapters)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let store = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            chapters = store.len(),
            cards = store.card_count(),
            "loaded content file"
        );
        Ok(store)
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn card_count(&self) -> usize {
        self.card_index.len()
    }

    pub fn chapter_at(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn chapter_by_id(&self, id: &str) -> Option<&Chapter> {
        self.chapter_position(id).map(|i| &self.chapters[i])
    }

    pub fn chapter_position(&self, id: &str) -> Option<usize> {
        self.chapter_index.get(id).copied()
    }

    /// Global card search across every chapter.
    pub fn card_by_id(&self, id: &str) -> Option<&ConceptCard> {
        self.card_location(id).map(|(_, card)| card)
    }

    pub fn card_location(&self, id: &str) -> Option<(&Chapter, &ConceptCard)> {
        let &(ci, ki) = self.card_index.get(id)?;
        let chapter = &self.chapters[ci];
        Some((chapter, &chapter.cards[ki]))
    }
}
