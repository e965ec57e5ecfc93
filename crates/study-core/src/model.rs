use serde::{Deserialize, Serialize};

/// Topic bucket a concept card belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardCategory {
    ClientServer,
    Hooks,
    Performance,
    BestPractices,
}

impl CardCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientServer => "client-server",
            Self::Hooks => "hooks",
            Self::Performance => "performance",
            Self::BestPractices => "best-practices",
        }
    }
}

/// Layout hint for a card on the board canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// Code sample attached to a card, shown when the card is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeExample {
    /// Highlighting language, e.g. "typescript"
    pub language: String,
    /// Verbatim source shown in the code tab
    pub source: String,
    /// Explanation text in the emoji-marked dialect understood by the formatter
    pub explanation: String,
}

/// A single teachable unit (e.g. "Server-Side Rendering (SSR)").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptCard {
    /// Stable card identifier, unique across every chapter, e.g. "server-side-concept"
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: CardCategory,
    /// Style token for the card body
    pub color_style: String,
    #[serde(default)]
    pub position: Position,
    /// Ids of cards this one links to
    #[serde(default)]
    pub related_card_ids: Vec<String>,
    #[serde(default)]
    pub code: Option<CodeExample>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Decorative path drawn between cards once every card has been revealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connector {
    pub id: String,
    /// SVG path data, e.g. "M 300 220 Q 400 180 500 220"
    pub path_data: String,
    /// Stroke dash pattern, e.g. "5,5"
    pub dash_pattern: String,
    pub animation_duration_secs: f64,
}

/// An ordered group of concept cards sharing a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    /// Display title, conventionally prefixed with an emoji, e.g. "🎣 useState vs useEffect"
    pub title: String,
    pub description: String,
    pub background_style: String,
    pub cards: Vec<ConceptCard>,
    #[serde(default)]
    pub connectors: Vec<Connector>,
}

impl Chapter {
    /// Short label for chapter tabs: the title minus its leading token.
    pub fn nav_label(&self) -> &str {
        match self.title.split_once(char::is_whitespace) {
            Some((head, rest)) if !head.is_empty() => rest.trim_start(),
            _ => &self.title,
        }
    }

    pub fn card(&self, card_id: &str) -> Option<&ConceptCard> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    pub fn card_position(&self, card_id: &str) -> Option<usize> {
        self.cards.iter().position(|c| c.id == card_id)
    }
}
