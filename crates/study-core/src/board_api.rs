use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetChapterParams {
    /// Chapter ID such as "client-server" or "hooks-chapter".
    pub chapter_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetCardParams {
    /// Card ID such as "server-side-concept". Searched across every chapter.
    pub card_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NavDirection {
    Previous,
    Next,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NavigateParams {
    /// "previous" or "next". Moving past either end leaves the board unchanged.
    pub direction: NavDirection,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SelectChapterParams {
    /// Zero-based chapter index.
    pub index: usize,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReportVisibilityParams {
    /// Visible share of the card grid, 0.0 to 1.0.
    pub visible_ratio: f64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct OpenCardParams {
    /// Card ID in the current chapter.
    pub card_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FormatTextParams {
    /// Explanation text using the emoji section markers, `**bold**` and `` `code` ``.
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChapterSummary {
    pub index: usize,
    pub id: String,
    pub title: String,
    /// Title without its leading emoji, used for chapter tabs.
    pub nav_label: String,
    pub description: String,
    pub card_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChapterListResponse {
    pub chapters: Vec<ChapterSummary>,
    pub current_index: usize,
    /// Path of the loading-screen icon, prefixed with the deployment base path.
    pub icon_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CardSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub color_style: String,
    pub x: i32,
    pub y: i32,
    pub related_card_ids: Vec<String>,
    pub icon: Option<String>,
    pub has_code: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConnectorInfo {
    pub id: String,
    pub path_data: String,
    pub dash_pattern: String,
    pub animation_duration_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChapterDetailResponse {
    pub index: usize,
    pub id: String,
    pub title: String,
    pub description: String,
    pub background_style: String,
    pub cards: Vec<CardSummary>,
    pub connectors: Vec<ConnectorInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CodeExampleInfo {
    pub language: String,
    pub source: String,
    pub explanation: String,
    /// Explanation rendered to HTML.
    pub explanation_html: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CardDetailResponse {
    pub chapter_id: String,
    pub card: CardSummary,
    pub code: Option<CodeExampleInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CardViewState {
    pub id: String,
    pub title: String,
    /// Entrance animation has started.
    pub revealed: bool,
    /// Entrance animation has settled; the card accepts clicks.
    pub ready: bool,
    pub viewed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MissionProgressInfo {
    pub viewed: usize,
    pub total: usize,
    pub percent: u8,
    pub complete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationInfo {
    /// "success", "error" or "info".
    pub kind: String,
    pub message: String,
    pub visible_for_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChapterViewResponse {
    pub chapter_id: String,
    pub chapter_title: String,
    pub index: usize,
    /// One-based position such as "2/4".
    pub position: String,
    pub has_previous: bool,
    pub has_next: bool,
    pub loading: bool,
    pub grid_seen: bool,
    pub cards: Vec<CardViewState>,
    pub connectors_visible: bool,
    pub progress: MissionProgressInfo,
    pub notifications: Vec<NotificationInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OpenCardResponse {
    pub card_id: String,
    /// "opened" or "not_ready".
    pub status: String,
    pub code: Option<CodeExampleInfo>,
    pub progress: MissionProgressInfo,
    pub completed_now: bool,
    pub notifications: Vec<NotificationInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FormatTextResponse {
    pub html: String,
    /// Block kinds in order, e.g. "title-section", "bullet-item".
    pub blocks: Vec<String>,
}
