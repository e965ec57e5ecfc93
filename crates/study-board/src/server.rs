use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::{Config, LOADING_ICON};
use study_core::board_api::{
    CardDetailResponse, CardSummary, CardViewState, ChapterDetailResponse, ChapterListResponse,
    ChapterSummary, ChapterViewResponse, CodeExampleInfo, ConnectorInfo, FormatTextParams,
    FormatTextResponse, GetCardParams, GetChapterParams, MissionProgressInfo, NavDirection,
    NavigateParams, NotificationInfo, OpenCardParams, OpenCardResponse, ReportVisibilityParams,
    SelectChapterParams,
};
use study_core::content::ContentStore;
use study_core::formatter;
use study_core::model::{Chapter, CodeExample, ConceptCard};
use study_core::notification::Toast;
use study_core::scheduler::RegionState;
use study_core::session::{BoardSession, OpenCard};
use study_core::view_state::ViewState;

#[derive(Clone)]
pub struct StudyBoardServer {
    store: Arc<ContentStore>,
    session: Arc<Mutex<BoardSession>>,
    config: Arc<Config>,
    tool_router: ToolRouter<StudyBoardServer>,
}

impl StudyBoardServer {
    pub fn new(store: Arc<ContentStore>, config: Config) -> Self {
        let session = BoardSession::new(Arc::clone(&store), config.timing());
        Self {
            store,
            session: Arc::new(Mutex::new(session)),
            config: Arc::new(config),
            tool_router: Self::tool_router(),
        }
    }

    /// Same content and config, new learner session. Used per TCP connection.
    pub fn fresh_session(&self) -> Self {
        let session = BoardSession::new(Arc::clone(&self.store), self.config.timing());
        Self {
            store: Arc::clone(&self.store),
            session: Arc::new(Mutex::new(session)),
            config: Arc::clone(&self.config),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl StudyBoardServer {
    #[tool(description = "List every chapter with its tab label and the currently selected chapter.")]
    async fn list_chapters(&self) -> Result<Json<ChapterListResponse>, String> {
        let current_index = self.session.lock().await.cursor().index();
        let chapters = self
            .store
            .chapters()
            .iter()
            .enumerate()
            .map(|(index, chapter)| ChapterSummary {
                index,
                id: chapter.id.clone(),
                title: chapter.title.clone(),
                nav_label: chapter.nav_label().to_string(),
                description: chapter.description.clone(),
                card_count: chapter.cards.len(),
            })
            .collect();

        Ok(Json(ChapterListResponse {
            chapters,
            current_index,
            icon_url: self.config.asset_path(LOADING_ICON),
        }))
    }

    #[tool(description = "Get a chapter's cards and connectors by chapter ID (e.g. 'hooks-chapter').")]
    async fn get_chapter(
        &self,
        Parameters(params): Parameters<GetChapterParams>,
    ) -> Result<Json<ChapterDetailResponse>, String> {
        let chapter_id = params.chapter_id.trim();
        if chapter_id.is_empty() {
            return Err("chapter_id must not be empty".to_string());
        }

        let index = self
            .store
            .chapter_position(chapter_id)
            .ok_or_else(|| {
                let available: Vec<&str> =
                    self.store.chapters().iter().map(|c| c.id.as_str()).collect();
                format!(
                    "chapter not found: '{chapter_id}'. Available chapters: {}",
                    available.join(", ")
                )
            })?;
        let chapter = &self.store.chapters()[index];

        Ok(Json(to_api_chapter(index, chapter)))
    }

    #[tool(description = "Look up any card by ID, including its code sample and formatted explanation.")]
    async fn get_card(
        &self,
        Parameters(params): Parameters<GetCardParams>,
    ) -> Result<Json<CardDetailResponse>, String> {
        let card_id = params.card_id.trim();
        if card_id.is_empty() {
            return Err("card_id must not be empty".to_string());
        }

        let (chapter, card) = self
            .store
            .card_location(card_id)
            .ok_or_else(|| format!("card not found: {card_id}"))?;

        Ok(Json(CardDetailResponse {
            chapter_id: chapter.id.clone(),
            card: to_api_card(card),
            code: card.code.as_ref().map(to_api_code),
        }))
    }

    #[tool(description = "Show the current chapter: loading state, which cards are revealed, ready and viewed, mission progress and pending notifications.")]
    async fn current_view(&self) -> Result<Json<ChapterViewResponse>, String> {
        let mut session = self.session.lock().await;
        Ok(Json(chapter_view(&mut session)))
    }

    #[tool(description = "Move to the previous or next chapter. Does nothing at either end.")]
    async fn navigate(
        &self,
        Parameters(params): Parameters<NavigateParams>,
    ) -> Result<Json<ChapterViewResponse>, String> {
        let mut session = self.session.lock().await;
        let moved = match params.direction {
            NavDirection::Previous => session.previous(),
            NavDirection::Next => session.next(),
        };
        debug!(direction = ?params.direction, moved, "navigate");
        Ok(Json(chapter_view(&mut session)))
    }

    #[tool(description = "Jump to a chapter by zero-based index. Out-of-range indexes leave the board unchanged.")]
    async fn select_chapter(
        &self,
        Parameters(params): Parameters<SelectChapterParams>,
    ) -> Result<Json<ChapterViewResponse>, String> {
        let mut session = self.session.lock().await;
        let moved = session.jump_to(params.index);
        debug!(index = params.index, moved, "select_chapter");
        Ok(Json(chapter_view(&mut session)))
    }

    #[tool(description = "Report how much of the card grid is on screen (0.0 to 1.0). Crossing the threshold starts the reveal animations.")]
    async fn report_visibility(
        &self,
        Parameters(params): Parameters<ReportVisibilityParams>,
    ) -> Result<Json<ChapterViewResponse>, String> {
        let mut session = self.session.lock().await;
        session.visit_mut().observe_region(params.visible_ratio);
        Ok(Json(chapter_view(&mut session)))
    }

    #[tool(description = "Open a card in the current chapter to read its code sample. Counts toward the chapter mission.")]
    async fn open_card(
        &self,
        Parameters(params): Parameters<OpenCardParams>,
    ) -> Result<Json<OpenCardResponse>, String> {
        let card_id = params.card_id.trim();
        if card_id.is_empty() {
            return Err("card_id must not be empty".to_string());
        }

        let mut session = self.session.lock().await;
        let result = session.visit_mut().open_card(card_id);
        let (status, completed_now) = match result {
            OpenCard::Opened(outcome) => ("opened", outcome.completed_now),
            OpenCard::NotReady => ("not_ready", false),
            OpenCard::NotInChapter => {
                return Err(format!(
                    "card '{card_id}' is not in the current chapter '{}'",
                    session.current_chapter().id
                ));
            }
        };

        let code = match result {
            OpenCard::Opened(_) => session
                .current_chapter()
                .card(card_id)
                .and_then(|card| card.code.as_ref())
                .map(to_api_code),
            _ => None,
        };
        let progress = to_api_progress(session.visit().view());
        let notifications = to_api_notifications(session.visit_mut().drain_notifications());

        if completed_now {
            info!(chapter = %session.current_chapter().id, "chapter mission completed");
        }

        Ok(Json(OpenCardResponse {
            card_id: card_id.to_string(),
            status: status.to_string(),
            code,
            progress,
            completed_now,
            notifications,
        }))
    }

    #[tool(description = "Replay the current chapter: show the loading overlay again and redraw the connectors. Viewed cards stay viewed.")]
    async fn replay_animations(&self) -> Result<Json<ChapterViewResponse>, String> {
        let mut session = self.session.lock().await;
        session.visit_mut().replay();
        Ok(Json(chapter_view(&mut session)))
    }

    #[tool(description = "Render explanation text (emoji section markers, bullets, **bold**, `code`) to HTML.")]
    async fn format_text(
        &self,
        Parameters(params): Parameters<FormatTextParams>,
    ) -> Result<Json<FormatTextResponse>, String> {
        let blocks = formatter::parse(&params.text);
        Ok(Json(FormatTextResponse {
            html: formatter::render_html(&blocks),
            blocks: blocks.iter().map(|b| b.kind().to_string()).collect(),
        }))
    }
}

fn chapter_view(session: &mut BoardSession) -> ChapterViewResponse {
    let notifications = to_api_notifications(session.visit_mut().drain_notifications());
    let cursor = session.cursor();
    let chapter = session.current_chapter();
    let visit = session.visit();

    let cards = chapter
        .cards
        .iter()
        .zip(visit.card_statuses())
        .map(|(card, status)| CardViewState {
            id: card.id.clone(),
            title: card.title.clone(),
            revealed: status.revealed,
            ready: status.ready,
            viewed: status.viewed,
        })
        .collect();

    ChapterViewResponse {
        chapter_id: chapter.id.clone(),
        chapter_title: chapter.title.clone(),
        index: cursor.index(),
        position: cursor.label(),
        has_previous: cursor.has_previous(),
        has_next: cursor.has_next(),
        loading: visit.is_loading(),
        grid_seen: visit.region_state() == RegionState::Seen,
        cards,
        connectors_visible: visit.connectors_visible(),
        progress: to_api_progress(visit.view()),
        notifications,
    }
}

fn to_api_chapter(index: usize, chapter: &Chapter) -> ChapterDetailResponse {
    ChapterDetailResponse {
        index,
        id: chapter.id.clone(),
        title: chapter.title.clone(),
        description: chapter.description.clone(),
        background_style: chapter.background_style.clone(),
        cards: chapter.cards.iter().map(to_api_card).collect(),
        connectors: chapter
            .connectors
            .iter()
            .map(|c| ConnectorInfo {
                id: c.id.clone(),
                path_data: c.path_data.clone(),
                dash_pattern: c.dash_pattern.clone(),
                animation_duration_secs: c.animation_duration_secs,
            })
            .collect(),
    }
}

fn to_api_card(card: &ConceptCard) -> CardSummary {
    CardSummary {
        id: card.id.clone(),
        title: card.title.clone(),
        description: card.description.clone(),
        category: card.category.as_str().to_string(),
        color_style: card.color_style.clone(),
        x: card.position.x,
        y: card.position.y,
        related_card_ids: card.related_card_ids.clone(),
        icon: card.icon.clone(),
        has_code: card.code.is_some(),
    }
}

fn to_api_code(code: &CodeExample) -> CodeExampleInfo {
    CodeExampleInfo {
        language: code.language.clone(),
        source: code.source.clone(),
        explanation: code.explanation.clone(),
        explanation_html: formatter::format_explanation(Some(&code.explanation)),
    }
}

fn to_api_progress(view: &ViewState) -> MissionProgressInfo {
    MissionProgressInfo {
        viewed: view.viewed_count(),
        total: view.total(),
        percent: view.progress_rounded(),
        complete: view.is_mission_complete(),
    }
}

fn to_api_notifications(toasts: Vec<Toast>) -> Vec<NotificationInfo> {
    toasts
        .into_iter()
        .map(|t| NotificationInfo {
            kind: t.kind.as_str().to_string(),
            message: t.message,
            visible_for_ms: t.visible_for.as_millis() as u64,
        })
        .collect()
}

#[tool_handler]
impl ServerHandler for StudyBoardServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "study-board".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "React study board MCP server. Chapters of concept cards with code samples. \
                 Use list_chapters and get_chapter to browse, report_visibility to bring the \
                 card grid on screen, current_view to watch cards reveal, and open_card to \
                 read each sample. Opening every card in a chapter completes its mission. \
                 navigate and select_chapter change chapters; format_text renders explanation text."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;

    fn server(reduced_motion: bool) -> StudyBoardServer {
        let config = Config {
            content_path: None,
            profile: Profile::Production,
            base_path: "/react-study-board".to_string(),
            reduced_motion,
            tcp_listen_addr: None,
        };
        let store = Arc::new(config.load_content().unwrap());
        StudyBoardServer::new(store, config)
    }

    fn open(card_id: &str) -> Parameters<OpenCardParams> {
        Parameters(OpenCardParams {
            card_id: card_id.to_string(),
        })
    }

    #[test]
    fn tools_publish_output_schemas() {
        let tools = StudyBoardServer::tool_router().list_all();
        for name in [
            "list_chapters",
            "get_chapter",
            "get_card",
            "current_view",
            "navigate",
            "select_chapter",
            "report_visibility",
            "open_card",
            "replay_animations",
            "format_text",
        ] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }

    #[test]
    fn server_builds_outside_runtime() {
        let server = server(false);
        let fresh = server.fresh_session();
        assert!(Arc::ptr_eq(&server.store, &fresh.store));
        assert!(!Arc::ptr_eq(&server.session, &fresh.session));
    }

    #[tokio::test]
    async fn list_chapters_uses_base_path() {
        let Json(list) = server(true).list_chapters().await.unwrap();
        assert_eq!(list.chapters.len(), 4);
        assert_eq!(list.current_index, 0);
        assert_eq!(list.icon_url, "/react-study-board/iconspawn.png");
        assert!(!list.chapters[0].nav_label.is_empty());
    }

    #[tokio::test]
    async fn lookups_report_missing_ids() {
        let server = server(true);
        let Err(err) = server
            .get_chapter(Parameters(GetChapterParams {
                chapter_id: "nope".to_string(),
            }))
            .await
        else {
            panic!("unknown chapter id should be rejected");
        };
        assert!(err.contains("client-server"));

        let Json(card) = server
            .get_card(Parameters(GetCardParams {
                card_id: " server-side-concept ".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(card.chapter_id, "client-server");
        assert!(card.code.is_some_and(|c| !c.explanation_html.is_empty()));
    }

    #[tokio::test]
    async fn opening_every_card_completes_the_mission() {
        let server = server(true);
        let Json(view) = server.current_view().await.unwrap();
        let ids: Vec<String> = view.cards.iter().map(|c| c.id.clone()).collect();

        let Json(first) = server.open_card(open(&ids[0])).await.unwrap();
        assert_eq!(first.status, "not_ready");
        assert_eq!(first.notifications.len(), 1);

        server
            .report_visibility(Parameters(ReportVisibilityParams { visible_ratio: 0.5 }))
            .await
            .unwrap();

        let mut last = None;
        for id in &ids {
            let Json(resp) = server.open_card(open(id)).await.unwrap();
            assert_eq!(resp.status, "opened");
            assert!(resp.code.is_some());
            last = Some(resp);
        }
        let last = last.unwrap();
        assert!(last.completed_now);
        assert!(last.progress.complete);
        assert_eq!(last.progress.percent, 100);
        assert!(last.notifications.iter().any(|n| n.visible_for_ms == 4000));
    }

    #[tokio::test]
    async fn open_card_rejects_other_chapters() {
        let server = server(true);
        let Err(err) = server.open_card(open("missing")).await else {
            panic!("card outside the chapter should be rejected");
        };
        assert!(err.contains("client-server"));
        assert!(server.open_card(open("  ")).await.is_err());
    }

    #[tokio::test]
    async fn navigation_is_clamped_and_resets_progress() {
        let server = server(true);
        let Json(view) = server
            .navigate(Parameters(NavigateParams {
                direction: NavDirection::Previous,
            }))
            .await
            .unwrap();
        assert_eq!(view.index, 0);
        assert!(!view.has_previous);

        let Json(view) = server
            .select_chapter(Parameters(SelectChapterParams { index: 3 }))
            .await
            .unwrap();
        assert_eq!(view.position, "4/4");
        assert!(!view.has_next);
        assert_eq!(view.progress.viewed, 0);

        let Json(view) = server
            .select_chapter(Parameters(SelectChapterParams { index: 99 }))
            .await
            .unwrap();
        assert_eq!(view.index, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn view_reflects_reveal_progress() {
        let server = server(false);
        let Json(view) = server
            .report_visibility(Parameters(ReportVisibilityParams { visible_ratio: 0.1 }))
            .await
            .unwrap();
        assert!(!view.grid_seen);
        assert!(view.loading);
        assert!(view.cards.iter().all(|c| !c.revealed));

        let Json(view) = server
            .report_visibility(Parameters(ReportVisibilityParams { visible_ratio: 0.6 }))
            .await
            .unwrap();
        assert!(view.grid_seen);
        assert!(view.cards[0].revealed);
        assert!(!view.cards[1].revealed);

        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        let Json(view) = server.current_view().await.unwrap();
        assert!(!view.loading);
        assert!(view.cards.iter().all(|c| c.revealed && c.ready));
        assert!(view.connectors_visible);
        assert_eq!(view.notifications.len(), 1);
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let first = server(true);
        let second = first.fresh_session();
        first
            .select_chapter(Parameters(SelectChapterParams { index: 2 }))
            .await
            .unwrap();
        let Json(view) = second.current_view().await.unwrap();
        assert_eq!(view.index, 0);
    }

    #[tokio::test]
    async fn format_text_reports_block_kinds() {
        let Json(resp) = server(true)
            .format_text(Parameters(FormatTextParams {
                text: "🎓 Basics:\n• **one**".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(resp.blocks, ["title-section", "bullet-item"]);
        assert!(resp.html.contains("highlight-text"));
    }
}
