use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// A transient message shown to the learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub visible_for: Duration,
}

impl Toast {
    pub fn mission_complete() -> Self {
        Self {
            kind: ToastKind::Success,
            message: "🎉 Mission complete! You explored every code sample in this chapter!"
                .to_string(),
            visible_for: Duration::from_secs(4),
        }
    }

    pub fn concepts_loaded() -> Self {
        Self {
            kind: ToastKind::Success,
            message: "🚀 All concepts are on the board! Open each card to complete the mission."
                .to_string(),
            visible_for: Duration::from_secs(3),
        }
    }

    pub fn card_not_ready(card_title: &str) -> Self {
        Self {
            kind: ToastKind::Info,
            message: format!("⏳ Hold on! \"{card_title}\" is still being drawn."),
            visible_for: Duration::from_secs(2),
        }
    }
}
