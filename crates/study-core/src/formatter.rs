//! Formatter for card explanation text.
//!
//! Explanations are written in a small line-oriented dialect:
//!
//! - `🎓 Title:` opens a title section; other section emoji (`📊`, `🔍`, `⚡`, ...)
//!   followed by text and a colon open a subtitle section
//! - `1. text` numbered items and `• text` bullet items
//! - `✅`, `❌` and `⚠️` call-outs (success, error, warning)
//! - `**bold**` and `` `code` `` spans inside any of the above
//! - everything else is paragraph text, with blank lines between paragraphs
//!
//! [`parse`] turns text into [`Block`]s and [`render_html`] turns blocks into
//! markup. Text nodes are HTML-escaped, but the dialect itself is meant for
//! author-controlled content. Formatting is deterministic, not idempotent:
//! rendered output is not valid input.

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionLevel {
    Title,
    Subtitle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalloutKind {
    Success,
    Error,
    Warning,
}

impl CalloutKind {
    fn marker(&self) -> &'static str {
        match self {
            Self::Success => "✅",
            Self::Error => "❌",
            Self::Warning => "⚠️",
        }
    }

    fn class(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(String),
    Code(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Section {
        level: SectionLevel,
        marker: &'static str,
        content: Vec<Inline>,
    },
    NumberedItem {
        number: String,
        content: Vec<Inline>,
    },
    BulletItem(Vec<Inline>),
    Callout {
        kind: CalloutKind,
        content: Vec<Inline>,
    },
    /// One entry per source line.
    Paragraph(Vec<Vec<Inline>>),
}

impl Block {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Section {
                level: SectionLevel::Title,
                ..
            } => "title-section",
            Self::Section { .. } => "subtitle-section",
            Self::NumberedItem { .. } => "numbered-item",
            Self::BulletItem(_) => "bullet-item",
            Self::Callout {
                kind: CalloutKind::Success,
                ..
            } => "callout-success",
            Self::Callout {
                kind: CalloutKind::Error,
                ..
            } => "callout-error",
            Self::Callout { .. } => "callout-warning",
            Self::Paragraph(_) => "paragraph",
        }
    }
}

/// (emoji without variation selector, display form, level)
const SECTION_MARKERS: &[(&str, &str, SectionLevel)] = &[
    ("🎓", "🎓", SectionLevel::Title),
    ("📊", "📊", SectionLevel::Subtitle),
    ("🔍", "🔍", SectionLevel::Subtitle),
    ("⚡", "⚡", SectionLevel::Subtitle),
    ("🛠", "🛠️", SectionLevel::Subtitle),
    ("💡", "💡", SectionLevel::Subtitle),
    ("🚀", "🚀", SectionLevel::Subtitle),
    ("🎯", "🎯", SectionLevel::Subtitle),
    ("🏗", "🏗️", SectionLevel::Subtitle),
    ("📱", "📱", SectionLevel::Subtitle),
    ("💰", "💰", SectionLevel::Subtitle),
    ("🔧", "🔧", SectionLevel::Subtitle),
    ("🏷", "🏷️", SectionLevel::Subtitle),
    ("🔄", "🔄", SectionLevel::Subtitle),
    ("⚠", "⚠️", SectionLevel::Subtitle),
    ("🚫", "🚫", SectionLevel::Subtitle),
    ("🗂", "🗂️", SectionLevel::Subtitle),
    ("🏆", "🏆", SectionLevel::Subtitle),
];

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = SECTION_MARKERS
        .iter()
        .map(|(base, _, _)| regex::escape(base))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"^(?P<marker>{alternation})\x{{FE0F}}?\s*(?P<title>[^:]+):(?P<rest>.*)$"
    ))
    .expect("valid regex")
});

static NUMBERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<number>\d+)\.\s+(?P<body>\S.*)$").expect("valid regex"));

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^•\s*(?P<body>\S.*)$").expect("valid regex"));

static CALLOUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<marker>✅|❌|⚠)\x{FE0F}?\s*(?P<body>\S.*)$").expect("valid regex")
});

static INLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*(?P<bold>[^*]+)\*\*|`(?P<code>[^`]+)`").expect("valid regex")
});

/// Formats optional explanation text into markup. Missing or blank input yields `""`.
pub fn format_explanation(text: Option<&str>) -> String {
    match text {
        Some(text) if !text.trim().is_empty() => render_html(&parse(text)),
        _ => String::new(),
    }
}

pub fn parse(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<Vec<Inline>> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
            continue;
        }

        match classify(line) {
            Some((block, rest)) => {
                flush_paragraph(&mut paragraph, &mut blocks);
                blocks.push(block);
                if let Some(rest) = rest {
                    paragraph.push(parse_inline(rest));
                }
            }
            None => paragraph.push(parse_inline(line)),
        }
    }

    flush_paragraph(&mut paragraph, &mut blocks);
    blocks
}

/// Recognizes a block-level line. Sections win over call-outs, so `⚠️ Pitfalls:`
/// is a subtitle while `⚠️ mind the gap` is a warning.
fn classify(line: &str) -> Option<(Block, Option<&str>)> {
    if let Some(caps) = SECTION_RE.captures(line) {
        let title = caps.name("title").map(|m| m.as_str().trim()).unwrap_or_default();
        let marker = caps.name("marker").map(|m| m.as_str()).unwrap_or_default();
        if let (false, Some((_, display, level))) = (
            title.is_empty(),
            SECTION_MARKERS.iter().find(|(base, _, _)| *base == marker),
        ) {
            let rest = caps
                .name("rest")
                .map(|m| m.as_str().trim())
                .filter(|r| !r.is_empty());
            let block = Block::Section {
                level: *level,
                marker: *display,
                content: parse_inline(title),
            };
            return Some((block, rest));
        }
    }

    if let Some(caps) = NUMBERED_RE.captures(line) {
        let block = Block::NumberedItem {
            number: caps["number"].to_string(),
            content: parse_inline(caps["body"].trim_end()),
        };
        return Some((block, None));
    }

    if let Some(caps) = BULLET_RE.captures(line) {
        return Some((Block::BulletItem(parse_inline(caps["body"].trim_end())), None));
    }

    if let Some(caps) = CALLOUT_RE.captures(line) {
        let kind = match &caps["marker"] {
            "✅" => CalloutKind::Success,
            "❌" => CalloutKind::Error,
            _ => CalloutKind::Warning,
        };
        let block = Block::Callout {
            kind,
            content: parse_inline(caps["body"].trim_end()),
        };
        return Some((block, None));
    }

    None
}

fn flush_paragraph(paragraph: &mut Vec<Vec<Inline>>, blocks: &mut Vec<Block>) {
    if !paragraph.is_empty() {
        blocks.push(Block::Paragraph(std::mem::take(paragraph)));
    }
}

fn parse_inline(text: &str) -> Vec<Inline> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in INLINE_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let span = if let Some(bold) = caps.name("bold") {
            Inline::Bold(bold.as_str().to_string())
        } else if let Some(code) = caps.name("code") {
            Inline::Code(code.as_str().to_string())
        } else {
            continue;
        };
        // blank spans stay literal so no empty wrapper is emitted
        if matches!(&span, Inline::Bold(s) | Inline::Code(s) if s.trim().is_empty()) {
            continue;
        }
        push_text(&mut spans, &text[last..whole.start()]);
        spans.push(span);
        last = whole.end();
    }

    push_text(&mut spans, &text[last..]);
    spans
}

fn push_text(spans: &mut Vec<Inline>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Inline::Text(prev)) = spans.last_mut() {
        prev.push_str(text);
    } else {
        spans.push(Inline::Text(text.to_string()));
    }
}

pub fn render_html(blocks: &[Block]) -> String {
    let mut out = String::new();

    for block in blocks {
        match block {
            Block::Section {
                level,
                marker,
                content,
            } => {
                let class = match level {
                    SectionLevel::Title => "title-section",
                    SectionLevel::Subtitle => "subtitle-section",
                };
                out.push_str(&format!("<div class=\"{class}\">{marker} "));
                render_inline(&mut out, content);
                out.push_str("</div>");
            }
            Block::NumberedItem { number, content } => {
                out.push_str("<div class=\"numbered-item\"><span class=\"number\">");
                escape_into(&mut out, number);
                out.push_str(". </span>");
                render_inline(&mut out, content);
                out.push_str("</div>");
            }
            Block::BulletItem(content) => {
                out.push_str("<div class=\"bullet-item\">• ");
                render_inline(&mut out, content);
                out.push_str("</div>");
            }
            Block::Callout { kind, content } => {
                out.push_str(&format!(
                    "<div class=\"highlight-box {}\">{} ",
                    kind.class(),
                    kind.marker()
                ));
                render_inline(&mut out, content);
                out.push_str("</div>");
            }
            Block::Paragraph(lines) => {
                out.push_str("<p class=\"paragraph\">");
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        out.push_str("<br>");
                    }
                    render_inline(&mut out, line);
                }
                out.push_str("</p>");
            }
        }
    }

    out
}

fn render_inline(out: &mut String, spans: &[Inline]) {
    for span in spans {
        match span {
            Inline::Text(text) => escape_into(out, text),
            Inline::Bold(text) => {
                out.push_str("<span class=\"highlight-text\">");
                escape_into(out, text);
                out.push_str("</span>");
            }
            Inline::Code(text) => {
                out.push_str("<code class=\"inline-code\">");
                escape_into(out, text);
                out.push_str("</code>");
            }
        }
    }
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}
