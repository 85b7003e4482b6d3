//! Line-oriented Markdown → HTML renderer for cleaned narrative text.
//!
//! Handles headings, bullet and numbered lists, `$$` display math (passed
//! through for a client-side math typesetter), and three inline forms:
//! bold, italic and code spans. Everything is escaped before markup is added.

use std::sync::LazyLock;

use regex::Regex;

use nbview_shared::text::escape_markup;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,4})\s+(.*)$").expect("valid regex"));

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*•+]\s+(.*)$").expect("valid regex"));

static NUMBERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s+(.*)$").expect("valid regex"));

static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"));

static ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("valid regex"));

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid regex"));

const SPACER: &str = r#"<div class="md-spacer"></div>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListMode {
    None,
    Bullet,
    Numbered,
}

/// Accumulates output and tracks which list, if any, is open.
struct Renderer {
    out: String,
    list: ListMode,
}

impl Renderer {
    fn new() -> Self {
        Self {
            out: String::new(),
            list: ListMode::None,
        }
    }

    fn close_list(&mut self) {
        match self.list {
            ListMode::Bullet => self.out.push_str("</ul>"),
            ListMode::Numbered => self.out.push_str("</ol>"),
            ListMode::None => {}
        }
        self.list = ListMode::None;
    }

    fn open_list(&mut self, mode: ListMode) {
        if self.list == mode {
            return;
        }
        self.close_list();
        self.out.push_str(match mode {
            ListMode::Bullet => "<ul>",
            ListMode::Numbered => "<ol>",
            ListMode::None => "",
        });
        self.list = mode;
    }

    fn line(&mut self, line: &str) {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            self.close_list();
            self.out.push_str(SPACER);
            return;
        }

        if let Some(caps) = HEADING_RE.captures(trimmed) {
            self.close_list();
            let level = caps[1].len() + 1;
            self.out
                .push_str(&format!("<h{level}>{}</h{level}>", inline(&caps[2])));
            return;
        }

        if let Some(caps) = BULLET_RE.captures(trimmed) {
            self.open_list(ListMode::Bullet);
            self.out.push_str(&format!("<li>{}</li>", inline(&caps[1])));
            return;
        }

        if let Some(caps) = NUMBERED_RE.captures(trimmed) {
            self.open_list(ListMode::Numbered);
            self.out.push_str(&format!("<li>{}</li>", inline(&caps[1])));
            return;
        }

        if is_block_math(trimmed) {
            self.close_list();
            self.out.push_str(&format!(
                r#"<div class="math-block">{}</div>"#,
                escape_markup(trimmed)
            ));
            return;
        }

        if trimmed.contains("$$") {
            self.close_list();
            self.out.push_str(&format!(
                r#"<pre class="math-inline">{}</pre>"#,
                escape_markup(trimmed)
            ));
            return;
        }

        self.close_list();
        self.out.push_str(&format!("<p>{}</p>", inline(trimmed)));
    }

    fn finish(mut self) -> String {
        self.close_list();
        self.out
    }
}

/// A line that is exactly `$$` or fully wrapped as `$$...$$`.
fn is_block_math(line: &str) -> bool {
    line == "$$" || (line.len() >= 4 && line.starts_with("$$") && line.ends_with("$$"))
}

/// Escape text, then apply bold, italic and code-span substitutions in that order.
pub(crate) fn inline(text: &str) -> String {
    let escaped = escape_markup(text);
    let bold = BOLD_RE.replace_all(&escaped, "<strong>$1</strong>");
    let italic = ITALIC_RE.replace_all(&bold, "<em>$1</em>");
    CODE_RE.replace_all(&italic, "<code>$1</code>").into_owned()
}

/// Render cleaned narrative text to an HTML fragment.
pub(crate) fn render_markdown(text: &str) -> String {
    let mut renderer = Renderer::new();
    for line in text.lines() {
        renderer.line(line);
    }
    renderer.finish()
}
