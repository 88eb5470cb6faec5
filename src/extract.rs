//! Main-content extraction: HTML in, paragraph-separated plain text out.
//!
//! Noise elements are detached from the tree first, then the first content
//! region with text is flattened to markdown-like text (links and images kept
//! inline, no wrapping) and filtered line by line.

use std::sync::LazyLock;

use ego_tree::iter::Edge;
use ego_tree::NodeRef;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Tried in order; the first match holding any text wins.
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    ".content",
    ".post",
    ".entry-content",
    "#content",
    "#main",
    ".main-content",
    ".article-content",
];

/// Lines this short or shorter are flattening debris.
const MIN_LINE_CHARS: usize = 3;

static NOISE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script, style, nav, header, footer, aside").unwrap());
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());
static REGIONS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CONTENT_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});

/// Extract the substantive text of a page. Never fails: without a content
/// region the body is used, and without a body the whole document.
pub fn extract_main_content(html: &str, source_url: &str) -> String {
    let mut document = Html::parse_document(html);
    strip_noise(&mut document);

    let region = content_region(&document);
    let mut flat = Flattener::new(Url::parse(source_url).ok());
    flat.walk(*region);

    clean_lines(&flat.out)
}

fn strip_noise(document: &mut Html) {
    let ids: Vec<_> = document
        .root_element()
        .select(&NOISE)
        .map(|el| el.id())
        .collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn content_region(document: &Html) -> ElementRef<'_> {
    let root = document.root_element();
    for selector in REGIONS.iter() {
        if let Some(el) = root.select(selector).find(has_text) {
            return el;
        }
    }
    root.select(&BODY).next().unwrap_or(root)
}

fn has_text(el: &ElementRef) -> bool {
    el.text().any(|t| !t.trim().is_empty())
}

/// Trim every line, drop the short ones, separate survivors by a blank line.
fn clean_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > MIN_LINE_CHARS)
        .collect::<Vec<_>>()
        .join("\n\n")
}

// ── Flattening ──

/// Subtrees that never contribute text.
const SKIPPED: &[&str] = &[
    "head", "noscript", "template", "svg", "iframe", "object", "canvas",
];

const BLOCKS: &[&str] = &[
    "tr", "dt", "dd", "caption", "div", "section", "article", "main", "figure",
    "figcaption", "address", "form", "fieldset", "table", "dl", "center",
];

/// Elements whose text is collected separately and emitted on close.
enum Capture {
    Link(Option<String>),
    Wrap(&'static str),
    Quote,
}

/// Writer state set aside while a capture is open.
struct Frame {
    capture: Capture,
    out: String,
    lists: Vec<Option<usize>>,
    space_pending: bool,
    marker_open: bool,
}

/// Walks the tree through `traverse()` open/close edges, so nesting depth
/// costs heap, not stack.
struct Flattener {
    out: String,
    base: Option<Url>,
    lists: Vec<Option<usize>>,
    frames: Vec<Frame>,
    pre_depth: usize,
    skip_depth: usize,
    space_pending: bool,
    marker_open: bool,
}

impl Flattener {
    fn new(base: Option<Url>) -> Self {
        Self {
            out: String::new(),
            base,
            lists: Vec::new(),
            frames: Vec::new(),
            pre_depth: 0,
            skip_depth: 0,
            space_pending: false,
            marker_open: false,
        }
    }

    fn walk(&mut self, root: NodeRef<'_, Node>) {
        for edge in root.traverse() {
            match edge {
                Edge::Open(node) => match node.value() {
                    Node::Text(text) if self.skip_depth == 0 => self.push_text(text),
                    Node::Element(el) => self.open(el),
                    _ => {}
                },
                Edge::Close(node) => {
                    if let Node::Element(el) = node.value() {
                        self.close(el.name());
                    }
                }
            }
        }
    }

    fn open(&mut self, el: &Element) {
        let name = el.name();
        if SKIPPED.contains(&name) {
            self.skip_depth += 1;
            return;
        }
        if self.skip_depth > 0 {
            return;
        }
        match name {
            "br" => self.newline(),
            "hr" => {
                self.blank_line();
                self.push_word("* * *");
                self.blank_line();
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                self.blank_line();
                self.push_word(&"#".repeat(level));
                self.space_pending = true;
            }
            "p" => self.blank_line(),
            "ul" | "ol" => {
                let start = el.attr("start").and_then(|s| s.parse().ok()).unwrap_or(1);
                self.lists.push((name == "ol").then_some(start));
                self.ensure_newline();
            }
            "li" => {
                self.ensure_newline();
                let depth = self.lists.len().max(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let m = format!("{}. ", n);
                        *n += 1;
                        m
                    }
                    _ => "* ".to_string(),
                };
                self.out.push_str(&"  ".repeat(depth - 1));
                self.out.push_str(&marker);
                self.marker_open = true;
                self.space_pending = false;
            }
            "a" => {
                let href = el.attr("href").and_then(|h| self.resolve_link(h));
                self.begin(Capture::Link(href));
            }
            "img" => self.image(el),
            "strong" | "b" => self.begin(Capture::Wrap("**")),
            "em" | "i" => self.begin(Capture::Wrap("_")),
            "code" if self.pre_depth == 0 => self.begin(Capture::Wrap("`")),
            "pre" => {
                self.blank_line();
                self.pre_depth += 1;
            }
            "blockquote" => self.begin(Capture::Quote),
            "td" | "th" => {
                if !self.at_line_start() {
                    self.out.push_str(" | ");
                    self.space_pending = false;
                }
            }
            _ if BLOCKS.contains(&name) => self.ensure_newline(),
            _ => {}
        }
    }

    fn close(&mut self, name: &str) {
        if SKIPPED.contains(&name) {
            self.skip_depth -= 1;
            return;
        }
        if self.skip_depth > 0 {
            return;
        }
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" => self.blank_line(),
            "ul" | "ol" => {
                self.lists.pop();
                self.ensure_newline();
            }
            "li" => {
                self.marker_open = false;
                self.ensure_newline();
            }
            "a" | "strong" | "b" | "em" | "i" | "blockquote" => self.end(),
            "code" if self.pre_depth == 0 => self.end(),
            "pre" => {
                self.pre_depth -= 1;
                self.blank_line();
            }
            _ if BLOCKS.contains(&name) => self.ensure_newline(),
            _ => {}
        }
    }

    /// Start collecting into a fresh buffer.
    fn begin(&mut self, capture: Capture) {
        self.frames.push(Frame {
            capture,
            out: std::mem::take(&mut self.out),
            lists: std::mem::take(&mut self.lists),
            space_pending: std::mem::replace(&mut self.space_pending, false),
            marker_open: std::mem::replace(&mut self.marker_open, false),
        });
    }

    /// Restore the outer buffer and emit what was collected.
    fn end(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        let inner = std::mem::replace(&mut self.out, frame.out);
        self.lists = frame.lists;
        self.space_pending = frame.space_pending;
        self.marker_open = frame.marker_open;

        match frame.capture {
            Capture::Link(href) => {
                let text = collapse(&inner);
                match href {
                    Some(href) if !text.is_empty() => {
                        self.push_word(&format!("[{}]({})", text, href))
                    }
                    Some(href) => self.push_word(&format!("<{}>", href)),
                    None if !text.is_empty() => self.push_word(&text),
                    None => {}
                }
            }
            Capture::Wrap(mark) => {
                let text = collapse(&inner);
                if !text.is_empty() {
                    self.push_word(&format!("{mark}{text}{mark}"));
                }
            }
            Capture::Quote => {
                self.blank_line();
                for line in inner.lines().map(str::trim).filter(|l| !l.is_empty()) {
                    self.out.push_str("> ");
                    self.out.push_str(line);
                    self.out.push('\n');
                }
                self.blank_line();
            }
        }
    }

    fn image(&mut self, el: &Element) {
        let Some(src) = el.attr("src").and_then(|s| self.resolve(s)) else {
            return;
        };
        let alt = collapse(el.attr("alt").unwrap_or_default());
        self.push_word(&format!("![{}]({})", alt, src));
    }

    fn resolve_link(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.starts_with('#') || href.to_ascii_lowercase().starts_with("javascript:") {
            return None;
        }
        self.resolve(href)
    }

    fn resolve(&self, target: &str) -> Option<String> {
        let target = target.trim();
        if target.is_empty() {
            return None;
        }
        match &self.base {
            Some(base) => Some(
                base.join(target)
                    .map(String::from)
                    .unwrap_or_else(|_| target.to_string()),
            ),
            None => Some(target.to_string()),
        }
    }

    fn push_text(&mut self, raw: &str) {
        if self.pre_depth > 0 {
            self.out.push_str(raw);
            self.space_pending = false;
            return;
        }
        if raw.starts_with(char::is_whitespace) {
            self.space_pending = true;
        }
        for (i, word) in raw.split_whitespace().enumerate() {
            if i > 0 {
                self.space_pending = true;
            }
            self.push_word(word);
        }
        if raw.ends_with(char::is_whitespace) {
            self.space_pending = true;
        }
    }

    fn push_word(&mut self, word: &str) {
        if self.space_pending && !self.at_line_start() && !self.out.ends_with(' ') {
            self.out.push(' ');
        }
        self.out.push_str(word);
        self.space_pending = false;
        self.marker_open = false;
    }

    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.space_pending = false;
    }

    fn ensure_newline(&mut self) {
        if self.marker_open {
            return;
        }
        if !self.at_line_start() {
            self.out.push('\n');
        }
        self.space_pending = false;
    }

    fn blank_line(&mut self) {
        if self.marker_open {
            return;
        }
        if self.out.is_empty() {
            return;
        }
        while !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
        self.space_pending = false;
    }
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Tests ──
