use scraper::node::Text;
use scraper::{ElementRef, Html};

/// Heading level given to bold-only lines; below every real heading.
pub const EMPHASIS_LEVEL: u8 = 7;

/// One flattened line of a guide page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        text: String,
        id: Option<String>,
    },
    /// A line made only of bold text, used by guides as a pseudo-heading.
    Emphasis(String),
    Item(String),
    Text(String),
}

impl Block {
    pub fn text(&self) -> &str {
        match self {
            Block::Heading { text, .. } => text,
            Block::Emphasis(t) | Block::Item(t) | Block::Text(t) => t,
        }
    }

    /// Heading level for headings and pseudo-headings, `None` for content lines.
    pub fn level(&self) -> Option<u8> {
        match self {
            Block::Heading { level, .. } => Some(*level),
            Block::Emphasis(_) => Some(EMPHASIS_LEVEL),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Block::Heading { id, .. } => id.as_deref(),
            _ => None,
        }
    }
}

/// Page chrome that never carries guide content.
const SKIPPED: &[&str] = &[
    "head", "script", "style", "noscript", "nav", "footer", "aside", "svg", "iframe", "form",
    "button", "template",
];

/// Elements that end the current line before and after their content.
const BREAKING: &[&str] = &[
    "p", "div", "ul", "ol", "dl", "dt", "dd", "table", "thead", "tbody", "tr", "td", "th",
    "section", "article", "main", "header", "blockquote", "figure", "figcaption", "hr",
    "center", "details", "summary",
];

/// Flatten an HTML page into an ordered sequence of lines with heading levels.
pub fn flatten_document(html: &str) -> Vec<Block> {
    let document = Html::parse_document(html);
    let mut flattener = Flattener::default();
    flattener.element(document.root_element(), false);
    flattener.flush();
    flattener.blocks
}

#[derive(Default)]
struct Flattener {
    blocks: Vec<Block>,
    line: String,
    bold_chars: usize,
    plain_chars: usize,
    item_depth: usize,
}

impl Flattener {
    fn element(&mut self, el: ElementRef<'_>, bold: bool) {
        let name = el.value().name();
        if SKIPPED.contains(&name) {
            return;
        }

        if let Some(level) = heading_level(name) {
            self.flush();
            let text = collapse(&el.text().collect::<String>());
            if !text.is_empty() {
                let id = el
                    .descendants()
                    .filter_map(ElementRef::wrap)
                    .find_map(|e| e.value().attr("id"))
                    .map(str::to_string);
                self.blocks.push(Block::Heading { level, text, id });
            }
            return;
        }

        match name {
            "br" => self.flush(),
            "pre" | "textarea" => {
                self.flush();
                let raw = el.text().collect::<String>();
                for line in raw.lines().map(collapse).filter(|l| !l.is_empty()) {
                    self.blocks.push(Block::Text(line));
                }
            }
            "li" => {
                self.flush();
                self.item_depth += 1;
                self.children(el, bold);
                self.flush();
                self.item_depth -= 1;
            }
            "strong" | "b" => self.children(el, true),
            _ if BREAKING.contains(&name) => {
                self.flush();
                self.children(el, bold);
                self.flush();
            }
            _ => self.children(el, bold),
        }
    }

    fn children(&mut self, el: ElementRef<'_>, bold: bool) {
        for node in el.children() {
            if let Some(child) = ElementRef::wrap(node) {
                self.element(child, bold);
            } else if let Some(text) = node.value().as_text() {
                self.text(text, bold);
            }
        }
    }

    fn text(&mut self, text: &Text, bold: bool) {
        let visible = text.text.chars().filter(|c| !c.is_whitespace()).count();
        if bold {
            self.bold_chars += visible;
        } else {
            self.plain_chars += visible;
        }
        self.line.push_str(&text.text);
    }

    fn flush(&mut self) {
        let text = collapse(&self.line);
        let only_bold = self.plain_chars == 0 && self.bold_chars > 0;
        self.line.clear();
        self.bold_chars = 0;
        self.plain_chars = 0;
        if text.is_empty() {
            return;
        }
        let block = if self.item_depth > 0 {
            Block::Item(text)
        } else if only_bold {
            Block::Emphasis(text)
        } else {
            Block::Text(text)
        };
        self.blocks.push(block);
    }
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
