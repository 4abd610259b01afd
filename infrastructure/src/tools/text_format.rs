//! Markdown, HTML and plain-text conversions for the text editor
//!
//! These are line-oriented regex rewrites covering the subset of markup
//! comic lettering needs (headings, emphasis, lists, links, images). They
//! are not a general-purpose markdown or HTML parser.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

macro_rules! regex {
    ($pattern:literal) => {{
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new($pattern).expect("static regex is valid"))
    }};
}

/// Text formats understood by `text.load`, `text.format` and `text.save`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextFormat {
    Plain,
    Markdown,
    Html,
    Rich,
}

impl TextFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "plain" | "text" => Some(Self::Plain),
            "markdown" | "md" => Some(Self::Markdown),
            "html" => Some(Self::Html),
            "rich" => Some(Self::Rich),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Rich => "rich",
        }
    }
}

/// Default lettering style of the text editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f64,
    pub text_color: String,
    pub background_color: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Comic Sans MS".to_string(),
            font_size: 16.0,
            text_color: "#000000".to_string(),
            background_color: "transparent".to_string(),
        }
    }
}

/// Partial style update, as sent by `text.setStyle` and `text.format` (rich).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylePatch {
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub text_color: Option<String>,
    pub background_color: Option<String>,
}

impl StylePatch {
    pub fn is_empty(&self) -> bool {
        self.font_family.is_none()
            && self.font_size.is_none()
            && self.text_color.is_none()
            && self.background_color.is_none()
    }

    pub fn apply_to(&self, style: &mut TextStyle) {
        if let Some(family) = &self.font_family {
            style.font_family = family.clone();
        }
        if let Some(size) = self.font_size {
            style.font_size = size;
        }
        if let Some(color) = &self.text_color {
            style.text_color = color.clone();
        }
        if let Some(color) = &self.background_color {
            style.background_color = color.clone();
        }
    }

    /// Inline CSS declarations, in a stable order.
    pub fn css(&self) -> String {
        let mut decls = Vec::new();
        if let Some(family) = &self.font_family {
            decls.push(format!("font-family: {};", family));
        }
        if let Some(size) = self.font_size {
            decls.push(format!("font-size: {}px;", size));
        }
        if let Some(color) = &self.text_color {
            decls.push(format!("color: {};", color));
        }
        if let Some(color) = &self.background_color {
            decls.push(format!("background-color: {};", color));
        }
        decls.join(" ")
    }
}

pub fn contains_markup(text: &str) -> bool {
    regex!(r"<[^>]+>").is_match(text)
}

/// Escape the characters HTML treats specially.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Remove every tag, keeping the text between them.
pub fn strip_tags(html: &str) -> String {
    regex!(r"<[^>]+>").replace_all(html, "").into_owned()
}

pub fn markdown_to_html(markdown: &str) -> String {
    let mut html = markdown.to_string();
    let rules: [(&Regex, &str); 12] = [
        (regex!(r"(?m)^### (.+)$"), "<h3>$1</h3>"),
        (regex!(r"(?m)^## (.+)$"), "<h2>$1</h2>"),
        (regex!(r"(?m)^# (.+)$"), "<h1>$1</h1>"),
        (regex!(r"\*\*(.+?)\*\*"), "<strong>$1</strong>"),
        (regex!(r"__(.+?)__"), "<strong>$1</strong>"),
        (regex!(r"(?m)^\* (.+)$"), "<ul><li>$1</li></ul>"),
        (regex!(r"\*(.+?)\*"), "<em>$1</em>"),
        (regex!(r"\b_(.+?)_\b"), "<em>$1</em>"),
        (regex!(r"(?m)^\d+\. (.+)$"), "<ol><li>$1</li></ol>"),
        (regex!(r"!\[(.+?)\]\((.+?)\)"), r#"<img src="$2" alt="$1">"#),
        (regex!(r"\[(.+?)\]\((.+?)\)"), r#"<a href="$2">$1</a>"#),
        (regex!(r"</ul>\n?<ul>"), ""),
    ];
    for (re, replacement) in rules {
        html = re.replace_all(&html, replacement).into_owned();
    }
    html = regex!(r"</ol>\n?<ol>").replace_all(&html, "").into_owned();

    // Lines not opening with a block element become paragraphs
    let block = regex!(r"^<(?:h[1-6]|ul|ol|p|div|img)\b");
    html.lines()
        .map(|line| {
            if line.trim().is_empty() || block.is_match(line) {
                line.to_string()
            } else {
                format!("<p>{}</p>", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn html_to_markdown(html: &str) -> String {
    let mut md = html.to_string();
    let rules: [(&Regex, &str); 9] = [
        (regex!(r"(?is)<h1[^>]*>(.*?)</h1>"), "# $1\n\n"),
        (regex!(r"(?is)<h2[^>]*>(.*?)</h2>"), "## $1\n\n"),
        (regex!(r"(?is)<h3[^>]*>(.*?)</h3>"), "### $1\n\n"),
        (regex!(r"(?is)<strong[^>]*>(.*?)</strong>"), "**$1**"),
        (regex!(r"(?is)<b(?:\s[^>]*)?>(.*?)</b>"), "**$1**"),
        (regex!(r"(?is)<em[^>]*>(.*?)</em>"), "*$1*"),
        (regex!(r"(?is)<i(?:\s[^>]*)?>(.*?)</i>"), "*$1*"),
        (regex!(r#"(?is)<a[^>]*href="(.*?)"[^>]*>(.*?)</a>"#), "[$2]($1)"),
        (regex!(r#"(?is)<img[^>]*src="(.*?)"[^>]*alt="(.*?)"[^>]*>"#), "![$2]($1)"),
    ];
    for (re, replacement) in rules {
        md = re.replace_all(&md, replacement).into_owned();
    }
    md = regex!(r#"(?is)<img[^>]*alt="(.*?)"[^>]*src="(.*?)"[^>]*>"#)
        .replace_all(&md, "![$1]($2)")
        .into_owned();

    md = regex!(r"(?is)<ul[^>]*>(.*?)</ul>")
        .replace_all(&md, |caps: &Captures| {
            regex!(r"(?is)<li[^>]*>(.*?)</li>")
                .replace_all(&caps[1], "* $1\n")
                .into_owned()
        })
        .into_owned();
    md = regex!(r"(?is)<ol[^>]*>(.*?)</ol>")
        .replace_all(&md, |caps: &Captures| {
            let mut index = 0;
            regex!(r"(?is)<li[^>]*>(.*?)</li>")
                .replace_all(&caps[1], |item: &Captures| {
                    index += 1;
                    format!("{}. {}\n", index, &item[1])
                })
                .into_owned()
        })
        .into_owned();

    md = regex!(r"(?is)<p[^>]*>(.*?)</p>")
        .replace_all(&md, "$1\n\n")
        .into_owned();
    md = strip_tags(&md);
    regex!(r"\n{3,}")
        .replace_all(&md, "\n\n")
        .trim()
        .to_string()
}

/// Wrap text in styled containers; bare text is put in a paragraph first.
pub fn rich_wrap(text: &str, style: &StylePatch) -> String {
    let mut html = if contains_markup(text) {
        text.to_string()
    } else {
        format!("<p>{}</p>", text)
    };
    if let Some(family) = &style.font_family {
        html = format!(r#"<div style="font-family: {};">{}</div>"#, family, html);
    }
    if let Some(size) = style.font_size {
        html = format!(r#"<div style="font-size: {}px;">{}</div>"#, size, html);
    }
    if let Some(color) = &style.text_color {
        html = format!(r#"<div style="color: {};">{}</div>"#, color, html);
    }
    if let Some(color) = &style.background_color {
        html = format!(r#"<div style="background-color: {};">{}</div>"#, color, html);
    }
    html
}

/// Convert `text` into `format` for `text.format`.
pub fn apply_format(format: TextFormat, text: &str, options: &StylePatch) -> String {
    match format {
        TextFormat::Plain | TextFormat::Html => text.to_string(),
        TextFormat::Markdown => markdown_to_html(text),
        TextFormat::Rich => rich_wrap(text, options),
    }
}
