//! HTML content splitting
//!
//! Classic narratives are free-form HTML. The splitter cuts them into
//! top-level blocks (paragraphs, headings, quotes, lists, images, frames and
//! rules) that map one-to-one onto story nodes.

use regex::Regex;

/// Text node flavour, serialized into `data.type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextStyle {
    Paragraph,
    Heading,
    Subheading,
    Quote,
    BulletList,
    NumberedList,
}

impl TextStyle {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading => "h2",
            Self::Subheading => "h3",
            Self::Quote => "quote",
            Self::BulletList => "bullet-list",
            Self::NumberedList => "numbered-list",
        }
    }
}

/// One top-level piece of a narrative
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ContentBlock {
    Text {
        style: TextStyle,
        html: String,
        alignment: &'static str,
    },
    Image {
        src: String,
        alt: Option<String>,
        caption: Option<String>,
    },
    Embed {
        url: Option<String>,
        frame: String,
    },
    Separator,
}

/// Regex-driven block splitter
#[derive(Debug, Clone)]
pub(crate) struct HtmlSplitter {
    open: Regex,
    attr: Regex,
    align: Regex,
    tag: Regex,
}

impl HtmlSplitter {
    pub(crate) fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            open: Regex::new(r"(?is)<(p|h[1-6]|blockquote|ul|ol|iframe|img|hr|figure|div)\b([^>]*)>")?,
            attr: Regex::new(r#"(?is)([a-z][a-z0-9_:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)?,
            align: Regex::new(r"(?i)text-align\s*:\s*(left|center|right|justify)")?,
            tag: Regex::new(r"(?s)<[^>]*>")?,
        })
    }

    /// Split `html` into blocks, in document order
    pub(crate) fn split(&self, html: &str) -> Vec<ContentBlock> {
        let lower = html.to_ascii_lowercase();
        let mut blocks = Vec::new();
        self.split_into(html, &lower, &mut blocks);
        blocks
    }

    fn split_into(&self, html: &str, lower: &str, blocks: &mut Vec<ContentBlock>) {
        let mut cursor = 0;
        while let Some(caps) = self.open.captures_at(html, cursor) {
            let Some(whole) = caps.get(0) else { break };
            let name = caps.get(1).map_or("", |m| m.as_str()).to_ascii_lowercase();
            let attrs = caps.get(2).map_or("", |m| m.as_str());

            self.push_loose_text(&html[cursor..whole.start()], blocks);

            if name == "hr" {
                blocks.push(ContentBlock::Separator);
                cursor = whole.end();
                continue;
            }
            if name == "img" {
                blocks.extend(self.image(attrs, None));
                cursor = whole.end();
                continue;
            }

            let (inner_end, after) = find_close(lower, whole.end(), &name).unwrap_or((html.len(), html.len()));
            let inner = &html[whole.end()..inner_end];
            let alignment = self.alignment(attrs);

            match name.as_str() {
                "iframe" => blocks.push(ContentBlock::Embed {
                    url: self.attr(attrs, "src"),
                    frame: html[whole.start()..after].to_string(),
                }),
                "div" => self.split_into(inner, &lower[whole.end()..inner_end], blocks),
                "figure" => {
                    let caption = self.figcaption(inner);
                    match self.first_image(inner, caption) {
                        Some(image) => blocks.push(image),
                        None => self.split_into(inner, &lower[whole.end()..inner_end], blocks),
                    }
                }
                "p" => {
                    if self.plain_text(inner).is_empty() {
                        blocks.extend(self.first_image(inner, None));
                    } else {
                        blocks.push(text(TextStyle::Paragraph, inner, alignment));
                    }
                }
                "h1" | "h2" => blocks.push(text(TextStyle::Heading, inner, alignment)),
                "blockquote" => blocks.push(text(TextStyle::Quote, inner, alignment)),
                "ul" => blocks.push(text(TextStyle::BulletList, inner, alignment)),
                "ol" => blocks.push(text(TextStyle::NumberedList, inner, alignment)),
                _ => blocks.push(text(TextStyle::Subheading, inner, alignment)),
            }
            cursor = after;
        }
        self.push_loose_text(&html[cursor..], blocks);
    }

    /// Tag-free, entity-decoded, whitespace-collapsed text
    pub(crate) fn plain_text(&self, html: &str) -> String {
        let stripped = self.tag.replace_all(html, " ");
        let decoded = stripped
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&");
        decoded.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn push_loose_text(&self, fragment: &str, blocks: &mut Vec<ContentBlock>) {
        if !self.plain_text(fragment).is_empty() {
            blocks.push(text(TextStyle::Paragraph, fragment, "start"));
        }
    }

    fn attr(&self, attrs: &str, name: &str) -> Option<String> {
        self.attr
            .captures_iter(attrs)
            .find(|caps| caps.get(1).is_some_and(|m| m.as_str().eq_ignore_ascii_case(name)))
            .and_then(|caps| caps.get(2).or_else(|| caps.get(3)))
            .map(|m| m.as_str().trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn alignment(&self, attrs: &str) -> &'static str {
        let Some(style) = self.attr(attrs, "style") else {
            return "start";
        };
        match self
            .align
            .captures(&style)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_ascii_lowercase())
            .as_deref()
        {
            Some("center") => "center",
            Some("right") => "end",
            Some("justify") => "justify",
            _ => "start",
        }
    }

    fn image(&self, attrs: &str, caption: Option<String>) -> Option<ContentBlock> {
        let src = self.attr(attrs, "src")?;
        Some(ContentBlock::Image {
            src,
            alt: self.attr(attrs, "alt"),
            caption,
        })
    }

    fn first_image(&self, html: &str, caption: Option<String>) -> Option<ContentBlock> {
        self.open
            .captures_iter(html)
            .find(|caps| caps.get(1).is_some_and(|m| m.as_str().eq_ignore_ascii_case("img")))
            .and_then(|caps| self.image(caps.get(2).map_or("", |m| m.as_str()), caption))
    }

    fn figcaption(&self, html: &str) -> Option<String> {
        let lower = html.to_ascii_lowercase();
        let start = find_open(&lower, 0, "figcaption")?;
        let body = lower[start..].find('>')? + start + 1;
        let (end, _) = find_close(&lower, body, "figcaption")?;
        Some(self.plain_text(&html[body..end])).filter(|c| !c.is_empty())
    }
}

fn text(style: TextStyle, html: &str, alignment: &'static str) -> ContentBlock {
    ContentBlock::Text {
        style,
        html: html.trim().to_string(),
        alignment,
    }
}

/// Position of the next `<name` opening tag at or after `from`
fn find_open(lower: &str, from: usize, name: &str) -> Option<usize> {
    let needle = format!("<{name}");
    let mut pos = from;
    while let Some(found) = lower.get(pos..)?.find(&needle) {
        let at = pos + found;
        let next = lower.as_bytes().get(at + needle.len()).copied();
        if matches!(next, None | Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r')) {
            return Some(at);
        }
        pos = at + needle.len();
    }
    None
}

/// End of the element body and the position after its closing tag
///
/// Nested elements of the same name are balanced.
fn find_close(lower: &str, from: usize, name: &str) -> Option<(usize, usize)> {
    let closing = format!("</{name}");
    let mut depth = 1usize;
    let mut pos = from;
    loop {
        let close = pos + lower.get(pos..)?.find(&closing)?;
        match find_open(lower, pos, name).filter(|open| *open < close) {
            Some(open) => {
                depth += 1;
                pos = open + name.len() + 1;
            }
            None => {
                depth -= 1;
                let after = lower[close..].find('>').map_or(lower.len(), |i| close + i + 1);
                if depth == 0 {
                    return Some((close, after));
                }
                pos = after;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn splitter() -> HtmlSplitter {
        HtmlSplitter::new().unwrap()
    }

    fn styles(blocks: &[ContentBlock]) -> Vec<&'static str> {
        blocks
            .iter()
            .map(|b| match b {
                ContentBlock::Text { style, .. } => style.as_str(),
                ContentBlock::Image { .. } => "image",
                ContentBlock::Embed { .. } => "embed",
                ContentBlock::Separator => "separator",
            })
            .collect()
    }

    #[test]
    fn test_splits_common_blocks() {
        let html = r#"<h1>Title</h1><p>One</p><ul><li>a</li></ul><hr/><blockquote>q</blockquote><ol><li>b</li></ol><h4>Small</h4>"#;
        let blocks = splitter().split(html);
        assert_eq!(
            styles(&blocks),
            vec!["h2", "paragraph", "bullet-list", "separator", "quote", "numbered-list", "h3"]
        );
        assert_eq!(
            blocks[2],
            ContentBlock::Text {
                style: TextStyle::BulletList,
                html: "<li>a</li>".into(),
                alignment: "start"
            }
        );
    }

    #[test]
    fn test_alignment_from_style() {
        let blocks = splitter().split(r#"<p style="text-align: center;">Hi</p><p style='TEXT-ALIGN:right'>x</p>"#);
        let aligns: Vec<_> = blocks
            .iter()
            .map(|b| match b {
                ContentBlock::Text { alignment, .. } => *alignment,
                _ => "",
            })
            .collect();
        assert_eq!(aligns, vec!["center", "end"]);
    }

    #[test]
    fn test_image_only_paragraph_becomes_image() {
        let blocks = splitter().split(r#"<p><img src="https://a.test/x.png" alt="X"></p><p>&nbsp;</p>"#);
        assert_eq!(
            blocks,
            vec![ContentBlock::Image {
                src: "https://a.test/x.png".into(),
                alt: Some("X".into()),
                caption: None
            }]
        );
    }

    #[test]
    fn test_figure_with_caption() {
        let blocks = splitter()
            .split(r#"<figure><img src="//a.test/y.jpg"><figcaption>The <b>view</b></figcaption></figure>"#);
        assert_eq!(
            blocks,
            vec![ContentBlock::Image {
                src: "//a.test/y.jpg".into(),
                alt: None,
                caption: Some("The view".into())
            }]
        );
    }

    #[test]
    fn test_iframe_becomes_embed() {
        let html = r#"<iframe width="100" src="https://player.test/v/1"></iframe>"#;
        let blocks = splitter().split(html);
        assert_eq!(
            blocks,
            vec![ContentBlock::Embed {
                url: Some("https://player.test/v/1".into()),
                frame: html.into()
            }]
        );
    }

    #[test]
    fn test_nested_divs_are_flattened() {
        let blocks = splitter().split("<div><div><p>a</p></div><p>b</p></div>tail");
        assert_eq!(styles(&blocks), vec!["paragraph", "paragraph", "paragraph"]);
        assert!(matches!(&blocks[2], ContentBlock::Text { html, .. } if html == "tail"));
    }

    #[test]
    fn test_pre_is_not_a_paragraph() {
        let blocks = splitter().split("<pre>code</pre>");
        assert_eq!(styles(&blocks), vec!["paragraph"]);
    }

    #[test]
    fn test_unclosed_block_runs_to_end() {
        let blocks = splitter().split("<p>open ended");
        assert!(matches!(&blocks[..], [ContentBlock::Text { html, .. }] if html == "open ended"));
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            splitter().plain_text("<p>Fish &amp; <i>chips</i>&nbsp;</p>\n<br>"),
            "Fish & chips"
        );
        assert!(splitter().split("  <br/>  ").is_empty());
    }
}
