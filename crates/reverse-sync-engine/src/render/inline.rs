use html_escape::{encode_double_quoted_attribute, encode_text};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};

use crate::text::patterns;

const BADGE_OPEN: &str = "<Badge";
const BADGE_CLOSE: &str = "</Badge>";

/// Renders block-format inline syntax as target inline markup.
///
/// Code spans, emphasis, links and `<br>` are converted; badges become
/// status macros; other inline tags pass through. Text that pulldown-cmark
/// reads as a block construct (a leading `1.` or `>`) is escaped verbatim.
pub fn render_inline(text: &str) -> String {
    let events: Vec<Event> = Parser::new(text).collect();
    if events.iter().any(is_block_start) {
        return encode_text(text).into_owned();
    }
    let events = strong_outside_em(events);

    let mut out = String::new();
    let mut badge: Option<Badge> = None;
    for event in events {
        if let Some(b) = badge.as_mut() {
            match &event {
                Event::InlineHtml(html) if html.trim() == BADGE_CLOSE => {
                    out.push_str(&b.render());
                    badge = None;
                }
                Event::Text(t) | Event::Code(t) => b.title.push_str(t),
                _ => {}
            }
            continue;
        }
        match event {
            Event::Text(t) => out.push_str(&encode_text(&t)),
            Event::Code(t) => {
                out.push_str("<code>");
                out.push_str(&encode_text(&t));
                out.push_str("</code>");
            }
            Event::Start(Tag::Strong) => out.push_str("<strong>"),
            Event::End(TagEnd::Strong) => out.push_str("</strong>"),
            Event::Start(Tag::Emphasis) => out.push_str("<em>"),
            Event::End(TagEnd::Emphasis) => out.push_str("</em>"),
            Event::Start(Tag::Link { dest_url, .. }) => {
                out.push_str(&format!(
                    "<a href=\"{}\">",
                    encode_double_quoted_attribute(&dest_url)
                ));
            }
            Event::End(TagEnd::Link) => out.push_str("</a>"),
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push_str("<br />"),
            Event::InlineHtml(html) | Event::Html(html) => {
                if html.starts_with(BADGE_OPEN) {
                    badge = Some(Badge::open(&html));
                } else if patterns::line_break().is_match(&html) {
                    out.push_str("<br />");
                } else {
                    out.push_str(&html);
                }
            }
            _ => {}
        }
    }
    out
}

/// Renders heading text: bold markers are dropped before inline rendering.
pub fn render_heading_inline(text: &str) -> String {
    let unbolded = patterns::bold().replace_all(text, "$1");
    render_inline(&unbolded)
}

fn is_block_start(event: &Event) -> bool {
    matches!(
        event,
        Event::Start(
            Tag::Heading { .. }
                | Tag::List(_)
                | Tag::Item
                | Tag::BlockQuote(_)
                | Tag::CodeBlock(_)
                | Tag::Table(_)
        ) | Event::Rule
    )
}

/// `***x***` parses as emphasis around strong; the target nests strong
/// outside emphasis.
fn strong_outside_em(mut events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut i = 0;
    while i + 1 < events.len() {
        let opens = matches!(events[i], Event::Start(Tag::Emphasis))
            && matches!(events[i + 1], Event::Start(Tag::Strong));
        if opens {
            let close = (i + 2..events.len().saturating_sub(1)).find(|&k| {
                matches!(events[k], Event::End(TagEnd::Strong))
                    && matches!(events[k + 1], Event::End(TagEnd::Emphasis))
            });
            if let Some(k) = close {
                events.swap(i, i + 1);
                events.swap(k, k + 1);
            }
        }
        i += 1;
    }
    events
}

struct Badge {
    colour: &'static str,
    title: String,
}

impl Badge {
    fn open(tag: &str) -> Self {
        let colour = patterns::parse_attributes(tag)
            .into_iter()
            .find(|(k, _)| k == "color")
            .map_or("Grey", |(_, v)| badge_colour(&v));
        Self {
            colour,
            title: String::new(),
        }
    }

    fn render(&self) -> String {
        status_macro(self.title.trim(), self.colour)
    }
}

/// Target colour name for a badge colour.
pub fn badge_colour(color: &str) -> &'static str {
    match color.trim().to_lowercase().as_str() {
        "green" => "Green",
        "blue" => "Blue",
        "red" => "Red",
        "yellow" => "Yellow",
        "purple" => "Purple",
        _ => "Grey",
    }
}

pub(crate) fn status_macro(title: &str, colour: &str) -> String {
    format!(
        "<ac:structured-macro ac:name=\"status\"><ac:parameter ac:name=\"title\">{}</ac:parameter><ac:parameter ac:name=\"colour\">{colour}</ac:parameter></ac:structured-macro>",
        encode_text(title)
    )
}
