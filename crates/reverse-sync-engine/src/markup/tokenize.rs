use quick_xml::Reader;
use quick_xml::events::Event;
use quick_xml::events::attributes::Attributes;

use crate::rope::Span;

/// One lexical unit of target markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    Text,
    Comment,
    Cdata,
    /// `<!DOCTYPE ...>` and `<?...?>`.
    Declaration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte span of the raw token in the input.
    pub span: Span,
}

/// Splits markup into tokens whose spans tile the input exactly.
///
/// Events come from a `quick_xml::Reader` that neither trims text nor checks
/// end names, so storage-format fragments with stray or missing end tags still
/// read through. Entity references are folded into the surrounding text.
/// Wherever the reader rejects the input (a stray `<`, a dangling `&`, a tag
/// with no closing `>`) the bytes up to the next `<` become text and reading
/// resumes there.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::new();
    let mut offset = 0usize;

    while offset < input.len() {
        let stopped_at = read_from(input, offset, &mut out);
        let Some(bad) = stopped_at else {
            break;
        };
        let from = bad + input[bad..].chars().next().map_or(1, char::len_utf8);
        let resume = input[from..].find('<').map_or(input.len(), |rel| from + rel);
        push_text(&mut out, Span::new(bad, resume));
        offset = resume;
    }
    out
}

/// Reads events starting at `offset` until the end of input or the first
/// error; returns the byte offset the error was raised from.
fn read_from(input: &str, offset: usize, out: &mut Vec<Token>) -> Option<usize> {
    let mut reader = Reader::from_str(&input[offset..]);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut last = 0usize;
    loop {
        let event = reader.read_event();
        let end = reader.buffer_position() as usize;
        let span = Span::new(offset + last, offset + end);
        let kind = match event {
            Ok(Event::Eof) => return None,
            Err(e) => {
                log::debug!("markup reader stopped at byte {}: {e}", offset + last);
                return Some(offset + last);
            }
            Ok(Event::Start(tag)) => start_tag(tag.name().as_ref(), tag.html_attributes(), false),
            Ok(Event::Empty(tag)) => start_tag(tag.name().as_ref(), tag.html_attributes(), true),
            Ok(Event::End(tag)) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                (!name.is_empty()).then_some(TokenKind::EndTag { name })
            }
            Ok(Event::CData(_)) => Some(TokenKind::Cdata),
            Ok(Event::Comment(_)) => Some(TokenKind::Comment),
            Ok(Event::Decl(_) | Event::PI(_) | Event::DocType(_)) => Some(TokenKind::Declaration),
            // text and entity references
            Ok(_) => None,
        };
        match kind {
            Some(kind) => out.push(Token { kind, span }),
            None => push_text(out, span),
        }
        last = end;
    }
}

fn start_tag(name: &[u8], attrs: Attributes, self_closing: bool) -> Option<TokenKind> {
    let name = String::from_utf8_lossy(name).into_owned();
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(TokenKind::StartTag {
        name,
        attrs: decode_attributes(attrs),
        self_closing,
    })
}

/// Attribute pairs with values entity-decoded. HTML-style bare and unquoted
/// attributes are accepted; malformed ones are dropped.
fn decode_attributes(mut attrs: Attributes) -> Vec<(String, String)> {
    attrs
        .with_checks(false)
        .filter_map(Result::ok)
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value);
            (key, html_escape::decode_html_entities(&raw).into_owned())
        })
        .collect()
}

/// Appends a text span, merging it into a directly preceding text token.
fn push_text(out: &mut Vec<Token>, span: Span) {
    if span.is_empty() {
        return;
    }
    match out.last_mut() {
        Some(last) if last.kind == TokenKind::Text && last.span.end == span.start => {
            last.span.end = span.end;
        }
        _ => out.push(Token {
            kind: TokenKind::Text,
            span,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn spans_tile_input() {
        let input = "a<p class=\"x\">b<br/>c</p><!-- n --><![CDATA[<x>]]> < d";
        let tokens = tokenize(input);
        let rebuilt: String = tokens.iter().map(|t| t.span.slice(input)).collect();
        assert_eq!(rebuilt, input);
        assert_eq!(tokens.last().map(|t| t.span.slice(input)), Some(" < d"));
    }

    #[test]
    fn start_tag_with_namespaced_attributes() {
        let toks = kinds(r#"<ac:structured-macro ac:name="info" ac:schema-version="1">"#);
        assert_eq!(
            toks,
            vec![TokenKind::StartTag {
                name: "ac:structured-macro".into(),
                attrs: vec![
                    ("ac:name".into(), "info".into()),
                    ("ac:schema-version".into(), "1".into())
                ],
                self_closing: false,
            }]
        );
    }

    #[test]
    fn self_closing_detection() {
        match &kinds(r#"<ac:emoticon ac:name="tick" />"#)[0] {
            TokenKind::StartTag { self_closing, .. } => assert!(self_closing),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn entities_stay_inside_one_text_token() {
        let input = "<p>a &amp; b&nbsp;c &#169;</p>";
        let tokens = tokenize(input);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].kind, TokenKind::Text);
        assert_eq!(tokens[1].span.slice(input), "a &amp; b&nbsp;c &#169;");
    }

    #[test]
    fn stray_end_tag_is_kept() {
        let input = "<p>stray</span> end</p>";
        let tokens = tokenize(input);
        let rebuilt: String = tokens.iter().map(|t| t.span.slice(input)).collect();
        assert_eq!(rebuilt, input);
        let span_end = tokens
            .iter()
            .find(|t| t.kind == TokenKind::EndTag { name: "span".into() })
            .map(|t| t.span.slice(input));
        assert_eq!(span_end, Some("</span>"));
    }

    #[test]
    fn unclosed_tag_is_text() {
        assert_eq!(kinds("<p class=\"x\""), vec![TokenKind::Text]);
    }

    #[test]
    fn bare_and_unquoted_attributes() {
        match &kinds("<input checked width=600 alt='a &amp; b'>")[0] {
            TokenKind::StartTag { attrs, .. } => assert_eq!(
                attrs,
                &vec![
                    ("checked".to_string(), "".to_string()),
                    ("width".to_string(), "600".to_string()),
                    ("alt".to_string(), "a & b".to_string())
                ]
            ),
            other => panic!("unexpected {other:?}"),
        }
    }
}
