//! Parsed element model used by the morph stage.
//!
//! An [`Element`] remembers the exact source text it was parsed from. As long
//! as none of its attributes has been removed, [`Element::to_html`] returns
//! that text verbatim, which is what makes string substitution into the
//! original template possible. Once modified, the start tag is re-rendered
//! from the remaining attributes and the literal remainder (children and end
//! tag) is appended unchanged.

use std::borrow::Cow;

/// A single attribute as written in the start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// `None` for valueless attributes (`<input disabled>`).
    pub value: Option<String>,
    quote: Option<char>,
}

impl Attribute {
    fn write_to(&self, out: &mut String) {
        out.push(' ');
        out.push_str(&self.name);
        let Some(value) = &self.value else {
            return;
        };
        let quote = self
            .quote
            .unwrap_or(if value.contains('"') { '\'' } else { '"' });
        out.push('=');
        out.push(quote);
        out.push_str(value);
        out.push(quote);
    }
}

/// An element node: tag name, ordered attributes, child elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
    source: String,
    rest: String,
    self_closing: bool,
    modified: bool,
    pub children: Vec<Element>,
}

impl Element {
    /// Build an element from its full source text (start tag through end tag).
    pub fn from_source(source: &str, children: Vec<Element>) -> Self {
        let end = start_tag_end(source);
        let (start_tag, rest) = source.split_at(end);

        let inner = start_tag.strip_prefix('<').unwrap_or(start_tag);
        let inner = inner.strip_suffix('>').unwrap_or(inner);
        let (inner, self_closing) = match inner.strip_suffix('/') {
            Some(inner) => (inner, true),
            None => (inner, false),
        };

        let name_len = inner
            .find(|c: char| c.is_whitespace() || c == '/')
            .unwrap_or(inner.len());
        let (name, attrs) = inner.split_at(name_len);

        Self {
            name: name.to_string(),
            attributes: parse_attributes(attrs),
            source: source.to_string(),
            rest: rest.to_string(),
            self_closing,
            modified: false,
            children,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Attribute value; valueless attributes yield `Some("")`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_deref().unwrap_or_default())
    }

    /// Remove every occurrence of `name`, returning the first one.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        let pos = self.attributes.iter().position(|a| a.name == name)?;
        let removed = self.attributes.remove(pos);
        self.attributes.retain(|a| a.name != name);
        self.modified = true;
        Some(removed)
    }

    /// Serialize the element with its current attributes.
    pub fn to_html(&self) -> Cow<'_, str> {
        if !self.modified {
            return Cow::Borrowed(&self.source);
        }

        let mut html = String::with_capacity(self.source.len());
        html.push('<');
        html.push_str(&self.name);
        for attr in &self.attributes {
            attr.write_to(&mut html);
        }
        if self.self_closing {
            html.push('/');
        }
        html.push('>');
        html.push_str(&self.rest);
        Cow::Owned(html)
    }
}

/// Byte offset just past the `>` closing the start tag.
///
/// Quotes only count when they open an attribute value, so `>` inside a
/// quoted value does not end the tag. Unterminated tags span the whole input.
fn start_tag_end(source: &str) -> usize {
    let mut quote: Option<char> = None;
    let mut after_eq = false;

    for (i, c) in source.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '>' => return i + 1,
            '"' | '\'' if after_eq => {
                quote = Some(c);
                after_eq = false;
            }
            '=' => after_eq = true,
            c if c.is_whitespace() => {}
            _ => after_eq = false,
        }
    }
    source.len()
}

// ============================================================================
// Element Spans
// ============================================================================

/// Byte offsets of one element inside a template.
///
/// `start..start_tag_end` is the start tag, `start_tag_end..inner_end` the
/// content and `inner_end..end` the end tag (empty when there is none).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TagSpan {
    pub start: usize,
    pub start_tag_end: usize,
    pub inner_end: usize,
    pub end: usize,
}

impl TagSpan {
    /// Locate the element whose start tag begins at `start`, looking no
    /// further than `limit`.
    ///
    /// The end tag is matched by name, ignoring case and nested elements of
    /// the same name. An element without one runs to `limit`. Returns `None`
    /// if there is no start tag at `start`.
    pub(crate) fn scan(source: &str, start: usize, limit: usize) -> Option<Self> {
        let region = source.get(start..limit)?;
        let name = tag_name(region)?;
        let start_tag_end = start + start_tag_end(region);
        let start_tag = &source[start..start_tag_end];

        if !start_tag.ends_with('>') || start_tag.ends_with("/>") || is_void_element(name) {
            return Some(Self {
                start,
                start_tag_end,
                inner_end: start_tag_end,
                end: start_tag_end,
            });
        }

        let (inner_end, end) =
            find_end_tag(source, name, start_tag_end, limit).unwrap_or((limit, limit));
        Some(Self {
            start,
            start_tag_end,
            inner_end,
            end,
        })
    }
}

/// Build the element tree of `source` from the offsets where start tags begin.
///
/// Offsets that do not begin a valid start tag, or that fall inside another
/// start or end tag, are ignored.
#[cfg_attr(not(feature = "tl"), allow(dead_code))]
pub(crate) fn build_elements(source: &str, starts: &[usize]) -> Vec<Element> {
    let mut starts = starts.to_vec();
    starts.sort_unstable();
    starts.dedup();

    let mut next = 0;
    collect_elements(source, &starts, &mut next, source.len())
}

fn collect_elements(
    source: &str,
    starts: &[usize],
    next: &mut usize,
    limit: usize,
) -> Vec<Element> {
    let mut elements = Vec::new();

    while let Some(&start) = starts.get(*next) {
        if start >= limit {
            break;
        }
        *next += 1;

        let Some(span) = TagSpan::scan(source, start, limit) else {
            continue;
        };
        skip_until(starts, next, span.start_tag_end);
        let children = collect_elements(source, starts, next, span.inner_end);
        skip_until(starts, next, span.end);

        elements.push(Element::from_source(&source[span.start..span.end], children));
    }

    elements
}

fn skip_until(starts: &[usize], next: &mut usize, offset: usize) {
    while starts.get(*next).is_some_and(|&s| s < offset) {
        *next += 1;
    }
}

/// Tag name at the start of `s` (`<name ...`), if it is a valid one.
fn tag_name(s: &str) -> Option<&str> {
    let rest = s.strip_prefix('<')?;
    let len = rest
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(rest.len());
    let name = &rest[..len];

    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'));
    valid.then_some(name)
}

/// Find the end tag closing `name`, scanning `from..limit`.
///
/// Returns the offsets of its `<` and of the byte after its `>`. Comments and
/// `<? ... ?>` blocks are skipped; `</name >` and `</NAME>` both match.
fn find_end_tag(source: &str, name: &str, from: usize, limit: usize) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut pos = from;

    while let Some(offset) = source[pos..limit].find('<') {
        let at = pos + offset;
        let rest = &source[at..limit];

        if rest.starts_with("<!--") {
            pos = rest.find("-->").map_or(limit, |i| at + i + 3);
            continue;
        }
        if rest.starts_with("<?") {
            pos = rest.find("?>").map_or(limit, |i| at + i + 2);
            continue;
        }

        if let Some(after) = rest.strip_prefix("</").and_then(|s| strip_name(s, name)) {
            let trimmed = after.trim_start();
            if trimmed.starts_with('>') {
                let end = limit - trimmed.len() + 1;
                if depth == 0 {
                    return Some((at, end));
                }
                depth -= 1;
                pos = end;
                continue;
            }
        } else if let Some(after) = strip_name(&rest[1..], name)
            && after.starts_with(|c: char| c.is_whitespace() || c == '>' || c == '/')
        {
            let tag_end = at + start_tag_end(rest);
            if source[at..tag_end].ends_with('>') && !source[at..tag_end].ends_with("/>") {
                depth += 1;
            }
            pos = tag_end;
            continue;
        }

        pos = at + 1;
    }

    None
}

/// Strip a case-insensitive `name` prefix.
fn strip_name<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    let head = s.get(..name.len())?;
    head.eq_ignore_ascii_case(name).then(|| &s[name.len()..])
}

/// Check if an HTML tag is a void element (never has an end tag).
#[inline]
fn is_void_element(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Parse HTML-style attributes from the text after the tag name.
///
/// Input: `if="@name" class='x' size=3 disabled`
/// Output: `if` = `@name`, `class` = `x`, `size` = `3`, `disabled` (no value)
fn parse_attributes(s: &str) -> Vec<Attribute> {
    let mut attrs = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            continue;
        }

        // Read attribute name
        let mut name = String::new();
        name.push(c);
        while let Some(next) = chars.next_if(|&n| n != '=' && !n.is_whitespace()) {
            name.push(next);
        }

        // Skip whitespace
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        if chars.next_if_eq(&'=').is_none() {
            // Boolean attribute (no value)
            attrs.push(Attribute {
                name,
                value: None,
                quote: None,
            });
            continue;
        }

        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        // Read value
        let mut value = String::new();
        let quote = chars.next_if(|&c| c == '"' || c == '\'');
        match quote {
            Some(q) => {
                for c in chars.by_ref() {
                    if c == q {
                        break;
                    }
                    value.push(c);
                }
            }
            None => {
                while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                    value.push(c);
                }
            }
        }

        attrs.push(Attribute {
            name,
            value: Some(value),
            quote,
        });
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr_pairs(elem: &Element) -> Vec<(&str, Option<&str>)> {
        elem.attributes()
            .iter()
            .map(|a| (a.name.as_str(), a.value.as_deref()))
            .collect()
    }

    #[test]
    fn test_parse_attributes() {
        let attrs = parse_attributes(r#" a="1" b='2' c=3 disabled"#);
        let pairs: Vec<_> = attrs
            .iter()
            .map(|a| (a.name.as_str(), a.value.as_deref()))
            .collect();
        assert_eq!(
            pairs,
            [
                ("a", Some("1")),
                ("b", Some("2")),
                ("c", Some("3")),
                ("disabled", None)
            ]
        );
    }

    #[test]
    fn test_from_source() {
        let elem = Element::from_source(r#"<div if="@name" class="x">#@name</div>"#, vec![]);
        assert_eq!(elem.name(), "div");
        assert_eq!(attr_pairs(&elem), [("if", Some("@name")), ("class", Some("x"))]);
        assert_eq!(elem.attribute("if"), Some("@name"));
        assert_eq!(elem.attribute("class"), Some("x"));
        assert_eq!(elem.attribute("for"), None);
    }

    #[test]
    fn test_unmodified_is_verbatim() {
        let src = r#"<p   if='a'  data-x=1>text</p>"#;
        let elem = Element::from_source(src, vec![]);
        assert_eq!(elem.to_html(), src);
    }

    #[test]
    fn test_remove_attribute_rerenders_start_tag() {
        let mut elem = Element::from_source(
            r#"<a href="/x" if="@ok">link <b>bold</b></a>"#,
            vec![],
        );
        let removed = elem.remove_attribute("if").unwrap();
        assert_eq!(removed.value.as_deref(), Some("@ok"));
        assert_eq!(elem.to_html(), r#"<a href="/x">link <b>bold</b></a>"#);
        assert!(elem.remove_attribute("if").is_none());
    }

    #[test]
    fn test_gt_inside_quoted_value() {
        let mut elem = Element::from_source(r#"<span if="a > b">x</span>"#, vec![]);
        assert_eq!(elem.attribute("if"), Some("a > b"));
        elem.remove_attribute("if");
        assert_eq!(elem.to_html(), "<span>x</span>");
    }

    #[test]
    fn test_self_closing() {
        let mut elem = Element::from_source(r#"<img src="a.png" if="@img"/>"#, vec![]);
        assert_eq!(elem.name(), "img");
        elem.remove_attribute("if");
        assert_eq!(elem.to_html(), r#"<img src="a.png"/>"#);
    }

    #[test]
    fn test_keeps_single_quotes() {
        let mut elem = Element::from_source(r#"<p title='say "hi"' if="x">y</p>"#, vec![]);
        elem.remove_attribute("if");
        assert_eq!(elem.to_html(), r#"<p title='say "hi"'>y</p>"#);
    }

    #[test]
    fn test_valueless_attribute() {
        let elem = Element::from_source("<input disabled if=@on>", vec![]);
        assert_eq!(elem.attribute("disabled"), Some(""));
        assert_eq!(elem.attribute("if"), Some("@on"));
    }

    fn span_text(source: &str) -> &str {
        let span = TagSpan::scan(source, 0, source.len()).unwrap();
        &source[span.start..span.end]
    }

    #[test]
    fn test_span_end_tag_variants() {
        assert_eq!(span_text("<div>x</div > tail"), "<div>x</div >");
        assert_eq!(span_text("<div>x</DIV>tail"), "<div>x</DIV>");
        assert_eq!(span_text("<div>a < b</div>"), "<div>a < b</div>");
        assert_eq!(span_text("<div><?r x = '</div>' ?>y</div>z"), "<div><?r x = '</div>' ?>y</div>");
        assert_eq!(span_text("<div><!-- </div> --></div>z"), "<div><!-- </div> --></div>");
    }

    #[test]
    fn test_span_nested_same_name() {
        let src = "<div if=\"a\"><div>in</div><Div/></div><div>next</div>";
        assert_eq!(span_text(src), "<div if=\"a\"><div>in</div><Div/></div>");

        // `<divx>` is a different element
        assert_eq!(span_text("<div><divx></div>"), "<div><divx></div>");
    }

    #[test]
    fn test_span_without_end_tag_runs_to_limit() {
        let src = "<p if=\"x\">unclosed <b>y</b>";
        let span = TagSpan::scan(src, 0, src.len()).unwrap();
        assert_eq!(span.inner_end, src.len());
        assert_eq!(span.end, src.len());

        let span = TagSpan::scan(src, 0, 14).unwrap();
        assert_eq!(&src[span.start_tag_end..span.end], "uncl");
    }

    #[test]
    fn test_span_void_and_invalid() {
        assert_eq!(span_text("<br if=\"x\">after"), "<br if=\"x\">");
        assert_eq!(span_text("<IMG src=a>after</IMG>"), "<IMG src=a>");
        assert_eq!(span_text("<x-item/>after"), "<x-item/>");
        assert!(TagSpan::scan("<?r x ?>", 0, 8).is_none());
        assert!(TagSpan::scan("< b", 0, 3).is_none());
        assert!(TagSpan::scan("text", 0, 4).is_none());
    }

    #[test]
    fn test_build_elements_from_loose_offsets() {
        let src = "<ul if=\"@a\"><li>one<li>two</ul><p>x</p>";
        // Every `<` offset, including end tags
        let starts: Vec<_> = src.match_indices('<').map(|(i, _)| i).collect();
        let elements = build_elements(src, &starts);

        assert_eq!(elements.len(), 2);
        let ul = &elements[0];
        assert_eq!(ul.to_html(), "<ul if=\"@a\"><li>one<li>two</ul>");
        // An unclosed `<li>` holds everything up to the end of its parent
        assert_eq!(ul.children.len(), 1);
        assert_eq!(ul.children[0].to_html(), "<li>one<li>two");
        assert_eq!(ul.children[0].children[0].to_html(), "<li>two");
        assert_eq!(elements[1].to_html(), "<p>x</p>");
    }
}
