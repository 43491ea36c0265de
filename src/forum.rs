//! Tolerant extraction of post text from phpBB topic pages.
//!
//! Works on raw markup with local scanning inside known elements rather than
//! building a DOM: find each post container, read its author from the profile
//! column, and flatten its `content` div into plain-text blocks.

use std::sync::LazyLock;

use anyhow::{bail, Result};
use regex::{Captures, Regex};

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<(/?)([a-zA-Z][a-zA-Z0-9]*)([^>]*)>").unwrap());
static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class\s*=\s*["']([^"']*)["']"#).unwrap());
static BR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static BLOCK_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(p|div|li|blockquote|h[1-6])\s*>").unwrap());
static ANY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap());

/// One forum post, flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Username from the profile column, if one was found.
    pub author: Option<String>,
    /// Text blocks, split on blank lines.
    pub blocks: Vec<String>,
}

/// An opening or closing tag located in the page.
struct Tag<'a> {
    start: usize,
    end: usize,
    closing: bool,
    name: &'a str,
    attrs: &'a str,
}

fn tags(html: &str) -> impl Iterator<Item = Tag<'_>> {
    TAG_RE.captures_iter(html).filter_map(|caps| {
        let whole = caps.get(0)?;
        Some(Tag {
            start: whole.start(),
            end: whole.end(),
            closing: !caps[1].is_empty(),
            name: caps.get(2).map_or("", |m| m.as_str()),
            attrs: caps.get(3).map_or("", |m| m.as_str()),
        })
    })
}

fn has_class(attrs: &str, class: &str) -> bool {
    CLASS_RE
        .captures(attrs)
        .is_some_and(|caps| caps[1].split_whitespace().any(|c| c == class))
}

fn is_post_container(tag: &Tag) -> bool {
    !tag.closing
        && tag.name.eq_ignore_ascii_case("div")
        && has_class(tag.attrs, "post")
        && has_class(tag.attrs, "has-profile")
}

/// Byte range of the inner markup of the element opened by `open`, found by
/// counting nested tags of the same name. `None` if it is never closed.
fn inner_range(html: &str, open: &Tag) -> Option<(usize, usize)> {
    let mut depth = 1usize;
    for tag in tags(&html[open.end..]) {
        if !tag.name.eq_ignore_ascii_case(open.name) {
            continue;
        }
        if tag.closing {
            depth -= 1;
            if depth == 0 {
                return Some((open.end, open.end + tag.start));
            }
        } else if !tag.attrs.trim_end().ends_with('/') {
            depth += 1;
        }
    }
    None
}

/// Posts on the page written by `author`, in page order.
///
/// A post whose profile names a different user is skipped; a post without a
/// readable username is kept. A post with no `content` div is skipped. An
/// unterminated `content` div yields an `Err` and ends the iteration.
pub fn posts_by<'a>(html: &'a str, author: &'a str) -> impl Iterator<Item = Result<Post>> + 'a {
    let starts: Vec<usize> = tags(html)
        .filter(is_post_container)
        .map(|t| t.start)
        .collect();

    let mut segments = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(html.len());
        segments.push(&html[start..end]);
    }

    let mut failed = false;
    segments.into_iter().filter_map(move |segment| {
        if failed {
            return None;
        }
        match parse_post(segment) {
            Ok(Some(post)) if post.author.as_deref().map_or(true, |a| a == author) => Some(Ok(post)),
            Ok(_) => None,
            Err(e) => {
                failed = true;
                Some(Err(e))
            }
        }
    })
}

fn parse_post(segment: &str) -> Result<Option<Post>> {
    let author = find_author(segment);

    let Some(open) = tags(segment)
        .find(|t| !t.closing && t.name.eq_ignore_ascii_case("div") && has_class(t.attrs, "content"))
    else {
        return Ok(None);
    };
    let Some((start, end)) = inner_range(segment, &open) else {
        bail!("unterminated content div at byte {}", open.start);
    };

    let text = markup_to_text(&segment[start..end]);
    let blocks = split_blocks(&text);
    Ok(Some(Post { author, blocks }))
}

/// Text of the `username` anchor inside the `postprofile` list, if present.
fn find_author(segment: &str) -> Option<String> {
    let profile = tags(segment)
        .find(|t| !t.closing && t.name.eq_ignore_ascii_case("dl") && has_class(t.attrs, "postprofile"))?;
    let (start, end) = inner_range(segment, &profile)?;
    let profile_html = &segment[start..end];

    let anchor = tags(profile_html)
        .find(|t| !t.closing && t.name.eq_ignore_ascii_case("a") && has_class(t.attrs, "username"))?;
    let (a_start, a_end) = inner_range(profile_html, &anchor)?;
    Some(markup_to_text(&profile_html[a_start..a_end]).trim().to_string())
}

/// Flatten markup to text: source newlines are plain whitespace, `<br>` and
/// block ends become newlines, other tags are dropped and entities decoded.
pub fn markup_to_text(markup: &str) -> String {
    let markup = markup.replace("\r\n", " ").replace('\n', " ");
    let text = BR_RE.replace_all(&markup, "\n");
    let text = BLOCK_END_RE.replace_all(&text, "\n");
    let text = ANY_TAG_RE.replace_all(&text, "");
    decode_entities(&text)
}

fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

/// Group trimmed lines into blocks separated by blank lines.
fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }
    blocks
}

// ── Tests ──
