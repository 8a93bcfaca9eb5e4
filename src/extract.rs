//! Pure HTML and text helpers: visible-text extraction, author's-note stripping,
//! blank-line collapsing, and FicHub chapter-block extraction. No I/O.

use crate::model::ChapterRecord;
use crate::scraper::ScraperError;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

/// `A/N:` through the end of its line. Notes spanning several lines keep everything after the first.
static AUTHORS_NOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"A/N:[^\n]*\n").expect("author's note pattern"));
static EXTRA_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("newline run pattern"));

/// Parse a CSS selector or return an error (avoids panics from Selector::parse).
pub fn parse_selector(sel: &str) -> Result<Selector, ScraperError> {
    Selector::parse(sel).map_err(|e| ScraperError::InvalidSelector {
        selector: sel.to_string(),
        reason: e.to_string(),
    })
}

/// Visible text under `root`: every non-empty text node, trimmed, one per line.
///
/// Elements for which `skip` returns true are left out along with their subtree,
/// as are `<script>` and `<style>`.
pub fn visible_text<F>(root: ElementRef<'_>, skip: F) -> String
where
    F: Fn(&ElementRef<'_>) -> bool,
{
    let mut lines = Vec::new();
    collect_lines(root, &skip, &mut lines);
    lines.join("\n")
}

fn collect_lines<'a, F>(el: ElementRef<'a>, skip: &F, lines: &mut Vec<&'a str>)
where
    F: Fn(&ElementRef<'_>) -> bool,
{
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                let t = text.trim();
                if !t.is_empty() {
                    lines.push(t);
                }
            }
            Node::Element(_) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                if matches!(child_el.value().name(), "script" | "style") || skip(&child_el) {
                    continue;
                }
                collect_lines(child_el, skip, lines);
            }
            _ => {}
        }
    }
}

/// Remove every `A/N:` line, including its newline.
pub fn strip_authors_note(text: &str) -> String {
    AUTHORS_NOTE.replace_all(text, "").into_owned()
}

/// Collapse runs of three or more newlines to exactly one blank line.
pub fn collapse_blank_lines(text: &str) -> String {
    EXTRA_NEWLINES.replace_all(text, "\n\n").into_owned()
}

/// Extract chapters from a FicHub HTML export.
///
/// Each `div` whose id starts with `chap_` is one chapter, taken in document order.
/// Chapter navigation blocks and the "contents" back-link are dropped before the
/// text is read.
pub fn extract_fichub_chapters(html: &str) -> Result<Vec<ChapterRecord>, ScraperError> {
    let doc = Html::parse_document(html);
    let chapter_sel = parse_selector(r#"div[id^="chap_"]"#)?;
    let title_sel = parse_selector("h2")?;
    let nav_sel = parse_selector("div.chapter_nav")?;
    let toc_link_sel = parse_selector(r##"a[href="#contents-list"]"##)?;

    let chapters = doc
        .select(&chapter_sel)
        .map(|chapter| {
            let title = chapter
                .select(&title_sel)
                .next()
                .map(|h| h.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
            let text = visible_text(chapter, |el| nav_sel.matches(el) || toc_link_sel.matches(el));
            let content = collapse_blank_lines(&strip_authors_note(&text));
            ChapterRecord { title, content }
        })
        .collect();
    Ok(chapters)
}
