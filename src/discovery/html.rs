//! Small scraper helpers shared by page extraction and source parsers

use scraper::{ElementRef, Selector};
use url::Url;

/// Parses a CSS selector; None for an invalid selector
pub(crate) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Visible text of an element with whitespace collapsed
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first descendant matching `css`
pub(crate) fn first_text(element: &ElementRef<'_>, css: &str) -> Option<String> {
    let sel = selector(css)?;
    element
        .select(&sel)
        .next()
        .map(|e| element_text(&e))
        .filter(|s| !s.is_empty())
}

/// Text lines of an element: each text node trimmed, blank ones dropped
pub(crate) fn text_lines(element: &ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect()
}

/// Absolute `src` of an image, if it resolves to an HTTP(S) URL
pub(crate) fn image_src(element: &ElementRef<'_>, base: &Url) -> Option<String> {
    let src = element
        .value()
        .attr("src")
        .or_else(|| element.value().attr("data-src"))?;
    crate::url::resolve_link(src, base).map(String::from)
}
