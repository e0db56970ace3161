//! Page parsers for external sources
//!
//! Each descriptor carries a `SourceParser` chosen when the registry is
//! built. Layout-specific variants know where a given site keeps its name,
//! specifications and photos; `Generic` reads any label/value structure.

use crate::discovery::html::{element_text, first_text, image_src, selector};
use crate::discovery::labels;
use crate::search::{Attribute, CandidateAttributeSet};
use crate::sources::SourceDescriptor;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::OnceLock;
use url::Url;

/// Upper bound on photos read from one page
const MAX_PAGE_PHOTOS: usize = 5;

fn vessel_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)vessel|ship").unwrap())
}

/// Layout family of a source page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceParser {
    /// `h1.vessel-name`, two-cell table rows, `div.vessel-position`, vessel images
    DetailTable,

    /// `div.vessel-info` with `div.spec-item` label/value spans and a photo gallery
    SpecList,

    /// `div.vessel-details` with `div.detail-row` label/value spans
    DetailRows,

    /// Photo search results in `div.photo-item` or `div.image-container`
    PhotoGallery,

    /// Any label/value tables, definition lists or spans, with `h1` as the name
    Generic,
}

impl SourceParser {
    /// Parses a fetched page into a candidate tagged with the source's name
    ///
    /// An unparseable page yields an empty candidate, which the caller
    /// records as a failed attempt.
    pub fn parse(&self, html: &str, page_url: &Url, source: &SourceDescriptor) -> CandidateAttributeSet {
        let document = Html::parse_document(html);
        let root = document.root_element();
        let mut candidate = CandidateAttributeSet::new(&source.name, source.reliability_prior);

        match self {
            Self::DetailTable => parse_detail_table(&root, page_url, &mut candidate),
            Self::SpecList => parse_spec_list(&root, page_url, &mut candidate),
            Self::DetailRows => parse_detail_rows(&root, &mut candidate),
            Self::PhotoGallery => parse_photo_gallery(&root, page_url, &mut candidate),
            Self::Generic => parse_generic(&root, &mut candidate),
        }

        candidate.truncate_list(Attribute::Photos, MAX_PAGE_PHOTOS);
        candidate
    }
}

fn parse_detail_table(root: &ElementRef<'_>, page_url: &Url, candidate: &mut CandidateAttributeSet) {
    if let Some(name) = first_text(root, "h1.vessel-name") {
        candidate.set_text(Attribute::VesselName, name);
    }

    read_table_rows(root, candidate);

    if let Some(position) = first_text(root, "div.vessel-position") {
        candidate.set_text(Attribute::CurrentLocation, position);
    }

    if let Some(img_sel) = selector("img[src]") {
        for img in root.select(&img_sel) {
            let src = img.value().attr("src").unwrap_or_default();
            if !vessel_image_re().is_match(src) {
                continue;
            }
            if let Some(photo) = image_src(&img, page_url) {
                candidate.push_item(Attribute::Photos, photo);
            }
        }
    }
}

fn parse_spec_list(root: &ElementRef<'_>, page_url: &Url, candidate: &mut CandidateAttributeSet) {
    if let Some(info_sel) = selector("div.vessel-info") {
        if let Some(info) = root.select(&info_sel).next() {
            if let Some(name) = first_text(&info, "h1") {
                candidate.set_text(Attribute::VesselName, name);
            }
            read_label_value_spans(&info, "div.spec-item", candidate);
        }
    }

    collect_images(root, "div.photo-gallery img", page_url, candidate);
}

fn parse_detail_rows(root: &ElementRef<'_>, candidate: &mut CandidateAttributeSet) {
    if let Some(details_sel) = selector("div.vessel-details") {
        for details in root.select(&details_sel) {
            read_label_value_spans(&details, "div.detail-row", candidate);
        }
    }
}

fn parse_photo_gallery(root: &ElementRef<'_>, page_url: &Url, candidate: &mut CandidateAttributeSet) {
    collect_images(
        root,
        "div.photo-item img, div.image-container img",
        page_url,
        candidate,
    );
}

fn parse_generic(root: &ElementRef<'_>, candidate: &mut CandidateAttributeSet) {
    read_table_rows(root, candidate);
    read_definition_list(root, candidate);
    read_label_value_spans(root, "*", candidate);

    if !candidate.contains(Attribute::VesselName) {
        if let Some(name) = first_text(root, "h1") {
            candidate.set_text(Attribute::VesselName, name);
        }
    }
}

/// Reads rows with at least two cells as label/value pairs
pub(crate) fn read_table_rows(root: &ElementRef<'_>, candidate: &mut CandidateAttributeSet) {
    let (Some(row_sel), Some(cell_sel)) = (selector("tr"), selector("td, th")) else {
        return;
    };

    for row in root.select(&row_sel) {
        let cells: Vec<_> = row.select(&cell_sel).collect();
        if cells.len() >= 2 {
            labels::assign(candidate, &element_text(&cells[0]), &element_text(&cells[1]));
        }
    }
}

/// Reads `dt`/`dd` pairs
pub(crate) fn read_definition_list(root: &ElementRef<'_>, candidate: &mut CandidateAttributeSet) {
    let Some(dl_sel) = selector("dl") else {
        return;
    };

    for dl in root.select(&dl_sel) {
        let mut label: Option<String> = None;
        for child in dl.children().filter_map(ElementRef::wrap) {
            match child.value().name() {
                "dt" => label = Some(element_text(&child)),
                "dd" => {
                    if let Some(l) = label.take() {
                        labels::assign(candidate, &l, &element_text(&child));
                    }
                }
                _ => {}
            }
        }
    }
}

/// Reads `.label`/`.value` pairs inside each element matching `item_css`
pub(crate) fn read_label_value_spans(
    root: &ElementRef<'_>,
    item_css: &str,
    candidate: &mut CandidateAttributeSet,
) {
    let Some(item_sel) = selector(item_css) else {
        return;
    };

    for item in root.select(&item_sel) {
        let (Some(label), Some(value)) = (
            direct_child_text(&item, "label"),
            direct_child_text(&item, "value"),
        ) else {
            continue;
        };
        labels::assign(candidate, &label, &value);
    }
}

/// Text of the first direct child carrying `class`
fn direct_child_text(element: &ElementRef<'_>, class: &str) -> Option<String> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().classes().any(|c| c == class))
        .map(|child| element_text(&child))
}

fn collect_images(root: &ElementRef<'_>, css: &str, page_url: &Url, candidate: &mut CandidateAttributeSet) {
    let Some(sel) = selector(css) else {
        return;
    };

    for img in root.select(&sel) {
        if let Some(photo) = image_src(&img, page_url) {
            candidate.push_item(Attribute::Photos, photo);
        }
    }
}
