//! Streaming sitemap XML parser

use crate::{HarvestError, Result};
use quick_xml::events::Event;
use quick_xml::name::{Namespace, QName, ResolveResult};
use quick_xml::NsReader;

/// Path segment shared by the sitemaps.org and legacy Google sitemap
/// namespaces; extension namespaces use `sitemap-image`, `sitemap-video`
const SITEMAP_NAMESPACE_MARKER: &[u8] = b"/schemas/sitemap/";

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<sitemapindex>`: locations of further sitemaps
    Index(Vec<String>),
    /// `<urlset>`: locations of content pages
    UrlSet(Vec<String>),
}

impl SitemapDocument {
    pub fn locations(&self) -> &[String] {
        match self {
            SitemapDocument::Index(locs) | SitemapDocument::UrlSet(locs) => locs,
        }
    }
}

enum RootKind {
    Index,
    UrlSet,
}

/// Parses a sitemap index or URL-set
///
/// Only `<loc>` elements in the sitemap namespace (or in no namespace) count,
/// whatever prefix binds it, so image and video extension locations
/// (`<image:loc>`) are ignored. Entities and CDATA sections are
/// decoded and surrounding whitespace trimmed.
///
/// # Arguments
///
/// * `source` - Where the document came from, used in error messages
/// * `xml` - The document text
///
/// # Returns
///
/// * `Err(HarvestError::Parse)` - Malformed XML or an unknown root element
pub fn parse_sitemap(source: &str, xml: &str) -> Result<SitemapDocument> {
    let parse_error = |message: String| HarvestError::Parse {
        url: source.to_string(),
        message,
    };

    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = NsReader::from_str(xml);

    let mut root: Option<RootKind> = None;
    let mut depth = 0usize;
    let mut current_loc: Option<String> = None;
    let mut locations = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            parse_error(format!(
                "malformed XML at byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(e) => {
                if root.is_none() {
                    root = Some(root_kind(e.local_name().as_ref()).ok_or_else(|| {
                        parse_error(format!(
                            "unexpected root element <{}>",
                            String::from_utf8_lossy(e.name().as_ref())
                        ))
                    })?);
                } else if is_sitemap_loc(&reader, e.name()) {
                    current_loc = Some(String::new());
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if root.is_none() {
                    // A self-closing root: valid but without entries
                    let kind = root_kind(e.local_name().as_ref()).ok_or_else(|| {
                        parse_error(format!(
                            "unexpected root element <{}>",
                            String::from_utf8_lossy(e.name().as_ref())
                        ))
                    })?;
                    return Ok(build(kind, locations));
                }
            }
            Event::Text(t) => {
                if let Some(loc) = current_loc.as_mut() {
                    let text = t
                        .unescape()
                        .map_err(|e| parse_error(format!("bad text in <loc>: {}", e)))?;
                    loc.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(loc) = current_loc.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) => {
                if is_sitemap_loc(&reader, e.name()) {
                    if let Some(loc) = current_loc.take() {
                        let loc = loc.trim();
                        if !loc.is_empty() {
                            locations.push(loc.to_string());
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match root {
        None => Err(parse_error("document has no root element".to_string())),
        Some(_) if depth != 0 => Err(parse_error("unexpected end of document".to_string())),
        Some(kind) => Ok(build(kind, locations)),
    }
}

fn is_sitemap_loc(reader: &NsReader<&[u8]>, name: QName) -> bool {
    let (namespace, local) = reader.resolve_element(name);
    if local.as_ref() != b"loc" {
        return false;
    }
    match namespace {
        ResolveResult::Unbound => true,
        ResolveResult::Bound(Namespace(uri)) => uri
            .windows(SITEMAP_NAMESPACE_MARKER.len())
            .any(|w| w == SITEMAP_NAMESPACE_MARKER),
        ResolveResult::Unknown(_) => false,
    }
}

fn root_kind(local_name: &[u8]) -> Option<RootKind> {
    match local_name {
        b"sitemapindex" => Some(RootKind::Index),
        b"urlset" => Some(RootKind::UrlSet),
        _ => None,
    }
}

fn build(kind: RootKind, locations: Vec<String>) -> SitemapDocument {
    match kind {
        RootKind::Index => SitemapDocument::Index(locations),
        RootKind::UrlSet => SitemapDocument::UrlSet(locations),
    }
}
