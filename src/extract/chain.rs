//! Selector rules and the first-match fallback combinator

use crate::{ConfigError, ConfigResult};
use scraper::{ElementRef, Html, Selector};
use std::fmt;

/// What a matched element contributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// The element's text content
    Text,
    /// The value of the named attribute
    Attr(String),
}

/// One extraction rule: a CSS selector plus a projection
///
/// Written as `css`, `css::text` or `css::attr(name)`.
#[derive(Debug, Clone)]
pub struct SelectorRule {
    source: String,
    selector: Selector,
    projection: Projection,
}

impl SelectorRule {
    /// Parses a rule
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_harvest::extract::{Projection, SelectorRule};
    ///
    /// let rule = SelectorRule::parse("meta[property=\"og:image\"]::attr(content)").unwrap();
    /// assert_eq!(rule.projection(), &Projection::Attr("content".to_string()));
    /// ```
    pub fn parse(rule: &str) -> ConfigResult<Self> {
        let rule = rule.trim();
        let invalid = |reason: String| ConfigError::InvalidSelector {
            selector: rule.to_string(),
            reason,
        };

        let (css, projection) = if let Some(css) = rule.strip_suffix("::text") {
            (css, Projection::Text)
        } else if let Some((css, tail)) = rule.rsplit_once("::attr(") {
            let name = tail
                .strip_suffix(')')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| invalid("malformed ::attr() suffix".to_string()))?;
            (css, Projection::Attr(name.to_string()))
        } else {
            (rule, Projection::Text)
        };

        let selector = Selector::parse(css.trim()).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            source: rule.to_string(),
            selector,
            projection,
        })
    }

    /// Returns the rule as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Projects a matched element to its whitespace-collapsed value
    fn project(&self, element: ElementRef<'_>) -> Option<String> {
        let raw = match &self.projection {
            Projection::Text => element.text().collect::<Vec<_>>().join(" "),
            Projection::Attr(name) => element.value().attr(name)?.to_string(),
        };
        let value = collapse_whitespace(&raw);
        (!value.is_empty()).then_some(value)
    }
}

impl fmt::Display for SelectorRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// The document-query capability the extractor is written against
pub trait DocumentQuery {
    /// Returns the first non-empty value the rule yields
    fn select_one(&self, rule: &SelectorRule) -> Option<String>;

    /// Returns every non-empty value the rule yields, in document order
    fn select_all(&self, rule: &SelectorRule) -> Vec<String>;
}

impl DocumentQuery for Html {
    fn select_one(&self, rule: &SelectorRule) -> Option<String> {
        self.select(&rule.selector)
            .find_map(|element| rule.project(element))
    }

    fn select_all(&self, rule: &SelectorRule) -> Vec<String> {
        self.select(&rule.selector)
            .filter_map(|element| rule.project(element))
            .collect()
    }
}

/// Evaluates candidates in order and returns the first success
///
/// Later candidates are never evaluated once one succeeds.
pub fn first_match<I, T, F>(candidates: I, query: F) -> Option<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Option<T>,
{
    candidates.into_iter().find_map(query)
}

/// Resolves a single-valued field: the first rule yielding a non-empty value
pub fn first_value<D: DocumentQuery + ?Sized>(doc: &D, chain: &[SelectorRule]) -> Option<String> {
    first_match(chain, |rule| doc.select_one(rule))
}

/// Resolves a multi-valued field: the items of the first rule yielding any
pub fn first_list<D: DocumentQuery + ?Sized>(doc: &D, chain: &[SelectorRule]) -> Vec<String> {
    first_match(chain, |rule| {
        let items = doc.select_all(rule);
        (!items.is_empty()).then_some(items)
    })
    .unwrap_or_default()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
