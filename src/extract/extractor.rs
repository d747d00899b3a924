use crate::config::ExtractionConfig;
use crate::extract::chain::{first_list, first_value, DocumentQuery};
use crate::extract::record::PageRecord;
use crate::extract::rules::{Field, FieldRules};
use crate::{ConfigResult, HarvestError, Result};
use chrono::{DateTime, Utc};
use scraper::Html;
use url::Url;

/// Builds a [`PageRecord`] from a document using each field's selector chain
#[derive(Debug, Clone)]
pub struct Extractor {
    rules: FieldRules,
}

impl Extractor {
    pub fn new(rules: FieldRules) -> Self {
        Self { rules }
    }

    /// Compiles the extraction settings into an extractor
    pub fn from_config(config: &ExtractionConfig) -> ConfigResult<Self> {
        Ok(Self::new(FieldRules::from_config(config)?))
    }

    /// Extracts a record from a queryable document
    ///
    /// # Returns
    ///
    /// * `Ok(PageRecord)` - The page has a title; other fields may be empty
    /// * `Err(HarvestError::NotContentPage)` - No title rule matched
    pub fn extract<D: DocumentQuery + ?Sized>(
        &self,
        url: &Url,
        doc: &D,
        captured_at: DateTime<Utc>,
    ) -> Result<PageRecord> {
        let one = |field: Field| first_value(doc, self.rules.chain(field));
        let many = |field: Field| first_list(doc, self.rules.chain(field));

        let title = one(Field::Title).ok_or_else(|| HarvestError::NotContentPage {
            url: url.to_string(),
        })?;

        Ok(PageRecord {
            url: url.to_string(),
            title,
            author: one(Field::Author),
            publish_date: one(Field::PublishDate),
            categories: many(Field::Categories),
            image: one(Field::Image),
            servings: one(Field::Servings),
            prep_time: one(Field::PrepTime),
            cook_time: one(Field::CookTime),
            total_time: one(Field::TotalTime),
            ingredients: many(Field::Ingredients),
            instructions: many(Field::Instructions),
            nutrition: one(Field::Nutrition),
            rating: one(Field::Rating),
            captured_at,
        })
    }

    /// Parses HTML and extracts a record from it
    pub fn extract_html(
        &self,
        url: &Url,
        html: &str,
        captured_at: DateTime<Utc>,
    ) -> Result<PageRecord> {
        let document = Html::parse_document(html);
        self.extract(url, &document, captured_at)
    }
}

/// Returns the capture time from a response `Date` header, else now
pub fn capture_time(date_header: Option<&str>) -> DateTime<Utc> {
    date_header
        .and_then(|value| DateTime::parse_from_rfc2822(value.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}
