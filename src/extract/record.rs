use crate::extract::Field;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of fields a record can populate, `url` and `captured_at` included
pub const FIELD_COUNT: usize = 15;

/// A structured record extracted from one content page
///
/// Created by the extractor and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub author: Option<String>,
    pub publish_date: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub image: Option<String>,
    pub servings: Option<String>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub total_time: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    pub nutrition: Option<String>,
    pub rating: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl PageRecord {
    /// Returns true if the extracted field holds a non-empty value
    pub fn has_field(&self, field: Field) -> bool {
        let text = |s: &str| !s.trim().is_empty();
        let opt = |s: &Option<String>| s.as_deref().is_some_and(text);
        let list = |v: &[String]| v.iter().any(|item| text(item.as_str()));

        match field {
            Field::Title => text(self.title.as_str()),
            Field::Author => opt(&self.author),
            Field::PublishDate => opt(&self.publish_date),
            Field::Categories => list(self.categories.as_slice()),
            Field::Image => opt(&self.image),
            Field::Servings => opt(&self.servings),
            Field::PrepTime => opt(&self.prep_time),
            Field::CookTime => opt(&self.cook_time),
            Field::TotalTime => opt(&self.total_time),
            Field::Ingredients => list(self.ingredients.as_slice()),
            Field::Instructions => list(self.instructions.as_slice()),
            Field::Nutrition => opt(&self.nutrition),
            Field::Rating => opt(&self.rating),
        }
    }

    /// Counts fields holding a non-empty value
    ///
    /// Empty strings and empty lists do not count.
    pub fn populated_fields(&self) -> usize {
        let extracted = Field::ALL
            .into_iter()
            .filter(|field| self.has_field(*field))
            .count();

        // url and captured_at
        usize::from(!self.url.trim().is_empty()) + extracted + 1
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A record with only the required fields set
    pub(crate) fn bare_record(url: &str) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            title: "Sheet Pan Salmon".to_string(),
            author: None,
            publish_date: None,
            categories: Vec::new(),
            image: None,
            servings: None,
            prep_time: None,
            cook_time: None,
            total_time: None,
            ingredients: Vec::new(),
            instructions: Vec::new(),
            nutrition: None,
            rating: None,
            captured_at: Utc::now(),
        }
    }

    /// A record with every field set
    pub(crate) fn full_record(url: &str) -> PageRecord {
        PageRecord {
            author: Some("Jo".to_string()),
            publish_date: Some("2024-01-02".to_string()),
            categories: vec!["Dinner".to_string()],
            image: Some("https://example.com/salmon.jpg".to_string()),
            servings: Some("4".to_string()),
            prep_time: Some("10 mins".to_string()),
            cook_time: Some("20 mins".to_string()),
            total_time: Some("30 mins".to_string()),
            ingredients: vec!["salmon".to_string(), "lemon".to_string()],
            instructions: vec!["Bake.".to_string()],
            nutrition: Some("300 kcal".to_string()),
            rating: Some("4.8".to_string()),
            ..bare_record(url)
        }
    }

    #[test]
    fn test_bare_record_counts_required_fields() {
        assert_eq!(bare_record("https://example.com/a").populated_fields(), 3);
    }

    #[test]
    fn test_full_record_counts_every_field() {
        assert_eq!(
            full_record("https://example.com/a").populated_fields(),
            FIELD_COUNT
        );
    }

    #[test]
    fn test_empty_values_do_not_count() {
        let mut record = bare_record("https://example.com/a");
        record.author = Some("  ".to_string());
        record.categories = vec![String::new()];
        record.ingredients = Vec::new();
        assert_eq!(record.populated_fields(), 3);
    }

    #[test]
    fn test_serializes_one_line() {
        let record = full_record("https://example.com/a");
        let line = serde_json::to_string(&record).unwrap();
        assert!(!line.contains('\n'));
        let back: PageRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(back, record);
    }
}
