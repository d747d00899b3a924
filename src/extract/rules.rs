//! Per-field selector chains

use crate::config::ExtractionConfig;
use crate::extract::chain::SelectorRule;
use crate::{ConfigError, ConfigResult};
use std::collections::BTreeMap;

/// A record field resolved from the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Title,
    Author,
    PublishDate,
    Categories,
    Image,
    Servings,
    PrepTime,
    CookTime,
    TotalTime,
    Ingredients,
    Instructions,
    Nutrition,
    Rating,
}

impl Field {
    pub const ALL: [Field; 13] = [
        Field::Title,
        Field::Author,
        Field::PublishDate,
        Field::Categories,
        Field::Image,
        Field::Servings,
        Field::PrepTime,
        Field::CookTime,
        Field::TotalTime,
        Field::Ingredients,
        Field::Instructions,
        Field::Nutrition,
        Field::Rating,
    ];

    /// Returns the field's key in records and configuration
    pub fn name(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Author => "author",
            Field::PublishDate => "publish_date",
            Field::Categories => "categories",
            Field::Image => "image",
            Field::Servings => "servings",
            Field::PrepTime => "prep_time",
            Field::CookTime => "cook_time",
            Field::TotalTime => "total_time",
            Field::Ingredients => "ingredients",
            Field::Instructions => "instructions",
            Field::Nutrition => "nutrition",
            Field::Rating => "rating",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Returns true for list-valued fields
    pub fn is_multi(&self) -> bool {
        matches!(
            self,
            Field::Categories | Field::Ingredients | Field::Instructions
        )
    }

    fn default_chain(&self) -> &'static [&'static str] {
        match self {
            Field::Title => &["h1.entry-title::text", "h1::text"],
            Field::Author => &[
                "a[rel=\"author\"]::text",
                ".author a::text",
                ".byline a::text",
            ],
            Field::PublishDate => &[
                "time.entry-date::attr(datetime)",
                "time::attr(datetime)",
                "meta[property=\"article:published_time\"]::attr(content)",
            ],
            Field::Categories => &["a[rel=\"category tag\"]::text", ".breadcrumb a::text"],
            Field::Image => &[
                "meta[property=\"og:image\"]::attr(content)",
                "figure img::attr(src)",
                ".post-thumbnail img::attr(src)",
            ],
            Field::Servings => &[".wprm-recipe-servings::text", ".servings::text"],
            Field::PrepTime => &[".wprm-recipe-prep_time::text", ".prep-time::text"],
            Field::CookTime => &[".wprm-recipe-cook_time::text", ".cook-time::text"],
            Field::TotalTime => &[".wprm-recipe-total_time::text", ".total-time::text"],
            Field::Ingredients => &[
                ".wprm-recipe-ingredients .wprm-recipe-ingredient-name::text",
                ".wprm-recipe-ingredients .wprm-recipe-ingredient::text",
                ".ingredients li::text",
                ".recipe-ingredients li::text",
            ],
            Field::Instructions => &[
                ".wprm-recipe-instructions li::text",
                ".wprm-recipe-instruction-text::text",
                ".instructions li::text",
                ".recipe-instructions li::text",
            ],
            Field::Nutrition => &[
                ".wprm-recipe-nutrition::text",
                ".nutrition::text",
                ".nutrition-facts::text",
            ],
            Field::Rating => &[
                ".wprm-recipe-rating-average::text",
                ".rating::text",
                ".post-rating::text",
            ],
        }
    }
}

/// The compiled selector chain of every field
#[derive(Debug, Clone)]
pub struct FieldRules {
    chains: BTreeMap<Field, Vec<SelectorRule>>,
}

impl FieldRules {
    /// Compiles the built-in chains
    pub fn defaults() -> ConfigResult<Self> {
        Self::from_config(&ExtractionConfig::default())
    }

    /// Compiles the built-in chains, replacing those overridden in config
    ///
    /// # Returns
    ///
    /// * `Err(ConfigError::Validation)` - An override names an unknown field
    ///   or is empty
    /// * `Err(ConfigError::InvalidSelector)` - A rule does not parse
    pub fn from_config(config: &ExtractionConfig) -> ConfigResult<Self> {
        for (name, rules) in &config.selectors {
            if Field::from_name(name).is_none() {
                return Err(ConfigError::Validation(format!(
                    "Unknown extraction field '{}'",
                    name
                )));
            }
            if rules.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Selector chain for '{}' cannot be empty",
                    name
                )));
            }
        }

        let mut chains = BTreeMap::new();
        for field in Field::ALL {
            let chain = match config.selectors.get(field.name()) {
                Some(rules) => rules
                    .iter()
                    .map(|r| SelectorRule::parse(r))
                    .collect::<ConfigResult<Vec<_>>>()?,
                None => field
                    .default_chain()
                    .iter()
                    .map(|r| SelectorRule::parse(r))
                    .collect::<ConfigResult<Vec<_>>>()?,
            };
            chains.insert(field, chain);
        }

        Ok(Self { chains })
    }

    /// Returns the chain for a field
    pub fn chain(&self, field: Field) -> &[SelectorRule] {
        self.chains.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }
}
