//! Structured record extraction
//!
//! Every field has an ordered chain of selector rules. Rules are tried
//! strictly in declared order and the first one yielding a non-empty result
//! wins; results of different rules are never merged.

mod chain;
mod extractor;
mod record;
mod rules;

pub use chain::{first_list, first_match, first_value, DocumentQuery, Projection, SelectorRule};
pub use extractor::{capture_time, Extractor};
pub use record::{PageRecord, FIELD_COUNT};
pub use rules::{Field, FieldRules};

#[cfg(test)]
pub(crate) use record::tests::{bare_record, full_record};
