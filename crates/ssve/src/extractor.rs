//! Member lookup on template models.
//!
//! The extractor is picked once per render call from the shape of the model and
//! used for every lookup of that call, including lookups on `@Each` items.

use crate::error::SsveError;
use micro_view::{Model, ModelShape, ViewError};
use serde_json::Value;

pub trait PropertyExtractor: Send + Sync {
    /// Returns the member `name` of `value`, `None` if `value` has no such member.
    fn property<'v>(&self, value: &'v Value, name: &str) -> Option<&'v Value>;
}

/// Exact, case-sensitive member names, as declared on the model type.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemberExtractor;

impl PropertyExtractor for MemberExtractor {
    fn property<'v>(&self, value: &'v Value, name: &str) -> Option<&'v Value> {
        value.as_object()?.get(name)
    }
}

/// Dictionary keys, ignoring ASCII case; an exact match is preferred.
#[derive(Debug, Clone, Copy, Default)]
pub struct DictionaryExtractor;

impl PropertyExtractor for DictionaryExtractor {
    fn property<'v>(&self, value: &'v Value, name: &str) -> Option<&'v Value> {
        let entries = value.as_object()?;
        entries
            .get(name)
            .or_else(|| entries.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value))
    }
}

static MEMBERS: MemberExtractor = MemberExtractor;
static DICTIONARY: DictionaryExtractor = DictionaryExtractor;

/// Picks the extractor for a model and captures the value lookups run on.
///
/// A missing model renders as `null`. A dynamic model that cannot be viewed as a
/// dictionary is rejected.
pub fn for_model(model: Option<&Model>) -> Result<(Value, &'static dyn PropertyExtractor), SsveError> {
    let Some(model) = model else {
        return Ok((Value::Null, &MEMBERS));
    };

    let extractor: &'static dyn PropertyExtractor = match model.shape() {
        ModelShape::Members(_) => &MEMBERS,
        ModelShape::Dictionary(_) | ModelShape::Dynamic(_) => &DICTIONARY,
    };

    match model.to_value() {
        Ok(value) => Ok((value, extractor)),
        Err(ViewError::UnsupportedModel { type_name }) => Err(SsveError::unsupported_model(type_name)),
        Err(e) => Err(e.into()),
    }
}

/// Follows a dotted member path; the empty path is the value itself.
pub fn resolve<'v>(extractor: &dyn PropertyExtractor, value: &'v Value, path: &str) -> Option<&'v Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |value, name| extractor.property(value, name))
}
