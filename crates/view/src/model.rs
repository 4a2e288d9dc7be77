//! View models handed from request handlers to view engines.
//!
//! A [`Model`] pairs the runtime type name of the value the handler rendered
//! with one of three shapes:
//!
//! - [`ModelShape::Members`]: a plain value captured through `serde::Serialize`,
//!   whose fields are looked up by exact name
//! - [`ModelShape::Dictionary`]: a [`DynamicDictionary`], a string keyed bag with
//!   case-insensitive lookups
//! - [`ModelShape::Dynamic`]: any other [`DynamicObject`]; engines that need
//!   member lookups only accept it when it also exposes a dictionary

use crate::ViewError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// The value a view is rendered with.
#[derive(Debug, Clone)]
pub struct Model {
    type_name: String,
    shape: ModelShape,
}

#[derive(Debug, Clone)]
pub enum ModelShape {
    Members(Value),
    Dictionary(DynamicDictionary),
    Dynamic(Arc<dyn DynamicObject>),
}

/// A dynamically typed model object.
pub trait DynamicObject: fmt::Debug + Send + Sync {
    /// Names of the members this object currently answers to.
    fn member_names(&self) -> Vec<String>;

    /// Exposes the object as a string keyed dictionary, if it supports that contract.
    fn as_dictionary(&self) -> Option<&DynamicDictionary> {
        None
    }
}

impl Model {
    /// Captures a serializable value, recording the short name of its type.
    ///
    /// ```
    /// use micro_view::Model;
    ///
    /// #[derive(serde::Serialize)]
    /// struct PersonModel { name: String }
    ///
    /// let model = Model::from_serialize(&PersonModel { name: "Bob".into() }).unwrap();
    /// assert_eq!(model.type_name(), "PersonModel");
    /// ```
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, ViewError> {
        let value = serde_json::to_value(value)?;
        Ok(Self::members(short_type_name(std::any::type_name::<T>()), value))
    }

    pub fn members(type_name: impl Into<String>, value: Value) -> Self {
        Self { type_name: type_name.into(), shape: ModelShape::Members(value) }
    }

    pub fn dictionary(dictionary: DynamicDictionary) -> Self {
        Self { type_name: DynamicDictionary::TYPE_NAME.to_string(), shape: ModelShape::Dictionary(dictionary) }
    }

    pub fn dynamic(type_name: impl Into<String>, object: Arc<dyn DynamicObject>) -> Self {
        Self { type_name: type_name.into(), shape: ModelShape::Dynamic(object) }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn shape(&self) -> &ModelShape {
        &self.shape
    }

    /// Returns the value view engines look members up in, if the shape offers one.
    pub fn to_value(&self) -> Result<Value, ViewError> {
        match &self.shape {
            ModelShape::Members(value) => Ok(value.clone()),
            ModelShape::Dictionary(dictionary) => Ok(dictionary.to_value()),
            ModelShape::Dynamic(object) => object
                .as_dictionary()
                .map(DynamicDictionary::to_value)
                .ok_or_else(|| ViewError::unsupported_model(&self.type_name)),
        }
    }
}

impl From<DynamicDictionary> for Model {
    fn from(dictionary: DynamicDictionary) -> Self {
        Self::dictionary(dictionary)
    }
}

/// Strips the module path and generic arguments from a type name.
fn short_type_name(full_name: &str) -> &str {
    let without_generics = full_name.split('<').next().unwrap_or(full_name);
    without_generics.rsplit("::").next().unwrap_or(without_generics)
}

/// A string keyed bag of values with case-insensitive member lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicDictionary {
    entries: Map<String, Value>,
}

impl DynamicDictionary {
    pub const TYPE_NAME: &'static str = "DynamicDictionary";

    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any entry whose key differs only by case.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if let Some(existing) = self.find_key(&key).map(str::to_string) {
            self.entries.remove(&existing);
        }
        self.entries.insert(key, value.into());
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.find_key(key).and_then(|key| self.entries.get(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.find_key(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.entries.clone())
    }

    fn find_key(&self, key: &str) -> Option<&str> {
        self.entries
            .keys()
            .find(|candidate| candidate.as_str() == key)
            .or_else(|| self.entries.keys().find(|candidate| candidate.eq_ignore_ascii_case(key)))
            .map(String::as_str)
    }
}

impl DynamicObject for DynamicDictionary {
    fn member_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn as_dictionary(&self) -> Option<&DynamicDictionary> {
        Some(self)
    }
}
