//! The Super Simple View Engine.
//!
//! Templates are plain text with `@` directives. A render call rewrites the text in
//! a fixed sequence of regex passes; a later pass only sees what the earlier passes
//! left behind, so the order is part of the language:
//!
//! 1. `@Model.Path` and `@!Model.Path` (HTML encoded)
//! 2. `@Each.Path ... @EndEach`, with `@Current` / `@Current.Path` for the item
//! 3. `@If.Path ... @EndIf` and `@IfNot.Path ... @EndIf`
//! 4. `@Path['~/x']` and `~/` paths in `"` or `'` quoted attribute values
//! 5. `@AntiForgeryToken`
//! 6. `@Text.Key`
//! 7. user supplied [`ViewEngineMatcher`]s
//! 8. `@Partial['name']`, `@Partial['name', Model.Path]`
//! 9. `@Master['name']` with `@Section['name'] ... @EndSection` definitions filling
//!    the master's `@Section['name'];` placeholders
//!
//! Every directive accepts an optional trailing `;`. Anything that cannot be
//! resolved renders as [`ERROR_TOKEN`].

use crate::error::SsveError;
use crate::extractor::{self, PropertyExtractor};
use crate::host::ViewEngineHost;
use crate::matcher::ViewEngineMatcher;
use micro_view::Model;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Rendered in place of a directive that cannot be resolved.
pub const ERROR_TOKEN: &str = "[ERR!]";

/// Partials and master pages nested deeper than this render as [`ERROR_TOKEN`].
pub const MAX_NESTING_DEPTH: usize = 32;

static NULL: Value = Value::Null;

static SINGLE_SUBSTITUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@(?P<encode>!)?Model(?:\.(?P<path>[a-zA-Z0-9\-_]+(?:\.[a-zA-Z0-9\-_]+)*))?;?")
        .expect("single substitution regex is valid")
});

static EACH_SUBSTITUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)@Each(?:\.(?P<path>[a-zA-Z0-9\-_]+(?:\.[a-zA-Z0-9\-_]+)*))?;?(?P<contents>.*?)@EndEach;?")
        .expect("each substitution regex is valid")
});

static CURRENT_SUBSTITUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@(?P<encode>!)?Current(?:\.(?P<path>[a-zA-Z0-9\-_]+(?:\.[a-zA-Z0-9\-_]+)*))?;?")
        .expect("current substitution regex is valid")
});

static CONDITIONAL_SUBSTITUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)@If(?P<not>Not)?\.(?P<path>[a-zA-Z0-9\-_]+(?:\.[a-zA-Z0-9\-_]+)*);?(?P<contents>.*?)@EndIf;?")
        .expect("conditional substitution regex is valid")
});

static PATH_SUBSTITUTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@Path\['(?P<path>[^']+)'\];?").expect("path substitution regex is valid"));

static DOUBLE_QUOTED_ATTRIBUTE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?P<attribute>[a-zA-Z][a-zA-Z0-9\-_:]*)="(?P<path>~/[^"]*)""#)
        .expect("double quoted attribute path regex is valid")
});

static SINGLE_QUOTED_ATTRIBUTE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<attribute>[a-zA-Z][a-zA-Z0-9\-_:]*)='(?P<path>~/[^']*)'")
        .expect("single quoted attribute path regex is valid")
});

static ANTI_FORGERY_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@AntiForgeryToken;?").expect("anti forgery token regex is valid"));

static TEXT_SUBSTITUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@Text\.(?P<key>[a-zA-Z0-9\-_]+(?:\.[a-zA-Z0-9\-_]+)*);?").expect("text substitution regex is valid")
});

static PARTIAL_SUBSTITUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"@Partial\['(?P<name>[^']+)'(?:\s*,\s*(?:Model|Current)(?:\.(?P<path>[a-zA-Z0-9\-_]+(?:\.[a-zA-Z0-9\-_]+)*))?)?\s*\];?",
    )
    .expect("partial substitution regex is valid")
});

static MASTER_PAGE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*@Master\['(?P<name>[^']+)'\];?").expect("master page header regex is valid"));

static SECTION_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@Section\['(?P<name>[^']+)'\];?").expect("section declaration regex is valid"));

static SECTION_CONTENTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)@Section\['(?P<name>[^']+)'\];?(?P<contents>.*?)@EndSection;?")
        .expect("section contents regex is valid")
});

/// Renders Super Simple View Engine templates.
#[derive(Clone, Default)]
pub struct SuperSimpleViewEngine {
    matchers: Vec<Arc<dyn ViewEngineMatcher>>,
}

/// What every pass of one render call shares.
#[derive(Clone, Copy)]
struct RenderState<'a> {
    host: &'a dyn ViewEngineHost,
    model: Option<&'a Model>,
    extractor: &'static dyn PropertyExtractor,
    depth: usize,
}

impl RenderState<'_> {
    fn nested(self) -> Self {
        Self { depth: self.depth + 1, ..self }
    }
}

impl SuperSimpleViewEngine {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_matcher(mut self, matcher: impl ViewEngineMatcher + 'static) -> Self {
        self.matchers.push(Arc::new(matcher));
        self
    }

    /// Renders `template` against `model`.
    ///
    /// Fails if the model cannot be looked into, or if the template asks for an
    /// anti-forgery token on a request without one.
    pub fn render(&self, template: &str, model: Option<&Model>, host: &dyn ViewEngineHost) -> Result<String, SsveError> {
        let (value, extractor) = extractor::for_model(model)?;
        let state = RenderState { host, model, extractor, depth: 0 };
        self.render_with(template, &value, state)
    }

    fn render_with(&self, template: &str, model: &Value, state: RenderState<'_>) -> Result<String, SsveError> {
        if state.depth > MAX_NESTING_DEPTH {
            warn!(depth = state.depth, "partials or master pages nested too deep, giving up");
            return Ok(ERROR_TOKEN.to_string());
        }

        let output = perform_single_substitutions(template, model, state);
        let output = self.perform_each_substitutions(&output, model, state)?;
        let output = perform_conditional_substitutions(&output, model, state);
        let output = perform_path_substitutions(&output, state);
        let output = perform_attribute_path_substitutions(&output, state);
        let output = perform_anti_forgery_token_substitutions(&output, state)?;
        let output = perform_text_substitutions(&output, state);
        let output = self.matchers.iter().fold(output, |output, matcher| matcher.invoke(&output, model, state.host));
        let output = self.perform_partial_substitutions(&output, model, state)?;
        self.perform_master_page_substitutions(&output, model, state)
    }

    fn perform_each_substitutions(&self, template: &str, model: &Value, state: RenderState<'_>) -> Result<String, SsveError> {
        try_replace_all(&EACH_SUBSTITUTION, template, |captures| {
            let path = model_path(group(captures, "path"));
            let items = match extractor::resolve(state.extractor, model, path) {
                Some(Value::Array(items)) => items,
                Some(Value::Null) => return Ok(String::new()),
                Some(_) | None => {
                    debug!(path, "@Each target is missing or not a collection");
                    return Ok(ERROR_TOKEN.to_string());
                }
            };

            let contents = group(captures, "contents");
            let mut output = String::new();
            for item in items {
                let body = self.perform_partial_substitutions(contents, item, state)?;
                let body = perform_conditional_substitutions(&body, item, state);
                output.push_str(&perform_current_substitutions(&body, item, state));
            }
            Ok(output)
        })
    }

    fn perform_partial_substitutions(&self, template: &str, model: &Value, state: RenderState<'_>) -> Result<String, SsveError> {
        try_replace_all(&PARTIAL_SUBSTITUTION, template, |captures| {
            let name = group(captures, "name");
            let partial_model = match captures.name("path") {
                Some(path) => extractor::resolve(state.extractor, model, path.as_str()).unwrap_or(&NULL),
                None => model,
            };

            let Some(partial) = state.host.get_template(name, state.model) else {
                debug!(partial = name, "partial not found");
                return Ok(ERROR_TOKEN.to_string());
            };

            self.render_with(&partial, partial_model, state.nested())
        })
    }

    fn perform_master_page_substitutions(&self, template: &str, model: &Value, state: RenderState<'_>) -> Result<String, SsveError> {
        let Some(header) = MASTER_PAGE_HEADER.captures(template) else {
            return Ok(template.to_string());
        };

        let master_name = group(&header, "name");
        let child = header.get(0).map_or(template, |header| &template[header.end()..]);
        let sections = SECTION_CONTENTS
            .captures_iter(child)
            .map(|captures| (group(&captures, "name"), group(&captures, "contents")))
            .collect::<HashMap<_, _>>();

        let Some(master) = state.host.get_template(master_name, state.model) else {
            debug!(master = master_name, "master page not found");
            return Ok(ERROR_TOKEN.to_string());
        };

        // a master that has a master itself keeps its section definitions, only the
        // placeholders inside them are filled
        let composed = if MASTER_PAGE_HEADER.is_match(&master) {
            SECTION_CONTENTS
                .replace_all(&master, |captures: &Captures<'_>| {
                    let name = group(captures, "name");
                    format!("@Section['{name}']{}@EndSection", fill_sections(group(captures, "contents"), &sections))
                })
                .into_owned()
        } else {
            fill_sections(&master, &sections)
        };

        self.render_with(&composed, model, state.nested())
    }
}

impl fmt::Debug for SuperSimpleViewEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuperSimpleViewEngine").field("matchers", &self.matchers.len()).finish()
    }
}

fn perform_single_substitutions(template: &str, model: &Value, state: RenderState<'_>) -> String {
    SINGLE_SUBSTITUTION
        .replace_all(template, |captures: &Captures<'_>| {
            let value = extractor::resolve(state.extractor, model, group(captures, "path"));
            substitute(value, captures.name("encode").is_some(), state)
        })
        .into_owned()
}

fn perform_current_substitutions(template: &str, item: &Value, state: RenderState<'_>) -> String {
    CURRENT_SUBSTITUTION
        .replace_all(template, |captures: &Captures<'_>| {
            let value = extractor::resolve(state.extractor, item, group(captures, "path"));
            substitute(value, captures.name("encode").is_some(), state)
        })
        .into_owned()
}

fn perform_conditional_substitutions(template: &str, model: &Value, state: RenderState<'_>) -> String {
    CONDITIONAL_SUBSTITUTION
        .replace_all(template, |captures: &Captures<'_>| {
            let negate = captures.name("not").is_some();
            let path = model_path(group(captures, "path"));
            if predicate(state.extractor, model, path) == negate {
                return String::new();
            }
            group(captures, "contents").to_string()
        })
        .into_owned()
}

fn perform_path_substitutions(template: &str, state: RenderState<'_>) -> String {
    PATH_SUBSTITUTION
        .replace_all(template, |captures: &Captures<'_>| state.host.expand_path(group(captures, "path")))
        .into_owned()
}

fn perform_attribute_path_substitutions(template: &str, state: RenderState<'_>) -> String {
    let template = DOUBLE_QUOTED_ATTRIBUTE_PATH.replace_all(template, |captures: &Captures<'_>| {
        format!(r#"{}="{}""#, group(captures, "attribute"), state.host.expand_path(group(captures, "path")))
    });
    SINGLE_QUOTED_ATTRIBUTE_PATH
        .replace_all(&template, |captures: &Captures<'_>| {
            format!("{}='{}'", group(captures, "attribute"), state.host.expand_path(group(captures, "path")))
        })
        .into_owned()
}

fn perform_anti_forgery_token_substitutions(template: &str, state: RenderState<'_>) -> Result<String, SsveError> {
    if !ANTI_FORGERY_TOKEN.is_match(template) {
        return Ok(template.to_string());
    }

    let token = state.host.anti_forgery_token()?;
    Ok(ANTI_FORGERY_TOKEN.replace_all(template, regex::NoExpand(&token)).into_owned())
}

fn perform_text_substitutions(template: &str, state: RenderState<'_>) -> String {
    TEXT_SUBSTITUTION
        .replace_all(template, |captures: &Captures<'_>| {
            let key = group(captures, "key");
            state.host.text(key).unwrap_or_else(|| {
                debug!(key, "no text for key");
                ERROR_TOKEN.to_string()
            })
        })
        .into_owned()
}

fn fill_sections(template: &str, sections: &HashMap<&str, &str>) -> String {
    SECTION_DECLARATION
        .replace_all(template, |captures: &Captures<'_>| {
            sections.get(group(captures, "name")).copied().unwrap_or_default().to_string()
        })
        .into_owned()
}

/// Truthiness of `@If`: a boolean member is used as is, `HasItems` asks whether the
/// collection `Items` is non-empty, anything else is false.
fn predicate(extractor: &dyn PropertyExtractor, model: &Value, path: &str) -> bool {
    if let Some(Value::Bool(value)) = extractor::resolve(extractor, model, path) {
        return *value;
    }

    let (parent, name) = path.rsplit_once('.').unwrap_or(("", path));
    let Some(collection) = name.strip_prefix("Has").filter(|collection| !collection.is_empty()) else {
        return false;
    };

    let collection_path = if parent.is_empty() { collection.to_string() } else { format!("{parent}.{collection}") };
    match extractor::resolve(extractor, model, &collection_path) {
        Some(Value::Array(items)) => !items.is_empty(),
        _ => false,
    }
}

fn substitute(value: Option<&Value>, encode: bool, state: RenderState<'_>) -> String {
    let Some(value) = value else {
        return ERROR_TOKEN.to_string();
    };

    let text = display(value);
    if encode { state.host.html_encode(&text) } else { text.into_owned() }
}

/// Text of a value as it appears in the output.
fn display(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(text) => Cow::Borrowed(text),
        Value::Bool(value) => Cow::Owned(value.to_string()),
        Value::Number(number) => Cow::Owned(number.to_string()),
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

/// `@Each.Model.Users` and `@Each.Users` name the same member.
fn model_path(path: &str) -> &str {
    if path == "Model" {
        return "";
    }
    path.strip_prefix("Model.").unwrap_or(path)
}

fn group<'t>(captures: &Captures<'t>, name: &str) -> &'t str {
    captures.name(name).map_or("", |group| group.as_str())
}

fn try_replace_all<F>(regex: &Regex, text: &str, mut replacement: F) -> Result<String, SsveError>
where
    F: FnMut(&Captures<'_>) -> Result<String, SsveError>,
{
    let mut output = String::with_capacity(text.len());
    let mut last = 0;
    for captures in regex.captures_iter(text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        output.push_str(&text[last..whole.start()]);
        output.push_str(&replacement(&captures)?);
        last = whole.end();
    }
    output.push_str(&text[last..]);
    Ok(output)
}
