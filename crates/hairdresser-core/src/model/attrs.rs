// ── Attribute sets ──
//
// Canonical, order-independent representation of the attributes that
// identify a head element. Serialization is always sorted by name so
// selectors and markup are deterministic.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;

use crate::error::HeadError;

/// Attribute name → value, sorted by name.
pub type AttrMap = BTreeMap<String, String>;

/// Immutable set of matching attributes for one controller.
///
/// Built once when the controller is created. `html` and `selector` are
/// precomputed because every render and every cache check needs them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttrSet {
    attrs: AttrMap,
    #[serde(skip)]
    html: String,
    #[serde(skip)]
    selector: String,
}

impl AttrSet {
    /// Build an attribute set from any name/value pairs. Duplicate names keep the last value.
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_map(collect(pairs))
    }

    pub fn from_map(attrs: AttrMap) -> Self {
        let html = html_of(&attrs);
        let selector = selector_of(&attrs);
        Self {
            attrs,
            html,
            selector,
        }
    }

    /// `name="value"` pairs joined by a single space.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// `[name='value']` predicates, concatenated.
    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn as_map(&self) -> &AttrMap {
        &self.attrs
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Visit attributes in name order until the visitor returns `false`.
    ///
    /// Returns `true` when every attribute was visited.
    pub fn each(&self, mut visitor: impl FnMut(&str, &str) -> bool) -> bool {
        self.iter().all(|(name, value)| visitor(name, value))
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

/// Render pairs as `name="value"` markup without building an [`AttrSet`].
pub fn to_html<I, K, V>(pairs: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    html_of(&collect(pairs))
}

/// Render pairs as a CSS attribute selector without building an [`AttrSet`].
pub fn to_selector<I, K, V>(pairs: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    selector_of(&collect(pairs))
}

/// Convert a dynamic render value into attributes.
///
/// Objects are accepted; string members are kept verbatim, numbers and
/// booleans are stringified. Anything else fails validation.
pub fn attrs_from_value(tag_name: &str, value: &Value) -> Result<AttrMap, HeadError> {
    let Value::Object(members) = value else {
        return Err(HeadError::validation(format!(
            "render value for <{tag_name}> must be an object"
        )));
    };

    members
        .iter()
        .map(|(name, member)| {
            let text = match member {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => {
                    return Err(HeadError::validation(format!(
                        "attribute '{name}' of <{tag_name}> must be a string, number or boolean"
                    )));
                }
            };
            Ok((name.clone(), text))
        })
        .collect()
}

// ── Private helpers ──────────────────────────────────────────────────

fn collect<I, K, V>(pairs: I) -> AttrMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

fn html_of(attrs: &AttrMap) -> String {
    attrs
        .iter()
        .map(|(name, value)| format!("{name}=\"{value}\""))
        .collect::<Vec<_>>()
        .join(" ")
}

fn selector_of(attrs: &AttrMap) -> String {
    attrs.iter().fold(String::new(), |mut out, (name, value)| {
        let _ = write!(out, "[{name}='{value}']");
        out
    })
}
