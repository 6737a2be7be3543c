//! Stage settings: the persisted key/value map and the coercing validator.
//!
//! A [`SettingsMap`] is what lives on disk: string keys, string values,
//! insertion order preserved so files are written in a stable order.
//! Stage logic never reads it directly. Each stage kind runs its values
//! through a [`Validator`], which rewrites anything out of domain to a
//! usable value and hands back a typed record.
//!
//! Validation never fails. A stale or hand-edited file always yields a
//! map the stage can render from; every rewrite is logged and reported as
//! a [`Correction`].

use indexmap::IndexMap;

use crate::format::Document;
use crate::types::Dimensions;

/// Ordered string-keyed configuration of one stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsMap(IndexMap<String, String>);

impl SettingsMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Parse the top-level value entries of a settings file.
    ///
    /// Blocks are ignored; a key repeated in the file keeps its last value.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self::from_document(&Document::parse(text))
    }

    /// Collect the top-level value entries of a parsed document.
    #[must_use]
    pub fn from_document(doc: &Document) -> Self {
        let mut map = Self::new();
        for entry in doc.entries() {
            if let crate::format::Entry::Value { key, value } = entry {
                map.set(key.clone(), value.clone());
            }
        }
        map
    }

    /// Value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Store `value` under `key`, returning the previous value.
    ///
    /// An existing key keeps its position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove `key`, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.shift_remove(key)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy every entry of `other` into this map, overwriting.
    pub fn overlay(&mut self, other: &Self) {
        for (key, value) in other.iter() {
            self.set(key, value);
        }
    }

    /// Keep only the entries whose key satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|key, _| keep(key));
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SettingsMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.set(key, value);
        }
        map
    }
}

/// Default for one parameter, resolved against the primary input's size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    /// A fixed literal.
    Literal(&'static str),
    /// The primary input's width in pixels.
    Width,
    /// The primary input's height in pixels.
    Height,
}

impl DefaultValue {
    /// The concrete default for an input of the given size.
    #[must_use]
    pub fn resolve(self, dimensions: Dimensions) -> String {
        match self {
            Self::Literal(value) => value.to_owned(),
            Self::Width => dimensions.width.to_string(),
            Self::Height => dimensions.height.to_string(),
        }
    }
}

/// One entry of a stage kind's fixed parameter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    /// Settings key.
    pub key: &'static str,
    /// Value inserted when the key is absent.
    pub default: DefaultValue,
}

/// Insert every missing parameter from `params`. Existing keys are never
/// overwritten.
///
/// Returns the number of keys inserted.
pub fn apply_param_defaults(
    params: &[Param],
    map: &mut SettingsMap,
    dimensions: Dimensions,
) -> usize {
    let mut inserted = 0;
    for param in params {
        if !map.contains_key(param.key) {
            map.set(param.key, param.default.resolve(dimensions));
            inserted += 1;
        }
    }
    inserted
}

/// A fixed, ordered set of labels for an enumerated parameter.
pub trait Choice: Copy + Eq + Sized + 'static {
    /// Every value, in selection order.
    const ALL: &'static [Self];

    /// Value substituted for an unknown label.
    const DEFAULT: Self;

    /// Persisted label.
    fn label(self) -> &'static str;

    /// Position of this value in [`ALL`](Self::ALL).
    fn index(self) -> usize {
        Self::ALL.iter().position(|c| *c == self).unwrap_or(0)
    }

    /// Look up a value by its exact label.
    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.label() == label)
    }
}

/// A value rewritten during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    /// Settings key that was corrected.
    pub key: String,
    /// Value found before correction (`None` if the key was missing).
    pub found: Option<String>,
    /// Value written in its place.
    pub applied: String,
}

/// Coercing per-key validator over a [`SettingsMap`].
///
/// Each rule reads one key, writes the canonical in-domain value back
/// and returns it typed. Rules are idempotent.
pub struct Validator<'a> {
    map: &'a mut SettingsMap,
    corrections: Vec<Correction>,
}

impl<'a> Validator<'a> {
    /// Start validating `map`.
    pub const fn new(map: &'a mut SettingsMap) -> Self {
        Self {
            map,
            corrections: Vec::new(),
        }
    }

    /// Integer range rule.
    ///
    /// Unparseable and out-of-range values both become `fallback`,
    /// itself held inside `[min, max]`.
    pub fn range(&mut self, key: &str, min: i64, max: i64, fallback: i64) -> i64 {
        let max = max.max(min);
        let found = self.map.get(key).map(str::to_owned);
        let value = found
            .as_deref()
            .and_then(|text| text.trim().parse::<i64>().ok())
            .filter(|v| (min..=max).contains(v))
            .unwrap_or_else(|| fallback.clamp(min, max));
        self.write(key, found, value.to_string());
        value
    }

    /// [`range`](Self::range) for pixel coordinates.
    pub fn range_u32(&mut self, key: &str, min: u32, max: u32, fallback: u32) -> u32 {
        let value = self.range(key, min.into(), max.into(), fallback.into());
        u32::try_from(value).unwrap_or(min)
    }

    /// [`range`](Self::range) for 8-bit channel values.
    pub fn range_u8(&mut self, key: &str, min: u8, max: u8, fallback: u8) -> u8 {
        let value = self.range(key, min.into(), max.into(), fallback.into());
        u8::try_from(value).unwrap_or(min)
    }

    /// Enumerated label rule. Unknown labels become [`Choice::DEFAULT`].
    pub fn choice<C: Choice>(&mut self, key: &str) -> C {
        let found = self.map.get(key).map(str::to_owned);
        let value = found
            .as_deref()
            .and_then(C::from_label)
            .unwrap_or(C::DEFAULT);
        self.write(key, found, value.label().to_owned());
        value
    }

    /// Boolean rule, accepting `true`/`false` in any case.
    pub fn flag(&mut self, key: &str, default: bool) -> bool {
        let found = self.map.get(key).map(str::to_owned);
        let value = found
            .as_deref()
            .and_then(|text| text.trim().to_ascii_lowercase().parse::<bool>().ok())
            .unwrap_or(default);
        self.write(key, found, value.to_string());
        value
    }

    /// Ordering rule: clamp the lower bound of a pair down to the upper one.
    pub fn at_most<T: Copy + Ord + ToString>(&mut self, low_key: &str, low: T, high: T) -> T {
        if low <= high {
            return low;
        }
        let found = self.map.get(low_key).map(str::to_owned);
        self.write(low_key, found, high.to_string());
        high
    }

    /// Finish validation, returning every correction made.
    #[must_use]
    pub fn finish(self) -> Vec<Correction> {
        self.corrections
    }

    fn write(&mut self, key: &str, found: Option<String>, applied: String) {
        if found.as_deref() == Some(applied.as_str()) {
            return;
        }
        tracing::warn!(
            key,
            found = found.as_deref().unwrap_or("<missing>"),
            applied = applied.as_str(),
            "corrected stage setting"
        );
        self.map.set(key, applied.clone());
        self.corrections.push(Correction {
            key: key.to_owned(),
            found,
            applied,
        });
    }
}
