//! Hide/show rule storage.
//!
//! Rules are stored as densely numbered `anim_hs_<i>_<field>` quintuples and
//! follow the same load/edit/flush discipline as keyframes, without a minimum
//! count.

use std::fmt;
use std::str::FromStr;

use crate::core::keys::hs_key;
use crate::core::{AttrValue, AttributeStore, HsField};
use crate::util::{DriverValue, Error, Result};

/// Whether a rule hides or shows the component inside its range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HideShowMode {
    Hide,
    Show,
}

impl HideShowMode {
    /// Convert to the stored string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hide => "hide",
            Self::Show => "show",
        }
    }
}

impl FromStr for HideShowMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hide" => Ok(Self::Hide),
            "show" => Ok(Self::Show),
            _ => Err(Error::invalid_value("mode", s)),
        }
    }
}

impl fmt::Display for HideShowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility of the component at a given driver value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

impl Visibility {
    #[inline]
    pub fn is_visible(self) -> bool {
        matches!(self, Self::Visible)
    }
}

/// A single hide/show rule.
#[derive(Clone, Debug, PartialEq)]
pub struct HideShowRule {
    pub mode: HideShowMode,
    pub dataref: String,
    /// Array index into `dataref`, empty for scalars.
    pub index: String,
    pub from: DriverValue,
    pub to: DriverValue,
}

impl HideShowRule {
    /// Rule for `dataref[index]` spanning `0..1`.
    pub fn new(mode: HideShowMode, dataref: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            mode,
            dataref: dataref.into(),
            index: index.into(),
            from: 0.0,
            to: 1.0,
        }
    }

    /// Check if `value` lies inside the rule's range, in either orientation.
    pub fn contains(&self, value: DriverValue) -> bool {
        let (lo, hi) = if self.from <= self.to {
            (self.from, self.to)
        } else {
            (self.to, self.from)
        };
        value >= lo && value <= hi
    }

    /// Check if the rule is driven by `dataref[index]`.
    pub fn matches_driver(&self, dataref: &str, index: &str) -> bool {
        self.dataref == dataref && self.index.trim() == index.trim()
    }
}

/// Ordered hide/show rules of one component.
#[derive(Clone, Debug, Default)]
pub struct HideShowStore {
    rules: Vec<HideShowRule>,
    loaded: usize,
}

impl HideShowStore {
    /// Create an empty store not backed by any attributes yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count rules present in the attribute store.
    pub fn count<S: AttributeStore + ?Sized>(store: &S, dict: &str) -> usize {
        let mut n = 0;
        while store.contains(dict, &hs_key(n, HsField::Mode)) {
            n += 1;
        }
        n
    }

    /// Read all rules from the attribute store.
    pub fn load<S: AttributeStore + ?Sized>(store: &S, dict: &str) -> Result<Self> {
        let n = Self::count(store, dict);
        let mut rules = Vec::with_capacity(n);
        for i in 0..n {
            let text = |field| store.get_text(dict, &hs_key(i, field)).unwrap_or_default();
            let number = |field| -> Result<DriverValue> {
                let key = hs_key(i, field);
                let raw = store.get(dict, &key);
                raw.as_ref().and_then(AttrValue::as_f64).ok_or_else(|| {
                    Error::invalid_value(&key, raw.as_ref().map(|v| v.to_string()).unwrap_or_default())
                })
            };

            let mode_text = text(HsField::Mode);
            let mode = mode_text
                .parse::<HideShowMode>()
                .map_err(|_| Error::invalid_value(hs_key(i, HsField::Mode), mode_text.clone()))?;

            rules.push(HideShowRule {
                mode,
                dataref: text(HsField::Dataref),
                index: text(HsField::Index),
                from: number(HsField::From)?,
                to: number(HsField::To)?,
            });
        }
        Ok(Self { rules, loaded: n })
    }

    /// Write rules back, removing slots past the current end.
    pub fn flush<S: AttributeStore + ?Sized>(&mut self, store: &mut S, dict: &str) {
        for (i, rule) in self.rules.iter().enumerate() {
            store.set(dict, &hs_key(i, HsField::Mode), rule.mode.as_str().into());
            store.set(dict, &hs_key(i, HsField::Dataref), rule.dataref.as_str().into());
            store.set(dict, &hs_key(i, HsField::Index), rule.index.as_str().into());
            store.set(dict, &hs_key(i, HsField::From), AttrValue::Str(rule.from.to_string()));
            store.set(dict, &hs_key(i, HsField::To), AttrValue::Str(rule.to.to_string()));
        }
        for i in self.rules.len()..self.loaded {
            for field in HsField::ALL {
                store.delete(dict, &hs_key(i, field));
            }
        }
        self.loaded = self.rules.len();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule at `index`.
    pub fn get(&self, index: usize) -> Result<&HideShowRule> {
        self.rules
            .get(index)
            .ok_or_else(|| Error::not_found("hide/show rule", index, self.rules.len()))
    }

    /// Mutable rule at `index`.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut HideShowRule> {
        let count = self.rules.len();
        self.rules
            .get_mut(index)
            .ok_or_else(|| Error::not_found("hide/show rule", index, count))
    }

    pub fn iter(&self) -> impl Iterator<Item = &HideShowRule> {
        self.rules.iter()
    }

    /// Mode a newly inserted rule starts with: the first rule hides, later ones show.
    pub fn default_mode(&self) -> HideShowMode {
        if self.rules.is_empty() {
            HideShowMode::Hide
        } else {
            HideShowMode::Show
        }
    }

    /// Insert `rule` at `index`, shifting later rules up.
    pub fn insert_at(&mut self, index: usize, rule: HideShowRule) -> Result<()> {
        let n = self.rules.len();
        if index > n {
            return Err(Error::not_found("hide/show rule", index, n));
        }
        self.rules.insert(index, rule);
        Ok(())
    }

    /// Remove rule `index`, shifting later rules down.
    pub fn delete_at(&mut self, index: usize) -> Result<HideShowRule> {
        let n = self.rules.len();
        if index >= n {
            return Err(Error::not_found("hide/show rule", index, n));
        }
        Ok(self.rules.remove(index))
    }

    /// Visibility at `value` of `dataref[index]`.
    ///
    /// Rules driven by other datarefs are skipped. Matching rules apply in
    /// order, so the last one containing `value` wins.
    pub fn visibility_at(&self, dataref: &str, index: &str, value: DriverValue) -> Visibility {
        self.rules
            .iter()
            .filter(|r| r.matches_driver(dataref, index) && r.contains(value))
            .fold(Visibility::Visible, |_, r| match r.mode {
                HideShowMode::Hide => Visibility::Hidden,
                HideShowMode::Show => Visibility::Visible,
            })
    }
}
