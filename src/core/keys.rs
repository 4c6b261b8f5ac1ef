//! Attribute key names for animation data.
//!
//! Store keys carry an `anim_` prefix so they share a dictionary with other
//! exporter attributes. Command keys (what the editing surface sends to
//! `set_var`) are the same names without the prefix and parse into [`VarKey`].

use std::fmt;
use std::str::FromStr;

use crate::util::Error;

/// Driver (dataref) name. Its presence marks the component as animated.
pub const KEY_DATAREF: &str = "anim_dataref";
/// Optional array index into the driver.
pub const KEY_INDEX: &str = "anim_index";
/// Optional loop period.
pub const KEY_LOOP: &str = "anim_loop";

/// Driver value of keyframe `i`.
pub fn frame_key(i: usize) -> String {
    format!("anim_frame_{}", i)
}

/// Row-major transform of keyframe `i`.
pub fn matrix_key(i: usize) -> String {
    format!("anim_matrix_{}", i)
}

/// Field `field` of hide/show rule `i`.
pub fn hs_key(i: usize, field: HsField) -> String {
    format!("anim_hs_{}_{}", i, field.as_str())
}

/// Field of a hide/show rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HsField {
    Mode,
    Dataref,
    Index,
    From,
    To,
}

impl HsField {
    /// All fields, in storage order.
    pub const ALL: [HsField; 5] = [Self::Mode, Self::Dataref, Self::Index, Self::From, Self::To];

    /// Key suffix for this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mode => "mode",
            Self::Dataref => "dataref",
            Self::Index => "index",
            Self::From => "from",
            Self::To => "to",
        }
    }

}

impl FromStr for HsField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| Error::UnknownKey(s.to_string()))
    }
}

/// A command key sent by the editing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarKey {
    Dataref,
    Index,
    Loop,
    Frame(usize),
    HideShow(usize, HsField),
}

impl VarKey {
    /// Key under which this value is stored.
    pub fn store_key(&self) -> String {
        match self {
            Self::Dataref => KEY_DATAREF.to_string(),
            Self::Index => KEY_INDEX.to_string(),
            Self::Loop => KEY_LOOP.to_string(),
            Self::Frame(i) => frame_key(*i),
            Self::HideShow(i, field) => hs_key(*i, *field),
        }
    }

    /// Whether values for this key must parse as numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Loop | Self::Frame(_) | Self::HideShow(_, HsField::From | HsField::To)
        )
    }
}

impl FromStr for VarKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || Error::UnknownKey(s.to_string());
        match s {
            "dataref" => return Ok(Self::Dataref),
            "index" => return Ok(Self::Index),
            "loop" => return Ok(Self::Loop),
            _ => {}
        }
        if let Some(rest) = s.strip_prefix("frame_") {
            let i = rest.parse().map_err(|_| unknown())?;
            return Ok(Self::Frame(i));
        }
        if let Some(rest) = s.strip_prefix("hs_") {
            let (i, field) = rest.split_once('_').ok_or_else(unknown)?;
            let i = i.parse().map_err(|_| unknown())?;
            let field: HsField = field.parse().map_err(|_| unknown())?;
            return Ok(Self::HideShow(i, field));
        }
        Err(unknown())
    }
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dataref => write!(f, "dataref"),
            Self::Index => write!(f, "index"),
            Self::Loop => write!(f, "loop"),
            Self::Frame(i) => write!(f, "frame_{}", i),
            Self::HideShow(i, field) => write!(f, "hs_{}_{}", i, field.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_keys() {
        assert_eq!(frame_key(3), "anim_frame_3");
        assert_eq!(matrix_key(0), "anim_matrix_0");
        assert_eq!(hs_key(2, HsField::From), "anim_hs_2_from");
    }

    #[test]
    fn test_var_key_parse() {
        assert_eq!("dataref".parse::<VarKey>().unwrap(), VarKey::Dataref);
        assert_eq!("loop".parse::<VarKey>().unwrap(), VarKey::Loop);
        assert_eq!("frame_12".parse::<VarKey>().unwrap(), VarKey::Frame(12));
        assert_eq!(
            "hs_1_mode".parse::<VarKey>().unwrap(),
            VarKey::HideShow(1, HsField::Mode)
        );
        assert_eq!(
            "hs_0_to".parse::<VarKey>().unwrap().store_key(),
            "anim_hs_0_to"
        );

        assert!(matches!("frame_x".parse::<VarKey>(), Err(Error::UnknownKey(_))));
        assert!(matches!("hs_1_colour".parse::<VarKey>(), Err(Error::UnknownKey(_))));
        assert!(matches!("matrix_0".parse::<VarKey>(), Err(Error::UnknownKey(_))));
    }

    #[test]
    fn test_var_key_display_roundtrip() {
        for key in [
            VarKey::Dataref,
            VarKey::Index,
            VarKey::Loop,
            VarKey::Frame(4),
            VarKey::HideShow(7, HsField::Dataref),
        ] {
            assert_eq!(key.to_string().parse::<VarKey>().unwrap(), key);
        }
    }

    #[test]
    fn test_hs_field_parse() {
        for field in HsField::ALL {
            assert_eq!(field.as_str().parse::<HsField>().unwrap(), field);
        }
        assert!(matches!("colour".parse::<HsField>(), Err(Error::UnknownKey(_))));
    }

    #[test]
    fn test_numeric_keys() {
        assert!(VarKey::Loop.is_numeric());
        assert!(VarKey::Frame(0).is_numeric());
        assert!(VarKey::HideShow(0, HsField::To).is_numeric());
        assert!(!VarKey::Dataref.is_numeric());
        assert!(!VarKey::HideShow(0, HsField::Mode).is_numeric());
    }
}
