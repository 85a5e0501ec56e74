//! Composite operator identifiers.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A named rule for combining a source pixel with a destination pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompositeOp {
    /// Porter-Duff source over destination.
    #[default]
    Over,
    /// `src * dst`.
    Multiply,
    /// Inverse multiply.
    Screen,
    /// Multiply or screen depending on the destination.
    Overlay,
    /// Brighten the destination by the source.
    Dodge,
    /// Darken the destination by the source.
    Burn,
    /// `dst / src`.
    Divide,
    /// Per-channel minimum.
    Darken,
    /// Per-channel maximum.
    Lighten,
    /// `src + dst`, saturating.
    Add,
    /// `dst - src`, floored at zero.
    Subtract,
    /// `|src - dst|`.
    Diff,
    /// Source hue, destination saturation and value.
    Hue,
    /// Source saturation, destination hue and value.
    Saturation,
    /// Source value, destination hue and saturation.
    Value,
    /// Source hue and saturation, destination lightness.
    Color,
    /// Multiply destination alpha by source alpha.
    Erase,
    /// Raw pixel copy.
    Copy,
    /// Fill with transparent zero.
    Clear,
}

impl CompositeOp {
    /// Every operator, in declaration order.
    pub const ALL: [CompositeOp; 19] = [
        Self::Over,
        Self::Multiply,
        Self::Screen,
        Self::Overlay,
        Self::Dodge,
        Self::Burn,
        Self::Divide,
        Self::Darken,
        Self::Lighten,
        Self::Add,
        Self::Subtract,
        Self::Diff,
        Self::Hue,
        Self::Saturation,
        Self::Value,
        Self::Color,
        Self::Erase,
        Self::Copy,
        Self::Clear,
    ];

    /// Stable string identifier.
    pub const fn id(self) -> &'static str {
        match self {
            Self::Over => "normal",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::Dodge => "dodge",
            Self::Burn => "burn",
            Self::Divide => "divide",
            Self::Darken => "darken",
            Self::Lighten => "lighten",
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Diff => "diff",
            Self::Hue => "hue",
            Self::Saturation => "saturation",
            Self::Value => "value",
            Self::Color => "color",
            Self::Erase => "erase",
            Self::Copy => "copy",
            Self::Clear => "clear",
        }
    }

    /// Looks an operator up by identifier. `"over"` is accepted as an alias
    /// of `"normal"`.
    pub fn from_id(id: &str) -> Option<Self> {
        if id == "over" {
            return Some(Self::Over);
        }
        Self::ALL.into_iter().find(|op| op.id() == id)
    }

    /// Internal operators are usable but never offered in a selection UI.
    pub const fn is_internal(self) -> bool {
        matches!(self, Self::Erase | Self::Copy | Self::Clear)
    }

    /// Operators that work on hue/saturation and need RGB color channels.
    pub const fn needs_rgb(self) -> bool {
        matches!(self, Self::Hue | Self::Saturation | Self::Value | Self::Color)
    }
}

impl fmt::Display for CompositeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for CompositeOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| Error::invalid_argument(format!("unknown composite op '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trip() {
        for op in CompositeOp::ALL {
            assert_eq!(CompositeOp::from_id(op.id()), Some(op));
        }
        assert_eq!(CompositeOp::from_id("over"), Some(CompositeOp::Over));
        assert_eq!(CompositeOp::from_id("bogus"), None);
        assert_eq!("diff".parse::<CompositeOp>().ok(), Some(CompositeOp::Diff));
        assert!("bogus".parse::<CompositeOp>().is_err());
    }

    #[test]
    fn test_internal() {
        let internal: Vec<_> = CompositeOp::ALL.into_iter().filter(|op| op.is_internal()).collect();
        assert_eq!(internal, vec![CompositeOp::Erase, CompositeOp::Copy, CompositeOp::Clear]);
    }
}
