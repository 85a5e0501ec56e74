//! Success outcomes that may carry a degradation reason.
//!
//! Pixel operations always produce *some* deterministic output. When that
//! output is less faithful than the caller might expect (no profile, an
//! operator the model cannot apply), the operation still succeeds and says
//! why through [`Outcome::Degraded`].

use crate::composite_op::CompositeOp;
use std::fmt;

/// Why an operation produced lower-fidelity output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// No profile transform was available; pixels went through plain,
    /// uncalibrated RGB.
    UncalibratedFallback,
    /// The model has no usable profile; decode/encode used uncalibrated math.
    MissingProfile,
    /// The model does not implement this operator; destination untouched.
    UnsupportedOperator(CompositeOp),
    /// The operator identifier is unknown; destination untouched.
    UnknownOperator(String),
    /// The model has no alpha channel; alpha was not written.
    NoAlphaChannel,
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UncalibratedFallback => f.write_str("uncalibrated fallback conversion"),
            Self::MissingProfile => f.write_str("no usable profile"),
            Self::UnsupportedOperator(op) => write!(f, "unsupported composite op '{op}'"),
            Self::UnknownOperator(id) => write!(f, "unknown composite op '{id}'"),
            Self::NoAlphaChannel => f.write_str("no alpha channel"),
        }
    }
}

/// Result of a pixel operation that succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Outcome {
    /// Output is as accurate as the model allows.
    #[default]
    Exact,
    /// Output was produced through a degraded path.
    Degraded(Degradation),
}

impl Outcome {
    /// Returns `true` for [`Outcome::Exact`].
    #[inline]
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact)
    }

    /// Returns `true` for [`Outcome::Degraded`].
    #[inline]
    pub fn is_degraded(&self) -> bool {
        !self.is_exact()
    }

    /// Degradation reason, if any.
    pub fn degradation(&self) -> Option<&Degradation> {
        match self {
            Self::Exact => None,
            Self::Degraded(d) => Some(d),
        }
    }

    /// Combines two outcomes, keeping the first degradation seen.
    pub fn merge(self, other: Outcome) -> Outcome {
        match self {
            Self::Exact => other,
            degraded => degraded,
        }
    }
}

impl From<Degradation> for Outcome {
    fn from(d: Degradation) -> Self {
        Self::Degraded(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_first() {
        let a = Outcome::Exact.merge(Degradation::MissingProfile.into());
        assert_eq!(a.degradation(), Some(&Degradation::MissingProfile));
        let b = a.merge(Degradation::NoAlphaChannel.into());
        assert_eq!(b.degradation(), Some(&Degradation::MissingProfile));
        assert!(Outcome::Exact.merge(Outcome::Exact).is_exact());
    }

    #[test]
    fn test_display() {
        let d = Degradation::UnsupportedOperator(CompositeOp::Hue);
        assert!(d.to_string().contains("hue"));
    }
}
