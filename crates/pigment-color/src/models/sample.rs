//! Lane storage types a [`PixelModel`](super::PixelModel) can be built over.

use half::f16;
use pigment_core::{ChannelType, CompositeOp, Outcome};

use crate::composite::{self, CompositeArgs, LaneMap};

/// Storage type shared by every lane of a model.
///
/// Integer samples composite in native fixed-point units, float samples in
/// unit floats. Both read and write through [`ChannelType`].
pub trait Sample: Send + Sync + 'static {
    /// Channel storage type.
    const TYPE: ChannelType;

    /// Reads one lane as a unit float.
    #[inline]
    fn read_unit(bytes: &[u8]) -> f32 {
        Self::TYPE.read_unit(bytes)
    }

    /// Writes one lane from a unit float.
    #[inline]
    fn write_unit(bytes: &mut [u8], value: f32) {
        Self::TYPE.write_unit(bytes, value);
    }

    /// Composites a validated same-space region.
    fn composite(lanes: &LaneMap, op: CompositeOp, args: CompositeArgs<'_>) -> Outcome;
}

macro_rules! integer_sample {
    ($t:ty, $ty:expr) => {
        impl Sample for $t {
            const TYPE: ChannelType = $ty;

            fn composite(lanes: &LaneMap, op: CompositeOp, args: CompositeArgs<'_>) -> Outcome {
                composite::composite::<$t>(lanes, op, args)
            }
        }
    };
}

macro_rules! float_sample {
    ($t:ty, $ty:expr) => {
        impl Sample for $t {
            const TYPE: ChannelType = $ty;

            fn composite(lanes: &LaneMap, op: CompositeOp, args: CompositeArgs<'_>) -> Outcome {
                composite::composite_float::<$t>(lanes, op, args)
            }
        }
    };
}

integer_sample!(u8, ChannelType::U8);
integer_sample!(u16, ChannelType::U16);
float_sample!(f16, ChannelType::F16);
float_sample!(f32, ChannelType::F32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_access() {
        let mut b = [0u8; 4];
        <u16 as Sample>::write_unit(&mut b, 1.0);
        assert_eq!(<u16 as Sample>::read_unit(&b), 1.0);
        <f16 as Sample>::write_unit(&mut b, 0.75);
        assert_eq!(<f16 as Sample>::read_unit(&b), 0.75);
        <f32 as Sample>::write_unit(&mut b, 1.25);
        assert_eq!(<f32 as Sample>::read_unit(&b), 1.25);
        // integers clamp, floats do not
        <u8 as Sample>::write_unit(&mut b, 1.25);
        assert_eq!(b[0], 255);
    }
}
