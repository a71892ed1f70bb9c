use super::Element;

/// A 32-bit word as carried on an operand or result stream.
///
/// Packet headers share the stream with data, so every wire type exposes
/// its raw bits.
pub trait WireWord: Copy + Default + std::fmt::Debug + PartialEq + Send + Sync + 'static {
    fn from_bits(bits: u32) -> Self;
    fn to_bits(self) -> u32;
}

impl WireWord for u32 {
    #[inline]
    fn from_bits(bits: u32) -> Self {
        bits
    }

    #[inline]
    fn to_bits(self) -> u32 {
        self
    }
}

impl WireWord for i32 {
    #[inline]
    fn from_bits(bits: u32) -> Self {
        bits as i32
    }

    #[inline]
    fn to_bits(self) -> u32 {
        self as u32
    }
}

impl WireWord for f32 {
    #[inline]
    fn from_bits(bits: u32) -> Self {
        f32::from_bits(bits)
    }

    #[inline]
    fn to_bits(self) -> u32 {
        f32::to_bits(self)
    }
}

/// Straight numeric cast between an element type and a wire type.
///
/// Float-to-integer casts truncate toward zero and saturate, so a column
/// that never saw a product (still at `-inf`) goes out as `i32::MIN`.
pub trait WireCodec<W: WireWord>: Element {
    fn from_wire(w: W) -> Self;
    fn to_wire(self) -> W;
}

macro_rules! impl_wire_codec {
    ($($elem:ty => $wire:ty),* $(,)?) => {
        $(
            impl WireCodec<$wire> for $elem {
                #[inline]
                fn from_wire(w: $wire) -> Self {
                    w as $elem
                }

                #[inline]
                fn to_wire(self) -> $wire {
                    self as $wire
                }
            }
        )*
    };
}

impl_wire_codec! {
    f32 => i32,
    f32 => f32,
    f32 => u32,
    f64 => i32,
    f64 => f32,
    i32 => i32,
    i32 => u32,
    i64 => i32,
}
