use std::fmt::Debug;

/// Numeric type the block MAC and the reductions operate on.
pub trait Element: Copy + Default + Debug + PartialEq + PartialOrd + Send + Sync + 'static {
    /// Additive identity, the starting value of every accumulation.
    const ZERO: Self;

    /// Value below every finite product, used to seed column maxima.
    const NEG_SENTINEL: Self;

    /// Single multiply-accumulate step: `acc + a * b`.
    ///
    /// Floats round once per operation (no fused multiply-add) so results
    /// match a sequential reference exactly.
    fn mac(acc: Self, a: Self, b: Self) -> Self;

    /// Numeric cast from a signed integer (indices, sentinels).
    fn from_i64(v: i64) -> Self;

    /// Larger of two values; `self` wins ties and unordered comparisons.
    #[inline(always)]
    fn max_of(self, other: Self) -> Self {
        if other > self {
            other
        } else {
            self
        }
    }
}

macro_rules! impl_element_float {
    ($($t:ty),*) => {
        $(
            impl Element for $t {
                const ZERO: Self = 0.0;
                const NEG_SENTINEL: Self = <$t>::NEG_INFINITY;

                #[inline(always)]
                fn mac(acc: Self, a: Self, b: Self) -> Self {
                    acc + a * b
                }

                #[inline(always)]
                fn from_i64(v: i64) -> Self {
                    v as $t
                }
            }
        )*
    };
}

macro_rules! impl_element_int {
    ($($t:ty),*) => {
        $(
            impl Element for $t {
                const ZERO: Self = 0;
                const NEG_SENTINEL: Self = <$t>::MIN;

                #[inline(always)]
                fn mac(acc: Self, a: Self, b: Self) -> Self {
                    acc.wrapping_add(a.wrapping_mul(b))
                }

                #[inline(always)]
                fn from_i64(v: i64) -> Self {
                    v as $t
                }
            }
        )*
    };
}

impl_element_float!(f32, f64);
impl_element_int!(i32, i64);
