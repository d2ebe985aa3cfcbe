//! Mental health value type.
//!
//! [`MentalHealth`] is a scalar clamped to `[0, 100]`. Every constructor and
//! arithmetic helper re-clamps, so an out-of-range mutation is silently pulled
//! back into range rather than reported as an error.

/// The player's depleting survival resource.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct MentalHealth(f32);

impl Default for MentalHealth {
    fn default() -> Self {
        Self::FULL
    }
}

impl MentalHealth {
    pub const MAX: f32 = 100.0;
    pub const FULL: MentalHealth = MentalHealth(Self::MAX);
    pub const EMPTY: MentalHealth = MentalHealth(0.0);

    /// Build a value, clamping into `[0, 100]`. `NaN` counts as empty.
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            Self::EMPTY
        } else {
            MentalHealth(value.clamp(0.0, Self::MAX))
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Value as a fraction of full, in `[0, 1]`.
    pub fn fraction(self) -> f32 {
        self.0 / Self::MAX
    }

    pub fn is_depleted(self) -> bool {
        self.0 <= 0.0
    }

    /// Subtract `amount`, stopping at zero. Negative amounts are ignored.
    pub fn saturating_sub(self, amount: f32) -> Self {
        if amount.is_nan() || amount <= 0.0 {
            return self;
        }
        Self::new(self.0 - amount)
    }

    /// Add `amount`, stopping at full. Negative amounts are ignored.
    pub fn saturating_add(self, amount: f32) -> Self {
        if amount.is_nan() || amount <= 0.0 {
            return self;
        }
        Self::new(self.0 + amount)
    }
}
