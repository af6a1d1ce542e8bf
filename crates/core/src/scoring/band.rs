use std::fmt;

/// IELTS band score in half-point steps, always within `[1, 9]`.
///
/// Stored as a count of half points (2..=18) so arithmetic stays exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Band(u8);

impl Band {
    pub const MIN: Band = Band(2);
    pub const MAX: Band = Band(18);

    /// Clamps `half_steps` into the band range.
    #[must_use]
    pub fn from_half_steps(half_steps: u64) -> Self {
        let clamped = half_steps.clamp(u64::from(Self::MIN.0), u64::from(Self::MAX.0));
        Self(u8::try_from(clamped).unwrap_or(Self::MAX.0))
    }

    #[must_use]
    pub fn from_whole(band: u64) -> Self {
        Self::from_half_steps(band.saturating_mul(2))
    }

    #[must_use]
    pub fn half_steps(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn value(self) -> f64 {
        f64::from(self.0) / 2.0
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{}.0", self.0 / 2)
        } else {
            write!(f, "{}.5", self.0 / 2)
        }
    }
}

impl From<Band> for f64 {
    fn from(band: Band) -> Self {
        band.value()
    }
}
