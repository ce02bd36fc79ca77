use core::fmt;
use core::num::NonZeroU32;

/// Compact, stable identifier for a radial design station.
///
/// Stations are numbered hub to tip starting at 0 (design order).
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<StationId>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId(NonZeroU32);

impl StationId {
    /// Create an id from a 0-based index by storing index+1.
    pub fn from_index(index: usize) -> Self {
        let stored = u32::try_from(index)
            .ok()
            .and_then(|i| i.checked_add(1))
            .and_then(NonZeroU32::new)
            .unwrap_or(NonZeroU32::MAX);
        Self(stored)
    }

    /// Recover the 0-based index.
    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.index())
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}
