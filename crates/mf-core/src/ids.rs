use core::fmt;
use core::num::NonZeroU32;

/// Engine-assigned identifier for a model or solution group.
///
/// - engine ids are 1-based, so the raw value is stored as-is
/// - `NonZero` lets `Option<Id>` stay the size of `Id`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Id(NonZeroU32);

impl Id {
    /// Wrap a 1-based engine id. Returns `None` for values below 1.
    pub fn new(raw: i32) -> Option<Self> {
        u32::try_from(raw).ok().and_then(NonZeroU32::new).map(Self)
    }

    /// Wrap a 1-based engine id, treating anything below 1 as 1.
    ///
    /// Single-model simulations report an id of 0 for their only model.
    pub fn clamped(raw: i32) -> Self {
        Self::new(raw).unwrap_or(Self(NonZeroU32::MIN))
    }

    /// The 1-based engine value.
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// 0-based position, for indexing per-id tables.
    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.get())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Domain-specific ID aliases for clarity (no runtime cost).
pub type ModelId = Id;
pub type SolutionId = Id;
