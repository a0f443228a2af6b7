use core::fmt;

/// The sequence index of the value being agreed upon.
///
/// One instance runs per height, and heights only ever move forward.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Height(u64);

impl Height {
    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub const fn increment(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<u64> for Height {
    fn from(height: u64) -> Self {
        Self::new(height)
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
