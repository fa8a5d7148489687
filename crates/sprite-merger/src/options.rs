//! Options for sprite merging

/// How a high-density atlas is paired with its regular counterpart when the
/// two tiers end up with different counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum HiDpiMatching {
    /// The @2x atlas carrying the same source key
    #[default]
    ByName,
    /// The @2x atlas at the same index after deduplication
    ByPosition,
}

/// Options for sprite merging
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub hidpi_matching: HiDpiMatching,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hidpi_matching(mut self, matching: HiDpiMatching) -> Self {
        self.hidpi_matching = matching;
        self
    }
}
