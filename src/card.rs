//! Card families served by the core

use core::fmt;
use core::ops::RangeInclusive;
use core::str::FromStr;

/// Readout card family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CardType {
    /// C-RORC: one DMA channel per optical link
    Crorc,
    /// CRU: a single DMA channel per endpoint
    Cru,
    /// Software-only card with no hardware behind it
    Dummy,
}

impl CardType {
    /// Lowercase name used in logs and lock names
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CardType::Crorc => "crorc",
            CardType::Cru => "cru",
            CardType::Dummy => "dummy",
        }
    }

    /// DMA channel numbers this card family accepts
    #[must_use]
    pub const fn allowed_channels(self) -> RangeInclusive<u32> {
        match self {
            CardType::Crorc => 0..=5,
            CardType::Cru => 0..=0,
            CardType::Dummy => 0..=7,
        }
    }

    /// Whether `channel` exists on this card family
    #[must_use]
    pub fn is_channel_allowed(self, channel: u32) -> bool {
        self.allowed_channels().contains(&channel)
    }

    /// Whether each channel gets its own interprocess lock.
    ///
    /// Only the C-RORC runs independent DMA engines per channel; other
    /// families lock the whole card.
    #[must_use]
    pub const fn has_per_channel_lock(self) -> bool {
        matches!(self, CardType::Crorc)
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown card type name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown card type '{0}'")]
pub struct ParseCardTypeError(String);

impl FromStr for CardType {
    type Err = ParseCardTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "crorc" => Ok(CardType::Crorc),
            "cru" => Ok(CardType::Cru),
            "dummy" => Ok(CardType::Dummy),
            _ => Err(ParseCardTypeError(s.to_owned())),
        }
    }
}
