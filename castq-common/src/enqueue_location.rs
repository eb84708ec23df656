//! Enqueue location strategies
//!
//! An [`EnqueueLocation`] decides where a newly queued item lands in the playback
//! queue. Each variant has a stable integer code used for persistence. The code
//! table is written out explicitly in both directions, so adding a variant never
//! shifts the meaning of codes already on disk.
//!
//! [`EffectiveEnqueueLocation`] is the concrete subset (everything except
//! `Global`). The process-wide default is typed with it, which is what keeps
//! resolution from ever deferring to itself.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::warn;

/// Where a newly queued item is inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnqueueLocation {
    /// Defer to the process-wide default
    #[default]
    Global,
    /// Append to the tail of the queue
    Back,
    /// Insert at the head of the queue
    Front,
    /// Insert right after the item currently playing (head if nothing is playing)
    AfterCurrentlyPlaying,
    /// Insert at a uniformly random slot, both ends included
    Random,
}

impl EnqueueLocation {
    /// All variants in code order
    pub const ALL: [EnqueueLocation; 5] = [
        EnqueueLocation::Global,
        EnqueueLocation::Back,
        EnqueueLocation::Front,
        EnqueueLocation::AfterCurrentlyPlaying,
        EnqueueLocation::Random,
    ];

    /// Decode a persisted code
    ///
    /// Total: any code outside 0..=4 decodes to `Global`.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => EnqueueLocation::Global,
            1 => EnqueueLocation::Back,
            2 => EnqueueLocation::Front,
            3 => EnqueueLocation::AfterCurrentlyPlaying,
            4 => EnqueueLocation::Random,
            other => {
                warn!("Unknown enqueue location code {}, using GLOBAL", other);
                EnqueueLocation::Global
            }
        }
    }

    /// Decode a nullable persisted code (legacy rows may carry NULL)
    pub fn from_optional_code(code: Option<i64>) -> Self {
        code.map(Self::from_code).unwrap_or_default()
    }

    /// Stable persistence code
    pub fn code(self) -> i64 {
        match self {
            EnqueueLocation::Global => 0,
            EnqueueLocation::Back => 1,
            EnqueueLocation::Front => 2,
            EnqueueLocation::AfterCurrentlyPlaying => 3,
            EnqueueLocation::Random => 4,
        }
    }

    /// Parse a case-sensitive variant name
    ///
    /// `None`, the empty string and unknown names all yield `Global`.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("GLOBAL") | None | Some("") => EnqueueLocation::Global,
            Some("BACK") => EnqueueLocation::Back,
            Some("FRONT") => EnqueueLocation::Front,
            Some("AFTER_CURRENTLY_PLAYING") => EnqueueLocation::AfterCurrentlyPlaying,
            Some("RANDOM") => EnqueueLocation::Random,
            Some(other) => {
                warn!("Unknown enqueue location name '{}', using GLOBAL", other);
                EnqueueLocation::Global
            }
        }
    }

    /// Variant name as used by persistence of settings and UI bindings
    pub fn name(self) -> &'static str {
        match self {
            EnqueueLocation::Global => "GLOBAL",
            EnqueueLocation::Back => "BACK",
            EnqueueLocation::Front => "FRONT",
            EnqueueLocation::AfterCurrentlyPlaying => "AFTER_CURRENTLY_PLAYING",
            EnqueueLocation::Random => "RANDOM",
        }
    }

    /// Human-readable label, presentation only
    pub fn display_label(self) -> &'static str {
        match self {
            EnqueueLocation::Global => "Use global setting",
            EnqueueLocation::Back => "Back",
            EnqueueLocation::Front => "Front",
            EnqueueLocation::AfterCurrentlyPlaying => "After current episode",
            EnqueueLocation::Random => "Random",
        }
    }

    /// (name, label, code) triples for a selectable list, in code order
    pub fn entries() -> impl Iterator<Item = (&'static str, &'static str, i64)> {
        Self::ALL.iter().map(|l| (l.name(), l.display_label(), l.code()))
    }

    /// True for the deferring variant
    pub fn is_global(self) -> bool {
        self == EnqueueLocation::Global
    }
}

impl fmt::Display for EnqueueLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for EnqueueLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for EnqueueLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = Option::<String>::deserialize(deserializer)?;
        Ok(EnqueueLocation::from_name(name.as_deref()))
    }
}

/// A concrete strategy: every [`EnqueueLocation`] except `Global`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EffectiveEnqueueLocation {
    #[default]
    Back,
    Front,
    AfterCurrentlyPlaying,
    Random,
}

impl EffectiveEnqueueLocation {
    /// Decode a stored global default name; `Global` and unknown names become `Back`
    pub fn from_name_or_default(name: Option<&str>) -> Self {
        Self::try_from(EnqueueLocation::from_name(name)).unwrap_or_default()
    }

    pub fn code(self) -> i64 {
        EnqueueLocation::from(self).code()
    }

    pub fn name(self) -> &'static str {
        EnqueueLocation::from(self).name()
    }

    pub fn display_label(self) -> &'static str {
        EnqueueLocation::from(self).display_label()
    }
}

impl From<EffectiveEnqueueLocation> for EnqueueLocation {
    fn from(location: EffectiveEnqueueLocation) -> Self {
        match location {
            EffectiveEnqueueLocation::Back => EnqueueLocation::Back,
            EffectiveEnqueueLocation::Front => EnqueueLocation::Front,
            EffectiveEnqueueLocation::AfterCurrentlyPlaying => {
                EnqueueLocation::AfterCurrentlyPlaying
            }
            EffectiveEnqueueLocation::Random => EnqueueLocation::Random,
        }
    }
}

/// Returned when `Global` is offered where a concrete strategy is required
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnresolvedGlobal;

impl fmt::Display for UnresolvedGlobal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GLOBAL is not a concrete enqueue location")
    }
}

impl std::error::Error for UnresolvedGlobal {}

impl TryFrom<EnqueueLocation> for EffectiveEnqueueLocation {
    type Error = UnresolvedGlobal;

    fn try_from(location: EnqueueLocation) -> Result<Self, Self::Error> {
        match location {
            EnqueueLocation::Global => Err(UnresolvedGlobal),
            EnqueueLocation::Back => Ok(EffectiveEnqueueLocation::Back),
            EnqueueLocation::Front => Ok(EffectiveEnqueueLocation::Front),
            EnqueueLocation::AfterCurrentlyPlaying => {
                Ok(EffectiveEnqueueLocation::AfterCurrentlyPlaying)
            }
            EnqueueLocation::Random => Ok(EffectiveEnqueueLocation::Random),
        }
    }
}

impl fmt::Display for EffectiveEnqueueLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for EffectiveEnqueueLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
