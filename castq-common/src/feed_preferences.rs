//! Per-feed preferences
//!
//! One [`FeedPreferences`] exists per subscribed feed. The enqueue location is the
//! only field with policy attached; the rest ride along and must survive a trip
//! through [`FeedPreferencesRow`] untouched.

use crate::enqueue_location::EnqueueLocation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// Playback speed sentinel meaning "use the global playback speed"
pub const SPEED_USE_GLOBAL: f32 = -1.0;

/// Per-feed automatic download override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutoDownloadSetting {
    Disabled,
    Enabled,
    #[default]
    Global,
}

impl AutoDownloadSetting {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => AutoDownloadSetting::Disabled,
            1 => AutoDownloadSetting::Enabled,
            _ => AutoDownloadSetting::Global,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            AutoDownloadSetting::Disabled => 0,
            AutoDownloadSetting::Enabled => 1,
            AutoDownloadSetting::Global => 2,
        }
    }
}

/// What happens to a downloaded episode once played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutoDeleteAction {
    #[default]
    Global,
    Always,
    Never,
}

impl AutoDeleteAction {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => AutoDeleteAction::Always,
            2 => AutoDeleteAction::Never,
            _ => AutoDeleteAction::Global,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            AutoDeleteAction::Global => 0,
            AutoDeleteAction::Always => 1,
            AutoDeleteAction::Never => 2,
        }
    }
}

/// Loudness adjustment applied to every episode of a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumeAdaptionSetting {
    #[default]
    Off,
    LightReduction,
    HeavyReduction,
    LightBoost,
    MediumBoost,
    HeavyBoost,
}

impl VolumeAdaptionSetting {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => VolumeAdaptionSetting::LightReduction,
            2 => VolumeAdaptionSetting::HeavyReduction,
            3 => VolumeAdaptionSetting::LightBoost,
            4 => VolumeAdaptionSetting::MediumBoost,
            5 => VolumeAdaptionSetting::HeavyBoost,
            _ => VolumeAdaptionSetting::Off,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            VolumeAdaptionSetting::Off => 0,
            VolumeAdaptionSetting::LightReduction => 1,
            VolumeAdaptionSetting::HeavyReduction => 2,
            VolumeAdaptionSetting::LightBoost => 3,
            VolumeAdaptionSetting::MediumBoost => 4,
            VolumeAdaptionSetting::HeavyBoost => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipSilence {
    #[default]
    Global,
    Off,
    Aggressive,
}

impl SkipSilence {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => SkipSilence::Off,
            2 => SkipSilence::Aggressive,
            _ => SkipSilence::Global,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            SkipSilence::Global => 0,
            SkipSilence::Off => 1,
            SkipSilence::Aggressive => 2,
        }
    }
}

/// Handling of newly published episodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NewEpisodesAction {
    #[default]
    Global,
    AddToInbox,
    Nothing,
}

impl NewEpisodesAction {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => NewEpisodesAction::AddToInbox,
            2 => NewEpisodesAction::Nothing,
            _ => NewEpisodesAction::Global,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            NewEpisodesAction::Global => 0,
            NewEpisodesAction::AddToInbox => 1,
            NewEpisodesAction::Nothing => 2,
        }
    }
}

/// Episode filter applied to automatic downloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FeedFilter {
    pub include_terms: String,
    pub exclude_terms: String,
    /// 0 = no minimum
    pub minimal_duration_secs: i64,
}

impl FeedFilter {
    pub fn new(
        include_terms: impl Into<String>,
        exclude_terms: impl Into<String>,
        minimal_duration_secs: i64,
    ) -> Self {
        Self {
            include_terms: include_terms.into(),
            exclude_terms: exclude_terms.into(),
            minimal_duration_secs,
        }
    }
}

/// Preferences of one feed
///
/// `feed_id` is fixed at construction. The enqueue location changes only through
/// [`FeedPreferences::set_enqueue_location`], which flags the record dirty until the
/// persistence layer calls [`FeedPreferences::mark_clean`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedPreferences {
    feed_id: i64,
    auto_download: AutoDownloadSetting,
    keep_updated: bool,
    auto_delete_action: AutoDeleteAction,
    volume_adaption: VolumeAdaptionSetting,
    username: Option<String>,
    /// Persisted, never serialized to clients
    #[serde(skip_serializing)]
    password: Option<String>,
    filter: FeedFilter,
    playback_speed: f32,
    skip_intro_secs: i64,
    skip_ending_secs: i64,
    skip_silence: SkipSilence,
    episode_notification: bool,
    new_episodes_action: NewEpisodesAction,
    tags: BTreeSet<String>,
    enqueue_location: EnqueueLocation,
    #[serde(skip)]
    dirty: bool,
}

impl FeedPreferences {
    /// Preferences for a freshly subscribed feed
    pub fn new(feed_id: i64) -> Self {
        Self {
            feed_id,
            auto_download: AutoDownloadSetting::Global,
            keep_updated: true,
            auto_delete_action: AutoDeleteAction::Global,
            volume_adaption: VolumeAdaptionSetting::Off,
            username: None,
            password: None,
            filter: FeedFilter::default(),
            playback_speed: SPEED_USE_GLOBAL,
            skip_intro_secs: 0,
            skip_ending_secs: 0,
            skip_silence: SkipSilence::Global,
            episode_notification: false,
            new_episodes_action: NewEpisodesAction::Global,
            tags: BTreeSet::new(),
            enqueue_location: EnqueueLocation::Global,
            dirty: false,
        }
    }

    /// Rebuild preferences from already-decoded persisted fields
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        feed_id: i64,
        auto_download: AutoDownloadSetting,
        keep_updated: bool,
        auto_delete_action: AutoDeleteAction,
        volume_adaption: VolumeAdaptionSetting,
        username: Option<String>,
        password: Option<String>,
        filter: FeedFilter,
        playback_speed: f32,
        skip_intro_secs: i64,
        skip_ending_secs: i64,
        skip_silence: SkipSilence,
        episode_notification: bool,
        new_episodes_action: NewEpisodesAction,
        tags: BTreeSet<String>,
        enqueue_location: EnqueueLocation,
    ) -> Self {
        Self {
            feed_id,
            auto_download,
            keep_updated,
            auto_delete_action,
            volume_adaption,
            username,
            password,
            filter,
            playback_speed,
            skip_intro_secs,
            skip_ending_secs,
            skip_silence,
            episode_notification,
            new_episodes_action,
            tags,
            enqueue_location,
            dirty: false,
        }
    }

    pub fn feed_id(&self) -> i64 {
        self.feed_id
    }

    pub fn enqueue_location(&self) -> EnqueueLocation {
        self.enqueue_location
    }

    /// Store a new enqueue location; `None` stores `Global`
    pub fn set_enqueue_location(&mut self, location: Option<EnqueueLocation>) {
        self.enqueue_location = location.unwrap_or(EnqueueLocation::Global);
        self.dirty = true;
    }

    /// Changed since the last successful flush
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn auto_download(&self) -> AutoDownloadSetting {
        self.auto_download
    }

    pub fn keep_updated(&self) -> bool {
        self.keep_updated
    }

    pub fn auto_delete_action(&self) -> AutoDeleteAction {
        self.auto_delete_action
    }

    pub fn volume_adaption(&self) -> VolumeAdaptionSetting {
        self.volume_adaption
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn filter(&self) -> &FeedFilter {
        &self.filter
    }

    pub fn playback_speed(&self) -> f32 {
        self.playback_speed
    }

    pub fn skip_intro_secs(&self) -> i64 {
        self.skip_intro_secs
    }

    pub fn skip_ending_secs(&self) -> i64 {
        self.skip_ending_secs
    }

    pub fn skip_silence(&self) -> SkipSilence {
        self.skip_silence
    }

    pub fn episode_notification(&self) -> bool {
        self.episode_notification
    }

    pub fn new_episodes_action(&self) -> NewEpisodesAction {
        self.new_episodes_action
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Persisted form of these preferences
    pub fn to_row(&self) -> FeedPreferencesRow {
        FeedPreferencesRow {
            feed_id: self.feed_id,
            auto_download: self.auto_download.code(),
            keep_updated: self.keep_updated,
            auto_delete_action: self.auto_delete_action.code(),
            volume_adaption: self.volume_adaption.code(),
            username: self.username.clone(),
            password: self.password.clone(),
            include_filter: self.filter.include_terms.clone(),
            exclude_filter: self.filter.exclude_terms.clone(),
            minimal_duration_filter: self.filter.minimal_duration_secs,
            playback_speed: f64::from(self.playback_speed),
            skip_intro: self.skip_intro_secs,
            skip_ending: self.skip_ending_secs,
            skip_silence: self.skip_silence.code(),
            episode_notification: self.episode_notification,
            new_episodes_action: self.new_episodes_action.code(),
            // Serializing a set of strings cannot fail
            tags: serde_json::to_string(&self.tags).unwrap_or_else(|_| "[]".to_string()),
            enqueue_location: Some(self.enqueue_location.code()),
        }
    }

    /// Decode a persisted row; never fails
    pub fn from_row(row: FeedPreferencesRow) -> Self {
        let tags = match serde_json::from_str::<BTreeSet<String>>(&row.tags) {
            Ok(tags) => tags,
            Err(e) => {
                warn!(
                    "Feed {}: unreadable tags '{}' ({}), using empty set",
                    row.feed_id, row.tags, e
                );
                BTreeSet::new()
            }
        };

        Self::restore(
            row.feed_id,
            AutoDownloadSetting::from_code(row.auto_download),
            row.keep_updated,
            AutoDeleteAction::from_code(row.auto_delete_action),
            VolumeAdaptionSetting::from_code(row.volume_adaption),
            row.username,
            row.password,
            FeedFilter::new(
                row.include_filter,
                row.exclude_filter,
                row.minimal_duration_filter,
            ),
            row.playback_speed as f32,
            row.skip_intro,
            row.skip_ending,
            SkipSilence::from_code(row.skip_silence),
            row.episode_notification,
            NewEpisodesAction::from_code(row.new_episodes_action),
            tags,
            EnqueueLocation::from_optional_code(row.enqueue_location),
        )
    }
}

/// One `feed_preferences` table row
///
/// Coded enums are stored as integers; `enqueue_location` is nullable because
/// rows written before the column existed may carry NULL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FeedPreferencesRow {
    pub feed_id: i64,
    pub auto_download: i64,
    pub keep_updated: bool,
    pub auto_delete_action: i64,
    pub volume_adaption: i64,
    pub username: Option<String>,
    pub password: Option<String>,
    pub include_filter: String,
    pub exclude_filter: String,
    pub minimal_duration_filter: i64,
    pub playback_speed: f64,
    pub skip_intro: i64,
    pub skip_ending: i64,
    pub skip_silence: i64,
    pub episode_notification: bool,
    pub new_episodes_action: i64,
    pub tags: String,
    pub enqueue_location: Option<i64>,
}
