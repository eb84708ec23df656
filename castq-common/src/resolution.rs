//! Effective enqueue location resolution
//!
//! A feed either carries its own strategy or defers (`Global`) to the
//! process-wide default. The default is passed in by the caller on every call,
//! so resolution depends on nothing but its arguments.

use crate::enqueue_location::{EffectiveEnqueueLocation, EnqueueLocation};
use crate::feed_preferences::FeedPreferences;
use tracing::warn;

/// Strategy that actually applies to a feed
pub fn resolve_effective(
    prefs: &FeedPreferences,
    global_default: EffectiveEnqueueLocation,
) -> EffectiveEnqueueLocation {
    EffectiveEnqueueLocation::try_from(prefs.enqueue_location()).unwrap_or(global_default)
}

/// Untyped resolution for boundary code holding two raw locations
///
/// A `Global` global default is treated as `Back`, so `Global` never resolves to
/// `Global`.
pub fn resolve_location(
    feed_location: EnqueueLocation,
    global_default: EnqueueLocation,
) -> EffectiveEnqueueLocation {
    let global_default = EffectiveEnqueueLocation::try_from(global_default).unwrap_or_else(|_| {
        warn!("Global default enqueue location is GLOBAL, treating as BACK");
        EffectiveEnqueueLocation::Back
    });

    EffectiveEnqueueLocation::try_from(feed_location).unwrap_or(global_default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs_with(location: EnqueueLocation) -> FeedPreferences {
        let mut prefs = FeedPreferences::new(1);
        prefs.set_enqueue_location(Some(location));
        prefs
    }

    #[test]
    fn test_global_feed_uses_default() {
        let prefs = prefs_with(EnqueueLocation::Global);
        assert_eq!(
            resolve_effective(&prefs, EffectiveEnqueueLocation::Back),
            EffectiveEnqueueLocation::Back
        );
        assert_eq!(
            resolve_effective(&prefs, EffectiveEnqueueLocation::Random),
            EffectiveEnqueueLocation::Random
        );
    }

    #[test]
    fn test_feed_override_wins() {
        let prefs = prefs_with(EnqueueLocation::Front);
        assert_eq!(
            resolve_effective(&prefs, EffectiveEnqueueLocation::Back),
            EffectiveEnqueueLocation::Front
        );
    }

    #[test]
    fn test_resolve_location_never_returns_global() {
        for feed in EnqueueLocation::ALL {
            for global in EnqueueLocation::ALL {
                let resolved = resolve_location(feed, global);
                if !feed.is_global() {
                    assert_eq!(EnqueueLocation::from(resolved), feed);
                } else if !global.is_global() {
                    assert_eq!(EnqueueLocation::from(resolved), global);
                } else {
                    assert_eq!(resolved, EffectiveEnqueueLocation::Back);
                }
            }
        }
    }
}
