//! Prediction-loop logic
//!
//! Feature extraction from detected landmarks and the label-to-action mapping
//! that drives the gallery. Kept free of camera, ML, and UI types beyond the
//! landmark set itself so the cooldown behavior is testable with a simulated
//! clock.

use crate::gallery::Gallery;
use crate::ml::{HandLandmarkSet, LANDMARK_COUNT};

/// Length of the classifier feature vector (21 landmarks x x,y,z)
pub const FEATURE_LEN: usize = LANDMARK_COUNT * 3;

/// Minimum gap between two scroll dispatches, milliseconds
pub const SCROLL_COOLDOWN_MS: u64 = 1000;

/// Minimum gap between two like dispatches, milliseconds
pub const LIKE_COOLDOWN_MS: u64 = 1500;

/// Flatten a hand's landmarks into the classifier input vector
///
/// Landmark-major order: x, y, z of landmark 0, then landmark 1, and so on.
pub fn extract_features(hand: &HandLandmarkSet) -> [f32; FEATURE_LEN] {
    let mut features = [0.0f32; FEATURE_LEN];
    for (i, landmark) in hand.landmarks.iter().enumerate() {
        features[i * 3] = landmark.x;
        features[i * 3 + 1] = landmark.y;
        features[i * 3 + 2] = landmark.z;
    }
    features
}

/// Maps gesture labels to gallery actions under per-category cooldowns
///
/// Scroll actions ("up", "down") share one timer; "like" has its own. A timer
/// is reset only when an action actually dispatches, so a guard-rejected
/// action (scrolling past either end) leaves the window open. A held gesture
/// therefore fires at most once per cooldown window.
pub struct ActionMapper {
    scroll_cooldown_ms: u64,
    like_cooldown_ms: u64,
    last_scroll_ms: Option<u64>,
    last_like_ms: Option<u64>,
}

impl ActionMapper {
    /// Create a mapper with the given cooldown windows
    pub fn new(scroll_cooldown_ms: u64, like_cooldown_ms: u64) -> Self {
        Self {
            scroll_cooldown_ms,
            like_cooldown_ms,
            last_scroll_ms: None,
            last_like_ms: None,
        }
    }

    /// Apply a classified label to the gallery at time `now_ms`
    ///
    /// Returns true when the gallery mutated, so the caller knows to rebuild
    /// its rendered view. Unknown labels are ignored.
    pub fn apply(&mut self, label: &str, now_ms: u64, gallery: &mut Gallery) -> bool {
        match label {
            "up" => {
                if gallery.current_index() > 0 && self.scroll_ready(now_ms) {
                    gallery.retreat();
                    self.last_scroll_ms = Some(now_ms);
                    return true;
                }
                false
            }
            "down" => {
                if gallery.current_index() + 1 < gallery.len() && self.scroll_ready(now_ms) {
                    gallery.advance();
                    self.last_scroll_ms = Some(now_ms);
                    return true;
                }
                false
            }
            "like" => {
                if self.like_ready(now_ms) {
                    gallery.toggle_like(gallery.current_index());
                    self.last_like_ms = Some(now_ms);
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    fn scroll_ready(&self, now_ms: u64) -> bool {
        match self.last_scroll_ms {
            Some(last) => now_ms.saturating_sub(last) > self.scroll_cooldown_ms,
            None => true,
        }
    }

    fn like_ready(&self, now_ms: u64) -> bool {
        match self.last_like_ms {
            Some(last) => now_ms.saturating_sub(last) > self.like_cooldown_ms,
            None => true,
        }
    }
}

impl Default for ActionMapper {
    fn default() -> Self {
        Self::new(SCROLL_COOLDOWN_MS, LIKE_COOLDOWN_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::HandLandmark;

    fn gallery(n: usize) -> Gallery {
        let urls: Vec<String> = (0..n).map(|i| format!("photo-{}", i)).collect();
        Gallery::new(&urls)
    }

    #[test]
    fn test_extract_features_layout() {
        let mut hand = HandLandmarkSet {
            landmarks: [HandLandmark::default(); LANDMARK_COUNT],
            score: 1.0,
        };
        hand.landmarks[0] = HandLandmark { x: 0.1, y: 0.2, z: 0.3 };
        hand.landmarks[20] = HandLandmark { x: 0.7, y: 0.8, z: 0.9 };

        let features = extract_features(&hand);
        assert_eq!(features.len(), 63);
        assert_eq!(features[0], 0.1);
        assert_eq!(features[1], 0.2);
        assert_eq!(features[2], 0.3);
        assert_eq!(features[60], 0.7);
        assert_eq!(features[61], 0.8);
        assert_eq!(features[62], 0.9);
    }

    #[test]
    fn test_up_at_first_photo_is_noop() {
        let mut g = gallery(12);
        let mut mapper = ActionMapper::default();

        assert!(!mapper.apply("up", 0, &mut g));
        assert_eq!(g.current_index(), 0);
    }

    #[test]
    fn test_down_at_last_photo_is_noop() {
        let mut g = gallery(3);
        let mut mapper = ActionMapper::default();

        assert!(mapper.apply("down", 0, &mut g));
        assert!(mapper.apply("down", 2000, &mut g));
        assert_eq!(g.current_index(), 2);

        assert!(!mapper.apply("down", 4000, &mut g));
        assert_eq!(g.current_index(), 2);
    }

    #[test]
    fn test_scroll_cooldown_suppresses_second_down() {
        let mut g = gallery(12);
        let mut mapper = ActionMapper::default();

        assert!(mapper.apply("down", 100, &mut g));
        assert!(!mapper.apply("down", 900, &mut g));
        assert_eq!(g.current_index(), 1);

        assert!(mapper.apply("down", 1200, &mut g));
        assert_eq!(g.current_index(), 2);
    }

    #[test]
    fn test_scroll_cooldown_is_shared_between_directions() {
        let mut g = gallery(12);
        let mut mapper = ActionMapper::default();

        assert!(mapper.apply("down", 0, &mut g));
        // "up" is a different direction but the same action category
        assert!(!mapper.apply("up", 500, &mut g));
        assert_eq!(g.current_index(), 1);

        assert!(mapper.apply("up", 1100, &mut g));
        assert_eq!(g.current_index(), 0);
    }

    #[test]
    fn test_like_cooldown_suppresses_second_like() {
        let mut g = gallery(12);
        let mut mapper = ActionMapper::default();

        assert!(mapper.apply("like", 0, &mut g));
        assert!(g.photos()[0].liked);

        assert!(!mapper.apply("like", 1400, &mut g));
        assert!(g.photos()[0].liked);

        assert!(mapper.apply("like", 1600, &mut g));
        assert!(!g.photos()[0].liked);
    }

    #[test]
    fn test_like_and_scroll_timers_are_independent() {
        let mut g = gallery(12);
        let mut mapper = ActionMapper::default();

        assert!(mapper.apply("down", 0, &mut g));
        // Like right after a scroll still dispatches
        assert!(mapper.apply("like", 10, &mut g));
        assert!(g.photos()[1].liked);
    }

    #[test]
    fn test_rejected_action_keeps_window_open() {
        let mut g = gallery(12);
        let mut mapper = ActionMapper::default();

        // Guard-rejected "up" at index 0 must not reset the scroll timer
        assert!(!mapper.apply("up", 0, &mut g));
        assert!(mapper.apply("down", 10, &mut g));
        assert_eq!(g.current_index(), 1);
    }

    #[test]
    fn test_unknown_label_is_ignored() {
        let mut g = gallery(12);
        let mut mapper = ActionMapper::default();

        assert!(!mapper.apply("fist", 0, &mut g));
        assert!(!mapper.apply("", 10, &mut g));
        assert_eq!(g.current_index(), 0);
        assert!(g.photos().iter().all(|p| !p.liked));
    }

    #[test]
    fn test_label_sequence_scenario() {
        let mut g = gallery(12);
        let mut mapper = ActionMapper::default();

        // down, down, like, up — spaced wider than every cooldown
        let sequence = [("down", 0), ("down", 2000), ("like", 4000), ("up", 6000)];
        for (label, now_ms) in sequence {
            mapper.apply(label, now_ms, &mut g);
        }

        // like fires while photo 2 is current; up then scrolls back to 1
        assert_eq!(g.current_index(), 1);
        assert!(g.photos()[2].liked);
        assert!(!g.photos()[0].liked);
        assert!(!g.photos()[1].liked);
    }
}
