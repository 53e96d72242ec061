//! Hand overlay drawing
//!
//! Paints the detected hand skeleton over the rendered camera image: green
//! connector lines between landmarks and red markers on the landmarks
//! themselves, redrawn fresh each frame.

use egui::{Color32, Pos2, Rect, Stroke};

use crate::ml::{HandLandmarkSet, LANDMARK_COUNT};

/// Landmark index pairs forming the hand skeleton
///
/// MediaPipe hand landmark convention: wrist = 0, then four joints per finger
/// from thumb to pinky, plus the palm edges.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    // Thumb
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    // Index finger
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    // Middle finger
    (9, 10),
    (10, 11),
    (11, 12),
    // Ring finger
    (13, 14),
    (14, 15),
    (15, 16),
    // Pinky
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
    // Palm
    (5, 9),
    (9, 13),
    (13, 17),
];

const CONNECTOR_COLOR: Color32 = Color32::from_rgb(0x00, 0xff, 0x00);
const CONNECTOR_WIDTH: f32 = 4.0;
const MARKER_COLOR: Color32 = Color32::from_rgb(0xff, 0x00, 0x00);
const MARKER_RADIUS: f32 = 3.0;

/// Map a normalized landmark into the on-screen image rect
fn landmark_pos(rect: Rect, x: f32, y: f32) -> Pos2 {
    Pos2::new(
        rect.min.x + x * rect.width(),
        rect.min.y + y * rect.height(),
    )
}

/// Draw one hand's skeleton into the image rect
pub fn draw_hand(painter: &egui::Painter, rect: Rect, hand: &HandLandmarkSet) {
    let stroke = Stroke::new(CONNECTOR_WIDTH, CONNECTOR_COLOR);
    for &(a, b) in HAND_CONNECTIONS.iter() {
        let from = landmark_pos(rect, hand.landmarks[a].x, hand.landmarks[a].y);
        let to = landmark_pos(rect, hand.landmarks[b].x, hand.landmarks[b].y);
        painter.line_segment([from, to], stroke);
    }

    for landmark in hand.landmarks.iter() {
        let pos = landmark_pos(rect, landmark.x, landmark.y);
        painter.circle_filled(pos, MARKER_RADIUS, MARKER_COLOR);
    }
}

/// Draw every detected hand
pub fn draw_hands(painter: &egui::Painter, rect: Rect, hands: &[HandLandmarkSet]) {
    for hand in hands {
        draw_hand(painter, rect, hand);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connections_are_valid_indices() {
        for &(a, b) in HAND_CONNECTIONS.iter() {
            assert!(a < LANDMARK_COUNT);
            assert!(b < LANDMARK_COUNT);
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_every_landmark_is_connected() {
        for i in 0..LANDMARK_COUNT {
            let connected = HAND_CONNECTIONS.iter().any(|&(a, b)| a == i || b == i);
            assert!(connected, "landmark {} has no connection", i);
        }
    }

    #[test]
    fn test_landmark_pos_maps_into_rect() {
        let rect = Rect::from_min_size(Pos2::new(10.0, 20.0), egui::Vec2::new(100.0, 50.0));

        let center = landmark_pos(rect, 0.5, 0.5);
        assert_eq!(center, Pos2::new(60.0, 45.0));

        let origin = landmark_pos(rect, 0.0, 0.0);
        assert_eq!(origin, rect.min);
    }
}
