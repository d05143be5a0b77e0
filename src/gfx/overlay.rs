//! Line segments between the two halves of each shared connection.

use crate::data::SharedConnection;

/// Opacity never drops below this, however weak the similarity.
pub const MIN_CONNECTION_OPACITY: f32 = 0.15;

const LINE_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// Maps similarity to line opacity; monotonic, floored and capped at 1.
pub fn connection_opacity(similarity: f32) -> f32 {
    (0.5 + (similarity - 0.7)).clamp(MIN_CONNECTION_OPACITY, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: [f32; 3],
    pub end: [f32; 3],
    pub color: [f32; 4],
}

/// Segments for the active comparison; rebuilt wholesale on every change.
#[derive(Debug, Clone, Default)]
pub struct ComparisonOverlay {
    segments: Vec<LineSegment>,
}

impl ComparisonOverlay {
    pub fn rebuild(&mut self, connections: &[SharedConnection]) {
        self.segments = connections
            .iter()
            .map(|connection| {
                let [r, g, b] = LINE_COLOR;
                LineSegment {
                    start: connection.conversation1.position(),
                    end: connection.conversation2.position(),
                    color: [r, g, b, connection_opacity(connection.similarity)],
                }
            })
            .collect();
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn segments(&self) -> &[LineSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ConversationPoint;
    use approx::assert_relative_eq;

    fn conversation(email: &str, x: f32) -> ConversationPoint {
        ConversationPoint {
            x,
            y: 0.0,
            z: 0.0,
            email: email.to_string(),
            title: String::new(),
            timestamp: String::new(),
            cluster_id: None,
            cluster_title: None,
            body: None,
        }
    }

    #[test]
    fn opacity_is_monotonic_with_floor() {
        assert_relative_eq!(connection_opacity(0.9), 0.7, epsilon = 1e-6);
        assert_relative_eq!(connection_opacity(0.5), 0.3, epsilon = 1e-6);
        assert_eq!(connection_opacity(0.0), MIN_CONNECTION_OPACITY);
        assert_eq!(connection_opacity(1.5), 1.0);

        let mut previous = 0.0;
        for step in 0..=100 {
            let opacity = connection_opacity(step as f32 / 100.0);
            assert!(opacity >= previous);
            previous = opacity;
        }
    }

    #[test]
    fn rebuild_replaces_and_clear_empties() {
        let mut overlay = ComparisonOverlay::default();
        let connections = vec![SharedConnection {
            conversation1: conversation("a@x.io", 1.0),
            conversation2: conversation("b@x.io", -1.0),
            similarity: 0.8,
        }];

        overlay.rebuild(&connections);
        overlay.rebuild(&connections);
        assert_eq!(overlay.segments().len(), 1);
        assert_eq!(overlay.segments()[0].start, [1.0, 0.0, 0.0]);
        assert_eq!(overlay.segments()[0].end, [-1.0, 0.0, 0.0]);

        overlay.clear();
        assert!(overlay.is_empty());
    }
}
