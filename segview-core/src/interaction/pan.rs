//! Pointer-drag panning.
//!
//! The gesture snapshots the engine translation and the press point; every
//! move sets the translation to that snapshot plus the pointer offset, so
//! moves never accumulate error.

use crate::engine::Translation;

/// Pointer position in client (page) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// State captured at the moment the pointer went down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanGesture {
    pub press: Point,
    pub origin: Translation,
}

impl PanGesture {
    pub fn new(press: Point, origin: Translation) -> Self {
        Self { press, origin }
    }

    pub fn translation_at(&self, pointer: Point) -> Translation {
        Translation {
            x: self.origin.x + (pointer.x - self.press.x),
            y: self.origin.y + (pointer.y - self.press.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_follows_pointer_offset() {
        let gesture = PanGesture::new(Point::new(100.0, 100.0), Translation { x: 5.0, y: -5.0 });
        assert_eq!(gesture.translation_at(Point::new(100.0, 100.0)), Translation { x: 5.0, y: -5.0 });
        assert_eq!(gesture.translation_at(Point::new(90.0, 140.0)), Translation { x: -5.0, y: 35.0 });
    }
}
