use serde::{Deserialize, Serialize};
use std::ops::Add;

/// Integer point in host drawing coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    /// Saturates at the `i32` range.
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_saturate() {
        assert_eq!(Point::new(200, 500) + Point::new(150, -110), Point::new(350, 390));
        assert_eq!(
            Point::new(i32::MAX, i32::MIN) + Point::new(150, -110),
            Point::new(i32::MAX, i32::MIN)
        );
    }
}
