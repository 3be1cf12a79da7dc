use geo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// A 2D axis-aligned bounding box in longitude/latitude degrees.
///
/// Wraps `geo::Rect` and adds the interval tests used as cheap prefilters by
/// the region and trajectory indexes. A bounding box is never the final
/// containment or distance decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2D {
    /// The underlying geometric rectangle
    pub rect: Rect,
}

impl BoundingBox2D {
    /// Create a new bounding box from minimum and maximum coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use geolocate_types::bbox::BoundingBox2D;
    ///
    /// let bbox = BoundingBox2D::new(110.9, 22.8, 111.1, 23.0);
    /// assert!(bbox.contains_coord(110.995, 22.918));
    /// ```
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            rect: Rect::new(
                geo::coord! { x: min_x, y: min_y },
                geo::coord! { x: max_x, y: max_y },
            ),
        }
    }

    /// Tight enclosure of a set of `[lng, lat]` coordinates.
    ///
    /// Returns `None` for an empty input.
    pub fn from_coords<'a, I>(coords: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a [f64; 2]>,
    {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first[0], first[1], first[0], first[1]);
        for c in iter {
            min_x = min_x.min(c[0]);
            min_y = min_y.min(c[1]);
            max_x = max_x.max(c[0]);
            max_y = max_y.max(c[1]);
        }
        Some(Self::new(min_x, min_y, max_x, max_y))
    }

    pub fn min_x(&self) -> f64 {
        self.rect.min().x
    }

    pub fn min_y(&self) -> f64 {
        self.rect.min().y
    }

    pub fn max_x(&self) -> f64 {
        self.rect.max().x
    }

    pub fn max_y(&self) -> f64 {
        self.rect.max().y
    }

    /// Get the center point of the bounding box.
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x() + self.max_x()) / 2.0,
            (self.min_y() + self.max_y()) / 2.0,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x() - self.min_x()
    }

    pub fn height(&self) -> f64 {
        self.max_y() - self.min_y()
    }

    /// Planar area in square degrees. Only meaningful for ordering boxes.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// True when the box has no interior (zero width or height) or a
    /// non-finite corner.
    pub fn is_degenerate(&self) -> bool {
        let corners = [self.min_x(), self.min_y(), self.max_x(), self.max_y()];
        corners.iter().any(|v| !v.is_finite()) || self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Inclusive point test.
    #[inline]
    pub fn contains_coord(&self, x: f64, y: f64) -> bool {
        x >= self.min_x() && x <= self.max_x() && y >= self.min_y() && y <= self.max_y()
    }

    /// True when `other` lies entirely inside this box.
    pub fn contains_bbox(&self, other: &BoundingBox2D) -> bool {
        other.min_x() >= self.min_x()
            && other.max_x() <= self.max_x()
            && other.min_y() >= self.min_y()
            && other.max_y() <= self.max_y()
    }

    /// Check if this bounding box intersects with another.
    pub fn intersects(&self, other: &BoundingBox2D) -> bool {
        !(self.max_x() < other.min_x()
            || self.min_x() > other.max_x()
            || self.max_y() < other.min_y()
            || self.min_y() > other.max_y())
    }

    /// Smallest box enclosing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox2D) -> Self {
        Self::new(
            self.min_x().min(other.min_x()),
            self.min_y().min(other.min_y()),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }

    /// Grow the box so it also covers `(x, y)`.
    pub fn extend_to(&mut self, x: f64, y: f64) {
        *self = Self::new(
            self.min_x().min(x),
            self.min_y().min(y),
            self.max_x().max(x),
            self.max_y().max(y),
        );
    }
}
