//! Spatial and temporal bounds of an extraction.

use chrono::NaiveDate;
use geo::Coord;
use thiserror::Error;

/// Errors returned by the footprint constructors.
#[derive(Debug, Error, PartialEq)]
pub enum FootprintError {
    /// A coordinate was not finite or fell outside WGS84 limits.
    #[error("{edge} coordinate {value} is outside the valid range")]
    InvalidCoordinate {
        /// Name of the offending edge.
        edge: &'static str,
        /// Supplied value.
        value: f64,
    },
    /// Edges were supplied in the wrong order.
    #[error("bounding box edges are inverted: {reason}")]
    InvalidBoundingBox {
        /// Which pair of edges is inverted.
        reason: &'static str,
    },
    /// The end date precedes the start date.
    #[error("end date {end} must not precede start date {start}")]
    InvalidTimeWindow {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },
}

/// Inclusive WGS84 bounding box.
///
/// # Examples
/// ```
/// use footprint_core::BoundingBox;
/// use geo::Coord;
///
/// # fn main() -> Result<(), footprint_core::FootprintError> {
/// let bbox = BoundingBox::new(0.0, 20.0, 20.0, 0.0)?;
/// assert!(bbox.contains(Coord { x: 20.0, y: 0.0 }));
/// assert!(!bbox.contains(Coord { x: 20.5, y: 0.0 }));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl BoundingBox {
    /// Validate and construct a box from its four edges.
    pub fn new(left: f64, right: f64, top: f64, bottom: f64) -> Result<Self, FootprintError> {
        check_range("left", left, 180.0)?;
        check_range("right", right, 180.0)?;
        check_range("top", top, 90.0)?;
        check_range("bottom", bottom, 90.0)?;
        if left > right {
            return Err(FootprintError::InvalidBoundingBox {
                reason: "left is east of right",
            });
        }
        if bottom > top {
            return Err(FootprintError::InvalidBoundingBox {
                reason: "bottom is north of top",
            });
        }
        Ok(Self {
            left,
            right,
            top,
            bottom,
        })
    }

    /// The whole globe.
    #[must_use]
    pub const fn world() -> Self {
        Self {
            left: -180.0,
            right: 180.0,
            top: 90.0,
            bottom: -90.0,
        }
    }

    /// Western edge in degrees.
    #[must_use]
    pub const fn left(&self) -> f64 {
        self.left
    }

    /// Eastern edge in degrees.
    #[must_use]
    pub const fn right(&self) -> f64 {
        self.right
    }

    /// Northern edge in degrees.
    #[must_use]
    pub const fn top(&self) -> f64 {
        self.top
    }

    /// Southern edge in degrees.
    #[must_use]
    pub const fn bottom(&self) -> f64 {
        self.bottom
    }

    /// Whether `location` lies inside the box; edges are inclusive.
    #[must_use]
    pub fn contains(&self, location: Coord<f64>) -> bool {
        (self.bottom..=self.top).contains(&location.y)
            && (self.left..=self.right).contains(&location.x)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::world()
    }
}

fn check_range(edge: &'static str, value: f64, limit: f64) -> Result<(), FootprintError> {
    if value.is_finite() && (-limit..=limit).contains(&value) {
        Ok(())
    } else {
        Err(FootprintError::InvalidCoordinate { edge, value })
    }
}

/// Inclusive window of edit dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl TimeWindow {
    /// Validate and construct a window.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use footprint_core::TimeWindow;
    ///
    /// let start = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
    /// let end = NaiveDate::from_ymd_opt(2010, 12, 31).unwrap();
    /// let window = TimeWindow::new(start, end).unwrap();
    /// assert!(window.contains(end));
    /// assert!(TimeWindow::new(end, start).is_err());
    /// ```
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, FootprintError> {
        if start > end {
            return Err(FootprintError::InvalidTimeWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// First date inside the window.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last date inside the window.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `date` falls inside the window; both ends are inclusive.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start..=self.end).contains(&date)
    }
}

impl Default for TimeWindow {
    /// 2000-01-01 through 2100-01-01.
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2100, 1, 1).unwrap_or(NaiveDate::MAX),
        }
    }
}

/// Spatial plus temporal subset selected for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Footprint {
    /// Spatial filter applied to nodes.
    pub bbox: BoundingBox,
    /// Temporal filter applied to every object kind.
    pub window: TimeWindow,
}

impl Footprint {
    /// Combine a box and a window.
    #[must_use]
    pub const fn new(bbox: BoundingBox, window: TimeWindow) -> Self {
        Self { bbox, window }
    }
}
