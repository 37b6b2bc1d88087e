use std::fmt;

/// Axis-aligned closed box `[lower_bounds, upper_bounds]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct RectGeo {
    /// Lower corner.
    pub lower_bounds: Vec<f64>,

    /// Upper corner.
    pub upper_bounds: Vec<f64>,
}

impl RectGeo {
    /// Box with the given corners.
    ///
    /// # Panics
    /// If the corners have different dimensions.
    pub fn new(lower_bounds: Vec<f64>, upper_bounds: Vec<f64>) -> Self {
        assert_eq!(
            lower_bounds.len(),
            upper_bounds.len(),
            "corner dimensions differ"
        );
        Self {
            lower_bounds,
            upper_bounds,
        }
    }

    /// Zero-initialised box of dimension `dimension`.
    pub fn zeros(dimension: usize) -> Self {
        Self::new(vec![0.0; dimension], vec![0.0; dimension])
    }

    /// The unit cube `[0, 1]^dimension`.
    pub fn unit(dimension: usize) -> Self {
        Self::new(vec![0.0; dimension], vec![1.0; dimension])
    }

    /// Degenerate box holding a single point.
    pub fn point(coordinates: Vec<f64>) -> Self {
        Self::new(coordinates.clone(), coordinates)
    }

    /// Number of axes.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.lower_bounds.len()
    }

    /// Extent along axis `d`.
    #[inline]
    pub fn width(&self, d: usize) -> f64 {
        self.upper_bounds[d] - self.lower_bounds[d]
    }

    /// True when every lower bound is at most the matching upper bound.
    pub fn is_well_formed(&self) -> bool {
        self.lower_bounds
            .iter()
            .zip(&self.upper_bounds)
            .all(|(lower, upper)| lower <= upper)
    }

    /// Closed intersection test.
    pub fn intersects(&self, other: &RectGeo) -> bool {
        (0..self.dimension()).all(|d| {
            self.lower_bounds[d] <= other.upper_bounds[d]
                && other.lower_bounds[d] <= self.upper_bounds[d]
        })
    }

    /// True when `other` lies inside `self`.
    pub fn contains(&self, other: &RectGeo) -> bool {
        (0..self.dimension()).all(|d| {
            self.lower_bounds[d] <= other.lower_bounds[d]
                && other.upper_bounds[d] <= self.upper_bounds[d]
        })
    }

    /// Product of the widths.
    pub fn volume(&self) -> f64 {
        (0..self.dimension()).map(|d| self.width(d)).product()
    }

    /// Smallest box containing both.
    pub fn hull(&self, other: &RectGeo) -> RectGeo {
        RectGeo::new(
            self.lower_bounds
                .iter()
                .zip(&other.lower_bounds)
                .map(|(a, b)| a.min(*b))
                .collect(),
            self.upper_bounds
                .iter()
                .zip(&other.upper_bounds)
                .map(|(a, b)| a.max(*b))
                .collect(),
        )
    }
}

impl fmt::Display for RectGeo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in 0..self.dimension() {
            if d > 0 {
                write!(f, "x")?;
            }
            write!(f, "[{}, {}]", self.lower_bounds[d], self.upper_bounds[d])?;
        }
        Ok(())
    }
}
