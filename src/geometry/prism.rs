use nalgebra::{DMatrix, DVector};

use super::RectGeo;

/// Slack allowed on the prism side of a separating-axis test.
const SEPARATION_SLACK: f64 = 1e-12;

/// Parallelotope `{ center + frame * u : |u|_inf <= 1 }`.
///
/// Typical source: the image of a box under an affine enclosure of a map.
#[derive(Debug, Clone, PartialEq)]
pub struct PrismGeo {
    center: DVector<f64>,
    frame: DMatrix<f64>,
    inverse: Option<DMatrix<f64>>,
    bounding_box: RectGeo,
}

impl PrismGeo {
    /// Prism with the given center and (square) frame.
    ///
    /// # Panics
    /// If `frame` is not square with the dimension of `center`.
    pub fn new(center: DVector<f64>, frame: DMatrix<f64>) -> Self {
        let dimension = center.len();
        assert!(
            frame.nrows() == dimension && frame.ncols() == dimension,
            "prism frame must be {dimension}x{dimension}"
        );
        let inverse = frame.clone().try_inverse();
        let mut bounding_box = RectGeo::zeros(dimension);
        for d in 0..dimension {
            let radius: f64 = frame.row(d).iter().map(|entry| entry.abs()).sum();
            bounding_box.lower_bounds[d] = center[d] - radius;
            bounding_box.upper_bounds[d] = center[d] + radius;
        }
        Self {
            center,
            frame,
            inverse,
            bounding_box,
        }
    }

    /// Prism covering exactly the box `rect`.
    pub fn from_rect(rect: &RectGeo) -> Self {
        let dimension = rect.dimension();
        let center = DVector::from_fn(dimension, |d, _| {
            0.5 * (rect.lower_bounds[d] + rect.upper_bounds[d])
        });
        let frame = DMatrix::from_fn(dimension, dimension, |row, col| {
            if row == col {
                0.5 * rect.width(row)
            } else {
                0.0
            }
        });
        Self::new(center, frame)
    }

    /// Number of axes.
    pub fn dimension(&self) -> usize {
        self.center.len()
    }

    /// Center point.
    pub fn center(&self) -> &DVector<f64> {
        &self.center
    }

    /// Generating frame.
    pub fn frame(&self) -> &DMatrix<f64> {
        &self.frame
    }

    /// Smallest axis-aligned box containing the prism.
    pub fn bounding_box(&self) -> &RectGeo {
        &self.bounding_box
    }

    /// Conservative intersection test against a box.
    ///
    /// Separating axes tried: the coordinate axes and the face normals of the
    /// prism. In two dimensions that is exact; in higher dimensions it may
    /// report an intersection that is not there, never the reverse. A
    /// singular frame falls back to the bounding box alone.
    pub fn intersects(&self, rect: &RectGeo) -> bool {
        if !self.bounding_box.intersects(rect) {
            return false;
        }
        let Some(inverse) = &self.inverse else {
            return true;
        };
        for row in inverse.row_iter() {
            let mut low = 0.0;
            let mut high = 0.0;
            for (d, coefficient) in row.iter().enumerate() {
                let a = coefficient * (rect.lower_bounds[d] - self.center[d]);
                let b = coefficient * (rect.upper_bounds[d] - self.center[d]);
                low += a.min(b);
                high += a.max(b);
            }
            if low > 1.0 + SEPARATION_SLACK || high < -1.0 - SEPARATION_SLACK {
                return false;
            }
        }
        true
    }
}
