use super::{Interval, Map, MapError};
use crate::geometry::{Geo, RectGeo};

/// Two-age-class Leslie population model with interval parameters.
///
/// `(x, y) -> ((a x + b y) e^{-(x + y) / 10}, 0.7 x)` for every `(a, b)` in
/// the parameter box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeslieMap {
    fertility_young: Interval,
    fertility_old: Interval,
}

impl LeslieMap {
    /// Survival rate from the first age class to the second.
    pub const SURVIVAL: f64 = 0.7;

    /// Density dependence in the exponent.
    pub const CROWDING: f64 = -0.1;

    /// Map with fertilities ranging over the given intervals.
    pub fn new(fertility_young: Interval, fertility_old: Interval) -> Self {
        Self {
            fertility_young,
            fertility_old,
        }
    }

    /// Map for a two-dimensional parameter box.
    ///
    /// # Panics
    /// If `parameters` is not two-dimensional.
    pub fn from_parameter_box(parameters: &RectGeo) -> Self {
        assert_eq!(parameters.dimension(), 2, "Leslie map takes two parameters");
        Self::new(
            Interval::new(parameters.lower_bounds[0], parameters.upper_bounds[0]),
            Interval::new(parameters.lower_bounds[1], parameters.upper_bounds[1]),
        )
    }

    /// Enclosure of the image of a box.
    pub fn apply(&self, rect: &RectGeo) -> RectGeo {
        let x = Interval::new(rect.lower_bounds[0], rect.upper_bounds[0]);
        let y = Interval::new(rect.lower_bounds[1], rect.upper_bounds[1]);
        let births = self.fertility_young * x + self.fertility_old * y;
        let next_young = births * (Self::CROWDING * (x + y)).exp();
        let next_old = Self::SURVIVAL * x;
        RectGeo::new(
            vec![next_young.lower, next_old.lower],
            vec![next_young.upper, next_old.upper],
        )
    }
}

impl Map for LeslieMap {
    fn image(&self, rect: &RectGeo) -> Result<Geo, MapError> {
        if rect.dimension() != 2 {
            return Err(MapError::Fatal(format!(
                "Leslie map needs a planar box, got dimension {}",
                rect.dimension()
            )));
        }
        Ok(self.apply(rect).into())
    }

    fn good(&self) -> bool {
        self.fertility_young.lower <= self.fertility_young.upper
            && self.fertility_old.lower <= self.fertility_old.upper
    }
}
