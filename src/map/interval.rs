use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Closed interval of reals with outward rounding.
///
/// Every operation widens its result by one ulp on each side, so the result
/// encloses the exact image of the operands despite rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Lower end.
    pub lower: f64,
    /// Upper end.
    pub upper: f64,
}

fn next_up(x: f64) -> f64 {
    if x.is_nan() || x == f64::INFINITY {
        return x;
    }
    if x == 0.0 {
        return f64::from_bits(1);
    }
    let bits = x.to_bits();
    if x > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

fn next_down(x: f64) -> f64 {
    -next_up(-x)
}

impl Interval {
    /// Interval `[lower, upper]`.
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Degenerate interval `[x, x]`.
    pub fn point(x: f64) -> Self {
        Self::new(x, x)
    }

    fn outward(lower: f64, upper: f64) -> Self {
        Self::new(next_down(lower), next_up(upper))
    }

    /// `upper - lower`.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// True when `x` lies inside.
    pub fn contains(&self, x: f64) -> bool {
        self.lower <= x && x <= self.upper
    }

    /// Enclosure of `exp` over the interval.
    pub fn exp(self) -> Self {
        Self::outward(self.lower.exp(), self.upper.exp())
    }

    /// Enclosure of `c * self`.
    pub fn scale(self, c: f64) -> Self {
        let (a, b) = (c * self.lower, c * self.upper);
        Self::outward(a.min(b), a.max(b))
    }
}

impl Add for Interval {
    type Output = Interval;

    fn add(self, rhs: Interval) -> Interval {
        Interval::outward(self.lower + rhs.lower, self.upper + rhs.upper)
    }
}

impl Sub for Interval {
    type Output = Interval;

    fn sub(self, rhs: Interval) -> Interval {
        Interval::outward(self.lower - rhs.upper, self.upper - rhs.lower)
    }
}

impl Mul for Interval {
    type Output = Interval;

    fn mul(self, rhs: Interval) -> Interval {
        let products = [
            self.lower * rhs.lower,
            self.lower * rhs.upper,
            self.upper * rhs.lower,
            self.upper * rhs.upper,
        ];
        let lower = products.iter().copied().fold(f64::INFINITY, f64::min);
        let upper = products.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Interval::outward(lower, upper)
    }
}

impl Mul<Interval> for f64 {
    type Output = Interval;

    fn mul(self, rhs: Interval) -> Interval {
        rhs.scale(self)
    }
}

impl Neg for Interval {
    type Output = Interval;

    fn neg(self) -> Interval {
        Interval::new(-self.upper, -self.lower)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Interval::new(1.0, 2.0), Interval::new(3.0, 4.0), 3.0, 8.0; "positive")]
    #[test_case(Interval::new(-1.0, 2.0), Interval::new(3.0, 4.0), -4.0, 8.0; "straddles zero")]
    #[test_case(Interval::new(-2.0, -1.0), Interval::new(-4.0, -3.0), 3.0, 8.0; "both negative")]
    fn product_encloses_corners(a: Interval, b: Interval, lower: f64, upper: f64) {
        let product = a * b;
        assert!(product.lower <= lower && lower - product.lower < 1e-12);
        assert!(product.upper >= upper && product.upper - upper < 1e-12);
    }

    #[test]
    fn negative_scale_swaps_ends() {
        let scaled = -0.1 * Interval::new(2.0, 3.0);
        assert!(scaled.contains(-0.3) && scaled.contains(-0.2));
        assert!(scaled.lower < scaled.upper);
    }

    #[test]
    fn exp_and_sums_are_outward() {
        let x = Interval::new(0.0, 1.0);
        let e = x.exp();
        assert!(e.lower < 1.0 && e.upper >= std::f64::consts::E);
        let s = x + x - x;
        assert!(s.contains(-1.0) && s.contains(2.0));
        assert_eq!(-x, Interval::new(-1.0, 0.0));
        assert_eq!(next_up(0.0), f64::from_bits(1));
        assert!(next_down(1.0) < 1.0);
    }
}
