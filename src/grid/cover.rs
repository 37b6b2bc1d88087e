//! Box covering by Euler tour
//!
//! Node boxes are tracked in fixed point: the unit interval on every axis is
//! `[0, INTPHASEWIDTH]`, so halving on the way down and doubling back on the
//! way up are exact. The query is converted to the same coordinates once, and
//! the tree is walked with an explicit four-state machine instead of
//! recursion so that arbitrarily deep trees cannot overflow the stack.
//!
//! Fixed point allows 60 halvings per axis, so a grid in `D` dimensions is
//! at most `60 * D` levels deep; [`TreeGrid`] refuses to split further.

use std::collections::HashSet;

use super::{Grid, GridElement, TreeGrid};
use crate::geometry::{Geo, PrismGeo, RectGeo};
use crate::tree::{Tree, TreeIndex};

/// Fixed-point width of the unit interval (`2^60`).
pub const INTPHASEWIDTH: u64 = 1 << 60;

/// Fixed-point units added around a converted query; absorbs the rounding of
/// the float-to-fixed conversion.
const COVER_SLACK: u64 = 1 << 8;

/// Map a fixed-point node box back to real coordinates inside `bounds`.
pub(crate) fn node_box_to_rect(bounds: &RectGeo, lower: &[u64], upper: &[u64]) -> RectGeo {
    let scale = INTPHASEWIDTH as f64;
    let mut rect = RectGeo::zeros(bounds.dimension());
    for d in 0..bounds.dimension() {
        let width = bounds.width(d);
        rect.lower_bounds[d] = bounds.lower_bounds[d] + width * (lower[d] as f64 / scale);
        rect.upper_bounds[d] = if upper[d] == INTPHASEWIDTH {
            bounds.upper_bounds[d]
        } else {
            bounds.lower_bounds[d] + width * (upper[d] as f64 / scale)
        };
    }
    rect
}

/// States of the tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tour {
    /// Just arrived at a node: test it.
    Descended,
    /// Go down to the left child.
    Left,
    /// Go down to the right child.
    Right,
    /// Go back up to the parent.
    Rise,
}

/// Walk `tree`, calling `visit(node, lower, upper)` on each node reached.
///
/// `visit` returns whether to descend into the node's children; leaves always
/// rise. The node box is exact at every step.
fn euler_tour<T, F>(tree: &T, dimension: usize, mut visit: F)
where
    T: Tree,
    F: FnMut(TreeIndex, &[u64], &[u64]) -> bool,
{
    let end = tree.end();
    let mut lower = vec![0u64; dimension];
    let mut upper = vec![INTPHASEWIDTH; dimension];
    let mut node = tree.begin();
    let mut depth = 0usize;
    let mut state = Tour::Descended;

    loop {
        match state {
            Tour::Descended => {
                state = if !visit(node, &lower, &upper) {
                    Tour::Rise
                } else if tree.left(node) != end {
                    Tour::Left
                } else if tree.right(node) != end {
                    Tour::Right
                } else {
                    Tour::Rise
                };
            }
            Tour::Left => {
                let axis = depth % dimension;
                upper[axis] -= (upper[axis] - lower[axis]) >> 1;
                node = tree.left(node);
                depth += 1;
                state = Tour::Descended;
            }
            Tour::Right => {
                let axis = depth % dimension;
                lower[axis] += (upper[axis] - lower[axis]) >> 1;
                node = tree.right(node);
                depth += 1;
                state = Tour::Descended;
            }
            Tour::Rise => {
                let parent = tree.parent(node);
                if parent == end {
                    break;
                }
                depth -= 1;
                let axis = depth % dimension;
                if tree.left(parent) == node {
                    upper[axis] += upper[axis] - lower[axis];
                    state = if tree.right(parent) != end {
                        Tour::Right
                    } else {
                        Tour::Rise
                    };
                } else {
                    lower[axis] -= upper[axis] - lower[axis];
                    state = Tour::Rise;
                }
                node = parent;
            }
        }
    }
}

#[inline]
fn boxes_meet(lb: &[u64], ub: &[u64], nlb: &[u64], nub: &[u64]) -> bool {
    (0..lb.len()).all(|d| lb[d] <= nub[d] && nlb[d] <= ub[d])
}

#[inline]
fn box_contains(lb: &[u64], ub: &[u64], nlb: &[u64], nub: &[u64]) -> bool {
    (0..lb.len()).all(|d| lb[d] <= nlb[d] && nub[d] <= ub[d])
}

impl<T: Tree> TreeGrid<T> {
    pub(super) fn cover_geo(&self, geo: &Geo) -> Vec<GridElement> {
        match geo {
            Geo::Rect(rect) => self.cover_rect(rect),
            Geo::Prism(prism) => self.cover_prism(prism),
            Geo::Union(union) => {
                let mut seen = HashSet::new();
                let mut results = Vec::new();
                for element in &union.elements {
                    for cell in self.cover_geo(element) {
                        if seen.insert(cell) {
                            results.push(cell);
                        }
                    }
                }
                results
            }
            Geo::Intersection(intersection) => {
                let second: HashSet<GridElement> =
                    self.cover_geo(&intersection.second).into_iter().collect();
                self.cover_geo(&intersection.first)
                    .into_iter()
                    .filter(|cell| second.contains(cell))
                    .collect()
            }
        }
    }

    /// Copies of `rect` shifted by whole periods along the periodic axes.
    ///
    /// On a periodic axis the query is first moved so its lower end lies in
    /// the first period; images one period to either side then catch what
    /// hangs over either end, the seam included. A query at least one period
    /// wide takes the whole axis.
    fn periodic_images(&self, rect: &RectGeo) -> Vec<RectGeo> {
        let mut base = rect.clone();
        let mut wrapped_axes = Vec::new();
        for d in 0..self.dimension() {
            if !self.periodic[d] {
                continue;
            }
            let origin = self.bounds.lower_bounds[d];
            let width = self.bounds.width(d);
            if base.width(d) >= width {
                base.lower_bounds[d] = origin;
                base.upper_bounds[d] = self.bounds.upper_bounds[d];
                continue;
            }
            let periods = ((base.lower_bounds[d] - origin) / width).floor();
            if periods != 0.0 {
                base.lower_bounds[d] -= periods * width;
                base.upper_bounds[d] -= periods * width;
            }
            wrapped_axes.push(d);
        }

        let mut images = vec![base];
        for d in wrapped_axes {
            let width = self.bounds.width(d);
            images = images
                .into_iter()
                .flat_map(|image| {
                    [-width, 0.0, width].into_iter().map(move |offset| {
                        let mut shifted = image.clone();
                        shifted.lower_bounds[d] += offset;
                        shifted.upper_bounds[d] += offset;
                        shifted
                    })
                })
                .collect();
        }
        images
    }

    /// Convert `rect` to fixed point, or `None` when it misses the bounds.
    fn to_fixed_point(&self, rect: &RectGeo) -> Option<(Vec<u64>, Vec<u64>)> {
        let dimension = self.dimension();
        let scale = INTPHASEWIDTH as f64;
        let mut lb = vec![0u64; dimension];
        let mut ub = vec![0u64; dimension];
        for d in 0..dimension {
            let origin = self.bounds.lower_bounds[d];
            let width = self.bounds.width(d);
            let lower = (rect.lower_bounds[d] - origin) / width;
            let upper = (rect.upper_bounds[d] - origin) / width;
            if upper < 0.0 || lower > 1.0 || lower.is_nan() || upper.is_nan() {
                return None;
            }
            let lower = lower.clamp(0.0, 1.0);
            let upper = upper.clamp(0.0, 1.0);
            lb[d] = ((scale * lower) as u64).saturating_sub(COVER_SLACK);
            ub[d] = ((scale * upper) as u64)
                .saturating_add(COVER_SLACK)
                .min(INTPHASEWIDTH);
        }
        Some((lb, ub))
    }

    /// Cells meeting the closed box `rect`, periodic images included.
    pub fn cover_rect(&self, rect: &RectGeo) -> Vec<GridElement> {
        let images = self.periodic_images(rect);
        let deduplicate = images.len() > 1;
        let mut redundancy_check = HashSet::new();
        let mut results = Vec::new();

        for image in images {
            let Some((lb, ub)) = self.to_fixed_point(&image) else {
                continue;
            };
            euler_tour(&self.tree, self.dimension(), |node, nlb, nub| {
                if !boxes_meet(&lb, &ub, nlb, nub) {
                    return false;
                }
                if let Some(cell) = self.tree_to_grid(node) {
                    if !deduplicate || redundancy_check.insert(cell) {
                        results.push(cell);
                    }
                }
                true
            });
        }
        results
    }

    /// Cells meeting a prism.
    pub fn cover_prism(&self, prism: &PrismGeo) -> Vec<GridElement> {
        let mut results = Vec::new();
        euler_tour(&self.tree, self.dimension(), |node, nlb, nub| {
            let node_box = node_box_to_rect(&self.bounds, nlb, nub);
            if !prism.intersects(&node_box) {
                return false;
            }
            if let Some(cell) = self.tree_to_grid(node) {
                results.push(cell);
            }
            true
        });
        results
    }

    /// Like [`Self::cover_rect`] but stops at the first node whose box lies
    /// inside `rect`, returning tree nodes rather than cells.
    ///
    /// The result is coarser: every cell of the exact cover lies below some
    /// returned node, with far fewer entries when `rect` is large.
    pub fn coarse_cover(&self, rect: &RectGeo) -> Vec<TreeIndex> {
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        for image in self.periodic_images(rect) {
            let Some((lb, ub)) = self.to_fixed_point(&image) else {
                continue;
            };
            euler_tour(&self.tree, self.dimension(), |node, nlb, nub| {
                if !boxes_meet(&lb, &ub, nlb, nub) {
                    return false;
                }
                let contained = box_contains(&lb, &ub, nlb, nub);
                let valid_leaf = self.tree_to_grid(node).is_some();
                if (contained && !self.tree.isleaf(node)) || valid_leaf {
                    if seen.insert(node) {
                        results.push(node);
                    }
                    return false;
                }
                true
            });
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{IntersectionGeo, UnionGeo};
    use crate::grid::{PointerGrid, SuccinctGrid};
    use nalgebra::{DMatrix, DVector};

    fn square_grid(depth: usize) -> SuccinctGrid {
        let mut grid = SuccinctGrid::new(RectGeo::new(vec![0.0, 0.0], vec![4.0, 4.0]));
        for _ in 0..depth {
            grid.subdivide().unwrap();
        }
        grid
    }

    fn brute_force(grid: &SuccinctGrid, rect: &RectGeo) -> Vec<GridElement> {
        grid.elements()
            .filter(|&e| grid.geometry(e).unwrap().intersects(rect))
            .collect()
    }

    fn sorted(mut cells: Vec<GridElement>) -> Vec<GridElement> {
        cells.sort_unstable();
        cells
    }

    #[test]
    fn rect_cover_matches_brute_force() {
        let grid = square_grid(4);
        let query = RectGeo::new(vec![0.3, 1.1], vec![1.7, 2.6]);
        assert_eq!(sorted(grid.cover_rect(&query)), brute_force(&grid, &query));
    }

    #[test]
    fn query_outside_bounds_covers_nothing() {
        let grid = square_grid(2);
        let query = RectGeo::new(vec![5.0, 0.0], vec![6.0, 1.0]);
        assert!(grid.cover(&Geo::Rect(query)).is_empty());
    }

    #[test]
    fn query_overhanging_bounds_is_clamped() {
        let grid = square_grid(2);
        let query = RectGeo::new(vec![-10.0, -10.0], vec![0.5, 0.5]);
        assert_eq!(grid.cover_rect(&query), vec![0]);
    }

    #[test]
    fn periodic_axis_wraps_around() {
        let mut grid =
            PointerGrid::with_periodicity(RectGeo::new(vec![0.0], vec![8.0]), vec![true]).unwrap();
        for _ in 0..3 {
            grid.subdivide().unwrap();
        }
        // [7.5, 9.5] wraps onto [7.5, 8] and [0, 1.5].
        let cells = grid.cover_rect(&RectGeo::new(vec![7.5], vec![9.5]));
        let mut lowers: Vec<f64> = cells
            .iter()
            .map(|&e| grid.geometry(e).unwrap().lower_bounds[0])
            .collect();
        lowers.sort_by(f64::total_cmp);
        assert_eq!(lowers, vec![0.0, 1.0, 7.0]);
    }

    #[test]
    fn periodic_query_wider_than_a_period_takes_the_whole_axis() {
        let mut grid =
            PointerGrid::with_periodicity(RectGeo::new(vec![0.0], vec![8.0]), vec![true]).unwrap();
        for _ in 0..3 {
            grid.subdivide().unwrap();
        }
        assert_eq!(grid.cover_rect(&RectGeo::new(vec![-1.5], vec![9.0])).len(), 8);
        assert_eq!(grid.cover_rect(&RectGeo::new(vec![3.0], vec![11.0])).len(), 8);

        // Two periods to the left: [-14.5, -13.5] is [1.5, 2.5].
        let cells = grid.cover_rect(&RectGeo::new(vec![-14.5], vec![-13.5]));
        let mut lowers: Vec<f64> = cells
            .iter()
            .map(|&e| grid.geometry(e).unwrap().lower_bounds[0])
            .collect();
        lowers.sort_by(f64::total_cmp);
        assert_eq!(lowers, vec![1.0, 2.0]);

        // [0, 0.5] touches the top cell across the seam.
        let cells = grid.cover_rect(&RectGeo::new(vec![16.0], vec![16.5]));
        let mut lowers: Vec<f64> = cells
            .iter()
            .map(|&e| grid.geometry(e).unwrap().lower_bounds[0])
            .collect();
        lowers.sort_by(f64::total_cmp);
        assert_eq!(lowers, vec![0.0, 7.0]);
    }

    #[test]
    fn coarse_cover_stops_at_contained_nodes() {
        let grid = square_grid(4);
        let bounds = grid.bounds().clone();
        assert_eq!(grid.coarse_cover(&bounds), vec![grid.tree().begin()]);
        assert_eq!(grid.cover_rect(&bounds).len(), 16);

        let query = RectGeo::new(vec![0.2, 0.2], vec![2.9, 3.1]);
        let mut expanded: Vec<GridElement> = grid
            .coarse_cover(&query)
            .into_iter()
            .flat_map(|node| grid.cells_below(node))
            .collect();
        expanded.sort_unstable();
        for cell in grid.cover_rect(&query) {
            assert!(expanded.binary_search(&cell).is_ok());
        }
    }

    #[test]
    fn prism_cover_skips_separated_corners() {
        let grid = square_grid(4);
        // Diamond |x - 2| + |y - 2| <= 1.
        let frame = DMatrix::from_row_slice(2, 2, &[0.5, -0.5, 0.5, 0.5]);
        let prism = PrismGeo::new(DVector::from_vec(vec![2.0, 2.0]), frame);
        let cells = grid.cover_prism(&prism);
        let boxed = grid.cover_rect(prism.bounding_box());
        assert!(cells.len() < boxed.len());
        for cell in &cells {
            assert!(boxed.contains(cell));
        }
    }

    #[test]
    fn union_and_intersection_combine_covers() {
        let grid = square_grid(2);
        let left = RectGeo::new(vec![0.5, 0.5], vec![1.5, 3.5]);
        let bottom = RectGeo::new(vec![0.5, 0.5], vec![3.5, 1.5]);
        let union = Geo::from(UnionGeo::new(vec![left.clone().into(), bottom.clone().into()]));
        let both = Geo::from(IntersectionGeo::new(left.clone(), bottom.clone()));

        let union_cells = sorted(grid.cover(&union));
        let mut expected = grid.cover_rect(&left);
        expected.extend(grid.cover_rect(&bottom));
        expected.sort_unstable();
        expected.dedup();
        assert_eq!(union_cells, expected);

        let both_cells = sorted(grid.cover(&both));
        assert_eq!(both_cells, brute_force(&grid, &RectGeo::new(vec![0.5, 0.5], vec![1.5, 1.5])));
    }
}
