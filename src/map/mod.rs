//! Box maps and the boundary that absorbs their failures
//!
//! A [`Map`] takes a cell box to a region guaranteed to contain its image.
//! When an evaluator cannot resolve an image it returns
//! [`MapError::Unresolved`]; [`MapBoundary`] replaces such results with the
//! region named by a [`FallbackPolicy`] so that the refinement loop only ever
//! sees a conservative answer or a fatal error.

mod cached;
mod interval;
mod leslie;

pub use cached::CachedMap;
pub use interval::Interval;
pub use leslie::LeslieMap;

use thiserror::Error;
use tracing::warn;

use crate::geometry::{Geo, RectGeo};

/// Failure of a single map evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// The evaluator could not produce an enclosure for this box; the
    /// fallback region stands in for it.
    #[error("image unresolved: {0}")]
    Unresolved(String),

    /// The evaluator is unusable; the enclosing computation must stop.
    #[error("map evaluation failed: {0}")]
    Fatal(String),
}

/// Conservative box map.
pub trait Map {
    /// Region containing the image of `rect`.
    fn image(&self, rect: &RectGeo) -> Result<Geo, MapError>;

    /// False when the evaluator cannot be used at all (for example a
    /// parameter box it does not support).
    fn good(&self) -> bool {
        true
    }
}

impl<F> Map for F
where
    F: Fn(&RectGeo) -> Result<Geo, MapError>,
{
    fn image(&self, rect: &RectGeo) -> Result<Geo, MapError> {
        self(rect)
    }
}

/// Region substituted for an unresolved image.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub enum FallbackPolicy {
    /// The whole grid: every cell becomes reachable.
    #[default]
    FullBounds,

    /// A fixed region, typically a designated "bad box".
    Region(RectGeo),
}

impl FallbackPolicy {
    /// Concrete fallback region for a grid with outer box `bounds`.
    pub fn region(&self, bounds: &RectGeo) -> RectGeo {
        match self {
            FallbackPolicy::FullBounds => bounds.clone(),
            FallbackPolicy::Region(rect) => rect.clone(),
        }
    }
}

/// Evaluates a [`Map`] on behalf of the refinement loop.
///
/// Unresolved images, and images that are not well-formed boxes, are replaced
/// by the fallback region and counted; the first failure and every
/// `log_interval`-th one after it are logged. Fatal errors and images of the
/// wrong dimension are returned to the caller.
#[derive(Debug)]
pub struct MapBoundary<'a, M: ?Sized> {
    map: &'a M,
    fallback: RectGeo,
    log_interval: u64,
    evaluations: u64,
    failures: u64,
}

impl<'a, M: Map + ?Sized> MapBoundary<'a, M> {
    /// Boundary around `map` for a grid with outer box `bounds`.
    pub fn new(map: &'a M, bounds: &RectGeo, policy: &FallbackPolicy, log_interval: u64) -> Self {
        Self {
            map,
            fallback: policy.region(bounds),
            log_interval: log_interval.max(1),
            evaluations: 0,
            failures: 0,
        }
    }

    /// Image of `rect`, with unresolved results replaced by the fallback.
    pub fn evaluate(&mut self, rect: &RectGeo) -> Result<Geo, MapError> {
        self.evaluations += 1;
        let reason = match self.map.image(rect) {
            Ok(geo) => match geo.bounding_box() {
                None => return Ok(geo),
                Some(hull) if hull.dimension() != rect.dimension() => {
                    return Err(MapError::Fatal(format!(
                        "image has dimension {} for a box of dimension {}",
                        hull.dimension(),
                        rect.dimension()
                    )));
                }
                Some(hull) if hull.is_well_formed() => return Ok(geo),
                Some(hull) => format!("ill-formed image {hull}"),
            },
            Err(MapError::Unresolved(reason)) => reason,
            Err(fatal) => return Err(fatal),
        };

        self.failures += 1;
        if self.failures == 1 || self.failures % self.log_interval == 0 {
            warn!(
                failures = self.failures,
                evaluations = self.evaluations,
                %rect,
                %reason,
                "map image unresolved, substituting fallback region"
            );
        }
        Ok(Geo::Rect(self.fallback.clone()))
    }

    /// Evaluations so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Evaluations that fell back.
    pub fn failures(&self) -> u64 {
        self.failures
    }
}
