//! Regions of phase space
//!
//! [`Geo`] is what maps return and what grids cover: a box, a prism, or a
//! union/intersection of those.

mod prism;
mod rect;

pub use prism::PrismGeo;
pub use rect::RectGeo;

/// Union of regions; its cover is the union of the member covers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnionGeo {
    /// Member regions.
    pub elements: Vec<Geo>,
}

impl UnionGeo {
    /// Union of `elements`.
    pub fn new(elements: Vec<Geo>) -> Self {
        Self { elements }
    }

    /// Add one more member.
    pub fn insert(&mut self, element: impl Into<Geo>) {
        self.elements.push(element.into());
    }
}

/// Intersection of two regions; its cover is the intersection of the covers.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionGeo {
    /// First operand.
    pub first: Box<Geo>,

    /// Second operand.
    pub second: Box<Geo>,
}

impl IntersectionGeo {
    /// Intersection of `first` and `second`.
    pub fn new(first: impl Into<Geo>, second: impl Into<Geo>) -> Self {
        Self {
            first: Box::new(first.into()),
            second: Box::new(second.into()),
        }
    }
}

/// Any region a grid knows how to cover.
#[derive(Debug, Clone, PartialEq)]
pub enum Geo {
    /// Axis-aligned box.
    Rect(RectGeo),

    /// Parallelotope.
    Prism(PrismGeo),

    /// Union of regions.
    Union(UnionGeo),

    /// Intersection of two regions.
    Intersection(IntersectionGeo),
}

impl Geo {
    /// Axis-aligned box enclosing the region, `None` for an empty union.
    pub fn bounding_box(&self) -> Option<RectGeo> {
        match self {
            Geo::Rect(rect) => Some(rect.clone()),
            Geo::Prism(prism) => Some(prism.bounding_box().clone()),
            Geo::Union(union) => union
                .elements
                .iter()
                .filter_map(Geo::bounding_box)
                .reduce(|hull, next| hull.hull(&next)),
            // The first operand already encloses the intersection.
            Geo::Intersection(intersection) => intersection.first.bounding_box(),
        }
    }
}

impl From<RectGeo> for Geo {
    fn from(rect: RectGeo) -> Self {
        Geo::Rect(rect)
    }
}

impl From<PrismGeo> for Geo {
    fn from(prism: PrismGeo) -> Self {
        Geo::Prism(prism)
    }
}

impl From<UnionGeo> for Geo {
    fn from(union: UnionGeo) -> Self {
        Geo::Union(union)
    }
}

impl From<IntersectionGeo> for Geo {
    fn from(intersection: IntersectionGeo) -> Self {
        Geo::Intersection(intersection)
    }
}
