//! Basic geometric primitives for facets in two and three dimensions.
//!
//! A facet in `D` dimensions has exactly `D` vertices: a line segment in 2D and a triangle in 3D.
//! Reference coordinates for both kinds of facets are stored in a [`Vector2`], where 2D facets
//! only use the first component. The 2D reference domain is the interval `[-1, 1]`, while the
//! 3D reference domain is the unit triangle `{ x, y >= 0, x + y <= 1 }`.
use nalgebra::{Point, SVector, Vector2, Vector3};

/// A facet with `D` vertices embedded in `D` dimensions.
pub type Facet<const D: usize> = [Point<f64, D>; D];

pub type Facet2d = Facet<2>;
pub type Facet3d = Facet<3>;

fn unsupported_dimension(dim: usize) -> ! {
    panic!("facets are only supported in 2 and 3 dimensions, got {dim}")
}

/// Constructs a facet from the first `D` entries of the given slice.
///
/// # Panics
///
/// Panics if the slice has fewer than `D` entries.
pub fn facet_from_slice<const D: usize>(vertices: &[Point<f64, D>]) -> Facet<D> {
    assert!(vertices.len() >= D, "not enough vertices to form a facet");
    std::array::from_fn(|i| vertices[i])
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAlignedBoundingBox<const D: usize> {
    min: SVector<f64, D>,
    max: SVector<f64, D>,
}

pub type Aabb<const D: usize> = AxisAlignedBoundingBox<D>;

impl<const D: usize> AxisAlignedBoundingBox<D> {
    pub fn new(min: SVector<f64, D>, max: SVector<f64, D>) -> Self {
        for i in 0..D {
            assert!(min[i] <= max[i]);
        }
        Self { min, max }
    }

    pub fn min(&self) -> &SVector<f64, D> {
        &self.min
    }

    pub fn max(&self) -> &SVector<f64, D> {
        &self.max
    }

    /// Computes the minimal bounding box which encloses both `self` and `other`.
    pub fn enclose(&self, other: &Self) -> Self {
        Self::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point<f64, D>>) -> Option<Self> {
        let mut points = points.into_iter();
        points.next().map(|first| {
            points.fold(Self::new(first.coords, first.coords), |aabb, point| {
                aabb.enclose(&Self::new(point.coords, point.coords))
            })
        })
    }

    pub fn center(&self) -> Point<f64, D> {
        Point::from((self.min + self.max) * 0.5)
    }

    fn half_width(&self) -> SVector<f64, D> {
        (self.max - self.min) * 0.5
    }

    /// Squared distance from the center of the box to any of its corners.
    pub fn radius_squared(&self) -> f64 {
        self.half_width().norm_squared()
    }

    pub fn max_extent(&self) -> f64 {
        (self.max - self.min).max()
    }

    /// Returns the smallest axis-aligned cube with the same center that encloses the box.
    pub fn cube(&self) -> Self {
        let half = 0.5 * self.max_extent();
        let center = self.center().coords;
        Self::new(center.add_scalar(-half), center.add_scalar(half))
    }

    /// Grows the bounding box by `distance` in all directions.
    pub fn grow_uniformly(&self, distance: f64) -> Self {
        Self::new(self.min.add_scalar(-distance), self.max.add_scalar(distance))
    }

    /// Tests whether the point is contained in the closed box.
    pub fn contains_point(&self, point: &Point<f64, D>) -> bool {
        (0..D).all(|d| point[d] >= self.min[d] && point[d] <= self.max[d])
    }

    pub fn intersects(&self, other: &Self) -> bool {
        (0..D).all(|d| other.min[d] <= self.max[d] && other.max[d] >= self.min[d])
    }

    /// Squared distance from the point to the closest point in the box. Zero if the point is inside.
    pub fn distance_squared_to_point(&self, point: &Point<f64, D>) -> f64 {
        (0..D)
            .map(|d| {
                let excess = if point[d] < self.min[d] {
                    self.min[d] - point[d]
                } else if point[d] > self.max[d] {
                    point[d] - self.max[d]
                } else {
                    0.0
                };
                excess * excess
            })
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball<const D: usize> {
    pub center: Point<f64, D>,
    pub radius: f64,
}

impl<const D: usize> Ball<D> {
    pub fn new(center: Point<f64, D>, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn bounding_box(&self) -> Aabb<D> {
        Aabb::new(self.center.coords, self.center.coords).grow_uniformly(self.radius)
    }
}

pub fn is_intersection_box_ball<const D: usize>(aabb: &Aabb<D>, ball: &Ball<D>) -> bool {
    aabb.distance_squared_to_point(&ball.center) <= ball.radius * ball.radius
}

pub fn facet_centroid<const D: usize>(facet: &Facet<D>) -> Point<f64, D> {
    let sum = facet
        .iter()
        .fold(SVector::<f64, D>::zeros(), |acc, v| acc + v.coords);
    Point::from(sum / D as f64)
}

/// The ball centered at the facet centroid which contains every vertex of the facet.
pub fn facet_ball<const D: usize>(facet: &Facet<D>) -> Ball<D> {
    let center = facet_centroid(facet);
    let radius = facet
        .iter()
        .map(|v| (v - center).norm())
        .fold(0.0, f64::max);
    Ball { center, radius }
}

fn to_vector3<const D: usize>(v: &SVector<f64, D>) -> Vector3<f64> {
    Vector3::from_fn(|i, _| if i < D { v[i] } else { 0.0 })
}

/// Normal of the facet, scaled by the length (2D) or twice the area (3D) of the facet.
///
/// In 2D, the normal of the segment `a -> b` is `(-dy, dx)`, so a clockwise traversal of a
/// closed curve produces outward normals. In 3D, the normal follows the right-hand rule
/// for the vertex order.
pub fn facet_unscaled_normal<const D: usize>(facet: &Facet<D>) -> SVector<f64, D> {
    let vertices: &[Point<f64, D>] = facet;
    match D {
        2 => {
            let t = vertices[1] - vertices[0];
            SVector::from_fn(|i, _| if i == 0 { -t[1] } else { t[0] })
        }
        3 => {
            let ab = to_vector3(&(vertices[1] - vertices[0]));
            let ac = to_vector3(&(vertices[2] - vertices[0]));
            let n = ab.cross(&ac);
            SVector::from_fn(|i, _| n[i])
        }
        _ => unsupported_dimension(D),
    }
}

pub fn facet_normal<const D: usize>(facet: &Facet<D>) -> SVector<f64, D> {
    facet_unscaled_normal(facet).normalize()
}

/// Length of a segment or area of a triangle.
pub fn facet_measure<const D: usize>(facet: &Facet<D>) -> f64 {
    match D {
        2 => facet_unscaled_normal(facet).norm(),
        3 => 0.5 * facet_unscaled_normal(facet).norm(),
        _ => unsupported_dimension(D),
    }
}

/// Determinant of the map from the reference facet to the physical facet.
pub fn facet_jacobian<const D: usize>(facet: &Facet<D>) -> f64 {
    match D {
        2 => 0.5 * facet_measure(facet),
        3 => 2.0 * facet_measure(facet),
        _ => unsupported_dimension(D),
    }
}

/// Linear nodal basis functions on the reference facet evaluated at `x_hat`.
pub fn linear_basis<const D: usize>(x_hat: &Vector2<f64>) -> SVector<f64, D> {
    SVector::from_fn(|i, _| match (D, i) {
        (2, 0) => 0.5 * (1.0 - x_hat.x),
        (2, 1) => 0.5 * (1.0 + x_hat.x),
        (3, 0) => 1.0 - x_hat.x - x_hat.y,
        (3, 1) => x_hat.x,
        (3, 2) => x_hat.y,
        _ => unsupported_dimension(D),
    })
}

/// Maps reference coordinates on the facet to physical coordinates.
pub fn ref_to_real<const D: usize>(x_hat: &Vector2<f64>, facet: &Facet<D>) -> Point<f64, D> {
    let basis = linear_basis::<D>(x_hat);
    let coords = facet
        .iter()
        .zip(basis.iter())
        .fold(SVector::<f64, D>::zeros(), |acc, (v, b)| acc + v.coords * *b);
    Point::from(coords)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoint<const D: usize> {
    /// Reference coordinates of the closest point.
    pub ref_pt: Vector2<f64>,
    pub pt: Point<f64, D>,
    pub distance: f64,
}

/// Computes the point on the facet closest to `pt`.
pub fn closest_pt_facet<const D: usize>(pt: &Point<f64, D>, facet: &Facet<D>) -> ClosestPoint<D> {
    let ref_pt = match D {
        2 => closest_ref_pt_segment(pt, facet),
        3 => closest_ref_pt_triangle(pt, facet),
        _ => unsupported_dimension(D),
    };
    let closest = ref_to_real(&ref_pt, facet);
    ClosestPoint {
        ref_pt,
        pt: closest,
        distance: (closest - pt).norm(),
    }
}

fn closest_ref_pt_segment<const D: usize>(pt: &Point<f64, D>, facet: &Facet<D>) -> Vector2<f64> {
    let vertices: &[Point<f64, D>] = facet;
    let (a, b) = (vertices[0], vertices[1]);
    let ab = b - a;
    let length2 = ab.norm_squared();
    let t = if length2 > 0.0 {
        ((pt - a).dot(&ab) / length2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Vector2::new(2.0 * t - 1.0, 0.0)
}

// Voronoi region classification of the point w.r.t. the triangle features,
// see Ericson, "Real-Time Collision Detection", section 5.1.5.
fn closest_ref_pt_triangle<const D: usize>(pt: &Point<f64, D>, facet: &Facet<D>) -> Vector2<f64> {
    let vertices: &[Point<f64, D>] = facet;
    let (a, b, c) = (vertices[0], vertices[1], vertices[2]);
    let ab = b - a;
    let ac = c - a;

    let ap = pt - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return Vector2::new(0.0, 0.0);
    }

    let bp = pt - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return Vector2::new(1.0, 0.0);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return Vector2::new(v, 0.0);
    }

    let cp = pt - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return Vector2::new(0.0, 1.0);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return Vector2::new(0.0, w);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return Vector2::new(1.0 - w, w);
    }

    let denom = 1.0 / (va + vb + vc);
    Vector2::new(vb * denom, vc * denom)
}
