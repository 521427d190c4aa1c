use math::{on_segment, segments_intersect, signed_area, Point, EPS};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::commons::RuntimeParams;
use crate::{error::GeometryError, util::random};

/// A simple polygon. Vertices are kept in the order given; the closing edge
/// runs from the last vertex back to the first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct Polygon {
    vertices: Vec<Point>,
    min: Point,
    max: Point,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Result<Self, GeometryError> {
        let n = vertices.len();
        if n < 3 {
            return Err(GeometryError::TooFewVertices(n));
        }
        if !vertices.iter().all(Point::is_finite) {
            return Err(GeometryError::NonFinite);
        }
        for i in 0..n {
            // edges sharing a vertex with edge i are skipped
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                if segments_intersect(
                    &vertices[i],
                    &vertices[(i + 1) % n],
                    &vertices[j],
                    &vertices[(j + 1) % n],
                ) {
                    return Err(GeometryError::SelfIntersecting {
                        first: i,
                        second: j,
                    });
                }
            }
        }
        if signed_area(&vertices).abs() <= EPS {
            return Err(GeometryError::Degenerate);
        }
        Ok(Self::preset(vertices))
    }

    fn preset(vertices: Vec<Point>) -> Self {
        let (min, max) = vertices.iter().fold(
            (
                Point::new(f64::INFINITY, f64::INFINITY),
                Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            ),
            |(min, max), p| {
                (
                    Point::new(min.x.min(p.x), min.y.min(p.y)),
                    Point::new(max.x.max(p.x), max.y.max(p.y)),
                )
            },
        );
        Self { vertices, min, max }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.vertices).abs()
    }

    fn edges(&self) -> impl Iterator<Item = (&Point, &Point)> {
        self.vertices
            .iter()
            .zip(self.vertices.iter().cycle().skip(1))
    }

    /// Points on an edge count as inside.
    pub fn contains(&self, p: &Point) -> bool {
        if p.x < self.min.x || p.x > self.max.x || p.y < self.min.y || p.y > self.max.y {
            return false;
        }
        if self.edges().any(|(a, b)| on_segment(p, a, b)) {
            return true;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

impl TryFrom<Vec<Point>> for Polygon {
    type Error = GeometryError;

    fn try_from(vertices: Vec<Point>) -> Result<Self, Self::Error> {
        Self::new(vertices)
    }
}

impl From<Polygon> for Vec<Point> {
    fn from(p: Polygon) -> Self {
        p.vertices
    }
}

/// The region agents live in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// `[0, width] x [0, height]`
    Rect { width: f64, height: f64 },
    Polygon(Polygon),
}

impl Boundary {
    pub fn rect(width: f64, height: f64) -> Result<Self, GeometryError> {
        let b = Boundary::Rect { width, height };
        b.validate()?;
        Ok(b)
    }

    pub fn polygon<I: IntoIterator<Item = (f64, f64)>>(vertices: I) -> Result<Self, GeometryError> {
        let vertices = vertices.into_iter().map(Point::from).collect();
        Ok(Boundary::Polygon(Polygon::new(vertices)?))
    }

    pub fn open_area() -> Self {
        Boundary::Rect {
            width: 600.0,
            height: 400.0,
        }
    }

    pub fn office() -> Self {
        Boundary::Polygon(Polygon::preset(
            [(0.0, 0.0), (20.0, 0.0), (20.0, 10.0), (0.0, 10.0)]
                .into_iter()
                .map(Point::from)
                .collect(),
        ))
    }

    /// A long, narrow and winding corridor.
    pub fn trench() -> Self {
        const TRENCH: [(f64, f64); 28] = [
            (0.0, 0.0),
            (1.0, 10.0),
            (2.0, 10.0),
            (2.0, 25.0),
            (0.0, 30.0),
            (-2.0, 40.0),
            (-2.0, 45.0),
            (-2.0, 55.0),
            (-1.0, 60.0),
            (-1.0, 70.0),
            (-2.0, 75.0),
            (-1.0, 85.0),
            (0.0, 90.0),
            (0.0, 100.0),
            (2.0, 100.0),
            (2.0, 90.0),
            (1.0, 85.0),
            (0.0, 75.0),
            (1.0, 70.0),
            (1.0, 60.0),
            (0.0, 55.0),
            (0.0, 45.0),
            (0.0, 40.0),
            (2.0, 30.0),
            (4.0, 25.0),
            (4.0, 15.0),
            (3.0, 10.0),
            (2.0, 0.0),
        ];
        Boundary::Polygon(Polygon::preset(
            TRENCH.into_iter().map(Point::from).collect(),
        ))
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        match self {
            Boundary::Rect { width, height } => {
                if !width.is_finite() || !height.is_finite() {
                    Err(GeometryError::NonFinite)
                } else if *width <= 0.0 || *height <= 0.0 {
                    Err(GeometryError::NonPositiveExtent {
                        width: *width,
                        height: *height,
                    })
                } else {
                    Ok(())
                }
            }
            // checked on construction
            Boundary::Polygon(_) => Ok(()),
        }
    }

    pub fn contains(&self, p: &Point) -> bool {
        match self {
            Boundary::Rect { width, height } => {
                (0.0..=*width).contains(&p.x) && (0.0..=*height).contains(&p.y)
            }
            Boundary::Polygon(poly) => poly.contains(p),
        }
    }

    pub fn bounding_box(&self) -> (Point, Point) {
        match self {
            Boundary::Rect { width, height } => (Point::ZERO, Point::new(*width, *height)),
            Boundary::Polygon(poly) => (poly.min, poly.max),
        }
    }

    pub fn area(&self) -> f64 {
        match self {
            Boundary::Rect { width, height } => width * height,
            Boundary::Polygon(poly) => poly.area(),
        }
    }

    /// Uniform point of the bounding box; callers reject those outside.
    pub(crate) fn sample<R: Rng>(&self, rng: &mut R) -> Point {
        let (min, max) = self.bounding_box();
        Point::new(
            if min.x < max.x { rng.gen_range(min.x..=max.x) } else { min.x },
            if min.y < max.y { rng.gen_range(min.y..=max.y) } else { min.y },
        )
    }

    /// Applies the velocity `v` to `pt`, resolving contact with the edge.
    ///
    /// A rectangle reflects each axis on its own: the coordinate that would
    /// leave `[0, extent]` keeps its old value and its velocity component is
    /// negated. A polygon gates the whole move: a rejected move keeps the old
    /// position and either mirrors the velocity or, with probability
    /// `stuck_perturbation`, kicks it in a random direction at the same speed
    /// so that agents do not get trapped in concave corners.
    pub(crate) fn confine<R: Rng>(
        &self,
        pt: &mut Point,
        v: &mut Point,
        rng: &mut R,
        rp: &RuntimeParams,
    ) {
        match self {
            Boundary::Rect { width, height } => {
                let x = pt.x + v.x;
                if (0.0..=*width).contains(&x) {
                    pt.x = x;
                } else {
                    v.x = -v.x;
                }
                let y = pt.y + v.y;
                if (0.0..=*height).contains(&y) {
                    pt.y = y;
                } else {
                    v.y = -v.y;
                }
            }
            Boundary::Polygon(poly) => {
                let next = *pt + *v;
                if poly.contains(&next) {
                    *pt = next;
                } else if rp.stuck_perturbation.hit(rng) {
                    let speed = v.norm();
                    v.x += random::symmetric(rng, rp.stuck_impulse);
                    v.y += random::symmetric(rng, rp.stuck_impulse);
                    let new_speed = v.norm();
                    if new_speed > 0.0 {
                        *v *= speed / new_speed;
                    }
                    v.apply_mut(|c| *c = c.clamp(-rp.max_speed, rp.max_speed));
                } else {
                    *v = -*v;
                }
            }
        }
    }
}

impl Default for Boundary {
    fn default() -> Self {
        Boundary::open_area()
    }
}
