//! Planar point-in-polygon tests.
//!
//! Polygons are implicitly closed: the last point connects back to the first.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillRule {
    /// Inside when a ray from the point crosses an odd number of edges,
    /// counted over every polygon on the plane. Nested polygons become holes.
    #[default]
    EvenOdd,
    /// Inside when the signed winding number summed over every polygon on the
    /// plane is non-zero.
    NonZero,
}

impl FillRule {
    pub fn name(&self) -> &'static str {
        match self {
            FillRule::EvenOdd => "even_odd",
            FillRule::NonZero => "non_zero",
        }
    }
}

/// Lattice positions `x0 + i·dx` inside `polys` on the row at height `y`,
/// as half-open index ranges `[lo, hi)` in ascending order.
///
/// Edge crossings are swept left to right. A point on a crossing belongs to
/// the span that starts there.
pub fn row_spans(polys: &[&[[f64; 2]]], y: f64, x0: f64, dx: f64, rule: FillRule) -> Vec<(i64, i64)> {
    let mut crossings: Vec<(f64, i64)> = Vec::new();
    for poly in polys {
        let n = poly.len();
        if n < 3 {
            continue;
        }
        for i in 0..n {
            let [xa, ya] = poly[i];
            let [xb, yb] = poly[(i + 1) % n];
            if (ya > y) != (yb > y) {
                let x = xa + (y - ya) * (xb - xa) / (yb - ya);
                crossings.push((x, if yb > ya { 1 } else { -1 }));
            }
        }
    }
    crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut spans = Vec::new();
    let mut count = 0i64;
    let mut winding = 0i64;
    let mut open: Option<f64> = None;
    for (x, dir) in crossings {
        count += 1;
        winding += dir;
        let filled = match rule {
            FillRule::EvenOdd => count % 2 == 1,
            FillRule::NonZero => winding != 0,
        };
        match (open, filled) {
            (None, true) => open = Some(x),
            (Some(start), false) => {
                let lo = ((start - x0) / dx).ceil() as i64;
                let hi = ((x - x0) / dx).ceil() as i64;
                if lo < hi {
                    spans.push((lo, hi));
                }
                open = None;
            }
            _ => {}
        }
    }
    spans
}

/// Axis-aligned bounds `(xmin, xmax, ymin, ymax)` over all polygons.
pub fn bounds(polys: &[&[[f64; 2]]]) -> Option<(f64, f64, f64, f64)> {
    let mut pts = polys.iter().flat_map(|p| p.iter());
    let first = pts.next()?;
    let init = (first[0], first[0], first[1], first[1]);
    Some(pts.fold(init, |(x0, x1, y0, y1), p| {
        (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1]))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lo: f64, hi: f64) -> Vec<[f64; 2]> {
        vec![[lo, lo], [hi, lo], [hi, hi], [lo, hi]]
    }

    #[test]
    fn even_odd_hole() {
        let outer = square(0.0, 10.0);
        let inner = square(3.0, 7.0);
        let polys = [outer.as_slice(), inner.as_slice()];
        assert_eq!(row_spans(&polys, 5.0, 0.5, 1.0, FillRule::EvenOdd), vec![(0, 3), (7, 10)]);
        assert_eq!(row_spans(&polys, 1.0, 0.5, 1.0, FillRule::EvenOdd), vec![(0, 10)]);
        assert!(row_spans(&polys, 11.0, 0.5, 1.0, FillRule::EvenOdd).is_empty());
    }

    #[test]
    fn nonzero_same_orientation_fills_hole() {
        let outer = square(0.0, 10.0);
        let inner = square(3.0, 7.0);
        let polys = [outer.as_slice(), inner.as_slice()];
        assert_eq!(row_spans(&polys, 5.0, 0.5, 1.0, FillRule::NonZero), vec![(0, 10)]);
    }

    #[test]
    fn nonzero_reversed_inner_is_hole() {
        let outer = square(0.0, 10.0);
        let mut inner = square(3.0, 7.0);
        inner.reverse();
        let polys = [outer.as_slice(), inner.as_slice()];
        assert_eq!(row_spans(&polys, 5.0, 0.5, 1.0, FillRule::NonZero), vec![(0, 3), (7, 10)]);
    }

    #[test]
    fn point_on_left_edge_is_inside() {
        let sq = square(1.0, 4.0);
        let polys = [sq.as_slice()];
        assert_eq!(row_spans(&polys, 2.0, 0.0, 1.0, FillRule::EvenOdd), vec![(1, 4)]);
    }

    #[test]
    fn degenerate_polygon_is_empty() {
        let line = vec![[0.0, 0.0], [1.0, 1.0]];
        let polys = [line.as_slice()];
        assert!(row_spans(&polys, 0.5, 0.0, 0.25, FillRule::EvenOdd).is_empty());
    }
}
