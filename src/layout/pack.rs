//! Front-chain circle packing and minimum enclosing circles.
//!
//! `pack_siblings` places circles tangent to each other around the origin,
//! keeping a chain of the outermost circles ("front chain") and always
//! inserting the next circle next to the pair closest to the centroid. The
//! result never has overlapping circles. `enclose` computes the smallest
//! circle containing a set of circles (Welzl's algorithm, iterative form).

use crate::geometry::{Circle, Vector};

/// Tolerance used when testing circles for intersection.
const INTERSECTION_EPSILON: f64 = 1e-6;

/// Circle being packed. Positions are mutated in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackCircle {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

impl PackCircle {
    pub fn with_radius(r: f64) -> Self {
        Self { x: 0.0, y: 0.0, r }
    }

    fn center(&self) -> Vector {
        Vector::new(self.x, self.y)
    }
}

/// Place `c` tangent to both `a` and `b`.
fn place(b: PackCircle, a: PackCircle, c: &mut PackCircle) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let d2 = dx * dx + dy * dy;
    if d2 > 0.0 {
        let a2 = (a.r + c.r).powi(2);
        let b2 = (b.r + c.r).powi(2);
        if a2 > b2 {
            let x = (d2 + b2 - a2) / (2.0 * d2);
            let y = (b2 / d2 - x * x).max(0.0).sqrt();
            c.x = b.x - x * dx - y * dy;
            c.y = b.y - x * dy + y * dx;
        } else {
            let x = (d2 + a2 - b2) / (2.0 * d2);
            let y = (a2 / d2 - x * x).max(0.0).sqrt();
            c.x = a.x + x * dx - y * dy;
            c.y = a.y + x * dy + y * dx;
        }
    } else {
        c.x = a.x + c.r;
        c.y = a.y;
    }
}

fn intersects(a: &PackCircle, b: &PackCircle) -> bool {
    let dr = a.r + b.r - INTERSECTION_EPSILON;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

/// Squared distance of the weighted midpoint of `a` and `b` to the origin
fn score(a: &PackCircle, b: &PackCircle) -> f64 {
    let ab = a.r + b.r;
    let dx = (a.x * b.r + b.x * a.r) / ab;
    let dy = (a.y * b.r + b.y * a.r) / ab;
    dx * dx + dy * dy
}

/// Pack the circles so that none overlap, centred around the origin.
///
/// Returns the radius of the enclosing circle; the circle positions are
/// translated so that this enclosing circle is centred at the origin.
pub fn pack_siblings(circles: &mut [PackCircle]) -> f64 {
    let n = circles.len();
    if n == 0 {
        return 0.0;
    }

    circles[0].x = 0.0;
    circles[0].y = 0.0;
    if n == 1 {
        return circles[0].r;
    }

    circles[0].x = -circles[1].r;
    circles[1].x = circles[0].r;
    circles[1].y = 0.0;
    if n == 2 {
        let enclosing = enclose(circles);
        translate_all(circles, enclosing.center.revert());
        return enclosing.r;
    }

    let (first, second) = (circles[1], circles[0]);
    place(first, second, &mut circles[2]);

    // Front chain as a doubly linked ring over circle indices
    let mut next = vec![0usize; n];
    let mut previous = vec![0usize; n];
    let (mut a, mut b) = (0usize, 1usize);
    let c = 2usize;
    next[a] = b;
    previous[b] = a;
    next[b] = c;
    previous[c] = b;
    next[c] = a;
    previous[a] = c;

    let mut i = 3;
    'pack: while i < n {
        let (ca, cb) = (circles[a], circles[b]);
        place(ca, cb, &mut circles[i]);
        let candidate = circles[i];

        // Find the closest intersecting circle on the front chain, if any.
        // Closeness is measured by the accumulated radii along the chain.
        let mut j = next[b];
        let mut k = previous[a];
        let mut sj = circles[b].r;
        let mut sk = circles[a].r;
        loop {
            if sj <= sk {
                if intersects(&circles[j], &candidate) {
                    b = j;
                    next[a] = b;
                    previous[b] = a;
                    continue 'pack;
                }
                sj += circles[j].r;
                j = next[j];
            } else {
                if intersects(&circles[k], &candidate) {
                    a = k;
                    next[a] = b;
                    previous[b] = a;
                    continue 'pack;
                }
                sk += circles[k].r;
                k = previous[k];
            }
            if j == next[k] {
                break;
            }
        }

        // Insert the new circle between a and b
        previous[i] = a;
        next[i] = b;
        next[a] = i;
        previous[b] = i;
        b = i;

        // The pair closest to the centroid becomes the new insertion point
        let mut best = score(&circles[a], &circles[next[a]]);
        let mut cursor = next[b];
        while cursor != b {
            let candidate_score = score(&circles[cursor], &circles[next[cursor]]);
            if candidate_score < best {
                a = cursor;
                best = candidate_score;
            }
            cursor = next[cursor];
        }
        b = next[a];
        i += 1;
    }

    // Enclose the front chain only, all other circles lie inside of it
    let mut chain = vec![circles[b]];
    let mut cursor = next[b];
    while cursor != b {
        chain.push(circles[cursor]);
        cursor = next[cursor];
    }
    let mut enclosing = enclose(&chain);
    for circle in circles.iter() {
        let needed = circle.center().distance_to(enclosing.center) + circle.r;
        if needed > enclosing.r {
            enclosing.r = needed;
        }
    }
    translate_all(circles, enclosing.center.revert());
    enclosing.r
}

fn translate_all(circles: &mut [PackCircle], offset: Vector) {
    for circle in circles.iter_mut() {
        circle.x += offset.x;
        circle.y += offset.y;
    }
}

// ============================================================================
// Minimum enclosing circle
// ============================================================================

/// Smallest circle enclosing all given circles.
pub fn enclose(circles: &[PackCircle]) -> Circle {
    if circles.is_empty() {
        return Circle::new(Vector::ZERO, 0.0);
    }

    let mut basis: Vec<PackCircle> = Vec::new();
    let mut enclosing: Option<PackCircle> = None;
    let mut i = 0;
    let mut restarts = 0;
    while i < circles.len() {
        let p = circles[i];
        if enclosing.map_or(false, |e| encloses_weak(&e, &p)) {
            i += 1;
            continue;
        }
        match extend_basis(&basis, p) {
            Some(extended) => {
                basis = extended;
                enclosing = encloses_basis(&basis);
            }
            None => break,
        }
        restarts += 1;
        if enclosing.is_none() || restarts > circles.len() * circles.len() * 4 + 16 {
            break;
        }
        i = 0;
    }

    let result = match enclosing {
        Some(e) if circles.iter().all(|c| encloses_weak(&e, c)) => e,
        _ => fallback_enclose(circles),
    };
    Circle::new(result.center(), result.r)
}

/// Centroid based enclosing circle, used when the exact algorithm hits
/// numerically degenerate input (for example three collinear circles).
fn fallback_enclose(circles: &[PackCircle]) -> PackCircle {
    let n = circles.len() as f64;
    let cx = circles.iter().map(|c| c.x).sum::<f64>() / n;
    let cy = circles.iter().map(|c| c.y).sum::<f64>() / n;
    let center = Vector::new(cx, cy);
    let r = circles
        .iter()
        .map(|c| c.center().distance_to(center) + c.r)
        .fold(0.0, f64::max);
    PackCircle { x: cx, y: cy, r }
}

fn extend_basis(basis: &[PackCircle], p: PackCircle) -> Option<Vec<PackCircle>> {
    if encloses_weak_all(&p, basis) {
        return Some(vec![p]);
    }

    for &bi in basis {
        if encloses_not(&p, &bi) && encloses_weak_all(&encloses_basis2(&bi, &p), basis) {
            return Some(vec![bi, p]);
        }
    }

    for i in 0..basis.len().saturating_sub(1) {
        for j in (i + 1)..basis.len() {
            let (bi, bj) = (basis[i], basis[j]);
            if encloses_not(&encloses_basis2(&bi, &bj), &p)
                && encloses_not(&encloses_basis2(&bi, &p), &bj)
                && encloses_not(&encloses_basis2(&bj, &p), &bi)
            {
                if let Some(e) = encloses_basis3(&bi, &bj, &p) {
                    if encloses_weak_all(&e, basis) {
                        return Some(vec![bi, bj, p]);
                    }
                }
            }
        }
    }

    None
}

fn encloses_not(a: &PackCircle, b: &PackCircle) -> bool {
    let dr = a.r - b.r;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr < 0.0 || dr * dr < dx * dx + dy * dy
}

fn encloses_weak(a: &PackCircle, b: &PackCircle) -> bool {
    let dr = a.r - b.r + a.r.max(b.r).max(1.0) * 1e-9;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

fn encloses_weak_all(a: &PackCircle, basis: &[PackCircle]) -> bool {
    basis.iter().all(|b| encloses_weak(a, b))
}

fn encloses_basis(basis: &[PackCircle]) -> Option<PackCircle> {
    match basis {
        [a] => Some(*a),
        [a, b] => Some(encloses_basis2(a, b)),
        [a, b, c] => encloses_basis3(a, b, c),
        _ => None,
    }
}

fn encloses_basis2(a: &PackCircle, b: &PackCircle) -> PackCircle {
    let x21 = b.x - a.x;
    let y21 = b.y - a.y;
    let r21 = b.r - a.r;
    let l = (x21 * x21 + y21 * y21).sqrt();
    if l == 0.0 {
        return if a.r >= b.r { *a } else { *b };
    }
    PackCircle {
        x: (a.x + b.x + x21 / l * r21) / 2.0,
        y: (a.y + b.y + y21 / l * r21) / 2.0,
        r: (l + a.r + b.r) / 2.0,
    }
}

fn encloses_basis3(a: &PackCircle, b: &PackCircle, c: &PackCircle) -> Option<PackCircle> {
    let (x1, y1, r1) = (a.x, a.y, a.r);
    let (x2, y2, r2) = (b.x, b.y, b.r);
    let (x3, y3, r3) = (c.x, c.y, c.r);
    let a2 = x1 - x2;
    let a3 = x1 - x3;
    let b2 = y1 - y2;
    let b3 = y1 - y3;
    let c2 = r2 - r1;
    let c3 = r3 - r1;
    let d1 = x1 * x1 + y1 * y1 - r1 * r1;
    let d2 = d1 - x2 * x2 - y2 * y2 + r2 * r2;
    let d3 = d1 - x3 * x3 - y3 * y3 + r3 * r3;
    let ab = a3 * b2 - a2 * b3;
    if ab == 0.0 {
        return None;
    }
    let xa = (b2 * d3 - b3 * d2) / (ab * 2.0) - x1;
    let xb = (b3 * c2 - b2 * c3) / ab;
    let ya = (a3 * d2 - a2 * d3) / (ab * 2.0) - y1;
    let yb = (a2 * c3 - a3 * c2) / ab;
    let qa = xb * xb + yb * yb - 1.0;
    let qb = 2.0 * (r1 + xa * xb + ya * yb);
    let qc = xa * xa + ya * ya - r1 * r1;
    let r = if qa.abs() > 1e-6 {
        -(qb + (qb * qb - 4.0 * qa * qc).sqrt()) / (2.0 * qa)
    } else {
        -(qc / qb)
    };
    let result = PackCircle {
        x: x1 + xa + xb * r,
        y: y1 + ya + yb * r,
        r,
    };
    if result.x.is_finite() && result.y.is_finite() && result.r.is_finite() {
        Some(result)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_no_overlap(circles: &[PackCircle]) {
        for (i, a) in circles.iter().enumerate() {
            for b in circles.iter().skip(i + 1) {
                let distance = a.center().distance_to(b.center());
                assert!(
                    distance + 1e-4 >= a.r + b.r,
                    "circles overlap: {:?} {:?}",
                    a,
                    b
                );
            }
        }
    }

    fn assert_enclosed(circles: &[PackCircle], r: f64) {
        for c in circles {
            assert!(c.center().length() + c.r <= r + 1e-4, "{:?} not inside {}", c, r);
        }
    }

    #[test]
    fn test_pack_single_circle() {
        let mut circles = vec![PackCircle::with_radius(7.0)];
        assert_eq!(pack_siblings(&mut circles), 7.0);
        assert_eq!(circles[0].center(), Vector::ZERO);
    }

    #[test]
    fn test_pack_two_circles_touch() {
        let mut circles = vec![PackCircle::with_radius(10.0), PackCircle::with_radius(5.0)];
        let r = pack_siblings(&mut circles);
        assert!((r - 15.0).abs() < 1e-9);
        assert_no_overlap(&circles);
        assert_enclosed(&circles, r);
    }

    #[test]
    fn test_pack_many_circles() {
        let mut circles: Vec<PackCircle> = (0..40)
            .map(|i| PackCircle::with_radius(3.0 + (i * 7 % 11) as f64))
            .collect();
        let r = pack_siblings(&mut circles);
        assert_no_overlap(&circles);
        assert_enclosed(&circles, r);
    }

    #[test]
    fn test_enclose_two_circles() {
        let e = enclose(&[
            PackCircle { x: -10.0, y: 0.0, r: 5.0 },
            PackCircle { x: 10.0, y: 0.0, r: 5.0 },
        ]);
        assert!((e.r - 15.0).abs() < 1e-9);
        assert!(e.center.length() < 1e-9);
    }

    #[test]
    fn test_enclose_collinear_circles() {
        let circles = [
            PackCircle { x: -10.0, y: 0.0, r: 1.0 },
            PackCircle { x: 0.0, y: 0.0, r: 1.0 },
            PackCircle { x: 10.0, y: 0.0, r: 1.0 },
        ];
        let e = enclose(&circles);
        for c in &circles {
            assert!(c.center().distance_to(e.center) + c.r <= e.r + 1e-6);
        }
    }
}
