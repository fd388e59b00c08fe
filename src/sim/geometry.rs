//! Collision and visibility geometry
//!
//! Everything the simulation and the bots need to ask "does this overlap"
//! or "can I see that": circles, axis-aligned boxes, rays, and a coarse
//! sampled line-of-sight march. Obstacles are passed in as footprints so this
//! module has no knowledge of entity kinds.

use glam::Vec2;

use crate::consts::LOS_STEP;

/// Collision footprint of a blocking obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Footprint {
    /// Axis-aligned box (trees)
    Box { center: Vec2, half: Vec2 },
    /// Circle (cabin)
    Circle { center: Vec2, radius: f32 },
}

impl Footprint {
    pub fn center(&self) -> Vec2 {
        match *self {
            Footprint::Box { center, .. } | Footprint::Circle { center, .. } => center,
        }
    }

    /// True if a circle at `pos` with `radius` overlaps this footprint
    #[inline]
    pub fn overlaps_circle(&self, pos: Vec2, radius: f32) -> bool {
        match *self {
            Footprint::Box { center, half } => circle_vs_box(center, half, pos, radius),
            Footprint::Circle {
                center,
                radius: own,
            } => circle_vs_circle(center, own, pos, radius),
        }
    }

    /// True if the point lies inside the footprint
    #[inline]
    pub fn contains_point(&self, p: Vec2) -> bool {
        match *self {
            Footprint::Box { center, half } => {
                let d = (p - center).abs();
                d.x <= half.x && d.y <= half.y
            }
            Footprint::Circle { center, radius } => p.distance_squared(center) <= radius * radius,
        }
    }

    /// Distance along a ray to this footprint, if it is hit in front of the origin
    pub fn ray_distance(&self, origin: Vec2, dir: Vec2) -> Option<f32> {
        match *self {
            Footprint::Box { center, half } => ray_vs_box(origin, dir, center, half),
            Footprint::Circle { center, radius } => ray_vs_circle(origin, dir, center, radius),
        }
    }

    /// Gap between a circle and this footprint's surface, plus the unit
    /// direction pointing from the surface toward the circle.
    ///
    /// The gap is negative when they overlap.
    pub fn clearance(&self, pos: Vec2, radius: f32) -> (f32, Vec2) {
        match *self {
            Footprint::Box { center, half } => {
                let closest = pos.clamp(center - half, center + half);
                let offset = pos - closest;
                let dist = offset.length();
                if dist > f32::EPSILON {
                    (dist - radius, offset / dist)
                } else {
                    // Center inside the box: push out from the box center
                    (-radius, (pos - center).normalize_or_zero())
                }
            }
            Footprint::Circle {
                center,
                radius: own,
            } => {
                let offset = pos - center;
                let dist = offset.length();
                (dist - own - radius, offset.normalize_or_zero())
            }
        }
    }
}

/// Circle/circle overlap: centers closer than the radius sum
#[inline]
pub fn circle_vs_circle(a_center: Vec2, a_radius: f32, b_center: Vec2, b_radius: f32) -> bool {
    let reach = a_radius + b_radius;
    a_center.distance_squared(b_center) < reach * reach
}

/// Circle/axis-aligned box overlap using the clamped closest point
#[inline]
pub fn circle_vs_box(box_center: Vec2, box_half: Vec2, circle_center: Vec2, radius: f32) -> bool {
    let closest = circle_center.clamp(box_center - box_half, box_center + box_half);
    closest.distance_squared(circle_center) < radius * radius
}

/// Ray/circle intersection
///
/// `dir` must be unit length. Returns the closest positive root of the
/// quadratic, or `None` if the ray misses or both roots are behind the origin.
pub fn ray_vs_circle(origin: Vec2, dir: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let s = disc.sqrt();
    let near = -b - s;
    let far = -b + s;
    if near > 0.0 {
        Some(near)
    } else if far > 0.0 {
        Some(far)
    } else {
        None
    }
}

/// Ray/axis-aligned box intersection (slab method)
///
/// Returns `None` on a miss or if the box lies entirely behind the origin.
pub fn ray_vs_box(origin: Vec2, dir: Vec2, box_center: Vec2, box_half: Vec2) -> Option<f32> {
    let min = box_center - box_half;
    let max = box_center + box_half;

    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for (o, d, lo, hi) in [(origin.x, dir.x, min.x, max.x), (origin.y, dir.y, min.y, max.y)] {
        if d.abs() < 1e-8 {
            // Parallel to this slab: must already be inside it
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let t1 = (lo - o) / d;
        let t2 = (hi - o) / d;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
    }

    if t_max < t_min || t_max <= 0.0 {
        return None;
    }
    Some(if t_min > 0.0 { t_min } else { t_max })
}

/// Nearest obstacle hit along a ray
pub fn first_ray_hit<I>(origin: Vec2, dir: Vec2, obstacles: I) -> Option<f32>
where
    I: IntoIterator<Item = Footprint>,
{
    obstacles
        .into_iter()
        .filter_map(|f| f.ray_distance(origin, dir))
        .min_by(|a, b| a.total_cmp(b))
}

/// Coarse sampled line of sight between two points
///
/// Marches a sample point from `p1` to `p2` in `LOS_STEP` increments and
/// fails at the first sample inside any footprint. This is the visibility
/// authority for AI decisions; it is not exact geometry.
pub fn has_line_of_sight<I>(p1: Vec2, p2: Vec2, obstacles: I) -> bool
where
    I: IntoIterator<Item = Footprint> + Clone,
{
    let delta = p2 - p1;
    let dist = delta.length();
    if dist < f32::EPSILON {
        return true;
    }

    let steps = (dist / LOS_STEP).ceil().max(1.0) as u32;
    for i in 0..=steps {
        let p = p1 + delta * (i as f32 / steps as f32);
        if obstacles.clone().into_iter().any(|f| f.contains_point(p)) {
            return false;
        }
    }
    true
}

/// True if a circle at `pos` leaves the map (inset by `radius`) or overlaps an obstacle
pub fn position_blocked<I>(pos: Vec2, radius: f32, bounds: Vec2, obstacles: I) -> bool
where
    I: IntoIterator<Item = Footprint>,
{
    if pos.x < radius || pos.y < radius || pos.x > bounds.x - radius || pos.y > bounds.y - radius {
        return true;
    }
    obstacles.into_iter().any(|f| f.overlaps_circle(pos, radius))
}

/// True if a point lies outside the map rectangle
#[inline]
pub fn out_of_bounds(pos: Vec2, bounds: Vec2) -> bool {
    pos.x < 0.0 || pos.y < 0.0 || pos.x > bounds.x || pos.y > bounds.y
}
