//! Circle/rectangle collision, entity push-out, and projectile reflection

use super::arena::{Arena, Wall};

/// Which velocity axis a bounce flipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BounceAxis {
    Horizontal,
    Vertical,
}

/// Physics helpers shared by both peers' simulations
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Circle-vs-rectangle overlap test via the nearest point on the rect
    pub fn circle_rect_overlap(cx: f64, cy: f64, radius: f64, wall: &Wall) -> bool {
        let nx = cx.clamp(wall.x, wall.x + wall.w);
        let ny = cy.clamp(wall.y, wall.y + wall.h);
        let dx = cx - nx;
        let dy = cy - ny;
        dx * dx + dy * dy < radius * radius
    }

    /// Clamp an entity center inside the arena interior
    pub fn clamp_to_arena(x: f64, y: f64, radius: f64, inset: f64, arena: &Arena) -> (f64, f64) {
        let min_x = arena.x + radius + inset;
        let max_x = arena.x + arena.w - radius - inset;
        let min_y = arena.y + radius + inset;
        let max_y = arena.y + arena.h - radius - inset;
        (x.clamp(min_x, max_x), y.clamp(min_y, max_y))
    }

    /// Push an overlapping entity out of a wall along the vector from the
    /// nearest rect point, to radius + 1 away from it. Returns the new
    /// center, or None when there was no overlap.
    pub fn push_out_of_wall(x: f64, y: f64, radius: f64, wall: &Wall) -> Option<(f64, f64)> {
        if !Self::circle_rect_overlap(x, y, radius, wall) {
            return None;
        }
        let nx = x.clamp(wall.x, wall.x + wall.w);
        let ny = y.clamp(wall.y, wall.y + wall.h);
        let dx = x - nx;
        let dy = y - ny;
        let d = (dx * dx + dy * dy).sqrt().max(1.0);
        Some((nx + (dx / d) * (radius + 1.0), ny + (dy / d) * (radius + 1.0)))
    }

    /// Reflect a projectile off a wall it overlaps.
    ///
    /// The reflection axis is chosen by the smallest edge overlap, with the
    /// horizontal pair (left/right) winning ties over the vertical pair.
    /// Exactly one velocity component flips, and the position is corrected
    /// out of penetration by the overlap amount.
    ///
    /// Returns (new_x, new_y, new_vx, new_vy, axis).
    pub fn reflect_off_wall(
        x: f64,
        y: f64,
        vx: f64,
        vy: f64,
        radius: f64,
        wall: &Wall,
    ) -> (f64, f64, f64, f64, BounceAxis) {
        let left = wall.x;
        let right = wall.x + wall.w;
        let top = wall.y;
        let bottom = wall.y + wall.h;

        let overlap_l = (x + radius) - left;
        let overlap_r = right - (x - radius);
        let overlap_t = (y + radius) - top;
        let overlap_b = bottom - (y - radius);

        let min_h = overlap_l.min(overlap_r);
        let min_v = overlap_t.min(overlap_b);

        if min_h <= min_v {
            let new_x = if overlap_l <= overlap_r {
                x - overlap_l
            } else {
                x + overlap_r
            };
            (new_x, y, -vx, vy, BounceAxis::Horizontal)
        } else {
            let new_y = if overlap_t <= overlap_b {
                y - overlap_t
            } else {
                y + overlap_b
            };
            (x, new_y, vx, -vy, BounceAxis::Vertical)
        }
    }

    pub fn dist(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
        ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
    }

    /// Circle-vs-circle overlap (projectile against an entity)
    pub fn circles_overlap(x1: f64, y1: f64, r1: f64, x2: f64, y2: f64, r2: f64) -> bool {
        let dx = x2 - x1;
        let dy = y2 - y1;
        let combined = r1 + r2;
        dx * dx + dy * dy < combined * combined
    }

    /// Normalize a direction vector; zero input stays zero
    pub fn normalize(x: f64, y: f64) -> (f64, f64) {
        let m = (x * x + y * y).sqrt();
        if m == 0.0 {
            (0.0, 0.0)
        } else {
            (x / m, y / m)
        }
    }
}
