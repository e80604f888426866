//! Arena bounds, walls, and the deterministic layout templates.
//!
//! Wall order is fixed once a layout is built: the four border walls come
//! first, then the template walls in insertion order. The index of a wall
//! in this list is its wire identifier for damage and break events, so the
//! builders here must produce identical lists on every peer given the same
//! layout name and arena bounds.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::tuning::{BORDER_THICKNESS, LOGICAL_H, LOGICAL_W, WALL_HP};

/// Playable arena rectangle in logical units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Arena {
    /// Standard arena: the logical world inset by the frame padding,
    /// with extra room at the top for the HUD band.
    pub fn standard() -> Self {
        let pad = 40.0;
        Self {
            x: pad,
            y: pad + 30.0,
            w: LOGICAL_W - pad * 2.0,
            h: LOGICAL_H - pad * 2.0 - 30.0,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// Axis-aligned wall. `hp == None` marks an indestructible border wall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub hp: Option<i32>,
    pub max_hp: Option<i32>,
}

impl Wall {
    fn solid(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            w,
            h,
            hp: None,
            max_hp: None,
        }
    }

    fn breakable(x: f64, y: f64, w: f64, h: f64, hp: i32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            hp: Some(hp),
            max_hp: Some(hp),
        }
    }

    /// A wall takes part in collision checks until its HP is exhausted
    pub fn intact(&self) -> bool {
        self.hp.map_or(true, |hp| hp > 0)
    }

    /// Decrement HP on a breakable wall, returning the new value.
    /// Border walls return None and take no damage.
    pub fn damage(&mut self) -> Option<i32> {
        match self.hp.as_mut() {
            Some(hp) => {
                *hp -= 1;
                Some(*hp)
            }
            None => None,
        }
    }

    /// Overwrite HP from a relayed wall-hit event. Wall HP only ever
    /// decreases, so a stale relay can never resurrect a wall.
    pub fn apply_remote_hp(&mut self, new_hp: i32) {
        if let Some(hp) = self.hp.as_mut() {
            if new_hp < *hp {
                *hp = new_hp;
            }
        }
    }
}

/// The four named wall-placement templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Classic,
    Corridors,
    Open,
    Fortress,
}

impl Layout {
    pub const ALL: [Layout; 4] = [
        Layout::Classic,
        Layout::Corridors,
        Layout::Open,
        Layout::Fortress,
    ];

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Layout::Classic => "classic",
            Layout::Corridors => "corridors",
            Layout::Open => "open",
            Layout::Fortress => "fortress",
        }
    }
}

/// Build the full wall list for a layout: four border walls, then the
/// template walls. Deterministic given (layout, arena).
pub fn build_walls(layout: Layout, arena: &Arena) -> Vec<Wall> {
    let t = BORDER_THICKNESS;
    let mut walls = vec![
        Wall::solid(arena.x, arena.y, arena.w, t),
        Wall::solid(arena.x, arena.y + arena.h - t, arena.w, t),
        Wall::solid(arena.x, arena.y, t, arena.h),
        Wall::solid(arena.x + arena.w - t, arena.y, t, arena.h),
    ];

    match layout {
        Layout::Classic => classic_walls(arena, &mut walls),
        Layout::Corridors => corridors_walls(arena, &mut walls),
        Layout::Open => open_walls(arena, &mut walls),
        Layout::Fortress => fortress_walls(arena, &mut walls),
    }

    walls
}

fn classic_walls(arena: &Arena, walls: &mut Vec<Wall>) {
    let (cx, cy) = arena.center();
    let iw = 12.0;
    walls.push(Wall::breakable(cx - 60.0, cy - iw / 2.0, 120.0, iw, WALL_HP));
    walls.push(Wall::breakable(cx - iw / 2.0, cy - 60.0, iw, 120.0, WALL_HP));
    let (off, bw, bh) = (100.0, 80.0, 12.0);
    walls.push(Wall::breakable(arena.x + off, arena.y + off, bw, bh, WALL_HP));
    walls.push(Wall::breakable(
        arena.x + arena.w - off - bw,
        arena.y + off,
        bw,
        bh,
        WALL_HP,
    ));
    walls.push(Wall::breakable(
        arena.x + off,
        arena.y + arena.h - off - bh,
        bw,
        bh,
        WALL_HP,
    ));
    walls.push(Wall::breakable(
        arena.x + arena.w - off - bw,
        arena.y + arena.h - off - bh,
        bw,
        bh,
        WALL_HP,
    ));
    walls.push(Wall::breakable(cx - 150.0, cy - 80.0, iw, 50.0, WALL_HP));
    walls.push(Wall::breakable(cx + 150.0 - iw, cy + 30.0, iw, 50.0, WALL_HP));
}

fn corridors_walls(arena: &Arena, walls: &mut Vec<Wall>) {
    let (cx, cy) = arena.center();
    let iw = 10.0;
    // Horizontal corridors
    walls.push(Wall::breakable(arena.x + 40.0, cy - 80.0, 200.0, iw, WALL_HP));
    walls.push(Wall::breakable(
        arena.x + arena.w - 240.0,
        cy - 80.0,
        200.0,
        iw,
        WALL_HP,
    ));
    walls.push(Wall::breakable(arena.x + 40.0, cy + 70.0, 200.0, iw, WALL_HP));
    walls.push(Wall::breakable(
        arena.x + arena.w - 240.0,
        cy + 70.0,
        200.0,
        iw,
        WALL_HP,
    ));
    // Vertical dividers with gaps
    walls.push(Wall::breakable(cx - iw / 2.0, arena.y + 20.0, iw, 100.0, WALL_HP));
    walls.push(Wall::breakable(cx - iw / 2.0, cy + 40.0, iw, 100.0, WALL_HP));
    // Narrow passage walls
    walls.push(Wall::breakable(arena.x + 140.0, arena.y + 30.0, iw, 80.0, WALL_HP));
    walls.push(Wall::breakable(
        arena.x + arena.w - 150.0,
        arena.y + 30.0,
        iw,
        80.0,
        WALL_HP,
    ));
    walls.push(Wall::breakable(
        arena.x + 140.0,
        arena.y + arena.h - 110.0,
        iw,
        80.0,
        WALL_HP,
    ));
    walls.push(Wall::breakable(
        arena.x + arena.w - 150.0,
        arena.y + arena.h - 110.0,
        iw,
        80.0,
        WALL_HP,
    ));
    // Center obstacle
    walls.push(Wall::breakable(cx - 40.0, cy - iw / 2.0, 80.0, iw, WALL_HP));
}

fn open_walls(arena: &Arena, walls: &mut Vec<Wall>) {
    let (cx, cy) = arena.center();
    let iw = 12.0;
    walls.push(Wall::breakable(cx - iw / 2.0, cy - 25.0, iw, 50.0, WALL_HP));
    walls.push(Wall::breakable(cx - 120.0, cy - iw / 2.0, 40.0, iw, WALL_HP));
    walls.push(Wall::breakable(cx + 80.0, cy - iw / 2.0, 40.0, iw, WALL_HP));
}

fn fortress_walls(arena: &Arena, walls: &mut Vec<Wall>) {
    let iw = 10.0;
    let hp = WALL_HP + 1;
    // Left fortress (slot 1 side)
    let lx = arena.x + 60.0;
    let ly = arena.y + arena.h / 2.0;
    walls.push(Wall::breakable(lx, ly - 60.0, 60.0, iw, hp));
    walls.push(Wall::breakable(lx, ly + 50.0, 60.0, iw, hp));
    walls.push(Wall::breakable(lx + 50.0, ly - 60.0, iw, 50.0, hp));
    walls.push(Wall::breakable(lx + 50.0, ly + 10.0, iw, 50.0, hp));
    // Right fortress (slot 2 side)
    let rx = arena.x + arena.w - 120.0;
    let ry = arena.y + arena.h / 2.0;
    walls.push(Wall::breakable(rx, ry - 60.0, 60.0, iw, hp));
    walls.push(Wall::breakable(rx, ry + 50.0, 60.0, iw, hp));
    walls.push(Wall::breakable(rx, ry - 60.0, iw, 50.0, hp));
    walls.push(Wall::breakable(rx, ry + 10.0, iw, 50.0, hp));
    // Center divider
    let (cx, cy) = arena.center();
    walls.push(Wall::breakable(cx - iw / 2.0, cy - 40.0, iw, 80.0, WALL_HP));
}
