//! Per-frame motion: heading random walk, pointer repulsion, damping, edge bounce, birth fade

use crate::config::MotionConfig;
use crate::particles::Particle;
use egui::{Pos2, Vec2};
use rand::Rng;

/// Latest pointer position, or inactive. Last write wins.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pointer {
    pos: Option<Pos2>,
}

impl Pointer {
    pub fn moved(&mut self, pos: Pos2) {
        self.pos = Some(pos);
    }

    pub fn left(&mut self) {
        self.pos = None;
    }

    pub fn position(&self) -> Option<Pos2> {
        self.pos
    }

    pub fn is_active(&self) -> bool {
        self.pos.is_some()
    }
}

/// Outward push away from `pointer`: linear falloff from full strength at the pointer
/// to zero at `radius`. Zero when outside the radius or exactly on the pointer.
pub fn repulsion(pos: Vec2, pointer: Pos2, radius: f32, strength: f32) -> Vec2 {
    let away = pos - pointer.to_vec2();
    let dist = away.length();
    if dist < radius && dist > 0.0 {
        let force = (1.0 - dist / radius) * strength;
        away / dist * force
    } else {
        Vec2::ZERO
    }
}

/// Advance every particle by one tick. Takes a slice, so the population is unchanged.
pub fn step(
    particles: &mut [Particle],
    bounds: Vec2,
    pointer: Option<Pos2>,
    config: &MotionConfig,
    rng: &mut impl Rng,
) {
    for p in particles.iter_mut() {
        // -- STEERING --
        p.heading += (rng.gen::<f32>() - 0.5) * config.turn_rate;
        p.vel += Vec2::new(p.heading.cos(), p.heading.sin()) * config.steer_accel;

        // -- POINTER REPULSION --
        if let Some(pointer) = pointer {
            p.vel += repulsion(
                p.pos,
                pointer,
                config.repulsion_radius,
                config.repulsion_strength,
            );
        }

        // -- MOVEMENT --
        p.pos += p.vel;
        p.vel *= config.damping;

        // Bounce: flip velocity, no clamp. The crossing tick may overshoot the edge.
        if p.pos.x < 0.0 || p.pos.x > bounds.x {
            p.vel.x = -p.vel.x;
        }
        if p.pos.y < 0.0 || p.pos.y > bounds.y {
            p.vel.y = -p.vel.y;
        }

        // -- BIRTH FADE --
        if p.fade < 1.0 {
            p.fade = (p.fade + config.birth_fade_speed).min(1.0);
        }
    }
}
