//! Rubble physics
//!
//! A deliberately small rigid-body capability: axis-aligned rectangular
//! bodies under gravity, bouncing off the screen floor and side walls, with
//! friction/restitution/density knobs and a freeze ("pin") operation. Bodies
//! are embedded in the fragments that own them; the world holds only the
//! environment and steps one body at a time by a fixed dt. Body-body
//! contacts are not simulated - debris only ever interacts with the ground.

use glam::Vec2;

use crate::consts::{
    FRAGMENT_ANGULAR_REST, FRAGMENT_LINEAR_REST, FRAGMENT_MAX_AGE, GRAVITY, PIECE_DENSITY,
    TERMINAL_VELOCITY,
};

/// A simulated rectangular body. Positions are the rectangle center in
/// screen space (y grows downward, matching the canvas).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBody {
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub angular_vel: f32,
    /// Half extents of the unrotated rectangle
    pub half: Vec2,
    pub friction: f32,
    pub restitution: f32,
    pub density: f32,
    /// Pinned bodies are skipped by `step` and never move again
    pub frozen: bool,
    /// Wall-clock age in simulated seconds
    pub age: f32,
}

impl RigidBody {
    pub fn new(pos: Vec2, half: Vec2, friction: f32, restitution: f32, density: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            angle: 0.0,
            angular_vel: 0.0,
            half,
            friction,
            restitution,
            density,
            frozen: false,
            age: 0.0,
        }
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Linear and angular speed both under the rest thresholds
    pub fn at_rest(&self) -> bool {
        self.speed() < FRAGMENT_LINEAR_REST && self.angular_vel.abs() < FRAGMENT_ANGULAR_REST
    }

    /// Pin the body in place. Irreversible for game purposes.
    pub fn freeze(&mut self) {
        self.frozen = true;
        self.vel = Vec2::ZERO;
        self.angular_vel = 0.0;
    }
}

/// The rubble environment: gravity plus the static floor and side walls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsWorld {
    pub gravity: Vec2,
    /// Screen-space y of the floor surface (the bottom edge of the canvas)
    pub floor_y: f32,
    /// Right wall; the left wall is at x = 0
    pub width: f32,
}

impl PhysicsWorld {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            gravity: Vec2::new(0.0, GRAVITY),
            floor_y: height,
            width,
        }
    }

    /// Advance one body by `dt` seconds: integrate, then resolve floor and
    /// wall contacts. Frozen bodies are untouched.
    pub fn step(&self, body: &mut RigidBody, dt: f32) {
        if body.frozen {
            return;
        }
        body.age += dt;

        body.vel += self.gravity * dt;

        // Lighter (less dense) pieces hit drag sooner and drift down slower
        let terminal = TERMINAL_VELOCITY * (body.density / PIECE_DENSITY).sqrt().clamp(0.4, 1.2);
        if body.vel.y > terminal {
            body.vel.y = terminal;
        }

        body.pos += body.vel * dt;
        body.angle += body.angular_vel * dt;

        // Floor contact
        let bottom = self.floor_y - body.half.y;
        if body.pos.y > bottom {
            body.pos.y = bottom;
            if body.vel.y > 0.0 {
                body.vel.y = -body.vel.y * body.restitution;
            }
            body.vel.x *= 1.0 - body.friction;
            body.angular_vel *= 1.0 - body.friction;
            // Swallow bounces smaller than one frame of gravity so bodies
            // actually come to rest instead of micro-jittering
            if body.vel.y.abs() < GRAVITY * dt * 2.0 {
                body.vel.y = 0.0;
            }
        }

        // Side walls
        if body.pos.x < body.half.x {
            body.pos.x = body.half.x;
            body.vel.x = -body.vel.x * body.restitution;
        } else if body.pos.x > self.width - body.half.x {
            body.pos.x = self.width - body.half.x;
            body.vel.x = -body.vel.x * body.restitution;
        }
    }

    /// Pin the body if it has come to rest or outlived the motion budget.
    pub fn settle(&self, body: &mut RigidBody) {
        if body.frozen {
            return;
        }
        if body.age >= FRAGMENT_MAX_AGE || body.at_rest() {
            body.freeze();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn drop_body(world: &PhysicsWorld) -> RigidBody {
        let mut body = RigidBody::new(
            Vec2::new(world.width / 2.0, 100.0),
            Vec2::new(4.0, 4.0),
            0.3,
            0.4,
            PIECE_DENSITY,
        );
        body.vel = Vec2::new(120.0, -200.0);
        body.angular_vel = 3.0;
        body
    }

    fn run(world: &PhysicsWorld, body: &mut RigidBody, seconds: f32) {
        let steps = (seconds / SIM_DT).ceil() as usize;
        for _ in 0..steps {
            world.step(body, SIM_DT);
            world.settle(body);
        }
    }

    #[test]
    fn test_body_lands_on_floor_and_freezes() {
        let world = PhysicsWorld::new(800.0, 600.0);
        let mut body = drop_body(&world);
        run(&world, &mut body, 4.0);

        assert!(body.frozen);
        assert!(
            (body.pos.y - (world.floor_y - body.half.y)).abs() < 1.0,
            "body should rest on the floor, got y={}",
            body.pos.y
        );
    }

    #[test]
    fn test_frozen_body_never_moves_again() {
        let world = PhysicsWorld::new(800.0, 600.0);
        let mut body = drop_body(&world);
        run(&world, &mut body, 4.0);
        assert!(body.frozen);

        let snapshot = body;
        run(&world, &mut body, 1.0);
        assert_eq!(body, snapshot);
    }

    #[test]
    fn test_age_pins_a_perpetual_bouncer() {
        let world = PhysicsWorld::new(800.0, 600.0);
        let mut body = drop_body(&world);
        // Lossless bounces would never slow down on their own
        body.restitution = 1.0;
        body.friction = 0.0;
        run(&world, &mut body, FRAGMENT_MAX_AGE + 0.5);
        assert!(body.frozen);
    }

    #[test]
    fn test_walls_keep_body_inside() {
        let world = PhysicsWorld::new(400.0, 600.0);
        let mut body = drop_body(&world);
        body.vel = Vec2::new(-4000.0, 0.0);
        run(&world, &mut body, 1.0);
        assert!(body.pos.x >= body.half.x);
        assert!(body.pos.x <= world.width - body.half.x);
    }

    #[test]
    fn test_restitution_reverses_downward_velocity() {
        let world = PhysicsWorld::new(800.0, 600.0);
        let mut body = drop_body(&world);
        body.pos.y = world.floor_y - body.half.y - 1.0;
        body.vel = Vec2::new(0.0, 500.0);
        world.step(&mut body, SIM_DT);
        assert!(body.vel.y < 0.0, "expected an upward bounce, got {}", body.vel.y);
    }
}
