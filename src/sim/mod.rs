//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod numbers;
pub mod physics;
pub mod rubble;
pub mod state;
pub mod tick;

pub use numbers::{NumberSet, factors, is_prime};
pub use physics::{PhysicsWorld, RigidBody};
pub use rubble::{Fragment, FragmentVisual};
pub use state::{
    FallenRune, GamePhase, GameState, Player, RoundFlow, Rune, RuneFace, Shake, SimOptions,
};
pub use tick::{TickInput, tick};
