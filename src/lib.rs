//! Prime Danger - a find-the-prime arcade game
//!
//! Core modules:
//! - `sim`: Deterministic game core (state machine, fall/crumble sequencer, rubble physics)
//! - `text`: Glyph-atlas font mapping and text layout
//! - `settings`: Player preferences persisted in LocalStorage
//! - `render`: Canvas2D frontend (wasm only)

pub mod settings;
pub mod sim;
pub mod text;

#[cfg(target_arch = "wasm32")]
pub mod render;

pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matching the display tick)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;

    /// Glyph atlas geometry (monospace tile sheet)
    pub const TILE_SIZE: f32 = 16.0;
    pub const TILES_HORIZONTAL: u16 = 49;
    pub const TILES_VERTICAL: u16 = 22;

    /// Rune slab textures are square, one sprite per image
    pub const RUNE_TEX_SIZE: f32 = 64.0;

    /// Rounds per session
    pub const DEFAULT_MAX_ROUNDS: u32 = 7;
    /// Points per correctly picked prime
    pub const PRIME_REWARD: u32 = 10;
    /// Candidate numbers are drawn from [1, NUMBER_CEILING]
    pub const NUMBER_CEILING: u32 = 200;
    /// Runes shown per round
    pub const RUNE_COUNT: usize = 4;

    /// Rune fall animation length (seconds)
    pub const FALL_DURATION: f32 = 1.0;
    /// Delay between crumble kickoff and the next round (seconds)
    pub const NEXT_ROUND_DELAY: f32 = 1.5;
    /// Ground line sits this many pixels above the bottom edge
    pub const GROUND_MARGIN: f32 = 150.0;

    /// Screen shake on a wrong pick
    pub const SHAKE_DURATION: f32 = 0.4;
    pub const SHAKE_INTENSITY: f32 = 15.0;

    /// Rubble world gravity (px/s^2, downward)
    pub const GRAVITY: f32 = 1200.0;
    /// Fragments are pinned after this many seconds regardless of motion
    pub const FRAGMENT_MAX_AGE: f32 = 3.0;
    /// Linear speed under which a fragment counts as at rest (px/s)
    pub const FRAGMENT_LINEAR_REST: f32 = 6.0;
    /// Angular speed under which a fragment counts as at rest (rad/s)
    pub const FRAGMENT_ANGULAR_REST: f32 = 0.6;

    /// Base density of a rune piece (scaled down by compaction)
    pub const PIECE_DENSITY: f32 = 0.008;
    /// Density of a glyph mini-piece
    pub const GLYPH_PIECE_DENSITY: f32 = 0.001;
    /// Downward speed cap for falling debris (px/s, at base density)
    pub const TERMINAL_VELOCITY: f32 = 900.0;

    /// Chance to skip a rune piece during crumbling (irregular silhouette)
    pub const PIECE_SKIP_CHANCE: f64 = 0.3;
    /// Chance to skip a glyph mini-piece
    pub const GLYPH_SKIP_CHANCE: f64 = 0.2;

    /// Default cap on live fragments; oldest are recycled past this
    pub const DEFAULT_MAX_FRAGMENTS: usize = 768;

    /// Word-wrap budgets for the game-over prime lists
    pub const WRAP_CHARS_PORTRAIT: usize = 20;
    pub const WRAP_CHARS_LANDSCAPE: usize = 40;
}

/// Quadratic ease-in: slow start, accelerating finish
#[inline]
pub fn ease_in_quad(progress: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    p * p
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_in_quad_endpoints() {
        assert_eq!(ease_in_quad(0.0), 0.0);
        assert_eq!(ease_in_quad(1.0), 1.0);
        // Out-of-range inputs clamp instead of overshooting
        assert_eq!(ease_in_quad(1.7), 1.0);
        assert_eq!(ease_in_quad(-0.3), 0.0);
    }

    #[test]
    fn test_ease_in_quad_slow_start() {
        assert!(ease_in_quad(0.5) < 0.5);
        assert!(ease_in_quad(0.9) > ease_in_quad(0.5));
    }
}
