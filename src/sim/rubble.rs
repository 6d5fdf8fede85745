//! Crumble: shattering fallen runes into physics-driven debris
//!
//! When a new generation of runes lands, the previous generation is walked
//! tile-by-tile and broken into fragments. "Compaction" measures how deep a
//! rune sat in the accumulated stack: more compacted runes break into
//! smaller, lighter pieces and launch more violently.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::physics::RigidBody;
use super::state::{GameState, Rune, RuneFace};
use crate::consts::{
    GLYPH_PIECE_DENSITY, GLYPH_SKIP_CHANCE, PIECE_DENSITY, PIECE_SKIP_CHANCE, RUNE_TEX_SIZE,
};
use crate::text::GlyphSprite;

/// Horizontal launch spread for rune pieces (px/s)
const PIECE_LAUNCH_BASE: f32 = 480.0;
/// Extra launch spread per compaction level
const PIECE_LAUNCH_PER_COMPACTION: f32 = 180.0;
/// Guaranteed upward kick for rune pieces (px/s)
const PIECE_UP_KICK: f32 = 300.0;
/// Full angular velocity range for rune pieces (rad/s)
const PIECE_ANGULAR_SPREAD: f32 = 24.0;

/// Horizontal launch spread for glyph mini-pieces (px/s)
const GLYPH_LAUNCH_BASE: f32 = 360.0;
const GLYPH_LAUNCH_PER_COMPACTION: f32 = 120.0;
/// Guaranteed upward kick for glyph mini-pieces (px/s)
const GLYPH_UP_KICK: f32 = 240.0;

/// What a fragment looks like on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FragmentVisual {
    /// Sub-rectangle of a rune slab texture; `frame` is (x, y, w, h) in
    /// texture pixels, `scale` the slab's render scale
    RunePiece {
        face: RuneFace,
        frame: (f32, f32, f32, f32),
        scale: f32,
    },
    /// A shrunken square cut of a digit glyph
    Glyph { tile: u16, tint: u32, size: f32 },
}

/// An ephemeral debris piece: a visual paired with its rigid body.
/// Fragments are never reused; once pinned they are inert scenery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub body: RigidBody,
    pub visual: FragmentVisual,
}

/// Piece edge lengths (texture px) to draw from; shifts smaller the longer
/// a rune has been compacted under the stack.
fn piece_size_pool(compaction: u32) -> [f32; 4] {
    match compaction {
        0 | 1 => [4.0, 4.0, 6.0, 6.0],
        2 => [2.0, 4.0, 4.0, 6.0],
        _ => [1.0, 1.0, 2.0, 4.0],
    }
}

/// Shatter every rune of the previous generation, oldest (deepest, most
/// compacted) first, and hand the fragments to the state. The fallen list
/// is left empty for the new generation.
pub(crate) fn shatter_fallen(state: &mut GameState) {
    let fallen = std::mem::take(&mut state.fallen);
    let count = fallen.len();
    for (index, fallen_rune) in fallen.into_iter().enumerate() {
        let compaction = (count - index - 1) as u32;
        let rune = fallen_rune.rune;
        let mut fragments = shatter_rune(&mut state.rng, &rune, compaction);
        fragments.extend(shatter_glyphs(&mut state.rng, &rune.glyphs, compaction));
        log::debug!(
            "shattered rune {} (compaction {compaction}) into {} fragments",
            rune.number,
            fragments.len()
        );
        for fragment in fragments {
            state.push_fragment(fragment);
        }
    }
}

/// Walk the slab texture in a ragged grid of randomly sized pieces, skipping
/// ~30% for an irregular silhouette, and launch each surviving piece upward
/// and outward. Compaction makes pieces smaller, lighter, and faster.
pub(crate) fn shatter_rune(rng: &mut Pcg32, rune: &Rune, compaction: u32) -> Vec<Fragment> {
    let base = RUNE_TEX_SIZE;
    let pool = piece_size_pool(compaction);
    let launch = PIECE_LAUNCH_BASE + PIECE_LAUNCH_PER_COMPACTION * compaction as f32;
    let density = PIECE_DENSITY / (compaction + 1) as f32;
    let top_left = rune.pos - Vec2::splat(base * rune.scale / 2.0);

    let mut out = Vec::new();
    let mut current_y = 0.0;
    while current_y < base {
        let mut current_x = 0.0;
        while current_x < base {
            let size = pool[rng.random_range(0..pool.len())];
            let w = size.min(base - current_x);
            let h = size.min(base - current_y);

            if rng.random_bool(PIECE_SKIP_CHANCE) {
                current_x += w;
                continue;
            }

            let half = Vec2::new(w, h) * rune.scale / 2.0;
            let center = top_left + Vec2::new(current_x, current_y) * rune.scale + half;

            let mut body = RigidBody::new(center, half, 0.3, 0.4, density);
            body.vel = Vec2::new(
                (rng.random::<f32>() - 0.5) * launch,
                -(PIECE_UP_KICK + rng.random::<f32>() * launch),
            );
            body.angular_vel = (rng.random::<f32>() - 0.5) * PIECE_ANGULAR_SPREAD;

            out.push(Fragment {
                body,
                visual: FragmentVisual::RunePiece {
                    face: rune.face,
                    frame: (current_x, current_y, w, h),
                    scale: rune.scale,
                },
            });
            current_x += w;
        }
        current_y += pool[rng.random_range(0..pool.len())].min(base - current_y);
    }
    out
}

/// Subdivide each digit glyph into a small grid of mini-pieces with their
/// own impulses. The source glyph sprites die with their FallenRune.
pub(crate) fn shatter_glyphs(
    rng: &mut Pcg32,
    glyphs: &[GlyphSprite],
    compaction: u32,
) -> Vec<Fragment> {
    let per_axis = if compaction > 1 { 4 } else { 2 };
    let spread = GLYPH_LAUNCH_BASE + GLYPH_LAUNCH_PER_COMPACTION * compaction as f32;

    let mut out = Vec::new();
    for sprite in glyphs {
        let piece = sprite.size() / per_axis as f32;
        for i in 0..per_axis {
            for j in 0..per_axis {
                if rng.random_bool(GLYPH_SKIP_CHANCE) {
                    continue;
                }
                let center = sprite.pos
                    + Vec2::new(i as f32, j as f32) * piece
                    + Vec2::splat(piece / 2.0);

                let mut body =
                    RigidBody::new(center, Vec2::splat(piece / 2.0), 0.5, 0.1, GLYPH_PIECE_DENSITY);
                body.vel = Vec2::new(
                    (rng.random::<f32>() - 0.5) * spread,
                    -(GLYPH_UP_KICK + rng.random::<f32>() * spread * 0.6),
                );

                out.push(Fragment {
                    body,
                    visual: FragmentVisual::Glyph {
                        tile: sprite.tile,
                        tint: sprite.tint,
                        size: piece,
                    },
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::layout_text;
    use rand::SeedableRng;

    fn sample_rune() -> Rune {
        let mut state = GameState::new(3, 1280.0, 720.0);
        state.start_game();
        state.runes[0].clone()
    }

    #[test]
    fn test_rune_pieces_start_inside_slab() {
        let rune = sample_rune();
        let mut rng = Pcg32::seed_from_u64(42);
        let fragments = shatter_rune(&mut rng, &rune, 0);
        assert!(!fragments.is_empty());

        let half = rune.half_extent();
        for f in &fragments {
            assert!((f.body.pos.x - rune.pos.x).abs() <= half + 0.01);
            assert!((f.body.pos.y - rune.pos.y).abs() <= half + 0.01);
            let FragmentVisual::RunePiece { frame, .. } = f.visual else {
                panic!("rune shatter emitted a glyph piece");
            };
            let (x, y, w, h) = frame;
            assert!(x + w <= RUNE_TEX_SIZE);
            assert!(y + h <= RUNE_TEX_SIZE);
        }
    }

    #[test]
    fn test_pieces_launch_upward() {
        let rune = sample_rune();
        let mut rng = Pcg32::seed_from_u64(9);
        for f in shatter_rune(&mut rng, &rune, 1) {
            assert!(f.body.vel.y < 0.0, "piece must launch upward, got {}", f.body.vel.y);
        }
    }

    #[test]
    fn test_compaction_makes_pieces_lighter_and_faster() {
        let rune = sample_rune();
        let mut rng = Pcg32::seed_from_u64(17);
        let calm = shatter_rune(&mut rng, &rune, 0);
        let violent = shatter_rune(&mut rng, &rune, 3);

        for f in &violent {
            assert_eq!(f.body.density, PIECE_DENSITY / 4.0);
        }
        for f in &calm {
            assert_eq!(f.body.density, PIECE_DENSITY);
        }

        let mean_up = |fs: &[Fragment]| {
            fs.iter().map(|f| -f.body.vel.y).sum::<f32>() / fs.len() as f32
        };
        assert!(mean_up(&violent) > mean_up(&calm));

        // And the compacted break-up is finer
        assert!(violent.len() > calm.len());
    }

    #[test]
    fn test_glyph_shatter_grid() {
        let glyphs = layout_text("42", glam::Vec2::new(100.0, 100.0), 2.0, 0xff0000);
        let mut rng = Pcg32::seed_from_u64(5);

        let coarse = shatter_glyphs(&mut rng, &glyphs, 0);
        assert!(coarse.len() <= glyphs.len() * 4);
        let fine = shatter_glyphs(&mut rng, &glyphs, 2);
        assert!(fine.len() <= glyphs.len() * 16);
        assert!(fine.len() > coarse.len());

        for f in coarse.iter().chain(&fine) {
            let FragmentVisual::Glyph { tint, .. } = f.visual else {
                panic!("glyph shatter emitted a rune piece");
            };
            assert_eq!(tint, 0xff0000);
            assert!(f.body.vel.y < 0.0);
        }
    }
}
