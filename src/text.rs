//! Glyph-atlas text rendering
//!
//! The UI font is a monospace glyph sheet: a single packed tile atlas where
//! every character occupies one 16x16 tile. `tile_index` maps a character to
//! its tile; `layout_text` turns a string into positioned glyph sprites the
//! frontend can draw (and the sim can later retint, move, or shatter).
//! Characters with no tile are skipped but still occupy a column, so spaces
//! come for free.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{TILE_SIZE, TILES_HORIZONTAL};

/// A single positioned glyph, addressed by atlas tile index.
///
/// Position is the glyph's top-left corner in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlyphSprite {
    pub tile: u16,
    pub pos: Vec2,
    pub scale: f32,
    pub tint: u32,
}

impl GlyphSprite {
    /// Rendered square edge length in pixels
    pub fn size(&self) -> f32 {
        TILE_SIZE * self.scale
    }

    /// Atlas source rectangle as (x, y, w, h) in texture pixels
    pub fn frame(&self) -> (f32, f32, f32, f32) {
        let col = self.tile % TILES_HORIZONTAL;
        let row = self.tile / TILES_HORIZONTAL;
        (
            f32::from(col) * TILE_SIZE,
            f32::from(row) * TILE_SIZE,
            TILE_SIZE,
            TILE_SIZE,
        )
    }
}

/// Look up the atlas tile for a character, case-insensitively.
///
/// Returns `None` for characters the sheet has no glyph for; callers skip
/// those rather than failing (graceful degradation).
pub fn tile_index(c: char) -> Option<u16> {
    let c = c.to_ascii_uppercase();
    match c {
        '0'..='9' => Some(868 + (c as u16 - '0' as u16)),
        // Letters span two atlas rows, A-N then O-Z
        'A'..='N' => Some(917 + (c as u16 - 'A' as u16)),
        'O'..='Z' => Some(966 + (c as u16 - 'O' as u16)),
        '/' => Some(593),
        '$' => Some(667),
        _ => None,
    }
}

/// Lay a string out left-to-right starting at `start` (top-left corner).
///
/// Every character advances the pen by one tile width regardless of whether
/// it mapped to a glyph, keeping the column grid of the monospace sheet.
pub fn layout_text(text: &str, start: Vec2, scale: f32, tint: u32) -> Vec<GlyphSprite> {
    let spacing = TILE_SIZE * scale;
    text.chars()
        .enumerate()
        .filter_map(|(i, c)| {
            let tile = tile_index(c)?;
            Some(GlyphSprite {
                tile,
                pos: Vec2::new(start.x + i as f32 * spacing, start.y),
                scale,
                tint,
            })
        })
        .collect()
}

/// Width of a rendered string in pixels (monospace, so purely length-based)
pub fn text_width(text: &str, scale: f32) -> f32 {
    text.chars().count() as f32 * TILE_SIZE * scale
}

/// Greedy word wrap against a character budget.
///
/// A word that would push the running line past `max_chars` starts a new
/// line; a single word longer than the budget gets a line of its own.
pub fn wrap_by_chars(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() > max_chars && !current.is_empty() {
            lines.push(current.trim_end().to_string());
            current.clear();
        }
        current.push_str(word);
        current.push(' ');
    }
    if !current.is_empty() {
        lines.push(current.trim_end().to_string());
    }
    lines
}
