//! Game state and core simulation types
//!
//! Everything the frontend draws lives here as plain data: rune slabs,
//! positioned glyph sprites, rubble fragments, and the shake offset. The
//! tick module mutates it; the renderer only reads it.

use std::collections::{BTreeSet, VecDeque};

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::numbers::NumberSet;
use super::physics::PhysicsWorld;
use super::rubble::Fragment;
use crate::consts::*;
use crate::text::{self, GlyphSprite};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, waiting for the confirm input
    Title,
    /// Rounds in progress
    Playing,
    /// Reserved for a between-rounds summary screen; never entered
    RoundEnd,
    /// Session finished, showing results
    GameOver,
}

/// Session accumulators for one player
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub score: u32,
    /// Primes correctly picked this session
    pub found_primes: BTreeSet<u32>,
    /// Primes the player failed to pick
    pub missed_primes: BTreeSet<u32>,
}

impl Player {
    /// Award the fixed per-prime reward
    pub fn reward(&mut self) {
        self.score += PRIME_REWARD;
    }
}

/// Which slab texture a rune shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuneFace {
    /// Black slab, no verdict yet
    Neutral,
    /// Blue slab marking the true prime
    Correct,
    /// Grey slab marking a wrong pick
    Incorrect,
}

/// One of the four candidate tokens on screen. Position is the slab center.
#[derive(Debug, Clone)]
pub struct Rune {
    pub slot: usize,
    pub number: u32,
    pub pos: Vec2,
    pub scale: f32,
    pub face: RuneFace,
    /// Digit overlay riding on the slab
    pub glyphs: Vec<GlyphSprite>,
    /// Cleared on the first pick so later taps fall through
    pub interactive: bool,
}

impl Rune {
    fn new(slot: usize, number: u32, pos: Vec2, scale: f32) -> Self {
        let mut rune = Self {
            slot,
            number,
            pos,
            scale,
            face: RuneFace::Neutral,
            glyphs: Vec::new(),
            interactive: true,
        };
        rune.place_glyphs();
        rune
    }

    /// Half of the rendered slab edge
    pub fn half_extent(&self) -> f32 {
        RUNE_TEX_SIZE * self.scale / 2.0
    }

    /// Point-in-slab test for pointer picks
    pub fn contains(&self, point: Vec2) -> bool {
        let h = self.half_extent();
        (point.x - self.pos.x).abs() <= h && (point.y - self.pos.y).abs() <= h
    }

    /// Re-lay the digit glyphs centered on the slab, preserving their tint.
    /// Called after any slab movement so the digits ride along.
    pub fn place_glyphs(&mut self) {
        let tint = self.glyphs.first().map_or(0xffffff, |g| g.tint);
        let label = self.number.to_string();
        let start = Vec2::new(
            self.pos.x - text::text_width(&label, self.scale) / 2.0,
            self.pos.y - 12.0,
        );
        self.glyphs = text::layout_text(&label, start, self.scale, tint);
    }

    /// Retint the digit overlay in place
    pub fn tint_glyphs(&mut self, tint: u32) {
        for glyph in &mut self.glyphs {
            glyph.tint = tint;
        }
    }
}

/// A rune resting on the ground line, awaiting the next round's shatter.
#[derive(Debug, Clone)]
pub struct FallenRune {
    pub rune: Rune,
}

/// Where the current round is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundFlow {
    /// Waiting for the player's pick
    AwaitingPick,
    /// Runes interpolating down to the ground line
    Falling {
        elapsed: f32,
        start_ys: [f32; RUNE_COUNT],
    },
    /// Crumble kicked off; counting down to the next round
    Settling { elapsed: f32 },
}

/// Transient camera perturbation after a wrong pick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shake {
    pub elapsed: f32,
}

/// Knobs the frontend derives from player settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimOptions {
    pub screen_shake: bool,
    pub max_fragments: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            screen_shake: true,
            max_fragments: DEFAULT_MAX_FRAGMENTS,
        }
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: GamePhase,
    pub player: Player,
    /// 1-based once the first round starts; 0 before then
    pub round: u32,
    pub max_rounds: u32,
    /// Candidates for the round in progress
    pub numbers: Option<NumberSet>,
    pub runes: Vec<Rune>,
    pub flow: RoundFlow,
    /// The previous generation of runes, resting on the ground line
    pub fallen: Vec<FallenRune>,
    /// Debris from shattered runes, oldest first
    pub fragments: Vec<Fragment>,
    pub world: PhysicsWorld,
    pub shake: Option<Shake>,
    /// Applied by the renderer to the rune/ground display branch
    pub shake_offset: Vec2,
    pub title_glyphs: Vec<GlyphSprite>,
    pub ui_glyphs: Vec<GlyphSprite>,
    pub over_glyphs: Vec<GlyphSprite>,
    /// Factor breakdown shown under a wrong pick, for the rest of the round
    pub factor_glyphs: Vec<GlyphSprite>,
    pub viewport: Vec2,
    pub seed: u64,
    pub options: SimOptions,
    pub(crate) rng: Pcg32,
    /// Queued deterministic rounds, consumed before the RNG is asked
    scripted: VecDeque<NumberSet>,
}

impl GameState {
    pub fn new(seed: u64, width: f32, height: f32) -> Self {
        Self::with_options(seed, width, height, SimOptions::default())
    }

    pub fn with_options(seed: u64, width: f32, height: f32, options: SimOptions) -> Self {
        let mut state = Self {
            phase: GamePhase::Title,
            player: Player::default(),
            round: 0,
            max_rounds: DEFAULT_MAX_ROUNDS,
            numbers: None,
            runes: Vec::new(),
            flow: RoundFlow::AwaitingPick,
            fallen: Vec::new(),
            fragments: Vec::new(),
            world: PhysicsWorld::new(width, height),
            shake: None,
            shake_offset: Vec2::ZERO,
            title_glyphs: Vec::new(),
            ui_glyphs: Vec::new(),
            over_glyphs: Vec::new(),
            factor_glyphs: Vec::new(),
            viewport: Vec2::new(width, height),
            seed,
            options,
            rng: Pcg32::seed_from_u64(seed),
            scripted: VecDeque::new(),
        };
        state.show_title();
        state
    }

    pub fn is_portrait(&self) -> bool {
        self.viewport.y > self.viewport.x
    }

    /// Screen-space y the runes fall to
    pub fn ground_y(&self) -> f32 {
        self.viewport.y - GROUND_MARGIN
    }

    /// Queue deterministic NumberSets for upcoming rounds (tests, demos).
    pub fn script_rounds(&mut self, sets: impl IntoIterator<Item = NumberSet>) {
        self.scripted.extend(sets);
    }

    /// Reflow the visible screen for a new viewport without touching game
    /// progress. Mid-animation resizes re-seat runes at their static layout
    /// positions; the fall re-interpolates from there next tick.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
        self.world = PhysicsWorld::new(width, height);
        match self.phase {
            GamePhase::Title => self.show_title(),
            GamePhase::Playing => {
                self.layout_runes();
                self.refresh_ui();
            }
            GamePhase::GameOver => self.show_game_over(),
            GamePhase::RoundEnd => {}
        }
    }

    /// Topmost interactive rune containing `point`, for pointer picks
    pub fn rune_at(&self, point: Vec2) -> Option<usize> {
        self.runes
            .iter()
            .find(|r| r.interactive && r.contains(point))
            .map(|r| r.slot)
    }

    /// Append a fragment, recycling the oldest once the cap is hit.
    pub(crate) fn push_fragment(&mut self, fragment: Fragment) {
        if self.fragments.len() >= self.options.max_fragments {
            self.fragments.remove(0);
        }
        self.fragments.push(fragment);
    }

    pub(crate) fn next_number_set(&mut self) -> NumberSet {
        self.scripted
            .pop_front()
            .unwrap_or_else(|| NumberSet::generate(&mut self.rng))
    }

    // --- screen builders ---

    pub(crate) fn show_title(&mut self) {
        self.title_glyphs.clear();
        let center = self.viewport / 2.0;
        let scale = if self.is_portrait() { 1.5 } else { 3.0 };

        let mut centered = |text: &str, y: f32, scale: f32, tint: u32| {
            let x = center.x - text::text_width(text, scale) / 2.0;
            text::layout_text(text, Vec2::new(x, y), scale, tint)
        };

        self.title_glyphs
            .extend(centered("PRIME DANGER", center.y - 100.0, scale, 0x00ff00));
        self.title_glyphs
            .extend(centered("PRESS ENTER", center.y + 50.0, 1.0, 0xffff00));
        self.title_glyphs
            .extend(centered("TO START", center.y + 90.0, 1.0, 0xffff00));
        self.title_glyphs
            .extend(centered("FIND THE PRIMES", center.y + 140.0, 1.0, 0xffffff));
    }

    pub(crate) fn refresh_ui(&mut self) {
        self.ui_glyphs.clear();
        let scale = if self.is_portrait() { 1.5 } else { 2.0 };

        self.ui_glyphs.extend(text::layout_text(
            &format!("ROUND {}/{}", self.round, self.max_rounds),
            Vec2::new(10.0, 10.0),
            scale,
            0xffffff,
        ));
        self.ui_glyphs.extend(text::layout_text(
            &format!("SCORE {}", self.player.score),
            Vec2::new(10.0, 40.0),
            scale,
            0x00ff00,
        ));

        let (hint, hint_y) = if self.is_portrait() {
            ("TAP TO SELECT", self.viewport.y - 30.0)
        } else {
            ("PRESS 1 2 3 4 OR TAP", self.viewport.y - 40.0)
        };
        self.ui_glyphs.extend(text::layout_text(
            hint,
            Vec2::new(10.0, hint_y),
            1.5,
            0xffff00,
        ));
    }

    /// Build (or rebuild, after a resize) the four rune slabs for the
    /// current NumberSet. Portrait gets a 2x2 grid, landscape a row of 4.
    pub(crate) fn layout_runes(&mut self) {
        let Some(numbers) = self.numbers else {
            return;
        };
        let old: Vec<Rune> = std::mem::take(&mut self.runes);
        let w = self.viewport.x;
        let h = self.viewport.y;

        for slot in 0..RUNE_COUNT {
            let (pos, scale) = if self.is_portrait() {
                let spacing = Vec2::new(w / 2.5, 200.0);
                let start = Vec2::new(w / 2.0 - spacing.x / 2.0, h / 2.0 - spacing.y / 2.0);
                let col = (slot % 2) as f32;
                let row = (slot / 2) as f32;
                (start + Vec2::new(col * spacing.x, row * spacing.y), 2.0)
            } else {
                let spacing = 200.0_f32.min(w / 5.0);
                let start_x = (w - spacing * 3.0) / 2.0;
                (
                    Vec2::new(start_x + slot as f32 * spacing, h / 2.0 - 50.0),
                    2.5,
                )
            };

            let mut rune = Rune::new(slot, numbers.value(slot), pos, scale);
            // A resize mid-round keeps the existing verdict and pick lock
            if let Some(prev) = old.get(slot) {
                rune.face = prev.face;
                rune.interactive = prev.interactive;
                rune.tint_glyphs(prev.glyphs.first().map_or(0xffffff, |g| g.tint));
            }
            self.runes.push(rune);
        }
    }

    pub(crate) fn show_game_over(&mut self) {
        self.phase = GamePhase::GameOver;
        self.runes.clear();
        self.ui_glyphs.clear();
        self.factor_glyphs.clear();
        self.over_glyphs.clear();

        let center_x = self.viewport.x / 2.0;
        let portrait = self.is_portrait();
        let title_scale = if portrait { 3.0 } else { 5.0 };
        let wrap_chars = if portrait {
            WRAP_CHARS_PORTRAIT
        } else {
            WRAP_CHARS_LANDSCAPE
        };
        let mut y = 50.0;

        let mut centered = |glyphs: &mut Vec<GlyphSprite>, text: &str, y: f32, scale: f32, tint: u32| {
            let x = center_x - text::text_width(text, scale) / 2.0;
            glyphs.extend(text::layout_text(text, Vec2::new(x, y), scale, tint));
        };

        centered(&mut self.over_glyphs, "GAME OVER", y, title_scale, 0xff0000);
        y += title_scale * 30.0;

        centered(
            &mut self.over_glyphs,
            &format!("SCORE {}", self.player.score),
            y,
            2.0,
            0x00ff00,
        );
        y += 60.0;

        let lists = [
            ("FOUND", &self.player.found_primes, 0x00ff00, 0xffffff),
            ("MISSED", &self.player.missed_primes, 0xff0000, 0xffaa00),
        ];
        let mut sections = Vec::new();
        for (heading, primes, heading_tint, line_tint) in lists {
            if primes.is_empty() {
                continue;
            }
            let joined = primes
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            sections.push((heading, heading_tint, line_tint, text::wrap_by_chars(&joined, wrap_chars)));
        }
        for (heading, heading_tint, line_tint, lines) in sections {
            centered(&mut self.over_glyphs, heading, y, 1.5, heading_tint);
            y += 35.0;
            for line in lines {
                centered(&mut self.over_glyphs, &line, y, 1.5, line_tint);
                y += 28.0;
            }
            y += 15.0;
        }

        centered(
            &mut self.over_glyphs,
            "PRESS ENTER",
            self.viewport.y - 60.0,
            1.5,
            0xffff00,
        );
        centered(
            &mut self.over_glyphs,
            "TO PLAY AGAIN",
            self.viewport.y - 30.0,
            1.5,
            0xffff00,
        );
    }

    // --- lifecycle ---

    /// Title -> Playing: reset session accumulators and ground debris, then
    /// advance into round 1.
    pub(crate) fn start_game(&mut self) {
        self.phase = GamePhase::Playing;
        self.round = 0;
        self.player = Player::default();
        self.title_glyphs.clear();
        self.fragments.clear();
        self.fallen.clear();
        self.shake = None;
        self.shake_offset = Vec2::ZERO;
        self.advance_round();
    }

    /// GameOver -> Title: clear everything visible and show the title again.
    pub(crate) fn reset_to_title(&mut self) {
        self.phase = GamePhase::Title;
        self.runes.clear();
        self.numbers = None;
        self.ui_glyphs.clear();
        self.over_glyphs.clear();
        self.factor_glyphs.clear();
        self.fragments.clear();
        self.fallen.clear();
        self.flow = RoundFlow::AwaitingPick;
        self.show_title();
    }

    /// Begin the next round, or finish the session after the last one.
    pub(crate) fn advance_round(&mut self) {
        if self.round >= self.max_rounds {
            self.show_game_over();
            return;
        }
        self.round += 1;
        self.factor_glyphs.clear();
        let set = self.next_number_set();
        self.numbers = Some(set);
        self.runes.clear();
        self.layout_runes();
        self.refresh_ui();
        self.flow = RoundFlow::AwaitingPick;
    }
}
