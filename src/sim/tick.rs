//! Fixed timestep simulation tick
//!
//! Core loop that advances the game deterministically. Three animation
//! activities can be in flight at once - screen shake, the rune fall, and
//! rubble integration - all driven cooperatively from here, each step
//! reading elapsed time and reporting completion by state, never by
//! callback.

use glam::Vec2;
use rand::Rng;

use super::numbers;
use super::rubble;
use super::state::{FallenRune, GamePhase, GameState, RoundFlow, RuneFace, Shake};
use crate::consts::*;
use crate::text;
use crate::{ease_in_quad, lerp};

/// Input for a single tick. One-shot; the frontend clears these after each
/// processed step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Confirm (Enter/Space or a tap): starts from Title, restarts from
    /// GameOver. Ignored while playing.
    pub confirm: bool,
    /// Pick rune slot 0..3 (keys 1-4 or tapping a rune). Ignored outside
    /// Playing and after the round's first honored pick.
    pub pick: Option<usize>,
}

impl TickInput {
    pub fn confirm() -> Self {
        Self {
            confirm: true,
            ..Default::default()
        }
    }

    pub fn pick(slot: usize) -> Self {
        Self {
            pick: Some(slot),
            ..Default::default()
        }
    }
}

/// Advance the game state by one timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    match state.phase {
        GamePhase::Title => {
            if input.confirm {
                state.start_game();
            }
        }
        GamePhase::GameOver => {
            if input.confirm {
                state.reset_to_title();
            }
        }
        GamePhase::Playing => {
            if let (RoundFlow::AwaitingPick, Some(slot)) = (state.flow, input.pick) {
                if slot < RUNE_COUNT {
                    resolve_pick(state, slot);
                }
            }
            advance_round_flow(state, dt);
        }
        GamePhase::RoundEnd => {}
    }

    update_shake(state, dt);
    step_rubble(state, dt);
}

/// Honor the round's one pick: record the verdict, retint the runes, show
/// the factor breakdown on a miss, revoke interactivity, start the fall.
fn resolve_pick(state: &mut GameState, slot: usize) {
    let Some(numbers) = state.numbers else {
        return;
    };
    let prime_slot = numbers.prime_index();

    if slot == prime_slot {
        state.player.reward();
        state.player.found_primes.insert(numbers.prime_value());
        state.runes[prime_slot].face = RuneFace::Correct;
        state.runes[prime_slot].tint_glyphs(0x00ff00);
    } else {
        state.player.missed_primes.insert(numbers.prime_value());
        // Reveal the prime the player should have taken
        state.runes[prime_slot].face = RuneFace::Correct;
        state.runes[prime_slot].tint_glyphs(0x0000ff);
        state.runes[slot].face = RuneFace::Incorrect;
        state.runes[slot].tint_glyphs(0xff0000);

        let factors = numbers::factors(numbers.value(slot));
        if !factors.is_empty() {
            let breakdown = factors
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(" X ");
            let scale = if state.is_portrait() { 1.0 } else { 2.0 };
            let anchor = state.runes[slot].pos;
            let start = Vec2::new(
                anchor.x - text::text_width(&breakdown, scale) / 2.5,
                anchor.y + 50.0,
            );
            state.factor_glyphs = text::layout_text(&breakdown, start, scale, 0x00aaff);
        }

        if state.options.screen_shake {
            state.shake = Some(Shake { elapsed: 0.0 });
        }
    }

    // No second pick until the next round lays out fresh runes
    for rune in &mut state.runes {
        rune.interactive = false;
    }

    let mut start_ys = [0.0; RUNE_COUNT];
    for (i, rune) in state.runes.iter().enumerate() {
        start_ys[i] = rune.pos.y;
    }
    state.flow = RoundFlow::Falling {
        elapsed: 0.0,
        start_ys,
    };
}

/// Drive the fall/crumble sequence. Fall: ease-in interpolation of every
/// rune (digits riding along) down to the live ground line. On landing the
/// previous generation shatters and the landed runes take its place; the
/// next round starts a fixed delay later, independent of rubble settling.
fn advance_round_flow(state: &mut GameState, dt: f32) {
    match state.flow {
        RoundFlow::AwaitingPick => {}

        RoundFlow::Falling { elapsed, start_ys } => {
            let elapsed = elapsed + dt;
            let progress = (elapsed / FALL_DURATION).min(1.0);
            let eased = ease_in_quad(progress);
            let ground = state.ground_y();

            for (i, rune) in state.runes.iter_mut().enumerate() {
                rune.pos.y = lerp(start_ys[i], ground, eased);
                rune.place_glyphs();
            }

            if progress >= 1.0 {
                rubble::shatter_fallen(state);
                let landed = std::mem::take(&mut state.runes);
                state.fallen = landed
                    .into_iter()
                    .map(|rune| FallenRune { rune })
                    .collect();
                state.factor_glyphs.clear();
                state.flow = RoundFlow::Settling { elapsed: 0.0 };
            } else {
                state.flow = RoundFlow::Falling { elapsed, start_ys };
            }
        }

        RoundFlow::Settling { elapsed } => {
            let elapsed = elapsed + dt;
            if elapsed >= NEXT_ROUND_DELAY {
                state.advance_round();
            } else {
                state.flow = RoundFlow::Settling { elapsed };
            }
        }
    }
}

/// Random offset with linearly decaying magnitude; snaps exactly back to
/// zero when the duration elapses.
fn update_shake(state: &mut GameState, dt: f32) {
    let Some(Shake { elapsed }) = state.shake else {
        return;
    };
    let elapsed = elapsed + dt;
    let progress = elapsed / SHAKE_DURATION;

    if progress >= 1.0 {
        state.shake = None;
        state.shake_offset = Vec2::ZERO;
    } else {
        state.shake = Some(Shake { elapsed });
        let magnitude = SHAKE_INTENSITY * (1.0 - progress);
        state.shake_offset = Vec2::new(
            (state.rng.random::<f32>() - 0.5) * magnitude,
            (state.rng.random::<f32>() - 0.5) * magnitude,
        );
    }
}

/// Integrate every live fragment body and pin the ones that came to rest
fn step_rubble(state: &mut GameState, dt: f32) {
    let world = state.world;
    for fragment in &mut state.fragments {
        world.step(&mut fragment.body, dt);
        world.settle(&mut fragment.body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::NumberSet;

    fn new_state() -> GameState {
        GameState::new(12345, 1280.0, 720.0)
    }

    fn confirm() -> TickInput {
        TickInput::confirm()
    }

    fn pick(slot: usize) -> TickInput {
        TickInput::pick(slot)
    }

    fn run_for(state: &mut GameState, seconds: f32) {
        let steps = (seconds / SIM_DT).ceil() as usize;
        for _ in 0..steps {
            tick(state, &TickInput::default(), SIM_DT);
        }
    }

    /// Pick, then sit through the fall and the inter-round delay
    fn play_round(state: &mut GameState, slot: usize) {
        tick(state, &pick(slot), SIM_DT);
        run_for(state, FALL_DURATION + NEXT_ROUND_DELAY + 0.2);
    }

    fn scripted_rounds() -> [NumberSet; 3] {
        [
            NumberSet::scripted([2, 4, 6, 8], 0),
            NumberSet::scripted([9, 11, 15, 21], 1),
            NumberSet::scripted([3, 10, 20, 30], 0),
        ]
    }

    #[test]
    fn test_confirm_starts_game() {
        let mut state = new_state();
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.phase, GamePhase::Title);

        tick(&mut state, &confirm(), SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.round, 1);
        assert_eq!(state.runes.len(), RUNE_COUNT);
        assert!(state.runes.iter().all(|r| r.interactive));
        assert!(state.title_glyphs.is_empty());
        assert!(!state.ui_glyphs.is_empty());
    }

    #[test]
    fn test_picks_ignored_outside_playing() {
        let mut state = new_state();
        tick(&mut state, &pick(0), SIM_DT);
        assert_eq!(state.phase, GamePhase::Title);
        assert_eq!(state.player.score, 0);
        assert!(state.player.found_primes.is_empty());
        assert!(state.player.missed_primes.is_empty());
    }

    #[test]
    fn test_only_first_pick_per_round_is_honored() {
        let mut state = new_state();
        state.script_rounds(scripted_rounds());
        tick(&mut state, &confirm(), SIM_DT);

        tick(&mut state, &pick(0), SIM_DT); // correct: prime 2 at slot 0
        assert_eq!(state.player.score, PRIME_REWARD);

        // Hammering more picks during the fall changes nothing
        for slot in [0, 1, 2, 3] {
            tick(&mut state, &pick(slot), SIM_DT);
        }
        assert_eq!(state.player.score, PRIME_REWARD);
        assert_eq!(state.player.found_primes.len(), 1);
        assert!(state.runes.iter().all(|r| !r.interactive));
    }

    #[test]
    fn test_out_of_range_pick_is_ignored() {
        let mut state = new_state();
        tick(&mut state, &confirm(), SIM_DT);
        tick(&mut state, &pick(7), SIM_DT);
        assert_eq!(state.flow, RoundFlow::AwaitingPick);
        assert!(state.runes.iter().all(|r| r.interactive));
    }

    #[test]
    fn test_fall_lands_on_ground_line_then_next_round() {
        let mut state = new_state();
        tick(&mut state, &confirm(), SIM_DT);
        let first_numbers = state.numbers;

        tick(&mut state, &pick(0), SIM_DT);
        assert!(matches!(state.flow, RoundFlow::Falling { .. }));

        run_for(&mut state, FALL_DURATION + 0.1);
        // Landed: runes handed over to the fallen generation
        assert!(state.runes.is_empty());
        assert_eq!(state.fallen.len(), RUNE_COUNT);
        let ground = state.ground_y();
        for fallen in &state.fallen {
            assert!((fallen.rune.pos.y - ground).abs() < 0.01);
        }
        assert!(state.factor_glyphs.is_empty());

        run_for(&mut state, NEXT_ROUND_DELAY + 0.1);
        assert_eq!(state.round, 2);
        assert_ne!(state.numbers, first_numbers);
        assert_eq!(state.runes.len(), RUNE_COUNT);
        assert!(state.runes.iter().all(|r| r.interactive));
    }

    #[test]
    fn test_fall_progress_is_monotonic() {
        let mut state = new_state();
        tick(&mut state, &confirm(), SIM_DT);
        tick(&mut state, &pick(0), SIM_DT);

        let mut last_y = state.runes[0].pos.y;
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), SIM_DT);
            let y = state.runes[0].pos.y;
            assert!(y >= last_y, "rune must never move back up during the fall");
            last_y = y;
        }
    }

    #[test]
    fn test_previous_generation_shatters_when_next_lands() {
        let mut state = new_state();
        tick(&mut state, &confirm(), SIM_DT);

        play_round(&mut state, 0);
        assert_eq!(state.fallen.len(), RUNE_COUNT);
        assert!(state.fragments.is_empty(), "nothing to shatter under round 1");
        let first_generation: Vec<u32> =
            state.fallen.iter().map(|f| f.rune.number).collect();

        play_round(&mut state, 1);
        // Generation 1 shattered into rubble, generation 2 rests alone
        assert!(!state.fragments.is_empty());
        assert_eq!(state.fallen.len(), RUNE_COUNT);
        let second_generation: Vec<u32> =
            state.fallen.iter().map(|f| f.rune.number).collect();
        assert_ne!(first_generation, second_generation);
    }

    #[test]
    fn test_fragments_all_pin_eventually() {
        let mut state = new_state();
        tick(&mut state, &confirm(), SIM_DT);
        play_round(&mut state, 0);
        play_round(&mut state, 0);
        assert!(!state.fragments.is_empty());

        run_for(&mut state, FRAGMENT_MAX_AGE + 1.0);
        assert!(state.fragments.iter().all(|f| f.body.frozen));
    }

    #[test]
    fn test_wrong_pick_shakes_then_snaps_to_zero() {
        let mut state = new_state();
        state.script_rounds(scripted_rounds());
        tick(&mut state, &confirm(), SIM_DT);

        tick(&mut state, &pick(1), SIM_DT); // prime is at slot 0
        assert!(state.shake.is_some());

        let mut saw_offset = false;
        while state.shake.is_some() {
            tick(&mut state, &TickInput::default(), SIM_DT);
            saw_offset |= state.shake_offset != Vec2::ZERO;
        }
        assert!(saw_offset, "shake should have displaced the view");
        assert_eq!(state.shake_offset, Vec2::ZERO);
    }

    #[test]
    fn test_correct_pick_does_not_shake() {
        let mut state = new_state();
        state.script_rounds(scripted_rounds());
        tick(&mut state, &confirm(), SIM_DT);
        tick(&mut state, &pick(0), SIM_DT);
        assert!(state.shake.is_none());
        assert_eq!(state.shake_offset, Vec2::ZERO);
    }

    #[test]
    fn test_wrong_pick_reveals_prime_and_factors() {
        let mut state = new_state();
        state.script_rounds(scripted_rounds());
        tick(&mut state, &confirm(), SIM_DT);

        // Slot 1 holds composite 4; the prime 2 sits at slot 0
        tick(&mut state, &pick(1), SIM_DT);
        assert_eq!(state.runes[0].face, RuneFace::Correct);
        assert_eq!(state.runes[1].face, RuneFace::Incorrect);
        assert!(!state.factor_glyphs.is_empty(), "4 = 2 X 2 should be shown");
        assert_eq!(state.player.missed_primes.iter().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_scripted_session_end_to_end() {
        let mut state = new_state();
        state.max_rounds = 3;
        state.script_rounds(scripted_rounds());
        tick(&mut state, &confirm(), SIM_DT);

        play_round(&mut state, 0); // prime 2 at slot 0: correct
        play_round(&mut state, 0); // prime 11 at slot 1: miss
        play_round(&mut state, 0); // prime 3 at slot 0: correct

        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.player.score, 20);
        assert_eq!(
            state.player.found_primes.iter().copied().collect::<Vec<_>>(),
            vec![2, 3]
        );
        assert_eq!(
            state.player.missed_primes.iter().copied().collect::<Vec<_>>(),
            vec![11]
        );
        // Round UI is gone, the results screen is up
        assert!(state.ui_glyphs.is_empty());
        assert!(!state.over_glyphs.is_empty());
        assert!(state.runes.is_empty());
    }

    #[test]
    fn test_session_ends_after_exactly_max_rounds() {
        let mut state = new_state();
        state.max_rounds = 3;
        tick(&mut state, &confirm(), SIM_DT);

        for expected_round in 1..=3 {
            assert_eq!(state.phase, GamePhase::Playing);
            assert_eq!(state.round, expected_round);
            play_round(&mut state, 0);
        }
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_score_matches_correct_pick_count() {
        let mut state = new_state();
        tick(&mut state, &confirm(), SIM_DT);

        let mut correct_picks = 0;
        while state.phase == GamePhase::Playing {
            let numbers = state.numbers.unwrap();
            if numbers.prime_index() == 0 {
                correct_picks += 1;
            }
            play_round(&mut state, 0); // always slot 0
        }
        assert_eq!(state.player.score, PRIME_REWARD * correct_picks);
        assert_eq!(state.player.found_primes.len() as u32, correct_picks);
    }

    #[test]
    fn test_restart_returns_to_a_clean_title() {
        let mut state = new_state();
        state.max_rounds = 1;
        state.script_rounds(scripted_rounds());
        tick(&mut state, &confirm(), SIM_DT);
        play_round(&mut state, 3); // miss
        assert_eq!(state.phase, GamePhase::GameOver);

        tick(&mut state, &confirm(), SIM_DT);
        assert_eq!(state.phase, GamePhase::Title);
        assert!(state.over_glyphs.is_empty());
        assert!(!state.title_glyphs.is_empty());
        assert!(state.fragments.is_empty());
        assert!(state.fallen.is_empty());

        // Scores reset on the next start, per the restart contract
        tick(&mut state, &confirm(), SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.player.score, 0);
        assert!(state.player.found_primes.is_empty());
        assert!(state.player.missed_primes.is_empty());
        assert_eq!(state.round, 1);
    }

    #[test]
    fn test_determinism_same_seed_same_story() {
        let mut a = GameState::new(999, 1280.0, 720.0);
        let mut b = GameState::new(999, 1280.0, 720.0);

        for state in [&mut a, &mut b] {
            tick(state, &confirm(), SIM_DT);
            play_round(state, 2);
            play_round(state, 0);
        }

        assert_eq!(a.player, b.player);
        assert_eq!(a.round, b.round);
        assert_eq!(a.numbers, b.numbers);
        assert_eq!(a.fragments.len(), b.fragments.len());
    }

    #[test]
    fn test_shake_can_be_disabled() {
        let mut state = new_state();
        state.options.screen_shake = false;
        state.script_rounds(scripted_rounds());
        tick(&mut state, &confirm(), SIM_DT);
        tick(&mut state, &pick(3), SIM_DT); // miss
        assert!(state.shake.is_none());
    }
}
