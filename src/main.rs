//! Prime Danger entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use glam::Vec2;
    use prime_danger::Settings;
    use prime_danger::consts::*;
    use prime_danger::render::Renderer;
    use prime_danger::sim::{GamePhase, GameState, TickInput, tick};

    /// Game instance holding all state
    struct Game {
        state: GameState,
        renderer: Option<Renderer>,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
    }

    impl Game {
        fn new(seed: u64, width: f32, height: f32, settings: &Settings) -> Self {
            Self {
                state: GameState::with_options(seed, width, height, settings.sim_options()),
                renderer: None,
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
            }
        }

        /// Route a pointer press: confirm on menus, rune hit-test otherwise
        fn pointer_press(&mut self, x: f32, y: f32) {
            match self.state.phase {
                GamePhase::Title | GamePhase::GameOver => self.input.confirm = true,
                _ => {
                    if let Some(slot) = self.state.rune_at(Vec2::new(x, y)) {
                        self.input.pick = Some(slot);
                    }
                }
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.input;
                tick(&mut self.state, &input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.confirm = false;
                self.input.pick = None;
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            if let Some(ref mut renderer) = self.renderer {
                if let Err(e) = renderer.render(&self.state) {
                    log::warn!("Render error: {:?}", e);
                }
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Prime Danger starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let width = canvas.client_width() as f32;
        let height = canvas.client_height() as f32;
        canvas.set_width(width as u32);
        canvas.set_height(height as u32);

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, width, height, &settings)));

        log::info!("Game initialized with seed: {}", seed);

        match Renderer::new(&canvas) {
            Ok(renderer) => game.borrow_mut().renderer = Some(renderer),
            Err(e) => log::error!("Renderer init failed: {:?}", e),
        }

        setup_input_handlers(&canvas, game.clone());
        setup_resize_handler(&canvas, game.clone());

        request_animation_frame(game);

        log::info!("Prime Danger running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Keyboard: Enter/Space confirm, 1-4 pick a rune
        {
            let game = game.clone();
            let window = web_sys::window().unwrap();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    " " | "Enter" => g.input.confirm = true,
                    "1" => g.input.pick = Some(0),
                    "2" => g.input.pick = Some(1),
                    "3" => g.input.pick = Some(2),
                    "4" => g.input.pick = Some(3),
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse press
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                game.borrow_mut()
                    .pointer_press(event.offset_x() as f32, event.offset_y() as f32);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch press
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let x = touch.client_x() as f32 - rect.left() as f32;
                    let y = touch.client_y() as f32 - rect.top() as f32;
                    game.borrow_mut().pointer_press(x, y);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize_handler(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let width = canvas.client_width() as f32;
            let height = canvas.client_height() as f32;
            canvas.set_width(width as u32);
            canvas.set_height(height as u32);
            game.borrow_mut().state.resize(width, height);
            log::info!("Resized to {}x{}", width, height);
        });
        let _ =
            window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt);
            g.render();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Prime Danger (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    run_headless_session();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Play one automated session picking the first rune every round, as a
/// smoke test of the sim on native builds.
#[cfg(not(target_arch = "wasm32"))]
fn run_headless_session() {
    use prime_danger::consts::{FALL_DURATION, NEXT_ROUND_DELAY, SIM_DT};
    use prime_danger::sim::{GamePhase, GameState, TickInput, tick};

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(1);
    let mut state = GameState::new(seed, 1280.0, 720.0);

    tick(&mut state, &TickInput::confirm(), SIM_DT);

    while state.phase == GamePhase::Playing {
        tick(&mut state, &TickInput::pick(0), SIM_DT);
        let steps = ((FALL_DURATION + NEXT_ROUND_DELAY + 0.2) / SIM_DT) as usize;
        for _ in 0..steps {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
    }

    println!(
        "Session over: score {}, found {:?}, missed {:?}",
        state.player.score, state.player.found_primes, state.player.missed_primes
    );
}
