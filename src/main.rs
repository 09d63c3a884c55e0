//! Gem Catch entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        Document, HtmlCanvasElement, HtmlElement, HtmlInputElement, HtmlOptionElement,
        HtmlSelectElement, KeyboardEvent, PointerEvent,
    };

    use gem_catch::Game;
    use gem_catch::audio::{StartOutcome, WebToneGenerator};
    use gem_catch::persistence::{KeyValueStore, LocalStore, MemoryStore};
    use gem_catch::platform::{InputAction, SettingsForm, joystick_knob, key_action, slider_value};
    use gem_catch::renderer::CanvasSurface;
    use gem_catch::sim::GameEvent;
    use gem_catch::themes::Palette;

    /// Knob rest offset inside the joystick ring (px)
    const KNOB_REST: f32 = 34.0;

    /// Browser-side state wrapped around the game
    struct App {
        game: Game<Box<dyn KeyValueStore>>,
        surface: CanvasSurface,
        synth: Option<WebToneGenerator>,
        /// Bumped whenever a new beat loop starts; stale loops stop themselves
        beat_loop: u32,
        joystick_center: Option<(f32, f32)>,
    }

    type Shared = Rc<RefCell<App>>;

    fn window() -> web_sys::Window {
        web_sys::window().expect("no window")
    }

    fn document() -> Document {
        window().document().expect("no document")
    }

    fn now_ms() -> f64 {
        window().performance().map(|p| p.now()).unwrap_or(0.0)
    }

    fn element<T: JsCast>(id: &str) -> Option<T> {
        document().get_element_by_id(id)?.dyn_into().ok()
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Gem Catch starting...");

        let canvas: HtmlCanvasElement =
            element("lcd").ok_or_else(|| JsValue::from_str("no #lcd canvas"))?;
        let surface = CanvasSurface::new(&canvas)?;

        let store: Box<dyn KeyValueStore> = match LocalStore::open() {
            Ok(store) => Box::new(store),
            Err(err) => {
                log::warn!("{err}; progress will not be saved");
                Box::new(MemoryStore::new())
            }
        };
        let seed = gem_catch::seed_from_time(js_sys::Date::now());
        let game = Game::new(store, seed, now_ms());

        let app = Rc::new(RefCell::new(App {
            game,
            surface,
            synth: None,
            beat_loop: 0,
            joystick_center: None,
        }));

        {
            let a = app.borrow();
            apply_theme(a.game.palette());
            render_theme_select(&a.game);
        }

        setup_keyboard(app.clone());
        setup_buttons(app.clone());
        setup_drag(&canvas, app.clone());
        setup_joystick(app.clone());
        setup_theme_select(app.clone());
        setup_settings(app.clone());
        setup_visibility(app.clone());

        request_animation_frame(app);

        log::info!("Gem Catch running!");
        Ok(())
    }

    fn request_animation_frame(app: Shared) {
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window().request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Shared, time: f64) {
        {
            let mut a = app.borrow_mut();
            let events = a.game.frame(time);

            let App { game, surface, .. } = &mut *a;
            game.render(surface);
            update_hud(game);

            if events
                .iter()
                .any(|e| matches!(e, GameEvent::ThemeAdvanced { .. }))
            {
                apply_theme(game.palette());
                render_theme_select(game);
            }
        }

        request_animation_frame(app);
    }

    fn update_hud(game: &Game<Box<dyn KeyValueStore>>) {
        let hud = game.hud();
        for (id, text) in hud.fields() {
            if let Some(el) = document().get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }
    }

    /// Push the palette into the page's CSS variables
    fn apply_theme(palette: &Palette) {
        let Some(root) = document()
            .document_element()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        let style = root.style();
        for (name, value) in [
            ("--bg", palette.bg),
            ("--frame", palette.frame),
            ("--lcd1", palette.lcd1),
            ("--lcd2", palette.lcd2),
            ("--pill-bg", palette.pill_bg),
            ("--pill-border", palette.pill_border),
            ("--pill-text", palette.pill_text),
            ("--btn1", palette.btn1),
            ("--btn2", palette.btn2),
        ] {
            let _ = style.set_property(name, value);
        }
    }

    fn render_theme_select(game: &Game<Box<dyn KeyValueStore>>) {
        let Some(select) = element::<HtmlSelectElement>("themeSelect") else {
            return;
        };
        select.set_inner_html("");
        for option in game.theme_options() {
            let Ok(el) = document()
                .create_element("option")
                .and_then(|el| el.dyn_into::<HtmlOptionElement>().map_err(JsValue::from))
            else {
                continue;
            };
            el.set_value(&option.index.to_string());
            el.set_text(&option.label);
            el.set_disabled(option.disabled);
            el.set_selected(option.selected);
            let _ = select.append_child(&el);
        }
    }

    // === Settings panel ===

    const SETTINGS_IDS: [&str; 5] = [
        "masterVolume",
        "musicVolume",
        "muted",
        "showGhost",
        "reducedMotion",
    ];

    fn input(id: &str) -> Option<HtmlInputElement> {
        element(id)
    }

    /// Show the loaded settings in the panel
    fn render_settings(game: &Game<Box<dyn KeyValueStore>>) {
        let settings = game.settings();
        if let Some(el) = input("masterVolume") {
            el.set_value(&slider_value(settings.master_volume));
        }
        if let Some(el) = input("musicVolume") {
            el.set_value(&slider_value(settings.music_volume));
        }
        for (id, checked) in [
            ("muted", settings.muted),
            ("showGhost", settings.show_ghost),
            ("reducedMotion", settings.reduced_motion),
        ] {
            if let Some(el) = input(id) {
                el.set_checked(checked);
            }
        }
    }

    fn read_settings_form(app: &Shared) {
        let slider = |id: &str| input(id).map(|el| el.value()).unwrap_or_default();
        let checked = |id: &str, fallback: bool| input(id).map_or(fallback, |el| el.checked());

        let mut a = app.borrow_mut();
        let current = a.game.settings().clone();
        let (master, music) = (slider("masterVolume"), slider("musicVolume"));
        let form = SettingsForm {
            master_volume: &master,
            music_volume: &music,
            muted: checked("muted", current.muted),
            show_ghost: checked("showGhost", current.show_ghost),
            reduced_motion: checked("reducedMotion", current.reduced_motion),
        };
        let next = form.apply(&current);
        if next != current {
            a.game.set_settings(next);
            apply_volume(&a);
        }
    }

    fn setup_settings(app: Shared) {
        render_settings(&app.borrow().game);
        for id in SETTINGS_IDS {
            let Some(el) = input(id) else {
                continue;
            };
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                read_settings_form(&app);
            });
            let _ = el.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    // === Music ===

    /// Match the output gain to the current settings
    fn apply_volume(app: &App) {
        if let Some(synth) = &app.synth {
            synth.set_volume(app.game.settings().effective_music_gain());
        }
    }

    /// Start (or resume) the music on user interaction
    fn ensure_audio(app: &Shared) {
        let restart_loop = {
            let mut a = app.borrow_mut();
            let outcome = a.game.start_audio();
            match outcome {
                StartOutcome::Begin => {
                    a.synth = WebToneGenerator::new();
                    apply_volume(&a);
                }
                StartOutcome::Resume | StartOutcome::AlreadyRunning => {
                    if let Some(synth) = &a.synth {
                        synth.resume();
                    }
                }
            }
            if outcome == StartOutcome::AlreadyRunning || a.synth.is_none() {
                None
            } else {
                a.beat_loop = a.beat_loop.wrapping_add(1);
                Some(a.beat_loop)
            }
        };
        if let Some(id) = restart_loop {
            schedule_beat(app.clone(), id, 0.0);
        }
    }

    fn schedule_beat(app: Shared, id: u32, delay_ms: f64) {
        let closure = Closure::once(move || beat(app, id));
        let _ = window().set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            delay_ms as i32,
        );
        closure.forget();
    }

    fn beat(app: Shared, id: u32) {
        let next = {
            let mut a = app.borrow_mut();
            if a.beat_loop != id {
                return;
            }
            let App { game, synth, .. } = &mut *a;
            synth.as_mut().and_then(|s| game.audio_beat(s))
        };
        if let Some(delay) = next {
            schedule_beat(app, id, delay);
        }
    }

    // === Input ===

    fn setup_keyboard(app: Shared) {
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(action) = key_action(&event.code(), true) {
                    event.prevent_default();
                    app.borrow_mut().game.apply(action, now_ms());
                }
                ensure_audio(&app);
            });
            let _ = document()
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(action) = key_action(&event.code(), false) {
                    app.borrow_mut().game.apply(action, now_ms());
                }
            });
            let _ = document()
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(app: Shared) {
        let holds = [
            ("leftBtn", InputAction::MoveLeftStart, InputAction::MoveLeftStop),
            ("rightBtn", InputAction::MoveRightStart, InputAction::MoveRightStop),
        ];
        for (id, press, release) in holds {
            let Some(btn) = document().get_element_by_id(id) else {
                continue;
            };
            {
                let app = app.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                    app.borrow_mut().game.apply(press, now_ms());
                    ensure_audio(&app);
                });
                let _ = btn
                    .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
                closure.forget();
            }
            {
                let app = app.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                    app.borrow_mut().game.apply(release, now_ms());
                });
                let _ = btn
                    .add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }

        if let Some(btn) = document().get_element_by_id("restart") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                ensure_audio(&app);
                app.borrow_mut().game.reset(now_ms());
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Swipe the playfield to move (a tap alone does not move)
    fn setup_drag(canvas: &HtmlCanvasElement, app: Shared) {
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                app.borrow_mut().game.drag_start(event.client_x() as f32);
                ensure_audio(&app);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                app.borrow_mut().game.drag_move(event.client_x() as f32);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        for name in ["pointerup", "pointerleave"] {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                app.borrow_mut().game.drag_end();
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn place_knob(dx: f32, dy: f32) {
        let Some(knob) = element::<HtmlElement>("joyKnob") else {
            return;
        };
        let offset = joystick_knob(dx, dy);
        let style = knob.style();
        let _ = style.set_property("left", &format!("{}px", KNOB_REST + offset.x));
        let _ = style.set_property("top", &format!("{}px", KNOB_REST + offset.y));
    }

    fn setup_joystick(app: Shared) {
        let Some(ring) = element::<HtmlElement>("joystick") else {
            return;
        };

        fn steer(app: &Shared, event: &PointerEvent) {
            let mut a = app.borrow_mut();
            let Some((cx, cy)) = a.joystick_center else {
                return;
            };
            let dx = event.client_x() as f32 - cx;
            let dy = event.client_y() as f32 - cy;
            place_knob(dx, dy);
            a.game.set_joystick(Some(dx));
        }

        {
            let app = app.clone();
            let ring_clone = ring.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let rect = ring_clone.get_bounding_client_rect();
                let center = (
                    (rect.left() + rect.width() / 2.0) as f32,
                    (rect.top() + rect.height() / 2.0) as f32,
                );
                app.borrow_mut().joystick_center = Some(center);
                ensure_audio(&app);
                steer(&app, &event);
            });
            let _ = ring
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                steer(&app, &event);
            });
            let _ = ring
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        for name in ["pointerup", "pointerleave"] {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                let mut a = app.borrow_mut();
                a.joystick_center = None;
                a.game.set_joystick(None);
                place_knob(0.0, 0.0);
            });
            let _ = ring.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_theme_select(app: Shared) {
        let Some(select) = element::<HtmlSelectElement>("themeSelect") else {
            return;
        };
        let select_clone = select.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Ok(index) = select_clone.value().parse::<usize>() else {
                return;
            };
            let mut a = app.borrow_mut();
            if a.game.select_theme(index) {
                apply_theme(a.game.palette());
                update_hud(&a.game);
            }
        });
        let _ = select.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Hidden tabs stop the beat loop; the next interaction resumes it
    fn setup_visibility(app: Shared) {
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document().hidden() {
                app.borrow_mut().game.suspend_audio();
            }
        });
        let _ = document()
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(err) = wasm_game::run() {
        log::error!("Gem Catch failed to start: {err:?}");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Gem Catch (native) starting...");
    log::info!("Running a headless autopilot session - run with `trunk serve` to play");

    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless session: an autopilot plays against in-memory storage
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use gem_catch::Game;
    use gem_catch::audio::ToneLog;
    use gem_catch::persistence::MemoryStore;
    use gem_catch::platform::InputAction;
    use gem_catch::renderer::DrawList;
    use gem_catch::sim::GameEvent;

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Abandon a run after this long even if the autopilot is still alive
    const MAX_RUN_MS: f64 = 120_000.0;

    #[derive(Debug, Default)]
    struct RunStats {
        frames: u32,
        catches: u32,
        misses: u32,
        effects: u32,
        missions: u32,
        themes: u32,
        beats: u32,
    }

    struct Session {
        game: Game<MemoryStore>,
        synth: ToneLog,
        canvas: DrawList,
        now: f64,
        next_beat: f64,
    }

    impl Session {
        fn new(seed: u64) -> Self {
            let mut game = Game::new(MemoryStore::new(), seed, 0.0);
            game.start_audio();
            Self {
                game,
                synth: ToneLog::new(),
                canvas: DrawList::new(),
                now: 0.0,
                next_beat: 0.0,
            }
        }

        /// Chase whichever gem is closest to the floor
        fn steer(&mut self) {
            let player = self.game.state.player;
            let target = self
                .game
                .state
                .gems
                .iter()
                .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
                .map(|g| g.pos.x + g.size / 2.0);
            let center = player.center_x();
            let (left, right) = match target {
                Some(t) if t < center - 4.0 => (true, false),
                Some(t) if t > center + 4.0 => (false, true),
                _ => (false, false),
            };
            let now = self.now;
            self.game.apply(
                if left { InputAction::MoveLeftStart } else { InputAction::MoveLeftStop },
                now,
            );
            self.game.apply(
                if right { InputAction::MoveRightStart } else { InputAction::MoveRightStop },
                now,
            );
        }

        fn play_run(&mut self) -> RunStats {
            let mut stats = RunStats::default();
            let started = self.now;
            while self.game.is_running() && self.now - started < MAX_RUN_MS {
                self.now += FRAME_MS;
                self.steer();
                for event in self.game.frame(self.now) {
                    match event {
                        GameEvent::Caught { .. } => stats.catches += 1,
                        GameEvent::Missed { .. } => stats.misses += 1,
                        GameEvent::EffectApplied { .. } => stats.effects += 1,
                        GameEvent::MissionCompleted { .. } => stats.missions += 1,
                        GameEvent::ThemeAdvanced { .. } => stats.themes += 1,
                        _ => {}
                    }
                }
                self.game.render(&mut self.canvas);
                stats.frames += 1;

                while self.next_beat <= self.now {
                    match self.game.audio_beat(&mut self.synth) {
                        Some(delay) => {
                            self.next_beat += delay;
                            stats.beats += 1;
                        }
                        None => break,
                    }
                }
            }
            stats
        }
    }

    pub fn run() {
        let mut session = Session::new(2024);

        for run in 1..=2 {
            let stats = session.play_run();
            let hud = session.game.hud();
            log::info!("Run {run} finished: {stats:?}");
            println!(
                "Run {run}: score {} | lives {} | effects {} | theme {} | fragments {} | mission {}",
                hud.score, hud.lives, hud.effects, hud.theme, hud.fragments, hud.mission
            );
            println!(
                "  {} frames, last frame drew {} commands, {} tones played",
                stats.frames,
                session.canvas.len(),
                session.synth.tones.len()
            );

            let now = session.now;
            session.game.reset(now);
            match session.game.ghost() {
                Some(ghost) => println!("  ghost of this run kept ({} samples)", ghost.len()),
                None => println!("  run too short for a ghost"),
            }
        }
    }
}
