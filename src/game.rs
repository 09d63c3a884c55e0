//! Game orchestrator
//!
//! Owns the current run plus everything that outlives it: theme unlocks,
//! settings, the ghost of the previous run and the music sequencer. The
//! browser glue (or the native demo) drives it with frames, input and beats.

use crate::audio::{MusicCue, Sequencer, StartOutcome, ToneGenerator};
use crate::consts::GHOST_KEY;
use crate::persistence::{self, KeyValueStore, PersistError};
use crate::platform::{Controls, Drag, InputAction, joystick_velocity};
use crate::renderer::{Hud, RenderSurface, SceneView, draw_scene};
use crate::settings::Settings;
use crate::sim::{self, EffectKind, GameEvent, GameState, GhostRecorder, GhostTrace};
use crate::themes::{Palette, ThemeOption, ThemeRegistry};

pub struct Game<S: KeyValueStore> {
    pub state: GameState,
    store: S,
    themes: ThemeRegistry,
    settings: Settings,
    recorder: GhostRecorder,
    /// Trace drawn behind the player this run
    ghost: Option<GhostTrace>,
    /// Trace persisted this run, shown from the next one
    next_ghost: Option<GhostTrace>,
    controls: Controls,
    drag: Option<Drag>,
    sequencer: Sequencer,
    /// Timestamp of the previous frame (ms)
    last_frame_ms: Option<f64>,
}

impl<S: KeyValueStore> Game<S> {
    pub fn new(store: S, seed: u64, now_ms: f64) -> Self {
        let themes = ThemeRegistry::load(&store);
        let settings = Settings::load(&store);
        let ghost = load_ghost(&store);
        if let Some(trace) = &ghost {
            log::info!("Loaded ghost run with {} samples", trace.len());
        }

        let state = GameState::new(seed, now_ms, themes.selected());
        log::info!("New run (seed {seed})");

        Self {
            state,
            store,
            themes,
            settings,
            recorder: GhostRecorder::new(),
            ghost,
            next_ghost: None,
            controls: Controls::new(),
            drag: None,
            sequencer: Sequencer::new(seed.rotate_left(17)),
            last_frame_ms: Some(now_ms),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn themes(&self) -> &ThemeRegistry {
        &self.themes
    }

    pub fn ghost(&self) -> Option<&GhostTrace> {
        self.ghost.as_ref()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// Start a fresh run, seeding it from the clock
    pub fn reset(&mut self, now_ms: f64) {
        self.reset_with_seed(crate::seed_from_time(now_ms), now_ms);
    }

    /// Start a fresh run. A long enough ghost of the run being abandoned is
    /// kept, and the last persisted ghost becomes the one shown.
    pub fn reset_with_seed(&mut self, seed: u64, now_ms: f64) {
        self.persist_ghost();
        if let Some(trace) = self.next_ghost.take() {
            self.ghost = Some(trace);
        }

        self.state = GameState::new(seed, now_ms, self.themes.selected());
        self.recorder = GhostRecorder::new();
        self.controls.release_all();
        self.drag = None;
        self.last_frame_ms = Some(now_ms);
        log::info!("New run (seed {seed})");
    }

    /// Advance to animation-frame timestamp `ts_ms`
    pub fn frame(&mut self, ts_ms: f64) -> Vec<GameEvent> {
        let dt = self
            .last_frame_ms
            .map(|last| ((ts_ms - last) / 1000.0) as f32)
            .unwrap_or(0.0);
        self.last_frame_ms = Some(ts_ms);

        if !self.state.running {
            return Vec::new();
        }

        sim::tick(&mut self.state, ts_ms, dt);
        self.recorder
            .record(ts_ms, self.state.elapsed_secs(), self.state.player.x);

        let events = self.state.drain_events();
        for event in &events {
            match *event {
                GameEvent::ThemeAdvanced { index } => {
                    self.themes.advance_to(index, &mut self.store);
                }
                GameEvent::RunOver { .. } => self.persist_ghost(),
                _ => {}
            }
        }
        events
    }

    fn persist_ghost(&mut self) {
        let Some(trace) = self.recorder.finish() else {
            return;
        };
        persistence::save_logged(&mut self.store, GHOST_KEY, &trace);
        log::info!("Saved ghost run ({} samples)", trace.len());
        self.next_ghost = Some(trace);
    }

    /// Where the ghost paddle sits right now, if one is shown
    pub fn ghost_x(&self) -> Option<f32> {
        if !self.settings.show_ghost {
            return None;
        }
        self.ghost
            .as_ref()
            .and_then(|g| g.position_at(self.state.elapsed_secs()))
    }

    pub fn palette(&self) -> &'static Palette {
        self.themes.palette()
    }

    pub fn render<R: RenderSurface + ?Sized>(&self, surface: &mut R) {
        let view = SceneView {
            state: &self.state,
            palette: self.palette(),
            ghost_x: self.ghost_x(),
            floor_phase: self.settings.effective_floor_phase(self.state.floor_phase),
        };
        draw_scene(surface, &view);
    }

    pub fn hud(&self) -> Hud {
        Hud::from_state(&self.state, self.palette())
    }

    // === Input ===

    /// Apply a key/button action; returns whether it changed anything
    pub fn apply(&mut self, action: InputAction, now_ms: f64) -> bool {
        match self.controls.apply(action) {
            Some(vx) => {
                self.state.player.vx = vx;
                true
            }
            None if !self.state.running => {
                self.reset(now_ms);
                true
            }
            None => false,
        }
    }

    /// Joystick deflection in px from its center; `None` on release
    pub fn set_joystick(&mut self, dx: Option<f32>) {
        self.state.player.vx = dx.map_or(0.0, joystick_velocity);
    }

    pub fn drag_start(&mut self, pointer_x: f32) {
        self.drag = Some(Drag::begin(pointer_x, self.state.player.x));
    }

    pub fn drag_move(&mut self, pointer_x: f32) {
        if let Some(drag) = self.drag {
            let player = &mut self.state.player;
            player.x = player.clamp_x(drag.target_x(pointer_x));
        }
    }

    pub fn drag_end(&mut self) {
        self.drag = None;
    }

    // === Themes & settings ===

    pub fn theme_options(&self) -> Vec<ThemeOption> {
        self.themes.options()
    }

    /// Switch to an unlocked theme, persist it and use it for progression
    pub fn select_theme(&mut self, index: usize) -> bool {
        if !self.themes.select(index) {
            log::debug!("Theme {index} is locked");
            return false;
        }
        self.themes.save(&mut self.store);
        self.state.progression.set_theme(index);
        log::info!("Theme '{}' selected", self.palette().name);
        true
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings.sanitized();
        self.settings.save(&mut self.store);
    }

    // === Music ===

    pub fn start_audio(&mut self) -> StartOutcome {
        self.sequencer.start()
    }

    pub fn suspend_audio(&mut self) {
        self.sequencer.suspend();
    }

    pub fn music_cue(&self) -> MusicCue {
        MusicCue {
            score: self.state.score,
            rainbow: self.state.effects.is_active(EffectKind::Rainbow),
        }
    }

    /// Play one beat; returns the delay before the next (ms), or `None` once
    /// the sequencer is not running
    pub fn audio_beat<G: ToneGenerator + ?Sized>(&mut self, synth: &mut G) -> Option<f64> {
        let beat = self.sequencer.advance(self.music_cue())?;
        if self.settings.effective_music_gain() > 0.0 {
            for tone in &beat.tones {
                synth.play(tone);
            }
        }
        Some(beat.delay_ms)
    }
}

fn load_ghost<S: KeyValueStore + ?Sized>(store: &S) -> Option<GhostTrace> {
    let loaded = persistence::load::<GhostTrace, _>(store, GHOST_KEY).and_then(|trace| {
        trace
            .validate()
            .map(|()| trace)
            .map_err(|reason| PersistError::Invalid {
                key: GHOST_KEY.to_string(),
                reason: reason.to_string(),
            })
    });
    persistence::recover(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ToneLog;
    use crate::consts::*;
    use crate::persistence::MemoryStore;
    use crate::renderer::DrawList;
    use crate::sim::{Gem, GemKind, Mission, MissionKind};

    fn game() -> Game<MemoryStore> {
        Game::new(MemoryStore::new(), 42, 0.0)
    }

    /// Run `n` frames spaced far enough apart that each is sampled
    fn run_frames(game: &mut Game<MemoryStore>, start_ms: f64, n: usize) -> f64 {
        let mut ts = start_ms;
        for _ in 0..n {
            game.frame(ts);
            ts += 150.0;
        }
        ts
    }

    #[test]
    fn test_short_ghost_is_dropped() {
        let mut game = game();
        let ts = run_frames(&mut game, 0.0, 10);
        game.reset_with_seed(1, ts);
        assert!(!game.store().has(GHOST_KEY));
        assert!(game.ghost().is_none());
    }

    #[test]
    fn test_short_run_keeps_previous_ghost() {
        let mut store = MemoryStore::new();
        let mut prior = GhostRecorder::new();
        for i in 0..12 {
            prior.record(i as f64 * 200.0, i as f32 * 0.2, 50.0 + i as f32);
        }
        let prior = prior.finish().expect("12 samples should be kept");
        persistence::save(&mut store, GHOST_KEY, &prior).unwrap();
        let stored = store.get(GHOST_KEY).unwrap();

        let mut game = Game::new(store, 42, 0.0);
        let ts = run_frames(&mut game, 0.0, 9);
        game.state.lives = 1;
        let mut gem = Gem::new(100.0, 0.0, GemKind::Normal);
        gem.pos.y = FIELD_HEIGHT + 20.0;
        game.state.gems.push(gem);

        // Tenth sample is taken on the frame that ends the run
        let events = game.frame(ts);
        assert!(events.iter().any(|e| matches!(e, GameEvent::RunOver { .. })));
        assert_eq!(game.store().get(GHOST_KEY).unwrap(), stored);

        game.reset_with_seed(5, ts + 100.0);
        assert_eq!(game.store().get(GHOST_KEY).unwrap(), stored);
        assert_eq!(game.ghost(), Some(&prior));
    }

    #[test]
    fn test_ghost_persisted_and_replayed_next_run() {
        let mut game = game();
        let ts = run_frames(&mut game, 0.0, 11);
        game.reset_with_seed(1, ts);
        assert!(game.store().has(GHOST_KEY));
        assert_eq!(game.ghost().map(GhostTrace::len), Some(11));
        assert!(game.ghost_x().is_some());

        let reloaded = Game::new(game.into_store(), 2, 0.0);
        assert_eq!(reloaded.ghost().map(GhostTrace::len), Some(11));
    }

    #[test]
    fn test_ghost_saved_on_run_over() {
        let mut game = game();
        let ts = run_frames(&mut game, 0.0, 12);
        game.state.lives = 1;
        let mut gem = Gem::new(100.0, 0.0, GemKind::Normal);
        gem.pos.y = FIELD_HEIGHT + 20.0;
        game.state.gems.push(gem);

        let events = game.frame(ts);
        assert!(events.iter().any(|e| matches!(e, GameEvent::RunOver { .. })));
        assert!(game.store().has(GHOST_KEY));
        // Current run keeps its own ghost until the next reset
        assert!(game.ghost().is_none());
        game.reset_with_seed(3, ts + 100.0);
        assert_eq!(game.ghost().map(GhostTrace::len), Some(13));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut game = game();
        run_frames(&mut game, 0.0, 5);
        game.reset_with_seed(9, 1_000.0);
        let first = game.state.clone();
        game.reset_with_seed(9, 1_000.0);
        assert_eq!(game.state, first);
        assert_eq!(game.state, GameState::new(9, 1_000.0, 0));
    }

    #[test]
    fn test_restart_only_after_run_over() {
        let mut game = game();
        game.frame(16.0);
        game.state.score = 50;
        assert!(!game.apply(InputAction::Restart, 100.0));
        assert_eq!(game.state.score, 50);

        game.state.running = false;
        assert!(game.apply(InputAction::Restart, 200.0));
        assert!(game.is_running());
        assert_eq!(game.state.score, 0);
    }

    #[test]
    fn test_keys_drive_paddle() {
        let mut game = game();
        game.apply(InputAction::MoveRightStart, 0.0);
        assert_eq!(game.state.player.vx, PLAYER_KEY_SPEED);
        game.apply(InputAction::MoveRightStop, 0.0);
        assert_eq!(game.state.player.vx, 0.0);

        game.set_joystick(Some(-70.0));
        assert_eq!(game.state.player.vx, -JOYSTICK_MAX_SPEED);
        game.set_joystick(None);
        assert_eq!(game.state.player.vx, 0.0);
    }

    #[test]
    fn test_drag_is_clamped() {
        let mut game = game();
        game.drag_move(500.0);
        let start = game.state.player.x;
        assert_eq!(game.state.player.x, start, "no drag in progress");

        game.drag_start(200.0);
        game.drag_move(230.0);
        assert_eq!(game.state.player.x, start + 30.0);
        game.drag_move(-1_000.0);
        assert_eq!(game.state.player.x, PLAYER_WALL_MARGIN);
        game.drag_end();
        game.drag_move(400.0);
        assert_eq!(game.state.player.x, PLAYER_WALL_MARGIN);
    }

    #[test]
    fn test_theme_unlock_persists() {
        let mut game = game();
        game.state.progression.fragments = FRAGMENT_GOAL - 1;
        game.state.mission = Mission::new(MissionKind::CatchLeft, 0.0);
        game.state.mission.progress = 2.0;
        game.state.player.x = 20.0;
        let mut gem = Gem::new(game.state.player.center_x() - GEM_SIZE / 2.0, 0.0, GemKind::Normal);
        gem.pos.y = game.state.player.y;
        game.state.gems.push(gem);

        let events = game.frame(16.0);
        assert!(events.contains(&GameEvent::ThemeAdvanced { index: 1 }));
        assert_eq!(game.themes().selected(), 1);
        assert_eq!(game.hud().theme, "Sunset Amber");

        let reloaded = Game::new(game.into_store(), 7, 0.0);
        assert!(reloaded.themes().is_unlocked(1));
        assert_eq!(reloaded.state.progression.theme_index, 1);
    }

    #[test]
    fn test_select_theme() {
        let mut game = game();
        assert!(!game.select_theme(2));
        assert!(game.theme_options()[2].disabled);

        let mut store = MemoryStore::new();
        store.set(UNLOCKED_KEY, "[0,2]").unwrap();
        let mut game = Game::new(store, 1, 0.0);
        assert!(game.select_theme(2));
        assert_eq!(game.state.progression.theme_index, 2);
        assert_eq!(ThemeRegistry::load(game.store()).selected(), 2);
    }

    #[test]
    fn test_malformed_store_uses_defaults() {
        let mut store = MemoryStore::new();
        for key in [UNLOCKED_KEY, THEME_KEY, GHOST_KEY, SETTINGS_KEY] {
            store.set(key, "{definitely not json").unwrap();
        }
        let game = Game::new(store, 1, 0.0);
        assert_eq!(game.themes(), &ThemeRegistry::default());
        assert_eq!(game.settings(), &Settings::default());
        assert!(game.ghost().is_none());
    }

    #[test]
    fn test_empty_ghost_rejected() {
        let mut store = MemoryStore::new();
        store.set(GHOST_KEY, r#"{"samples":[]}"#).unwrap();
        assert!(Game::new(store, 1, 0.0).ghost().is_none());
    }

    #[test]
    fn test_settings_panel_changes_persist() {
        use crate::platform::SettingsForm;

        let mut game = game();
        let form = SettingsForm {
            master_volume: "60",
            music_volume: "50",
            muted: false,
            show_ghost: false,
            reduced_motion: true,
        };
        let next = form.apply(game.settings());
        game.set_settings(next);
        assert!((game.settings().effective_music_gain() - 0.3).abs() < 1e-6);
        assert!(game.store().has(SETTINGS_KEY));

        let reloaded = Game::new(game.into_store(), 2, 0.0);
        assert_eq!(reloaded.settings().master_volume, 0.6);
        assert!(!reloaded.settings().show_ghost);
        assert!(reloaded.settings().reduced_motion);
    }

    #[test]
    fn test_ghost_hidden_by_setting() {
        let mut store = MemoryStore::new();
        store
            .set(GHOST_KEY, r#"{"samples":[{"t":0.0,"x":12.0},{"t":1.0,"x":30.0}]}"#)
            .unwrap();
        let mut game = Game::new(store, 1, 0.0);
        assert_eq!(game.ghost_x(), Some(12.0));

        game.set_settings(Settings {
            show_ghost: false,
            ..Settings::default()
        });
        assert_eq!(game.ghost_x(), None);
    }

    #[test]
    fn test_audio_beats() {
        let mut game = game();
        let mut synth = ToneLog::new();
        assert_eq!(game.audio_beat(&mut synth), None);

        assert_eq!(game.start_audio(), StartOutcome::Begin);
        assert_eq!(game.audio_beat(&mut synth), Some(520.0));
        assert!(!synth.tones.is_empty());

        game.state.score = 300;
        assert_eq!(game.audio_beat(&mut synth), Some(390.0));

        let played = synth.tones.len();
        game.set_settings(Settings {
            muted: true,
            ..Settings::default()
        });
        assert!(game.audio_beat(&mut synth).is_some());
        assert_eq!(synth.tones.len(), played, "muted beats stay silent");
    }

    #[test]
    fn test_render_and_hud() {
        let game = game();
        let mut list = DrawList::new();
        game.render(&mut list);
        assert!(!list.is_empty());
        assert_eq!(game.hud().lives, "3");
    }
}
