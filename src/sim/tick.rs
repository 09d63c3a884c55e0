//! Per-frame simulation step
//!
//! Core game loop that advances one run by a clamped delta.

use glam::Vec2;
use rand::Rng;

use super::combo;
use super::effects::EffectKind;
use super::mission::MissionUpdate;
use super::spawner;
use super::state::{GameEvent, GameState, Gem, Spark};
use crate::consts::*;

/// Advance the run to tick timestamp `now_ms` by `dt` seconds
///
/// Does nothing once the run is over. `dt` is clamped to `[0, MAX_DT]`.
pub fn tick(state: &mut GameState, now_ms: f64, dt: f32) {
    if !state.running {
        return;
    }
    let dt = if dt.is_finite() { dt.clamp(0.0, MAX_DT) } else { 0.0 };
    state.now_ms = now_ms;

    state.effects.decay(dt);
    state.player.integrate(dt);

    update_wind(state, dt);
    state.floor_phase += dt;

    let elapsed = state.elapsed_secs();
    if let Some(gem) = spawner::step(
        &mut state.spawn_timer,
        dt,
        &mut state.rng,
        state.base_fall_speed,
        state.base_spawn_interval,
        elapsed,
        &state.effects,
    ) {
        state.gems.push(gem);
    }

    move_gems(state, dt);
    resolve_gems(state);
    if !state.running {
        return;
    }
    update_sparks(state, dt);

    let since_miss = state.secs_since_miss();
    let update = state.mission.observe(None, now_ms, since_miss, &mut state.rng);
    settle_mission(state, update);
}

/// Wind stays calm during the lockout, then re-rolls every 6-12 s
fn update_wind(state: &mut GameState, dt: f32) {
    let calm = state.elapsed_secs() < WIND_LOCKOUT_SECS;
    let wind = &mut state.wind;
    wind.timer -= dt;
    if calm {
        wind.strength = 0.0;
        wind.timer = 1.0;
    } else if wind.timer <= 0.0 {
        wind.strength = (state.rng.random::<f32>() - 0.5) * 2.0 * WIND_MAX;
        wind.timer = state.rng.random_range(6.0..12.0);
    }
}

/// Per gem: wind, reflector bounce, fall, magnet pull (in that order)
fn move_gems(state: &mut GameState, dt: f32) {
    let speed = state.effects.movement_multiplier();
    let reflector = state.effects.is_active(EffectKind::Reflector);
    let magnet = state.effects.is_active(EffectKind::Magnet);
    let target = state.player.center_x();
    let drift = state.wind.strength * dt * 0.25;

    for gem in &mut state.gems {
        gem.pos.x += drift;

        if reflector {
            if gem.vx == 0.0 {
                gem.vx = state.rng.random_range(-25.0..=25.0);
            }
            gem.pos.x += gem.vx * dt;
            if gem.pos.x < 2.0 || gem.pos.x > FIELD_WIDTH - gem.size - 2.0 {
                gem.vx = -gem.vx;
            }
        }

        gem.pos.y += gem.vy * 60.0 * dt * speed;

        if magnet {
            gem.pos.x += (target - gem.pos.x) * 0.6 * dt;
        }
    }
}

/// Catches, then misses. Stops at the miss that ends the run.
fn resolve_gems(state: &mut GameState) {
    let mut i = state.gems.len();
    while i > 0 && state.running {
        i -= 1;
        let gem = state.gems[i];

        if gem.overlaps(&state.player) {
            state.gems.remove(i);
            catch_gem(state, &gem);
            continue;
        }

        if gem.pos.y > FIELD_HEIGHT + MISS_MARGIN {
            state.gems.remove(i);
            // Gems blown out sideways were never in play
            if gem.in_column() {
                miss_gem(state);
            }
        }
    }
}

fn catch_gem(state: &mut GameState, gem: &Gem) {
    let gain = CATCH_REWARD * state.effects.score_multiplier();
    state.score += gain;
    state.base_fall_speed = (state.base_fall_speed + FALL_SPEED_STEP).min(MAX_FALL_SPEED);
    state.events.push(GameEvent::Caught { kind: gem.kind, gain });
    log::debug!("Caught {} gem (+{gain}, score {})", gem.kind.as_str(), state.score);

    if gem.kind.is_special() {
        if let Some(effect) = combo::apply(&mut state.chain, &mut state.effects, gem.kind) {
            state.events.push(GameEvent::EffectApplied { effect });
        }
        if state.rng.random_bool(FRAGMENT_CHANCE) {
            award_fragment(state);
        }
    }

    spawn_sparks(state);

    let since_miss = state.secs_since_miss();
    let update = state
        .mission
        .observe(Some(gem), state.now_ms, since_miss, &mut state.rng);
    settle_mission(state, update);
}

fn miss_gem(state: &mut GameState) {
    if state.effects.is_active(EffectKind::Shield) {
        state.events.push(GameEvent::MissAbsorbed);
        return;
    }
    if !state.running {
        return;
    }
    state.lives = state.lives.saturating_sub(1);
    state.last_miss_ms = state.now_ms;
    state.events.push(GameEvent::Missed { lives_left: state.lives });
    if state.lives == 0 {
        state.running = false;
        state.events.push(GameEvent::RunOver { score: state.score });
        log::info!("Run over with score {}", state.score);
    }
}

fn award_fragment(state: &mut GameState) {
    match state.progression.award() {
        Some(index) => {
            state.events.push(GameEvent::ThemeAdvanced { index });
            log::info!("Fragment goal reached, advancing to theme {index}");
        }
        None => state.events.push(GameEvent::FragmentAwarded {
            fragments: state.progression.fragments,
        }),
    }
}

fn settle_mission(state: &mut GameState, update: MissionUpdate) {
    match update {
        MissionUpdate::Pending => {}
        MissionUpdate::Completed(kind) => {
            log::info!("Mission {kind:?} complete");
            state.events.push(GameEvent::MissionCompleted { kind });
            award_fragment(state);
            state.effects.trigger(EffectKind::Shield);
        }
        MissionUpdate::Expired(kind) => {
            log::debug!("Mission {kind:?} expired");
            state.events.push(GameEvent::MissionExpired { kind });
        }
    }
}

fn spawn_sparks(state: &mut GameState) {
    let origin = Vec2::new(state.player.center_x(), state.player.y);
    for _ in 0..SPARK_COUNT {
        let vx = (state.rng.random::<f32>() - 0.5) * 90.0;
        let vy = -20.0 - state.rng.random::<f32>() * 30.0;
        state.sparks.push(Spark {
            pos: origin,
            vel: Vec2::new(vx, vy),
            life: SPARK_LIFE,
        });
    }
}

fn update_sparks(state: &mut GameState, dt: f32) {
    for spark in &mut state.sparks {
        spark.life -= dt;
        spark.pos += spark.vel * dt;
        spark.vel.y += SPARK_GRAVITY * dt;
    }
    state.sparks.retain(|s| s.life > 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::combo::ChainState;
    use crate::sim::mission::{Mission, MissionKind};
    use crate::sim::state::GemKind;

    const DT: f32 = 1.0 / 60.0;

    /// Run with no pending spawn and a mission that cannot trigger
    fn quiet_state() -> GameState {
        let mut state = GameState::new(12345, 0.0, 0);
        state.spawn_timer = 1_000.0;
        state.mission = Mission::new(MissionKind::CatchLeft, 0.0);
        state.mission.deadline_ms = f64::MAX;
        state
    }

    /// Gem sitting right on the paddle's centre
    fn gem_on_paddle(state: &GameState, kind: GemKind) -> Gem {
        let mut gem = Gem::new(state.player.center_x() - GEM_SIZE / 2.0, 0.0, kind);
        gem.pos.y = state.player.y;
        gem
    }

    /// Gem that falls out on the next tick inside the visible column
    fn gem_falling_out(x: f32) -> Gem {
        let mut gem = Gem::new(x, 0.0, GemKind::Normal);
        gem.pos.y = FIELD_HEIGHT + MISS_MARGIN + 1.0;
        gem
    }

    #[test]
    fn test_normal_catch_scores_ten() {
        let mut state = quiet_state();
        let gem = gem_on_paddle(&state, GemKind::Normal);
        state.gems.push(gem);

        tick(&mut state, 16.0, DT);
        assert_eq!(state.score, 10);
        assert!(state.gems.is_empty());
        assert_eq!(state.sparks.len(), SPARK_COUNT);
        assert!((state.base_fall_speed - (BASE_FALL_SPEED + FALL_SPEED_STEP)).abs() < 1e-5);
    }

    #[test]
    fn test_fever_rainbow_catch_scores_sixty() {
        let mut state = quiet_state();
        state.effects.trigger(EffectKind::Fever);
        state.effects.trigger(EffectKind::Rainbow);
        let gem = gem_on_paddle(&state, GemKind::Normal);
        state.gems.push(gem);

        tick(&mut state, 16.0, DT);
        assert_eq!(state.score, 60);
    }

    #[test]
    fn test_fall_speed_caps() {
        let mut state = quiet_state();
        state.base_fall_speed = MAX_FALL_SPEED - 0.5;
        let gem = gem_on_paddle(&state, GemKind::Normal);
        state.gems.push(gem);
        tick(&mut state, 16.0, DT);
        assert_eq!(state.base_fall_speed, MAX_FALL_SPEED);
    }

    #[test]
    fn test_slow_then_fever_catch_is_rainbow() {
        let mut state = quiet_state();
        let slow = gem_on_paddle(&state, GemKind::Slow);
        state.gems.push(slow);
        tick(&mut state, 16.0, DT);
        assert_eq!(state.chain, ChainState::SlowArmed);

        let fever = gem_on_paddle(&state, GemKind::Fever);
        state.gems.push(fever);
        tick(&mut state, 32.0, DT);
        assert!(state.effects.is_active(EffectKind::Rainbow));
        assert!(!state.effects.is_active(EffectKind::Fever));
        assert_eq!(state.chain, ChainState::None);
    }

    #[test]
    fn test_last_life_miss_ends_run() {
        let mut state = quiet_state();
        state.lives = 1;
        state.gems.push(gem_falling_out(100.0));

        tick(&mut state, 16.0, DT);
        assert_eq!(state.lives, 0);
        assert!(!state.running);
        assert!(state.events.contains(&GameEvent::RunOver { score: 0 }));

        // Finished runs no longer advance
        state.gems.push(gem_on_paddle(&state, GemKind::Normal));
        tick(&mut state, 32.0, DT);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_nothing_scores_after_the_final_miss() {
        let mut state = quiet_state();
        state.lives = 1;
        let on_paddle = gem_on_paddle(&state, GemKind::Slow);
        state.gems.push(on_paddle);
        state.gems.push(gem_falling_out(100.0));

        tick(&mut state, 16.0, DT);
        assert!(!state.running);
        assert_eq!(state.score, 0);
        assert_eq!(state.chain, ChainState::None);
        assert!(!state.effects.is_active(EffectKind::Slow));
        assert_eq!(state.mission.progress, 0.0);
        assert!(state.sparks.is_empty());
        assert_eq!(
            state.events,
            vec![
                GameEvent::Missed { lives_left: 0 },
                GameEvent::RunOver { score: 0 },
            ]
        );
        assert_eq!(state.gems, vec![on_paddle]);
    }

    #[test]
    fn test_shield_absorbs_miss() {
        let mut state = quiet_state();
        state.lives = 1;
        state.effects.trigger(EffectKind::Shield);
        state.gems.push(gem_falling_out(100.0));

        tick(&mut state, 16.0, DT);
        assert_eq!(state.lives, 1);
        assert!(state.running);
        assert!(state.events.contains(&GameEvent::MissAbsorbed));
    }

    #[test]
    fn test_miss_resets_miss_clock() {
        let mut state = quiet_state();
        state.gems.push(gem_falling_out(100.0));
        tick(&mut state, 5_000.0, DT);
        assert_eq!(state.lives, START_LIVES - 1);
        assert_eq!(state.last_miss_ms, 5_000.0);
    }

    #[test]
    fn test_sideways_exit_is_free() {
        let mut state = quiet_state();
        state.gems.push(gem_falling_out(-100.0));
        state.gems.push(gem_falling_out(FIELD_WIDTH + 5.0));

        tick(&mut state, 16.0, DT);
        assert!(state.gems.is_empty());
        assert_eq!(state.lives, START_LIVES);
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut state = quiet_state();
        state.effects.trigger(EffectKind::Slow);
        tick(&mut state, 5_000.0, 5.0);
        assert!((state.effects.remaining(EffectKind::Slow) - (6.0 - MAX_DT)).abs() < 1e-5);
    }

    #[test]
    fn test_wind_calm_during_lockout() {
        let mut state = quiet_state();
        for i in 1..=60 {
            tick(&mut state, i as f64 * 200.0, MAX_DT);
            assert_eq!(state.wind.strength, 0.0);
        }
    }

    #[test]
    fn test_wind_rolls_after_lockout() {
        let mut state = quiet_state();
        state.wind.timer = 0.01;
        tick(&mut state, 16_000.0, DT);
        assert!(state.wind.strength.abs() <= WIND_MAX);
        assert!((6.0..12.0).contains(&state.wind.timer));
    }

    #[test]
    fn test_wind_drifts_gems() {
        let mut state = quiet_state();
        state.started_at_ms = -20_000.0;
        state.wind = crate::sim::state::Wind { strength: 20.0, timer: 100.0 };
        let mut gem = Gem::new(100.0, 0.0, GemKind::Normal);
        gem.pos.y = 50.0;
        state.gems.push(gem);

        tick(&mut state, 0.0, 0.04);
        assert!((state.gems[0].pos.x - (100.0 + 20.0 * 0.04 * 0.25)).abs() < 1e-4);
    }

    #[test]
    fn test_magnet_pulls_toward_paddle() {
        let mut state = quiet_state();
        state.effects.trigger(EffectKind::Magnet);
        let mut gem = Gem::new(10.0, 0.0, GemKind::Normal);
        gem.pos.y = 50.0;
        state.gems.push(gem);

        let target = state.player.center_x();
        tick(&mut state, 16.0, 0.05);
        let expected = 10.0 + (target - 10.0) * 0.6 * 0.05;
        assert!((state.gems[0].pos.x - expected).abs() < 1e-4);
    }

    #[test]
    fn test_reflector_bounces_off_walls() {
        let mut state = quiet_state();
        state.effects.trigger(EffectKind::Reflector);
        let mut gem = Gem::new(1.0, 0.0, GemKind::Normal);
        gem.pos.y = 50.0;
        gem.vx = -10.0;
        state.gems.push(gem);

        tick(&mut state, 16.0, DT);
        assert!(state.gems[0].vx > 0.0);

        // A resting gem picks up sideways speed once
        let mut still = Gem::new(200.0, 0.0, GemKind::Normal);
        still.pos.y = 50.0;
        state.gems.push(still);
        tick(&mut state, 32.0, DT);
        assert!(state.gems[1].vx.abs() <= 25.0);
    }

    #[test]
    fn test_rainbow_nearly_stops_gems() {
        let mut state = quiet_state();
        state.effects.trigger(EffectKind::Rainbow);
        let mut gem = Gem::new(100.0, 1.0, GemKind::Normal);
        gem.pos.y = 50.0;
        state.gems.push(gem);

        tick(&mut state, 16.0, 0.05);
        assert!((state.gems[0].pos.y - (50.0 + 60.0 * 0.05 * 0.05)).abs() < 1e-4);
    }

    #[test]
    fn test_sparks_expire() {
        let mut state = quiet_state();
        state.gems.push(gem_on_paddle(&state, GemKind::Normal));
        tick(&mut state, 16.0, DT);
        assert!(!state.sparks.is_empty());

        for i in 0..10 {
            tick(&mut state, 100.0 + i as f64 * 50.0, MAX_DT);
        }
        assert!(state.sparks.is_empty());
    }

    #[test]
    fn test_mission_completion_grants_shield_and_fragment() {
        let mut state = quiet_state();
        state.mission = Mission::new(MissionKind::CatchLeft, 0.0);
        state.mission.progress = 2.0;
        state.player.x = 20.0;
        state.gems.push(gem_on_paddle(&state, GemKind::Normal));

        tick(&mut state, 16.0, DT);
        assert!(state.events.contains(&GameEvent::MissionCompleted { kind: MissionKind::CatchLeft }));
        assert!(state.effects.is_active(EffectKind::Shield));
        assert_eq!(state.progression.fragments, 1);
    }

    #[test]
    fn test_fragment_goal_advances_theme() {
        let mut state = quiet_state();
        state.progression.fragments = FRAGMENT_GOAL - 1;
        state.mission = Mission::new(MissionKind::CatchRight, 0.0);
        state.mission.progress = 2.0;
        state.player.x = FIELD_WIDTH - 60.0;
        state.gems.push(gem_on_paddle(&state, GemKind::Normal));

        tick(&mut state, 16.0, DT);
        assert_eq!(state.progression.fragments, 0);
        assert_eq!(state.progression.theme_index, 1);
        assert!(state.events.contains(&GameEvent::ThemeAdvanced { index: 1 }));
    }

    #[test]
    fn test_spawner_runs_inside_tick() {
        let mut state = GameState::new(1, 0.0, 0);
        let mut t = 0.0;
        for _ in 0..20 {
            t += 16.0;
            tick(&mut state, t, DT);
        }
        assert_eq!(state.gems.len(), 1, "first gem spawns after 0.2s");
    }

    #[test]
    fn test_determinism() {
        let mut a = GameState::new(99999, 0.0, 0);
        let mut b = GameState::new(99999, 0.0, 0);
        for i in 1..600 {
            let now = i as f64 * 16.0;
            a.player.vx = if (i / 50) % 2 == 0 { 120.0 } else { -120.0 };
            b.player.vx = a.player.vx;
            tick(&mut a, now, DT);
            tick(&mut b, now, DT);
        }
        assert_eq!(a, b);
    }
}
