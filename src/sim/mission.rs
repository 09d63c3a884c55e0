//! Timed side objectives
//!
//! One mission is live at a time. Completing it pays a fragment and a
//! shield; running out the clock just swaps in a new one.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::Gem;
use crate::consts::{FIELD_WIDTH, MISSION_DURATION_MS};

/// Mission types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissionKind {
    /// Catch gems on the right half
    CatchRight,
    /// Catch gems on the left half
    CatchLeft,
    /// Catch special gems
    CatchSpecials,
    /// Go a while without losing a life
    NoMiss,
}

impl MissionKind {
    pub const ALL: [MissionKind; 4] = [
        MissionKind::CatchRight,
        MissionKind::CatchLeft,
        MissionKind::CatchSpecials,
        MissionKind::NoMiss,
    ];

    /// Catches, or seconds for `NoMiss`
    pub fn target(self) -> f32 {
        match self {
            MissionKind::CatchRight | MissionKind::CatchLeft | MissionKind::CatchSpecials => 3.0,
            MissionKind::NoMiss => 15.0,
        }
    }
}

/// The live mission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub kind: MissionKind,
    pub target: f32,
    pub progress: f32,
    /// Timestamp after which the mission lapses (ms)
    pub deadline_ms: f64,
}

/// Result of feeding an observation to the mission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionUpdate {
    Pending,
    /// Target reached; a replacement is already live
    Completed(MissionKind),
    /// Deadline passed; a replacement is already live
    Expired(MissionKind),
}

impl Mission {
    pub fn new(kind: MissionKind, now_ms: f64) -> Self {
        Self {
            kind,
            target: kind.target(),
            progress: 0.0,
            deadline_ms: now_ms + MISSION_DURATION_MS,
        }
    }

    /// Uniformly chosen mission starting now
    pub fn random<R: Rng + ?Sized>(rng: &mut R, now_ms: f64) -> Self {
        let kind = MissionKind::ALL[rng.random_range(0..MissionKind::ALL.len())];
        Self::new(kind, now_ms)
    }

    pub fn description(&self) -> String {
        let secs = (MISSION_DURATION_MS / 1000.0) as u32;
        let target = self.target as u32;
        match self.kind {
            MissionKind::CatchRight => format!("Catch {target} on right ({secs}s)"),
            MissionKind::CatchLeft => format!("Catch {target} on left ({secs}s)"),
            MissionKind::CatchSpecials => format!("Catch {target} special gems ({secs}s)"),
            MissionKind::NoMiss => format!("{target}s no miss ({secs}s)"),
        }
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.progress >= self.target
    }

    #[inline]
    pub fn is_expired(&self, now_ms: f64) -> bool {
        now_ms > self.deadline_ms
    }

    fn record_catch(&mut self, gem: &Gem) {
        let midpoint = FIELD_WIDTH / 2.0;
        let counts = match self.kind {
            MissionKind::CatchRight => gem.pos.x > midpoint,
            MissionKind::CatchLeft => gem.pos.x < midpoint,
            MissionKind::CatchSpecials => gem.kind.is_special(),
            MissionKind::NoMiss => false,
        };
        if counts {
            self.progress += 1.0;
        }
    }

    /// Observe one catch (or `None` for a plain tick) and settle the mission
    pub fn observe<R: Rng + ?Sized>(
        &mut self,
        caught: Option<&Gem>,
        now_ms: f64,
        secs_since_miss: f32,
        rng: &mut R,
    ) -> MissionUpdate {
        if let Some(gem) = caught {
            self.record_catch(gem);
        }
        if self.kind == MissionKind::NoMiss {
            self.progress = secs_since_miss.clamp(0.0, self.target);
        }

        if self.is_complete() {
            let kind = self.kind;
            *self = Mission::random(rng, now_ms);
            return MissionUpdate::Completed(kind);
        }
        if self.is_expired(now_ms) {
            let kind = self.kind;
            *self = Mission::random(rng, now_ms);
            return MissionUpdate::Expired(kind);
        }
        MissionUpdate::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::GemKind;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn gem_at(x: f32, kind: GemKind) -> Gem {
        Gem::new(x, 1.0, kind)
    }

    #[test]
    fn test_catch_right_is_strict() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut mission = Mission::new(MissionKind::CatchRight, 0.0);
        let mid = FIELD_WIDTH / 2.0;

        mission.observe(Some(&gem_at(mid, GemKind::Normal)), 10.0, 0.0, &mut rng);
        assert_eq!(mission.progress, 0.0, "midpoint does not count");

        mission.observe(Some(&gem_at(mid + 0.5, GemKind::Normal)), 20.0, 0.0, &mut rng);
        assert_eq!(mission.progress, 1.0);

        mission.observe(Some(&gem_at(mid - 50.0, GemKind::Normal)), 30.0, 0.0, &mut rng);
        assert_eq!(mission.progress, 1.0);
    }

    #[test]
    fn test_catch_left() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut mission = Mission::new(MissionKind::CatchLeft, 0.0);
        mission.observe(Some(&gem_at(10.0, GemKind::Fever)), 1.0, 0.0, &mut rng);
        mission.observe(Some(&gem_at(FIELD_WIDTH / 2.0, GemKind::Normal)), 2.0, 0.0, &mut rng);
        assert_eq!(mission.progress, 1.0);
    }

    #[test]
    fn test_specials_completion_issues_new_mission() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut mission = Mission::new(MissionKind::CatchSpecials, 0.0);

        for i in 0..2 {
            let update = mission.observe(Some(&gem_at(50.0, GemKind::Slow)), i as f64, 0.0, &mut rng);
            assert_eq!(update, MissionUpdate::Pending);
        }
        mission.observe(Some(&gem_at(50.0, GemKind::Normal)), 3.0, 0.0, &mut rng);
        assert_eq!(mission.progress, 2.0);

        let update = mission.observe(Some(&gem_at(50.0, GemKind::Magnet)), 5_000.0, 0.0, &mut rng);
        assert_eq!(update, MissionUpdate::Completed(MissionKind::CatchSpecials));
        assert_eq!(mission.progress, 0.0);
        assert_eq!(mission.deadline_ms, 5_000.0 + MISSION_DURATION_MS);
    }

    #[test]
    fn test_no_miss_gauge_tracks_clock() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut mission = Mission::new(MissionKind::NoMiss, 0.0);

        mission.observe(None, 4_000.0, 4.0, &mut rng);
        assert_eq!(mission.progress, 4.0);

        // A miss drops the gauge back with the clock
        mission.observe(None, 5_000.0, 0.5, &mut rng);
        assert_eq!(mission.progress, 0.5);

        let update = mission.observe(None, 20_000.0, 15.0, &mut rng);
        assert_eq!(update, MissionUpdate::Completed(MissionKind::NoMiss));
    }

    #[test]
    fn test_expiry_replaces_silently() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut mission = Mission::new(MissionKind::CatchLeft, 0.0);

        assert_eq!(mission.observe(None, MISSION_DURATION_MS, 0.0, &mut rng), MissionUpdate::Pending);

        let now = MISSION_DURATION_MS + 1.0;
        let update = mission.observe(None, now, 0.0, &mut rng);
        assert_eq!(update, MissionUpdate::Expired(MissionKind::CatchLeft));
        assert_eq!(mission.deadline_ms, now + MISSION_DURATION_MS);
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(Mission::new(MissionKind::CatchRight, 0.0).description(), "Catch 3 on right (30s)");
        assert_eq!(Mission::new(MissionKind::CatchSpecials, 0.0).description(), "Catch 3 special gems (30s)");
        assert_eq!(Mission::new(MissionKind::NoMiss, 0.0).description(), "15s no miss (30s)");
    }

    #[test]
    fn test_random_covers_all_kinds() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(Mission::random(&mut rng, 0.0).kind);
        }
        assert_eq!(seen.len(), MissionKind::ALL.len());
    }
}
