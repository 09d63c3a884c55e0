//! Slow → fever → rainbow chain
//!
//! Catching slow arms the chain; catching fever while armed pays out
//! rainbow instead of fever. Any other special catch disarms it.

use serde::{Deserialize, Serialize};

use super::effects::{EffectKind, EffectTimers};
use super::state::GemKind;

/// Progress toward the rainbow combo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChainState {
    #[default]
    None,
    /// Slow was the last special caught
    SlowArmed,
}

/// Effect a special catch actually produces, advancing the chain
///
/// Returns `None` for normal gems, which leave the chain untouched.
pub fn resolve(chain: &mut ChainState, kind: GemKind) -> Option<EffectKind> {
    let (next, effect) = match (*chain, kind) {
        (_, GemKind::Normal) => return None,
        (_, GemKind::Slow) => (ChainState::SlowArmed, EffectKind::Slow),
        (ChainState::SlowArmed, GemKind::Fever) => (ChainState::None, EffectKind::Rainbow),
        (ChainState::None, GemKind::Fever) => (ChainState::None, EffectKind::Fever),
        (_, GemKind::Rainbow) => (ChainState::None, EffectKind::Rainbow),
        (_, GemKind::Magnet) => (ChainState::None, EffectKind::Magnet),
        (_, GemKind::Reflector) => (ChainState::None, EffectKind::Reflector),
    };
    *chain = next;
    Some(effect)
}

/// Resolve a catch and start the resulting effect
pub fn apply(chain: &mut ChainState, effects: &mut EffectTimers, kind: GemKind) -> Option<EffectKind> {
    let effect = resolve(chain, kind)?;
    effects.trigger(effect);
    Some(effect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slow_then_fever_is_rainbow() {
        let mut chain = ChainState::None;
        let mut effects = EffectTimers::new();

        assert_eq!(apply(&mut chain, &mut effects, GemKind::Slow), Some(EffectKind::Slow));
        assert_eq!(chain, ChainState::SlowArmed);

        assert_eq!(apply(&mut chain, &mut effects, GemKind::Fever), Some(EffectKind::Rainbow));
        assert_eq!(chain, ChainState::None);
        assert!(effects.is_active(EffectKind::Rainbow));
        assert!(!effects.is_active(EffectKind::Fever));
        assert_eq!(effects.remaining(EffectKind::Rainbow), 3.0);
    }

    #[test]
    fn test_fever_then_slow_does_not_combo() {
        let mut chain = ChainState::None;
        let mut effects = EffectTimers::new();

        apply(&mut chain, &mut effects, GemKind::Fever);
        apply(&mut chain, &mut effects, GemKind::Slow);
        assert!(effects.is_active(EffectKind::Fever));
        assert!(effects.is_active(EffectKind::Slow));
        assert!(!effects.is_active(EffectKind::Rainbow));
        assert_eq!(chain, ChainState::SlowArmed);
    }

    #[test]
    fn test_other_specials_disarm() {
        for kind in [GemKind::Magnet, GemKind::Reflector, GemKind::Rainbow] {
            let mut chain = ChainState::SlowArmed;
            let mut effects = EffectTimers::new();
            apply(&mut chain, &mut effects, kind);
            assert_eq!(chain, ChainState::None, "{kind:?} should clear the chain");

            // Fever after a broken chain is plain fever
            assert_eq!(apply(&mut chain, &mut effects, GemKind::Fever), Some(EffectKind::Fever));
        }
    }

    #[test]
    fn test_normal_is_ignored() {
        let mut chain = ChainState::SlowArmed;
        let mut effects = EffectTimers::new();
        assert_eq!(apply(&mut chain, &mut effects, GemKind::Normal), None);
        assert_eq!(chain, ChainState::SlowArmed);
        assert_eq!(effects.active().count(), 0);
    }

    #[test]
    fn test_durations() {
        let mut chain = ChainState::None;
        let mut effects = EffectTimers::new();
        apply(&mut chain, &mut effects, GemKind::Magnet);
        apply(&mut chain, &mut effects, GemKind::Reflector);
        assert_eq!(effects.remaining(EffectKind::Magnet), 6.0);
        assert_eq!(effects.remaining(EffectKind::Reflector), 7.0);
    }
}
