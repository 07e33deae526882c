//! Effect resolution: one dispatch point from resolver id to handler.
//!
//! Resolution never mutates the caller's state. The resolver clones it (an
//! O(1) operation on the persistent structures), runs the handler on the
//! clone and returns the clone only on success, so a failed effect leaves
//! nothing behind.

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::detail::ResolutionDetail;
use super::error::ResolveError;
use super::handlers::{self, Applied};
use super::requirements::{check_requirements, pay_costs};
use crate::combat::DamageStyle;
use crate::core::GameState;
use crate::stack::{StackEffect, StackEffectId};
use crate::triggers::GameEvent;

/// Names a resolver. Closed set plus `Unknown` for data-driven content.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResolverId {
    Heal,
    PhysicalDamage,
    RangedDamage,
    MagicalDamage,
    DrawCards,
    StatBoost,
    DamageShield,
    ReturnFromDefeat,
    CounterEffect,
    DestroyBuilding,
    GainVictoryPoints,
    /// No handler exists. Fails when resolved.
    Unknown(String),
}

impl ResolverId {
    /// Every resolver with a handler.
    pub const KNOWN: [ResolverId; 11] = [
        Self::Heal,
        Self::PhysicalDamage,
        Self::RangedDamage,
        Self::MagicalDamage,
        Self::DrawCards,
        Self::StatBoost,
        Self::DamageShield,
        Self::ReturnFromDefeat,
        Self::CounterEffect,
        Self::DestroyBuilding,
        Self::GainVictoryPoints,
    ];

    /// Look up a resolver by its canonical name.
    ///
    /// ```
    /// use card_tactics::effects::ResolverId;
    ///
    /// assert_eq!(ResolverId::from_name("heal"), ResolverId::Heal);
    /// assert_eq!(ResolverId::from_name("invalidResolver"), ResolverId::Unknown("invalidResolver".into()));
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|known| known.as_str() == name)
            .cloned()
            .unwrap_or_else(|| Self::Unknown(name.to_string()))
    }

    /// Canonical name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Heal => "heal",
            Self::PhysicalDamage => "physical_damage",
            Self::RangedDamage => "ranged_damage",
            Self::MagicalDamage => "magical_damage",
            Self::DrawCards => "draw_cards",
            Self::StatBoost => "stat_boost",
            Self::DamageShield => "damage_shield",
            Self::ReturnFromDefeat => "return_from_defeat",
            Self::CounterEffect => "counter_effect",
            Self::DestroyBuilding => "destroy_building",
            Self::GainVictoryPoints => "gain_victory_points",
            Self::Unknown(name) => name,
        }
    }

    /// Damage formula used by a damage resolver.
    #[must_use]
    pub fn damage_style(&self) -> Option<DamageStyle> {
        match self {
            Self::PhysicalDamage => Some(DamageStyle::Physical),
            Self::RangedDamage => Some(DamageStyle::Ranged),
            Self::MagicalDamage => Some(DamageStyle::Magical),
            _ => None,
        }
    }

    /// Check whether a handler exists.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for ResolverId {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<ResolverId> for String {
    fn from(id: ResolverId) -> Self {
        match id {
            ResolverId::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ResolverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of the surroundings of a resolving effect.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResolverContext<'a> {
    stack: Option<&'a Vector<StackEffect>>,
}

impl<'a> ResolverContext<'a> {
    /// Context for an effect resolving off `stack`.
    #[must_use]
    pub fn new(stack: &'a Vector<StackEffect>) -> Self {
        Self { stack: Some(stack) }
    }

    /// Context for an effect resolved outside any stack.
    #[must_use]
    pub fn detached() -> Self {
        Self { stack: None }
    }

    /// Find an entry on the stack.
    #[must_use]
    pub fn stack_entry(&self, id: StackEffectId) -> Option<&'a StackEffect> {
        self.stack?.iter().find(|e| e.id == id)
    }
}

/// Output of a successful resolution.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub state: GameState,
    /// Events for the trigger system.
    pub events: Vec<GameEvent>,
    pub detail: ResolutionDetail,
    /// Stack entry this effect counters.
    pub countered: Option<StackEffectId>,
}

/// Resolves stack entries against game state.
#[derive(Clone, Copy, Debug, Default)]
pub struct EffectResolver;

impl EffectResolver {
    /// Create a resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolve one stack entry.
    ///
    /// Fails with no state change on an unknown resolver, unmet requirements
    /// or a bad target. Costs are paid only when the handler succeeds.
    pub fn resolve_effect(
        &self,
        effect: &StackEffect,
        state: &GameState,
        ctx: &ResolverContext<'_>,
    ) -> Result<Resolution, ResolveError> {
        if let ResolverId::Unknown(name) = &effect.effect.resolver {
            return Err(ResolveError::NoHandler(name.clone()));
        }
        if !effect.controller.is_valid() {
            return Err(ResolveError::InconsistentState(format!(
                "{} is controlled by invalid {}",
                effect.id, effect.controller
            )));
        }
        if let Some(req) = &effect.effect.requirements {
            let unmet = check_requirements(req, effect.controller, state);
            if !unmet.is_empty() {
                return Err(ResolveError::RequirementsNotMet(unmet));
            }
        }

        debug!(id = %effect.id, resolver = effect.effect.resolver.as_str(), "dispatching effect");

        let mut next = state.clone();
        let mut applied = Applied::new(effect);
        handlers::apply(&mut next, effect, ctx, &mut applied)?;

        if let Some(req) = &effect.effect.requirements {
            for change in pay_costs(&req.cost, effect.controller, &mut next) {
                applied.detail.record(change);
            }
        }
        handlers::settle_match(&mut next, effect, &mut applied);

        Ok(Resolution {
            state: next,
            events: applied.events,
            detail: applied.detail,
            countered: applied.countered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardEffect, Cost, EffectParams, HealParams, Requirements, VictoryPointParams};
    use crate::core::{GameConfig, MatchStatus, PlayerId};
    use crate::error::ErrorKind;
    use crate::rules::StateValidator;
    use crate::stack::{EffectSource, Speed};

    fn entry(effect: CardEffect) -> StackEffect {
        StackEffect::new(effect, EffectSource::System, PlayerId::ONE, Speed::Action)
    }

    #[test]
    fn test_resolver_names_round_trip() {
        for known in ResolverId::KNOWN {
            assert_eq!(ResolverId::from_name(known.as_str()), known);
        }
        let json = serde_json::to_string(&ResolverId::Unknown("x".into())).unwrap();
        assert_eq!(json, "\"x\"");
    }

    #[test]
    fn test_unknown_resolver_fails_without_mutation() {
        let state = GameState::new(&GameConfig::new(), 1);
        let effect = CardEffect::new("t:bad", "Bad", ResolverId::from_name("invalidResolver"), EffectParams::Unknown { raw: "{}".into() });

        let err = EffectResolver::new()
            .resolve_effect(&entry(effect), &state, &ResolverContext::detached())
            .unwrap_err();

        assert_eq!(err, ResolveError::NoHandler("invalidResolver".into()));
        assert!(err.to_string().contains("No handler found for resolver"));
        assert_eq!(err.kind(), ErrorKind::DispatchFailure);
    }

    #[test]
    fn test_requirements_checked_first() {
        let state = GameState::new(&GameConfig::new(), 1);
        let effect = CardEffect::new("t:vp", "Tribute", ResolverId::GainVictoryPoints, EffectParams::GainVictoryPoints(VictoryPointParams::default()))
            .with_requirements(Requirements { requires_building: true, ..Requirements::default() });

        let err = EffectResolver::new()
            .resolve_effect(&entry(effect), &state, &ResolverContext::detached())
            .unwrap_err();
        assert_eq!(err.code(), "REQUIREMENTS_NOT_MET");
    }

    #[test]
    fn test_costs_paid_on_success() {
        let mut state = GameState::new(&GameConfig::new(), 1);
        state.player_mut(PlayerId::ONE).victory_points = 2;
        let effect = CardEffect::new("t:vp", "Tithe", ResolverId::GainVictoryPoints, EffectParams::GainVictoryPoints(VictoryPointParams { amount: 3 }))
            .with_requirements(Requirements { cost: Cost { discard: 0, victory_points: 2 }, ..Requirements::default() });

        let resolution = EffectResolver::new()
            .resolve_effect(&entry(effect), &state, &ResolverContext::detached())
            .unwrap();

        assert_eq!(resolution.state.player(PlayerId::ONE).victory_points, 3);
        assert_eq!(state.player(PlayerId::ONE).victory_points, 2);
    }

    #[test]
    fn test_victory_checked_after_costs() {
        let config = GameConfig::new();
        let mut state = GameState::new(&config, 1);
        state.player_mut(PlayerId::ONE).victory_points = 8;
        let effect = CardEffect::new("t:vp", "Tithe", ResolverId::GainVictoryPoints, EffectParams::GainVictoryPoints(VictoryPointParams { amount: 3 }))
            .with_requirements(Requirements { cost: Cost { discard: 0, victory_points: 2 }, ..Requirements::default() });
        let resolver = EffectResolver::new();

        // 8 + 3 - 2 = 9 of 10: not a win.
        let short = resolver.resolve_effect(&entry(effect.clone()), &state, &ResolverContext::detached()).unwrap();
        assert_eq!(short.state.player(PlayerId::ONE).victory_points, 9);
        assert!(!short.state.is_completed());
        assert!(StateValidator::validate_state(&short.state, &config).is_valid());

        state.player_mut(PlayerId::ONE).victory_points = 9;
        let won = resolver.resolve_effect(&entry(effect), &state, &ResolverContext::detached()).unwrap();
        assert_eq!(won.state.player(PlayerId::ONE).victory_points, 10);
        assert_eq!(won.state.status, MatchStatus::Completed { winner: Some(PlayerId::ONE) });
        assert!(StateValidator::validate_state(&won.state, &config).is_valid());
    }

    #[test]
    fn test_params_mismatch() {
        let state = GameState::new(&GameConfig::new(), 1);
        let effect = CardEffect::new("t:odd", "Odd", ResolverId::DrawCards, EffectParams::Heal(HealParams::default()));

        let err = EffectResolver::new()
            .resolve_effect(&entry(effect), &state, &ResolverContext::detached())
            .unwrap_err();
        assert_eq!(err.code(), "PARAMS_MISMATCH");
    }
}
