//! Per-family effect handlers.
//!
//! Each handler validates its target, mutates the private state copy handed
//! to it, and records what it did. Validation happens before the first
//! write, so an `Err` from any handler other than `InconsistentState` means
//! the copy is untouched.

use serde_json::{json, Value};
use tracing::info;

use super::detail::{ResolutionDetail, StateChange};
use super::error::ResolveError;
use super::resolver::{ResolverContext, ResolverId};
use crate::cards::{
    DamageParams, DrawParams, EffectParams, HealParams, ReviveParams, ShieldParams, StatBoostParams,
    VictoryPointParams,
};
use crate::combat::{crit_chance, healing_amount, Attributes, DamageStyle, StatModifier};
use crate::core::{EntityId, GameState, MatchStatus, PlayerId, Summon, SummonStatus};
use crate::stack::{EffectTarget, StackEffect, StackEffectId};
use crate::triggers::{GameEvent, GameEventType};

/// Accumulated output of one handler run.
#[derive(Debug)]
pub(crate) struct Applied {
    pub events: Vec<GameEvent>,
    pub detail: ResolutionDetail,
    pub countered: Option<StackEffectId>,
}

impl Applied {
    pub fn new(effect: &StackEffect) -> Self {
        Self {
            events: Vec::new(),
            detail: ResolutionDetail::new(effect.id, effect.effect.name.clone()),
            countered: None,
        }
    }
}

/// Dispatch to the handler for the effect's resolver.
pub(crate) fn apply(
    state: &mut GameState,
    effect: &StackEffect,
    ctx: &ResolverContext<'_>,
    out: &mut Applied,
) -> Result<(), ResolveError> {
    let resolver = &effect.effect.resolver;
    match (resolver, &effect.effect.params) {
        (ResolverId::Heal, EffectParams::Heal(p)) => heal(state, effect, p, out),
        (_, EffectParams::Damage { style, params }) if resolver.damage_style() == Some(*style) => {
            damage(state, effect, *style, params, out)
        }
        (ResolverId::DrawCards, EffectParams::DrawCards(p)) => draw_cards(state, effect, p, out),
        (ResolverId::StatBoost, EffectParams::StatBoost(p)) => stat_boost(state, effect, p, out),
        (ResolverId::DamageShield, EffectParams::DamageShield(p)) => shield(state, effect, p, out),
        (ResolverId::ReturnFromDefeat, EffectParams::ReturnFromDefeat(p)) => revive(state, effect, p, out),
        (ResolverId::CounterEffect, EffectParams::CounterEffect) => counter(effect, ctx, out),
        (ResolverId::DestroyBuilding, EffectParams::DestroyBuilding) => destroy_building(state, effect, out),
        (ResolverId::GainVictoryPoints, EffectParams::GainVictoryPoints(p)) => {
            victory_points(state, effect, p, out)
        }
        (ResolverId::Unknown(name), _) => Err(ResolveError::NoHandler(name.clone())),
        _ => Err(ResolveError::ParamsMismatch(resolver.as_str().to_string())),
    }
}

// === Shared helpers ===

/// Event payload describing a summon.
fn summon_payload(summon: &Summon) -> Value {
    json!({
        "id": summon.id.raw(),
        "owner": summon.owner.to_string(),
        "name": summon.name,
        "role": summon.role.as_str(),
        "level": summon.level,
    })
}

fn target_summon(effect: &StackEffect) -> Result<EntityId, ResolveError> {
    match effect.target {
        Some(EffectTarget::Summon(id)) => Ok(id),
        Some(other) => Err(ResolveError::InvalidTarget(format!("{:?} is not a summon", other))),
        None => Err(ResolveError::MissingTarget(effect.effect.name.clone())),
    }
}

fn target_player(effect: &StackEffect) -> Result<PlayerId, ResolveError> {
    match effect.target {
        None => Ok(effect.controller),
        Some(EffectTarget::Player(player)) if player.is_valid() => Ok(player),
        Some(other) => Err(ResolveError::InvalidTarget(format!("{:?} is not a player", other))),
    }
}

fn active_summon(state: &GameState, id: EntityId) -> Result<&Summon, ResolveError> {
    let summon = state
        .summon(id)
        .ok_or_else(|| ResolveError::InvalidTarget(format!("{} does not exist", id)))?;
    if !summon.is_active() {
        return Err(ResolveError::InvalidTarget(format!("{} is defeated", summon.name)));
    }
    Ok(summon)
}

fn summon_mut(state: &mut GameState, id: EntityId) -> Result<&mut Summon, ResolveError> {
    state
        .summon_mut(id)
        .ok_or_else(|| ResolveError::InconsistentState(format!("{} vanished during resolution", id)))
}

fn actor_attributes(state: &GameState, effect: &StackEffect) -> Result<Option<(Attributes, Value)>, ResolveError> {
    let Some(id) = effect.actor() else {
        return Ok(None);
    };
    let actor = state
        .summon(id)
        .filter(|s| s.is_active())
        .ok_or_else(|| ResolveError::MissingActor(effect.effect.name.clone()))?;
    Ok(Some((actor.effective_attributes(), summon_payload(actor))))
}

fn roll_critical(state: &mut GameState, effect: &StackEffect, attrs: &Attributes) -> bool {
    match effect.params.force_critical {
        Some(critical) => critical,
        None => state.roll_percent(crit_chance(attrs)),
    }
}

fn crit_suffix(critical: bool) -> &'static str {
    if critical {
        " (critical)"
    } else {
        ""
    }
}

// === Handlers ===

fn heal(state: &mut GameState, effect: &StackEffect, p: &HealParams, out: &mut Applied) -> Result<(), ResolveError> {
    let target_id = target_summon(effect)?;
    let target = active_summon(state, target_id)?;
    let (name, owner, before, max_hp) = (target.name.clone(), target.owner, target.current_hp, target.derived().max_hp);
    let target_attrs = target.effective_attributes();

    // Without an actor the target heals itself.
    let (attrs, source) = actor_attributes(state, effect)?.unwrap_or((target_attrs, Value::Null));

    let critical = roll_critical(state, effect, &attrs);
    let amount = effect
        .params
        .amount_override
        .unwrap_or_else(|| healing_amount(attrs.spirit, p.base_power, critical));

    let summon = summon_mut(state, target_id)?;
    // HP above a lowered maximum is kept; healing never takes it away.
    let after = before.max(before.saturating_add(amount).min(max_hp));
    summon.current_hp = after;
    let payload = summon_payload(summon);
    let healed = after - before;

    out.detail.touch(target_id);
    out.detail.record(StateChange::HpChanged { entity: target_id, before, after });
    out.detail.description = format!("{} healed for {} HP{}", name, healed, crit_suffix(critical));
    out.events.push(
        GameEvent::new(GameEventType::HealingApplied, owner)
            .with_source(source)
            .with_target(payload)
            .with_data("amount", healed)
            .with_data("critical", critical),
    );
    Ok(())
}

fn damage(
    state: &mut GameState,
    effect: &StackEffect,
    style: DamageStyle,
    p: &DamageParams,
    out: &mut Applied,
) -> Result<(), ResolveError> {
    let target_id = target_summon(effect)?;
    let defender = active_summon(state, target_id)?;
    let (name, owner, before, shield_before) = (defender.name.clone(), defender.owner, defender.current_hp, defender.shield);
    let defender_attrs = defender.effective_attributes();

    let (attacker_attrs, attacker) = actor_attributes(state, effect)?
        .ok_or_else(|| ResolveError::MissingActor(effect.effect.name.clone()))?;
    let attacker_name = attacker["name"].as_str().unwrap_or("unknown").to_string();

    let critical = roll_critical(state, effect, &attacker_attrs);
    let amount = effect
        .params
        .amount_override
        .unwrap_or_else(|| style.damage(&attacker_attrs, &defender_attrs, p.power, critical));

    let absorbed = amount.min(shield_before);
    let after = before.saturating_sub(amount - absorbed);
    let defeated = after == 0;

    let summon = summon_mut(state, target_id)?;
    summon.shield = shield_before - absorbed;
    summon.current_hp = after;
    if defeated {
        summon.status = SummonStatus::Defeated;
    }
    let payload = summon_payload(summon);

    out.detail.touch(target_id);
    if absorbed > 0 {
        out.detail.record(StateChange::ShieldChanged {
            entity: target_id,
            before: shield_before,
            after: shield_before - absorbed,
        });
    }
    out.detail.record(StateChange::HpChanged { entity: target_id, before, after });
    out.events.push(
        GameEvent::new(GameEventType::DamageDealt, effect.controller)
            .with_source(attacker.clone())
            .with_target(payload.clone())
            .with_data("amount", amount)
            .with_data("absorbed", absorbed)
            .with_data("critical", critical)
            .with_data("style", style.as_str()),
    );

    out.detail.description = format!(
        "{} dealt {} {} damage to {}{}",
        attacker_name,
        amount,
        style.as_str(),
        name,
        crit_suffix(critical)
    );

    if defeated {
        out.detail.record(StateChange::SummonDefeated { entity: target_id });
        out.detail.description.push_str(&format!(", defeating {}", name));
        out.events.push(
            GameEvent::new(GameEventType::SummonDefeated, owner)
                .with_source(attacker)
                .with_target(payload),
        );
    }
    Ok(())
}

fn draw_cards(state: &mut GameState, effect: &StackEffect, p: &DrawParams, out: &mut Applied) -> Result<(), ResolveError> {
    let player = target_player(effect)?;
    let count = effect.params.amount_override.unwrap_or(p.count);

    let drawn: Vec<_> = (0..count).map_while(|_| state.draw_card(player)).collect();

    out.detail.description = format!("{} drew {} card(s)", player, drawn.len());
    out.detail.record(StateChange::CardsDrawn { player, cards: drawn });
    Ok(())
}

fn stat_boost(state: &mut GameState, effect: &StackEffect, p: &StatBoostParams, out: &mut Applied) -> Result<(), ResolveError> {
    let target_id = target_summon(effect)?;
    active_summon(state, target_id)?;

    let expires_after_turn = p.duration_turns.map(|turns| state.turn.saturating_add(turns.max(1) - 1));
    let modifier = StatModifier { stat: p.stat, amount: p.amount, expires_after_turn };

    let summon = summon_mut(state, target_id)?;
    summon.modifiers.push_back(modifier);

    out.detail.description = match expires_after_turn {
        Some(turn) => format!("{} gains {:+} {} until turn {}", summon.name, p.amount, p.stat.as_str(), turn),
        None => format!("{} gains {:+} {}", summon.name, p.amount, p.stat.as_str()),
    };
    out.detail.touch(target_id);
    out.detail.record(StateChange::ModifierAdded {
        entity: target_id,
        stat: p.stat,
        amount: p.amount,
        expires_after_turn,
    });
    Ok(())
}

fn shield(state: &mut GameState, effect: &StackEffect, p: &ShieldParams, out: &mut Applied) -> Result<(), ResolveError> {
    let target_id = target_summon(effect)?;
    active_summon(state, target_id)?;
    let amount = effect.params.amount_override.unwrap_or(p.amount);

    let summon = summon_mut(state, target_id)?;
    let before = summon.shield;
    summon.shield = before.saturating_add(amount);

    out.detail.description = format!("{} shielded for {}", summon.name, amount);
    out.detail.touch(target_id);
    out.detail.record(StateChange::ShieldChanged { entity: target_id, before, after: summon.shield });
    Ok(())
}

fn revive(state: &mut GameState, effect: &StackEffect, p: &ReviveParams, out: &mut Applied) -> Result<(), ResolveError> {
    let target_id = target_summon(effect)?;
    let target = state
        .summon(target_id)
        .ok_or_else(|| ResolveError::InvalidTarget(format!("{} does not exist", target_id)))?;
    if target.status != SummonStatus::Defeated {
        return Err(ResolveError::InvalidTarget(format!("{} is not defeated", target.name)));
    }
    if state.is_occupied(target.position) {
        return Err(ResolveError::InvalidTarget(format!("cell {} is occupied", target.position)));
    }

    let max_hp = target.derived().max_hp;
    let hp = (u64::from(max_hp) * u64::from(p.hp_percent.min(100)) / 100).max(1) as u32;
    let owner = target.owner;

    let summon = summon_mut(state, target_id)?;
    summon.status = SummonStatus::Active;
    summon.current_hp = hp;
    summon.shield = 0;
    summon.modifiers.clear();
    let payload = summon_payload(summon);

    out.detail.description = format!("{} returned from defeat with {} HP", summon.name, hp);
    out.detail.touch(target_id);
    out.detail.record(StateChange::SummonReturned { entity: target_id, hp });
    out.events.push(GameEvent::new(GameEventType::SummonEntersPlay, owner).with_target(payload));
    Ok(())
}

fn counter(effect: &StackEffect, ctx: &ResolverContext<'_>, out: &mut Applied) -> Result<(), ResolveError> {
    let countered_id = match effect.target {
        Some(EffectTarget::StackEntry(id)) => id,
        Some(other) => return Err(ResolveError::InvalidTarget(format!("{:?} is not a stack entry", other))),
        None => return Err(ResolveError::MissingTarget(effect.effect.name.clone())),
    };
    if countered_id == effect.id {
        return Err(ResolveError::InvalidTarget("an effect cannot counter itself".to_string()));
    }
    let countered = ctx
        .stack_entry(countered_id)
        .ok_or_else(|| ResolveError::InvalidTarget(format!("{} is not on the stack", countered_id)))?;

    out.countered = Some(countered_id);
    out.detail.description = format!("{} was countered", countered.effect.name);
    out.detail.record(StateChange::EffectCountered { effect: countered_id });
    out.events.push(
        GameEvent::new(GameEventType::EffectCountered, effect.controller).with_target(json!({
            "stack_effect": countered_id.raw(),
            "name": countered.effect.name,
            "controller": countered.controller.to_string(),
        })),
    );
    Ok(())
}

fn destroy_building(state: &mut GameState, effect: &StackEffect, out: &mut Applied) -> Result<(), ResolveError> {
    let building_id = match effect.target {
        Some(EffectTarget::Building(id)) => id,
        Some(other) => return Err(ResolveError::InvalidTarget(format!("{:?} is not a building", other))),
        None => return Err(ResolveError::MissingTarget(effect.effect.name.clone())),
    };
    let building = state
        .buildings
        .remove(&building_id)
        .ok_or_else(|| ResolveError::InvalidTarget(format!("{} does not exist", building_id)))?;

    out.detail.description = format!("{}'s {} was destroyed", building.owner, building.kind.as_str());
    out.detail.touch(building_id);
    out.detail.record(StateChange::BuildingDestroyed { entity: building_id });
    out.events.push(
        GameEvent::new(GameEventType::BuildingDestroyed, effect.controller).with_target(json!({
            "id": building_id.raw(),
            "owner": building.owner.to_string(),
            "kind": building.kind.as_str(),
        })),
    );
    Ok(())
}

fn victory_points(
    state: &mut GameState,
    effect: &StackEffect,
    p: &VictoryPointParams,
    out: &mut Applied,
) -> Result<(), ResolveError> {
    let player = target_player(effect)?;
    let amount = effect.params.amount_override.unwrap_or(p.amount);

    let before = state.player(player).victory_points;
    let after = before.saturating_add(amount);
    state.player_mut(player).victory_points = after;

    out.detail.description = format!("{} gained {} victory point(s)", player, amount);
    out.detail.record(StateChange::VictoryPointsChanged { player, before, after });
    out.events.push(
        GameEvent::new(GameEventType::VictoryPointsGained, player)
            .with_data("amount", amount)
            .with_data("total", after),
    );
    Ok(())
}

/// Complete the match if a player now holds enough victory points.
///
/// Runs after costs are paid, so it sees final totals. The controller is
/// checked first.
pub(crate) fn settle_match(state: &mut GameState, effect: &StackEffect, out: &mut Applied) {
    if state.is_completed() {
        return;
    }
    let seats = [effect.controller, effect.controller.opponent()];
    let Some(winner) = seats
        .into_iter()
        .find(|p| state.player(*p).victory_points >= state.victory_target)
    else {
        return;
    };

    state.status = MatchStatus::Completed { winner: Some(winner) };
    out.detail.record(StateChange::MatchCompleted { winner: Some(winner) });
    info!(%winner, points = state.player(winner).victory_points, "match completed");
}
