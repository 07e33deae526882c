//! Match engine integration tests.
//!
//! Full action flows: card plays, responses, counters, triggered revivals,
//! turn triggers, match completion and invariant recovery.

use card_tactics::cards::{CardId, CardLibrary};
use card_tactics::combat::Attributes;
use card_tactics::core::{
    ActionKind, EntityId, GameConfig, GameState, MatchStatus, PlayerAction, PlayerId, Position, RoleFamily,
    SummonStatus,
};
use card_tactics::error::ErrorKind;
use card_tactics::rules::{ActionOutcome, EngineError, MatchEngine};
use card_tactics::stack::{EffectSource, EffectTarget, StackPhase};
use card_tactics::triggers::GameEventType;

const CARDS: &str = r#"[
    { "id": 1, "name": "Mend", "effects": { "heal": { "base_power": 100 } } },
    { "id": 2, "name": "Denial", "speed": "counter", "effects": { "counter_effect": {} } },
    { "id": 3, "name": "Strike", "effects": { "physical_damage": { "weapon_power": 150 } } },
    { "id": 4, "name": "Second Wind", "speed": "counter", "effects": { "return_from_defeat": { "hp_percent": 50 } } },
    { "id": 5, "name": "Tribute", "effects": { "gain_victory_points": { "amount": 1 } } },
    { "id": 6, "name": "Grand Tribute", "effects": { "gain_victory_points": { "amount": 3 } } },
    { "id": 7, "name": "Morning Prayer", "effects": { "gain_victory_points": { "amount": 1, "trigger": "on_turn_start" } } },
    { "id": 8, "name": "Echo", "speed": "counter", "effects": { "gain_victory_points": { "amount": 1 }, "counter_effect": {} } }
]"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn engine(config: GameConfig) -> MatchEngine {
    init_tracing();
    let mut library = CardLibrary::new();
    library.load_json(CARDS).unwrap();
    MatchEngine::new(config, library, 2024)
}

struct Board {
    knight: EntityId,
    archer: EntityId,
}

fn board(engine: &mut MatchEngine) -> Board {
    let state = engine.state_mut();
    let knight = state.add_summon(
        PlayerId::ONE,
        "Knight",
        RoleFamily::Warrior,
        1,
        Position::new(4, 1),
        Attributes { strength: 20, spirit: 8, ..Attributes::default() },
    );
    let archer = state.add_summon(PlayerId::TWO, "Archer", RoleFamily::Scout, 1, Position::new(4, 10), Attributes::default());
    Board { knight, archer }
}

fn act(engine: &MatchEngine, player: PlayerId, kind: ActionKind) -> PlayerAction {
    PlayerAction::new(player, engine.state().turn, engine.state().phase, kind)
}

fn play(
    engine: &mut MatchEngine,
    player: PlayerId,
    card: u32,
    target: Option<EffectTarget>,
    actor: Option<EntityId>,
) -> Result<ActionOutcome, EngineError> {
    let card = CardId::new(card);
    engine.state_mut().add_to_hand(player, card);
    let action = act(engine, player, ActionKind::PlayCard { card, target, actor });
    engine.submit_action(&action)
}

fn pass(engine: &mut MatchEngine) -> Result<ActionOutcome, EngineError> {
    let holder = engine.stack().priority_player();
    engine.submit_action(&act(engine, holder, ActionKind::PassPriority))
}

// =============================================================================
// Card plays
// =============================================================================

#[test]
fn test_response_resolves_first() {
    let mut engine = engine(GameConfig::new());
    play(&mut engine, PlayerId::ONE, 5, None, None).unwrap();
    let response = play(&mut engine, PlayerId::TWO, 6, None, None).unwrap();
    assert_eq!(response.priority_player, PlayerId::ONE);
    assert_eq!(engine.stack().len(), 2);

    pass(&mut engine).unwrap();
    let outcome = pass(&mut engine).unwrap();

    let names: Vec<_> = outcome.resolved.iter().map(|d| d.effect_name.as_str()).collect();
    assert_eq!(names, ["Grand Tribute", "Tribute"]);
    assert_eq!(engine.state().player(PlayerId::ONE).victory_points, 1);
    assert_eq!(engine.state().player(PlayerId::TWO).victory_points, 3);
    assert_eq!(outcome.stack_phase, StackPhase::Idle);
    assert_eq!(engine.resolution_log().len(), 2);
}

#[test]
fn test_out_of_turn_play_rejected_by_priority() {
    let mut engine = engine(GameConfig::new());
    play(&mut engine, PlayerId::ONE, 5, None, None).unwrap();

    let err = play(&mut engine, PlayerId::ONE, 5, None, None).unwrap_err();
    assert_eq!(err.code(), "NOT_PRIORITY_HOLDER");
    assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
    assert_eq!(engine.stack().len(), 1);
}

#[test]
fn test_played_cards_go_to_discard() {
    let mut engine = engine(GameConfig::new());
    play(&mut engine, PlayerId::ONE, 5, None, None).unwrap();

    let player = engine.state().player(PlayerId::ONE);
    assert!(player.hand.is_empty());
    assert_eq!(player.discard.len(), 1);
}

// =============================================================================
// Counters and triggers
// =============================================================================

#[test]
fn test_counter_card_answers_next_play() {
    let mut engine = engine(GameConfig::new());
    let board = board(&mut engine);
    engine.state_mut().summon_mut(board.archer).unwrap().current_hp = 10;

    let armed = play(&mut engine, PlayerId::ONE, 2, None, None).unwrap();
    assert!(armed.added.is_empty());
    assert_eq!(engine.triggers().len(), 1);
    assert!(engine.stack().is_empty());

    let played = play(&mut engine, PlayerId::TWO, 1, Some(EffectTarget::Summon(board.archer)), None).unwrap();
    assert_eq!(played.added.len(), 2);
    assert_eq!(engine.stack().top().unwrap().effect.name, "Denial");
    assert_eq!(played.priority_player, PlayerId::TWO);
    assert!(engine.triggers().is_empty());

    pass(&mut engine).unwrap();
    let outcome = pass(&mut engine).unwrap();

    assert_eq!(outcome.resolved.len(), 1);
    assert!(outcome.resolved[0].description.contains("Mend was countered"));
    assert!(outcome.events.iter().any(|e| e.event_type == GameEventType::EffectCountered));
    assert!(engine.stack().is_empty());
    assert_eq!(engine.state().summon(board.archer).unwrap().current_hp, 10);
}

#[test]
fn test_defeat_reopens_stack_for_revival() {
    let mut engine = engine(GameConfig::new());
    let board = board(&mut engine);
    engine.state_mut().summon_mut(board.archer).unwrap().current_hp = 1;

    play(&mut engine, PlayerId::TWO, 4, None, None).unwrap();
    play(&mut engine, PlayerId::ONE, 3, Some(EffectTarget::Summon(board.archer)), Some(board.knight)).unwrap();

    pass(&mut engine).unwrap();
    let outcome = pass(&mut engine).unwrap();

    assert_eq!(outcome.resolved.len(), 1);
    assert_eq!(outcome.added.len(), 1);
    assert_eq!(outcome.stack_phase, StackPhase::Open);
    assert_eq!(outcome.priority_player, PlayerId::ONE);
    assert_eq!(engine.state().summon(board.archer).unwrap().status, SummonStatus::Defeated);

    pass(&mut engine).unwrap();
    let outcome = pass(&mut engine).unwrap();
    assert!(outcome.resolved[0].description.contains("returned from defeat"));
    assert!(engine.state().summon(board.archer).unwrap().is_active());
    assert!(outcome.events.iter().any(|e| e.event_type == GameEventType::SummonEntersPlay));
}

#[test]
fn test_turn_start_trigger() {
    let mut engine = engine(GameConfig::new());
    play(&mut engine, PlayerId::ONE, 7, None, None).unwrap();
    assert!(engine.stack().is_empty());

    let mut last = None;
    while engine.state().turn == 1 {
        let end = act(&engine, PlayerId::ONE, ActionKind::EndPhase);
        last = Some(engine.submit_action(&end).unwrap());
    }
    let last = last.unwrap();
    assert_eq!(last.added.len(), 1);
    assert!(last.events.iter().any(|e| e.event_type == GameEventType::TurnStarted));
    assert_eq!(engine.state().current_player, PlayerId::TWO);

    pass(&mut engine).unwrap();
    pass(&mut engine).unwrap();
    assert_eq!(engine.state().player(PlayerId::ONE).victory_points, 1);
}

#[test]
fn test_retire_source_removes_one_copy() {
    let mut engine = engine(GameConfig::new());
    let first = play(&mut engine, PlayerId::ONE, 7, None, None).unwrap();
    let second = play(&mut engine, PlayerId::ONE, 7, None, None).unwrap();
    assert_eq!(engine.triggers().len(), 2);

    let source = first.played.unwrap();
    assert!(matches!(source, EffectSource::PlayedCard { card, .. } if card == CardId::new(7)));
    assert_ne!(Some(source), second.played);

    assert_eq!(engine.retire_source(source), 1);
    assert_eq!(engine.triggers().len(), 1);
    assert_eq!(engine.retire_source(source), 0);
}

#[test]
fn test_copies_of_a_card_answer_each_other() {
    let mut engine = engine(GameConfig::new());
    let first = play(&mut engine, PlayerId::ONE, 8, None, None).unwrap();
    assert_eq!(first.added.len(), 1);
    assert_eq!(engine.triggers().len(), 1);

    let second = play(&mut engine, PlayerId::TWO, 8, None, None).unwrap();
    assert_eq!(second.added.len(), 2);
    let top = engine.stack().top().unwrap();
    assert_eq!(top.controller, PlayerId::ONE);
    assert_eq!(top.source, first.played.unwrap());
    assert_eq!(top.target, Some(EffectTarget::StackEntry(second.added[0])));
    assert_eq!(engine.triggers().len(), 1);
}

// =============================================================================
// Match completion
// =============================================================================

#[test]
fn test_victory_stops_resolution() {
    let mut engine = engine(GameConfig::new().with_victory_target(3));
    play(&mut engine, PlayerId::ONE, 5, None, None).unwrap();
    play(&mut engine, PlayerId::TWO, 6, None, None).unwrap();

    pass(&mut engine).unwrap();
    let outcome = pass(&mut engine).unwrap();

    assert_eq!(outcome.resolved.len(), 1);
    assert_eq!(engine.state().status, MatchStatus::Completed { winner: Some(PlayerId::TWO) });
    assert_eq!(engine.stack().len(), 1);

    let err = pass(&mut engine).unwrap_err();
    match err {
        EngineError::InvalidAction(report) => assert!(report.has("MATCH_COMPLETED")),
        other => panic!("unexpected error {:?}", other),
    }
}

// =============================================================================
// Failure handling
// =============================================================================

#[test]
fn test_stale_action_rejected() {
    let mut engine = engine(GameConfig::new());
    let stale = PlayerAction::new(PlayerId::ONE, 7, engine.state().phase, ActionKind::DrawCard);

    match engine.submit_action(&stale).unwrap_err() {
        EngineError::InvalidAction(report) => {
            assert!(report.has("TURN_MISMATCH"));
            assert!(report.has("DECK_EMPTY"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_missing_target_halts_then_rollback() {
    let mut engine = engine(GameConfig::new());
    board(&mut engine);
    play(&mut engine, PlayerId::ONE, 1, None, None).unwrap();
    let before = engine.state().clone();

    pass(&mut engine).unwrap();
    let err = pass(&mut engine).unwrap_err();
    assert_eq!(err.code(), "MISSING_TARGET");
    assert_eq!(err.kind(), ErrorKind::DispatchFailure);
    assert!(engine.stack().is_resolving());

    engine.rollback(err.snapshot_id().unwrap()).unwrap();
    assert_eq!(engine.state(), &before);
    engine.abort();
    assert_eq!(engine.stack().phase(), StackPhase::Idle);
}

#[test]
fn test_state_round_trips_through_bincode() {
    let mut engine = engine(GameConfig::new());
    board(&mut engine);
    play(&mut engine, PlayerId::ONE, 5, None, None).unwrap();

    let bytes = engine.state().to_bytes().unwrap();
    let decoded = GameState::from_bytes(&bytes).unwrap();
    assert_eq!(&decoded, engine.state());
}
