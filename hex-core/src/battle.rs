//! Battle engine
//!
//! A battle walks initiative segments from the highest value present on the
//! board down to 0. Each segment runs three passes:
//!
//! 1. pre-actions: players with an eligible unit may trigger it (grenades)
//! 2. actions: every queued unit attacks, all hits computed before any lands
//! 3. post-actions: players may react to the damage just dealt (medics)
//!
//! and then removes the dead. Units are always visited in row-major order,
//! which is also ascending cell index. Nothing in here draws randomness.

use serde::{Deserialize, Serialize};

use crate::board::BoardState;
use crate::context::Ctx;
use crate::coords::{from_index, Coordinates, PlayerId, Pos};
use crate::error::InvalidMove;
use crate::hex::Hex;
use crate::state::GameState;
use crate::token::{Attack, AttackKind, BattleAction};

// ============================================================================
// CORE TYPES
// ============================================================================

/// Where the current segment stands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BattleStage {
    Prepare,     // Segment not scanned yet
    PreActions,  // Waiting on pre-action choices
    PostActions, // Attacks landed, waiting on post-action choices
}

/// In-progress battle
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    /// Current segment, battle is over below 0
    pub initiative: i32,
    /// Player to resume normal play with
    pub initiator: PlayerId,
    pub stage: BattleStage,
    pub pre_actions: Vec<Pos>,
    pub actions: Vec<Pos>,
    pub post_actions: Vec<Pos>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Hit {
    target: Pos,
    damage: u32,
}

impl Battle {
    /// Open a battle at the highest initiative on the board
    pub fn start(board: &mut BoardState, initiator: PlayerId) -> Self {
        let mut initiative = 0;
        for pos in board.occupied_positions() {
            if let Some(hex) = board.get_mut(pos) {
                hex.attacked_in_battle = false;
                hex.damaged_in_battle = false;
                hex.segment_damage = 0;
                if let Some(max) = hex.token.max_initiative() {
                    initiative = initiative.max(max as i32);
                }
            }
        }

        Self {
            initiative,
            initiator,
            stage: BattleStage::Prepare,
            pre_actions: Vec::new(),
            actions: Vec::new(),
            post_actions: Vec::new(),
        }
    }

    pub fn is_over(&self) -> bool {
        self.initiative < 0
    }

    /// Queue the units of the next non-empty segment
    ///
    /// Returns `false` once no segment is left.
    pub fn prepare_segment(&mut self, board: &mut BoardState) -> bool {
        self.clear_queues();
        for pos in board.occupied_positions() {
            if let Some(hex) = board.get_mut(pos) {
                hex.segment_damage = 0;
            }
        }

        while self.initiative >= 0 {
            let segment = self.initiative as u32;
            for (hex, coords) in board.occupied() {
                if !hex.token.acts_at(segment) {
                    continue;
                }
                if hex.token.abilities.is_empty() {
                    self.actions.push(coords.to_index());
                } else {
                    self.pre_actions.push(coords.to_index());
                }
            }

            if !self.pre_actions.is_empty() || !self.actions.is_empty() {
                self.stage = BattleStage::PreActions;
                return true;
            }
            self.initiative -= 1;
        }
        false
    }

    /// Every unit taking part in the segment, row-major
    pub fn segment_units(&self) -> Vec<Pos> {
        let mut units: Vec<Pos> = self.pre_actions.iter().chain(&self.actions).copied().collect();
        units.sort_unstable();
        units
    }

    /// Players owed a pre-action turn, in seat order
    pub fn players_with_pre_actions(&self, board: &BoardState, num_players: usize) -> Vec<PlayerId> {
        self.players_in_order(num_players, |player| {
            self.pre_actions.iter().any(|&pos| {
                board
                    .get(pos)
                    .is_some_and(|hex| hex.player == player && !pre_actions_of(hex).is_empty())
            })
        })
    }

    /// Players owed a post-action turn, in seat order
    pub fn players_with_post_actions(&self, board: &BoardState, num_players: usize) -> Vec<PlayerId> {
        self.players_in_order(num_players, |player| {
            self.post_actions
                .iter()
                .any(|&pos| board.get(pos).is_some_and(|hex| hex.player == player))
        })
    }

    // Each pass starts at seat 0 whoever initiated the battle
    fn players_in_order(&self, num_players: usize, mut eligible: impl FnMut(PlayerId) -> bool) -> Vec<PlayerId> {
        (0..num_players).filter(|&player| eligible(player)).collect()
    }

    /// Resolve the base attacks of every queued unit
    ///
    /// Units left in the pre-action queue attack too. Hits are computed
    /// against the board as it stood when the pass began.
    pub fn run_segment(&mut self, board: &mut BoardState) {
        let mut queue = std::mem::take(&mut self.actions);
        queue.append(&mut self.pre_actions);
        queue.sort_unstable();
        queue.retain(|&pos| board.get(pos).is_some());

        let hits: Vec<Hit> = queue.iter().flat_map(|&pos| resolve_attacks(board, pos)).collect();

        for &pos in &queue {
            if let Some(hex) = board.get_mut(pos) {
                if !hex.token.attacks.is_empty() {
                    hex.attacked_in_battle = true;
                }
            }
        }
        for hit in hits {
            if let Some(target) = board.get_mut(hit.target) {
                target.take_damage(hit.damage);
            }
        }

        self.post_actions = board
            .occupied()
            .map(|(_, coords)| coords.to_index())
            .filter(|&pos| !heal_targets(board, pos).is_empty())
            .collect();
        self.stage = BattleStage::PostActions;
    }

    /// Remove the dead and step down one segment
    pub fn finish_segment(&mut self, board: &mut BoardState) -> Vec<Pos> {
        let removed: Vec<Pos> = board
            .occupied()
            .filter(|(hex, _)| hex.is_dead())
            .map(|(_, coords)| coords.to_index())
            .collect();
        for &pos in &removed {
            board.remove(pos);
        }

        self.clear_queues();
        self.initiative -= 1;
        self.stage = BattleStage::Prepare;
        removed
    }

    fn clear_queues(&mut self) {
        self.pre_actions.clear();
        self.actions.clear();
        self.post_actions.clear();
    }
}

// ============================================================================
// UNIT CAPABILITIES
// ============================================================================

/// Pre-actions a unit offers, one per action kind
pub fn pre_actions_of(hex: &Hex) -> Vec<BattleAction> {
    let token = &hex.token;
    let candidates = token
        .abilities
        .iter()
        .map(|a| a.kind.pre_action())
        .chain(token.attacks.iter().map(|a| a.kind.pre_action()))
        .chain(token.modifiers.iter().map(|m| m.kind.pre_action()));
    dedup_actions(candidates.flatten())
}

/// Post-actions a unit offers, one per action kind
pub fn post_actions_of(hex: &Hex) -> Vec<BattleAction> {
    dedup_actions(hex.token.modifiers.iter().filter_map(|m| m.kind.post_action()))
}

fn dedup_actions(actions: impl Iterator<Item = BattleAction>) -> Vec<BattleAction> {
    let mut unique = Vec::new();
    for action in actions {
        if !unique.contains(&action) {
            unique.push(action);
        }
    }
    unique
}

/// Cells hit by one attack fired in an absolute facing
pub fn attack_targets(board: &BoardState, attacker: &Hex, origin: Coordinates, kind: AttackKind, facing: u8) -> Vec<Pos> {
    let enemy_at = |cell: Coordinates| board.get(cell.to_index()).filter(|hex| hex.player != attacker.player);

    match kind {
        AttackKind::Melee => {
            let cell = origin.neighbor(facing);
            if cell.is_valid() && enemy_at(cell).is_some() {
                vec![cell.to_index()]
            } else {
                Vec::new()
            }
        }
        AttackKind::Ranged => {
            for cell in origin.ray(facing) {
                if let Some(target) = enemy_at(cell) {
                    if kind.is_shieldable() && shielded(target, facing) {
                        return Vec::new();
                    }
                    return vec![cell.to_index()];
                }
            }
            Vec::new()
        }
        AttackKind::Gauss => origin
            .ray(facing)
            .filter(|&cell| enemy_at(cell).is_some())
            .map(|cell| cell.to_index())
            .collect(),
    }
}

/// Whether a shield of `target` faces an attack travelling in `incoming`
fn shielded(target: &Hex, incoming: u8) -> bool {
    let toward_attacker = (incoming + 3) % 6;
    target.token.shields.iter().any(|&s| target.facing(s) == toward_attacker)
}

/// Attack damage after neighbouring modifiers, floored at 0
pub fn attack_damage(board: &BoardState, attacker: &Hex, origin: Coordinates, attack: &Attack) -> u32 {
    let mut damage = attack.damage as i32;

    for facing in 0..6u8 {
        let cell = origin.neighbor(facing);
        if !cell.is_valid() {
            continue;
        }
        let Some(neighbour) = board.get(cell.to_index()) else {
            continue;
        };

        let toward_attacker = (facing + 3) % 6;
        let friendly = neighbour.player == attacker.player;
        for modifier in &neighbour.token.modifiers {
            if !modifier.kind.affects(attack.kind) || neighbour.facing(modifier.angle) != toward_attacker {
                continue;
            }
            if friendly && !modifier.hostile {
                damage += modifier.value;
            } else if !friendly && modifier.hostile {
                damage -= modifier.value;
            }
        }
    }

    damage.max(0) as u32
}

fn resolve_attacks(board: &BoardState, pos: Pos) -> Vec<Hit> {
    let (Some(attacker), Some(origin)) = (board.get(pos), from_index(pos)) else {
        return Vec::new();
    };

    let mut hits = Vec::new();
    for attack in &attacker.token.attacks {
        let damage = attack_damage(board, attacker, origin, attack);
        let facing = attacker.facing(attack.angle);
        for target in attack_targets(board, attacker, origin, attack.kind, facing) {
            hits.push(Hit { target, damage });
        }
    }
    hits
}

/// Friendly neighbours a medic at `pos` can patch up this segment
pub fn heal_targets(board: &BoardState, pos: Pos) -> Vec<Pos> {
    let (Some(medic), Some(origin)) = (board.get(pos), from_index(pos)) else {
        return Vec::new();
    };

    let mut targets = Vec::new();
    for modifier in &medic.token.modifiers {
        if modifier.kind.post_action() != Some(BattleAction::Heal) {
            continue;
        }
        let cell = origin.neighbor(medic.facing(modifier.angle));
        if !cell.is_valid() {
            continue;
        }
        let target = cell.to_index();
        let wounded = board
            .get(target)
            .is_some_and(|hex| hex.player == medic.player && hex.segment_damage > 0);
        if wounded && !targets.contains(&target) {
            targets.push(target);
        }
    }
    targets.sort_unstable();
    targets
}

/// Blow up the unit at `pos`, damaging adjacent enemies
fn detonate(board: &mut BoardState, pos: Pos) {
    let (Some(origin), Some(bomb)) = (from_index(pos), board.remove(pos)) else {
        return;
    };
    for facing in 0..6 {
        let cell = origin.neighbor(facing);
        if !cell.is_valid() {
            continue;
        }
        if let Some(hex) = board.get_mut(cell.to_index()) {
            if hex.player != bomb.player {
                hex.take_damage(1);
            }
        }
    }
    tracing::debug!(pos, "detonated");
}

/// Cancel this segment's damage on `target`, consuming the medic
fn heal(board: &mut BoardState, medic: Pos, target: Pos) {
    if let Some(hex) = board.get_mut(target) {
        hex.damage = hex.damage.saturating_sub(hex.segment_damage);
        hex.segment_damage = 0;
    }
    board.remove(medic);
    tracing::debug!(medic, target, "healed");
}

fn perform(board: &mut BoardState, action: BattleAction, at: Pos, on: Option<Pos>) -> Result<(), InvalidMove> {
    match action {
        BattleAction::Detonate => detonate(board, at),
        BattleAction::Heal => {
            let target = on
                .filter(|t| heal_targets(board, at).contains(t))
                .ok_or(InvalidMove::InvalidTarget)?;
            heal(board, at, target);
        }
    }
    Ok(())
}

// ============================================================================
// INTERACTIVE MOVES
// ============================================================================

/// Trigger a queued unit's pre-action
pub fn battle_pre_action(state: &mut GameState, ctx: &Ctx, at: Pos, on: Option<Pos>) -> Result<(), InvalidMove> {
    interactive_action(state, ctx, BattleStage::PreActions, at, on)
}

/// Trigger a queued unit's post-action
pub fn battle_post_action(state: &mut GameState, ctx: &Ctx, at: Pos, on: Option<Pos>) -> Result<(), InvalidMove> {
    interactive_action(state, ctx, BattleStage::PostActions, at, on)
}

fn interactive_action(
    state: &mut GameState,
    ctx: &Ctx,
    stage: BattleStage,
    at: Pos,
    on: Option<Pos>,
) -> Result<(), InvalidMove> {
    let player = ctx.current_player;
    let GameState { battle, board, players, .. } = state;

    let battle = battle
        .as_mut()
        .filter(|b| b.stage == stage)
        .ok_or(InvalidMove::NoBattleStage)?;
    let queue = match stage {
        BattleStage::PostActions => &mut battle.post_actions,
        BattleStage::PreActions | BattleStage::Prepare => &mut battle.pre_actions,
    };
    if !queue.contains(&at) {
        return Err(InvalidMove::NotQueued);
    }
    let hex = board.get(at).ok_or(InvalidMove::EmptyCell)?;
    if hex.player != player {
        return Err(InvalidMove::NotOwner);
    }
    let offered = match stage {
        BattleStage::PostActions => post_actions_of(hex),
        BattleStage::PreActions | BattleStage::Prepare => pre_actions_of(hex),
    };
    let action = offered.first().copied().ok_or(InvalidMove::NoBattleAction)?;

    perform(board, action, at, on)?;

    queue.retain(|&pos| pos != at);
    if let Some(record) = players.get_mut(player) {
        record.turn_ended = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Events, Phase};
    use crate::coords::to_index;
    use crate::token::Token;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn unit(player: PlayerId, json: serde_json::Value) -> Hex {
        Hex::new(player, "test", Token::from_def(&serde_json::from_value(json).unwrap()).unwrap())
    }

    fn place(board: &mut BoardState, x: i32, y: i32, rotation: u8, mut hex: Hex) -> Pos {
        let pos = to_index(x, y);
        hex.rotation = rotation;
        assert!(board.put(pos, hex));
        pos
    }

    fn dummy(player: PlayerId, health: u32) -> Hex {
        unit(player, serde_json::json!({ "id": "dummy", "health": health }))
    }

    /// Run one full segment with no interactive choices
    fn run_one(battle: &mut Battle, board: &mut BoardState) -> Vec<Pos> {
        assert!(battle.prepare_segment(board));
        battle.run_segment(board);
        battle.finish_segment(board)
    }

    #[test]
    fn test_start_takes_highest_initiative() {
        let mut board = BoardState::new();
        let mut veteran = unit(0, serde_json::json!({ "id": "v", "initiative": [1, 4] }));
        veteran.damaged_in_battle = true;
        place(&mut board, 2, 4, 0, veteran);
        place(&mut board, 2, 2, 0, unit(1, serde_json::json!({ "id": "w", "initiative": 2 })));

        let battle = Battle::start(&mut board, 1);
        assert_eq!(battle.initiative, 4);
        assert_eq!(battle.initiator, 1);
        assert_eq!(battle.stage, BattleStage::Prepare);
        assert!(!board.get(to_index(2, 4)).unwrap().damaged_in_battle);
    }

    #[test]
    fn test_lone_unit_single_segment() {
        let mut board = BoardState::new();
        let hq = unit(0, serde_json::json!({ "id": "hq", "hq": true, "health": 20, "initiative": 5,
            "attacks": [ { "type": "melee", "angle": -1 } ] }));
        place(&mut board, 2, 4, 0, hq);

        let mut battle = Battle::start(&mut board, 0);
        assert_eq!(battle.initiative, 5);

        assert!(battle.prepare_segment(&mut board));
        assert_eq!(battle.initiative, 5);
        assert_eq!(battle.segment_units(), vec![to_index(2, 4)]);
        battle.run_segment(&mut board);
        assert!(battle.finish_segment(&mut board).is_empty());

        // Segments 4 down to 0 are empty and skipped
        assert!(!battle.prepare_segment(&mut board));
        assert_eq!(battle.initiative, -1);
        assert!(battle.is_over());
        assert_eq!(board.get(to_index(2, 4)).unwrap().damage, 0);
    }

    #[test]
    fn test_queues_are_row_major() {
        let mut board = BoardState::new();
        let a = place(&mut board, 4, 6, 0, unit(0, serde_json::json!({ "id": "a", "initiative": 2 })));
        let b = place(&mut board, 1, 1, 0, unit(1, serde_json::json!({ "id": "b", "initiative": 2 })));
        let c = place(&mut board, 0, 6, 0, unit(0, serde_json::json!({ "id": "c", "initiative": 2 })));
        let bomber = place(&mut board, 3, 3, 0, unit(1, serde_json::json!({ "id": "bomb", "initiative": 2,
            "abilities": [ { "type": "grenade" } ] })));

        let mut battle = Battle::start(&mut board, 0);
        assert!(battle.prepare_segment(&mut board));
        assert_eq!(battle.actions, vec![b, c, a]);
        assert_eq!(battle.pre_actions, vec![bomber]);
        assert_eq!(battle.segment_units(), vec![b, bomber, c, a]);
        assert_eq!(battle.players_with_pre_actions(&board, 2), vec![1]);
    }

    #[test]
    fn test_action_passes_start_at_seat_zero() {
        let mut board = BoardState::new();
        place(&mut board, 2, 2, 0, unit(1, serde_json::json!({ "id": "b1", "initiative": 2,
            "abilities": [ { "type": "grenade" } ] })));
        place(&mut board, 2, 6, 0, unit(0, serde_json::json!({ "id": "b0", "initiative": 2,
            "abilities": [ { "type": "grenade" } ] })));

        let mut battle = Battle::start(&mut board, 1);
        assert!(battle.prepare_segment(&mut board));
        assert_eq!(battle.initiator, 1);
        assert_eq!(battle.players_with_pre_actions(&board, 2), vec![0, 1]);
        assert_eq!(battle.players_with_pre_actions(&board, 3), vec![0, 1]);
    }

    #[test]
    fn test_melee_hits_enemies_only() {
        let mut board = BoardState::new();
        place(&mut board, 2, 4, 0, unit(0, serde_json::json!({ "id": "hq", "initiative": 1,
            "attacks": [ { "type": "melee", "angle": -1 } ] })));
        let enemy = place(&mut board, 2, 2, 0, dummy(1, 1));
        let friend = place(&mut board, 3, 5, 0, dummy(0, 1));

        let mut battle = Battle::start(&mut board, 0);
        let removed = run_one(&mut battle, &mut board);
        assert_eq!(removed, vec![enemy]);
        assert_eq!(board.get(friend).unwrap().damage, 0);
        assert!(board.get(to_index(2, 4)).unwrap().attacked_in_battle);
    }

    #[test]
    fn test_rotation_turns_attacks() {
        let mut board = BoardState::new();
        place(&mut board, 2, 4, 3, unit(0, serde_json::json!({ "id": "m", "initiative": 1,
            "attacks": [ { "type": "melee", "angle": 0 } ] })));
        let ahead = place(&mut board, 2, 2, 0, dummy(1, 5));
        let behind = place(&mut board, 2, 6, 0, dummy(1, 5));

        let mut battle = Battle::start(&mut board, 0);
        run_one(&mut battle, &mut board);
        assert_eq!(board.get(ahead).unwrap().damage, 0);
        assert_eq!(board.get(behind).unwrap().damage, 1);
    }

    #[test]
    fn test_ranged_and_gauss_lines() {
        let build = |kind: &str, shield_rotation: u8| {
            let mut board = BoardState::new();
            place(&mut board, 2, 8, 0, unit(0, serde_json::json!({ "id": "gun", "initiative": 1,
                "attacks": [ { "type": kind } ] })));
            place(&mut board, 2, 6, 0, dummy(0, 5));
            let mut first = unit(1, serde_json::json!({ "id": "wall", "health": 5, "shields": [3] }));
            first.rotation = shield_rotation;
            board.put(to_index(2, 4), first);
            place(&mut board, 2, 2, 0, dummy(1, 5));
            let mut battle = Battle::start(&mut board, 0);
            run_one(&mut battle, &mut board);
            [to_index(2, 6), to_index(2, 4), to_index(2, 2)].map(|p| board.get(p).unwrap().damage)
        };

        // Shield facing the shooter blocks ranged fire
        assert_eq!(build("ranged", 0), [0, 0, 0]);
        assert_eq!(build("ranged", 1), [0, 1, 0]);
        // Gauss passes through everything and ignores shields
        assert_eq!(build("gauss", 0), [0, 1, 1]);
    }

    #[test]
    fn test_modifiers_adjust_damage() {
        let mut board = BoardState::new();
        place(&mut board, 2, 4, 0, unit(0, serde_json::json!({ "id": "m", "initiative": 1,
            "attacks": [ { "type": "melee", "angle": 0 } ] })));
        let target = place(&mut board, 2, 2, 0, dummy(1, 5));
        // Officer below points up at the attacker
        place(&mut board, 2, 6, 0, unit(0, serde_json::json!({ "id": "officer",
            "modifiers": [ { "type": "melee", "value": 2, "angle": 0 } ] })));

        let mut battle = Battle::start(&mut board, 0);
        run_one(&mut battle, &mut board);
        assert_eq!(board.get(target).unwrap().damage, 3);

        // An enemy jammer pointing at the attacker takes one back
        place(&mut board, 1, 3, 0, unit(1, serde_json::json!({ "id": "jammer",
            "modifiers": [ { "type": "melee", "value": 1, "hostile": true, "angle": 2 } ] })));
        // A ranged booster does not affect melee
        place(&mut board, 3, 5, 0, unit(0, serde_json::json!({ "id": "scope",
            "modifiers": [ { "type": "ranged", "value": 4, "angle": -1 } ] })));
        board.get_mut(target).unwrap().damage = 0;
        let mut battle = Battle::start(&mut board, 0);
        run_one(&mut battle, &mut board);
        assert_eq!(board.get(target).unwrap().damage, 2);
    }

    #[test]
    fn test_simultaneous_kills() {
        let mut board = BoardState::new();
        let a = place(&mut board, 2, 4, 0, unit(0, serde_json::json!({ "id": "a", "initiative": 1,
            "attacks": [ { "type": "melee", "angle": 0 } ] })));
        let b = place(&mut board, 2, 2, 0, unit(1, serde_json::json!({ "id": "b", "initiative": 1,
            "attacks": [ { "type": "melee", "angle": 3 } ] })));

        let mut battle = Battle::start(&mut board, 0);
        assert_eq!(run_one(&mut battle, &mut board), vec![b, a]);
        assert_eq!(board.unit_count(), 0);
    }

    #[test]
    fn test_higher_initiative_strikes_first() {
        let mut board = BoardState::new();
        let fast = place(&mut board, 2, 4, 0, unit(0, serde_json::json!({ "id": "fast", "initiative": 3,
            "attacks": [ { "type": "melee", "angle": 0 } ] })));
        let slow = place(&mut board, 2, 2, 0, unit(1, serde_json::json!({ "id": "slow", "initiative": 1,
            "attacks": [ { "type": "melee", "angle": 3 } ] })));

        let mut battle = Battle::start(&mut board, 0);
        assert_eq!(run_one(&mut battle, &mut board), vec![slow]);
        assert!(!battle.prepare_segment(&mut board));
        assert_eq!(board.get(fast).unwrap().damage, 0);
    }

    fn with_ctx<T>(player: PlayerId, f: impl FnOnce(&Ctx) -> T) -> T {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut events = Events::new();
        let ctx = Ctx {
            current_player: player,
            num_players: 2,
            turn: 1,
            phase: Phase::Battle,
            random: &mut rng,
            events: &mut events,
        };
        f(&ctx)
    }

    #[test]
    fn test_grenade_pre_action() {
        let mut state = GameState::new(2);
        let bomber = place(&mut state.board, 2, 4, 0, unit(0, serde_json::json!({ "id": "bomber",
            "initiative": 2, "attacks": [ { "type": "melee" } ], "abilities": [ { "type": "grenade" } ] })));
        let e1 = place(&mut state.board, 2, 2, 0, dummy(1, 2));
        let e2 = place(&mut state.board, 3, 5, 0, dummy(1, 2));
        let friend = place(&mut state.board, 1, 5, 0, dummy(0, 2));

        let mut battle = Battle::start(&mut state.board, 0);
        assert!(battle.prepare_segment(&mut state.board));
        state.battle = Some(battle);

        // Wrong player, then an unqueued unit
        assert_eq!(with_ctx(1, |ctx| battle_pre_action(&mut state, ctx, bomber, None)), Err(InvalidMove::NotOwner));
        assert_eq!(with_ctx(0, |ctx| battle_pre_action(&mut state, ctx, friend, None)), Err(InvalidMove::NotQueued));
        assert_eq!(
            with_ctx(0, |ctx| battle_post_action(&mut state, ctx, bomber, None)),
            Err(InvalidMove::NoBattleStage)
        );

        with_ctx(0, |ctx| battle_pre_action(&mut state, ctx, bomber, None)).unwrap();
        assert!(state.players[0].turn_ended);
        assert!(state.board.is_empty_at(bomber));
        assert_eq!(state.board.get(e1).unwrap().damage, 1);
        assert_eq!(state.board.get(e2).unwrap().damage, 1);
        assert_eq!(state.board.get(friend).unwrap().damage, 0);

        let battle = state.battle.as_mut().unwrap();
        assert!(battle.pre_actions.is_empty());
        // The bomber is gone, so nothing attacks
        battle.run_segment(&mut state.board);
        assert_eq!(state.board.get(e1).unwrap().damage, 1);
    }

    #[test]
    fn test_undetonated_bomber_still_attacks() {
        let mut board = BoardState::new();
        place(&mut board, 2, 4, 0, unit(0, serde_json::json!({ "id": "bomber",
            "initiative": 2, "attacks": [ { "type": "melee" } ], "abilities": [ { "type": "grenade" } ] })));
        let enemy = place(&mut board, 2, 2, 0, dummy(1, 2));

        let mut battle = Battle::start(&mut board, 0);
        run_one(&mut battle, &mut board);
        assert_eq!(board.get(enemy).unwrap().damage, 1);
    }

    #[test]
    fn test_medic_post_action() {
        let mut state = GameState::new(2);
        place(&mut state.board, 2, 2, 0, unit(0, serde_json::json!({ "id": "m", "initiative": 1,
            "attacks": [ { "type": "melee", "angle": 3 } ] })));
        let patient = place(&mut state.board, 2, 4, 0, dummy(1, 1));
        let medic = place(&mut state.board, 2, 6, 0, unit(1, serde_json::json!({ "id": "medic",
            "modifiers": [ { "type": "medic", "angle": -1 } ] })));

        let mut battle = Battle::start(&mut state.board, 0);
        assert!(battle.prepare_segment(&mut state.board));
        battle.run_segment(&mut state.board);
        assert_eq!(battle.post_actions, vec![medic]);
        assert_eq!(battle.players_with_post_actions(&state.board, 2), vec![1]);
        assert_eq!(heal_targets(&state.board, medic), vec![patient]);
        state.battle = Some(battle);

        assert_eq!(
            with_ctx(1, |ctx| battle_post_action(&mut state, ctx, medic, Some(to_index(2, 2)))),
            Err(InvalidMove::InvalidTarget)
        );
        assert_eq!(state.board.get(patient).unwrap().damage, 1);

        with_ctx(1, |ctx| battle_post_action(&mut state, ctx, medic, Some(patient))).unwrap();
        assert_eq!(state.board.get(patient).unwrap().damage, 0);
        assert!(state.board.is_empty_at(medic));

        let battle = state.battle.as_mut().unwrap();
        assert!(battle.finish_segment(&mut state.board).is_empty());
        assert!(state.board.get(patient).is_some());
    }

    #[test]
    fn test_post_actions_queue_row_major() {
        let mut board = BoardState::new();
        let medic = || unit(1, serde_json::json!({ "id": "medic", "modifiers": [ { "type": "medic", "angle": -1 } ] }));
        let south_medic = place(&mut board, 2, 8, 0, medic());
        let north_medic = place(&mut board, 2, 0, 0, medic());
        let north = place(&mut board, 2, 2, 0, dummy(1, 2));
        let south = place(&mut board, 2, 6, 0, dummy(1, 2));
        place(&mut board, 2, 4, 0, unit(0, serde_json::json!({ "id": "m", "initiative": 1,
            "attacks": [ { "type": "melee", "angle": -1 } ] })));

        let mut battle = Battle::start(&mut board, 0);
        assert!(battle.prepare_segment(&mut board));
        battle.run_segment(&mut board);

        assert!(north_medic < south_medic);
        assert_eq!(battle.post_actions, vec![north_medic, south_medic]);
        assert_eq!(heal_targets(&board, north_medic), vec![north]);
        assert_eq!(heal_targets(&board, south_medic), vec![south]);
        assert_eq!(battle.players_with_post_actions(&board, 2), vec![1]);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let mut board = BoardState::new();
        for (i, c) in crate::coords::board_hexes().enumerate() {
            let kind = if i % 3 == 0 { "ranged" } else { "melee" };
            let json = serde_json::json!({ "id": "u", "health": 2, "initiative": (i % 4) as u32,
                "attacks": [ { "type": kind, "angle": (i % 6) as i32 } ] });
            let mut hex = unit(i % 2, json);
            hex.rotation = (i % 5) as u8;
            board.put(c.to_index(), hex);
        }

        let resolve = |mut board: BoardState| {
            let mut battle = Battle::start(&mut board, 1);
            let mut log = Vec::new();
            while battle.prepare_segment(&mut board) {
                battle.run_segment(&mut board);
                log.push(battle.finish_segment(&mut board));
            }
            (board, log)
        };
        assert_eq!(resolve(board.clone()), resolve(board));
    }
}
