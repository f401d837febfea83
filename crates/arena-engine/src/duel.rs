//! Scripted two-player duel.
//!
//! Spawns (or reuses) one beast per player, restores them, and plays turns
//! with each side's strongest favored attack until someone wins or the
//! turn limit runs out.

use arena_common::{Address, BattleId, BeastId, ExecutionContext};
use arena_gameplay::{AttackType, BattleParams, BattleType, BeastType};
use arena_world::{ArenaError, ArenaResult, ArenaSystem};
use tracing::info;

use crate::config::ArenaConfig;

/// One side of the scripted duel.
#[derive(Debug, Clone, Copy)]
pub struct Contender {
    /// Player address.
    pub player: Address,
    /// Beast the player fights with.
    pub beast_id: BeastId,
    /// Element of a newly spawned beast.
    pub beast_type: BeastType,
}

/// Default contenders.
pub const CONTENDERS: [Contender; 2] = [
    Contender {
        player: Address::new(0xA11CE),
        beast_id: BeastId::new(1),
        beast_type: BeastType::Light,
    },
    Contender {
        player: Address::new(0xB0B),
        beast_id: BeastId::new(2),
        beast_type: BeastType::Shadow,
    },
];

/// How a duel ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuelSummary {
    /// Battle the duel was played in.
    pub battle_id: BattleId,
    /// Attack actions taken.
    pub turns: u32,
    /// Winner, if the duel finished within the turn limit.
    pub winner: Option<Address>,
}

/// Strongest attack in `beast_type`'s favored set.
#[must_use]
pub fn pick_attack(beast_type: BeastType) -> AttackType {
    AttackType::ALL
        .into_iter()
        .filter(|attack| attack.favored_type() == beast_type && beast_type != BeastType::Undefined)
        .max_by_key(|attack| attack.base_power())
        .unwrap_or_default()
}

/// Plays one duel between `contenders`, starting at `start`.
pub fn run_duel(
    system: &ArenaSystem,
    config: &ArenaConfig,
    contenders: [Contender; 2],
    start: ExecutionContext,
) -> ArenaResult<DuelSummary> {
    let mut ctx = start;

    for side in contenders {
        let as_owner = ctx.with_caller(side.player);
        let level = config.starting_level;
        match system.spawn_beast(&as_owner, side.beast_id, side.beast_type, level) {
            Ok(_) | Err(ArenaError::BeastExists(_)) => {},
            Err(e) => return Err(e),
        }
        system.restore_beast(&as_owner, side.beast_id)?;
    }

    let host = ctx.with_caller(contenders[0].player);
    let battle_id = system.create_battle(&host, BattleParams::new(BattleType::Friendly))?;
    for side in contenders {
        system.join_battle(&ctx.with_caller(side.player), battle_id, side.beast_id)?;
    }
    system.start_battle(&host, battle_id)?;
    info!(battle = %battle_id, "duel started");

    let mut turns = 0;
    while turns < config.max_turns {
        ctx = ctx.advance(config.block_time_secs);
        let battle = system.battle(battle_id)?;
        let mover = battle.current_turn();
        let beast_id = battle
            .slot_of(mover)
            .map(|slot| slot.beast_id)
            .unwrap_or_default();
        let attack = pick_attack(system.beast(mover, beast_id)?.beast_type);

        let outcome = system.attack(&ctx.with_caller(mover), battle_id, attack)?;
        turns += 1;
        info!(
            turn = turns,
            attacker = %mover,
            ?attack,
            damage = outcome.damage,
            defender_hp = outcome.defender_hp,
            skipped = outcome.skipped,
            "turn played"
        );

        if let Some(winner) = outcome.winner {
            info!(battle = %battle_id, %winner, turns, "duel won");
            return Ok(DuelSummary {
                battle_id,
                turns,
                winner: Some(winner),
            });
        }
    }

    info!(battle = %battle_id, turns, "turn limit reached");
    Ok(DuelSummary {
        battle_id,
        turns,
        winner: None,
    })
}
