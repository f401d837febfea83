//! Transactional battle actions.
//!
//! Every action runs under the key locks of the records it touches, stages
//! its writes in a [`Transaction`], and commits only once every step has
//! succeeded. A failed action leaves the store untouched.

use arena_common::{Address, BattleId, BeastId, ExecutionContext};
use arena_gameplay::{
    adjust_damage_for_status, AttackType, Battle, BattleError, BattleParams, BattleStatus, Beast,
    BeastStats, BeastType, PlayerSlot, RandomError, StatusCondition,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::locks::{lock_all, KeyLocks, LockKey};
use crate::record::BattleCounter;
use crate::store::{Store, StoreError, Transaction, WorldStore};

/// Experience awarded to the winning beast.
pub const EXPERIENCE_PER_WIN: u16 = 50;

/// Action errors.
#[derive(Debug, Error)]
pub enum ArenaError {
    /// Battle state machine rejected the operation
    #[error(transparent)]
    Battle(#[from] BattleError),

    /// Stat roll failed
    #[error(transparent)]
    Random(#[from] RandomError),

    /// Storage failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No battle under this id
    #[error("{0} not found")]
    BattleNotFound(BattleId),

    /// No beast under this id
    #[error("beast {0} not found")]
    BeastNotFound(BeastId),

    /// Beast id already spawned
    #[error("beast {0} already exists")]
    BeastExists(BeastId),

    /// Caller does not hold the turn
    #[error("not {0}'s turn")]
    NotYourTurn(Address),

    /// Player does not own the beast
    #[error("{player} does not own beast {beast}")]
    NotBeastOwner {
        /// Player claiming the beast
        player: Address,
        /// Beast claimed
        beast: BeastId,
    },
}

/// Result type for actions.
pub type ArenaResult<T> = Result<T, ArenaError>;

/// What happened during one attack action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Player who moved.
    pub attacker: Address,
    /// Attack used.
    pub attack_type: AttackType,
    /// Paralysis cost the attacker its move.
    pub skipped: bool,
    /// Hit points actually removed from the defender.
    pub damage: u16,
    /// Attack was in the attacker's favored set.
    pub is_favored: bool,
    /// Matchup was super effective.
    pub is_super_effective: bool,
    /// Status newly left on the defender.
    pub inflicted: Option<StatusCondition>,
    /// Defender's hit points after the hit.
    pub defender_hp: u16,
    /// Set when this attack ended the battle.
    pub winner: Option<Address>,
    /// Levels the attacker gained from the win.
    pub levels_gained: u8,
}

impl AttackOutcome {
    fn skipped(attacker: Address, attack_type: AttackType, defender_hp: u16) -> Self {
        Self {
            attacker,
            attack_type,
            skipped: true,
            damage: 0,
            is_favored: false,
            is_super_effective: false,
            inflicted: None,
            defender_hp,
            winner: None,
            levels_gained: 0,
        }
    }
}

/// Applies battle actions to a [`WorldStore`].
#[derive(Debug, Default)]
pub struct ArenaSystem {
    store: WorldStore,
    locks: KeyLocks,
}

impl ArenaSystem {
    /// Creates a system over `store`.
    #[must_use]
    pub fn new(store: WorldStore) -> Self {
        Self {
            store,
            locks: KeyLocks::new(),
        }
    }

    /// Underlying store.
    #[must_use]
    pub fn store(&self) -> &WorldStore {
        &self.store
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Reads a battle.
    pub fn battle(&self, battle_id: BattleId) -> ArenaResult<Battle> {
        self.store
            .read::<Battle>(&battle_id)?
            .ok_or(ArenaError::BattleNotFound(battle_id))
    }

    /// Reads a beast's stats.
    pub fn beast_stats(&self, beast_id: BeastId) -> ArenaResult<BeastStats> {
        self.store
            .read::<BeastStats>(&beast_id)?
            .ok_or(ArenaError::BeastNotFound(beast_id))
    }

    /// Reads a beast owned by `player`.
    ///
    /// Fails with `NotBeastOwner` if the beast exists under someone else.
    pub fn beast(&self, player: Address, beast_id: BeastId) -> ArenaResult<Beast> {
        if let Some(beast) = self.store.read::<Beast>(&(player, beast_id))? {
            return Ok(beast);
        }
        if self.store.read::<BeastStats>(&beast_id)?.is_some() {
            return Err(ArenaError::NotBeastOwner {
                player,
                beast: beast_id,
            });
        }
        Err(ArenaError::BeastNotFound(beast_id))
    }

    // ========================================================================
    // Beasts
    // ========================================================================

    /// Spawns a beast owned by the caller, rolling its stats.
    pub fn spawn_beast(
        &self,
        ctx: &ExecutionContext,
        beast_id: BeastId,
        beast_type: BeastType,
        level: u8,
    ) -> ArenaResult<(Beast, BeastStats)> {
        self.locked("spawn_beast", &[LockKey::Beast(beast_id)], |tx| {
            if ctx.caller.is_zero() {
                return Err(BattleError::ZeroAddress.into());
            }
            if !beast_id.is_valid() {
                return Err(BattleError::InvalidBeastId.into());
            }
            if self.store.read::<BeastStats>(&beast_id)?.is_some() {
                return Err(ArenaError::BeastExists(beast_id));
            }

            let beast = Beast::new(ctx.caller, beast_id, beast_type).with_level(level);
            let stats = BeastStats::new(ctx, beast_id, beast_type, beast.level)?;
            tx.stage(&beast)?;
            tx.stage(&stats)?;
            info!(
                owner = %ctx.caller,
                beast = %beast_id,
                %beast_type,
                level = beast.level,
                "beast spawned"
            );
            Ok((beast, stats))
        })
    }

    /// Heals one of the caller's beasts. Returns hit points restored.
    pub fn heal_beast(
        &self,
        ctx: &ExecutionContext,
        beast_id: BeastId,
        amount: u16,
    ) -> ArenaResult<u16> {
        self.locked("heal_beast", &[LockKey::Beast(beast_id)], |tx| {
            self.beast(ctx.caller, beast_id)?;
            let mut stats = self.beast_stats(beast_id)?;
            let restored = stats.heal(amount, ctx.timestamp);
            tx.stage(&stats)?;
            debug!(beast = %beast_id, restored, hp = stats.current_hp, "beast healed");
            Ok(restored)
        })
    }

    /// Heals one of the caller's beasts to full and clears its status.
    /// Returns the beast's hit points afterwards.
    pub fn restore_beast(&self, ctx: &ExecutionContext, beast_id: BeastId) -> ArenaResult<u16> {
        self.locked("restore_beast", &[LockKey::Beast(beast_id)], |tx| {
            self.beast(ctx.caller, beast_id)?;
            let mut stats = self.beast_stats(beast_id)?;
            stats.heal(stats.max_hp, ctx.timestamp);
            stats.clear_status(ctx.timestamp);
            tx.stage(&stats)?;
            debug!(beast = %beast_id, hp = stats.current_hp, "beast restored");
            Ok(stats.current_hp)
        })
    }

    // ========================================================================
    // Battle lifecycle
    // ========================================================================

    /// Creates a waiting battle and returns its id.
    ///
    /// Pre-filled slots must name beasts their players own.
    pub fn create_battle(
        &self,
        ctx: &ExecutionContext,
        params: BattleParams,
    ) -> ArenaResult<BattleId> {
        self.locked("create_battle", &[LockKey::Counter], |tx| {
            let battle_id = self.allocate_battle_id(tx)?;
            let battle = Battle::new(battle_id, params)?;
            for slot in [params.player1, params.player2].into_iter().flatten() {
                self.beast(slot.player, slot.beast_id)?;
            }
            tx.stage(&battle)?;
            info!(
                creator = %ctx.caller,
                battle = %battle_id,
                battle_type = ?params.battle_type,
                "battle created"
            );
            Ok(battle_id)
        })
    }

    /// Adds the caller with one of their beasts.
    pub fn join_battle(
        &self,
        ctx: &ExecutionContext,
        battle_id: BattleId,
        beast_id: BeastId,
    ) -> ArenaResult<()> {
        self.locked("join_battle", &[LockKey::Battle(battle_id)], |tx| {
            let mut battle = self.battle(battle_id)?;
            let slot = PlayerSlot::new(ctx.caller, beast_id);
            if !slot.is_valid() {
                return Err(BattleError::InvalidPlayerParams.into());
            }
            self.beast(ctx.caller, beast_id)?;
            battle.add_player(slot)?;
            tx.stage(&battle)?;
            Ok(())
        })
    }

    /// Chooses who moves first. Only a participant may ask.
    pub fn set_turn(
        &self,
        ctx: &ExecutionContext,
        battle_id: BattleId,
        player: Address,
    ) -> ArenaResult<()> {
        self.update_battle("set_turn", ctx, battle_id, |battle| battle.set_turn(player))
    }

    /// Starts a battle with two players. Only a participant may ask.
    pub fn start_battle(&self, ctx: &ExecutionContext, battle_id: BattleId) -> ArenaResult<()> {
        self.update_battle("start_battle", ctx, battle_id, |battle| {
            battle.start(ctx.timestamp)
        })
    }

    /// Declares a winner. Only a participant may ask.
    pub fn resolve_battle(
        &self,
        ctx: &ExecutionContext,
        battle_id: BattleId,
        winner: Address,
    ) -> ArenaResult<()> {
        self.update_battle("resolve_battle", ctx, battle_id, |battle| {
            battle.resolve_battle(winner)
        })
    }

    /// Swaps slot `pos` of a tournament battle for `slot`.
    ///
    /// The caller must be the incoming player and own the incoming beast.
    pub fn substitute(
        &self,
        ctx: &ExecutionContext,
        battle_id: BattleId,
        slot: PlayerSlot,
        pos: u8,
    ) -> ArenaResult<()> {
        let keys = [LockKey::Battle(battle_id), LockKey::Beast(slot.beast_id)];
        self.locked("substitute", &keys, |tx| {
            let mut battle = self.battle(battle_id)?;
            if ctx.caller != slot.player {
                return Err(ArenaError::NotBeastOwner {
                    player: ctx.caller,
                    beast: slot.beast_id,
                });
            }
            if slot.is_valid() {
                self.beast(slot.player, slot.beast_id)?;
            }
            battle.sub_player(slot, pos)?;
            tx.stage(&battle)?;
            Ok(())
        })
    }

    /// Performs the caller's move.
    ///
    /// A paralyzed attacker may lose the move, which still passes the turn.
    /// A super-effective hit can leave a status on the defender. Knocking
    /// the defender out resolves the battle and awards experience.
    pub fn attack(
        &self,
        ctx: &ExecutionContext,
        battle_id: BattleId,
        attack_type: AttackType,
    ) -> ArenaResult<AttackOutcome> {
        self.locked("attack", &[LockKey::Battle(battle_id)], |tx| {
            let now = ctx.timestamp;
            let mut battle = self.battle(battle_id)?;
            if battle.status() != BattleStatus::Active {
                return Err(BattleError::NotActive.into());
            }
            if battle.current_turn() != ctx.caller {
                return Err(ArenaError::NotYourTurn(ctx.caller));
            }
            let (own, other) = battle
                .slot_of(ctx.caller)
                .zip(battle.opponent_of(ctx.caller))
                .ok_or(BattleError::PlayerNotInBattle)?;

            let handles = self
                .locks
                .handles(&[LockKey::Beast(own.beast_id), LockKey::Beast(other.beast_id)]);
            let _beasts = lock_all(&handles);

            let mut attacker = self.beast(own.player, own.beast_id)?;
            let mut attacker_stats = self.beast_stats(own.beast_id)?;
            let defender = self.beast(other.player, other.beast_id)?;
            let mut defender_stats = self.beast_stats(other.beast_id)?;

            if !attacker_stats.can_attack(ctx) {
                battle.update(now)?;
                tx.stage(&battle)?;
                info!(battle = %battle_id, player = %ctx.caller, "paralyzed, move lost");
                return Ok(AttackOutcome::skipped(
                    ctx.caller,
                    attack_type,
                    defender_stats.current_hp,
                ));
            }

            let hit = attacker.attack(defender.beast_type, attack_type, attacker_stats.attack);
            let damage = adjust_damage_for_status(hit.damage, attacker_stats.status_condition);
            let dealt = defender_stats.take_damage(damage, now);

            let mut outcome = AttackOutcome {
                attacker: ctx.caller,
                attack_type,
                skipped: false,
                damage: dealt,
                is_favored: hit.is_favored,
                is_super_effective: hit.is_super_effective,
                inflicted: None,
                defender_hp: defender_stats.current_hp,
                winner: None,
                levels_gained: 0,
            };

            if defender_stats.is_defeated() {
                battle.resolve_battle(ctx.caller)?;
                let levels = attacker.gain_experience(EXPERIENCE_PER_WIN);
                for _ in 0..levels {
                    attacker_stats.level_up(attacker.beast_type, now);
                }
                tx.stage(&attacker)?;
                tx.stage(&attacker_stats)?;
                outcome.winner = Some(ctx.caller);
                outcome.levels_gained = levels;
            } else {
                if hit.is_super_effective {
                    if let Some(status) = attack_type.inflicted_status() {
                        defender_stats.apply_status(status, now);
                        outcome.inflicted = Some(status);
                    }
                }
                battle.update(now)?;
            }

            tx.stage(&defender_stats)?;
            tx.stage(&battle)?;
            debug!(
                battle = %battle_id,
                attacker = %ctx.caller,
                ?attack_type,
                damage = dealt,
                defender_hp = defender_stats.current_hp,
                "attack resolved"
            );
            Ok(outcome)
        })
    }

    /// Starts a new battle with the roster of a finished one.
    ///
    /// Only a participant may ask. Both beasts are healed to full and
    /// their status cleared.
    pub fn rematch(&self, ctx: &ExecutionContext, battle_id: BattleId) -> ArenaResult<BattleId> {
        self.locked("rematch", &[LockKey::Battle(battle_id), LockKey::Counter], |tx| {
            let battle = self.battle(battle_id)?;
            if battle.slot_of(ctx.caller).is_none() {
                return Err(BattleError::PlayerNotInBattle.into());
            }
            let new_id = self.allocate_battle_id(tx)?;
            let rematch = battle.rematch(new_id)?;

            let slots = [battle.player1(), battle.player2()];
            let handles = self
                .locks
                .handles(&slots.map(|slot| LockKey::Beast(slot.beast_id)));
            let _beasts = lock_all(&handles);
            for slot in slots {
                let mut stats = self.beast_stats(slot.beast_id)?;
                stats.heal(stats.max_hp, ctx.timestamp);
                stats.clear_status(ctx.timestamp);
                tx.stage(&stats)?;
            }

            tx.stage(&rematch)?;
            info!(from = %battle_id, battle = %new_id, "rematch created");
            Ok(new_id)
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Runs `action` under `keys`, committing its writes on success.
    fn locked<T>(
        &self,
        name: &'static str,
        keys: &[LockKey],
        action: impl FnOnce(&mut Transaction) -> ArenaResult<T>,
    ) -> ArenaResult<T> {
        let handles = self.locks.handles(keys);
        let _guards = lock_all(&handles);

        let mut tx = Transaction::new();
        match action(&mut tx) {
            Ok(value) => {
                self.store.commit(tx);
                Ok(value)
            },
            Err(err) => {
                warn!(action = name, error = %err, "action rejected");
                Err(err)
            },
        }
    }

    /// Applies `op` to a battle the caller takes part in.
    fn update_battle(
        &self,
        name: &'static str,
        ctx: &ExecutionContext,
        battle_id: BattleId,
        op: impl FnOnce(&mut Battle) -> Result<(), BattleError>,
    ) -> ArenaResult<()> {
        self.locked(name, &[LockKey::Battle(battle_id)], |tx| {
            let mut battle = self.battle(battle_id)?;
            if battle.slot_of(ctx.caller).is_none() {
                return Err(BattleError::PlayerNotInBattle.into());
            }
            op(&mut battle)?;
            tx.stage(&battle)?;
            Ok(())
        })
    }

    /// Bumps the battle counter. Caller must hold the counter lock.
    fn allocate_battle_id(&self, tx: &mut Transaction) -> ArenaResult<BattleId> {
        let mut counter = self.store.read::<BattleCounter>(&())?.unwrap_or_default();
        counter.last_id = counter.last_id.next();
        tx.stage(&counter)?;
        Ok(counter.last_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_gameplay::BattleType;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;

    const U1: Address = Address::new(0x11);
    const U2: Address = Address::new(0x22);
    const U3: Address = Address::new(0x33);

    fn ctx(caller: Address) -> ExecutionContext {
        ExecutionContext::new(caller, 1_000, 10)
    }

    /// Spawns a beast and pins its stats.
    fn beast_with(
        system: &ArenaSystem,
        owner: Address,
        id: u32,
        beast_type: BeastType,
        max_hp: u16,
        attack: u16,
    ) -> BeastId {
        let beast_id = BeastId::new(id);
        system
            .spawn_beast(&ctx(owner), beast_id, beast_type, 1)
            .expect("spawn");
        system
            .store()
            .write(&BeastStats::with_values(beast_id, max_hp, attack, 60, 20))
            .expect("pin stats");
        beast_id
    }

    fn started(system: &ArenaSystem, b1: BeastId, b2: BeastId) -> BattleId {
        let params = BattleParams::new(BattleType::Friendly)
            .with_player1(PlayerSlot::new(U1, b1))
            .with_player2(PlayerSlot::new(U2, b2));
        let battle_id = system.create_battle(&ctx(U1), params).expect("create");
        system.start_battle(&ctx(U1), battle_id).expect("start");
        battle_id
    }

    #[test]
    fn test_spawn_beast() {
        let system = ArenaSystem::default();
        let (beast, stats) = system
            .spawn_beast(&ctx(U1), BeastId::new(1), BeastType::Magic, 3)
            .expect("spawn");
        assert_eq!(beast.player, U1);
        assert_eq!(beast.level, 3);
        assert_eq!(stats.current_hp, stats.max_hp);
        assert_eq!(system.beast(U1, BeastId::new(1)).expect("beast"), beast);
        assert_eq!(system.beast_stats(BeastId::new(1)).expect("stats"), stats);
    }

    #[test]
    fn test_spawn_rejects_duplicates_and_bad_ids() {
        let system = ArenaSystem::default();
        system
            .spawn_beast(&ctx(U1), BeastId::new(1), BeastType::Light, 1)
            .expect("spawn");
        assert!(matches!(
            system.spawn_beast(&ctx(U2), BeastId::new(1), BeastType::Light, 1),
            Err(ArenaError::BeastExists(_))
        ));
        assert!(matches!(
            system.spawn_beast(&ctx(U1), BeastId::NULL, BeastType::Light, 1),
            Err(ArenaError::Battle(BattleError::InvalidBeastId))
        ));
        assert!(matches!(
            system.beast(U2, BeastId::new(1)),
            Err(ArenaError::NotBeastOwner { .. })
        ));
        assert!(matches!(
            system.beast(U2, BeastId::new(9)),
            Err(ArenaError::BeastNotFound(_))
        ));
    }

    #[test]
    fn test_battle_ids_are_sequential() {
        let system = ArenaSystem::default();
        let first = system
            .create_battle(&ctx(U1), BattleParams::default())
            .expect("create");
        let second = system
            .create_battle(&ctx(U1), BattleParams::default())
            .expect("create");
        assert_eq!(first, BattleId::new(1));
        assert_eq!(second, BattleId::new(2));
    }

    #[test]
    fn test_failed_action_persists_nothing() {
        let system = ArenaSystem::default();
        let params = BattleParams::default().with_player1(PlayerSlot::new(U1, BeastId::new(7)));
        assert!(matches!(
            system.create_battle(&ctx(U1), params),
            Err(ArenaError::BeastNotFound(_))
        ));
        assert!(system.store().is_empty());

        let next = system
            .create_battle(&ctx(U1), BattleParams::default())
            .expect("create");
        assert_eq!(next, BattleId::new(1));
    }

    #[test]
    fn test_join_requires_ownership() {
        let system = ArenaSystem::default();
        let b1 = beast_with(&system, U1, 1, BeastType::Light, 80, 100);
        let battle_id = system
            .create_battle(&ctx(U1), BattleParams::default())
            .expect("create");

        assert!(matches!(
            system.join_battle(&ctx(U2), battle_id, b1),
            Err(ArenaError::NotBeastOwner { .. })
        ));
        system.join_battle(&ctx(U1), battle_id, b1).expect("join");
        let battle = system.battle(battle_id).expect("battle");
        assert_eq!(battle.player1(), PlayerSlot::new(U1, b1));
        assert_eq!(battle.current_turn(), U1);
    }

    #[test]
    fn test_full_duel() {
        let system = ArenaSystem::default();
        let b1 = beast_with(&system, U1, 1, BeastType::Light, 80, 100);
        let b2 = beast_with(&system, U2, 2, BeastType::Shadow, 60, 100);
        let battle_id = started(&system, b1, b2);

        // 18 + 11 = 29, favored 34, super effective 51
        let first = system
            .attack(&ctx(U1), battle_id, AttackType::Beam)
            .expect("U1 attacks");
        assert_eq!(first.damage, 51);
        assert_eq!(first.defender_hp, 9);
        assert!(first.is_favored && first.is_super_effective);
        assert_eq!(system.battle(battle_id).expect("battle").current_turn(), U2);

        assert!(matches!(
            system.attack(&ctx(U1), battle_id, AttackType::Beam),
            Err(ArenaError::NotYourTurn(_))
        ));

        // 13 + 11 = 24, favored 28, resisted 14
        let reply = system
            .attack(&ctx(U2), battle_id, AttackType::Kick)
            .expect("U2 attacks");
        assert_eq!(reply.damage, 14);
        assert_eq!(system.beast_stats(b1).expect("stats").current_hp, 66);

        let finisher = system
            .attack(&ctx(U1), battle_id, AttackType::Beam)
            .expect("U1 finishes");
        assert_eq!(finisher.damage, 9);
        assert_eq!(finisher.winner, Some(U1));

        let battle = system.battle(battle_id).expect("battle");
        assert_eq!(battle.status(), BattleStatus::Finished);
        assert_eq!(battle.winner(), Some(U1));
        assert_eq!(system.beast(U1, b1).expect("beast").experience, EXPERIENCE_PER_WIN);
        assert!(matches!(
            system.attack(&ctx(U2), battle_id, AttackType::Kick),
            Err(ArenaError::Battle(BattleError::NotActive))
        ));
    }

    #[test]
    fn test_win_levels_up_attacker() {
        let system = ArenaSystem::default();
        let b1 = beast_with(&system, U1, 1, BeastType::Light, 80, 100);
        let b2 = beast_with(&system, U2, 2, BeastType::Shadow, 40, 100);
        let mut veteran = system.beast(U1, b1).expect("beast");
        veteran.experience = 60;
        system.store().write(&veteran).expect("write");
        let battle_id = started(&system, b1, b2);

        let outcome = system
            .attack(&ctx(U1), battle_id, AttackType::Beam)
            .expect("knockout");
        assert_eq!(outcome.winner, Some(U1));
        assert_eq!(outcome.levels_gained, 1);

        let beast = system.beast(U1, b1).expect("beast");
        assert_eq!(beast.level, 2);
        assert_eq!(beast.experience, 10);
        let stats = system.beast_stats(b1).expect("stats");
        assert_eq!(stats.attack, 102);
        assert_eq!(stats.max_hp, 83);
        assert_eq!(stats.current_hp, 83);
    }

    #[test]
    fn test_super_effective_burn_inflicts_status() {
        let system = ArenaSystem::default();
        let b1 = beast_with(&system, U1, 1, BeastType::Magic, 100, 100);
        let b2 = beast_with(&system, U2, 2, BeastType::Light, 100, 100);
        let battle_id = started(&system, b1, b2);

        // 16 + 11 = 27, favored 32, super effective 48
        let burn = system
            .attack(&ctx(U1), battle_id, AttackType::Burn)
            .expect("burn");
        assert_eq!(burn.damage, 48);
        assert_eq!(burn.inflicted, Some(StatusCondition::Burned));
        assert_eq!(
            system.beast_stats(b2).expect("stats").status_condition,
            StatusCondition::Burned
        );

        // 29, favored 34, resisted 17, burned 12
        let weakened = system
            .attack(&ctx(U2), battle_id, AttackType::Beam)
            .expect("reply");
        assert_eq!(weakened.damage, 12);
        assert_eq!(weakened.inflicted, None);
    }

    #[test]
    fn test_paralysis_can_cost_the_move() {
        let system = ArenaSystem::default();
        let b1 = beast_with(&system, U1, 1, BeastType::Light, 80, 100);
        let b2 = beast_with(&system, U2, 2, BeastType::Shadow, 60, 100);
        let mut stats = system.beast_stats(b1).expect("stats");
        stats.apply_status(StatusCondition::Paralyzed, 0);
        system.store().write(&stats).expect("write");
        let battle_id = started(&system, b1, b2);

        let stuck = (1..2_000)
            .map(|t| ExecutionContext::new(U1, t, t))
            .find(|c| !stats.can_attack(c))
            .expect("some block rolls paralysis");

        let outcome = system
            .attack(&stuck, battle_id, AttackType::Beam)
            .expect("turn passes");
        assert!(outcome.skipped);
        assert_eq!(outcome.damage, 0);
        assert_eq!(system.beast_stats(b2).expect("stats").current_hp, 60);
        assert_eq!(system.battle(battle_id).expect("battle").current_turn(), U2);
    }

    #[test]
    fn test_rematch_heals_both_beasts() {
        let system = ArenaSystem::default();
        let b1 = beast_with(&system, U1, 1, BeastType::Light, 80, 100);
        let b2 = beast_with(&system, U2, 2, BeastType::Shadow, 60, 100);
        let battle_id = started(&system, b1, b2);

        assert!(matches!(
            system.rematch(&ctx(U1), battle_id),
            Err(ArenaError::Battle(BattleError::NotFinished))
        ));
        system.attack(&ctx(U1), battle_id, AttackType::Beam).expect("hit");
        system.resolve_battle(&ctx(U1), battle_id, U1).expect("resolve");

        assert!(matches!(
            system.rematch(&ctx(U3), battle_id),
            Err(ArenaError::Battle(BattleError::PlayerNotInBattle))
        ));
        let next = system.rematch(&ctx(U2), battle_id).expect("rematch");
        assert_ne!(next, battle_id);

        let rematch = system.battle(next).expect("battle");
        assert_eq!(rematch.status(), BattleStatus::Waiting);
        assert_eq!(rematch.player1(), PlayerSlot::new(U1, b1));
        let healed = system.beast_stats(b2).expect("stats");
        assert_eq!(healed.current_hp, healed.max_hp);
        assert_eq!(healed.status_condition, StatusCondition::None);
    }

    #[test]
    fn test_substitute_checks_ownership() {
        let system = ArenaSystem::default();
        let b1 = beast_with(&system, U1, 1, BeastType::Light, 80, 100);
        let b2 = beast_with(&system, U2, 2, BeastType::Shadow, 60, 100);
        let b3 = beast_with(&system, U3, 3, BeastType::Magic, 70, 100);
        let params = BattleParams::new(BattleType::Tournament)
            .with_player1(PlayerSlot::new(U1, b1))
            .with_player2(PlayerSlot::new(U2, b2));
        let battle_id = system.create_battle(&ctx(U1), params).expect("create");
        system.start_battle(&ctx(U1), battle_id).expect("start");

        assert!(matches!(
            system.substitute(&ctx(U3), battle_id, PlayerSlot::new(U3, b1), 0),
            Err(ArenaError::NotBeastOwner { .. })
        ));
        assert!(matches!(
            system.substitute(&ctx(U1), battle_id, PlayerSlot::new(U3, b3), 0),
            Err(ArenaError::NotBeastOwner { .. })
        ));
        assert_eq!(
            system.battle(battle_id).expect("battle").player1(),
            PlayerSlot::new(U1, b1)
        );
        system
            .substitute(&ctx(U3), battle_id, PlayerSlot::new(U3, b3), 0)
            .expect("substitute");
        let battle = system.battle(battle_id).expect("battle");
        assert_eq!(battle.player1(), PlayerSlot::new(U3, b3));
        assert_eq!(battle.current_turn(), U3);
    }

    #[test]
    fn test_heal_beast_owner_only() {
        let system = ArenaSystem::default();
        let b1 = beast_with(&system, U1, 1, BeastType::Light, 80, 100);
        let mut stats = system.beast_stats(b1).expect("stats");
        stats.take_damage(30, 0);
        system.store().write(&stats).expect("write");

        assert!(matches!(
            system.heal_beast(&ctx(U2), b1, 10),
            Err(ArenaError::NotBeastOwner { .. })
        ));
        assert_eq!(system.heal_beast(&ctx(U1), b1, 100).expect("heal"), 30);
        assert_eq!(system.beast_stats(b1).expect("stats").current_hp, 80);
    }

    #[test]
    fn test_outsider_cannot_steer_battle() {
        let system = ArenaSystem::default();
        let b1 = beast_with(&system, U1, 1, BeastType::Light, 80, 100);
        let b2 = beast_with(&system, U2, 2, BeastType::Shadow, 60, 100);
        let params = BattleParams::new(BattleType::Friendly)
            .with_player1(PlayerSlot::new(U1, b1))
            .with_player2(PlayerSlot::new(U2, b2));
        let battle_id = system.create_battle(&ctx(U1), params).expect("create");

        assert!(matches!(
            system.set_turn(&ctx(U3), battle_id, U2),
            Err(ArenaError::Battle(BattleError::PlayerNotInBattle))
        ));
        assert!(matches!(
            system.start_battle(&ctx(U3), battle_id),
            Err(ArenaError::Battle(BattleError::PlayerNotInBattle))
        ));
        system.set_turn(&ctx(U2), battle_id, U2).expect("set turn");
        system.start_battle(&ctx(U2), battle_id).expect("start");

        assert!(matches!(
            system.resolve_battle(&ctx(U3), battle_id, U1),
            Err(ArenaError::Battle(BattleError::PlayerNotInBattle))
        ));
        let battle = system.battle(battle_id).expect("battle");
        assert_eq!(battle.status(), BattleStatus::Active);
        assert_eq!(battle.winner(), None);
        assert_eq!(battle.current_turn(), U2);
    }

    #[test]
    fn test_restore_beast_heals_and_clears_status() {
        let system = ArenaSystem::default();
        let b1 = beast_with(&system, U1, 1, BeastType::Light, 80, 100);
        let mut stats = system.beast_stats(b1).expect("stats");
        stats.take_damage(30, 0);
        stats.apply_status(StatusCondition::Burned, 0);
        system.store().write(&stats).expect("write");

        assert!(matches!(
            system.restore_beast(&ctx(U2), b1),
            Err(ArenaError::NotBeastOwner { .. })
        ));
        assert_eq!(system.restore_beast(&ctx(U1), b1).expect("restore"), 80);
        let restored = system.beast_stats(b1).expect("stats");
        assert_eq!(restored.current_hp, 80);
        assert_eq!(restored.status_condition, StatusCondition::None);
    }

    #[test]
    fn test_concurrent_attacks_advance_turn_once() {
        let system = Arc::new(ArenaSystem::default());
        let b1 = beast_with(&system, U1, 1, BeastType::Light, 250, 100);
        let b2 = beast_with(&system, U2, 2, BeastType::Shadow, 250, 100);
        let battle_id = started(&system, b1, b2);

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let system = Arc::clone(&system);
                thread::spawn(move || system.attack(&ctx(U1), battle_id, AttackType::Beam))
            })
            .collect();
        let results: Vec<_> = workers
            .into_iter()
            .map(|w| w.join().expect("worker panicked"))
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(ArenaError::NotYourTurn(_)))));
        assert_eq!(system.battle(battle_id).expect("battle").current_turn(), U2);
        assert_eq!(system.beast_stats(b2).expect("stats").current_hp, 250 - 51);
    }

    #[test]
    fn test_concurrent_joins_fill_exactly_two_slots() {
        let system = Arc::new(ArenaSystem::default());
        let battle_id = system
            .create_battle(&ctx(U1), BattleParams::default())
            .expect("create");

        let workers: Vec<_> = (1..=8u32)
            .map(|i| {
                let system = Arc::clone(&system);
                thread::spawn(move || {
                    let player = Address::new(u64::from(i) * 0x100);
                    let beast_id = BeastId::new(i);
                    system
                        .spawn_beast(&ctx(player), beast_id, BeastType::Light, 1)
                        .expect("spawn");
                    system.join_battle(&ctx(player), battle_id, beast_id)
                })
            })
            .collect();

        let joined = workers
            .into_iter()
            .map(|w| w.join().expect("worker panicked"))
            .filter(Result::is_ok)
            .count();
        assert_eq!(joined, 2);
        assert_eq!(system.battle(battle_id).expect("battle").occupied_count(), 2);
    }

    #[test]
    fn test_concurrent_creates_get_unique_ids() {
        let system = Arc::new(ArenaSystem::default());
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let system = Arc::clone(&system);
                thread::spawn(move || {
                    (0..25)
                        .map(|_| {
                            system
                                .create_battle(&ctx(U1), BattleParams::default())
                                .expect("create")
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<BattleId> = workers
            .into_iter()
            .flat_map(|w| w.join().expect("worker panicked"))
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 100);
        assert_eq!(ids.last(), Some(&BattleId::new(100)));
    }

    proptest! {
        #[test]
        fn prop_duel_ends_with_a_standing_winner(
            hp1 in 1u16..200,
            hp2 in 1u16..200,
            atk1 in 0u16..200,
            atk2 in 0u16..200,
        ) {
            let system = ArenaSystem::default();
            let b1 = beast_with(&system, U1, 1, BeastType::Light, hp1, atk1);
            let b2 = beast_with(&system, U2, 2, BeastType::Shadow, hp2, atk2);
            let battle_id = started(&system, b1, b2);

            let mut winner = None;
            for _ in 0..1_000 {
                let battle = system.battle(battle_id).expect("battle");
                let mover = battle.current_turn();
                let (attack, defender) = if mover == U1 {
                    (AttackType::Beam, b2)
                } else {
                    (AttackType::Kick, b1)
                };
                let before = system.beast_stats(defender).expect("stats").current_hp;
                let outcome = system.attack(&ctx(mover), battle_id, attack).expect("attack");
                prop_assert!(outcome.damage >= 1);
                prop_assert_eq!(outcome.defender_hp, before - outcome.damage);
                if outcome.winner.is_some() {
                    winner = outcome.winner;
                    break;
                }
            }

            let winner = winner.expect("duel ends");
            let battle = system.battle(battle_id).expect("battle");
            prop_assert_eq!(battle.status(), BattleStatus::Finished);
            let standing = if winner == U1 { b1 } else { b2 };
            prop_assert!(system.beast_stats(standing).expect("stats").current_hp > 0);
        }
    }
}
