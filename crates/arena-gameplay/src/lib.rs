//! # Arena Gameplay
//!
//! Turn-based beast battles for Beast Arena.
//!
//! This crate provides the pure combat core:
//! - Deterministic pseudo-random rolls
//! - Elemental types, attacks, and status conditions with integer codecs
//! - Beast stats (damage, healing, status, level-up)
//! - Damage computation with favored and effectiveness multipliers
//! - The battle lifecycle state machine
//!
//! Nothing here touches storage. Callers read a record, mutate a copy,
//! and write it back.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod attack;
pub mod battle;
pub mod beast;
pub mod beast_stats;
pub mod element;
pub mod random;
pub mod status;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::attack::*;
    pub use crate::battle::*;
    pub use crate::beast::*;
    pub use crate::beast_stats::*;
    pub use crate::element::*;
    pub use crate::random::*;
    pub use crate::status::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use arena_common::{Address, BattleId, BeastId, ExecutionContext};

    #[test]
    fn test_one_exchange() {
        let ctx = ExecutionContext::new(Address::new(1), 1_000, 10);
        let light = Beast::new(Address::new(1), BeastId::new(1), BeastType::Light);
        let shadow = Beast::new(Address::new(2), BeastId::new(2), BeastType::Shadow);
        let mut shadow_stats =
            BeastStats::new(&ctx, shadow.beast_id, shadow.beast_type, 1).expect("roll");

        let params = BattleParams::default()
            .with_player1(PlayerSlot::new(light.player, light.beast_id))
            .with_player2(PlayerSlot::new(shadow.player, shadow.beast_id));
        let mut battle = Battle::new(BattleId::new(1), params).expect("battle");
        battle.start(ctx.timestamp).expect("start");

        let hit = light.attack(shadow.beast_type, AttackType::Beam, 100);
        let before = shadow_stats.current_hp;
        shadow_stats.take_damage(hit.damage, ctx.timestamp);
        battle.update(ctx.timestamp).expect("update");

        assert!(hit.is_super_effective);
        assert!(shadow_stats.current_hp < before);
        assert_eq!(battle.current_turn(), shadow.player);
    }
}
