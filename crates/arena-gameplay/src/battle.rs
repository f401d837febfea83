//! Battle lifecycle state machine.
//!
//! A battle holds exactly two player slots and moves forward through
//! `Waiting -> Active -> Finished`. A finished battle is never reopened;
//! a rematch is a brand-new battle.
//!
//! Invariants kept by every operation:
//! - the two occupied slots never share a player or a beast
//! - `current_turn`, when non-zero, names an occupied slot's player

use arena_common::{Address, BattleId, BeastId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Broad category of a battle failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operation called in the wrong lifecycle state.
    State,
    /// Too many or too few players.
    Capacity,
    /// Player or beast collides with an existing slot.
    IdentityConflict,
    /// Player is not part of the battle.
    NotFound,
    /// Malformed input.
    Validation,
}

/// Battle state machine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleError {
    /// Operation requires `Waiting`
    #[error("BATTLE NOT WAITING")]
    NotWaiting,
    /// Operation requires `Active`
    #[error("BATTLE NOT ACTIVE")]
    NotActive,
    /// Operation requires `Finished`
    #[error("BATTLE NOT FINISHED")]
    NotFinished,
    /// Substitution outside a tournament
    #[error("SUB FAILED. NOT TOURNAMENT")]
    NotTournament,
    /// Both slots already occupied
    #[error("MAX NO. OF PLAYERS REACHED")]
    MaxPlayersReached,
    /// Fewer than two slots occupied
    #[error("INSUFFICIENT NUMBER OF PLAYERS")]
    InsufficientPlayers,
    /// Incoming player or beast already occupies the other slot
    #[error("PLAYER/BEAST ALREADY EXISTS")]
    PlayerAlreadyExists,
    /// Substitute's player or beast already in the battle
    #[error("PLAYER/BEAST ALREADY IN BATTLE")]
    PlayerAlreadyInBattle,
    /// Both initial slots share a player or beast
    #[error("PLAYERS/BEASTS ARE THE SAME")]
    PlayersAreSame,
    /// Identity matches neither slot
    #[error("PLAYER NOT IN BATTLE")]
    PlayerNotInBattle,
    /// Initial slot with a zero player
    #[error("ZERO ADDRESS")]
    ZeroAddress,
    /// Initial slot with a zero beast id
    #[error("INVALID BEAST ID")]
    InvalidBeastId,
    /// Joining with a zero player or beast id
    #[error("INVALID PLAYER PARAMS")]
    InvalidPlayerParams,
    /// Slot position other than 0 or 1
    #[error("INVALID POSITION")]
    InvalidPosition,
}

impl BattleError {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotWaiting | Self::NotActive | Self::NotFinished | Self::NotTournament => {
                ErrorKind::State
            },
            Self::MaxPlayersReached | Self::InsufficientPlayers => ErrorKind::Capacity,
            Self::PlayerAlreadyExists | Self::PlayerAlreadyInBattle | Self::PlayersAreSame => {
                ErrorKind::IdentityConflict
            },
            Self::PlayerNotInBattle => ErrorKind::NotFound,
            Self::ZeroAddress
            | Self::InvalidBeastId
            | Self::InvalidPlayerParams
            | Self::InvalidPosition => ErrorKind::Validation,
        }
    }
}

/// Result type for battle operations.
pub type BattleResult<T> = Result<T, BattleError>;

/// Kind of match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum BattleType {
    /// Counts toward ranking.
    Ranked,
    /// Casual match.
    #[default]
    Friendly,
    /// Tournament match; allows substitution.
    Tournament,
}

impl BattleType {
    /// Every defined battle type, in code order.
    pub const ALL: [Self; 3] = [Self::Ranked, Self::Friendly, Self::Tournament];

    /// Encodes to the stored integer code.
    #[must_use]
    pub const fn to_code(self) -> u8 {
        match self {
            Self::Ranked => 0,
            Self::Friendly => 1,
            Self::Tournament => 2,
        }
    }

    /// Decodes a stored integer code. Unknown codes decode to `Friendly`.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Ranked,
            2 => Self::Tournament,
            _ => Self::Friendly,
        }
    }
}

impl From<u8> for BattleType {
    fn from(code: u8) -> Self {
        Self::from_code(code)
    }
}

impl From<BattleType> for u8 {
    fn from(battle_type: BattleType) -> Self {
        battle_type.to_code()
    }
}

/// Lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum BattleStatus {
    /// Accepting players.
    #[default]
    Waiting,
    /// In progress.
    Active,
    /// Resolved; terminal.
    Finished,
}

impl BattleStatus {
    /// Every defined status, in code order.
    pub const ALL: [Self; 3] = [Self::Waiting, Self::Active, Self::Finished];

    /// Encodes to the stored integer code.
    #[must_use]
    pub const fn to_code(self) -> u8 {
        match self {
            Self::Waiting => 0,
            Self::Active => 1,
            Self::Finished => 2,
        }
    }

    /// Decodes a stored integer code. Unknown codes decode to `Waiting`.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Active,
            2 => Self::Finished,
            _ => Self::Waiting,
        }
    }
}

impl From<u8> for BattleStatus {
    fn from(code: u8) -> Self {
        Self::from_code(code)
    }
}

impl From<BattleStatus> for u8 {
    fn from(status: BattleStatus) -> Self {
        status.to_code()
    }
}

/// One roster position: a player and the beast they fight with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerSlot {
    /// Player identity (`Address::ZERO` when empty).
    pub player: Address,
    /// Beast fighting for the player.
    pub beast_id: BeastId,
}

impl PlayerSlot {
    /// An unoccupied slot.
    pub const EMPTY: Self = Self {
        player: Address::ZERO,
        beast_id: BeastId::NULL,
    };

    /// Creates a slot.
    #[must_use]
    pub const fn new(player: Address, beast_id: BeastId) -> Self {
        Self { player, beast_id }
    }

    /// Whether nobody occupies this slot.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.player.is_zero()
    }

    /// Whether both the player and the beast are set.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        !self.player.is_zero() && self.beast_id.is_valid()
    }

    /// Whether the two slots share a player or a beast.
    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        self.player == other.player || self.beast_id == other.beast_id
    }
}

/// Parameters for creating a battle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BattleParams {
    /// Optional first slot.
    pub player1: Option<PlayerSlot>,
    /// Optional second slot.
    pub player2: Option<PlayerSlot>,
    /// Kind of match.
    pub battle_type: BattleType,
}

impl BattleParams {
    /// Empty roster of the given type.
    #[must_use]
    pub fn new(battle_type: BattleType) -> Self {
        Self {
            battle_type,
            ..Self::default()
        }
    }

    /// Set the first slot.
    #[must_use]
    pub fn with_player1(mut self, slot: PlayerSlot) -> Self {
        self.player1 = Some(slot);
        self
    }

    /// Set the second slot.
    #[must_use]
    pub fn with_player2(mut self, slot: PlayerSlot) -> Self {
        self.player2 = Some(slot);
        self
    }
}

/// A two-player battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    id: BattleId,
    player1: PlayerSlot,
    player2: PlayerSlot,
    current_turn: Address,
    status: BattleStatus,
    winner_id: Option<Address>,
    battle_timestamp: u64,
    last_action_timestamp: u64,
    battle_type: BattleType,
}

impl Battle {
    /// Creates a waiting battle, validating any pre-filled slots.
    pub fn new(id: BattleId, params: BattleParams) -> BattleResult<Self> {
        for slot in [params.player1, params.player2].into_iter().flatten() {
            if slot.player.is_zero() {
                return Err(BattleError::ZeroAddress);
            }
            if !slot.beast_id.is_valid() {
                return Err(BattleError::InvalidBeastId);
            }
        }
        if let (Some(a), Some(b)) = (params.player1, params.player2) {
            if a.conflicts_with(&b) {
                return Err(BattleError::PlayersAreSame);
            }
        }

        debug!(battle = %id, battle_type = ?params.battle_type, "battle created");
        Ok(Self {
            id,
            player1: params.player1.unwrap_or(PlayerSlot::EMPTY),
            player2: params.player2.unwrap_or(PlayerSlot::EMPTY),
            current_turn: Address::ZERO,
            status: BattleStatus::Waiting,
            winner_id: None,
            battle_timestamp: 0,
            last_action_timestamp: 0,
            battle_type: params.battle_type,
        })
    }

    /// Battle id.
    #[must_use]
    pub const fn id(&self) -> BattleId {
        self.id
    }

    /// First slot.
    #[must_use]
    pub const fn player1(&self) -> PlayerSlot {
        self.player1
    }

    /// Second slot.
    #[must_use]
    pub const fn player2(&self) -> PlayerSlot {
        self.player2
    }

    /// Player whose move it is (`Address::ZERO` if none).
    #[must_use]
    pub const fn current_turn(&self) -> Address {
        self.current_turn
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn status(&self) -> BattleStatus {
        self.status
    }

    /// Winner, once resolved.
    #[must_use]
    pub const fn winner(&self) -> Option<Address> {
        self.winner_id
    }

    /// Time the battle started.
    #[must_use]
    pub const fn battle_timestamp(&self) -> u64 {
        self.battle_timestamp
    }

    /// Time of the last turn advance.
    #[must_use]
    pub const fn last_action_timestamp(&self) -> u64 {
        self.last_action_timestamp
    }

    /// Kind of match.
    #[must_use]
    pub const fn battle_type(&self) -> BattleType {
        self.battle_type
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        usize::from(!self.player1.is_empty()) + usize::from(!self.player2.is_empty())
    }

    /// The occupied slot belonging to `player`.
    #[must_use]
    pub fn slot_of(&self, player: Address) -> Option<PlayerSlot> {
        if player.is_zero() {
            return None;
        }
        [self.player1, self.player2]
            .into_iter()
            .find(|slot| slot.player == player)
    }

    /// The slot facing `player`, if `player` is in the battle.
    #[must_use]
    pub fn opponent_of(&self, player: Address) -> Option<PlayerSlot> {
        self.slot_of(player)?;
        if self.player1.player == player {
            Some(self.player2)
        } else {
            Some(self.player1)
        }
    }

    /// Adds a player to the first free slot.
    ///
    /// The first occupant also takes the first turn.
    pub fn add_player(&mut self, slot: PlayerSlot) -> BattleResult<()> {
        self.require(BattleStatus::Waiting)?;
        if !slot.is_valid() {
            return Err(BattleError::InvalidPlayerParams);
        }
        if !self.player1.is_empty() && !self.player2.is_empty() {
            return Err(BattleError::MaxPlayersReached);
        }

        let (free, other) = if self.player1.is_empty() {
            (&mut self.player1, self.player2)
        } else {
            (&mut self.player2, self.player1)
        };
        if !other.is_empty() && other.conflicts_with(&slot) {
            return Err(BattleError::PlayerAlreadyExists);
        }
        *free = slot;

        if other.is_empty() {
            self.current_turn = slot.player;
        }
        debug!(battle = %self.id, player = %slot.player, beast = %slot.beast_id, "player joined");
        Ok(())
    }

    /// Chooses who moves first.
    pub fn set_turn(&mut self, player: Address) -> BattleResult<()> {
        self.require(BattleStatus::Waiting)?;
        if self.slot_of(player).is_none() {
            return Err(BattleError::PlayerNotInBattle);
        }
        self.current_turn = player;
        Ok(())
    }

    /// Starts the battle. Defaults the first turn to `player1`.
    pub fn start(&mut self, now: u64) -> BattleResult<()> {
        self.require(BattleStatus::Waiting)?;
        if self.occupied_count() < 2 {
            return Err(BattleError::InsufficientPlayers);
        }
        if self.current_turn.is_zero() {
            self.current_turn = self.player1.player;
        }
        self.battle_timestamp = now;
        self.status = BattleStatus::Active;
        info!(battle = %self.id, first = %self.current_turn, "battle started");
        Ok(())
    }

    /// Records an action and hands the turn to the other slot.
    ///
    /// The toggle does not check who actually moved.
    pub fn update(&mut self, now: u64) -> BattleResult<()> {
        self.require(BattleStatus::Active)?;
        self.last_action_timestamp = now;
        self.current_turn = if self.current_turn == self.player1.player {
            self.player2.player
        } else {
            self.player1.player
        };
        debug!(battle = %self.id, next = %self.current_turn, "turn advanced");
        Ok(())
    }

    /// Replaces the occupant of slot `pos` (0 or 1) in a tournament.
    ///
    /// If the replaced player held the turn, the substitute inherits it.
    pub fn sub_player(&mut self, slot: PlayerSlot, pos: u8) -> BattleResult<()> {
        self.require(BattleStatus::Active)?;
        if self.battle_type != BattleType::Tournament {
            return Err(BattleError::NotTournament);
        }
        if !slot.is_valid() {
            return Err(BattleError::InvalidPlayerParams);
        }
        let replaced = match pos {
            0 => self.player1,
            1 => self.player2,
            _ => return Err(BattleError::InvalidPosition),
        };
        if self.player1.conflicts_with(&slot) || self.player2.conflicts_with(&slot) {
            return Err(BattleError::PlayerAlreadyInBattle);
        }

        if pos == 0 {
            self.player1 = slot;
        } else {
            self.player2 = slot;
        }
        if self.current_turn == replaced.player {
            self.current_turn = slot.player;
        }
        info!(
            battle = %self.id,
            pos,
            outgoing = %replaced.player,
            incoming = %slot.player,
            "player substituted"
        );
        Ok(())
    }

    /// Declares a winner and finishes the battle.
    pub fn resolve_battle(&mut self, winner: Address) -> BattleResult<()> {
        self.require(BattleStatus::Active)?;
        if self.slot_of(winner).is_none() {
            return Err(BattleError::PlayerNotInBattle);
        }
        self.winner_id = Some(winner);
        self.status = BattleStatus::Finished;
        self.current_turn = Address::ZERO;
        info!(battle = %self.id, %winner, "battle finished");
        Ok(())
    }

    /// Builds a new waiting battle with the same roster and type.
    pub fn rematch(&self, new_id: BattleId) -> BattleResult<Self> {
        if self.status != BattleStatus::Finished {
            return Err(BattleError::NotFinished);
        }
        Self::new(
            new_id,
            BattleParams {
                player1: Some(self.player1),
                player2: Some(self.player2),
                battle_type: self.battle_type,
            },
        )
    }

    fn require(&self, status: BattleStatus) -> BattleResult<()> {
        if self.status == status {
            return Ok(());
        }
        Err(match status {
            BattleStatus::Waiting => BattleError::NotWaiting,
            BattleStatus::Active => BattleError::NotActive,
            BattleStatus::Finished => BattleError::NotFinished,
        })
    }
}
