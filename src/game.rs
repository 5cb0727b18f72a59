//! The match state machine: invite, fleet placement, readiness, alternating
//! shots and the win condition.
//!
//! Every operation either applies completely or returns a [`MatchError`] and
//! leaves the match untouched, so it can run inside an optimistic transaction
//! and be re-evaluated against fresh state after a conflict.

use core::fmt;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::common::{MatchError, ShotError, ShotOutcome};
use crate::config::{PlacementRules, FLEET};
use crate::player::PlayerId;
use crate::ship::{Run, ShipDef};

/// Id of a match record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MatchId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Coarse lifecycle stage of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the invitee to accept.
    Invite,
    /// Both players are placing their fleets.
    Placing,
    /// Shots alternate; `turn` may fire next.
    Battle { turn: PlayerId },
    /// Terminal.
    Finished { winner: PlayerId },
}

/// Seat of a participant. The challenger always sits at `A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    A,
    B,
}

impl Seat {
    fn index(self) -> usize {
        match self {
            Seat::A => 0,
            Seat::B => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Seat::A => Seat::B,
            Seat::B => Seat::A,
        }
    }
}

/// Result of a successful placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placed {
    pub ship: ShipDef,
    pub run: Run,
    /// This was the player's last ship; they are now ready.
    pub fleet_complete: bool,
    /// Both players are now ready and the battle began.
    pub battle_started: bool,
}

/// Result of a readiness signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The player was already ready; nothing changed.
    Unchanged,
    /// The player is ready and waits for the opponent.
    Waiting,
    /// Both players are ready; the battle began.
    BattleStarted,
}

/// One complete game session between two players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    id: MatchId,
    players: [PlayerId; 2],
    boards: [Board; 2],
    placed: [usize; 2],
    phase: Phase,
    ready: BTreeSet<PlayerId>,
}

impl Match {
    /// Create a match in the invite phase.
    pub fn invite(id: MatchId, challenger: PlayerId, invitee: PlayerId) -> Result<Self, MatchError> {
        if challenger == invitee {
            return Err(MatchError::SelfChallenge);
        }
        Ok(Self {
            id,
            players: [challenger, invitee],
            boards: [Board::new(), Board::new()],
            placed: [0, 0],
            phase: Phase::Invite,
            ready: BTreeSet::new(),
        })
    }

    /// Reassemble a match from persisted parts. Callers validate consistency.
    pub(crate) fn from_parts(
        id: MatchId,
        players: [PlayerId; 2],
        boards: [Board; 2],
        placed: [usize; 2],
        phase: Phase,
        ready: BTreeSet<PlayerId>,
    ) -> Self {
        Self {
            id,
            players,
            boards,
            placed,
            phase,
            ready,
        }
    }

    pub fn id(&self) -> &MatchId {
        &self.id
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The challenger.
    pub fn player_a(&self) -> &PlayerId {
        &self.players[0]
    }

    /// The invitee.
    pub fn player_b(&self) -> &PlayerId {
        &self.players[1]
    }

    pub fn player(&self, seat: Seat) -> &PlayerId {
        &self.players[seat.index()]
    }

    pub fn seat_of(&self, player: &PlayerId) -> Result<Seat, MatchError> {
        if *player == self.players[0] {
            Ok(Seat::A)
        } else if *player == self.players[1] {
            Ok(Seat::B)
        } else {
            Err(MatchError::NotAParticipant)
        }
    }

    /// Seat of the turn owner or winner. Both are only ever copied from
    /// `players`, so anyone who is not player A sits at B.
    pub(crate) fn seat_of_holder(&self, holder: &PlayerId) -> Seat {
        if *holder == self.players[0] {
            Seat::A
        } else {
            Seat::B
        }
    }

    pub fn is_participant(&self, player: &PlayerId) -> bool {
        self.seat_of(player).is_ok()
    }

    pub fn opponent_of(&self, player: &PlayerId) -> Result<&PlayerId, MatchError> {
        Ok(self.player(self.seat_of(player)?.other()))
    }

    pub fn board(&self, seat: Seat) -> &Board {
        &self.boards[seat.index()]
    }

    /// Board holding `player`'s fleet.
    pub fn board_of(&self, player: &PlayerId) -> Result<&Board, MatchError> {
        Ok(self.board(self.seat_of(player)?))
    }

    /// Roster ships placed so far by the player in `seat`.
    pub fn placed(&self, seat: Seat) -> usize {
        self.placed[seat.index()]
    }

    /// Next roster ship `player` has to place.
    pub fn next_ship(&self, player: &PlayerId) -> Result<Option<ShipDef>, MatchError> {
        let seat = self.seat_of(player)?;
        Ok(FLEET.get(self.placed(seat)).copied())
    }

    pub fn ready_players(&self) -> &BTreeSet<PlayerId> {
        &self.ready
    }

    pub fn is_ready(&self, player: &PlayerId) -> bool {
        self.ready.contains(player)
    }

    /// Player allowed to fire, only during battle.
    pub fn turn_owner(&self) -> Option<&PlayerId> {
        match &self.phase {
            Phase::Battle { turn } => Some(turn),
            _ => None,
        }
    }

    pub fn winner(&self) -> Option<&PlayerId> {
        match &self.phase {
            Phase::Finished { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished { .. })
    }

    /// Invitee accepts the challenge: Invite → Placing.
    pub fn accept(&mut self, by: &PlayerId) -> Result<(), MatchError> {
        self.ensure_invitee(by)?;
        self.phase = Phase::Placing;
        Ok(())
    }

    /// Check that `by` may decline. Declining removes the match record, which
    /// is the store's business.
    pub fn check_decline(&self, by: &PlayerId) -> Result<(), MatchError> {
        self.ensure_invitee(by)
    }

    fn ensure_invitee(&self, by: &PlayerId) -> Result<(), MatchError> {
        match self.seat_of(by)? {
            Seat::A => Err(MatchError::NotInvitee),
            Seat::B if self.phase != Phase::Invite => Err(MatchError::WrongPhase),
            Seat::B => Ok(()),
        }
    }

    /// Place `player`'s next roster ship on the run from `start` to `end`.
    /// Placing the last ship makes the player ready.
    pub fn place(
        &mut self,
        player: &PlayerId,
        start: usize,
        end: usize,
        rules: PlacementRules,
    ) -> Result<Placed, MatchError> {
        let seat = self.seat_of(player)?;
        if self.phase != Phase::Placing {
            return Err(MatchError::WrongPhase);
        }
        if self.ready.contains(player) {
            return Err(MatchError::AlreadyReady);
        }
        let ship = FLEET
            .get(self.placed(seat))
            .copied()
            .ok_or(MatchError::AlreadyReady)?;
        let run = self.boards[seat.index()].place(ship, start, end, rules)?;
        self.placed[seat.index()] += 1;

        let fleet_complete = self.placed(seat) == FLEET.len();
        let battle_started = fleet_complete && self.mark_ready(player) == Readiness::BattleStarted;
        Ok(Placed {
            ship,
            run,
            fleet_complete,
            battle_started,
        })
    }

    /// Signal that `player`'s fleet is final. Repeated signals are no-ops.
    pub fn set_ready(&mut self, player: &PlayerId) -> Result<Readiness, MatchError> {
        let seat = self.seat_of(player)?;
        match self.phase {
            Phase::Invite | Phase::Finished { .. } => Err(MatchError::WrongPhase),
            Phase::Battle { .. } => Ok(Readiness::Unchanged),
            Phase::Placing if self.ready.contains(player) => Ok(Readiness::Unchanged),
            Phase::Placing => match FLEET.get(self.placed(seat)) {
                Some(next) => Err(MatchError::FleetIncomplete { next: *next }),
                None => Ok(self.mark_ready(player)),
            },
        }
    }

    fn mark_ready(&mut self, player: &PlayerId) -> Readiness {
        if !self.ready.insert(player.clone()) {
            return Readiness::Unchanged;
        }
        if self.players.iter().all(|p| self.ready.contains(p)) {
            self.phase = Phase::Battle {
                turn: self.players[0].clone(),
            };
            Readiness::BattleStarted
        } else {
            Readiness::Waiting
        }
    }

    /// `shooter` fires at `index` on the opponent's board.
    pub fn fire(&mut self, shooter: &PlayerId, index: usize) -> Result<ShotOutcome, MatchError> {
        let seat = self.seat_of(shooter)?;
        let turn = match &self.phase {
            Phase::Battle { turn } => turn,
            _ => return Err(ShotError::MatchNotActive.into()),
        };
        if turn != shooter {
            return Err(ShotError::NotYourTurn.into());
        }
        let target = seat.other();
        let outcome = self.boards[target.index()].fire_at(index)?;
        self.phase = if outcome.all_sunk {
            Phase::Finished {
                winner: shooter.clone(),
            }
        } else {
            Phase::Battle {
                turn: self.player(target).clone(),
            }
        };
        Ok(outcome)
    }
}
