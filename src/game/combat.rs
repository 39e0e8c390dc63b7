//! Shot Resolution
//!
//! The turn/combat engine: validates a shot against the turn pointer,
//! resolves hit or miss against the defender's fleet ground truth, records
//! the outcome on the defender's board, and decides between a turn flip and
//! victory. After every accepted shot exactly one of the two holds.

use crate::game::board::{Cell, Coord};
use crate::game::state::{ConnectionId, GameError, MatchState, MatchStatus};

/// Tunable combat behavior.
#[derive(Clone, Copy, Debug)]
pub struct CombatRules {
    /// Reject shots whose coordinates fall outside the 10x10 board.
    ///
    /// The reference behavior left coordinates unchecked; rejecting is the
    /// safe resolution and the default here.
    pub check_bounds: bool,

    /// Count a hit on an already-resolved cell toward the shooter's hit
    /// counter again.
    ///
    /// Observed legacy behavior: re-firing at a hit cell re-records the
    /// outcome and increments the counter a second time. Kept as the
    /// default for fidelity; flip off to count each cell at most once.
    pub count_repeat_hits: bool,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            check_bounds: true,
            count_repeat_hits: true,
        }
    }
}

/// Result of one accepted shot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShotResolution {
    /// Who fired.
    pub shooter: ConnectionId,
    /// Where.
    pub target: Coord,
    /// Whether a ship position was struck.
    pub hit: bool,
    /// Whether this shot sank the last remaining position.
    pub victory: bool,
    /// Next turn holder; `None` exactly when `victory` is true.
    pub next_turn: Option<ConnectionId>,
}

/// Resolve one shot.
///
/// Accepted iff the match status is `Playing` and `shooter` holds the turn
/// pointer (and, under [`CombatRules::check_bounds`], the target is on the
/// board). Rejected shots leave the match state untouched.
pub fn fire(
    state: &mut MatchState,
    rules: &CombatRules,
    shooter: ConnectionId,
    target: Coord,
) -> Result<ShotResolution, GameError> {
    if state.status() != MatchStatus::Playing {
        return Err(GameError::NotPlaying);
    }
    let shooter_index = state.player_index(shooter).ok_or(GameError::NotAPlayer)?;
    if state.current_turn() != shooter {
        return Err(GameError::NotYourTurn);
    }
    if rules.check_bounds && !target.in_bounds() {
        return Err(GameError::OutOfBounds);
    }

    let defender_index = shooter_index ^ 1;

    // Hit detection runs against the submitted fleet, independent of any
    // prior shots at the same cell.
    let hit = state
        .player(defender_index)
        .fleet
        .as_ref()
        .is_some_and(|fleet| fleet.contains(target));
    let repeat_shot = state.player(defender_index).board.is_resolved(target);

    state
        .slot_mut(defender_index)
        .board
        .record(target, if hit { Cell::Hit } else { Cell::Miss });

    if hit && (rules.count_repeat_hits || !repeat_shot) {
        state.slot_mut(shooter_index).hits += 1;
    }

    // A miss can never sink the last position, so the win check only runs
    // on hits.
    let victory = hit && {
        let defender = state.player(defender_index);
        defender
            .fleet
            .as_ref()
            .is_some_and(|fleet| fleet.is_sunk_on(&defender.board))
    };

    if victory {
        state.finish();
        Ok(ShotResolution {
            shooter,
            target,
            hit,
            victory: true,
            next_turn: None,
        })
    } else {
        let next = state.player(defender_index).id;
        state.set_turn(next);
        Ok(ShotResolution {
            shooter,
            target,
            hit,
            victory: false,
            next_turn: Some(next),
        })
    }
}
