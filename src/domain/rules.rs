/// Movement rules and scoring rules, truth-table driven.
///
/// Pure functions over a room and a player, with no side effects.
/// These encode "what is legal" without performing the action.
///
/// ## Movement Truth Table
///
/// Checked in order; the first DENY wins.
/// ┌──────────────────────────────┬─────────┬──────────────────────┐
/// │ Condition                     │ Allow?  │ Notes                │
/// ├──────────────────────────────┼─────────┼──────────────────────┤
/// │ player not alive              │ DENY    │ NotAlive             │
/// │ dest outside 16×2             │ DENY    │ OutOfBounds          │
/// │ row changes, HERE not ladder  │ DENY    │ NoLadder (current    │
/// │                               │         │ cell, not the dest)  │
/// │ Otherwise                     │ ALLOW   │                      │
/// └──────────────────────────────┴─────────┴──────────────────────┘
///
/// ## Arrival Effects (destination cell, both always evaluated)
/// ┌──────────────────────┬──────────────────────────────────────┐
/// │ dest is Fire          │ player dies                          │
/// │ dest is Cup           │ cup removed, +POINTS_PER_CUP         │
/// └──────────────────────┴──────────────────────────────────────┘
/// A cell that is both lethal and cup-bearing cannot occur in a parsed
/// layout, but the two checks stay independent: death never cancels
/// the pickup.

use thiserror::Error;

use super::entity::{Player, Room, ROOM_HEIGHT, ROOM_WIDTH};

pub const POINTS_PER_CUP: u16 = 10;
pub const BASE_ROOM_CLEAR_POINTS: u16 = 50;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum MoveBlocked {
    #[error("player is not alive")]
    NotAlive,
    #[error("destination is outside the room")]
    OutOfBounds,
    #[error("row change requires standing on a ladder")]
    NoLadder,
}

/// Resolve a move request to its destination cell, or the rule that
/// blocks it. See the truth table above.
pub fn check_move(room: &Room, player: &Player, dc: i8, dr: i8) -> Result<(u8, u8), MoveBlocked> {
    if !player.alive {
        return Err(MoveBlocked::NotAlive);
    }
    let column = player.column as i16 + dc as i16;
    let row = player.row as i16 + dr as i16;
    if column < 0 || column >= ROOM_WIDTH as i16 || row < 0 || row >= ROOM_HEIGHT as i16 {
        return Err(MoveBlocked::OutOfBounds);
    }
    if dr != 0 && !room.tile_at(player.column, player.row).is_climbable() {
        return Err(MoveBlocked::NoLadder);
    }
    Ok((column as u8, row as u8))
}

/// Bonus for clearing a room: `max(1, base − seconds)`.
///
/// Elapsed time is floored to whole seconds and never counted as less
/// than one second.
pub fn room_clear_bonus(base: u16, elapsed_ms: u32) -> u16 {
    let seconds = (elapsed_ms / 1000).max(1);
    let seconds = seconds.min(u16::MAX as u32) as u16;
    base.saturating_sub(seconds).max(1)
}
