/// Events raised by the state machine.
/// The effect layer turns these into tones and indicator blinks.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    MenuMoved,
    Confirmed,
    PlayerMoved,
    CupCollected,
    PlayerKilled,
    PlayerRespawned,
    RoomCleared,
    EnteredRoom { bonus: u16 },
    GameWon,
    GameLost,
}
