/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Empty,
    Fire,   // Lethal on entry
    Ladder, // Permits row changes while standing on it
    Cup,    // Pickup target
    Start,  // Player start marker, erased on first entry in a run
}

impl Tile {
    /// Decode a layout symbol. Unknown symbols are empty floor.
    pub fn from_symbol(c: char) -> Tile {
        match c {
            'F' | '1' => Tile::Fire,
            'H' | '2' => Tile::Ladder,
            '3' => Tile::Cup,
            'P' => Tile::Start,
            _ => Tile::Empty,
        }
    }

    /// Does entering this cell kill the player?
    pub fn is_hazard(self) -> bool {
        matches!(self, Tile::Fire)
    }

    /// Can the player change rows while standing here?
    pub fn is_climbable(self) -> bool {
        matches!(self, Tile::Ladder)
    }

    /// Is this a cup pickup?
    pub fn is_cup(self) -> bool {
        matches!(self, Tile::Cup)
    }
}
