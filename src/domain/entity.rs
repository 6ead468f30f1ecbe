/// Entities: Player and Room.
/// Both are plain fixed-size values; no heap, so a room set is just an array.

use super::tile::Tile;

pub const ROOM_WIDTH: usize = 16;
pub const ROOM_HEIGHT: usize = 2;

/// Fallback start cell when a room has neither a marker nor a remembered start.
pub const DEFAULT_START: (u8, u8) = (0, 1);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Player {
    pub column: u8,
    pub row: u8,
    pub alive: bool,
}

impl Player {
    pub fn new(column: u8, row: u8) -> Self {
        Player { column, row, alive: true }
    }
}

impl Default for Player {
    fn default() -> Self {
        Player::new(DEFAULT_START.0, DEFAULT_START.1)
    }
}

/// One 16×2 room.
///
/// `cups_in_room` is fixed at load time; `cups_collected` only grows
/// during a run. Cells change only when a cup is taken or the start
/// marker is erased.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Room {
    cells: [[Tile; ROOM_WIDTH]; ROOM_HEIGHT],
    pub cups_in_room: u8,
    pub cups_collected: u8,
    /// Start cell, remembered once the marker has been erased.
    spawn: Option<(u8, u8)>,
}

impl Room {
    /// Build a room from two layout rows. Rows are truncated or padded
    /// with empty floor to exactly `ROOM_WIDTH` cells.
    pub fn from_rows(top: &str, bottom: &str) -> Self {
        let mut room = Room::default();
        for (y, row) in [top, bottom].iter().enumerate() {
            for (x, ch) in row.chars().take(ROOM_WIDTH).enumerate() {
                room.cells[y][x] = Tile::from_symbol(ch);
            }
        }
        room.cups_in_room = room.count(Tile::Cup);
        room.cups_collected = 0;
        room
    }

    /// Tile at (column, row). Out of bounds reads as empty floor.
    pub fn tile_at(&self, column: u8, row: u8) -> Tile {
        let (x, y) = (column as usize, row as usize);
        if x >= ROOM_WIDTH || y >= ROOM_HEIGHT {
            return Tile::Empty;
        }
        self.cells[y][x]
    }

    pub fn row(&self, row: usize) -> &[Tile; ROOM_WIDTH] {
        &self.cells[row.min(ROOM_HEIGHT - 1)]
    }

    pub fn count(&self, tile: Tile) -> u8 {
        self.cells
            .iter()
            .flatten()
            .filter(|&&t| t == tile)
            .count() as u8
    }

    /// Remove a cup at (column, row). Returns false if there was none.
    pub fn take_cup(&mut self, column: u8, row: u8) -> bool {
        if !self.tile_at(column, row).is_cup() {
            return false;
        }
        self.cells[row as usize][column as usize] = Tile::Empty;
        self.cups_collected = (self.cups_collected + 1).min(self.cups_in_room);
        true
    }

    /// Resolve the start cell for this room.
    ///
    /// The first marker found (column-major, top row first) is erased and
    /// remembered. Without a marker, the remembered cell is used, and
    /// without either, `DEFAULT_START`.
    pub fn take_start(&mut self) -> (u8, u8) {
        for x in 0..ROOM_WIDTH {
            for y in 0..ROOM_HEIGHT {
                if self.cells[y][x] == Tile::Start {
                    self.cells[y][x] = Tile::Empty;
                    let cell = (x as u8, y as u8);
                    self.spawn = Some(cell);
                    return cell;
                }
            }
        }
        self.spawn.unwrap_or(DEFAULT_START)
    }

    #[cfg(test)]
    pub fn has_start_marker(&self) -> bool {
        self.count(Tile::Start) > 0
    }

    pub fn is_cleared(&self) -> bool {
        self.cups_collected >= self.cups_in_room
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_and_truncated() {
        let r = Room::from_rows("3", "P       H       EXTRA");
        assert_eq!(r.tile_at(0, 0), Tile::Cup);
        assert_eq!(r.tile_at(15, 0), Tile::Empty);
        assert_eq!(r.tile_at(8, 1), Tile::Ladder);
        // 'E','X','T','R','A' lie beyond column 15 and are dropped
        assert_eq!(r.count(Tile::Empty), 32 - 3);
        assert_eq!(r.cups_in_room, 1);
    }

    #[test]
    fn start_marker_is_erased_once_and_remembered() {
        let mut r = Room::from_rows("                ", "  P             ");
        assert!(r.has_start_marker());
        assert_eq!(r.take_start(), (2, 1));
        assert!(!r.has_start_marker());
        assert_eq!(r.tile_at(2, 1), Tile::Empty);
        // Second call: marker gone, remembered cell wins
        assert_eq!(r.take_start(), (2, 1));
    }

    #[test]
    fn missing_start_marker_defaults() {
        let mut r = Room::from_rows("", "");
        assert_eq!(r.take_start(), DEFAULT_START);
    }

    #[test]
    fn cup_taken_once() {
        let mut r = Room::from_rows(" 3", "");
        assert!(r.take_cup(1, 0));
        assert!(!r.take_cup(1, 0));
        assert_eq!(r.cups_collected, 1);
        assert!(r.is_cleared());
    }
}
