/// Room layouts: six built-in rooms, optionally overridden from a file.
///
/// ## Room file format
///   ```
///   # comment
///   <top row>
///   <bottom row>
///   <top row of the next room>
///   ...
///   ```
/// Lines starting with `#` and empty lines are skipped. The rest are taken
/// in pairs; each pair replaces the next built-in room, at most six. A
/// trailing unpaired row is ignored.
///
/// ## Tile legend
///   ' ' = Empty     'F' / '1' = Fire      'H' / '2' = Ladder
///   '3' = Cup       'P' = Start marker    anything else = Empty

use std::path::Path;

use tracing::{info, warn};

use crate::domain::entity::Room;

pub const ROOM_COUNT: usize = 6;

/// (top, bottom) rows of the built-in rooms.
pub const BUILTIN_ROOMS: [(&str, &str); ROOM_COUNT] = [
    ("   3    H      3", "P       H       "),
    ("  3    H   3F   ", "P      H    F   "),
    ("3     H FF H   3", "P     H    H3 FF"),
    ("3  H     H F H 3", "P  H  F  H   H 3"),
    ("3 H   3 F H    3", "P H       H 3FF "),
    ("3 H 3 3 H F H 3 ", "P H F F H 3 H  3"),
];

pub fn builtin_rooms() -> [Room; ROOM_COUNT] {
    BUILTIN_ROOMS.map(|(top, bottom)| Room::from_rows(top, bottom))
}

/// Replace rooms in order with the pairs found in `content`. Returns how
/// many rooms were replaced.
pub fn apply_overrides(rooms: &mut [Room; ROOM_COUNT], content: &str) -> usize {
    let mut rows = content
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.is_empty() && !l.starts_with('#'));

    let mut replaced = 0;
    while replaced < ROOM_COUNT {
        let Some(top) = rows.next() else { break };
        let Some(bottom) = rows.next() else {
            warn!(row = top, "room file ends with an unpaired row, ignored");
            break;
        };
        rooms[replaced] = Room::from_rows(top, bottom);
        replaced += 1;
    }

    if rows.next().is_some() {
        warn!("room file has more than {ROOM_COUNT} rooms, extra rows ignored");
    }
    replaced
}

/// Built-in rooms, with overrides from `path` when it can be read.
pub fn load_rooms(path: Option<&Path>) -> [Room; ROOM_COUNT] {
    let mut rooms = builtin_rooms();
    let Some(path) = path else { return rooms };

    match std::fs::read_to_string(path) {
        Ok(content) => {
            let n = apply_overrides(&mut rooms, &content);
            info!(path = %path.display(), rooms = n, "room layouts loaded");
        }
        Err(e) => {
            warn!(path = %path.display(), "room file not used: {e}");
        }
    }
    rooms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::Tile;

    #[test]
    fn builtin_rooms_all_have_cups_and_a_start() {
        for (i, room) in builtin_rooms().iter().enumerate() {
            assert!(room.cups_in_room > 0, "room {i} has no cups");
            assert!(room.has_start_marker(), "room {i} has no start");
        }
        assert_eq!(builtin_rooms()[0].cups_in_room, 2);
        assert_eq!(builtin_rooms()[5].cups_in_room, 6);
    }

    #[test]
    fn overrides_replace_rooms_in_order() {
        let mut rooms = builtin_rooms();
        let text = "# custom\n\
                    3              P\n\
                    HHHHHHHHHHHHHHHH\n\
                    \n\
                    # second\n\
                    33\n\
                    P\n";
        assert_eq!(apply_overrides(&mut rooms, text), 2);
        assert_eq!(rooms[0].tile_at(15, 0), Tile::Start);
        assert_eq!(rooms[0].count(Tile::Ladder), 16);
        assert_eq!(rooms[1].cups_in_room, 2);
        // Untouched
        assert_eq!(rooms[2], builtin_rooms()[2]);
    }

    #[test]
    fn unpaired_row_is_dropped() {
        let mut rooms = builtin_rooms();
        assert_eq!(apply_overrides(&mut rooms, "3\nP\nFFF\n"), 1);
        assert_eq!(rooms[1], builtin_rooms()[1]);
    }

    #[test]
    fn missing_file_keeps_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let rooms = load_rooms(Some(&dir.path().join("nope.txt")));
        assert_eq!(rooms, builtin_rooms());
    }
}
