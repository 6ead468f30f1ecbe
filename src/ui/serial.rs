/// Plain-text stream renderer, the serial-monitor variant.
///
/// Every screen is composed as a block of lines. A block is written only
/// when it differs from the previous one, so a steady screen does not
/// flood the stream. Lines end in `\r\n` (the terminal is in raw mode).

use std::io::{self, Write};

use crossterm::terminal;

use crate::domain::entity::{Player, Room, ROOM_HEIGHT};
use crate::domain::tile::Tile;
use crate::sim::save::HighscoreTable;
use crate::sim::world::MenuOption;

use super::renderer::Renderer;

const WIDTH: usize = 18;
const SEPARATOR: &str = "==================";

fn symbol(tile: Tile) -> char {
    match tile {
        Tile::Empty | Tile::Start => ' ',
        Tile::Fire => 'F',
        Tile::Ladder => 'H',
        Tile::Cup => 'C',
    }
}

pub struct SerialRenderer<W: Write> {
    writer: W,
    block: Vec<String>,
    last_block: Vec<String>,
    terminal: bool,
}

impl<W: Write> SerialRenderer<W> {
    pub fn new(writer: W, terminal: bool) -> Self {
        SerialRenderer { writer, block: Vec::new(), last_block: Vec::new(), terminal }
    }

    fn line(&mut self, text: impl Into<String>) {
        self.block.push(text.into());
    }

    fn centered(&mut self, text: &str) {
        let pad = WIDTH.saturating_sub(text.len()) / 2;
        self.line(format!("{}{text}", " ".repeat(pad)));
    }

    fn banner(&mut self, title: &str) {
        self.block.clear();
        self.line(SEPARATOR);
        self.centered(title);
        self.line(SEPARATOR);
    }

    fn final_score(&mut self, score: u16, new_highscore: bool) {
        self.line(format!("Final Score: {score}"));
        if new_highscore {
            self.line("*** NEW HIGHSCORE! ***");
        }
    }
}

impl<W: Write> Renderer for SerialRenderer<W> {
    fn initialize(&mut self) -> io::Result<()> {
        if self.terminal {
            terminal::enable_raw_mode()?;
        }
        write!(self.writer, "=== Serial Renderer Initialized ===\r\n")?;
        self.writer.flush()
    }

    fn clear(&mut self) -> io::Result<()> {
        self.block.clear();
        self.last_block.clear();
        write!(self.writer, "\r\n\r\n")
    }

    fn render_menu(&mut self, selected: MenuOption, highscores: &HighscoreTable) -> io::Result<()> {
        self.banner("MAIN MENU");
        let mark = |on: bool| if on { "> " } else { "  " };
        self.line(format!("{}START GAME", mark(selected == MenuOption::StartGame)));
        for (rank, place) in ["1st", "2nd", "3rd"].iter().enumerate() {
            let on = selected.highscore_rank() == Some(rank);
            self.line(format!("{}HIGHSCORE #{}", mark(on), rank + 1));
            if on {
                self.line(format!("  {place} Place: {}", highscores.get(rank)));
            }
        }
        self.line(SEPARATOR);
        self.line("Navigate: UP/DOWN");
        self.line("Select: BUTTON");
        Ok(())
    }

    fn render_game(&mut self, room: &Room, player: &Player, score: u16, room_number: u8) -> io::Result<()> {
        self.block.clear();
        self.line(SEPARATOR);
        self.line(format!("Room: {room_number}  Score: {score}"));
        self.line(format!("Cups: {}/{}", room.cups_collected, room.cups_in_room));
        self.line(SEPARATOR);
        for row in 0..ROOM_HEIGHT {
            let mut text = String::with_capacity(18);
            text.push('|');
            for (col, &tile) in room.row(row).iter().enumerate() {
                let here = player.alive && player.row as usize == row && player.column as usize == col;
                text.push(if here { 'P' } else { symbol(tile) });
            }
            text.push('|');
            self.line(text);
        }
        self.line(SEPARATOR);
        self.line("P=Player H=Ladder");
        self.line("F=Fire   C=Cup");
        Ok(())
    }

    fn render_pause(&mut self) -> io::Result<()> {
        self.banner("PAUSED");
        self.line("Press PAUSE to resume");
        Ok(())
    }

    fn render_game_over(&mut self, score: u16, new_highscore: bool) -> io::Result<()> {
        self.banner("GAME OVER");
        self.final_score(score, new_highscore);
        self.line("Press SELECT for menu");
        Ok(())
    }

    fn render_victory(&mut self, score: u16, new_highscore: bool) -> io::Result<()> {
        self.banner("VICTORY!");
        self.final_score(score, new_highscore);
        self.line("All rooms cleared!");
        self.line("Press SELECT for menu");
        Ok(())
    }

    fn render_room_clear(&mut self, room_number: u8, score: u16) -> io::Result<()> {
        self.banner("ROOM CLEARED!");
        self.line(format!("Room {room_number} Complete!"));
        self.line(format!("Score: {score}"));
        self.line("Moving to next room...");
        Ok(())
    }

    fn render_respawn_message(&mut self, seconds_remaining: u32) -> io::Result<()> {
        self.block.clear();
        self.line(format!("Respawning in {seconds_remaining} seconds..."));
        Ok(())
    }

    fn update(&mut self) -> io::Result<()> {
        if self.block.is_empty() || self.block == self.last_block {
            return Ok(());
        }
        for line in &self.block {
            write!(self.writer, "{line}\r\n")?;
        }
        self.writer.flush()?;
        self.last_block = std::mem::take(&mut self.block);
        Ok(())
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        if self.terminal {
            terminal::disable_raw_mode()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(r: &SerialRenderer<Vec<u8>>) -> String {
        String::from_utf8_lossy(&r.writer).into_owned()
    }

    #[test]
    fn game_block_shows_room_and_player() {
        let mut r = SerialRenderer::new(Vec::new(), false);
        let room = Room::from_rows("   3    H      3", "P  F    H       ");
        r.render_game(&room, &Player::new(0, 1), 20, 2).unwrap();
        r.update().unwrap();
        let out = output(&r);
        assert!(out.contains("Room: 2  Score: 20\r\n"));
        assert!(out.contains("Cups: 0/2\r\n"));
        assert!(out.contains("|   C    H      C|\r\n"));
        assert!(out.contains("|P  F    H       |\r\n"));
    }

    #[test]
    fn identical_frames_are_written_once() {
        let mut r = SerialRenderer::new(Vec::new(), false);
        r.render_pause().unwrap();
        r.update().unwrap();
        let once = r.writer.len();
        r.render_pause().unwrap();
        r.update().unwrap();
        assert_eq!(r.writer.len(), once);

        r.render_respawn_message(2).unwrap();
        r.update().unwrap();
        assert!(output(&r).ends_with("Respawning in 2 seconds...\r\n"));
    }

    #[test]
    fn new_highscore_is_announced() {
        let mut r = SerialRenderer::new(Vec::new(), false);
        r.render_victory(340, true).unwrap();
        r.update().unwrap();
        let out = output(&r);
        assert!(out.contains("VICTORY!"));
        assert!(out.contains("Final Score: 340\r\n*** NEW HIGHSCORE! ***\r\n"));
    }

    #[test]
    fn menu_marks_selection() {
        let mut r = SerialRenderer::new(Vec::new(), false);
        let table = HighscoreTable::from_scores([90, 50, 10]);
        r.render_menu(MenuOption::Highscore3, &table).unwrap();
        r.update().unwrap();
        let out = output(&r);
        assert!(out.contains("  START GAME\r\n"));
        assert!(out.contains("> HIGHSCORE #3\r\n  3rd Place: 10\r\n"));
    }
}
