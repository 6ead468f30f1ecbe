/// 16×2 character LCD, emulated in the terminal.
///
/// How it works:
///   1. Each render call composes text into `front` (two rows of 16 chars)
///   2. `update()` advances the scroll line, then compares `front` with
///      `back` (what the terminal shows) and emits only changed cells
///   3. All commands are batched with `queue!`, flushed once at the end
///
/// Text wider than 16 columns on the bottom row scrolls one step per
/// `SCROLL_INTERVAL`, wrapping around.
///
/// Under the glass sits an `IndicatorPanel`: the three status lamps, the
/// backlight and the buzzer pitch, read straight from the simulated lines.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Player, Room, ROOM_HEIGHT, ROOM_WIDTH};
use crate::domain::tile::Tile;
use crate::hw::host::{SharedLevel, SimLine};
use crate::sim::save::HighscoreTable;
use crate::sim::world::MenuOption;

use super::renderer::Renderer;

const COLS: usize = ROOM_WIDTH;
const ROWS: usize = ROOM_HEIGHT;
const SCROLL_INTERVAL: Duration = Duration::from_millis(300);

// Screen placement of the glass (inside a one-cell frame)
const ORIGIN_X: u16 = 2;
const ORIGIN_Y: u16 = 1;
const PANEL_Y: u16 = ORIGIN_Y + ROWS as u16 + 2;

const LIT_BG: Color = Color::Rgb { r: 120, g: 200, b: 60 };
const DARK_BG: Color = Color::Rgb { r: 30, g: 50, b: 20 };
const GLYPH: Color = Color::Rgb { r: 10, g: 20, b: 10 };
const DIM_GLYPH: Color = Color::Rgb { r: 70, g: 100, b: 60 };

type Grid = [[char; COLS]; ROWS];
const BLANK: Grid = [[' '; COLS]; ROWS];

fn glyph(tile: Tile) -> char {
    match tile {
        Tile::Empty | Tile::Start => ' ',
        Tile::Fire => '^',
        Tile::Ladder => 'H',
        Tile::Cup => 'U',
    }
}

const PLAYER_GLYPH: char = '@';

/// Status lamps and peripherals shown under the display.
pub struct IndicatorPanel {
    pub defeat: SimLine,
    pub win: SimLine,
    pub bonus: SimLine,
    pub backlight: SimLine,
    pub pitch: SharedLevel,
}

impl IndicatorPanel {
    fn compose(&self) -> String {
        let lamp = |line: &SimLine, name: &str| {
            format!("[{}] {name}", if line.is_high() { '*' } else { ' ' })
        };
        let tone = match self.pitch.get() {
            0 => "  --  ".to_string(),
            hz => format!("{hz:>4}Hz"),
        };
        format!(
            "{}  {}  {}   tone {}",
            lamp(&self.defeat, "DEFEAT"),
            lamp(&self.win, "WIN"),
            lamp(&self.bonus, "BONUS"),
            tone,
        )
    }
}

struct Scroll {
    text: Vec<char>,
    pos: usize,
    last_step: Instant,
}

pub struct LcdRenderer<W: Write> {
    writer: W,
    front: Grid,
    back: Option<Grid>,
    scroll: Option<Scroll>,
    panel: Option<IndicatorPanel>,
    /// Backlight level and panel text last drawn.
    shown_lit: Option<bool>,
    shown_panel: String,
    terminal: bool,
}

impl<W: Write> LcdRenderer<W> {
    /// `terminal` selects whether `initialize`/`shutdown` take over the
    /// real terminal (raw mode, alternate screen).
    pub fn new(writer: W, panel: Option<IndicatorPanel>, terminal: bool) -> Self {
        LcdRenderer {
            writer,
            front: BLANK,
            back: None,
            scroll: None,
            panel,
            shown_lit: None,
            shown_panel: String::new(),
            terminal,
        }
    }

    // ── Compose helpers ──

    fn clear_row(&mut self, row: usize) {
        self.front[row] = [' '; COLS];
    }

    /// Center `text` on `row`. Too-wide text on the bottom row scrolls;
    /// on the top row it is cut.
    fn centered(&mut self, text: &str, row: usize) {
        self.clear_row(row);
        let len = text.chars().count();
        if len > COLS && row == ROWS - 1 {
            self.start_scroll(text);
            return;
        }
        if row == ROWS - 1 {
            self.scroll = None;
        }
        let start = COLS.saturating_sub(len) / 2;
        for (i, ch) in text.chars().take(COLS).enumerate() {
            self.front[row][start + i] = ch;
        }
    }

    fn start_scroll(&mut self, text: &str) {
        let chars: Vec<char> = text.chars().collect();
        if self.scroll.as_ref().is_some_and(|s| s.text == chars) {
            self.draw_scroll();
            return;
        }
        self.scroll = Some(Scroll { text: chars, pos: 0, last_step: Instant::now() });
        self.draw_scroll();
    }

    fn draw_scroll(&mut self) {
        let Some(s) = &self.scroll else { return };
        let len = s.text.len();
        let mut line = [' '; COLS];
        for (i, cell) in line.iter_mut().enumerate() {
            *cell = s.text[(s.pos + i) % len];
        }
        self.front[ROWS - 1] = line;
    }

    fn scroll_step(&mut self) {
        if let Some(s) = &mut self.scroll {
            s.pos = (s.pos + 1) % s.text.len();
            s.last_step = Instant::now();
        }
        self.draw_scroll();
    }

    fn end_states(&mut self, title: &str, score: u16, new_highscore: bool) {
        self.centered(title, 0);
        let line = if new_highscore {
            format!("NEW HI: {score}")
        } else {
            format!("Score: {score}")
        };
        self.centered(&line, 1);
    }

    // ── Terminal output ──

    fn backlight_on(&self) -> bool {
        self.panel.as_ref().map_or(true, |p| p.backlight.is_high())
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let lit = self.backlight_on();
        let repaint = self.shown_lit != Some(lit);
        let (bg, fg) = if lit { (LIT_BG, GLYPH) } else { (DARK_BG, DIM_GLYPH) };

        queue!(self.writer, SetBackgroundColor(bg), SetForegroundColor(fg))?;
        for row in 0..ROWS {
            for col in 0..COLS {
                let ch = self.front[row][col];
                let unchanged = !repaint && self.back.is_some_and(|b| b[row][col] == ch);
                if unchanged {
                    continue;
                }
                queue!(
                    self.writer,
                    MoveTo(ORIGIN_X + col as u16, ORIGIN_Y + row as u16),
                    Print(ch)
                )?;
            }
        }
        queue!(self.writer, ResetColor)?;

        if let Some(panel) = &self.panel {
            let text = panel.compose();
            if text != self.shown_panel {
                queue!(
                    self.writer,
                    MoveTo(0, PANEL_Y),
                    Clear(ClearType::CurrentLine),
                    Print(&text)
                )?;
                self.shown_panel = text;
            }
        }

        self.back = Some(self.front);
        self.shown_lit = Some(lit);
        self.writer.flush()
    }

    fn draw_frame(&mut self) -> io::Result<()> {
        let bar = "─".repeat(COLS + 2);
        queue!(self.writer, ResetColor, Clear(ClearType::All))?;
        queue!(self.writer, MoveTo(ORIGIN_X - 2, ORIGIN_Y - 1), Print(format!("┌{bar}┐")))?;
        for row in 0..ROWS as u16 {
            queue!(
                self.writer,
                MoveTo(ORIGIN_X - 2, ORIGIN_Y + row),
                Print("│"),
                MoveTo(ORIGIN_X + COLS as u16 + 1, ORIGIN_Y + row),
                Print("│")
            )?;
        }
        queue!(
            self.writer,
            MoveTo(ORIGIN_X - 2, ORIGIN_Y + ROWS as u16),
            Print(format!("└{bar}┘")),
            MoveTo(0, PANEL_Y + 2),
            Print("arrows/WASD move  enter select  P pause  L light  M mute  Q quit")
        )?;
        self.back = None;
        self.shown_panel.clear();
        Ok(())
    }

    #[cfg(test)]
    fn row_text(&self, row: usize) -> String {
        self.front[row].iter().collect()
    }
}

impl<W: Write> Renderer for LcdRenderer<W> {
    fn initialize(&mut self) -> io::Result<()> {
        if self.terminal {
            terminal::enable_raw_mode()?;
            execute!(self.writer, terminal::EnterAlternateScreen, cursor::Hide)?;
        }
        self.draw_frame()?;
        self.front = BLANK;
        self.flush_diff()
    }

    fn clear(&mut self) -> io::Result<()> {
        self.front = BLANK;
        self.scroll = None;
        self.back = None;
        Ok(())
    }

    fn render_menu(&mut self, selected: MenuOption, highscores: &HighscoreTable) -> io::Result<()> {
        match selected.highscore_rank() {
            None => {
                self.centered("MAIN MENU", 0);
                self.centered("> START GAME <", 1);
            }
            Some(rank) => {
                self.centered("HIGHSCORES", 0);
                let place = ["1st", "2nd", "3rd"][rank];
                self.centered(&format!("{place}: {}", highscores.get(rank)), 1);
            }
        }
        Ok(())
    }

    fn render_game(&mut self, room: &Room, player: &Player, _score: u16, _room_number: u8) -> io::Result<()> {
        self.scroll = None;
        for row in 0..ROWS {
            for (col, &tile) in room.row(row).iter().enumerate() {
                self.front[row][col] = glyph(tile);
            }
        }
        if player.alive {
            self.front[player.row as usize][player.column as usize] = PLAYER_GLYPH;
        }
        Ok(())
    }

    fn render_pause(&mut self) -> io::Result<()> {
        self.centered("PAUSED", 0);
        self.centered("Press to resume", 1);
        Ok(())
    }

    fn render_game_over(&mut self, score: u16, new_highscore: bool) -> io::Result<()> {
        self.end_states("GAME OVER", score, new_highscore);
        Ok(())
    }

    fn render_victory(&mut self, score: u16, new_highscore: bool) -> io::Result<()> {
        self.end_states("VICTORY!", score, new_highscore);
        Ok(())
    }

    fn render_room_clear(&mut self, room_number: u8, score: u16) -> io::Result<()> {
        self.centered(&format!("ROOM {room_number} CLEARED! Score: {score}"), 1);
        self.centered("ROOM CLEARED!", 0);
        Ok(())
    }

    fn render_respawn_message(&mut self, seconds_remaining: u32) -> io::Result<()> {
        self.clear_row(0);
        self.centered(&format!("Respawn in {seconds_remaining}"), 1);
        Ok(())
    }

    fn update(&mut self) -> io::Result<()> {
        if self.scroll.as_ref().is_some_and(|s| s.last_step.elapsed() >= SCROLL_INTERVAL) {
            self.scroll_step();
        }
        self.flush_diff()
    }

    fn shutdown(&mut self) -> io::Result<()> {
        if !self.terminal {
            return Ok(());
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lcd() -> LcdRenderer<Vec<u8>> {
        LcdRenderer::new(Vec::new(), None, false)
    }

    #[test]
    fn text_is_centered() {
        let mut l = lcd();
        l.render_pause().unwrap();
        assert_eq!(l.row_text(0), "     PAUSED     ");
        assert_eq!(l.row_text(1), "Press to resume ");
    }

    #[test]
    fn game_grid_shows_tiles_and_player() {
        let mut l = lcd();
        let room = Room::from_rows("   3    H      3", "P  F    H       ");
        l.render_game(&room, &Player::new(1, 1), 0, 1).unwrap();
        assert_eq!(l.row_text(0), "   U    H      U");
        assert_eq!(l.row_text(1), " @ ^    H       ");

        let mut dead = Player::new(3, 1);
        dead.alive = false;
        l.render_game(&room, &dead, 0, 1).unwrap();
        assert_eq!(l.row_text(1), "   ^    H       ");
    }

    #[test]
    fn long_bottom_line_scrolls_and_wraps() {
        let mut l = lcd();
        l.render_room_clear(3, 120).unwrap();
        let text = "ROOM 3 CLEARED! Score: 120";
        assert_eq!(l.row_text(1), text[..16]);
        l.scroll_step();
        assert_eq!(l.row_text(1), text[1..17]);

        // Re-rendering the same text keeps the position
        l.render_room_clear(3, 120).unwrap();
        assert_eq!(l.row_text(1), text[1..17]);

        for _ in 0..text.len() - 1 {
            l.scroll_step();
        }
        assert_eq!(l.row_text(1), text[..16]);
    }

    #[test]
    fn menu_shows_selected_highscore() {
        let mut l = lcd();
        let table = HighscoreTable::from_scores([300, 200, 100]);
        l.render_menu(MenuOption::Highscore2, &table).unwrap();
        assert_eq!(l.row_text(0).trim(), "HIGHSCORES");
        assert_eq!(l.row_text(1).trim(), "2nd: 200");
        l.render_game_over(150, true).unwrap();
        assert_eq!(l.row_text(1).trim(), "NEW HI: 150");
    }

    #[test]
    fn unchanged_frame_writes_only_color_codes() {
        let mut l = lcd();
        l.render_pause().unwrap();
        l.update().unwrap();
        let first = l.writer.len();
        l.update().unwrap();
        let second = l.writer.len() - first;
        assert!(second < first / 4, "redraw wrote {second} bytes");
    }
}
