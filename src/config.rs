/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD, or the
/// XDG data home). Falls back to sensible defaults if the file is missing
/// or incomplete.
///
///   [timing]   tick_ms, render_ms, respawn_ms, room_clear_ms,
///              note_gap_ms, indicator_blink_ms
///   [input]    axis_low, axis_high, debounce_ms
///   [display]  renderer ("lcd" | "serial"), auto_backlight,
///              backlight_check_ms, brightness_threshold, ambient_light
///   [sound]    enabled
///   [rules]    lives (0 = unlimited)
///   [gamepad]  select, pause (button names)
///   [general]  storage_file, rooms_file, log_file, log_level

use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".local/share/cupcrawl";

/// Unlimited: every death respawns.
pub const DEFAULT_LIVES: u8 = 0;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub input: InputConfig,
    pub display: DisplayConfig,
    pub sound_enabled: bool,
    pub lives: u8,
    pub gamepad: GamepadConfig,
    pub storage_file: PathBuf,
    pub rooms_file: Option<PathBuf>,
    pub log_file: PathBuf,
    pub log_level: String,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_ms: u32,
    pub render_ms: u32,
    pub respawn_ms: u32,
    pub room_clear_ms: u32,
    pub note_gap_ms: u32,
    pub indicator_blink_ms: u32,
}

#[derive(Clone, Debug)]
pub struct InputConfig {
    pub axis_low: u16,
    pub axis_high: u16,
    pub debounce_ms: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    Lcd,
    Serial,
}

#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub renderer: RendererKind,
    pub auto_backlight: bool,
    pub backlight_check_ms: u32,
    pub brightness_threshold: u16,
    /// Initial simulated light-sensor reading.
    pub ambient_light: u16,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub select: Vec<String>,
    pub pause: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    input: TomlInput,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    sound: TomlSound,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick")]
    tick_ms: u32,
    #[serde(default = "default_render")]
    render_ms: u32,
    #[serde(default = "default_respawn")]
    respawn_ms: u32,
    #[serde(default = "default_room_clear")]
    room_clear_ms: u32,
    #[serde(default = "default_note_gap")]
    note_gap_ms: u32,
    #[serde(default = "default_indicator_blink")]
    indicator_blink_ms: u32,
}

#[derive(Deserialize, Debug)]
struct TomlInput {
    #[serde(default = "default_axis_low")]
    axis_low: u16,
    #[serde(default = "default_axis_high")]
    axis_high: u16,
    #[serde(default = "default_debounce")]
    debounce_ms: u32,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_renderer")]
    renderer: RendererKind,
    #[serde(default = "default_true")]
    auto_backlight: bool,
    #[serde(default = "default_backlight_check")]
    backlight_check_ms: u32,
    #[serde(default = "default_brightness_threshold")]
    brightness_threshold: u16,
    #[serde(default = "default_ambient")]
    ambient_light: u16,
}

#[derive(Deserialize, Debug)]
struct TomlSound {
    #[serde(default = "default_true")]
    enabled: bool,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_lives")]
    lives: u8,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_select")]
    select: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_storage_file")]
    storage_file: String,
    #[serde(default)]
    rooms_file: Option<String>,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

// ── Defaults ──

fn default_tick() -> u32 { 50 }
fn default_render() -> u32 { 200 }
fn default_respawn() -> u32 { 2000 }
fn default_room_clear() -> u32 { 2000 }
fn default_note_gap() -> u32 { 50 }
fn default_indicator_blink() -> u32 { 500 }
fn default_axis_low() -> u16 { 400 }
fn default_axis_high() -> u16 { 700 }
fn default_debounce() -> u32 { 200 }
fn default_renderer() -> RendererKind { RendererKind::Lcd }
fn default_true() -> bool { true }
fn default_backlight_check() -> u32 { 500 }
fn default_brightness_threshold() -> u16 { 300 }
fn default_ambient() -> u16 { 800 }  // lit room, backlight off
fn default_lives() -> u8 { DEFAULT_LIVES }
fn default_select() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_pause() -> Vec<String> { vec!["Start".into(), "Select".into()] }
fn default_storage_file() -> String { "cupcrawl.eep".into() }
fn default_log_file() -> String { "cupcrawl.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_ms: default_tick(),
            render_ms: default_render(),
            respawn_ms: default_respawn(),
            room_clear_ms: default_room_clear(),
            note_gap_ms: default_note_gap(),
            indicator_blink_ms: default_indicator_blink(),
        }
    }
}

impl Default for TomlInput {
    fn default() -> Self {
        TomlInput {
            axis_low: default_axis_low(),
            axis_high: default_axis_high(),
            debounce_ms: default_debounce(),
        }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay {
            renderer: default_renderer(),
            auto_backlight: true,
            backlight_check_ms: default_backlight_check(),
            brightness_threshold: default_brightness_threshold(),
            ambient_light: default_ambient(),
        }
    }
}

impl Default for TomlSound {
    fn default() -> Self {
        TomlSound { enabled: true }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules { lives: default_lives() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            select: default_select(),
            pause: default_pause(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            storage_file: default_storage_file(),
            rooms_file: None,
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) XDG data home.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::resolve(toml_cfg, &search_dirs, &data_dir())
    }

    /// Build the runtime config. Relative data files (storage, log) land in
    /// `data_dir`; a relative rooms file is looked up in `search_dirs`.
    fn resolve(cfg: TomlConfig, search_dirs: &[PathBuf], data_dir: &Path) -> Self {
        let rooms_file = cfg.general.rooms_file.as_deref().map(|name| {
            let path = PathBuf::from(name);
            if path.is_absolute() {
                return path;
            }
            search_dirs.iter()
                .map(|d| d.join(name))
                .find(|p| p.is_file())
                .unwrap_or(path)
        });

        let (low, high) = if cfg.input.axis_low < cfg.input.axis_high {
            (cfg.input.axis_low, cfg.input.axis_high)
        } else {
            eprintln!("Warning: axis_low must be below axis_high; using defaults.");
            (default_axis_low(), default_axis_high())
        };

        GameConfig {
            timing: TimingConfig {
                tick_ms: cfg.timing.tick_ms,
                render_ms: cfg.timing.render_ms,
                respawn_ms: cfg.timing.respawn_ms,
                room_clear_ms: cfg.timing.room_clear_ms,
                note_gap_ms: cfg.timing.note_gap_ms,
                indicator_blink_ms: cfg.timing.indicator_blink_ms,
            },
            input: InputConfig {
                axis_low: low,
                axis_high: high,
                debounce_ms: cfg.input.debounce_ms,
            },
            display: DisplayConfig {
                renderer: cfg.display.renderer,
                auto_backlight: cfg.display.auto_backlight,
                backlight_check_ms: cfg.display.backlight_check_ms,
                brightness_threshold: cfg.display.brightness_threshold,
                ambient_light: cfg.display.ambient_light.min(crate::hw::ADC_MAX),
            },
            sound_enabled: cfg.sound.enabled,
            lives: cfg.rules.lives,
            gamepad: GamepadConfig {
                select: cfg.gamepad.select,
                pause: cfg.gamepad.pause,
            },
            storage_file: data_dir.join(&cfg.general.storage_file),
            rooms_file,
            log_file: data_dir.join(&cfg.general.log_file),
            log_level: cfg.general.log_level,
        }
    }
}

fn parse(text: &str) -> Result<TomlConfig, toml::de::Error> {
    toml::from_str::<TomlConfig>(text)
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/cupcrawl)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(APP_DIR);
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Writable directory for the EEPROM image and the log.
fn data_dir() -> PathBuf {
    // 1. Exe directory (works for local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let test_path = parent.join(".write_test_cupcrawl");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(APP_DIR);
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match parse(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
