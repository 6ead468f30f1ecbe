/// Entry point and the cooperative main loop.
///
/// One pass of the loop, every few milliseconds:
///   1. drain keyboard and gamepad, feed the simulated joystick axes
///   2. raise button edges into the select/pause latches
///   3. handle_buttons → update (throttled to the game tick)
///   4. service the light, tone and backlight schedulers
///   5. present the current screen (throttled to the render interval)
///
/// Nothing in the loop blocks; every subsystem keeps its own cadence.

mod config;
mod domain;
mod fx;
mod hw;
mod sim;
mod ui;

use std::fs::File;
use std::io::{self, BufWriter};
use std::sync::Mutex;
use std::time::Duration;

use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{GameConfig, RendererKind};
use fx::backlight::AutoBacklight;
use fx::lights::AnimationScheduler;
use fx::tone::ToneSequencer;
use hw::host::{axis_extreme, Eeprom, SharedLevel, SimLine, SystemClock};
use hw::latch::ButtonLatch;
use hw::{Board, Hardware, ADC_CENTER};
use sim::controller::{GameStateMachine, Timing};
use sim::input::{AxisThresholds, InputPoller};
use sim::level::load_rooms;
use sim::world::RoomWorld;
use ui::buzzer::HostBuzzer;
use ui::gamepad::GamepadState;
use ui::keyboard::Keyboard;
use ui::lcd::{IndicatorPanel, LcdRenderer};
use ui::renderer::{Presenter, Renderer};
use ui::serial::SerialRenderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Sensor readings the L key switches between.
const LIT_ROOM: u16 = 800;
const DARK_ROOM: u16 = 100;

/// Edge latches for the two buttons. The only process-wide state.
static SELECT: ButtonLatch = ButtonLatch::new();
static PAUSE: ButtonLatch = ButtonLatch::new();

struct HostBoard;

impl Board for HostBoard {
    type Clock = SystemClock;
    type Light = SimLine;
    type Buzzer = HostBuzzer;
    type Analog = SharedLevel;
    type Storage = Eeprom;
}

/// Handles the loop keeps on peripherals the hardware context owns.
struct Wiring {
    x: SharedLevel,
    y: SharedLevel,
    ambient: SharedLevel,
}

fn main() {
    let config = GameConfig::load();
    init_tracing(&config);

    if let Err(e) = run(&config) {
        eprintln!("Game error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(config: &GameConfig) {
    let file = match File::create(&config.log_file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: could not open log {}: {e}", config.log_file.display());
            return;
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .compact()
        .init();
}

fn build_hardware(config: &GameConfig) -> (Hardware<HostBoard>, Wiring, IndicatorPanel) {
    let x = SharedLevel::new(ADC_CENTER);
    let y = SharedLevel::new(ADC_CENTER);
    let ambient = SharedLevel::new(config.display.ambient_light);
    let pitch = SharedLevel::new(0);
    let (defeat, win, bonus, backlight) =
        (SimLine::new(), SimLine::new(), SimLine::new(), SimLine::new());

    let storage = match Eeprom::open(&config.storage_file) {
        Ok(e) => e,
        Err(e) => {
            warn!("highscore storage {} unavailable, scores will not persist: {e}",
                config.storage_file.display());
            Eeprom::volatile()
        }
    };

    let thresholds = AxisThresholds { low: config.input.axis_low, high: config.input.axis_high };
    let mut hw = Hardware {
        clock: SystemClock::new(),
        input: InputPoller::new(x.clone(), y.clone(), &SELECT, &PAUSE, thresholds, config.input.debounce_ms),
        lights: AnimationScheduler::new(
            [defeat.clone(), win.clone(), bonus.clone()],
            config.timing.indicator_blink_ms,
        ),
        buzzer: ToneSequencer::new(HostBuzzer::new(pitch.clone(), true), config.timing.note_gap_ms),
        backlight: AutoBacklight::new(
            backlight.clone(),
            ambient.clone(),
            config.display.backlight_check_ms,
            config.display.brightness_threshold,
        ),
        storage,
    };
    hw.backlight.set_auto(config.display.auto_backlight);
    hw.buzzer.set_enabled(config.sound_enabled);

    let panel = IndicatorPanel { defeat, win, bonus, backlight, pitch };
    (hw, Wiring { x, y, ambient }, panel)
}

fn build_renderer(config: &GameConfig, panel: IndicatorPanel) -> Box<dyn Renderer> {
    let out = BufWriter::new(io::stdout());
    match config.display.renderer {
        RendererKind::Lcd => Box::new(LcdRenderer::new(out, Some(panel), true)),
        RendererKind::Serial => Box::new(SerialRenderer::new(out, true)),
    }
}

fn run(config: &GameConfig) -> Result<(), Box<dyn std::error::Error>> {
    let rooms = load_rooms(config.rooms_file.as_deref());
    let (mut hw, wiring, panel) = build_hardware(config);

    let timing = Timing {
        tick_ms: config.timing.tick_ms,
        respawn_ms: config.timing.respawn_ms,
        room_clear_ms: config.timing.room_clear_ms,
    };
    let mut machine = GameStateMachine::new(RoomWorld::new(rooms, config.lives), timing);
    machine.initialize(&mut hw);

    let mut presenter = Presenter::new(build_renderer(config, panel), config.timing.render_ms);
    let mut kb = Keyboard::new();

    let result = match presenter.initialize() {
        Ok(()) => play(&mut machine, &mut hw, &mut presenter, &mut kb, &wiring, config),
        Err(e) => Err(e.into()),
    };

    // Cleanup runs whether the session failed or not
    if kb.honor_release {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    hw.buzzer.stop();
    let shutdown = presenter.shutdown();
    info!(score = machine.world().score(), "cupcrawl stopped");
    result?;
    shutdown?;
    Ok(())
}

/// Everything after the display is up: input devices, then the loop.
fn play(
    machine: &mut GameStateMachine,
    hw: &mut Hardware<HostBoard>,
    presenter: &mut Presenter,
    kb: &mut Keyboard,
    wiring: &Wiring,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    kb.honor_release = enable_release_events();

    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        info!("gamepad detected");
    }

    match hw.storage.path() {
        Some(path) => info!("high scores stored in {}", path.display()),
        None => info!("high scores kept in memory only"),
    }
    info!("cupcrawl started");
    game_loop(machine, hw, presenter, kb, &mut gp, wiring, config)
}

/// Ask the terminal for key release events. Returns whether it agreed.
fn enable_release_events() -> bool {
    if !terminal::supports_keyboard_enhancement().unwrap_or(false) {
        return false;
    }
    execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok()
}

fn game_loop(
    machine: &mut GameStateMachine,
    hw: &mut Hardware<HostBoard>,
    presenter: &mut Presenter,
    kb: &mut Keyboard,
    gp: &mut GamepadState,
    wiring: &Wiring,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        kb.drain_events();
        gp.update();

        let actions = kb.actions();
        if actions.quit {
            break;
        }

        // ── Joystick ──
        let (x, y) = gp.stick().unwrap_or_else(|| {
            let (dx, dy) = kb.stick();
            (axis_extreme(dx), axis_extreme(dy))
        });
        wiring.x.set(x);
        wiring.y.set(y);

        // ── Buttons ──
        let now = hw.now();
        if actions.select || gp.select_pressed() {
            SELECT.notify(now, config.input.debounce_ms);
        }
        if actions.pause || gp.pause_pressed() {
            PAUSE.notify(now, config.input.debounce_ms);
        }

        // ── Host-only keys ──
        if actions.toggle_light {
            if hw.backlight.is_auto() {
                let dark = wiring.ambient.get() < config.display.brightness_threshold;
                wiring.ambient.set(if dark { LIT_ROOM } else { DARK_ROOM });
            } else {
                let on = !hw.backlight.is_on();
                hw.backlight.set(on);
            }
        }
        if actions.mute {
            let enabled = !hw.buzzer.is_enabled();
            hw.buzzer.set_enabled(enabled);
            info!(enabled, "sound toggled");
        }

        machine.handle_buttons(hw);
        machine.update(hw);
        hw.service(machine.state());
        presenter.present(machine, hw.now())?;

        std::thread::sleep(FRAME_SLEEP);
    }
    Ok(())
}
