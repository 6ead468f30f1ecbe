/// Host stand-ins for the board peripherals.
///
///   - `SystemClock`  - `Instant`-based millisecond counter
///   - `SimLine`      - digital output line; clones share one level
///   - `SharedLevel`  - analog channel whose value is set from elsewhere
///   - `Eeprom`       - 1 KiB erased-to-0xFF image, optionally file-backed
///
/// `SimLine` and `SharedLevel` are cheap `Arc` handles so the keyboard,
/// gamepad and display code can observe or feed a peripheral that the
/// hardware context owns.

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use embedded_hal::digital::{ErrorType, OutputPin};

use super::{AnalogInput, Clock, Storage, StorageError, ADC_CENTER, ADC_MAX};

pub const EEPROM_SIZE: usize = 1024;
const ERASED: u8 = 0xFF;

// ── Clock ──

pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock { start: Instant::now() }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        // Truncation is the wraparound
        self.start.elapsed().as_millis() as u32
    }
}

// ── Digital output ──

#[derive(Clone, Default)]
pub struct SimLine {
    level: Arc<AtomicBool>,
    toggles: Arc<AtomicU32>,
}

impl SimLine {
    pub fn new() -> Self {
        SimLine::default()
    }

    pub fn is_high(&self) -> bool {
        self.level.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    /// Number of level changes written so far.
    pub fn toggles(&self) -> u32 {
        self.toggles.load(Ordering::Relaxed)
    }

    fn write(&self, high: bool) {
        if self.level.swap(high, Ordering::Relaxed) != high {
            self.toggles.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl ErrorType for SimLine {
    type Error = Infallible;
}

impl OutputPin for SimLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}

// ── Analog input ──

#[derive(Clone)]
pub struct SharedLevel(Arc<AtomicU16>);

impl SharedLevel {
    pub fn new(value: u16) -> Self {
        SharedLevel(Arc::new(AtomicU16::new(value)))
    }

    pub fn set(&self, value: u16) {
        self.0.store(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u16 {
        self.0.load(Ordering::Relaxed)
    }
}

impl AnalogInput for SharedLevel {
    fn read(&mut self) -> u16 {
        self.get()
    }
}

/// Axis reading for a stick pushed to one end (`-1`, `1`) or resting (`0`).
/// Negative is left on X and up on Y.
pub fn axis_extreme(d: i8) -> u16 {
    match d.signum() {
        -1 => 0,
        1 => ADC_MAX,
        _ => ADC_CENTER,
    }
}

// ── Persistent storage ──

/// EEPROM image. With a backing file every write is flushed through
/// immediately; a volatile image forgets everything at exit.
pub struct Eeprom {
    image: [u8; EEPROM_SIZE],
    path: Option<PathBuf>,
}

impl Eeprom {
    /// Fresh erased image with no backing file.
    pub fn volatile() -> Self {
        Eeprom { image: [ERASED; EEPROM_SIZE], path: None }
    }

    /// Open a file-backed image. A missing file reads as erased and is
    /// created on the first write.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let mut image = [ERASED; EEPROM_SIZE];
        match std::fs::read(path) {
            Ok(bytes) => {
                let n = bytes.len().min(EEPROM_SIZE);
                image[..n].copy_from_slice(&bytes[..n]);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(Eeprom { image, path: Some(path.to_path_buf()) })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn check(addr: usize, len: usize) -> Result<(), StorageError> {
        let end = addr.saturating_add(len);
        if end > EEPROM_SIZE {
            return Err(StorageError::OutOfRange { addr, end, capacity: EEPROM_SIZE });
        }
        Ok(())
    }
}

impl Storage for Eeprom {
    fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        Self::check(addr, buf.len())?;
        buf.copy_from_slice(&self.image[addr..addr + buf.len()]);
        Ok(())
    }

    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError> {
        Self::check(addr, data.len())?;
        self.image[addr..addr + data.len()].copy_from_slice(data);
        if let Some(path) = &self.path {
            std::fs::write(path, self.image)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_line_counts_level_changes_only() {
        let mut line = SimLine::new();
        let probe = line.clone();
        line.set_low().unwrap();
        line.set_high().unwrap();
        line.set_high().unwrap();
        line.set_low().unwrap();
        assert!(!probe.is_high());
        assert_eq!(probe.toggles(), 2);
    }

    #[test]
    fn volatile_eeprom_starts_erased() {
        let mut e = Eeprom::volatile();
        let mut buf = [0u8; 4];
        e.read(100, &mut buf).unwrap();
        assert_eq!(buf, [0xFF; 4]);
    }

    #[test]
    fn eeprom_rejects_out_of_range() {
        let mut e = Eeprom::volatile();
        let err = e.write(EEPROM_SIZE - 2, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, StorageError::OutOfRange { end: 1025, .. }));
    }

    #[test]
    fn file_backed_eeprom_persists_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.eep");

        let mut e = Eeprom::open(&path).unwrap();
        e.write(3, &[7, 8, 9]).unwrap();
        drop(e);

        let mut reopened = Eeprom::open(&path).unwrap();
        let mut buf = [0u8; 5];
        reopened.read(2, &mut buf).unwrap();
        assert_eq!(buf, [0xFF, 7, 8, 9, 0xFF]);
    }
}
