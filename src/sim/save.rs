/// High-score table persistence: a checksum-guarded record in storage.
///
/// ## Record layout (at `HIGHSCORE_ADDR`)
///   ```
///   offset 0..6   three scores, u16 little-endian, highest first
///   offset 6      checksum: XOR of every score's low and high byte
///   ```
///
/// ## Load rules
///   - checksum mismatch  → table zeroed and written back once
///   - slot reads 0xFFFF  → treated as 0 (erased cell in a valid record)
///
/// Storage faults never stop the game: a failed read behaves like a
/// corrupt record, a failed write is logged and the in-memory table stays.

use tracing::{info, warn};

use crate::hw::{Storage, StorageError};

pub const HIGHSCORE_ADDR: usize = 0;
pub const HIGHSCORE_SLOTS: usize = 3;
pub const RECORD_LEN: usize = HIGHSCORE_SLOTS * 2 + 1;

const ERASED_SLOT: u16 = 0xFFFF;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct HighscoreTable {
    scores: [u16; HIGHSCORE_SLOTS],
}

impl HighscoreTable {
    #[cfg(test)]
    pub fn from_scores(scores: [u16; HIGHSCORE_SLOTS]) -> Self {
        HighscoreTable { scores }
    }

    #[cfg(test)]
    pub fn scores(&self) -> &[u16; HIGHSCORE_SLOTS] {
        &self.scores
    }

    /// Score in slot `rank` (0 = best). Out of range reads 0.
    pub fn get(&self, rank: usize) -> u16 {
        self.scores.get(rank).copied().unwrap_or(0)
    }

    pub fn lowest(&self) -> u16 {
        self.scores[HIGHSCORE_SLOTS - 1]
    }

    /// Strictly greater than the lowest entry.
    pub fn is_new_highscore(&self, score: u16) -> bool {
        score > self.lowest()
    }

    /// Ordered insert keeping the top three. A score equal to any entry
    /// already in the table is not inserted. Returns whether the table
    /// changed.
    pub fn insert(&mut self, score: u16) -> bool {
        if self.scores.contains(&score) {
            return false;
        }
        let Some(rank) = self.scores.iter().position(|&s| score > s) else {
            return false;
        };
        self.scores.copy_within(rank..HIGHSCORE_SLOTS - 1, rank + 1);
        self.scores[rank] = score;
        true
    }

    pub fn checksum(scores: &[u16; HIGHSCORE_SLOTS]) -> u8 {
        scores.iter().fold(0u8, |acc, s| {
            let [lo, hi] = s.to_le_bytes();
            acc ^ lo ^ hi
        })
    }

    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        for (i, s) in self.scores.iter().enumerate() {
            out[i * 2..i * 2 + 2].copy_from_slice(&s.to_le_bytes());
        }
        out[RECORD_LEN - 1] = Self::checksum(&self.scores);
        out
    }

    /// Validate a raw record. `None` means the checksum did not match.
    pub fn decode(record: &[u8; RECORD_LEN]) -> Option<Self> {
        let mut raw = [0u16; HIGHSCORE_SLOTS];
        for (i, slot) in raw.iter_mut().enumerate() {
            *slot = u16::from_le_bytes([record[i * 2], record[i * 2 + 1]]);
        }
        if Self::checksum(&raw) != record[RECORD_LEN - 1] {
            return None;
        }
        let scores = raw.map(|s| if s == ERASED_SLOT { 0 } else { s });
        Some(HighscoreTable { scores })
    }

    /// Load from storage, recovering from corruption by zeroing the table
    /// and writing it back.
    pub fn load<S: Storage>(storage: &mut S) -> Self {
        let mut record = [0u8; RECORD_LEN];
        let decoded = match storage.read(HIGHSCORE_ADDR, &mut record) {
            Ok(()) => Self::decode(&record),
            Err(e) => {
                warn!("high-score read failed: {e}");
                None
            }
        };

        match decoded {
            Some(table) => {
                info!(scores = ?table.scores, "high scores loaded");
                table
            }
            None => {
                warn!("high-score checksum mismatch, resetting table");
                let table = HighscoreTable::default();
                if let Err(e) = table.persist(storage) {
                    warn!("high-score reset could not be saved: {e}");
                }
                table
            }
        }
    }

    pub fn persist<S: Storage>(&self, storage: &mut S) -> Result<(), StorageError> {
        storage.write(HIGHSCORE_ADDR, &self.encode())?;
        info!(scores = ?self.scores, "high scores saved");
        Ok(())
    }
}
