//! Roll sources for critical-hit resolution.
//!
//! Execution code never reaches for a global RNG: it asks a [`Roll`] for the
//! next value in `[0.0, 1.0)`. Production code plugs in a thread RNG, tests and
//! replays plug in one of the deterministic sources below.

/// Something that produces uniform rolls in `[0.0, 1.0)`.
pub trait Roll {
    fn roll(&mut self) -> f32;
}

/// Deterministic roll from attacker seed, target seed, and a sequence number.
/// Returns a value in [0.0, 1.0).
pub fn deterministic_roll(attacker_seed: u64, target_seed: u64, seq: u32) -> f32 {
    let mut hash: u64 = attacker_seed;
    hash ^= target_seed;
    hash = hash.wrapping_mul(0x100000001b3);
    hash ^= seq as u64;
    hash = hash.wrapping_mul(0x100000001b3);
    (hash & 0x00FF_FFFF) as f32 / 0x0100_0000 as f32
}

/// Always returns the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedRoll(pub f32);

impl Roll for FixedRoll {
    fn roll(&mut self) -> f32 {
        self.0
    }
}

/// Plays back a fixed list of rolls, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct ScriptedRoll {
    rolls: Vec<f32>,
    cursor: usize,
}

impl ScriptedRoll {
    pub fn new(rolls: impl Into<Vec<f32>>) -> Self {
        Self {
            rolls: rolls.into(),
            cursor: 0,
        }
    }

    /// Number of rolls handed out so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl Roll for ScriptedRoll {
    fn roll(&mut self) -> f32 {
        if self.rolls.is_empty() {
            return 0.0;
        }
        let value = self.rolls[self.cursor % self.rolls.len()];
        self.cursor += 1;
        value
    }
}

/// Seeded hash sequence; same seeds give the same rolls on every machine.
#[derive(Debug, Clone)]
pub struct SeededRoll {
    pub attacker_seed: u64,
    pub target_seed: u64,
    seq: u32,
}

impl SeededRoll {
    pub fn new(attacker_seed: u64, target_seed: u64) -> Self {
        Self {
            attacker_seed,
            target_seed,
            seq: 0,
        }
    }
}

impl Roll for SeededRoll {
    fn roll(&mut self) -> f32 {
        let value = deterministic_roll(self.attacker_seed, self.target_seed, self.seq);
        self.seq = self.seq.wrapping_add(1);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_roll_in_unit_range() {
        for seq in 0..256 {
            let r = deterministic_roll(0xDEAD_BEEF, 42, seq);
            assert!((0.0..1.0).contains(&r), "roll out of range: {r}");
        }
    }

    #[test]
    fn test_seeded_roll_repeats_for_same_seeds() {
        let mut a = SeededRoll::new(7, 11);
        let mut b = SeededRoll::new(7, 11);
        let first: Vec<f32> = (0..8).map(|_| a.roll()).collect();
        let second: Vec<f32> = (0..8).map(|_| b.roll()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_scripted_roll_wraps() {
        let mut roll = ScriptedRoll::new(vec![0.1, 0.9]);
        assert_eq!(roll.roll(), 0.1);
        assert_eq!(roll.roll(), 0.9);
        assert_eq!(roll.roll(), 0.1);
        assert_eq!(roll.consumed(), 3);
    }
}
