//! Lock-free transposition table shared between search workers
//!
//! Entries live in two parallel arrays of `AtomicU64`, one for keys and one
//! for payloads, all accessed with relaxed ordering. Instead of locking, the
//! stored key is the position hash XOR-ed with the payload word: a torn
//! write (key from one store, payload from another) fails the XOR check on
//! probe and reads as a miss. Stale or corrupt reads therefore cost only a
//! cache miss, never a wrong hit.
//!
//! Sizing is a power of two so indexing is a mask of the hash. If the
//! backing allocation fails the table degrades to a zero-entry cache and
//! every operation becomes a no-op.

use std::sync::atomic::{AtomicU64, Ordering};

use log::warn;

use crate::board::Pos;

/// Bytes per entry: one key word plus one payload word.
const ENTRY_BYTES: usize = 16;

const VALUE_SHIFT: u32 = 0;
const MOVE_SHIFT: u32 = 32;
const DEPTH_SHIFT: u32 = 40;
const BOUND_SHIFT: u32 = 47;
const GEN_SHIFT: u32 = 49;

const MOVE_NONE: u64 = 0xFF;

/// How a stored value relates to the true score of the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Exact score inside the search window
    Exact,
    /// Score failed high; the true value is at least this
    Lower,
    /// Score failed low; the true value is at most this
    Upper,
}

impl Bound {
    #[inline]
    fn to_bits(self) -> u64 {
        match self {
            Bound::Exact => 0,
            Bound::Lower => 1,
            Bound::Upper => 2,
        }
    }

    #[inline]
    fn from_bits(bits: u64) -> Self {
        match bits {
            0 => Bound::Exact,
            1 => Bound::Lower,
            _ => Bound::Upper,
        }
    }
}

/// Outcome of a probe: a move to try first, and possibly a value that
/// terminates the node outright.
#[derive(Debug, Clone, Copy, Default)]
pub struct TtProbe {
    /// Cutoff value when the stored entry is deep enough and its bound
    /// closes the window
    pub value: Option<i32>,
    /// Best move recorded for this position, regardless of depth
    pub best_move: Option<Pos>,
}

#[inline]
fn pack_move(pos: Option<Pos>) -> u64 {
    match pos {
        Some(p) => ((p.row as u64) << 4) | p.col as u64,
        None => MOVE_NONE,
    }
}

#[inline]
fn unpack_move(bits: u64) -> Option<Pos> {
    if bits == MOVE_NONE {
        None
    } else {
        Some(Pos::new((bits >> 4) as u8, (bits & 0xF) as u8))
    }
}

#[inline]
fn pack(value: i32, depth: u8, bound: Bound, best_move: Option<Pos>, generation: u64) -> u64 {
    (value as u32 as u64) << VALUE_SHIFT
        | pack_move(best_move) << MOVE_SHIFT
        | (depth as u64 & 0x7F) << DEPTH_SHIFT
        | bound.to_bits() << BOUND_SHIFT
        | (generation & 0xFF) << GEN_SHIFT
}

#[inline]
fn unpack_value(data: u64) -> i32 {
    (data >> VALUE_SHIFT) as u32 as i32
}

#[inline]
fn unpack_depth(data: u64) -> u8 {
    ((data >> DEPTH_SHIFT) & 0x7F) as u8
}

#[inline]
fn unpack_generation(data: u64) -> u64 {
    (data >> GEN_SHIFT) & 0xFF
}

/// Shared search cache keyed by Zobrist hash.
pub struct TranspositionTable {
    keys: Vec<AtomicU64>,
    data: Vec<AtomicU64>,
    mask: u64,
    generation: AtomicU64,
}

impl TranspositionTable {
    /// Build a table of at most `bytes` bytes, rounded down to a power of
    /// two entries. On allocation failure the cache is disabled rather than
    /// aborting the process.
    pub fn new(bytes: usize) -> Self {
        let mut entries = 1usize;
        while entries * 2 * ENTRY_BYTES <= bytes {
            entries *= 2;
        }

        let mut keys: Vec<AtomicU64> = Vec::new();
        let mut data: Vec<AtomicU64> = Vec::new();
        if keys.try_reserve_exact(entries).is_err() || data.try_reserve_exact(entries).is_err() {
            warn!(
                "transposition table allocation of {} entries failed, cache disabled",
                entries
            );
            return Self {
                keys: Vec::new(),
                data: Vec::new(),
                mask: 0,
                generation: AtomicU64::new(0),
            };
        }
        keys.resize_with(entries, || AtomicU64::new(0));
        data.resize_with(entries, || AtomicU64::new(0));

        Self {
            keys,
            data,
            mask: (entries - 1) as u64,
            generation: AtomicU64::new(0),
        }
    }

    /// Whether the table holds any entries at all.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Number of entry slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.keys.len()
    }

    /// Advance the age counter; entries from earlier generations become
    /// preferred replacement victims.
    pub fn new_generation(&self) {
        self.generation.fetch_add(1, Ordering::Relaxed);
    }

    /// Reset every slot to empty.
    pub fn clear(&self) {
        for (key, data) in self.keys.iter().zip(&self.data) {
            key.store(0, Ordering::Relaxed);
            data.store(0, Ordering::Relaxed);
        }
    }

    #[inline]
    fn index(&self, hash: u64) -> usize {
        (hash & self.mask) as usize
    }

    /// Look up `hash`. A matching entry always yields its stored move; when
    /// the entry was searched at least `depth` plies deep, its bound is
    /// applied to the window: an exact value (or a bound that closes the
    /// window) is returned as a cutoff, otherwise `alpha`/`beta` are
    /// tightened in place.
    pub fn probe(&self, hash: u64, depth: u8, alpha: &mut i32, beta: &mut i32) -> TtProbe {
        if !self.is_enabled() {
            return TtProbe::default();
        }

        let slot = self.index(hash);
        let key = self.keys[slot].load(Ordering::Relaxed);
        let data = self.data[slot].load(Ordering::Relaxed);
        if data == 0 && key == 0 {
            return TtProbe::default();
        }
        if key ^ data != hash {
            return TtProbe::default();
        }

        let mut probe = TtProbe {
            value: None,
            best_move: unpack_move((data >> MOVE_SHIFT) & 0xFF),
        };
        if unpack_depth(data) < depth {
            return probe;
        }

        let value = unpack_value(data);
        match Bound::from_bits((data >> BOUND_SHIFT) & 0x3) {
            Bound::Exact => {
                probe.value = Some(value);
                return probe;
            }
            Bound::Lower => {
                if value >= *beta {
                    probe.value = Some(value);
                    return probe;
                }
                *alpha = (*alpha).max(value);
            }
            Bound::Upper => {
                if value <= *alpha {
                    probe.value = Some(value);
                    return probe;
                }
                *beta = (*beta).min(value);
            }
        }
        if *alpha >= *beta {
            probe.value = Some(*alpha);
        }
        probe
    }

    /// Record a search result. An occupied slot is overwritten when it holds
    /// the same position, comes from an older generation, or was searched no
    /// deeper than this result.
    pub fn store(&self, hash: u64, depth: u8, value: i32, bound: Bound, best_move: Option<Pos>) {
        if !self.is_enabled() {
            return;
        }

        let slot = self.index(hash);
        let old_key = self.keys[slot].load(Ordering::Relaxed);
        let old_data = self.data[slot].load(Ordering::Relaxed);
        let generation = self.generation.load(Ordering::Relaxed) & 0xFF;

        let occupied = old_key != 0 || old_data != 0;
        if occupied
            && old_key ^ old_data != hash
            && unpack_generation(old_data) == generation
            && unpack_depth(old_data) > depth
        {
            return;
        }

        let data = pack(value, depth, bound, best_move, generation);
        self.data[slot].store(data, Ordering::Relaxed);
        self.keys[slot].store(hash ^ data, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn small_table() -> TranspositionTable {
        TranspositionTable::new(1024 * ENTRY_BYTES)
    }

    #[test]
    fn test_capacity_power_of_two() {
        let tt = TranspositionTable::new(100 * ENTRY_BYTES);
        assert_eq!(tt.capacity(), 64);
        assert!(tt.is_enabled());
    }

    #[test]
    fn test_miss_on_empty() {
        let tt = small_table();
        let (mut a, mut b) = (-100, 100);
        let probe = tt.probe(0xDEADBEEF, 1, &mut a, &mut b);
        assert!(probe.value.is_none());
        assert!(probe.best_move.is_none());
        assert_eq!((a, b), (-100, 100));
    }

    #[test]
    fn test_store_and_probe_exact() {
        let tt = small_table();
        let mv = Some(Pos::new(7, 7));
        tt.store(0x1234, 4, 42, Bound::Exact, mv);

        let (mut a, mut b) = (-1000, 1000);
        let probe = tt.probe(0x1234, 4, &mut a, &mut b);
        assert_eq!(probe.value, Some(42));
        assert_eq!(probe.best_move, mv);
    }

    #[test]
    fn test_shallow_entry_yields_move_only() {
        let tt = small_table();
        let mv = Some(Pos::new(3, 9));
        tt.store(0x1234, 2, 42, Bound::Exact, mv);

        let (mut a, mut b) = (-1000, 1000);
        let probe = tt.probe(0x1234, 6, &mut a, &mut b);
        assert!(probe.value.is_none());
        assert_eq!(probe.best_move, mv);
    }

    #[test]
    fn test_lower_bound_tightens_alpha() {
        let tt = small_table();
        tt.store(0xABCD, 4, 50, Bound::Lower, None);

        let (mut a, mut b) = (-1000, 1000);
        let probe = tt.probe(0xABCD, 4, &mut a, &mut b);
        assert!(probe.value.is_none());
        assert_eq!(a, 50);

        // With beta already below the bound the probe cuts off.
        let (mut a, mut b) = (-1000, 40);
        let probe = tt.probe(0xABCD, 4, &mut a, &mut b);
        assert_eq!(probe.value, Some(50));
        let _ = (a, b);
    }

    #[test]
    fn test_upper_bound_tightens_beta() {
        let tt = small_table();
        tt.store(0xABCD, 4, -30, Bound::Upper, None);

        let (mut a, mut b) = (-1000, 1000);
        let probe = tt.probe(0xABCD, 4, &mut a, &mut b);
        assert!(probe.value.is_none());
        assert_eq!(b, -30);
    }

    #[test]
    fn test_bounds_closing_window_cut_off() {
        let tt = small_table();
        tt.store(0x7777, 4, 10, Bound::Lower, None);

        let (mut a, mut b) = (5, 10);
        let probe = tt.probe(0x7777, 4, &mut a, &mut b);
        assert_eq!(probe.value, Some(10));
    }

    #[test]
    fn test_wrong_hash_is_miss() {
        let tt = small_table();
        tt.store(0x1234, 4, 42, Bound::Exact, None);

        // Same slot index, different full hash.
        let colliding = 0x1234 ^ ((tt.capacity() as u64) << 20);
        let (mut a, mut b) = (-1000, 1000);
        let probe = tt.probe(colliding, 1, &mut a, &mut b);
        assert!(probe.value.is_none());
        assert!(probe.best_move.is_none());
    }

    #[test]
    fn test_deeper_entry_survives_shallow_store() {
        let tt = small_table();
        tt.store(0x1111, 8, 100, Bound::Exact, Some(Pos::new(1, 1)));

        // A shallower result for a colliding position must not evict it.
        let colliding = 0x1111 ^ ((tt.capacity() as u64) << 30);
        tt.store(colliding, 2, -5, Bound::Exact, Some(Pos::new(2, 2)));

        let (mut a, mut b) = (-1000, 1000);
        let probe = tt.probe(0x1111, 8, &mut a, &mut b);
        assert_eq!(probe.value, Some(100));
    }

    #[test]
    fn test_stale_generation_is_replaced() {
        let tt = small_table();
        tt.store(0x2222, 8, 100, Bound::Exact, None);
        tt.new_generation();

        let colliding = 0x2222 ^ ((tt.capacity() as u64) << 30);
        tt.store(colliding, 1, 7, Bound::Exact, None);

        let (mut a, mut b) = (-1000, 1000);
        assert!(tt.probe(0x2222, 1, &mut a, &mut b).value.is_none());
        let probe = tt.probe(colliding, 1, &mut a, &mut b);
        assert_eq!(probe.value, Some(7));
    }

    #[test]
    fn test_same_position_always_updates() {
        let tt = small_table();
        tt.store(0x3333, 8, 100, Bound::Exact, None);
        tt.store(0x3333, 2, 55, Bound::Exact, Some(Pos::new(4, 4)));

        let (mut a, mut b) = (-1000, 1000);
        let probe = tt.probe(0x3333, 2, &mut a, &mut b);
        assert_eq!(probe.value, Some(55));
        assert_eq!(probe.best_move, Some(Pos::new(4, 4)));
    }

    #[test]
    fn test_negative_values_roundtrip() {
        let tt = small_table();
        tt.store(0x4444, 3, -99_999_999, Bound::Exact, None);

        let (mut a, mut b) = (i32::MIN + 1, i32::MAX);
        let probe = tt.probe(0x4444, 3, &mut a, &mut b);
        assert_eq!(probe.value, Some(-99_999_999));
    }

    #[test]
    fn test_clear_empties_table() {
        let tt = small_table();
        tt.store(0x5555, 4, 1, Bound::Exact, Some(Pos::new(0, 0)));
        tt.clear();

        let (mut a, mut b) = (-1000, 1000);
        let probe = tt.probe(0x5555, 0, &mut a, &mut b);
        assert!(probe.value.is_none());
        assert!(probe.best_move.is_none());
    }

    #[test]
    fn test_concurrent_store_probe() {
        let tt = Arc::new(small_table());
        let mut handles = Vec::new();
        for t in 0..4u64 {
            let tt = Arc::clone(&tt);
            handles.push(std::thread::spawn(move || {
                for i in 0..10_000u64 {
                    let hash = i.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ t;
                    tt.store(hash, (i % 16) as u8, i as i32, Bound::Exact, None);
                    let (mut a, mut b) = (i32::MIN + 1, i32::MAX);
                    let probe = tt.probe(hash, 0, &mut a, &mut b);
                    // Either a miss (evicted or torn) or the exact value
                    // some thread stored for this hash.
                    if let Some(v) = probe.value {
                        assert_eq!(v as u64 & 0xFFFF_FFFF, v as u32 as u64);
                    }
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
    }
}
