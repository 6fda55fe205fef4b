//! Bit-parallel (SWAR) shape classification along a line
//!
//! A line is at most 15 bits, so two lines fit in one u64 with a 32-bit lane
//! each, and four lines fit in a pair of u64s. The classifier is a fixed
//! pipeline of shifts and ANDs with no per-cell branching: runs of length
//! 2..5 are built by cascaded self-ANDs, then each named shape is isolated by
//! intersecting a run mask with the empty-cell mask shifted to the shape's
//! extension points. Popcounts of the shape masks, times fixed weights, give
//! the line score.
//!
//! Shape overlaps are resolved the same way for every entry point: twos that
//! are part of a three are filtered out before scoring, gapped fours suppress
//! the false threes they contain, and composite shapes (an open four also
//! matches two blocked threes) use adjusted weights so the total comes out to
//! the named shape's score exactly.
//!
//! The packed variants evaluate each 32-bit lane independently, including the
//! five-in-a-row short-circuit, so unpacking a lane is bit-identical to
//! evaluating that line alone.

use super::PatternScore;
use crate::board::Line;

/// Low bits of a packed lane reserved for shape counts; the score occupies
/// the bits above.
const COUNT_BITS: u32 = 8;
/// Open-three count: lane bits 0..4. Four count: lane bits 4..8.
const FOUR_SHIFT: u32 = 4;
const COUNT_FIELD: u32 = 0xF;

/// Packed evaluation of one line for one player.
///
/// Bit layout: `score << 8 | fours << 4 | open_threes`. The counts feed the
/// forbidden-move heuristic only; the score is everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineEval(pub u32);

impl LineEval {
    pub const ZERO: LineEval = LineEval(0);

    /// Shape score for this line.
    #[inline]
    pub fn score(self) -> i32 {
        (self.0 >> COUNT_BITS) as i32
    }

    /// Number of open threes (straight or gapped) on this line.
    #[inline]
    pub fn open_threes(self) -> i32 {
        (self.0 & COUNT_FIELD) as i32
    }

    /// Number of fours (open, blocked, or gapped) on this line.
    #[inline]
    pub fn fours(self) -> i32 {
        ((self.0 >> FOUR_SHIFT) & COUNT_FIELD) as i32
    }
}

/// Four lines packed two per u64, lane i of `lo` holding line i and lane i
/// of `hi` holding line i + 2.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinePack {
    pub lo: u64,
    pub hi: u64,
}

/// Mask covering one 32-bit lane.
const LANE: u64 = 0xFFFF_FFFF;

/// Evaluate the two lanes of `me` against the shared empty mask `valid`.
///
/// All shape masks stay anchored to a term derived from `me` in the same
/// lane, so bits that shift across the lane boundary are ANDed away before
/// they can count. Returns two packed [`LineEval`] words.
fn lane_kernel(me: u64, valid: u64) -> u64 {
    // Runs of 2..5 by cascaded self-AND
    let runs2 = me & (me >> 1);
    let m3 = runs2 & (runs2 >> 1);
    let m4 = m3 & (m3 >> 1);
    let m5 = m4 & (m4 >> 1);

    // Both extension cells open / exactly one open
    let mask_open = (valid >> 4) & (valid << 1);
    let mask_half = (valid >> 4) ^ (valid << 1);

    // Drop twos that are part of a longer run
    let m2 = runs2 & !(m3 | (m3 << 1));

    let live2 = (valid << 1) & m2 & (valid >> 2);
    let rush2 = m2 & ((valid << 1) ^ (valid >> 2));
    let strong2 = (valid << 2) & live2 & (valid >> 3);

    // Gapped threes: X_XX and XX_X, live when both outer ends are open
    let jump3_a = me & (m2 >> 2) & (valid >> 1);
    let jump3_b = (me >> 3) & m2 & (valid >> 2);
    let gap3 = (jump3_a | jump3_b) & mask_open;

    let live4 = m4 & mask_open;
    let rush4 = m4 & mask_half;

    // Gapped fours: X_XXX, XX_XX, XXX_X
    let jump4_a = me & (valid >> 1) & (m3 >> 2);
    let jump4_b = m2 & (valid >> 2) & (m2 >> 3);
    let jump4_c = m3 & (valid >> 3) & (me >> 4);
    let jump4 = jump4_a | jump4_b | jump4_c;

    // A gapped four contains a three-run; suppress the false three
    let keep = !(jump4_a << 2) & !jump4_c;
    let live3 = (valid << 1) & m3 & (valid >> 3) & keep;
    let rush3 = ((valid << 1) ^ (valid >> 3)) & m3 & keep;

    let mut out = 0u64;
    for shift in [0u32, 32] {
        let pc = |x: u64| ((x >> shift) & LANE).count_ones();

        let lane = if pc(m5) != 0 {
            // Five on this lane dominates; counts stay zero
            (PatternScore::FIVE as u32) << COUNT_BITS
        } else {
            // Composite shapes double-match smaller ones, hence the
            // adjusted weights: e.g. an open four also matches two blocked
            // threes, so its weight is OPEN_FOUR - 2 * CLOSED_THREE.
            let mut score = pc(live2) * PatternScore::OPEN_TWO as u32;
            score += pc(rush2) * PatternScore::CLOSED_TWO as u32;
            score += pc(strong2) * PatternScore::STRONG_OPEN_TWO_BONUS as u32;
            score += pc(gap3) * (PatternScore::GAP_OPEN_THREE - PatternScore::OPEN_TWO) as u32;
            score += pc(live3) * PatternScore::OPEN_THREE as u32;
            score += pc(rush3) * PatternScore::CLOSED_THREE as u32;
            score += pc(live4) * (PatternScore::OPEN_FOUR - 2 * PatternScore::CLOSED_THREE) as u32;
            score += pc(rush4) * (PatternScore::CLOSED_FOUR - PatternScore::CLOSED_THREE) as u32;
            score += pc(jump4) * PatternScore::CLOSED_FOUR as u32;

            let threes = pc(live3) + pc(gap3);
            let fours = pc(live4) + pc(rush4) + pc(jump4);
            (score << COUNT_BITS) | (fours << FOUR_SHIFT) | threes
        };

        out |= (lane as u64) << shift;
    }
    out
}

#[inline]
fn len_mask(len: usize) -> u64 {
    (1u64 << len) - 1
}

/// Evaluate a single line of effective length `len` for the player holding
/// the `me` stones.
pub fn eval_line(me: Line, enemy: Line, len: usize) -> LineEval {
    let me = me as u64;
    let valid = !(me | enemy as u64) & len_mask(len);
    LineEval(lane_kernel(me, valid) as u32)
}

/// Evaluate two independent lines through one kernel pass.
///
/// Line 1 occupies the low lane, line 2 the high lane; use [`lanes2`] to
/// unpack. The per-lane results are bit-identical to two [`eval_line`] calls.
pub fn eval_lines2(
    me1: Line,
    enemy1: Line,
    len1: usize,
    me2: Line,
    enemy2: Line,
    len2: usize,
) -> u64 {
    let me = me1 as u64 | (me2 as u64) << 32;
    let enemy = enemy1 as u64 | (enemy2 as u64) << 32;
    let mask = len_mask(len1) | len_mask(len2) << 32;
    let valid = !(me | enemy) & mask;
    lane_kernel(me, valid)
}

/// Unpack the two lanes of an [`eval_lines2`] result.
#[inline]
pub fn lanes2(packed: u64) -> (LineEval, LineEval) {
    (LineEval(packed as u32), LineEval((packed >> 32) as u32))
}

/// Evaluate four lines for both players at once.
///
/// The empty masks are shared between the two colors of each line, so the
/// whole batch costs four kernel passes. Zero-masked lanes (diagonals
/// shorter than five) evaluate to zero.
pub fn eval_lines4(me: LinePack, enemy: LinePack, mask: LinePack) -> (LinePack, LinePack) {
    let valid_lo = !(me.lo | enemy.lo) & mask.lo;
    let valid_hi = !(me.hi | enemy.hi) & mask.hi;

    let me_eval = LinePack {
        lo: lane_kernel(me.lo, valid_lo),
        hi: lane_kernel(me.hi, valid_hi),
    };
    let enemy_eval = LinePack {
        lo: lane_kernel(enemy.lo, valid_lo),
        hi: lane_kernel(enemy.hi, valid_hi),
    };
    (me_eval, enemy_eval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{RngCore, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    const LEN: usize = 15;

    #[test]
    fn test_empty_line_scores_zero() {
        assert_eq!(eval_line(0, 0, LEN), LineEval::ZERO);
    }

    #[test]
    fn test_open_two() {
        // .OO............ with room on both sides
        let e = eval_line(0b0000_0110, 0, LEN);
        assert_eq!(e.score(), PatternScore::OPEN_TWO);
        assert_eq!(e.open_threes(), 0);
        assert_eq!(e.fours(), 0);
    }

    #[test]
    fn test_strong_open_two_bonus_is_additive() {
        // ..OO........... has two empties beyond each end
        let e = eval_line(0b0000_1100, 0, LEN);
        assert_eq!(
            e.score(),
            PatternScore::OPEN_TWO + PatternScore::STRONG_OPEN_TWO_BONUS
        );
    }

    #[test]
    fn test_closed_two() {
        // XOO............
        let e = eval_line(0b0000_0110, 0b0000_0001, LEN);
        assert_eq!(e.score(), PatternScore::CLOSED_TWO);
    }

    #[test]
    fn test_open_three() {
        // .OOO...........
        let e = eval_line(0b0000_1110, 0, LEN);
        assert_eq!(e.score(), PatternScore::OPEN_THREE);
        assert_eq!(e.open_threes(), 1);
        assert_eq!(e.fours(), 0);
    }

    #[test]
    fn test_closed_three() {
        // XOOO...........
        let e = eval_line(0b0000_1110, 0b0000_0001, LEN);
        assert_eq!(e.score(), PatternScore::CLOSED_THREE);
        assert_eq!(e.open_threes(), 0);
    }

    #[test]
    fn test_gapped_open_three() {
        // .OO.O.......... both outer ends open
        let e = eval_line(0b0001_0110, 0, LEN);
        assert_eq!(e.score(), PatternScore::GAP_OPEN_THREE);
        assert_eq!(e.open_threes(), 1);
    }

    #[test]
    fn test_open_four_composite_weight() {
        // .OOOO.......... scores exactly OPEN_FOUR despite also matching
        // two blocked threes
        let e = eval_line(0b0001_1110, 0, LEN);
        assert_eq!(e.score(), PatternScore::OPEN_FOUR);
        assert_eq!(e.fours(), 1);
        assert_eq!(e.open_threes(), 0);
    }

    #[test]
    fn test_closed_four_composite_weight() {
        // XOOOO..........
        let e = eval_line(0b0001_1110, 0b0000_0001, LEN);
        assert_eq!(e.score(), PatternScore::CLOSED_FOUR);
        assert_eq!(e.fours(), 1);
    }

    #[test]
    fn test_extended_gapped_four_counted_once() {
        // OO.OOO matches both X_XXX and XX_XX; the refined pair mask keeps
        // pairs inside the triple from double-counting the four.
        let e = eval_line(0b0011_1011_0000, 0, LEN);
        assert_eq!(e.fours(), 1);
    }

    #[test]
    fn test_gapped_four_counted_once() {
        // OO.OO..........
        let e = eval_line(0b0001_1011, 0, LEN);
        assert_eq!(e.fours(), 1);
        assert_eq!(e.open_threes(), 0, "gapped four must not count as a three");
        assert!(e.score() >= PatternScore::CLOSED_FOUR);
    }

    #[test]
    fn test_five_short_circuits() {
        let e = eval_line(0b0111_1100, 0, LEN);
        assert_eq!(e.score(), PatternScore::FIVE);
        assert_eq!(e.open_threes(), 0);
        assert_eq!(e.fours(), 0);
    }

    #[test]
    fn test_short_line_blocks_shapes() {
        // Four stones filling a 4-long diagonal: no room for five, and the
        // length mask leaves no extension points.
        let e = eval_line(0b1111, 0, 4);
        assert_eq!(e.fours(), 0);
        assert_eq!(e.score(), 0);
    }

    #[test]
    fn test_enemy_bits_never_score_for_me() {
        let e = eval_line(0, 0b0001_1110, LEN);
        assert_eq!(e, LineEval::ZERO);
    }

    /// Random masks, constrained so stones of the two colors never overlap.
    fn random_position(rng: &mut Xoshiro256PlusPlus) -> (Line, Line) {
        let occupied = (rng.next_u64() & rng.next_u64()) as u16 & 0x7FFF;
        let split = rng.next_u64() as u16;
        (occupied & split, occupied & !split)
    }

    #[test]
    fn test_lines2_matches_single_line() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0xC0FFEE);
        for _ in 0..2000 {
            let (me1, enemy1) = random_position(&mut rng);
            let (me2, enemy2) = random_position(&mut rng);
            let len1 = 5 + (rng.next_u64() % 11) as usize;
            let len2 = 5 + (rng.next_u64() % 11) as usize;

            let packed = eval_lines2(me1, enemy1, len1, me2, enemy2, len2);
            let (lane1, lane2) = lanes2(packed);
            assert_eq!(lane1, eval_line(me1, enemy1, len1));
            assert_eq!(lane2, eval_line(me2, enemy2, len2));
        }
    }

    #[test]
    fn test_lines4_matches_single_line() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0xBEEF);
        for _ in 0..1000 {
            let mut me_lines = [0u16; 4];
            let mut enemy_lines = [0u16; 4];
            let mut lens = [0usize; 4];
            for i in 0..4 {
                let (m, e) = random_position(&mut rng);
                me_lines[i] = m;
                enemy_lines[i] = e;
                lens[i] = 5 + (rng.next_u64() % 11) as usize;
            }

            let pack = |l: &[u16; 4]| LinePack {
                lo: l[0] as u64 | (l[1] as u64) << 32,
                hi: l[2] as u64 | (l[3] as u64) << 32,
            };
            let mask = LinePack {
                lo: len_mask(lens[0]) | len_mask(lens[1]) << 32,
                hi: len_mask(lens[2]) | len_mask(lens[3]) << 32,
            };

            let (me_eval, enemy_eval) = eval_lines4(pack(&me_lines), pack(&enemy_lines), mask);
            let me_lanes = [
                LineEval(me_eval.lo as u32),
                LineEval((me_eval.lo >> 32) as u32),
                LineEval(me_eval.hi as u32),
                LineEval((me_eval.hi >> 32) as u32),
            ];
            let enemy_lanes = [
                LineEval(enemy_eval.lo as u32),
                LineEval((enemy_eval.lo >> 32) as u32),
                LineEval(enemy_eval.hi as u32),
                LineEval((enemy_eval.hi >> 32) as u32),
            ];
            for i in 0..4 {
                assert_eq!(me_lanes[i], eval_line(me_lines[i], enemy_lines[i], lens[i]));
                assert_eq!(
                    enemy_lanes[i],
                    eval_line(enemy_lines[i], me_lines[i], lens[i])
                );
            }
        }
    }

    #[test]
    fn test_five_in_one_lane_leaves_other_lane_exact() {
        // Lane 1 holds a five, lane 2 an open three; lane 2 must still
        // unpack to its standalone evaluation.
        let packed = eval_lines2(0b0111_1100, 0, LEN, 0b0000_1110, 0, LEN);
        let (lane1, lane2) = lanes2(packed);
        assert_eq!(lane1.score(), PatternScore::FIVE);
        assert_eq!(lane2, eval_line(0b0000_1110, 0, LEN));
    }
}
