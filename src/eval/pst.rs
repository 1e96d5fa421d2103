//! Piece-square tables.
//!
//! Only the terms the evaluator actually uses: pawn advancement and a
//! central preference for the minor pieces. Tables are from White's
//! perspective (index = rank * 8 + file); black squares flip vertically.

/// Pawn advancement: pushes toward promotion gain value, center pawns a
/// little more than edge pawns.
#[rustfmt::skip]
pub(crate) const PAWN_PST: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     2,  2,  2, -4, -4,  2,  2,  2,
     2,  0,  4,  6,  6,  4,  0,  2,
     4,  4,  8, 12, 12,  8,  4,  4,
     8,  8, 12, 16, 16, 12,  8,  8,
    14, 14, 18, 22, 22, 18, 14, 14,
    24, 24, 28, 32, 32, 28, 24, 24,
     0,  0,  0,  0,  0,  0,  0,  0,
];

/// Knights rot on the rim.
#[rustfmt::skip]
pub(crate) const KNIGHT_PST: [i32; 64] = [
    -20, -12,  -8,  -8,  -8,  -8, -12, -20,
    -12,  -4,   0,   2,   2,   0,  -4, -12,
     -8,   0,   6,   8,   8,   6,   0,  -8,
     -8,   2,   8,  12,  12,   8,   2,  -8,
     -8,   2,   8,  12,  12,   8,   2,  -8,
     -8,   0,   6,   8,   8,   6,   0,  -8,
    -12,  -4,   0,   2,   2,   0,  -4, -12,
    -20, -12,  -8,  -8,  -8,  -8, -12, -20,
];

/// Bishops prefer the long diagonals and central posts.
#[rustfmt::skip]
pub(crate) const BISHOP_PST: [i32; 64] = [
    -10,  -6,  -4,  -4,  -4,  -4,  -6, -10,
     -6,   2,   0,   2,   2,   0,   2,  -6,
     -4,   0,   4,   6,   6,   4,   0,  -4,
     -4,   4,   6,   8,   8,   6,   4,  -4,
     -4,   4,   6,   8,   8,   6,   4,  -4,
     -4,   0,   4,   6,   6,   4,   0,  -4,
     -6,   2,   0,   2,   2,   0,   2,  -6,
    -10,  -6,  -4,  -4,  -4,  -4,  -6, -10,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pawn_table_rewards_advancement() {
        // A pawn on the 7th rank outscores one on the 3rd on every file.
        for file in 0..8 {
            assert!(PAWN_PST[6 * 8 + file] > PAWN_PST[2 * 8 + file]);
        }
    }

    #[test]
    fn test_minor_tables_prefer_center() {
        let corner = 0;
        let center = 3 * 8 + 3;
        assert!(KNIGHT_PST[center] > KNIGHT_PST[corner]);
        assert!(BISHOP_PST[center] > BISHOP_PST[corner]);
    }

    #[test]
    fn test_minor_tables_are_horizontally_symmetric() {
        for rank in 0..8 {
            for file in 0..8 {
                let a = rank * 8 + file;
                let b = rank * 8 + (7 - file);
                assert_eq!(KNIGHT_PST[a], KNIGHT_PST[b]);
                assert_eq!(BISHOP_PST[a], BISHOP_PST[b]);
            }
        }
    }
}
