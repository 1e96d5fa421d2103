//! SEE-lite: static exchange evaluation on the destination square.
//!
//! Approximates the capture exchange by alternating each side's least
//! valuable attacker on the destination, returning the net material from
//! the initial mover's perspective. Sliders behind the current attacker
//! are rediscovered by re-scanning the rays, so x-ray recaptures count;
//! pins are ignored, which is what keeps it "lite".

use crate::board::{Color, GameState, Move, PieceType, Square};

/// Scratch occupancy used while pieces are exchanged off the board.
type Occupancy = [Option<(Color, PieceType)>; 64];

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const STRAIGHT_DIRS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const DIAGONAL_DIRS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Net exchange value of a capture, in centipawns, from the capturing
/// side's perspective. Returns 0 for non-captures.
#[must_use]
pub(crate) fn see_lite(state: &GameState, mv: &Move) -> i32 {
    let Some(attacker) = state.board.piece_at(mv.from) else {
        return 0;
    };
    let victim_value = if mv.en_passant {
        PieceType::Pawn.value()
    } else {
        match state.board.piece_at(mv.to) {
            Some(victim) => victim.kind.value(),
            None => return 0,
        }
    };

    let mut occ: Occupancy = [None; 64];
    for (sq, piece) in state.board.occupied() {
        occ[sq.index()] = Some((piece.color, piece.kind));
    }
    if mv.en_passant {
        occ[Square::new(mv.from.rank(), mv.to.file()).index()] = None;
    }

    // Gains per exchange ply, minimaxed back up at the end.
    let mut gain = [0i32; 32];
    gain[0] = victim_value;
    let mut depth = 0;
    let mut occupant_value = attacker.kind.value();

    occ[mv.from.index()] = None;
    occ[mv.to.index()] = Some((attacker.color, attacker.kind));
    let mut side = attacker.color.opponent();

    while depth + 1 < gain.len() {
        let Some((sq, kind)) = least_valuable_attacker(&occ, mv.to, side) else {
            break;
        };
        depth += 1;
        gain[depth] = occupant_value - gain[depth - 1];

        // Stop when neither continuing nor standing pat can help.
        if (-gain[depth - 1]).max(gain[depth]) < 0 {
            break;
        }

        // A king may only recapture when the other side has no reply.
        if kind == PieceType::King
            && least_valuable_attacker(&occ, mv.to, side.opponent()).is_some()
        {
            depth -= 1;
            break;
        }

        occ[sq.index()] = None;
        occ[mv.to.index()] = Some((side, kind));
        occupant_value = kind.value();
        side = side.opponent();
    }

    while depth > 0 {
        depth -= 1;
        gain[depth] = -(-gain[depth]).max(gain[depth + 1]);
    }
    gain[0]
}

/// The least valuable piece of `side` attacking `target` in the scratch
/// occupancy. Pawn, then knight, bishop, rook, queen, king.
fn least_valuable_attacker(
    occ: &Occupancy,
    target: Square,
    side: Color,
) -> Option<(Square, PieceType)> {
    // Pawns
    for df in [-1, 1] {
        if let Some(sq) = target.offset(-side.forward(), df) {
            if occ[sq.index()] == Some((side, PieceType::Pawn)) {
                return Some((sq, PieceType::Pawn));
            }
        }
    }

    // Knights
    for (dr, df) in KNIGHT_OFFSETS {
        if let Some(sq) = target.offset(dr, df) {
            if occ[sq.index()] == Some((side, PieceType::Knight)) {
                return Some((sq, PieceType::Knight));
            }
        }
    }

    // Sliders in value order: bishop, rook, queen. Queens are picked up
    // on both ray kinds.
    if let Some(found) = ray_attacker(occ, target, side, &DIAGONAL_DIRS, PieceType::Bishop) {
        return Some(found);
    }
    if let Some(found) = ray_attacker(occ, target, side, &STRAIGHT_DIRS, PieceType::Rook) {
        return Some(found);
    }
    if let Some(found) = ray_attacker(occ, target, side, &DIAGONAL_DIRS, PieceType::Queen) {
        return Some(found);
    }
    if let Some(found) = ray_attacker(occ, target, side, &STRAIGHT_DIRS, PieceType::Queen) {
        return Some(found);
    }

    // King
    for dr in -1..=1i32 {
        for df in -1..=1i32 {
            if dr == 0 && df == 0 {
                continue;
            }
            if let Some(sq) = target.offset(dr, df) {
                if occ[sq.index()] == Some((side, PieceType::King)) {
                    return Some((sq, PieceType::King));
                }
            }
        }
    }

    None
}

fn ray_attacker(
    occ: &Occupancy,
    target: Square,
    side: Color,
    dirs: &[(i32, i32); 4],
    wanted: PieceType,
) -> Option<(Square, PieceType)> {
    for &(dr, df) in dirs {
        let mut sq = target.offset(dr, df);
        while let Some(s) = sq {
            if let Some((color, kind)) = occ[s.index()] {
                if color == side && kind == wanted {
                    return Some((s, kind));
                }
                break;
            }
            sq = s.offset(dr, df);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(fen: &str) -> GameState {
        fen.parse().expect("valid fen")
    }

    fn capture(_state: &GameState, from: &str, to: &str) -> Move {
        Move::new(from.parse().unwrap(), to.parse().unwrap())
    }

    #[test]
    fn test_free_pawn_grab() {
        let s = state("8/8/8/3p4/4P3/8/8/8 w - - 0 1");
        assert_eq!(see_lite(&s, &capture(&s, "e4", "d5")), 100);
    }

    #[test]
    fn test_defended_pawn_is_even_for_pawn() {
        let s = state("8/8/2p5/3p4/4P3/8/8/8 w - - 0 1");
        assert_eq!(see_lite(&s, &capture(&s, "e4", "d5")), 0);
    }

    #[test]
    fn test_knight_takes_defended_pawn_loses() {
        let s = state("8/8/2p5/3p4/4N3/8/8/8 w - - 0 1");
        assert!(see_lite(&s, &capture(&s, "e4", "d5")) < 0);
    }

    #[test]
    fn test_queen_takes_defended_pawn_is_poisoned() {
        let s = state("8/8/2p5/3p4/4Q3/8/8/8 w - - 0 1");
        let net = see_lite(&s, &capture(&s, "e4", "d5"));
        assert!(net < -700, "net={net}");
    }

    #[test]
    fn test_xray_rook_backup_counts() {
        // Rook takes rook; the doubled rook behind recaptures whatever
        // comes back.
        let s = state("3r4/8/8/3r4/8/8/8/R2R4 w - - 0 1");
        let net = see_lite(&s, &capture(&s, "d1", "d5"));
        assert!(net >= 0, "net={net}");
    }

    #[test]
    fn test_en_passant_nets_a_pawn() {
        let s = state("8/8/8/3Pp3/8/8/8/8 w - e6 0 1");
        let mv = Move::en_passant("d5".parse().unwrap(), "e6".parse().unwrap());
        assert_eq!(see_lite(&s, &mv), 100);
    }

    #[test]
    fn test_en_passant_into_defended_square_is_even() {
        let s = state("8/5p2/8/3Pp3/8/8/8/8 w - e6 0 1");
        let mv = Move::en_passant("d5".parse().unwrap(), "e6".parse().unwrap());
        assert_eq!(see_lite(&s, &mv), 0);
    }

    #[test]
    fn test_non_capture_scores_zero() {
        let s = state("8/8/8/8/4N3/8/8/8 w - - 0 1");
        assert_eq!(see_lite(&s, &capture(&s, "e4", "f6")), 0);
    }

    #[test]
    fn test_king_never_recaptures_into_protection() {
        // Queen takes the pawn next to the king; the king cannot recapture
        // because the rook on a3 guards the square.
        let s = state("8/8/8/8/1k6/Rp6/8/1Q6 w - - 0 1");
        let net = see_lite(&s, &capture(&s, "b1", "b3"));
        assert_eq!(net, 100);
    }
}
