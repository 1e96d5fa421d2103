//! Move representation.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::piece::{PieceId, PieceType};
use super::square::Square;

/// Upper bound on search depth, including quiescence plies.
pub(crate) const MAX_PLY: usize = 64;

/// A move between two squares, with the special-move markers the rules
/// engine needs to replay it. `captured` is filled in by `apply_move` and
/// is `None` on freshly generated moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceType>,
    pub castle: bool,
    pub en_passant: bool,
    pub captured: Option<PieceId>,
}

impl Move {
    /// A plain move or capture.
    #[inline]
    #[must_use]
    pub const fn new(from: Square, to: Square) -> Self {
        Move {
            from,
            to,
            promotion: None,
            castle: false,
            en_passant: false,
            captured: None,
        }
    }

    /// A pawn promotion.
    #[inline]
    #[must_use]
    pub const fn promotion(from: Square, to: Square, piece: PieceType) -> Self {
        Move {
            from,
            to,
            promotion: Some(piece),
            castle: false,
            en_passant: false,
            captured: None,
        }
    }

    /// A castling move, encoded as the king's two-file step.
    #[inline]
    #[must_use]
    pub const fn castling(from: Square, to: Square) -> Self {
        Move {
            from,
            to,
            promotion: None,
            castle: true,
            en_passant: false,
            captured: None,
        }
    }

    /// An en-passant capture.
    #[inline]
    #[must_use]
    pub const fn en_passant(from: Square, to: Square) -> Self {
        Move {
            from,
            to,
            promotion: None,
            castle: false,
            en_passant: true,
            captured: None,
        }
    }

    /// Two moves describe the same player action if they agree on source,
    /// destination, and promotion choice. Ignores bookkeeping fields so a
    /// generated move matches its applied (captured-id carrying) copy and a
    /// transposition-table seed matches a generated move.
    #[inline]
    #[must_use]
    pub fn same_action(&self, other: &Move) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }

    /// Returns true if this candidate exactly reverses `prior`.
    #[inline]
    #[must_use]
    pub fn reverses(&self, prior: &Move) -> bool {
        self.from == prior.to && self.to == prior.from
    }
}

impl fmt::Display for Move {
    /// UCI-compatible text: `e2e4`, `e7e8q`. Castling prints as the king move.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promo) = self.promotion {
            write!(f, "{}", promo.to_char())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_display_uci() {
        let m = Move::new(Square::new(1, 4), Square::new(3, 4));
        assert_eq!(m.to_string(), "e2e4");

        let p = Move::promotion(Square::new(6, 0), Square::new(7, 0), PieceType::Queen);
        assert_eq!(p.to_string(), "a7a8q");
    }

    #[test]
    fn test_same_action_ignores_captured() {
        let mut a = Move::new(Square::new(0, 0), Square::new(0, 7));
        let b = a;
        a.captured = Some(PieceId(3));
        assert!(a.same_action(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_reverses() {
        let there = Move::new(Square::new(0, 0), Square::new(1, 0));
        let back = Move::new(Square::new(1, 0), Square::new(0, 0));
        assert!(back.reverses(&there));
        assert!(!there.reverses(&there));
    }
}
