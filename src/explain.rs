//! Move explanations: a pure function over rules-engine outputs.
//!
//! Produces a short human-readable summary of what a move does (capture,
//! check, castle, development, repetition risk) for the host UI to show
//! alongside the board. No search state is consulted; the same state and
//! move always produce the same explanation.

use crate::board::{Color, GameState, GameStatus, Move, PieceType, Square};

/// Options affecting only the repetition commentary.
#[derive(Clone, Debug, Default)]
pub struct ExplainOptions {
    pub play_for_win: bool,
    pub recent_positions: Vec<u64>,
}

/// Structured explanation of a single move.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Explanation {
    pub title: String,
    pub move_label: String,
    pub bullets: Vec<String>,
    pub summary: String,
    pub tags: Vec<String>,
}

/// Explain a legal move in the given position.
///
/// Pure: depends only on the inputs, never mutates the state, and carries
/// no randomness.
#[must_use]
pub fn explain_move(state: &GameState, mv: &Move, opts: &ExplainOptions) -> Explanation {
    let mover = state.board.piece_at(mv.from);
    let victim = if mv.en_passant {
        Some(PieceType::Pawn)
    } else {
        state.board.piece_at(mv.to).map(|p| p.kind)
    };

    let mut after = state.clone();
    let _ = after.apply_move(*mv);
    let status = after.game_status();

    let mut bullets = Vec::new();
    let mut tags = Vec::new();

    let piece_name = mover.map_or("piece", |p| piece_name_of(p.kind));
    let move_label = mv.to_string();

    if mv.castle {
        let side = if mv.to.file() == 6 { "kingside" } else { "queenside" };
        bullets.push(format!("Castles {side}, tucking the king away and connecting the rooks"));
        tags.push("castle".to_string());
    }

    if let Some(victim_kind) = victim {
        if mv.en_passant {
            bullets.push("Captures the pawn en passant".to_string());
            tags.push("en-passant".to_string());
        } else {
            bullets.push(format!(
                "Captures the {} ({} centipawns)",
                piece_name_of(victim_kind),
                victim_kind.value()
            ));
        }
        tags.push("capture".to_string());
    }

    if let Some(promo) = mv.promotion {
        bullets.push(format!("Promotes to a {}", piece_name_of(promo)));
        tags.push("promotion".to_string());
    }

    match status {
        GameStatus::Checkmate { .. } => {
            bullets.push("Delivers checkmate".to_string());
            tags.push("checkmate".to_string());
        }
        GameStatus::Check => {
            bullets.push("Puts the enemy king in check".to_string());
            tags.push("check".to_string());
        }
        GameStatus::Stalemate => {
            bullets.push("Leaves the opponent without a move: stalemate".to_string());
            tags.push("stalemate".to_string());
        }
        GameStatus::Draw { .. } => {
            bullets.push("Ends the game in a draw".to_string());
            tags.push("draw".to_string());
        }
        GameStatus::Ongoing => {}
    }

    if let Some(piece) = mover {
        if piece.kind.is_minor() && mv.from.rank() == piece.color.back_rank() {
            bullets.push(format!("Develops the {piece_name} off the back rank"));
            tags.push("development".to_string());
        }
        if piece.kind == PieceType::Pawn && !tags.contains(&"capture".to_string()) {
            let toward = match piece.color {
                Color::White => mv.to.rank() as i32 - mv.from.rank() as i32,
                Color::Black => mv.from.rank() as i32 - mv.to.rank() as i32,
            };
            if toward >= 2 {
                bullets.push("Pushes the pawn two squares, staking space".to_string());
            }
        }
        if piece.kind == PieceType::Rook && rook_lands_on_open_file(state, piece.color, mv.to) {
            bullets.push("Places the rook on an open file".to_string());
            tags.push("open-file".to_string());
        }
    }

    if central(mv.to) {
        bullets.push("Fights for the center".to_string());
        tags.push("center".to_string());
    }

    if opts.play_for_win && opts.recent_positions.contains(&after.key()) {
        bullets.push("Returns to a recently seen position; repeating risks a draw".to_string());
        tags.push("repetition-risk".to_string());
    }

    if bullets.is_empty() {
        bullets.push(format!("Repositions the {piece_name}"));
        tags.push("quiet".to_string());
    }

    let title = tags
        .first()
        .map_or_else(|| "Quiet move".to_string(), |t| title_for_tag(t));
    let summary = format!(
        "{} from {} to {}: {}",
        capitalize(piece_name),
        mv.from,
        mv.to,
        bullets.join("; ").to_lowercase()
    );

    Explanation {
        title,
        move_label,
        bullets,
        summary,
        tags,
    }
}

fn central(sq: Square) -> bool {
    (3..=4).contains(&sq.rank()) && (3..=4).contains(&sq.file())
}

fn rook_lands_on_open_file(state: &GameState, color: Color, to: Square) -> bool {
    (0..8).all(|rank| {
        state
            .board
            .piece_at(Square::new(rank, to.file()))
            .map_or(true, |p| !(p.kind == PieceType::Pawn && p.color == color))
    })
}

fn piece_name_of(kind: PieceType) -> &'static str {
    match kind {
        PieceType::Pawn => "pawn",
        PieceType::Knight => "knight",
        PieceType::Bishop => "bishop",
        PieceType::Rook => "rook",
        PieceType::Queen => "queen",
        PieceType::King => "king",
    }
}

fn title_for_tag(tag: &str) -> String {
    match tag {
        "castle" => "Castling".to_string(),
        "capture" | "en-passant" => "Capture".to_string(),
        "promotion" => "Promotion".to_string(),
        "checkmate" => "Checkmate".to_string(),
        "check" => "Check".to_string(),
        "stalemate" => "Stalemate".to_string(),
        "draw" => "Draw".to_string(),
        "development" => "Development".to_string(),
        "open-file" => "Rook activity".to_string(),
        "center" => "Center play".to_string(),
        "repetition-risk" => "Repetition risk".to_string(),
        _ => "Quiet move".to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
