//! NNUE scaffold: weight file loading and the incrementally maintained
//! accumulator.
//!
//! The weight file is little-endian: 4-byte magic `SNN1`, then u16
//! input-size, u16 hidden-size, u16 version, u16 flags, then f32 arrays
//! `w1[input x hidden]`, `b1[hidden]`, `w2[hidden]`, and the scalar `b2`.
//!
//! The first layer is quantized to fixed point (x256) on load so that
//! incremental feature adds and removes are exact: rebuilding the
//! accumulator from scratch always yields bit-identical values to the
//! incrementally maintained one, and undoing a move restores it exactly.
//!
//! `evaluate_nnue` is `b2 + sum(clamp(acc[i], 0, 127) * w2[i])` over the
//! side-to-move perspective, reported white-relative.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::board::{Board, Color, GameState, PieceType, Square};

/// Expected input size: 64 squares x 6 piece types x 2 colors.
pub const NNUE_INPUT_SIZE: usize = 768;

/// Fixed-point scale for the quantized first layer.
const QUANT_SCALE: f32 = 256.0;

/// Activation clamp bound from the wire format (pre-quantization units).
const CLAMP_MAX: i32 = 127;

/// Error type for NNUE weight loading failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NnueError {
    /// File does not start with the `SNN1` magic
    BadMagic { found: [u8; 4] },
    /// Header input size does not match the feature set
    SizeMismatch { input: usize, expected: usize },
    /// File ended before all declared weights were read
    Truncated { needed: usize, found: usize },
    /// Underlying I/O failure
    Io { message: String },
}

impl fmt::Display for NnueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NnueError::BadMagic { found } => {
                write!(f, "Bad NNUE magic {found:?}, expected \"SNN1\"")
            }
            NnueError::SizeMismatch { input, expected } => {
                write!(f, "NNUE input size {input} does not match expected {expected}")
            }
            NnueError::Truncated { needed, found } => {
                write!(f, "NNUE file truncated: needed {needed} bytes, found {found}")
            }
            NnueError::Io { message } => write!(f, "NNUE I/O error: {message}"),
        }
    }
}

impl std::error::Error for NnueError {}

/// Loaded NNUE weights. Passed explicitly to the states and evaluators
/// that use them; there is no process-wide singleton, so tests can build
/// local weight sets without affecting other engine instances.
pub struct NnueWeights {
    pub hidden_size: usize,
    pub version: u16,
    pub flags: u16,
    /// Quantized first layer, feature-major: `w1q[feature * hidden + j]`
    w1q: Vec<i32>,
    /// Quantized hidden bias
    b1q: Vec<i32>,
    w2: Vec<f32>,
    b2: f32,
}

impl NnueWeights {
    /// Parse weights from raw file bytes.
    ///
    /// # Errors
    ///
    /// Returns an `NnueError` on bad magic, a header/feature-set size
    /// mismatch, or a truncated payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NnueError> {
        let mut reader = ByteReader::new(bytes);

        let magic = reader.take::<4>()?;
        if &magic != b"SNN1" {
            return Err(NnueError::BadMagic { found: magic });
        }
        let input = reader.u16()? as usize;
        let hidden = reader.u16()? as usize;
        let version = reader.u16()?;
        let flags = reader.u16()?;
        if input != NNUE_INPUT_SIZE {
            return Err(NnueError::SizeMismatch {
                input,
                expected: NNUE_INPUT_SIZE,
            });
        }

        let mut w1q = Vec::with_capacity(input * hidden);
        for _ in 0..input * hidden {
            w1q.push(quantize(reader.f32()?));
        }
        let mut b1q = Vec::with_capacity(hidden);
        for _ in 0..hidden {
            b1q.push(quantize(reader.f32()?));
        }
        let mut w2 = Vec::with_capacity(hidden);
        for _ in 0..hidden {
            w2.push(reader.f32()?);
        }
        let b2 = reader.f32()?;

        Ok(NnueWeights {
            hidden_size: hidden,
            version,
            flags,
            w1q,
            b1q,
            w2,
            b2,
        })
    }

    /// Load weights from a file on disk.
    ///
    /// # Errors
    ///
    /// I/O failures and every `from_bytes` failure mode.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NnueError> {
        let bytes = std::fs::read(path).map_err(|e| NnueError::Io {
            message: e.to_string(),
        })?;
        Self::from_bytes(&bytes)
    }

    #[inline]
    fn feature_row(&self, feature: usize) -> &[i32] {
        &self.w1q[feature * self.hidden_size..(feature + 1) * self.hidden_size]
    }
}

/// Feature index for a piece seen from one perspective. Own pieces take
/// the 0 block, enemy pieces the 6 block; the square is flipped vertically
/// for the black perspective.
#[inline]
pub(crate) fn feature_index(
    perspective: Color,
    color: Color,
    kind: PieceType,
    sq: Square,
) -> usize {
    let offset = if color == perspective { 0 } else { 6 };
    let sq = if perspective == Color::White {
        sq
    } else {
        sq.flip_vertical()
    };
    (offset + kind.index()) * 64 + sq.index()
}

#[inline]
fn quantize(v: f32) -> i32 {
    (v * QUANT_SCALE).round() as i32
}

/// Hidden-layer activations for both perspectives, maintained
/// incrementally across `apply_move` and rebuildable from scratch.
#[derive(Clone)]
pub struct NnueAccumulator {
    weights: Arc<NnueWeights>,
    white: Vec<i32>,
    black: Vec<i32>,
}

impl fmt::Debug for NnueAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NnueAccumulator")
            .field("hidden_size", &self.weights.hidden_size)
            .finish()
    }
}

impl NnueAccumulator {
    /// Build the accumulator from scratch for a board.
    #[must_use]
    pub(crate) fn build(weights: &Arc<NnueWeights>, board: &Board) -> Self {
        let mut acc = NnueAccumulator {
            weights: Arc::clone(weights),
            white: weights.b1q.clone(),
            black: weights.b1q.clone(),
        };
        for (sq, piece) in board.occupied() {
            acc.add_piece(piece.kind, piece.color, sq);
        }
        acc
    }

    #[must_use]
    pub(crate) fn weights(&self) -> Arc<NnueWeights> {
        Arc::clone(&self.weights)
    }

    /// Add the features for a piece appearing on a square.
    pub(crate) fn add_piece(&mut self, kind: PieceType, color: Color, sq: Square) {
        self.update_piece(kind, color, sq, 1);
    }

    /// Remove the features for a piece leaving a square.
    pub(crate) fn remove_piece(&mut self, kind: PieceType, color: Color, sq: Square) {
        self.update_piece(kind, color, sq, -1);
    }

    fn update_piece(&mut self, kind: PieceType, color: Color, sq: Square, sign: i32) {
        let weights = Arc::clone(&self.weights);
        let white_feat = feature_index(Color::White, color, kind, sq);
        let black_feat = feature_index(Color::Black, color, kind, sq);
        for (a, w) in self.white.iter_mut().zip(weights.feature_row(white_feat)) {
            *a += sign * w;
        }
        for (a, w) in self.black.iter_mut().zip(weights.feature_row(black_feat)) {
            *a += sign * w;
        }
    }

    /// The output-layer sum over one perspective's activations.
    fn forward(&self, perspective: Color) -> f64 {
        let acc = match perspective {
            Color::White => &self.white,
            Color::Black => &self.black,
        };
        let clamp_max = (CLAMP_MAX as f32 * QUANT_SCALE) as i32;
        let mut total = f64::from(self.weights.b2);
        for (a, w) in acc.iter().zip(self.weights.w2.iter()) {
            let activation = f64::from((*a).clamp(0, clamp_max)) / f64::from(QUANT_SCALE);
            total += activation * f64::from(*w);
        }
        total
    }

    #[cfg(test)]
    pub(crate) fn raw(&self) -> (&[i32], &[i32]) {
        (&self.white, &self.black)
    }
}

/// NNUE score in centipawns, white-relative. `None` when the state carries
/// no accumulator.
#[must_use]
pub fn evaluate_nnue(state: &GameState) -> Option<i32> {
    let acc = state.nnue_accumulator()?;
    let side = state.side_to_move();
    let v = acc.forward(side);
    let white_relative = match side {
        Color::White => v,
        Color::Black => -v,
    };
    Some(white_relative.round() as i32)
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        ByteReader { bytes, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], NnueError> {
        let end = self.pos + N;
        let slice = self.bytes.get(self.pos..end).ok_or(NnueError::Truncated {
            needed: end,
            found: self.bytes.len(),
        })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn u16(&mut self) -> Result<u16, NnueError> {
        Ok(u16::from_le_bytes(self.take::<2>()?))
    }

    fn f32(&mut self) -> Result<f32, NnueError> {
        Ok(f32::from_le_bytes(self.take::<4>()?))
    }
}
