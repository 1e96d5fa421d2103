//! Move-selection façade: difficulty presets wired to the driver and the
//! root policy layer.

use std::sync::Arc;

use crate::board::{GameState, Move};
use crate::eval::{EvalOptions, NnueWeights};
use crate::policy::{select_root_move, PolicyParams};
use crate::search::{
    search_root, DriverConfig, ProgressCallback, SearchParams, SearchTables, StopSignal,
    DEFAULT_TT_MB,
};

/// Difficulty presets.
///
/// - Easy: depth 1
/// - Medium: depth 2
/// - Hard: depth 3, micro-quiescence of depth 1, transposition table on,
///   optional time budget
/// - Max: depth cap 7, 10 second time cap, full quiescence, max-thinking
///   evaluation, optional NNUE mix
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Max,
}

impl Difficulty {
    fn depth(self) -> u32 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
            Difficulty::Max => 7,
        }
    }

    fn time_cap_ms(self) -> Option<u64> {
        match self {
            Difficulty::Max => Some(10_000),
            _ => None,
        }
    }

    fn search_params(self) -> SearchParams {
        match self {
            Difficulty::Easy | Difficulty::Medium => SearchParams {
                max_thinking: false,
                use_tt: false,
                qsearch_depth: 1,
                eval: EvalOptions::default(),
            },
            Difficulty::Hard => SearchParams {
                max_thinking: false,
                use_tt: true,
                qsearch_depth: 1,
                eval: EvalOptions::default(),
            },
            Difficulty::Max => SearchParams {
                max_thinking: true,
                use_tt: true,
                qsearch_depth: crate::search::MAX_QSEARCH_DEPTH,
                eval: EvalOptions {
                    max_thinking: true,
                    nnue_mix: 0.0,
                },
            },
        }
    }
}

/// Configuration envelope for `choose_move`. Difficulty supplies the
/// defaults; every knob can be overridden by the caller.
#[derive(Clone, Default)]
pub struct ChooseOptions {
    pub difficulty: Option<Difficulty>,
    /// Seeds the deterministic RNG used for fairness and variety
    /// tie-breaks. Same seed + same state = same move.
    pub seed: Option<u64>,
    pub play_for_win: bool,
    /// Position keys the caller considers recent for repetition
    /// accounting.
    pub recent_positions: Vec<u64>,
    /// Fixed-depth override; wins over the difficulty preset.
    pub depth_override: Option<u32>,
    pub max_depth: Option<u32>,
    pub max_time_ms: Option<u64>,
    pub stop_requested: Option<StopSignal>,
    pub on_progress: Option<ProgressCallback>,
    /// NNUE weights plus mix amount for max thinking.
    pub nnue_weights: Option<Arc<NnueWeights>>,
    pub nnue_mix: Option<f32>,
    /// Micro-quiescence depth override.
    pub micro_quiescence_depth: Option<i32>,
    // Policy knobs; `None` keeps the safe defaults.
    pub repetition_penalty_scale: Option<i32>,
    pub hard_repetition_nudge_scale: Option<i32>,
    pub repeat_ban_window_cp: Option<i32>,
    pub two_ply_repeat_penalty: Option<i32>,
    pub contempt_cp: Option<i32>,
    pub draw_hold_threshold: Option<i32>,
    pub top_move_window: Option<i32>,
    pub fairness_window: Option<i32>,
}

impl ChooseOptions {
    #[must_use]
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        ChooseOptions {
            difficulty: Some(difficulty),
            ..Default::default()
        }
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty.unwrap_or(Difficulty::Medium)
    }

    fn policy_params(&self) -> PolicyParams {
        let defaults = PolicyParams::default();
        PolicyParams {
            play_for_win: self.play_for_win,
            recent_positions: self.recent_positions.clone(),
            repetition_penalty_scale: self
                .repetition_penalty_scale
                .unwrap_or(defaults.repetition_penalty_scale),
            hard_repetition_nudge_scale: self
                .hard_repetition_nudge_scale
                .unwrap_or(defaults.hard_repetition_nudge_scale),
            repeat_ban_window_cp: self
                .repeat_ban_window_cp
                .unwrap_or(defaults.repeat_ban_window_cp),
            two_ply_repeat_penalty: self
                .two_ply_repeat_penalty
                .unwrap_or(defaults.two_ply_repeat_penalty),
            contempt_cp: self.contempt_cp.unwrap_or(defaults.contempt_cp),
            draw_hold_threshold: self
                .draw_hold_threshold
                .unwrap_or(defaults.draw_hold_threshold),
            top_move_window: self.top_move_window.unwrap_or(defaults.top_move_window),
            fairness_window: self.fairness_window.unwrap_or(defaults.fairness_window),
            seed: self.seed,
        }
    }
}

/// Pick a move for the side to move. Returns `None` only when no legal
/// move exists.
#[must_use]
pub fn choose_move(state: &GameState, opts: &ChooseOptions) -> Option<Move> {
    let difficulty = opts.difficulty();

    let mut params = difficulty.search_params();
    if let Some(depth) = opts.micro_quiescence_depth {
        params.qsearch_depth = depth.max(0);
    }
    if let Some(mix) = opts.nnue_mix {
        params.eval.nnue_mix = mix.clamp(0.0, 1.0);
    }

    // The search works on its own clone when an NNUE mix is requested so
    // the caller's state keeps its accumulator configuration.
    let mut nnue_state;
    let state_ref = if params.eval.nnue_mix > 0.0 {
        match &opts.nnue_weights {
            Some(weights) => {
                nnue_state = state.clone();
                nnue_state.enable_nnue(Arc::clone(weights));
                &nnue_state
            }
            None => {
                log::warn!("NNUE mix requested without weights; running classical only");
                params.eval.nnue_mix = 0.0;
                state
            }
        }
    } else {
        state
    };

    let max_depth = opts
        .depth_override
        .or(opts.max_depth)
        .unwrap_or_else(|| difficulty.depth());
    let config = DriverConfig {
        max_depth,
        max_time_ms: opts.max_time_ms.or_else(|| difficulty.time_cap_ms()),
        stop: opts.stop_requested.clone(),
        on_depth: opts.on_progress.clone(),
    };

    let mut tables = SearchTables::new(if params.use_tt { DEFAULT_TT_MB } else { 1 });
    let result = search_root(state_ref, &params, &mut tables, &config)?;

    select_root_move(state, &result.candidates, &opts.policy_params())
        .or(Some(result.best))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::GameStatus;

    #[test]
    fn test_choose_move_on_start_position() {
        let state = GameState::new();
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let mv = choose_move(&state, &ChooseOptions::for_difficulty(difficulty));
            let mv = mv.expect("start position has moves");
            assert!(state.is_legal_move(&mv), "{difficulty:?} returned {mv}");
        }
    }

    #[test]
    fn test_choose_move_none_when_game_over() {
        let state: GameState = "7k/5KQ1/8/8/8/8/8/8 b - - 0 1".parse().unwrap();
        assert!(matches!(state.game_status(), GameStatus::Checkmate { .. }));
        let mv = choose_move(&state, &ChooseOptions::for_difficulty(Difficulty::Hard));
        assert!(mv.is_none());
    }

    #[test]
    fn test_max_difficulty_finds_mate_in_one() {
        let state: GameState = "7k/5KQ1/8/8/8/8/8/8 w - - 0 1".parse().unwrap();
        let mv = choose_move(&state, &ChooseOptions::for_difficulty(Difficulty::Max))
            .expect("white has moves");
        let mut after = state.clone();
        after.apply_move(mv).unwrap();
        assert!(matches!(after.game_status(), GameStatus::Checkmate { .. }));
    }

    #[test]
    fn test_seed_makes_choice_reproducible() {
        let state = GameState::new();
        let mut opts = ChooseOptions::for_difficulty(Difficulty::Easy);
        opts.seed = Some(42);
        let first = choose_move(&state, &opts);
        for _ in 0..3 {
            assert_eq!(choose_move(&state, &opts), first);
        }
    }

    #[test]
    fn test_depth_override_wins_over_preset() {
        use parking_lot::Mutex;
        use std::sync::Arc;

        let state = GameState::new();
        let depths: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&depths);
        let mut opts = ChooseOptions::for_difficulty(Difficulty::Easy);
        opts.depth_override = Some(3);
        opts.on_progress = Some(Arc::new(move |report: &crate::search::SearchReport| {
            sink.lock().push(report.depth);
        }));
        choose_move(&state, &opts).unwrap();
        assert_eq!(*depths.lock().last().unwrap(), 3);
    }
}
