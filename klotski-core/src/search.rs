//! Exploration driver and path reconstruction.
//!
//! The frontier is an append-only arena of [`Arrangement`]s scanned with an
//! index cursor. Successors discovered while scanning are appended to the
//! same arena and visited later by the same scan, so scan order is the
//! search order. Because of the double-step lookahead this is close to,
//! but not exactly, a level-order breadth-first search, and the first
//! solution found is not necessarily the shortest.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::config::{Goal, SolverConfig};
use crate::layout::{Layout, LayoutError};
use crate::zobrist::ZobristTable;
use crate::{can_move, Arrangement, Cell, Direction, Occupancy, Piece, PieceMove, HEIGHT, WIDTH};

/// Scan positions between progress traces.
const PROGRESS_INTERVAL: usize = 10_000;

/// Rejection of a candidate move. Recoverable: the candidate is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("state visited already (signature {signature:#010x})")]
    AlreadyVisited { signature: u32 },
    #[error("no arrangement with index {index}")]
    UnknownState { index: usize },
    #[error("no piece with index {piece}")]
    UnknownPiece { piece: usize },
    #[error("{label} cannot move {direction}")]
    Illegal { label: char, direction: Direction },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("cannot solve: frontier exhausted after {explored} arrangements")]
    Unsolvable { explored: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("step {step}: no piece with index {piece}")]
    UnknownPiece { step: usize, piece: usize },
    #[error("step {step}: {label} cannot move {direction}")]
    IllegalMove {
        step: usize,
        label: char,
        direction: Direction,
    },
    #[error("step {step}: replayed arrangement differs from the recorded one")]
    Diverged { step: usize },
    #[error("goal not reached after {steps} steps")]
    GoalNotReached { steps: usize },
}

/// Counters maintained by the exploration driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Arrangements taken off the frontier by the scan.
    pub examined: usize,
    /// Arrangements appended after the root.
    pub discovered: usize,
    /// Legal candidates dropped because their signature was already seen.
    pub duplicates: usize,
    /// Appended arrangements that came from the double-step lookahead.
    pub lookahead: usize,
    /// Largest step counter appended.
    pub max_step: u32,
}

/// One entry of a solution, in forward order.
#[derive(Debug, Clone, Serialize)]
pub struct SolutionStep {
    pub piece: usize,
    pub label: char,
    pub direction: Direction,
    /// Cells travelled since the previous entry (1 or 2).
    pub distance: u8,
    pub arrangement: Arrangement,
}

/// `b moves down`, with ` x2` appended for a two-cell entry.
impl fmt::Display for SolutionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} moves {}", self.label, self.direction)?;
        if self.distance > 1 {
            write!(f, " x{}", self.distance)?;
        }
        Ok(())
    }
}

/// Goal resolved to a fixed piece index.
#[derive(Debug, Clone, Copy)]
struct Target {
    piece: usize,
    anchor: Cell,
}

/// Search space for one starting layout.
pub struct Board {
    zobrist: ZobristTable,
    goal: Goal,
    target: Target,
    /// Frontier and arena. Index 0 is the root.
    states: Vec<Arrangement>,
    seen: HashSet<u32>,
    stats: SearchStats,
}

impl Board {
    /// Validate `layout`, build the Zobrist table and seed the frontier
    /// with the root arrangement.
    pub fn new(layout: Layout, config: &SolverConfig) -> Result<Board, LayoutError> {
        let pieces = layout.build()?;
        let goal = config.goal;

        let piece = pieces
            .iter()
            .position(|p| p.label == goal.piece)
            .ok_or(LayoutError::MissingGoalPiece(goal.piece))?;
        let placed = Piece::new(goal.piece, pieces[piece].shape, goal.anchor());
        if !goal.anchor().in_bounds() || !placed.cells().all(Cell::in_bounds) {
            return Err(LayoutError::GoalOutOfBounds {
                label: goal.piece,
                x: goal.x,
                y: goal.y,
            });
        }

        let zobrist = ZobristTable::new(config.seed);
        let signature = zobrist.full_signature(&pieces);

        Ok(Board {
            zobrist,
            goal,
            target: Target {
                piece,
                anchor: goal.anchor(),
            },
            states: vec![Arrangement::root(pieces, signature)],
            seen: HashSet::new(),
            stats: SearchStats::default(),
        })
    }

    pub fn width(&self) -> i8 {
        WIDTH
    }

    pub fn height(&self) -> i8 {
        HEIGHT
    }

    pub fn zobrist(&self) -> &ZobristTable {
        &self.zobrist
    }

    pub fn goal(&self) -> Goal {
        self.goal
    }

    pub fn root(&self) -> &Arrangement {
        &self.states[0]
    }

    /// Every arrangement discovered so far, in frontier order.
    pub fn states(&self) -> &[Arrangement] {
        &self.states
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub fn is_seen(&self, signature: u32) -> bool {
        self.seen.contains(&signature)
    }

    /// Target piece sits on the goal anchor.
    #[inline]
    pub fn is_goal(&self, state: &Arrangement) -> bool {
        state.anchor(self.target.piece) == self.target.anchor
    }

    /// Drop everything but the root so a new search starts clean.
    fn reset(&mut self) {
        self.states.truncate(1);
        self.seen.clear();
        self.stats = SearchStats::default();
    }

    /// Build the successor of `states[from]` with one piece shifted.
    ///
    /// Fails when the indices are unknown, the move is not legal, or the
    /// resulting signature has already been seen. Nothing is recorded
    /// either way.
    pub fn apply_move(&self, from: usize, piece: usize, direction: Direction) -> Result<Arrangement, MoveError> {
        let state = self.states.get(from).ok_or(MoveError::UnknownState { index: from })?;
        let moved = state.pieces.get(piece).ok_or(MoveError::UnknownPiece { piece })?;
        if !can_move(moved, &state.occupancy(), direction) {
            return Err(MoveError::Illegal {
                label: moved.label,
                direction,
            });
        }
        self.successor(from, piece, direction)
    }

    /// [`Board::apply_move`] for a move already known to be legal.
    fn successor(&self, from: usize, piece: usize, direction: Direction) -> Result<Arrangement, MoveError> {
        let state = &self.states[from];
        let moved = &state.pieces[piece];
        let signature = self.zobrist.incremental_signature(state, moved, direction);

        if self.seen.contains(&signature) {
            return Err(MoveError::AlreadyVisited { signature });
        }

        Ok(Arrangement {
            pieces: state.moved_pieces(piece, direction),
            signature,
            parent: Some(from),
            step: state.step + 1,
            last_move: Some(PieceMove {
                piece,
                label: moved.label,
                direction,
            }),
        })
    }

    fn push(&mut self, state: Arrangement) -> usize {
        self.seen.insert(state.signature);
        self.stats.discovered += 1;
        self.stats.max_step = self.stats.max_step.max(state.step);
        self.states.push(state);
        self.states.len() - 1
    }

    /// Append every unseen successor of `states[index]`.
    ///
    /// Pieces are tried in index order and directions in [`Direction::ALL`]
    /// order. After each single step the same piece is tried once more in
    /// the same direction; that double step is recorded with the single
    /// step's step counter so reconstruction can fold the pair into one
    /// entry. Returns the number of arrangements appended.
    pub fn expand(&mut self, index: usize) -> usize {
        let before = self.states.len();
        let grid = self.states[index].occupancy();

        for piece in 0..self.states[index].pieces.len() {
            for direction in Direction::ALL {
                if !can_move(&self.states[index].pieces[piece], &grid, direction) {
                    continue;
                }

                let single = match self.successor(index, piece, direction) {
                    Ok(next) => self.push(next),
                    Err(_) => {
                        self.stats.duplicates += 1;
                        continue;
                    }
                };

                let after = &self.states[single];
                if !can_move(&after.pieces[piece], &after.occupancy(), direction) {
                    continue;
                }

                match self.successor(single, piece, direction) {
                    Ok(mut double) => {
                        double.step -= 1;
                        self.stats.lookahead += 1;
                        self.push(double);
                    }
                    Err(_) => self.stats.duplicates += 1,
                }
            }
        }

        self.states.len() - before
    }

    /// Scan the frontier until the goal is found.
    ///
    /// Any previous search on this board is discarded first, so repeated
    /// calls give the same answer.
    pub fn solve(&mut self) -> Result<Vec<SolutionStep>, SolveError> {
        self.reset();
        tracing::debug!(
            seed = self.zobrist.seed(),
            goal = %self.goal.piece,
            root = format_args!("{:#010x}", self.states[0].signature),
            "starting search"
        );

        let mut cursor = 0;
        while cursor < self.states.len() {
            self.seen.insert(self.states[cursor].signature);
            self.stats.examined += 1;

            if self.is_goal(&self.states[cursor]) {
                let steps = self.reconstruct(cursor);
                tracing::debug!(
                    index = cursor,
                    discovered = self.states.len(),
                    moves = steps.len(),
                    "goal reached"
                );
                return Ok(steps);
            }

            self.expand(cursor);

            if cursor % PROGRESS_INTERVAL == 0 {
                tracing::trace!(cursor, frontier = self.states.len(), "exploring");
            }
            cursor += 1;
        }

        tracing::debug!(explored = cursor, "frontier exhausted");
        Err(SolveError::Unsolvable { explored: cursor })
    }

    /// Expand the whole reachable space without testing for the goal.
    ///
    /// Returns the number of distinct signatures reached.
    pub fn explore_all(&mut self) -> usize {
        self.reset();

        let mut cursor = 0;
        while cursor < self.states.len() {
            self.seen.insert(self.states[cursor].signature);
            self.stats.examined += 1;
            self.expand(cursor);
            cursor += 1;
        }

        self.seen.len()
    }

    /// Walk parent links from `goal` back to the root and return the moves
    /// in forward order.
    ///
    /// One arrangement is kept per step counter. When a node and its parent
    /// moved the same piece the same way, the parent is skipped so the pair
    /// shows up as a single two-cell entry.
    pub fn reconstruct(&self, goal: usize) -> Vec<SolutionStep> {
        let mut by_step: BTreeMap<u32, usize> = BTreeMap::new();
        let mut current = goal;

        while let Some(parent) = self.states[current].parent {
            let node = &self.states[current];
            by_step.insert(node.step, current);

            let above = &self.states[parent];
            current = match (node.last_move, above.last_move, above.parent) {
                (Some(mv), Some(prev), Some(grandparent)) if mv.same_slide(&prev) => grandparent,
                _ => parent,
            };
        }

        let mut previous = &self.states[current];
        let mut steps = Vec::with_capacity(by_step.len());
        for &index in by_step.values() {
            let arrangement = &self.states[index];
            if let Some(mv) = arrangement.last_move {
                steps.push(SolutionStep {
                    piece: mv.piece,
                    label: mv.label,
                    direction: mv.direction,
                    distance: previous.anchor(mv.piece).distance(arrangement.anchor(mv.piece)),
                    arrangement: arrangement.clone(),
                });
            }
            previous = arrangement;
        }
        steps
    }

    /// Re-apply `steps` to the root with the legality checker.
    ///
    /// Returns the final arrangement when every step is legal, lands on the
    /// recorded arrangement, and the last one satisfies the goal.
    pub fn replay(&self, steps: &[SolutionStep]) -> Result<Arrangement, ReplayError> {
        let mut pieces = self.root().pieces.clone();

        for (step, entry) in steps.iter().enumerate() {
            if entry.piece >= pieces.len() {
                return Err(ReplayError::UnknownPiece {
                    step,
                    piece: entry.piece,
                });
            }

            for _ in 0..entry.distance {
                let grid = Occupancy::from_pieces(&pieces);
                if !can_move(&pieces[entry.piece], &grid, entry.direction) {
                    return Err(ReplayError::IllegalMove {
                        step,
                        label: pieces[entry.piece].label,
                        direction: entry.direction,
                    });
                }
                pieces[entry.piece] = pieces[entry.piece].shifted(entry.direction);
            }

            if pieces != entry.arrangement.pieces {
                return Err(ReplayError::Diverged { step });
            }
        }

        let signature = self.zobrist.full_signature(&pieces);
        let last = Arrangement::root(pieces, signature);
        if !self.is_goal(&last) {
            return Err(ReplayError::GoalNotReached { steps: steps.len() });
        }
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{classic_layout, PieceSpec};

    fn classic_board() -> Board {
        SolverConfig::default().board().unwrap()
    }

    #[test]
    fn test_new_seeds_frontier_with_root() {
        let board = classic_board();
        assert_eq!(board.states().len(), 1);
        assert_eq!(board.root().step, 0);
        assert_eq!(board.root().parent, None);
        assert_eq!(board.root().last_move, None);
        assert_eq!(
            board.root().signature,
            board.zobrist().full_signature(&board.root().pieces)
        );
        assert!(!board.is_seen(board.root().signature));
        assert_eq!((board.width(), board.height()), (4, 5));
    }

    #[test]
    fn test_new_rejects_missing_goal_piece() {
        let config = SolverConfig {
            goal: Goal { piece: 'z', x: 1, y: 3 },
            ..SolverConfig::default()
        };
        assert_eq!(
            config.board().err(),
            Some(LayoutError::MissingGoalPiece('z'))
        );
    }

    #[test]
    fn test_new_rejects_goal_off_grid() {
        let config = SolverConfig {
            goal: Goal { piece: 'b', x: 3, y: 3 },
            ..SolverConfig::default()
        };
        assert_eq!(
            config.board().err(),
            Some(LayoutError::GoalOutOfBounds { label: 'b', x: 3, y: 3 })
        );
    }

    #[test]
    fn test_apply_move_rejects_visited() {
        let mut board = classic_board();
        // j left
        let next = board.apply_move(0, 9, Direction::Left).unwrap();
        assert_eq!(next.step, 1);
        assert_eq!(next.parent, Some(0));
        assert_eq!(next.anchor(9), Cell::new(2, 4));
        assert_eq!(
            next.last_move,
            Some(PieceMove { piece: 9, label: 'j', direction: Direction::Left })
        );

        let signature = next.signature;
        board.push(next);
        assert_eq!(
            board.apply_move(0, 9, Direction::Left).unwrap_err(),
            MoveError::AlreadyVisited { signature }
        );
    }

    #[test]
    fn test_apply_move_rejects_illegal_and_unknown() {
        let board = classic_board();
        // a is at the left edge; i sits under d
        assert_eq!(
            board.apply_move(0, 0, Direction::Left).unwrap_err(),
            MoveError::Illegal { label: 'a', direction: Direction::Left }
        );
        assert_eq!(
            board.apply_move(0, 8, Direction::Down).unwrap_err(),
            MoveError::Illegal { label: 'i', direction: Direction::Down }
        );
        assert_eq!(
            board.apply_move(0, 10, Direction::Up).unwrap_err(),
            MoveError::UnknownPiece { piece: 10 }
        );
        assert_eq!(
            board.apply_move(3, 9, Direction::Left).unwrap_err(),
            MoveError::UnknownState { index: 3 }
        );
    }

    #[test]
    fn test_new_rejects_goal_anchor_far_off_grid() {
        for (x, y) in [(1, 127), (i8::MAX, 0), (-1, 3), (0, i8::MIN)] {
            let config = SolverConfig {
                goal: Goal { piece: 'b', x, y },
                ..SolverConfig::default()
            };
            assert_eq!(
                config.board().err(),
                Some(LayoutError::GoalOutOfBounds { label: 'b', x, y })
            );
        }
    }

    #[test]
    fn test_expand_initial_state() {
        let mut board = classic_board();
        let added = board.expand(0);

        // 4 single steps plus 2 double steps (i right twice, j left twice)
        assert_eq!(added, 6);
        assert_eq!(board.states().len(), 7);
        assert_eq!(board.stats().lookahead, 2);

        let moves: Vec<(char, Direction, u32)> = board.states()[1..]
            .iter()
            .map(|s| {
                let mv = s.last_move.unwrap();
                (mv.label, mv.direction, s.step)
            })
            .collect();
        assert_eq!(
            moves,
            [
                ('g', Direction::Down, 1),
                ('h', Direction::Down, 1),
                ('i', Direction::Right, 1),
                ('i', Direction::Right, 1),
                ('j', Direction::Left, 1),
                ('j', Direction::Left, 1),
            ]
        );
    }

    #[test]
    fn test_double_step_parent_is_single_step() {
        let mut board = classic_board();
        board.expand(0);

        let double = &board.states()[4];
        assert_eq!(double.parent, Some(3));
        assert_eq!(double.anchor(8), Cell::new(2, 4));
        assert_eq!(double.step, board.states()[3].step);
    }

    #[test]
    fn test_expand_twice_adds_nothing() {
        let mut board = classic_board();
        board.expand(0);
        let signatures: Vec<u32> = board.states().iter().map(|s| s.signature).collect();

        assert_eq!(board.expand(0), 0);
        assert_eq!(board.states().len(), 7);
        assert_eq!(board.stats().duplicates, 4);

        let unique: HashSet<u32> = signatures.iter().copied().collect();
        assert_eq!(unique.len(), signatures.len());
    }

    #[test]
    fn test_incremental_signatures_match_full() {
        let mut board = classic_board();
        let mut index = 0;
        while index < board.states().len() && index < 200 {
            board.expand(index);
            index += 1;
        }
        for state in board.states() {
            assert_eq!(state.signature, board.zobrist().full_signature(&state.pieces));
        }
    }

    #[test]
    fn test_solve_classic() {
        let mut board = classic_board();
        let steps = board.solve().unwrap();
        assert!(!steps.is_empty());

        let last = &steps[steps.len() - 1].arrangement;
        assert!(board.is_goal(last));
        assert_eq!(last.anchor(1), Cell::new(1, 3));
        assert!(steps.iter().all(|s| s.distance == 1 || s.distance == 2));

        board.replay(&steps).unwrap();
    }

    #[test]
    fn test_solve_is_repeatable() {
        let mut board = classic_board();
        let first = board.solve().unwrap();
        let stats = board.stats();
        let second = board.solve().unwrap();

        assert_eq!(board.stats(), stats);
        let key = |steps: &[SolutionStep]| -> Vec<(usize, Direction, u8)> {
            steps.iter().map(|s| (s.piece, s.direction, s.distance)).collect()
        };
        assert_eq!(key(&first), key(&second));
    }

    #[test]
    fn test_goal_at_root_needs_no_moves() {
        let config = SolverConfig {
            goal: Goal { piece: 'b', x: 1, y: 0 },
            ..SolverConfig::default()
        };
        let mut board = config.board().unwrap();
        assert_eq!(board.solve().unwrap().len(), 0);
        assert_eq!(board.stats().examined, 1);
    }

    #[test]
    fn test_unsolvable_exhausts_frontier() {
        // Every cell is taken, so nothing can move.
        let config = SolverConfig {
            goal: Goal { piece: 'b', x: 0, y: 3 },
            layout: Some(vec![
                PieceSpec::new('b', 2, 2, 0, 0),
                PieceSpec::new('c', 2, 2, 2, 0),
                PieceSpec::new('d', 2, 2, 0, 2),
                PieceSpec::new('e', 2, 2, 2, 2),
                PieceSpec::new('f', 2, 1, 0, 4),
                PieceSpec::new('g', 2, 1, 2, 4),
            ]),
            ..SolverConfig::default()
        };
        let mut board = config.board().unwrap();
        assert_eq!(board.solve().unwrap_err(), SolveError::Unsolvable { explored: 1 });
    }

    #[test]
    fn test_reconstruct_folds_three_step_slide() {
        // a is a 1x1 at the bottom right; goal is the bottom left corner.
        let config = SolverConfig {
            goal: Goal { piece: 'a', x: 0, y: 4 },
            layout: Some(vec![
                PieceSpec::new('b', 2, 2, 0, 0),
                PieceSpec::new('c', 2, 2, 2, 0),
                PieceSpec::new('d', 2, 2, 0, 2),
                PieceSpec::new('e', 2, 2, 2, 2),
                PieceSpec::new('a', 1, 1, 3, 4),
            ]),
            ..SolverConfig::default()
        };
        let mut board = config.board().unwrap();
        let steps = board.solve().unwrap();

        let total: u8 = steps.iter().map(|s| s.distance).sum();
        assert!(steps.iter().all(|s| s.label == 'a' && s.direction == Direction::Left));
        assert_eq!(total, 3);
        assert_eq!(steps.len(), 2);
        assert_eq!(board.replay(&steps).unwrap().anchor(4), Cell::new(0, 4));
    }

    #[test]
    fn test_solution_step_display() {
        let mut board = classic_board();
        board.expand(0);
        let steps = board.reconstruct(4);

        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].to_string(), "i moves right x2");

        let single = board.reconstruct(1);
        assert_eq!(single[0].to_string(), "g moves down");
    }

    #[test]
    fn test_replay_rejects_tampered_step() {
        let mut board = classic_board();
        let mut steps = board.solve().unwrap();
        steps[0].direction = steps[0].direction.opposite();
        assert!(board.replay(&steps).is_err());
    }

    #[test]
    fn test_replay_rejects_truncated_solution() {
        let mut board = classic_board();
        let mut steps = board.solve().unwrap();
        steps.pop();
        assert_eq!(
            board.replay(&steps).unwrap_err(),
            ReplayError::GoalNotReached { steps: steps.len() }
        );
    }

    #[test]
    fn test_explore_all_covers_solution() {
        let layout = classic_layout();
        let config = SolverConfig::default();
        let mut board = Board::new(layout, &config).unwrap();
        let reached = board.explore_all();

        assert_eq!(reached, board.states().len());
        assert!(board.states().iter().any(|s| board.is_goal(s)));
        assert_eq!(board.stats().examined, board.states().len());
    }
}
