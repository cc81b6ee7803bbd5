//! Game state: board, active piece, gravity, line clears, score.
//!
//! Everything here is a pure state machine: no terminal, no clock, no disk.
//! The app drives it with [`GameState::step_down`] on every gravity tick and
//! with the move/rotate calls on key presses.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Board width in cells.
pub const COLS: usize = 10;
/// Board height in cells.
pub const ROWS: usize = 20;

/// Top-left offset every new piece spawns at.
pub const SPAWN_X: i32 = 3;
pub const SPAWN_Y: i32 = 0;

/// Points per cleared row. No multi-line multiplier.
pub const LINE_CLEAR_BONUS: u32 = 10;

/// Tetromino kinds (I, O, T, L, J, S, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TetrominoKind {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

impl TetrominoKind {
    pub const ALL: [Self; 7] = [Self::I, Self::O, Self::T, Self::L, Self::J, Self::S, Self::Z];

    /// Spawn orientation, row 0 on top.
    pub fn shape(self) -> Shape {
        let rows: &[&[u8]] = match self {
            Self::I => &[&[1, 1, 1, 1]],
            Self::O => &[&[1, 1], &[1, 1]],
            Self::T => &[&[0, 1, 0], &[1, 1, 1]],
            Self::L => &[&[1, 0, 0], &[1, 1, 1]],
            Self::J => &[&[0, 0, 1], &[1, 1, 1]],
            Self::S => &[&[0, 1, 1], &[1, 1, 0]],
            Self::Z => &[&[1, 1, 0], &[0, 1, 1]],
        };
        Shape::from_rows(rows)
    }

    /// Index into `Theme::pieces`.
    #[inline]
    pub fn color_index(self) -> usize {
        self as usize
    }
}

/// Row-major occupancy matrix of a piece. Not necessarily square: the I piece
/// is 1x4 and becomes 4x1 after one rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    rows: Vec<Vec<bool>>,
}

impl Shape {
    fn from_rows(rows: &[&[u8]]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|&c| c != 0).collect())
                .collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// `(dx, dy)` of every filled cell relative to the top-left corner.
    pub fn filled_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.rows.iter().enumerate().flat_map(|(dy, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(dx, _)| (dx as i32, dy as i32))
        })
    }

    /// Clockwise quarter turn: transpose, then reverse each new row.
    /// `new[r][c] = old[h - 1 - c][r]`.
    pub fn rotated_cw(&self) -> Self {
        let h = self.height();
        let rows = (0..self.width())
            .map(|col| (0..h).rev().map(|row| self.rows[row][col]).collect())
            .collect();
        Self { rows }
    }
}

/// Single board cell. A filled cell remembers which piece it came from so the
/// renderer can keep the piece colour after the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(TetrominoKind),
}

impl Cell {
    #[inline]
    pub fn is_filled(self) -> bool {
        matches!(self, Self::Filled(_))
    }
}

/// Settled cells. y=0 is the top row; there are always exactly `ROWS` rows of
/// `COLS` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: VecDeque<[Cell; COLS]>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            rows: (0..ROWS).map(|_| [Cell::Empty; COLS]).collect(),
        }
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *slot = cell;
        }
    }

    /// Rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell; COLS]> + '_ {
        self.rows.iter()
    }

    /// True if `shape` with its top-left corner at `(x, y)` stays inside the
    /// columns, above the floor, and off every occupied cell.
    ///
    /// Cells above the top edge (negative row) are only bounds-checked on
    /// columns; there is no row there to be occupied.
    pub fn fits(&self, shape: &Shape, x: i32, y: i32) -> bool {
        shape.filled_cells().all(|(dx, dy)| {
            let (bx, by) = (x + dx, y + dy);
            if bx < 0 || bx >= COLS as i32 || by >= ROWS as i32 {
                return false;
            }
            if by < 0 {
                return true;
            }
            !self.rows[by as usize][bx as usize].is_filled()
        })
    }

    /// Copy the piece's filled cells into the board.
    fn merge(&mut self, piece: &ActivePiece) {
        for (x, y) in piece.cells() {
            if x >= 0 && y >= 0 {
                self.set(x as usize, y as usize, Cell::Filled(piece.kind));
            }
        }
    }

    /// Remove every full row, bottom to top, pushing an empty row in at the
    /// top for each. Returns the number of rows removed.
    pub fn clear_full_rows(&mut self) -> u32 {
        let mut cleared = 0;
        let mut y = ROWS;
        while y > 0 {
            if self.rows[y - 1].iter().all(|c| c.is_filled()) {
                self.rows.remove(y - 1);
                self.rows.push_front([Cell::Empty; COLS]);
                cleared += 1;
                // Row y-1 now holds what was above it; look at it again.
            } else {
                y -= 1;
            }
        }
        cleared
    }
}

/// The falling piece: its kind, its current orientation and the board offset
/// of the shape's top-left corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePiece {
    pub kind: TetrominoKind,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
}

impl ActivePiece {
    pub fn spawn(kind: TetrominoKind) -> Self {
        Self {
            kind,
            shape: kind.shape(),
            x: SPAWN_X,
            y: SPAWN_Y,
        }
    }

    /// Board coordinates of every filled cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .filled_cells()
            .map(move |(dx, dy)| (self.x + dx, self.y + dy))
    }
}

/// Uniformly random tetromino source.
#[derive(Debug, Clone)]
pub struct PieceGenerator {
    rng: StdRng,
}

impl PieceGenerator {
    /// Seeded generators give the same sequence every run; `None` seeds from
    /// the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    pub fn next_kind(&mut self) -> TetrominoKind {
        TetrominoKind::ALL[self.rng.random_range(0..TetrominoKind::ALL.len())]
    }
}

/// Running score plus the best score seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub current: u32,
    pub high: u32,
}

impl Score {
    pub fn with_high(high: u32) -> Self {
        Self { current: 0, high }
    }

    /// Award the per-row bonus once per cleared row. The high score follows the
    /// running score immediately. Returns true if the high score moved.
    pub fn award_lines(&mut self, lines: u32) -> bool {
        let mut raised = false;
        for _ in 0..lines {
            self.current = self.current.saturating_add(LINE_CLEAR_BONUS);
            if self.current > self.high {
                self.high = self.current;
                raised = true;
            }
        }
        raised
    }

    fn reset(&mut self) {
        self.current = 0;
    }
}

/// Gravity driver states. `Locking` and `Spawned` are passed through inside a
/// single [`GameState::step_down`]; between calls the game is either
/// `Falling` or `GameOver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Falling,
    Locking,
    Spawned,
    GameOver,
}

/// What one gravity step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Piece moved down one row.
    Fell,
    /// Piece merged into the board; the next piece is falling.
    Locked { lines_cleared: u32 },
    /// The freshly spawned piece collided at its spawn offset.
    GameOver { final_score: u32 },
    /// Called while the game is over; nothing changed.
    Ignored,
}

/// Board, active piece, generator and score, owned by the app controller.
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    piece: ActivePiece,
    generator: PieceGenerator,
    score: Score,
    phase: Phase,
}

impl GameState {
    pub fn new(mut generator: PieceGenerator, high_score: u32) -> Self {
        let piece = ActivePiece::spawn(generator.next_kind());
        Self {
            board: Board::new(),
            piece,
            generator,
            score: Score::with_high(high_score),
            phase: Phase::Falling,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn piece(&self) -> &ActivePiece {
        &self.piece
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True if `shape` placed at the active piece's position plus `(dx, dy)`
    /// would leave the board or overlap a settled cell.
    pub fn collision(&self, dx: i32, dy: i32, shape: &Shape) -> bool {
        !self.board.fits(shape, self.piece.x + dx, self.piece.y + dy)
    }

    /// One gravity step: fall a row, or lock, clear, and spawn the next piece.
    pub fn step_down(&mut self) -> DropOutcome {
        let mut lines_cleared = 0;
        loop {
            match self.phase {
                Phase::Falling => {
                    if !self.collision(0, 1, &self.piece.shape) {
                        self.piece.y += 1;
                        return DropOutcome::Fell;
                    }
                    self.phase = Phase::Locking;
                }
                Phase::Locking => {
                    self.board.merge(&self.piece);
                    lines_cleared = self.board.clear_full_rows();
                    self.score.award_lines(lines_cleared);
                    self.phase = Phase::Spawned;
                }
                Phase::Spawned => {
                    self.piece = ActivePiece::spawn(self.generator.next_kind());
                    if self.collision(0, 0, &self.piece.shape) {
                        self.phase = Phase::GameOver;
                        return DropOutcome::GameOver {
                            final_score: self.score.current,
                        };
                    }
                    self.phase = Phase::Falling;
                    return DropOutcome::Locked { lines_cleared };
                }
                Phase::GameOver => return DropOutcome::Ignored,
            }
        }
    }

    /// Manual soft drop: the same descend-or-lock step the timer runs.
    pub fn soft_drop(&mut self) -> DropOutcome {
        self.step_down()
    }

    /// Move the piece `dx` columns if the target is free. Returns true if it
    /// moved.
    pub fn shift(&mut self, dx: i32) -> bool {
        if self.phase != Phase::Falling || self.collision(dx, 0, &self.piece.shape) {
            return false;
        }
        self.piece.x += dx;
        true
    }

    /// Rotate clockwise in place. No kicks: a rotation that does not fit at the
    /// current offset is dropped and the piece keeps its orientation.
    pub fn rotate(&mut self) -> bool {
        if self.phase != Phase::Falling {
            return false;
        }
        let rotated = self.piece.shape.rotated_cw();
        if self.collision(0, 0, &rotated) {
            return false;
        }
        self.piece.shape = rotated;
        true
    }

    /// Fresh board, zero score, new piece. The high score survives.
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.score.reset();
        self.piece = ActivePiece::spawn(self.generator.next_kind());
        self.phase = Phase::Falling;
    }
}

#[cfg(test)]
impl Board {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    pub fn filled_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|c| c.is_filled()).count())
            .sum()
    }
}

#[cfg(test)]
impl GameState {
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub(crate) fn place_piece(&mut self, kind: TetrominoKind, x: i32, y: i32) {
        self.piece = ActivePiece {
            kind,
            shape: kind.shape(),
            x,
            y,
        };
    }

    /// Wall off the spawn area and lock a piece beside it so the next spawn
    /// collides.
    pub(crate) fn top_out(&mut self) -> DropOutcome {
        for y in 0..2 {
            for x in 3..7 {
                self.board.set(x, y, Cell::Filled(TetrominoKind::Z));
            }
        }
        self.board.set(0, 2, Cell::Filled(TetrominoKind::Z));
        self.place_piece(TetrominoKind::O, 0, 0);
        self.step_down()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_state() -> GameState {
        GameState::new(PieceGenerator::new(Some(7)), 0)
    }

    fn fill_row_except(board: &mut Board, y: usize, gaps: &[usize]) {
        for x in (0..COLS).filter(|x| !gaps.contains(x)) {
            board.set(x, y, Cell::Filled(TetrominoKind::Z));
        }
    }

    fn drop_until_locked(state: &mut GameState) -> DropOutcome {
        loop {
            match state.step_down() {
                DropOutcome::Fell => continue,
                other => return other,
            }
        }
    }

    #[test]
    fn test_shapes_have_four_cells() {
        for kind in TetrominoKind::ALL {
            assert_eq!(kind.shape().filled_cells().count(), 4, "{kind:?}");
        }
    }

    #[test]
    fn test_rotate_t_clockwise() {
        let rotated = TetrominoKind::T.shape().rotated_cw();
        assert_eq!(rotated, Shape::from_rows(&[&[1, 0], &[1, 1], &[1, 0]]));
    }

    #[test]
    fn test_rotate_i_changes_bounding_box() {
        let rotated = TetrominoKind::I.shape().rotated_cw();
        assert_eq!((rotated.width(), rotated.height()), (1, 4));
    }

    #[test]
    fn test_four_rotations_restore_every_shape() {
        for kind in TetrominoKind::ALL {
            let shape = kind.shape();
            let half = shape.rotated_cw().rotated_cw();
            let full = half.rotated_cw().rotated_cw();
            assert_eq!(full, shape, "{kind:?}");
        }
    }

    #[test]
    fn test_clear_single_full_row() {
        let mut board = Board::new();
        fill_row_except(&mut board, ROWS - 1, &[]);
        board.set(2, ROWS - 2, Cell::Filled(TetrominoKind::T));

        assert_eq!(board.clear_full_rows(), 1);
        assert_eq!(board.rows().count(), ROWS);
        assert!(board.rows().next().is_some_and(|row| row.iter().all(|c| !c.is_filled())));
        assert_eq!(board.get(2, ROWS - 1), Some(Cell::Filled(TetrominoKind::T)));
        assert_eq!(board.filled_count(), 1);
    }

    #[test]
    fn test_clear_adjacent_full_rows_in_one_pass() {
        let mut board = Board::new();
        for y in ROWS - 3..ROWS {
            fill_row_except(&mut board, y, &[]);
        }
        board.set(0, ROWS - 4, Cell::Filled(TetrominoKind::L));

        assert_eq!(board.clear_full_rows(), 3);
        assert_eq!(board.rows().count(), ROWS);
        assert_eq!(board.filled_count(), 1);
        assert_eq!(board.get(0, ROWS - 1), Some(Cell::Filled(TetrominoKind::L)));
    }

    #[test]
    fn test_clear_leaves_incomplete_rows() {
        let mut board = Board::new();
        fill_row_except(&mut board, ROWS - 1, &[4]);
        assert_eq!(board.clear_full_rows(), 0);
        assert_eq!(board.filled_count(), COLS - 1);
    }

    #[test]
    fn test_no_collision_at_spawn_on_empty_board() {
        let mut state = new_state();
        for kind in TetrominoKind::ALL {
            state.place_piece(kind, SPAWN_X, SPAWN_Y);
            assert!(!state.collision(0, 0, &kind.shape()), "{kind:?}");
        }
    }

    #[test]
    fn test_collision_out_of_bounds() {
        let mut state = new_state();
        state.place_piece(TetrominoKind::I, SPAWN_X, SPAWN_Y);
        let shape = TetrominoKind::I.shape();
        // x = 3 - 4 = -1
        assert!(state.collision(-4, 0, &shape));
        // I spans 4 columns: x = 7 puts the last cell on column 10.
        assert!(state.collision(4, 0, &shape));
        assert!(!state.collision(3, 0, &shape));
        assert!(state.collision(0, ROWS as i32, &shape));
        assert!(!state.collision(0, ROWS as i32 - 1, &shape));
    }

    #[test]
    fn test_collision_with_settled_cell() {
        let mut state = new_state();
        state.place_piece(TetrominoKind::O, SPAWN_X, SPAWN_Y);
        state.board_mut().set(4, 2, Cell::Filled(TetrominoKind::S));
        assert!(state.collision(0, 1, &TetrominoKind::O.shape()));
        assert!(!state.collision(-2, 1, &TetrominoKind::O.shape()));
    }

    #[test]
    fn test_cells_above_board_skip_occupancy() {
        let mut board = Board::new();
        fill_row_except(&mut board, 0, &[]);
        let shape = TetrominoKind::O.shape();
        assert!(board.fits(&shape, 3, -2));
        assert!(!board.fits(&shape, 3, -1));
        assert!(!board.fits(&shape, -1, -2));
    }

    #[test]
    fn test_o_piece_locks_at_bottom() {
        let mut state = new_state();
        state.place_piece(TetrominoKind::O, SPAWN_X, SPAWN_Y);

        for _ in 0..18 {
            assert_eq!(state.step_down(), DropOutcome::Fell);
        }
        assert_eq!(state.piece().y, 18);
        assert_eq!(state.board().filled_count(), 0);

        assert_eq!(state.step_down(), DropOutcome::Locked { lines_cleared: 0 });
        let board = state.board();
        assert_eq!(board.filled_count(), 4);
        for (x, y) in [(3, 18), (4, 18), (3, 19), (4, 19)] {
            assert_eq!(board.get(x, y), Some(Cell::Filled(TetrominoKind::O)));
        }
        assert_eq!((state.piece().x, state.piece().y), (SPAWN_X, SPAWN_Y));
        assert_eq!(state.phase(), Phase::Falling);
    }

    #[test]
    fn test_filling_last_gap_clears_row() {
        let mut state = new_state();
        fill_row_except(state.board_mut(), ROWS - 1, &[3, 4]);
        state.place_piece(TetrominoKind::O, SPAWN_X, SPAWN_Y);

        assert_eq!(drop_until_locked(&mut state), DropOutcome::Locked { lines_cleared: 1 });
        assert_eq!(state.score().current, 10);
        // The O's upper half drops into the bottom row.
        assert_eq!(state.board().filled_count(), 2);
        assert_eq!(state.board().get(3, ROWS - 1), Some(Cell::Filled(TetrominoKind::O)));
        assert_eq!(state.board().get(4, ROWS - 1), Some(Cell::Filled(TetrominoKind::O)));
    }

    #[test]
    fn test_two_rows_score_twenty() {
        let mut state = new_state();
        fill_row_except(state.board_mut(), ROWS - 2, &[3, 4]);
        fill_row_except(state.board_mut(), ROWS - 1, &[3, 4]);
        state.place_piece(TetrominoKind::O, SPAWN_X, SPAWN_Y);

        assert_eq!(drop_until_locked(&mut state), DropOutcome::Locked { lines_cleared: 2 });
        assert_eq!(state.score().current, 20);
        assert_eq!(state.board().filled_count(), 0);
    }

    #[test]
    fn test_shift_stops_at_walls() {
        let mut state = new_state();
        state.place_piece(TetrominoKind::O, SPAWN_X, SPAWN_Y);
        while state.shift(-1) {}
        assert_eq!(state.piece().x, 0);
        while state.shift(1) {}
        assert_eq!(state.piece().x, COLS as i32 - 2);
    }

    #[test]
    fn test_rotation_rejected_at_right_wall() {
        let mut state = new_state();
        state.place_piece(TetrominoKind::I, SPAWN_X, SPAWN_Y);
        assert!(state.rotate());
        while state.shift(1) {}
        assert_eq!(state.piece().x, COLS as i32 - 1);

        let before = state.piece().shape.clone();
        assert!(!state.rotate());
        assert_eq!(state.piece().shape, before);
    }

    #[test]
    fn test_rotation_at_left_wall_stays_on_board() {
        let mut state = new_state();
        state.place_piece(TetrominoKind::I, 0, SPAWN_Y);
        for _ in 0..4 {
            assert!(state.rotate());
            assert!(state.piece().cells().all(|(x, _)| x >= 0));
        }
        assert_eq!(state.piece().shape, TetrominoKind::I.shape());
    }

    #[test]
    fn test_rotation_rejected_by_settled_cell() {
        let mut state = new_state();
        state.place_piece(TetrominoKind::T, SPAWN_X, SPAWN_Y);
        state.board_mut().set(3, 2, Cell::Filled(TetrominoKind::J));
        assert!(!state.rotate());
        assert_eq!(state.piece().shape, TetrominoKind::T.shape());
    }

    #[test]
    fn test_game_over_then_reset() {
        let mut state = new_state();
        assert_eq!(state.top_out(), DropOutcome::GameOver { final_score: 0 });
        assert_eq!(state.phase(), Phase::GameOver);
        assert_eq!(state.step_down(), DropOutcome::Ignored);
        assert!(!state.shift(1));
        assert!(!state.rotate());

        state.reset();
        assert_eq!(state.phase(), Phase::Falling);
        assert_eq!(state.board().filled_count(), 0);
        assert_eq!(state.score().current, 0);
    }

    #[test]
    fn test_high_score_follows_running_score() {
        let mut score = Score::with_high(15);
        assert!(!score.award_lines(1));
        assert_eq!(score, Score { current: 10, high: 15 });
        assert!(score.award_lines(1));
        assert_eq!(score, Score { current: 20, high: 20 });
        score.reset();
        assert_eq!(score, Score { current: 0, high: 20 });
        assert!(!score.award_lines(1));
        assert_eq!(score.high, 20);
    }

    #[test]
    fn test_high_score_survives_reset() {
        let mut state = new_state();
        fill_row_except(state.board_mut(), ROWS - 1, &[3, 4]);
        state.place_piece(TetrominoKind::O, SPAWN_X, SPAWN_Y);
        drop_until_locked(&mut state);
        assert_eq!(state.score(), Score { current: 10, high: 10 });

        state.reset();
        assert_eq!(state.score(), Score { current: 0, high: 10 });
    }

    #[test]
    fn test_seeded_generator_is_deterministic() {
        let mut a = PieceGenerator::new(Some(42));
        let mut b = PieceGenerator::new(Some(42));
        let seq_a: Vec<_> = (0..32).map(|_| a.next_kind()).collect();
        let seq_b: Vec<_> = (0..32).map(|_| b.next_kind()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn test_generator_yields_every_kind() {
        let mut generator = PieceGenerator::new(Some(1));
        let seen: std::collections::HashSet<_> = (0..700).map(|_| generator.next_kind()).collect();
        assert_eq!(seen.len(), TetrominoKind::ALL.len());
    }
}
