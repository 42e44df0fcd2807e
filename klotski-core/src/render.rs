//! Bordered text rendering of an arrangement.
//!
//! ```text
//! X X X X X X
//! X a b b c X
//! X a b b c X
//! X d e e f X
//! X d g h f X
//! X i _ _ j X
//! X X Z Z X X
//! ```
//!
//! Every token is followed by a space and every line ends in a newline.
//! `Z` marks the exit under the goal columns.

use std::ops::Range;

use crate::{Arrangement, Cell, HEIGHT, WIDTH};

const WALL: char = 'X';
const EXIT: char = 'Z';
const EMPTY: char = '_';

/// Grid columns the exit opens under.
const EXIT_COLUMNS: Range<i8> = 1..3;

fn push_token(out: &mut String, token: char) {
    out.push(token);
    out.push(' ');
}

/// Render `arrangement` as a character grid inside a wall border.
pub fn render(arrangement: &Arrangement) -> String {
    let grid = arrangement.occupancy();
    let mut out = String::with_capacity(((WIDTH + 2) * 2 + 1) as usize * (HEIGHT + 2) as usize);

    for _ in 0..WIDTH + 2 {
        push_token(&mut out, WALL);
    }
    out.push('\n');

    for y in 0..HEIGHT {
        push_token(&mut out, WALL);
        for x in 0..WIDTH {
            let token = grid
                .get(Cell::new(x, y))
                .map_or(EMPTY, |index| arrangement.pieces[index].label);
            push_token(&mut out, token);
        }
        push_token(&mut out, WALL);
        out.push('\n');
    }

    for x in -1..=WIDTH {
        push_token(&mut out, if EXIT_COLUMNS.contains(&x) { EXIT } else { WALL });
    }
    out.push('\n');

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{classic_layout, Direction};

    #[test]
    fn test_render_classic() {
        let state = Arrangement::root(classic_layout().build().unwrap(), 0);
        let expected = "\
X X X X X X \n\
X a b b c X \n\
X a b b c X \n\
X d e e f X \n\
X d g h f X \n\
X i _ _ j X \n\
X X Z Z X X \n";
        assert_eq!(render(&state), expected);
        assert_eq!(state.to_string(), expected);
    }

    #[test]
    fn test_render_after_move() {
        let root = Arrangement::root(classic_layout().build().unwrap(), 0);
        let moved = Arrangement::root(root.moved_pieces(9, Direction::Left), 0);
        let rendered = render(&moved);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[5], "X i _ j _ X ");
    }

    #[test]
    fn test_render_empty_board() {
        let state = Arrangement::root(Vec::new(), 0);
        let rendered = render(&state);
        assert_eq!(rendered.matches(EMPTY).count(), 20);
        assert_eq!(rendered.matches(EXIT).count(), 2);
    }
}
