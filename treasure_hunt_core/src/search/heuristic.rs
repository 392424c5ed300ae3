use crate::{Direction, Position};

/// Lower bound on the number of primitive actions needed to walk from `from`
/// to `to` when starting out facing `facing`.
///
/// Manhattan distance plus turns: one when the goal lies off the current
/// axis, two when it lies behind, and one more when both axes differ.
pub fn distance(from: Position, to: Position, facing: Direction) -> i32 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;

    let mut turns = match facing {
        Direction::North => i32::from(dx != 0) + if dy > 0 { 2 } else { 0 },
        Direction::South => i32::from(dx != 0) + if dy < 0 { 2 } else { 0 },
        Direction::East => i32::from(dy != 0) + if dx < 0 { 2 } else { 0 },
        Direction::West => i32::from(dy != 0) + if dx > 0 { 2 } else { 0 },
    };
    if dx != 0 && dy != 0 {
        turns += 1;
    }

    dx.abs() + dy.abs() + turns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_ahead_costs_only_steps() {
        let origin = Position::HOME;
        assert_eq!(distance(origin, Position::new(0, -3), Direction::North), 3);
        assert_eq!(distance(origin, Position::new(4, 0), Direction::East), 4);
        assert_eq!(distance(origin, origin, Direction::West), 0);
    }

    #[test]
    fn turns_are_charged() {
        let origin = Position::HOME;
        // Behind: a full reversal.
        assert_eq!(distance(origin, Position::new(0, 2), Direction::North), 4);
        // Beside: one turn.
        assert_eq!(distance(origin, Position::new(1, 0), Direction::North), 2);
        // Diagonal ahead: one turn for the lateral axis, one for the corner.
        assert_eq!(distance(origin, Position::new(1, -1), Direction::North), 4);
        // Diagonal behind.
        assert_eq!(distance(origin, Position::new(-1, 1), Direction::North), 6);
        assert_eq!(distance(origin, Position::new(-2, 1), Direction::West), 5);
    }
}
