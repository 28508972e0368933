use std::f32::consts::FRAC_1_SQRT_2;

use super::scene::{Direction, InputSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Quit,
}

const ACTION_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Quit => 4,
        }
    }
}

/// Normalized movement intent for one tick. Both axes carry a 1/sqrt(2)
/// scale while a diagonal is held so combined magnitude equals the
/// single-axis magnitude.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementInput {
    pub x: f32,
    pub y: f32,
    pub moving: bool,
}

impl MovementInput {
    pub fn from_snapshot(snapshot: &InputSnapshot) -> Self {
        let mut x = 0.0f32;
        let mut y = 0.0f32;
        if snapshot.is_down(InputAction::MoveLeft) {
            x -= 1.0;
        }
        if snapshot.is_down(InputAction::MoveRight) {
            x += 1.0;
        }
        if snapshot.is_down(InputAction::MoveUp) {
            y -= 1.0;
        }
        if snapshot.is_down(InputAction::MoveDown) {
            y += 1.0;
        }

        if x != 0.0 && y != 0.0 {
            x *= FRAC_1_SQRT_2;
            y *= FRAC_1_SQRT_2;
        }

        Self {
            x,
            y,
            moving: x != 0.0 || y != 0.0,
        }
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// Facing from a movement vector. Horizontal input wins over vertical;
/// idle input keeps the caller's last-known facing.
pub fn resolve_direction(x: f32, y: f32, fallback: Direction) -> Direction {
    if x < 0.0 {
        Direction::Left
    } else if x > 0.0 {
        Direction::Right
    } else if y < 0.0 {
        Direction::Up
    } else if y > 0.0 {
        Direction::Down
    } else {
        fallback
    }
}
