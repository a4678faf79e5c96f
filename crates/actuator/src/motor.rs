//! Motor directions and outputs

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ActuatorError;

/// Motion direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
    ];
}

/// Any commandable output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Output {
    Forward,
    Backward,
    Left,
    Right,
    Horn,
}

impl Output {
    pub const ALL: [Output; 5] = [
        Output::Forward,
        Output::Backward,
        Output::Left,
        Output::Right,
        Output::Horn,
    ];

    /// Motion direction this output drives, if any
    pub fn direction(self) -> Option<Direction> {
        match self {
            Output::Forward => Some(Direction::Forward),
            Output::Backward => Some(Direction::Backward),
            Output::Left => Some(Direction::Left),
            Output::Right => Some(Direction::Right),
            Output::Horn => None,
        }
    }

    pub fn is_motion(self) -> bool {
        self.direction().is_some()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Output::Forward => "forward",
            Output::Backward => "backward",
            Output::Left => "left",
            Output::Right => "right",
            Output::Horn => "horn",
        }
    }
}

impl From<Direction> for Output {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Forward => Output::Forward,
            Direction::Backward => Output::Backward,
            Direction::Left => Output::Left,
            Direction::Right => Output::Right,
        }
    }
}

impl FromStr for Output {
    type Err = ActuatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Output::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| ActuatorError::UnknownOutput(s.to_string()))
    }
}

/// Commanded state of the four motion directions.
///
/// Opposing directions may be active together; exclusivity is the
/// controller's policy, not this layer's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl MotorState {
    pub fn get(&self, direction: Direction) -> bool {
        match direction {
            Direction::Forward => self.forward,
            Direction::Backward => self.backward,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn set(&mut self, direction: Direction, active: bool) {
        match direction {
            Direction::Forward => self.forward = active,
            Direction::Backward => self.backward = active,
            Direction::Left => self.left = active,
            Direction::Right => self.right = active,
        }
    }

    /// Force every direction off
    pub fn clear(&mut self) {
        *self = MotorState::default();
    }

    pub fn any_active(&self) -> bool {
        Direction::ALL.iter().any(|d| self.get(*d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_parse() {
        assert_eq!("forward".parse::<Output>().unwrap(), Output::Forward);
        assert_eq!("horn".parse::<Output>().unwrap(), Output::Horn);
        assert!("brake".parse::<Output>().is_err());
    }

    #[test]
    fn test_motion_outputs() {
        assert!(Output::Left.is_motion());
        assert!(!Output::Horn.is_motion());
        assert_eq!(Output::from(Direction::Right), Output::Right);
    }

    #[test]
    fn test_motor_state() {
        let mut motors = MotorState::default();
        assert!(!motors.any_active());

        motors.set(Direction::Forward, true);
        motors.set(Direction::Backward, true);
        assert!(motors.get(Direction::Forward) && motors.get(Direction::Backward));
        assert!(motors.any_active());

        motors.clear();
        assert_eq!(motors, MotorState::default());
    }
}
