use crate::physics::{clamp_paddle, Ball, Vector2};
use log::debug;
use pong_shared::{
    Direction, MatchSnapshot, BALL_START, BALL_START_VELOCITY, PADDLE_HEIGHT, PADDLE_START_Y,
    PADDLE_WIDTH,
};

/// Which paddle an occupant controls. Fixed when the match is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    Finished,
}

/// Authoritative simulation state of one match.
#[derive(Debug, Clone)]
pub struct MatchState {
    pub tick: u32,
    pub ball: Ball,
    pub paddle_left_y: f32,
    pub paddle_right_y: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub ended: bool,
}

impl MatchState {
    pub fn new() -> Self {
        Self {
            tick: 0,
            ball: Ball::new(Vector2::from(BALL_START), Vector2::from(BALL_START_VELOCITY)),
            paddle_left_y: PADDLE_START_Y,
            paddle_right_y: PADDLE_START_Y,
            paddle_width: PADDLE_WIDTH,
            paddle_height: PADDLE_HEIGHT,
            ended: false,
        }
    }

    /// Moves the ball one step and checks whether it left the field.
    ///
    /// Paddles are not touched here; they only change through
    /// [`MatchState::apply_move`].
    pub fn advance(&mut self) -> TickOutcome {
        self.tick += 1;
        if self.ball.step() {
            debug!(
                "Ball reflected at tick {} ({:.1}, {:.1})",
                self.tick, self.ball.position.x, self.ball.position.y
            );
        }
        self.evaluate_termination()
    }

    pub fn apply_move(&mut self, side: Side, direction: Direction) {
        let paddle = match side {
            Side::Left => &mut self.paddle_left_y,
            Side::Right => &mut self.paddle_right_y,
        };
        *paddle = clamp_paddle(*paddle + direction.delta());
    }

    /// Single termination rule shared by the tick loop and move handling.
    pub fn evaluate_termination(&self) -> TickOutcome {
        if self.ended || self.ball.is_out_of_bounds() {
            TickOutcome::Finished
        } else {
            TickOutcome::Running
        }
    }

    pub fn snapshot(&self, match_id: u32) -> MatchSnapshot {
        MatchSnapshot {
            match_id,
            ball_x: self.ball.position.x,
            ball_y: self.ball.position.y,
            ball_vx: self.ball.velocity.x,
            ball_vy: self.ball.velocity.y,
            paddle_left_y: self.paddle_left_y,
            paddle_right_y: self.paddle_right_y,
            paddle_width: self.paddle_width,
            paddle_height: self.paddle_height,
            ended: self.ended,
        }
    }
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new()
    }
}
