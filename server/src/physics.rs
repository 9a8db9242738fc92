//! Fixed-step kinematics for the ball and paddles.

use pong_shared::{BALL_BOUNCE_MAX_Y, BALL_BOUNCE_MIN_Y, FIELD_WIDTH, PADDLE_MAX_Y};

///Represents a vector in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    ///Value along the x-axis.
    /// Positive direction is to the right.
    pub x: f32,
    ///Value along the y-axis.
    /// Positive direction is down, as on screen.
    pub y: f32,
}

impl Vector2 {
    pub fn new(x: f32, y: f32) -> Self {
        Vector2 { x, y }
    }

    ///Returns the sum of two vectors.
    pub fn add(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl From<(f32, f32)> for Vector2 {
    fn from((x, y): (f32, f32)) -> Self {
        Vector2 { x, y }
    }
}

///The ball. Moves by its full velocity once per tick, no delta time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub position: Vector2,
    pub velocity: Vector2,
}

impl Ball {
    pub fn new(position: Vector2, velocity: Vector2) -> Self {
        Ball { position, velocity }
    }

    ///Advances the ball one step and reflects it off the bounce band.
    ///Returns true if the vertical velocity was inverted.
    pub fn step(&mut self) -> bool {
        self.position = self.position.add(&self.velocity);

        if self.position.y < BALL_BOUNCE_MIN_Y || self.position.y > BALL_BOUNCE_MAX_Y {
            self.velocity.y = -self.velocity.y;
            return true;
        }
        false
    }

    ///True once the ball has left the field horizontally.
    pub fn is_out_of_bounds(&self) -> bool {
        self.position.x < 0.0 || self.position.x > FIELD_WIDTH
    }
}

///Clamps a paddle offset into the playable range.
pub fn clamp_paddle(y: f32) -> f32 {
    y.clamp(0.0, PADDLE_MAX_Y)
}
