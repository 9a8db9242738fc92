use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const FIELD_WIDTH: f32 = 800.0;
pub const FIELD_HEIGHT: f32 = 400.0;
pub const PADDLE_WIDTH: f32 = 10.0;
pub const PADDLE_HEIGHT: f32 = 20.0;
pub const PADDLE_MAX_Y: f32 = FIELD_HEIGHT - PADDLE_HEIGHT;
pub const PADDLE_START_Y: f32 = 40.0;
pub const PADDLE_STEP: f32 = 5.0;
/// Vertical band the ball reflects inside. Independent of `FIELD_HEIGHT`.
pub const BALL_BOUNCE_MIN_Y: f32 = 0.0;
pub const BALL_BOUNCE_MAX_Y: f32 = 100.0;
pub const BALL_START: (f32, f32) = (50.0, 50.0);
pub const BALL_START_VELOCITY: (f32, f32) = (1.5, 1.2);
pub const TICK_MILLIS: u64 = 16;

/// Errors produced while decoding an inbound frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("unknown message type '{0}'")]
    UnknownType(String),

    #[error("invalid content for '{kind}': {source}")]
    InvalidContent {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("binary frame is not valid UTF-8")]
    BinaryNotUtf8,
}

/// Paddle movement requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Signed paddle offset for one move. Screen y grows downwards.
    pub fn delta(self) -> f32 {
        match self {
            Direction::Up => -PADDLE_STEP,
            Direction::Down => PADDLE_STEP,
        }
    }
}

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "camelCase")]
pub enum ClientMessage {
    Challenge(String),
    Move(Direction),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Value,
}

impl ClientMessage {
    /// Decodes a `{type, content}` envelope.
    ///
    /// The envelope is parsed first so an unknown `type` is reported as such
    /// instead of as a generic shape mismatch.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text).map_err(ProtocolError::Malformed)?;

        match envelope.kind.as_str() {
            "challenge" => serde_json::from_value(envelope.content)
                .map(ClientMessage::Challenge)
                .map_err(|source| ProtocolError::InvalidContent {
                    kind: "challenge",
                    source,
                }),
            "move" => serde_json::from_value(envelope.content)
                .map(ClientMessage::Move)
                .map_err(|source| ProtocolError::InvalidContent {
                    kind: "move",
                    source,
                }),
            _ => Err(ProtocolError::UnknownType(envelope.kind)),
        }
    }

    /// Decodes a binary frame carrying the same JSON envelope.
    pub fn decode_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let text = std::str::from_utf8(bytes).map_err(|_| ProtocolError::BinaryNotUtf8)?;
        Self::decode(text)
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Full state of one match as streamed to its occupants.
///
/// Field names match what the browser front-end reads. `Paddle1Y` is the left
/// (challenger) paddle, `Paddle2Y` the right one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    #[serde(rename = "MatchId")]
    pub match_id: u32,
    #[serde(rename = "BallX")]
    pub ball_x: f32,
    #[serde(rename = "BallY")]
    pub ball_y: f32,
    #[serde(rename = "BallVX")]
    pub ball_vx: f32,
    #[serde(rename = "BallVY")]
    pub ball_vy: f32,
    #[serde(rename = "Paddle1Y")]
    pub paddle_left_y: f32,
    #[serde(rename = "Paddle2Y")]
    pub paddle_right_y: f32,
    #[serde(rename = "PaddleWidth")]
    pub paddle_width: f32,
    #[serde(rename = "PaddleHeight")]
    pub paddle_height: f32,
    #[serde(rename = "Ended")]
    pub ended: bool,
}

/// Messages the server sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "camelCase")]
pub enum ServerMessage {
    Welcome(String),
    Players(Vec<String>),
    Start(String),
    GameState(MatchSnapshot),
    GameOver(String),
    Error(String),
}

impl ServerMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Wire name of the message, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Welcome(_) => "welcome",
            ServerMessage::Players(_) => "players",
            ServerMessage::Start(_) => "start",
            ServerMessage::GameState(_) => "gameState",
            ServerMessage::GameOver(_) => "gameOver",
            ServerMessage::Error(_) => "error",
        }
    }
}
