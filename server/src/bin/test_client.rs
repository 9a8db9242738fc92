use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use log::{info, warn};
use pong_shared::{ClientMessage, Direction, ServerMessage};
use std::time::Duration;
use tokio::time::sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scripted client for poking at a running server", long_about = None)]
struct Args {
    /// WebSocket URL of the server
    #[arg(short, long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
    /// Display name to challenge once connected
    #[arg(short, long)]
    challenge: Option<String>,
    /// Number of alternating up/down moves to send after the match starts
    #[arg(short, long, default_value = "0")]
    moves: u32,
    /// Delay between moves in milliseconds
    #[arg(long, default_value = "50")]
    move_delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let (ws_stream, _) = connect_async(args.url.as_str()).await?;
    println!("Connected to {}", args.url);
    let (mut sink, mut stream) = ws_stream.split();

    let mut challenged = false;

    while let Some(frame) = stream.next().await {
        let text = match frame? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let message = match ServerMessage::decode(&text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Unreadable server message {}: {}", text, e);
                continue;
            }
        };

        match message {
            ServerMessage::Welcome(name) => println!("Welcome, you are '{}'", name),
            ServerMessage::Players(names) => {
                println!("Players online: {}", names.join(", "));

                if let Some(target) = args.challenge.as_ref().filter(|_| !challenged) {
                    if names.iter().any(|n| n == target) {
                        let frame = ClientMessage::Challenge(target.clone()).encode()?;
                        sink.send(Message::Text(frame)).await?;
                        challenged = true;
                        info!("Challenged {}", target);
                    }
                }
            }
            ServerMessage::Start(text) => {
                println!("{}", text);
                for i in 0..args.moves {
                    let direction = if i % 2 == 0 { Direction::Up } else { Direction::Down };
                    let frame = ClientMessage::Move(direction).encode()?;
                    sink.send(Message::Text(frame)).await?;
                    sleep(Duration::from_millis(args.move_delay_ms)).await;
                }
            }
            ServerMessage::GameState(snapshot) => println!(
                "ball ({:.1}, {:.1}) paddles {:.0}/{:.0}",
                snapshot.ball_x, snapshot.ball_y, snapshot.paddle_left_y, snapshot.paddle_right_y
            ),
            ServerMessage::GameOver(text) => {
                println!("{}", text);
                break;
            }
            ServerMessage::Error(text) => println!("Server error: {}", text),
        }
    }

    let _ = sink.close().await;
    Ok(())
}
