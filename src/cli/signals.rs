//! Recording controls from OS signals and the keyboard

use std::io::BufRead;

use colored::Colorize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::debug;

/// What the user asked the running session to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    TogglePause,
    /// Stop and save (`s`, `q`, SIGINT, SIGTERM)
    Stop,
    /// Stop and throw the recording away (`c`)
    Cancel,
}

impl ControlSignal {
    /// Map one line typed on stdin
    pub fn from_input(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "p" | "pause" | "r" | "resume" => Some(Self::TogglePause),
            "s" | "stop" | "q" | "quit" => Some(Self::Stop),
            "c" | "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// Merges SIGINT, SIGTERM and stdin commands into one stream
pub struct ControlHandler {
    receiver: mpsc::Receiver<ControlSignal>,
}

impl ControlHandler {
    /// Start listening. Must be called inside the runtime.
    pub fn new() -> Result<Self, std::io::Error> {
        let (tx, rx) = mpsc::channel(10);

        let tx_int = tx.clone();
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            while sigint.recv().await.is_some() {
                eprintln!();
                eprintln!("{} Received SIGINT (stopping)", "↓".cyan());
                if tx_int.send(ControlSignal::Stop).await.is_err() {
                    break;
                }
            }
        });

        let tx_term = tx.clone();
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::spawn(async move {
            if sigterm.recv().await.is_some() {
                let _ = tx_term.send(ControlSignal::Stop).await;
            }
        });

        // tokio's stdin would keep the runtime alive on exit; a detached
        // thread does not
        std::thread::Builder::new()
            .name("stdin-controls".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    if let Some(control) = ControlSignal::from_input(&line) {
                        debug!("Keyboard control: {:?}", control);
                        if tx.blocking_send(control).is_err() {
                            break;
                        }
                    }
                }
            })?;

        Ok(Self { receiver: rx })
    }

    /// Wait for the next control
    pub async fn recv(&mut self) -> Option<ControlSignal> {
        self.receiver.recv().await
    }
}
