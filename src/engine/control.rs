//! Discrete control commands delivered to the dispatch loop.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// A single command from the keyboard collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlToken {
    /// Toggle pause; while paused only another `Pause` is honoured
    Pause,
    /// Emit the current snapshot without changing simulation state
    Save,
    /// Save the current snapshot and stop the run
    Quit,
    /// Any unrecognised key, ignored by the dispatcher
    Other(char),
}

impl From<char> for ControlToken {
    fn from(key: char) -> Self {
        match key {
            'p' | 'P' => Self::Pause,
            's' | 'S' => Self::Save,
            'q' | 'Q' => Self::Quit,
            other => Self::Other(other),
        }
    }
}

impl ControlToken {
    /// Parse the first non-whitespace character of a line
    pub fn from_line(line: &str) -> Option<Self> {
        line.trim().chars().next().map(Self::from)
    }
}

/// Sending half handed to whatever produces control tokens
pub type ControlSender = mpsc::Sender<ControlToken>;

/// Create a bounded control channel
pub fn channel(capacity: usize) -> (ControlSender, ControlSource) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (tx, ControlSource::new(rx))
}

/// Receiving side of the control channel.
///
/// Closure is reported once as `None`; after that the source stays pending
/// forever, so callers can keep racing it in `select!` without spinning.
pub struct ControlSource {
    rx: Option<mpsc::Receiver<ControlToken>>,
}

impl ControlSource {
    pub fn new(rx: mpsc::Receiver<ControlToken>) -> Self {
        Self { rx: Some(rx) }
    }

    /// A source that never yields a token
    pub fn disconnected() -> Self {
        Self { rx: None }
    }

    pub fn is_open(&self) -> bool {
        self.rx.is_some()
    }

    /// Wait for the next token. Returns `None` exactly once, when the
    /// channel closes.
    pub async fn recv(&mut self) -> Option<ControlToken> {
        let Some(rx) = self.rx.as_mut() else {
            return std::future::pending().await;
        };
        match rx.recv().await {
            Some(token) => Some(token),
            None => {
                debug!("Control source closed");
                self.rx = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_tokens() {
        assert_eq!(ControlToken::from('p'), ControlToken::Pause);
        assert_eq!(ControlToken::from('S'), ControlToken::Save);
        assert_eq!(ControlToken::from('q'), ControlToken::Quit);
        assert_eq!(ControlToken::from('x'), ControlToken::Other('x'));
        assert_eq!(ControlToken::from_line("  s\n"), Some(ControlToken::Save));
        assert_eq!(ControlToken::from_line("\n"), None);
    }

    #[tokio::test]
    async fn source_reports_closure_once() {
        let (tx, mut source) = channel(4);
        tx.send(ControlToken::Save).await.unwrap();
        drop(tx);

        assert_eq!(source.recv().await, Some(ControlToken::Save));
        assert!(source.is_open());
        assert_eq!(source.recv().await, None);
        assert!(!source.is_open());
        let again = tokio::time::timeout(std::time::Duration::from_millis(20), source.recv()).await;
        assert!(again.is_err());
    }

    #[tokio::test]
    async fn disconnected_source_never_yields() {
        let mut source = ControlSource::disconnected();
        assert!(!source.is_open());
        let next = tokio::time::timeout(std::time::Duration::from_millis(20), source.recv()).await;
        assert!(next.is_err());
    }
}
