use crate::engine::control::{self, ControlSource, ControlToken};
use std::io::BufRead;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

/// Keyboard collaborator reading one command per line from stdin.
///
/// The first character of each line becomes a token. The source closes when
/// stdin reaches end of file. Reads block a detached OS thread, never a
/// runtime worker.
pub fn stdin_controls() -> ControlSource {
    let (tx, source) = control::channel(8);
    let spawned = std::thread::Builder::new()
        .name("lifeworks-keys".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Keyboard input failed: {}", e);
                        break;
                    }
                };
                let Some(token) = ControlToken::from_line(&line) else {
                    continue;
                };
                debug!(?token, "Key pressed");
                if tx.blocking_send(token).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        warn!("Keyboard thread unavailable, running without keys: {}", e);
    }
    source
}

/// Turn any line-oriented reader into a control source
pub fn line_controls<R>(reader: R) -> ControlSource
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (tx, source) = control::channel(8);
    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let Some(token) = ControlToken::from_line(&line) else {
                        continue;
                    };
                    debug!(?token, "Key pressed");
                    if tx.send(token).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Keyboard input failed: {}", e);
                    break;
                }
            }
        }
    });
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lines_become_tokens() {
        let input: &'static [u8] = b"p\n\n  s\nquit\nx\n";
        let mut source = line_controls(input);

        assert_eq!(source.recv().await, Some(ControlToken::Pause));
        assert_eq!(source.recv().await, Some(ControlToken::Save));
        assert_eq!(source.recv().await, Some(ControlToken::Quit));
        assert_eq!(source.recv().await, Some(ControlToken::Other('x')));
        assert_eq!(source.recv().await, None);
    }
}
