//! Local console producer.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;

use crate::{ControlTask, Line, Origin, TaskSender};

/// Spawns a task that posts every line of `reader` until end of stream.
///
/// The binary passes `tokio::io::stdin()`; tests pass an in-memory buffer.
/// The task also ends once the queue's receiver is gone.
pub fn spawn_console<R>(reader: R, tx: TaskSender) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(text)) => {
                    if tx.send(ControlTask::Line(Line::new(Origin::Console, text))).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    tracing::debug!("console input closed");
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "console read failed");
                    break;
                }
            }
        }
    })
}
