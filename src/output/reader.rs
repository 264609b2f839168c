// src/output/reader.rs

//! Stream pumps: one spawned task per redirected stream.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::output::queue::OutputQueue;
use crate::types::TextEncoding;

/// Spawn a task that reads `stream` line by line into `queue`.
///
/// Lines are split on `\n`, a trailing `\r` is removed, and the bytes are
/// decoded with `encoding`. Empty lines are kept. A final line without a
/// terminator is still delivered. The task ends at EOF, on a read error, or
/// when the queue has been disposed.
pub fn spawn_reader<R>(stream: R, encoding: TextEncoding, queue: Arc<OutputQueue>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let kind = queue.stream();
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = encoding.decode(trim_line_ending(&buf));
                    trace!(stream = %kind, "{line}");
                    if !queue.push(line) {
                        debug!(stream = %kind, "output queue disposed; reader stopping");
                        return;
                    }
                }
                Err(e) => {
                    debug!(stream = %kind, error = %e, "read error; reader stopping");
                    break;
                }
            }
        }

        debug!(stream = %kind, "reader reached end of stream");
    })
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::queue::OutputQueues;

    #[tokio::test]
    async fn keeps_empty_lines_and_unterminated_tail() {
        let queues = OutputQueues::new();
        let input: &[u8] = b"first\r\n\nlast";

        spawn_reader(input, TextEncoding::Utf8, Arc::clone(&queues.stdout))
            .await
            .unwrap();

        assert_eq!(
            queues.stdout.drain(),
            vec!["first".to_string(), String::new(), "last".to_string()]
        );
    }

    #[tokio::test]
    async fn decodes_with_configured_encoding() {
        let queues = OutputQueues::new();
        let input: &[u8] = &[b'o', b'k', 0xE9, b'\n'];

        spawn_reader(input, TextEncoding::Latin1, Arc::clone(&queues.stderr))
            .await
            .unwrap();

        assert_eq!(queues.stderr.drain(), vec!["oké".to_string()]);
    }

    #[tokio::test]
    async fn stops_after_disposal() {
        let queues = OutputQueues::new();
        queues.dispose();
        let input: &[u8] = b"a\nb\n";

        spawn_reader(input, TextEncoding::Utf8, Arc::clone(&queues.stdout))
            .await
            .unwrap();

        assert!(queues.stdout.is_empty());
    }
}
