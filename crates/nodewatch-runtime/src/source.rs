//! Hex line broadcast source
//!
//! Stands in for the radio observer: each non-empty line is one payload
//! written as hex (`e502052e09e8172c01`). Lines starting with `#` are
//! comments.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::BroadcastSender;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub lines: u64,
    pub forwarded: u64,
    pub invalid_hex: u64,
}

/// Feed every payload line of `reader` into the intake queue
pub async fn feed_hex_lines<R>(reader: R, sender: &BroadcastSender) -> std::io::Result<SourceStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = SourceStats::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        stats.lines += 1;

        let payload = match hex::decode(line) {
            Ok(payload) => payload,
            Err(e) => {
                stats.invalid_hex += 1;
                tracing::warn!(line = stats.lines, error = %e, "skipping line that is not hex");
                continue;
            }
        };

        if !sender.send(&payload).await {
            break;
        }
        stats.forwarded += 1;
    }

    Ok(stats)
}
