//! Writing replay events to an output sink.

use common::protocol::ReplayChunkEvent;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Write each event's bytes to `out` in order.
///
/// With `realtime` set, sleeps for each event's recorded duration after
/// writing it, reproducing the original session timing. Output is flushed
/// before every sleep so the terminal shows what has been played so far.
pub async fn play<W>(events: &[ReplayChunkEvent], out: &mut W, realtime: bool) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for event in events {
        out.write_all(&event.data).await?;
        if realtime && !event.duration.is_zero() {
            out.flush().await?;
            tokio::time::sleep(event.duration).await;
        }
    }
    out.flush().await
}
