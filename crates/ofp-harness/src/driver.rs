//! Async driver running one state machine over a byte stream.
//!
//! The driver owns no protocol logic. It frames whatever arrives on the
//! stream, hands each frame to [`Peer::recv_bytes`], ticks [`Peer::time`]
//! and [`Peer::poll`] on a fixed interval, and writes every outbound message
//! back to the stream. Time is read from `tokio::time`, so tests with a
//! paused clock drive timeouts without waiting.

use std::time::{Duration, Instant};

use ofp_core::{Outcome, Peer};
use ofp_proto::FrameReader;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    time::{self, MissedTickBehavior},
};
use tracing::{debug, trace, warn};

use crate::error::HarnessError;

/// Driver settings
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// How often timers are checked and collaborators polled
    pub tick: Duration,
    /// Size of a single read from the stream
    pub read_buffer: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { tick: Duration::from_millis(100), read_buffer: 4096 }
    }
}

enum Event {
    Read(std::io::Result<usize>),
    Tick,
}

fn now() -> Instant {
    time::Instant::now().into_std()
}

/// Run `peer` over `stream` until either side stops.
///
/// Returns `Ok(())` when the stream reaches end of file; the peer is shut
/// down with `fini` first. Returns the recorded [`ConnectionError`] when the
/// peer fails, leaving the peer in its failed state for inspection. A
/// framing error fails the peer and is returned as is.
///
/// [`ConnectionError`]: ofp_core::ConnectionError
pub async fn run<S, P>(stream: &mut S, peer: &mut P, config: &DriverConfig) -> Result<(), HarnessError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    P: Peer,
{
    let mut reader = FrameReader::with_capacity(config.read_buffer);
    let mut buf = vec![0u8; config.read_buffer.max(1)];
    let mut ticker = time::interval(config.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    let outcome = peer.init(now());
    write(stream, peer, outcome).await?;

    loop {
        let event = tokio::select! {
            read = stream.read(&mut buf) => Event::Read(read),
            _ = ticker.tick() => Event::Tick,
        };

        match event {
            Event::Read(read) => {
                let n = read?;
                if n == 0 {
                    debug!(state = %peer.state(), "stream closed by peer");
                    // the far side is gone; anything queued at shutdown is dropped
                    let _ = peer.fini(now());
                    return Ok(());
                }
                trace!(n, "read from stream");
                reader.extend(&buf[..n]);
                loop {
                    let frame = match reader.read_frame() {
                        Ok(Some(frame)) => frame,
                        Ok(None) => break,
                        Err(err) => {
                            warn!(%err, "framing error");
                            reader.clear();
                            // an empty block never decodes, so the peer fails
                            let _ = peer.recv_bytes(now(), &[]);
                            return Err(err.into());
                        },
                    };
                    let outcome = peer.recv_bytes(now(), &frame);
                    write(stream, peer, outcome).await?;
                }
            },
            Event::Tick => {
                let outcome = peer.time(now());
                write(stream, peer, outcome).await?;
                let outcome = peer.poll(now());
                write(stream, peer, outcome).await?;
            },
        }
    }
}

/// Write everything in `outcome`, then stop if the peer asked to
async fn write<S, P>(stream: &mut S, peer: &P, outcome: Outcome) -> Result<(), HarnessError>
where
    S: AsyncWrite + Unpin,
    P: Peer,
{
    for bytes in outcome.encode()? {
        stream.write_all(&bytes).await?;
    }
    if !outcome.messages.is_empty() {
        stream.flush().await?;
    }
    if outcome.proceed {
        return Ok(());
    }
    match peer.failure() {
        Some(err) => {
            warn!(%err, "driver stopping");
            Err(HarnessError::Connection(err.clone()))
        },
        None => Err(HarnessError::Closed),
    }
}

#[cfg(test)]
mod tests {
    use ofp_core::{ConnectionConfig, State, Switch};
    use ofp_proto::{Body, Message, MessageType};
    use tokio::io::duplex;

    use super::*;
    use crate::recording::RecordingAgent;

    async fn read_message<S: AsyncRead + Unpin>(stream: &mut S, reader: &mut FrameReader) -> Message {
        let mut buf = [0u8; 1024];
        loop {
            if let Some(message) = reader.read_message().unwrap() {
                return message;
            }
            let n = stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "stream closed early");
            reader.extend(&buf[..n]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn switch_answers_features_then_stops_on_eof() {
        let (mut near, mut far) = duplex(4096);
        let mut switch = Switch::new(RecordingAgent::new(7), ConnectionConfig::default()).unwrap();

        let controller = async move {
            let request = Message::with_xid(11, Body::FeaturesRequest).to_bytes().unwrap();
            far.write_all(&request).await.unwrap();
            let mut reader = FrameReader::new();
            let reply = read_message(&mut far, &mut reader).await;
            drop(far);
            reply
        };

        let config = DriverConfig::default();
        let (result, reply) = tokio::join!(run(&mut near, &mut switch, &config), controller);
        result.unwrap();
        assert_eq!(reply.message_type(), MessageType::FeaturesReply);
        assert_eq!(reply.xid(), 11);
        assert_eq!(switch.state(), State::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_peer_times_out() {
        let (mut near, _far) = duplex(4096);
        let mut switch = Switch::new(RecordingAgent::default(), ConnectionConfig::default()).unwrap();

        let err = run(&mut near, &mut switch, &DriverConfig::default()).await.unwrap_err();
        assert!(err.is_timeout(), "{err}");
        assert_eq!(switch.state(), State::Failed);
    }
}
