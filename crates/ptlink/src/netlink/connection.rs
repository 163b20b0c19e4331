//! Request/reply and dump exchanges over a netlink transport.
//!
//! [`Connection`] owns the channel and the sequence counter. Exchanges take
//! `&self` but run one at a time: an internal async mutex is held from
//! transmit until the last frame of the exchange has been consumed.
//!
//! A dump that stops early (callback break, timeout, dropped future) leaves
//! frames queued on the socket. They are read and discarded before the next
//! exchange starts. If that fails the session is marked desynchronized and
//! every later call returns [`Error::Desynchronized`].

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};

use super::builder::MessageBuilder;
use super::demux::{FrameIter, FrameKind};
use super::error::{Error, Result};
use super::message::{NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST, NLMSG_HDRLEN};
use super::socket::{DEFAULT_RECV_BUF, NetlinkSocket, Transport};

/// Default bound on every wait of an exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    timeout: Duration,
    recv_buf_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            recv_buf_size: DEFAULT_RECV_BUF,
        }
    }
}

impl ConnectionConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound on each send and receive wait.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Size of the buffer each datagram is read into.
    pub fn recv_buf_size(mut self, size: usize) -> Self {
        self.recv_buf_size = size;
        self
    }

    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }

    pub fn get_recv_buf_size(&self) -> usize {
        self.recv_buf_size
    }
}

/// Summary of a completed dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpOutcome {
    /// Data messages handed to the callback.
    pub messages: usize,
    /// The kernel flagged the dump as inconsistent (`NLM_F_DUMP_INTR`);
    /// the table changed while it was being walked.
    pub inconsistent: bool,
}

enum Reply {
    Data(Vec<u8>),
    Ack,
}

/// State guarded by the exchange lock.
#[derive(Debug, Default)]
struct Session {
    /// Sequence of a dump whose remaining frames are still queued.
    abandoned: Option<u32>,
    /// Frames were lost; the channel can no longer be trusted.
    desynchronized: bool,
}

/// How far a dump got before it returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DumpState {
    /// The terminator has not been seen.
    Open,
    /// DONE or an error frame ended the dump, or nothing was sent.
    Finished,
    /// The channel failed underneath the dump.
    Lost,
}

/// Holds the exchange lock for a dump and records the dump as abandoned
/// if the future is dropped before it finishes.
struct DumpGuard<'a> {
    session: MutexGuard<'a, Session>,
    seq: u32,
    state: DumpState,
}

impl Drop for DumpGuard<'_> {
    fn drop(&mut self) {
        match self.state {
            DumpState::Open => self.session.abandoned = Some(self.seq),
            DumpState::Lost => self.session.desynchronized = true,
            DumpState::Finished => {}
        }
    }
}

/// Netlink session over a [`Transport`].
pub struct Connection<T: Transport = NetlinkSocket> {
    transport: T,
    seq: AtomicU32,
    exchange: Mutex<Session>,
    config: ConnectionConfig,
}

impl Connection<NetlinkSocket> {
    /// Open a Generic Netlink socket with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(ConnectionConfig::default())
    }

    /// Open a Generic Netlink socket with the given configuration.
    pub fn with_config(config: ConnectionConfig) -> Result<Self> {
        let socket = NetlinkSocket::with_recv_buf(config.recv_buf_size)?;
        Ok(Self::from_transport(socket, config))
    }
}

impl<T: Transport> Connection<T> {
    /// Wrap an existing transport.
    pub fn from_transport(transport: T, config: ConnectionConfig) -> Self {
        Self {
            transport,
            seq: AtomicU32::new(1),
            exchange: Mutex::new(Session::default()),
            config,
        }
    }

    /// Get the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Check whether an abandoned dump could not be drained.
    ///
    /// A desynchronized connection refuses every exchange; open a new one.
    pub async fn is_desynchronized(&self) -> bool {
        self.exchange.lock().await.desynchronized
    }

    /// Take the exchange lock, first discarding what an abandoned dump left
    /// on the socket.
    async fn begin(&self) -> Result<MutexGuard<'_, Session>> {
        let mut session = self.exchange.lock().await;
        if session.desynchronized {
            return Err(Error::Desynchronized);
        }
        if let Some(seq) = session.abandoned {
            if !self.drain(seq).await {
                session.desynchronized = true;
                return Err(Error::Desynchronized);
            }
            session.abandoned = None;
        }
        Ok(session)
    }

    fn stamp(&self, mut builder: MessageBuilder) -> (u32, Vec<u8>) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        builder.add_flags(NLM_F_REQUEST);
        builder.set_seq(seq);
        builder.set_pid(self.transport.pid());
        (seq, builder.finish())
    }

    async fn bounded<F, R>(&self, fut: F) -> Result<R>
    where
        F: Future<Output = Result<R>>,
    {
        tokio::time::timeout(self.config.timeout, fut)
            .await
            .map_err(|_| Error::Timeout(self.config.timeout))?
    }

    async fn send(&self, msg: &[u8]) -> Result<()> {
        self.bounded(self.transport.send(msg)).await
    }

    async fn recv(&self) -> Result<Vec<u8>> {
        let data = self.bounded(self.transport.recv()).await?;
        if data.is_empty() {
            return Err(Error::Truncated {
                expected: NLMSG_HDRLEN,
                actual: 0,
            });
        }
        Ok(data)
    }

    /// Transmit a message without waiting for anything.
    ///
    /// Returns the sequence number the message was sent with.
    pub async fn send_only(&self, builder: MessageBuilder) -> Result<u32> {
        let _session = self.begin().await?;
        let (seq, msg) = self.stamp(builder);
        tracing::debug!(seq, len = msg.len(), "send");
        self.send(&msg).await?;
        Ok(seq)
    }

    /// Send a request and wait for its single reply.
    ///
    /// Returns the reply payload (everything after the netlink header).
    pub async fn request(&self, builder: MessageBuilder) -> Result<Vec<u8>> {
        match self.exchange_one(builder).await? {
            Reply::Data(payload) => Ok(payload),
            Reply::Ack => Err(Error::InvalidMessage(
                "expected a reply, got an acknowledgement".into(),
            )),
        }
    }

    /// Send a request with `NLM_F_ACK` and wait for the acknowledgement.
    pub async fn request_ack(&self, mut builder: MessageBuilder) -> Result<()> {
        builder.add_flags(NLM_F_ACK);
        match self.exchange_one(builder).await? {
            Reply::Ack => Ok(()),
            Reply::Data(_) => Err(Error::InvalidMessage(
                "expected an acknowledgement, got a data reply".into(),
            )),
        }
    }

    async fn exchange_one(&self, builder: MessageBuilder) -> Result<Reply> {
        let _session = self.begin().await?;
        let expected = builder.msg_type();
        let (seq, msg) = self.stamp(builder);
        tracing::debug!(seq, msg_type = expected, "request");

        self.send(&msg).await?;
        loop {
            let data = self.recv().await?;
            for frame in FrameIter::new(&data) {
                let frame = frame?;
                if frame.seq() != seq {
                    tracing::debug!(seq = frame.seq(), want = seq, "skipping stale message");
                    continue;
                }
                match frame.kind {
                    FrameKind::Data(payload) => {
                        if frame.msg_type() != expected {
                            return Err(Error::ForeignMessage {
                                expected,
                                actual: frame.msg_type(),
                            });
                        }
                        return Ok(Reply::Data(payload.to_vec()));
                    }
                    FrameKind::Ack => return Ok(Reply::Ack),
                    FrameKind::Error(err) => return Err(err.into_error()),
                    FrameKind::Done => {
                        return Err(Error::InvalidMessage(
                            "unexpected end of dump in reply".into(),
                        ));
                    }
                    FrameKind::Noop => {}
                }
            }
        }
    }

    /// Run a dump, handing each data payload to `on_message`.
    ///
    /// Messages of another family on the dump's sequence are skipped. If
    /// `on_message` breaks or fails, or a wait times out, the rest of the
    /// dump is read and discarded before returning, and the dump fails with
    /// [`Error::Interrupted`], the callback's error or [`Error::Timeout`].
    /// If the future is dropped instead, the discarding happens at the start
    /// of the next exchange.
    pub async fn dump<F>(&self, mut builder: MessageBuilder, mut on_message: F) -> Result<DumpOutcome>
    where
        F: FnMut(&[u8]) -> Result<ControlFlow<()>> + Send,
    {
        let session = self.begin().await?;
        builder.add_flags(NLM_F_DUMP);
        let family = builder.msg_type();
        let (seq, msg) = self.stamp(builder);
        tracing::debug!(seq, msg_type = family, "dump");

        let mut guard = DumpGuard {
            session,
            seq,
            state: DumpState::Open,
        };
        let mut outcome = DumpOutcome::default();
        let result = self
            .dump_frames(&msg, seq, family, &mut on_message, &mut outcome, &mut guard.state)
            .await;

        if guard.state == DumpState::Open {
            guard.state = if self.drain(seq).await {
                DumpState::Finished
            } else {
                DumpState::Lost
            };
        }

        result?;
        tracing::debug!(seq, messages = outcome.messages, "dump complete");
        if outcome.inconsistent {
            tracing::warn!(seq, "dump was interrupted by a concurrent change");
        }
        Ok(outcome)
    }

    async fn dump_frames<F>(
        &self,
        msg: &[u8],
        seq: u32,
        family: u16,
        on_message: &mut F,
        outcome: &mut DumpOutcome,
        state: &mut DumpState,
    ) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<ControlFlow<()>> + Send,
    {
        if let Err(e) = self.send(msg).await {
            *state = DumpState::Finished;
            return Err(e);
        }

        loop {
            let data = match self.recv().await {
                Ok(d) => d,
                // A late kernel may still deliver the rest; drain it.
                Err(e @ Error::Timeout(_)) => return Err(e),
                Err(e) => {
                    *state = DumpState::Lost;
                    return Err(e);
                }
            };

            // A stop request still scans the rest of this datagram, which
            // may already hold the terminator.
            let mut stop: Option<Error> = None;
            for frame in FrameIter::new(&data) {
                let frame = match frame {
                    Ok(f) => f,
                    Err(e) => {
                        stop.get_or_insert(e);
                        break;
                    }
                };
                if frame.seq() != seq {
                    tracing::debug!(seq = frame.seq(), want = seq, "skipping stale message");
                    continue;
                }
                if frame.header.is_dump_interrupted() {
                    outcome.inconsistent = true;
                }
                match frame.kind {
                    FrameKind::Data(_) if stop.is_some() => {}
                    FrameKind::Data(payload) => {
                        if frame.msg_type() != family {
                            tracing::warn!(
                                msg_type = frame.msg_type(),
                                family,
                                "skipping message of another family"
                            );
                            continue;
                        }
                        outcome.messages += 1;
                        match on_message(payload) {
                            Ok(ControlFlow::Continue(())) => {}
                            Ok(ControlFlow::Break(())) => stop = Some(Error::Interrupted),
                            Err(e) => stop = Some(e),
                        }
                    }
                    FrameKind::Done => {
                        *state = DumpState::Finished;
                        return stop.map_or(Ok(()), Err);
                    }
                    FrameKind::Error(err) => {
                        *state = DumpState::Finished;
                        return Err(stop.unwrap_or_else(|| err.into_error()));
                    }
                    FrameKind::Ack | FrameKind::Noop => {}
                }
            }
            if let Some(e) = stop {
                return Err(e);
            }
        }
    }

    /// Consume the remaining frames of an abandoned dump.
    ///
    /// Returns false when the terminator never arrived.
    async fn drain(&self, seq: u32) -> bool {
        match self.drain_frames(seq).await {
            Ok(skipped) => {
                tracing::debug!(seq, skipped, "drained abandoned dump");
                true
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "could not drain abandoned dump");
                false
            }
        }
    }

    async fn drain_frames(&self, seq: u32) -> Result<usize> {
        let mut skipped = 0;
        loop {
            let data = self.recv().await?;
            for frame in FrameIter::new(&data) {
                let Ok(frame) = frame else { break };
                if frame.seq() != seq {
                    continue;
                }
                match frame.kind {
                    FrameKind::Done | FrameKind::Error(_) => return Ok(skipped),
                    _ => skipped += 1,
                }
            }
        }
    }
}
