/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

use crate::common::ActorRuntime;
use crate::io::{
    AcceptHandle, AcceptorClosed, BrokerError, ConnectionBackend, ConnectionHandle,
    ConnectionSink, ReceivePolicy,
};
use crate::message::{send_anonymous, Address, Priority};
use crate::payload;

#[derive(Debug)]
enum Outbound {
    Bytes(Vec<u8>),
    Close,
}

/// A TCP connection driven by a reader task and a writer task.
#[derive(Debug)]
pub struct TcpConnection {
    sink: ConnectionSink,
    outbound: mpsc::UnboundedSender<Outbound>,
    peer: Option<SocketAddr>,
    cancellation: CancellationToken,
}

impl TcpConnection {
    /// Starts driving `stream`.
    ///
    /// With an `announce` target, that broker is told about the connection
    /// with a `NewConnection` from the given acceptor. Otherwise received bytes
    /// are buffered until a broker takes the connection over.
    #[instrument(skip(stream, runtime))]
    pub(crate) fn spawn(
        stream: TcpStream,
        announce: Option<(Address, AcceptHandle)>,
        runtime: &ActorRuntime,
    ) -> Arc<Self> {
        let limits = &runtime.config().limits;
        let peer = stream.peer_addr().ok();
        let (reader, writer) = stream.into_split();
        let (outbound, queue) = mpsc::unbounded_channel();
        let connection = Arc::new(Self {
            sink: ConnectionSink::new(
                ConnectionHandle::next(),
                ReceivePolicy::at_most(limits.read_chunk_size),
                limits.max_frame_size,
            ),
            outbound,
            peer,
            cancellation: runtime.cancellation_token().child_token(),
        });
        if let Some((owner, source)) = announce {
            let link: Arc<dyn ConnectionBackend> = connection.clone();
            if !connection.sink.announce(owner, source, link) {
                debug!("acceptor owner is gone, dropping connection");
                connection.cancellation.cancel();
            }
        }
        trace!(connection = %connection.sink.handle(), ?peer, "connection started");
        tokio::spawn(write_loop(writer, queue, connection.cancellation.clone()));
        tokio::spawn(read_loop(reader, connection.clone(), limits.read_chunk_size));
        connection
    }

    /// The remote address, if it was known when the connection started.
    #[must_use]
    pub const fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }
}

impl ConnectionBackend for TcpConnection {
    fn sink(&self) -> &ConnectionSink {
        &self.sink
    }

    fn transmit(&self, bytes: Vec<u8>) -> Result<(), BrokerError> {
        self.outbound
            .send(Outbound::Bytes(bytes))
            .map_err(|_| BrokerError::ConnectionClosed(self.sink.handle()))
    }

    fn close(&self) {
        if self.outbound.send(Outbound::Close).is_err() {
            self.cancellation.cancel();
        }
    }
}

async fn read_loop(mut reader: OwnedReadHalf, connection: Arc<TcpConnection>, chunk_size: usize) {
    let mut chunk = vec![0_u8; chunk_size.max(1)];
    loop {
        tokio::select! {
            () = connection.cancellation.cancelled() => break,
            () = connection.sink.wait_for_room() => {}
        }
        let read = tokio::select! {
            () = connection.cancellation.cancelled() => break,
            read = reader.read(&mut chunk) => read,
        };
        match read {
            Ok(0) => {
                trace!(connection = %connection.sink.handle(), "peer closed the connection");
                break;
            }
            Ok(n) => {
                if !connection.sink.ingest(&chunk[..n]) {
                    break;
                }
            }
            Err(error) => {
                debug!(connection = %connection.sink.handle(), %error, "read failed");
                break;
            }
        }
    }
    connection.cancellation.cancel();
    connection.sink.closed();
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut queue: mpsc::UnboundedReceiver<Outbound>,
    cancellation: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            () = cancellation.cancelled() => None,
            next = queue.recv() => next,
        };
        match next {
            Some(Outbound::Bytes(bytes)) => {
                if let Err(error) = writer.write_all(&bytes).await {
                    debug!(%error, "write failed");
                    break;
                }
            }
            Some(Outbound::Close) | None => break,
        }
    }
    if let Err(error) = writer.shutdown().await {
        trace!(%error, "shutdown of write half failed");
    }
    cancellation.cancel();
}

/// Binds a listener for a broker. Must run inside a Tokio runtime.
pub(crate) fn bind(host: &str, port: u16) -> Result<(TcpListener, u16), BrokerError> {
    let listener = std::net::TcpListener::bind((host, port))?;
    listener.set_nonblocking(true)?;
    let port = listener.local_addr()?.port();
    Ok((TcpListener::from_std(listener)?, port))
}

/// Accepts connections on `listener` and announces each to `owner` until
/// `cancellation` fires or accepting fails. Ends with an [`AcceptorClosed`].
pub(crate) fn spawn_doorman(
    listener: TcpListener,
    handle: AcceptHandle,
    owner: Address,
    cancellation: CancellationToken,
    runtime: ActorRuntime,
) {
    tokio::spawn(async move {
        loop {
            let accepted = tokio::select! {
                () = cancellation.cancelled() => break,
                accepted = listener.accept() => accepted,
            };
            match accepted {
                Ok((stream, peer)) => {
                    trace!(acceptor = %handle, %peer, "accepted connection");
                    TcpConnection::spawn(stream, Some((owner.clone(), handle)), &runtime);
                }
                Err(error) => {
                    warn!(acceptor = %handle, %error, "accept failed");
                    break;
                }
            }
        }
        debug!(acceptor = %handle, "acceptor closed");
        send_anonymous(&owner, Priority::Normal, payload!(AcceptorClosed { handle }));
    });
}
