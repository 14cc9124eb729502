use std::io::Read;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use spherolink_frame::{Failure, FrameError, Packet, PacketReader, Response};
use tracing::{debug, error, info, warn};

use crate::correlator::Correlator;
use crate::error::{DeviceError, Result};
use crate::router::EventRouter;

/// Name of the receive thread.
pub const THREAD_NAME: &str = "spherolink-rx";

/// Start the receive loop on its own thread.
pub fn spawn<R>(
    reader: R,
    correlator: Arc<Correlator>,
    router: Arc<EventRouter>,
) -> Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || run(PacketReader::new(reader), &correlator, &router))
        .map_err(DeviceError::Spawn)
}

/// Read packets until the stream ends, routing each one.
///
/// Acknowledgments complete their waiter; async messages go to the router.
/// Corrupt packets are skipped. On exit every outstanding request is failed
/// with [`Failure::Disconnected`].
pub fn run<R: Read>(mut reader: PacketReader<R>, correlator: &Correlator, router: &EventRouter) {
    info!("receive loop started");
    loop {
        match reader.read_packet() {
            Ok(Packet::Acknowledgment(ack)) => {
                let sequence = ack.sequence;
                let status = ack.status;
                if !correlator.complete(sequence, ack.into_response()) {
                    debug!(sequence, %status, "late or unsolicited acknowledgment");
                }
            }
            Ok(Packet::Async(message)) => {
                router.dispatch(message);
            }
            Err(FrameError::UnsupportedLength { sequence }) => {
                warn!(sequence, "reply length unsupported, failing request");
                correlator.complete(sequence, Response::Failure(Failure::UnsupportedLength));
            }
            Err(err) if err.is_recoverable() => {
                warn!(error = %err, "dropping malformed packet");
            }
            Err(FrameError::ConnectionClosed) => {
                info!("device closed the connection");
                break;
            }
            Err(err) => {
                error!(error = %err, "receive loop failed");
                break;
            }
        }
    }

    correlator.fail_all(Failure::Disconnected);
    info!("receive loop stopped");
}
