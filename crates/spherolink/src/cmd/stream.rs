use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use spherolink_stream::StreamConfig;
use tracing::{info, warn};

use crate::cmd::{connect, interrupt_flag, StreamArgs};
use crate::exit::{reply, CliError, CliResult, SUCCESS, TRANSPORT_ERROR};
use crate::output::{print_frames, OutputFormat};

const POLL: Duration = Duration::from_millis(200);

pub fn run(args: StreamArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.groups.iter().fold(
        StreamConfig::new()
            .with_frame_count(args.frames)
            .with_convert(!args.raw),
        |config, group| config.with(*group),
    );
    let running = interrupt_flag()?;

    let (tx, rx) = mpsc::channel();
    let device = connect(args.connect.builder()?.on_sensor_data(move |frames| {
        let _ = tx.send(frames);
    }))?;
    reply(
        "set data stream failed",
        device.set_data_stream(config, args.rate, 0),
    )?;
    info!(groups = ?config.active_groups(), rate = args.rate, "streaming");

    let mut packets = 0usize;
    let result = loop {
        if !running.load(Ordering::SeqCst) {
            break Ok(SUCCESS);
        }
        match rx.recv_timeout(POLL) {
            Ok(frames) => {
                print_frames(&frames, format);
                packets += 1;
                if args.count.is_some_and(|count| packets >= count) {
                    break Ok(SUCCESS);
                }
            }
            Err(RecvTimeoutError::Timeout) if device.is_connected() => {}
            Err(_) => {
                break Err(CliError::new(TRANSPORT_ERROR, "device disconnected"));
            }
        }
    };

    if device.is_connected() {
        let stop = device.set_data_stream(StreamConfig::default(), args.rate, 0);
        if !matches!(stop, Ok(Ok(()))) {
            warn!("could not stop the data stream");
        }
    }
    device.close();
    result
}
