use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use spherolink_device::{CollisionConfig, CollisionEvent};

use crate::cmd::{connect, interrupt_flag, CollisionArgs};
use crate::exit::{reply, CliError, CliResult, SUCCESS, TRANSPORT_ERROR};
use crate::output::{print_record, OutputFormat};

const POLL: Duration = Duration::from_millis(200);

pub fn run(args: CollisionArgs, format: OutputFormat) -> CliResult<i32> {
    let running = interrupt_flag()?;

    let (tx, rx) = mpsc::channel();
    let device = connect(args.connect.builder()?.on_collision(move |event| {
        let _ = tx.send(event);
    }))?;
    let config = CollisionConfig {
        x_threshold: args.threshold,
        x_speed: args.speed,
        y_threshold: args.threshold,
        y_speed: args.speed,
        dead_time: args.dead_time,
    };
    reply(
        "configure collision detection failed",
        device.configure_collision_detection(config),
    )?;

    let mut seen = 0usize;
    let result = loop {
        if !running.load(Ordering::SeqCst) {
            break Ok(SUCCESS);
        }
        match rx.recv_timeout(POLL) {
            Ok(event) => {
                print_collision(&event, format);
                seen += 1;
                if args.count.is_some_and(|count| seen >= count) {
                    break Ok(SUCCESS);
                }
            }
            Err(RecvTimeoutError::Timeout) if device.is_connected() => {}
            Err(_) => break Err(CliError::new(TRANSPORT_ERROR, "device disconnected")),
        }
    };

    if device.is_connected() {
        let _ = device.stop_collision_detection();
    }
    device.close();
    result
}

fn print_collision(event: &CollisionEvent, format: OutputFormat) {
    let axes = match (event.x_axis(), event.y_axis()) {
        (true, true) => "x+y",
        (true, false) => "x",
        (false, true) => "y",
        (false, false) => "-",
    };
    let rows = [
        ("timestamp", format!("{}ms", event.timestamp)),
        ("axes", axes.to_string()),
        ("impact", format!("{} {} {}", event.x, event.y, event.z)),
        (
            "magnitude",
            format!("{} {}", event.x_magnitude, event.y_magnitude),
        ),
        ("speed", event.speed.to_string()),
    ];
    print_record(event, &rows, format);
}
