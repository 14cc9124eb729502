//! Print orientation and acceleration at 20 Hz for ten seconds.
//!
//! Run with:
//!   cargo run --example imu-monitor -- unix:/tmp/sphero.sock

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use spherolink::stream::{Group, StreamConfig};
use spherolink::transport::{Endpoint, SocketTransport};
use spherolink::Device;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let endpoint: Endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tcp:127.0.0.1:7000".to_string())
        .parse()?;

    let device = Device::builder(Arc::new(SocketTransport::new(endpoint)))
        .on_power(|level| eprintln!("[power] {level}"))
        .on_sensor_data(|frames| {
            for frame in frames {
                let (Some(angle), Some(acc)) = (frame.get(Group::ImuAngle), frame.get(Group::Acc))
                else {
                    continue;
                };
                println!(
                    "pitch={:+.3} roll={:+.3} yaw={:+.3} | ax={:+.3}g ay={:+.3}g az={:+.3}g",
                    angle.values[0],
                    angle.values[1],
                    angle.values[2],
                    acc.values[0],
                    acc.values[1],
                    acc.values[2],
                );
            }
        })
        .connect()?;

    device.set_power_notification(true)??;
    let config = StreamConfig::new().with(Group::ImuAngle).with(Group::Acc);
    device.set_data_stream(config, 20, 0)??;

    thread::sleep(Duration::from_secs(10));

    device.set_data_stream(StreamConfig::default(), 20, 0)??;
    device.close();
    Ok(())
}
