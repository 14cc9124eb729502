//! Drive a square, changing color at each corner.
//!
//! Run with:
//!   cargo run --example square-dance -- tcp:127.0.0.1:7000

use std::thread;
use std::time::Duration;

use spherolink::device::Color;
use spherolink::transport::Endpoint;
use spherolink::Device;

const CORNERS: [(u16, Color); 4] = [
    (0, Color::new(255, 0, 0)),
    (90, Color::new(0, 255, 0)),
    (180, Color::new(0, 0, 255)),
    (270, Color::new(255, 255, 0)),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let endpoint: Endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tcp:127.0.0.1:7000".to_string())
        .parse()?;

    let device = Device::connect(endpoint)?;
    device.ping()??;
    device.set_back_light(255)??;

    for (heading, color) in CORNERS {
        device.set_color(color, false)??;
        device.roll(80, heading, false)?;
        thread::sleep(Duration::from_millis(1500));
        device.stop()?;
        thread::sleep(Duration::from_millis(500));
    }

    device.set_back_light(0)??;
    device.close();
    Ok(())
}
