use std::time::Instant;

use serde::Serialize;

use crate::cmd::PingArgs;
use crate::exit::{reply, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct PingOutput {
    endpoint: String,
    count: u32,
    latency_ms: Vec<f64>,
    average_ms: f64,
}

pub fn run(args: PingArgs, format: OutputFormat) -> CliResult<i32> {
    let device = args.connect.connect()?;

    let mut latency_ms = Vec::with_capacity(args.count as usize);
    for _ in 0..args.count.max(1) {
        let start = Instant::now();
        reply("ping failed", device.ping())?;
        latency_ms.push(round_ms(start.elapsed().as_secs_f64() * 1000.0));
    }
    device.close();

    let average_ms = round_ms(latency_ms.iter().sum::<f64>() / latency_ms.len() as f64);
    let out = PingOutput {
        endpoint: args.connect.endpoint.to_string(),
        count: latency_ms.len() as u32,
        latency_ms,
        average_ms,
    };
    let rows = [
        ("endpoint", out.endpoint.clone()),
        ("pings", out.count.to_string()),
        ("average", format!("{:.2}ms", out.average_ms)),
    ];
    print_record(&out, &rows, format);
    Ok(SUCCESS)
}

fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}
