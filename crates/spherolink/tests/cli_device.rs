#![cfg(all(unix, feature = "cli"))]

use std::io::{Read, Write};
use std::os::unix::net::UnixListener;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::thread::{self, JoinHandle};

use bytes::BytesMut;
use spherolink::frame::{decode_envelope, encode_acknowledgment, encode_async, Envelope};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/sphlcli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn ack(status: u8, sequence: u8, payload: &[u8]) -> Vec<u8> {
    let mut wire = BytesMut::new();
    encode_acknowledgment(status, sequence, payload, &mut wire).expect("ack should encode");
    wire.to_vec()
}

fn notify(event: u8, payload: &[u8]) -> Vec<u8> {
    let mut wire = BytesMut::new();
    encode_async(event, payload, &mut wire).expect("async message should encode");
    wire.to_vec()
}

/// A socket bridge with a scripted robot behind it. Serves one connection.
struct Bridge {
    dir: PathBuf,
    endpoint: String,
    handle: JoinHandle<Vec<Envelope>>,
}

impl Bridge {
    fn start<F>(tag: &str, mut respond: F) -> Self
    where
        F: FnMut(&Envelope) -> Vec<u8> + Send + 'static,
    {
        let dir = unique_temp_dir(tag);
        let path = dir.join("bridge.sock");
        let listener = UnixListener::bind(&path).expect("bridge should bind");

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("bridge should accept");
            let mut buf = BytesMut::new();
            let mut seen = Vec::new();
            loop {
                while let Some(command) = decode_envelope(&mut buf).expect("valid envelope") {
                    let reply = respond(&command);
                    if !reply.is_empty() {
                        stream.write_all(&reply).expect("bridge write should succeed");
                    }
                    seen.push(command);
                }
                let mut chunk = [0u8; 256];
                match stream.read(&mut chunk) {
                    Ok(0) | Err(_) => return seen,
                    Ok(n) => buf.extend_from_slice(&chunk[..n]),
                }
            }
        });

        Self {
            endpoint: format!("unix:{}", path.display()),
            dir,
            handle,
        }
    }

    fn finish(self) -> Vec<Envelope> {
        let seen = self.handle.join().expect("bridge thread should finish");
        let _ = std::fs::remove_dir_all(&self.dir);
        seen
    }
}

fn answer_everything(command: &Envelope) -> Vec<u8> {
    if command.needs_response {
        ack(0x00, command.sequence, b"")
    } else {
        Vec::new()
    }
}

fn spherolink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_spherolink"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("spherolink should run")
}

#[test]
fn ping_reports_latency_as_json() {
    let bridge = Bridge::start("ping", answer_everything);

    let output = spherolink(&["--format", "json", "ping", "-e", &bridge.endpoint, "-n", "2"]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("ping should emit json");
    assert_eq!(payload["count"], 2);
    assert_eq!(payload["latency_ms"].as_array().map(Vec::len), Some(2));

    let seen = bridge.finish();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|command| command.command_id == 0x01));
}

#[test]
fn power_reports_battery_state() {
    let bridge = Bridge::start("power", |command| {
        ack(
            0x00,
            command.sequence,
            &[0x01, 0x02, 0x02, 0xD5, 0x00, 0x2A, 0x01, 0x2C],
        )
    });

    let output = spherolink(&["--format", "json", "power", "-e", &bridge.endpoint]);

    assert!(output.status.success());
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("power should emit json");
    assert_eq!(payload["level"], "ok");
    assert_eq!(payload["battery_centivolts"], 725);
    assert_eq!(payload["charge_count"], 42);
    bridge.finish();
}

#[test]
fn stream_prints_decoded_frames() {
    let bridge = Bridge::start("stream", |command| {
        let mut reply = ack(0x00, command.sequence, b"");
        let streaming = command.payload[4..8].iter().any(|byte| *byte != 0);
        if command.command_id == 0x11 && streaming {
            let mut values = Vec::new();
            for value in [10i16, -20, 90] {
                values.extend_from_slice(&value.to_be_bytes());
            }
            reply.extend(notify(0x03, &values));
        }
        reply
    });

    let output = spherolink(&[
        "--format",
        "json",
        "stream",
        "-e",
        &bridge.endpoint,
        "--groups",
        "imu_angle",
        "--raw",
        "--count",
        "1",
    ]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let line = String::from_utf8_lossy(&output.stdout);
    let frame: serde_json::Value =
        serde_json::from_str(line.trim()).expect("frame should be json");
    assert_eq!(frame["imu_angle"]["pitch"], 10.0);
    assert_eq!(frame["imu_angle"]["yaw"], 90.0);

    let seen = bridge.finish();
    let stream_commands = seen.iter().filter(|command| command.command_id == 0x11).count();
    assert_eq!(stream_commands, 2, "stream is configured and then disabled");
}

#[test]
fn device_rejection_exits_1() {
    let bridge = Bridge::start("reject", |command| ack(0x04, command.sequence, b""));

    let output = spherolink(&["heading", "90", "-e", &bridge.endpoint, "--attempts", "2"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("set heading failed"));
    assert_eq!(bridge.finish().len(), 2);
}

#[test]
fn silent_device_exits_124() {
    let bridge = Bridge::start("silent", |_| Vec::new());

    let output = spherolink(&[
        "ping",
        "-e",
        &bridge.endpoint,
        "--timeout",
        "50ms",
        "--attempts",
        "1",
    ]);

    assert_eq!(output.status.code(), Some(124));
    bridge.finish();
}

#[test]
fn out_of_range_heading_exits_64() {
    let bridge = Bridge::start("usage", answer_everything);

    let output = spherolink(&["heading", "400", "-e", &bridge.endpoint]);

    assert_eq!(output.status.code(), Some(64));
    assert!(bridge.finish().is_empty());
}

#[test]
fn missing_bridge_exits_3() {
    let dir = unique_temp_dir("missing");
    let endpoint = format!("unix:{}", dir.join("absent.sock").display());

    let output = spherolink(&["power", "-e", &endpoint, "--attempts", "1"]);

    assert_eq!(output.status.code(), Some(3));
    let _ = std::fs::remove_dir_all(&dir);
}
