//! Ping a robot from tokio and print every packet it sends back.
//!
//! Run with:
//!   cargo run --example async-packet-tap --features async -- 127.0.0.1:7000

use bytes::BytesMut;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::FramedRead;

use spherolink::device::commands::{core_commands, DEVICE_CORE};
use spherolink::frame::{encode_envelope, Envelope, Packet, PacketCodec};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:7000".to_string());

    let stream = TcpStream::connect(&addr).await?;
    let (read_half, mut write_half) = stream.into_split();

    let mut wire = BytesMut::new();
    for sequence in 1..=3u8 {
        let ping = Envelope::new(DEVICE_CORE, core_commands::PING, Vec::new())
            .expecting_response(sequence);
        encode_envelope(&ping, &mut wire)?;
    }
    write_half.write_all(&wire).await?;

    let mut packets = FramedRead::new(read_half, PacketCodec::new());
    while let Some(packet) = packets.next().await {
        match packet? {
            Packet::Acknowledgment(ack) => {
                println!("[ack] seq={} status={:?} len={}", ack.sequence, ack.status, ack.payload.len());
            }
            Packet::Async(message) => {
                println!("[async] event={:#04x} len={}", message.event, message.payload.len());
            }
        }
    }
    Ok(())
}
