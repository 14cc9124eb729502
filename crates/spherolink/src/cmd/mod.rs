use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use spherolink_device::{Color, Device, DeviceBuilder, DeviceConfig};
use spherolink_stream::Group;
use spherolink_transport::{Endpoint, SocketTransport};

use crate::exit::{device_error, CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod collision;
pub mod color;
pub mod diagnostic;
pub mod drive;
pub mod info;
pub mod options;
pub mod ping;
pub mod power;
pub mod stream;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the link and measure round-trip latency.
    Ping(PingArgs),
    /// Show battery state.
    Power(ConnectArgs),
    /// Show firmware versions and radio identity.
    Info(ConnectArgs),
    /// Roll at a speed and heading, then stop.
    Roll(RollArgs),
    /// Redefine the current orientation as the given heading.
    Heading(HeadingArgs),
    /// Show or set the main LED color.
    Color(ColorArgs),
    /// Stream sensor groups until interrupted.
    Stream(StreamArgs),
    /// Print collision notifications until interrupted.
    Collision(CollisionArgs),
    /// Show or change permanent options.
    Options(OptionsArgs),
    /// Dump level-1 diagnostics.
    Diagnostic(ConnectArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ping(args) => ping::run(args, format),
        Command::Power(args) => power::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Roll(args) => drive::roll(args),
        Command::Heading(args) => drive::heading(args),
        Command::Color(args) => color::run(args, format),
        Command::Stream(args) => stream::run(args, format),
        Command::Collision(args) => collision::run(args, format),
        Command::Options(args) => options::run(args, format),
        Command::Diagnostic(args) => diagnostic::run(args),
        Command::Version(args) => version::run(args),
    }
}

/// How to reach the robot.
#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
    /// Socket bridge endpoint: tcp:HOST:PORT or unix:PATH.
    #[arg(long, short = 'e', env = "SPHEROLINK_ENDPOINT")]
    pub endpoint: Endpoint,
    /// Reply window per attempt (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub timeout: String,
    /// Attempts per command and per connect.
    #[arg(long, default_value_t = 5)]
    pub attempts: u32,
}

impl ConnectArgs {
    pub fn config(&self) -> CliResult<DeviceConfig> {
        Ok(DeviceConfig::default()
            .with_response_timeout(parse_duration(&self.timeout)?)
            .with_max_attempts(self.attempts))
    }

    pub fn builder(&self) -> CliResult<DeviceBuilder> {
        let transport = Arc::new(SocketTransport::new(self.endpoint.clone()));
        Ok(Device::builder(transport).config(self.config()?))
    }

    pub fn connect(&self) -> CliResult<Device> {
        connect(self.builder()?)
    }
}

pub fn connect(builder: DeviceBuilder) -> CliResult<Device> {
    builder
        .connect()
        .map_err(|err| device_error("connect failed", err))
}

/// Flag cleared by Ctrl-C, for commands that watch until interrupted.
pub fn interrupt_flag() -> CliResult<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, std::sync::atomic::Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;
    Ok(running)
}

#[derive(Args, Debug)]
pub struct PingArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Number of pings to send.
    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: u32,
}

#[derive(Args, Debug)]
pub struct RollArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Speed, 0-255.
    pub speed: u8,
    /// Heading in degrees, 0-359.
    pub heading: u16,
    /// How long to roll before stopping (e.g. 2s, 750ms).
    #[arg(long, default_value = "1s")]
    pub duration: String,
    /// Turn in place at full rate before driving.
    #[arg(long)]
    pub fast_rotate: bool,
}

#[derive(Args, Debug)]
pub struct HeadingArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Heading in degrees, 0-359.
    pub degrees: u16,
}

#[derive(Args, Debug)]
pub struct ColorArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// New color as RRGGBB. Without it the stored default is shown.
    pub color: Option<Color>,
    /// Store the color as the power-on default.
    #[arg(long, requires = "color")]
    pub persist: bool,
}

#[derive(Args, Debug)]
pub struct StreamArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Sensor groups to stream (comma-separated), e.g. imu_angle,acc.
    #[arg(long, short = 'g', value_delimiter = ',', required = true)]
    pub groups: Vec<Group>,
    /// Samples per second, 1-400.
    #[arg(long, default_value_t = 10)]
    pub rate: u16,
    /// Samples per packet.
    #[arg(long, default_value_t = 1)]
    pub frames: u16,
    /// Print raw sensor counts instead of physical units.
    #[arg(long)]
    pub raw: bool,
    /// Exit after this many packets.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct CollisionArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Impact threshold on both axes.
    #[arg(long, default_value_t = 100)]
    pub threshold: u8,
    /// Speed-dependent threshold boost on both axes.
    #[arg(long, default_value_t = 100)]
    pub speed: u8,
    /// Quiet period after a hit, in 10 ms units.
    #[arg(long, default_value_t = 10)]
    pub dead_time: u8,
    /// Exit after this many collisions.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct OptionsArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Flags to set (comma-separated), e.g. vector_drive,tail_always_on.
    #[arg(long, value_delimiter = ',')]
    pub enable: Vec<String>,
    /// Flags to clear (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub disable: Vec<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
