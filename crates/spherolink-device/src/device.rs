//! The connected robot: lifecycle plus the typed command surface.

use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::{BufMut, Bytes, BytesMut};
use spherolink_frame::{AsyncMessage, Envelope, Failure, Response};
use spherolink_stream::{DecodedFrame, StreamConfig, StreamDecoder};
use spherolink_transport::{Endpoint, SocketTransport, Transport, TransportReader};
use tracing::{debug, info, warn};

use crate::commands::{core_commands, sphero_commands, DEVICE_CORE, DEVICE_SPHERO};
use crate::config::DeviceConfig;
use crate::correlator::Correlator;
use crate::dispatcher;
use crate::error::{DeviceError, Result};
use crate::events::{
    parse_power_notification, require, BluetoothInfo, CollisionEvent, Color, PacketTimes,
    PowerLevel, PowerState, Versioning, VoltageTripPoints, EVENT_COLLISION, EVENT_L1_DIAGNOSTIC,
    EVENT_POWER, EVENT_SENSOR_DATA,
};
use crate::invoker::Invoker;
use crate::options::{CollisionConfig, MotorValue, PermanentOptions};
use crate::pool::Backpressure;
use crate::router::{EventRouter, EventRouterBuilder};
use crate::sync::{lock, read, write};

/// Outcome of a command whose transport round trip worked.
///
/// `Err` carries the device status, timeout or disconnect that prevented a
/// reply. Transport and parse problems surface one level up as [`DeviceError`].
pub type Reply<T> = std::result::Result<T, Failure>;

/// Longest name accepted by set-device-name.
pub const MAX_NAME_LEN: usize = 48;
/// Shortest inactivity timeout the firmware accepts, in seconds.
pub const MIN_INACTIVITY_TIMEOUT_SECS: u16 = 60;
/// Headings are whole degrees.
pub const MAX_HEADING: u16 = 359;
/// Degrees per second per raw rotation-rate unit.
pub const ROTATION_RATE_UNIT: f64 = 0.784;

const LOW_TRIP_RANGE: std::ops::RangeInclusive<u16> = 675..=725;
const CRITICAL_TRIP_RANGE: std::ops::RangeInclusive<u16> = 625..=675;
const MIN_TRIP_SEPARATION: u16 = 25;

const ROLL_GO: u8 = 0x01;
const ROLL_FAST_ROTATE: u8 = 0x02;
const COLLISION_OFF: u8 = 0x00;
const COLLISION_ON: u8 = 0x01;
const STOP_ON_DISCONNECT: u32 = 1 << 0;

/// Collects configuration and async callbacks, then connects.
pub struct DeviceBuilder {
    transport: Arc<dyn Transport>,
    config: DeviceConfig,
    handlers: EventRouterBuilder,
    correlator: Arc<Correlator>,
    decoder: Arc<RwLock<StreamDecoder>>,
}

impl DeviceBuilder {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            config: DeviceConfig::default(),
            handlers: EventRouterBuilder::new(),
            correlator: Arc::new(Correlator::new()),
            decoder: Arc::new(RwLock::new(StreamDecoder::new(StreamConfig::default()))),
        }
    }

    pub fn config(mut self, config: DeviceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_response_timeout(timeout);
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config = self.config.with_max_attempts(attempts);
        self
    }

    /// Size the pool that runs async callbacks.
    pub fn handler_pool(
        mut self,
        workers: usize,
        queue_depth: usize,
        backpressure: Backpressure,
    ) -> Self {
        self.config.handler_workers = workers;
        self.config.handler_queue_depth = queue_depth;
        self.config.backpressure = backpressure;
        self
    }

    /// Called with each battery level notification.
    pub fn on_power(mut self, callback: impl Fn(PowerLevel) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on(EVENT_POWER, move |message: AsyncMessage| {
            match parse_power_notification(&message.payload) {
                Ok(level) => callback(level),
                Err(err) => warn!(error = %err, "discarding power notification"),
            }
        });
        self
    }

    /// Called with the frames of each sensor data packet, decoded under the
    /// stream configuration most recently sent with
    /// [`Device::set_data_stream`].
    pub fn on_sensor_data(
        mut self,
        callback: impl Fn(Vec<DecodedFrame>) + Send + Sync + 'static,
    ) -> Self {
        let decoder = Arc::clone(&self.decoder);
        self.handlers = self.handlers.on(EVENT_SENSOR_DATA, move |message: AsyncMessage| {
            let decoded = read(&decoder).decode(&message.payload);
            match decoded {
                Ok(frames) => callback(frames),
                Err(err) => warn!(error = %err, "discarding sensor data packet"),
            }
        });
        self
    }

    /// Called with each collision notification.
    pub fn on_collision(mut self, callback: impl Fn(CollisionEvent) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on(EVENT_COLLISION, move |message: AsyncMessage| {
            match CollisionEvent::parse(&message.payload) {
                Ok(event) => callback(event),
                Err(err) => warn!(error = %err, "discarding collision notification"),
            }
        });
        self
    }

    /// Raw handler for any other event code.
    ///
    /// The diagnostic forward code is reserved; a handler registered for it
    /// is replaced at connect time.
    pub fn on_event(
        mut self,
        code: u8,
        handler: impl Fn(AsyncMessage) + Send + Sync + 'static,
    ) -> Self {
        self.handlers = self.handlers.on(code, handler);
        self
    }

    /// Open the transport, start the receive loop and return the device.
    ///
    /// The transport connect is attempted up to `max_attempts` times.
    pub fn connect(self) -> Result<Device> {
        let Self {
            transport,
            config,
            handlers,
            correlator,
            decoder,
        } = self;

        open(transport.as_ref(), config.max_attempts)?;

        let diagnostic = Arc::clone(&correlator);
        let router = handlers
            .on_shared(
                EVENT_L1_DIAGNOSTIC,
                Arc::new(move |message: AsyncMessage| {
                    if !diagnostic.complete_diagnostic(Response::Success(message.payload)) {
                        debug!("diagnostic dump arrived with nobody waiting");
                    }
                }),
            )
            .pool(
                config.handler_workers,
                config.handler_queue_depth,
                config.backpressure,
            )
            .build()
            .inspect_err(|_| transport.close())?;
        let router = Arc::new(router);

        let receiver = dispatcher::spawn(
            TransportReader::new(Arc::clone(&transport)),
            Arc::clone(&correlator),
            Arc::clone(&router),
        )
        .inspect_err(|_| {
            transport.close();
            router.shutdown();
        })?;

        let invoker = Invoker::new(
            Arc::clone(&transport),
            Arc::clone(&correlator),
            config.response_timeout,
        );
        info!(transport = transport.transport_name(), "device connected");

        Ok(Device {
            transport,
            correlator,
            invoker,
            router,
            decoder,
            receiver: Mutex::new(Some(receiver)),
            config,
        })
    }
}

fn open(transport: &dyn Transport, attempts: u32) -> Result<()> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match transport.connect() {
            Ok(()) => return Ok(()),
            Err(err) if attempt < attempts => {
                warn!(attempt, attempts, error = %err, "connect failed, retrying");
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// A connected robot.
///
/// Commands may be issued from any number of threads. Each blocks only its
/// caller while waiting for the acknowledgment.
pub struct Device {
    transport: Arc<dyn Transport>,
    correlator: Arc<Correlator>,
    invoker: Invoker,
    router: Arc<EventRouter>,
    decoder: Arc<RwLock<StreamDecoder>>,
    receiver: Mutex<Option<JoinHandle<()>>>,
    config: DeviceConfig,
}

impl Device {
    pub fn builder(transport: Arc<dyn Transport>) -> DeviceBuilder {
        DeviceBuilder::new(transport)
    }

    /// Connect to a socket bridge with default settings and no callbacks.
    pub fn connect(endpoint: Endpoint) -> Result<Self> {
        DeviceBuilder::new(Arc::new(SocketTransport::new(endpoint))).connect()
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Whether the transport is open and the receive loop is running.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected() && !self.correlator.is_closed()
    }

    /// Stream layout currently used to decode sensor data.
    pub fn stream_config(&self) -> StreamConfig {
        *read(&self.decoder).config()
    }

    /// Close the transport, stop the receive loop and drain pending callbacks.
    ///
    /// Outstanding requests complete with [`Failure::Disconnected`]. Closing
    /// twice has no effect.
    pub fn close(&self) {
        self.transport.close();
        if let Some(receiver) = lock(&self.receiver).take() {
            if receiver.thread().id() != thread::current().id() && receiver.join().is_err() {
                warn!("receive loop panicked");
            }
        }
        self.router.shutdown();
    }

    /// Send a raw command once.
    pub fn send(
        &self,
        device_id: u8,
        command_id: u8,
        payload: impl Into<Bytes>,
        expect_response: bool,
    ) -> Result<Response> {
        self.invoker.send(device_id, command_id, payload, expect_response)
    }

    /// Send a raw command, retrying up to the configured attempt count.
    pub fn send_with_retry(
        &self,
        device_id: u8,
        command_id: u8,
        payload: impl Into<Bytes>,
        expect_response: bool,
    ) -> Result<Response> {
        self.invoker.send_with_retry(
            device_id,
            command_id,
            payload,
            expect_response,
            self.config.max_attempts,
        )
    }

    fn request(&self, device_id: u8, command_id: u8, payload: impl Into<Bytes>) -> Result<Reply<Bytes>> {
        Ok(self
            .send_with_retry(device_id, command_id, payload, true)?
            .into_result())
    }

    fn command(&self, device_id: u8, command_id: u8, payload: impl Into<Bytes>) -> Result<Reply<()>> {
        Ok(self.request(device_id, command_id, payload)?.map(drop))
    }

    fn query<T>(
        &self,
        device_id: u8,
        command_id: u8,
        parse: impl FnOnce(&[u8]) -> Result<T>,
    ) -> Result<Reply<T>> {
        match self.request(device_id, command_id, Bytes::new())? {
            Ok(data) => parse(&data).map(Ok),
            Err(failure) => Ok(Err(failure)),
        }
    }

    fn fire(&self, device_id: u8, command_id: u8, payload: impl Into<Bytes>) -> Result<()> {
        self.invoker.send(device_id, command_id, payload, false)?;
        Ok(())
    }

    // Core device

    pub fn ping(&self) -> Result<Reply<()>> {
        self.command(DEVICE_CORE, core_commands::PING, Bytes::new())
    }

    pub fn get_versioning(&self) -> Result<Reply<Versioning>> {
        self.query(DEVICE_CORE, core_commands::GET_VERSIONING, Versioning::parse)
    }

    /// Set the advertised name, at most [`MAX_NAME_LEN`] bytes of UTF-8.
    pub fn set_device_name(&self, name: &str) -> Result<Reply<()>> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(DeviceError::InvalidArgument(format!(
                "name must be 1..={MAX_NAME_LEN} bytes, got {}",
                name.len()
            )));
        }
        self.command(
            DEVICE_CORE,
            core_commands::SET_NAME,
            Bytes::copy_from_slice(name.as_bytes()),
        )
    }

    pub fn get_bluetooth_info(&self) -> Result<Reply<BluetoothInfo>> {
        self.query(DEVICE_CORE, core_commands::GET_BLUETOOTH_INFO, BluetoothInfo::parse)
    }

    pub fn get_power_state(&self) -> Result<Reply<PowerState>> {
        self.query(DEVICE_CORE, core_commands::GET_POWER_STATE, PowerState::parse)
    }

    /// Enable or disable async power notifications.
    pub fn set_power_notification(&self, enabled: bool) -> Result<Reply<()>> {
        self.command(
            DEVICE_CORE,
            core_commands::SET_POWER_NOTIFICATION,
            vec![u8::from(enabled)],
        )
    }

    /// Put the robot to sleep, waking after `wakeup_secs` (0 sleeps until
    /// woken by hand). The link drops, so no reply is awaited.
    pub fn sleep(&self, wakeup_secs: u16) -> Result<()> {
        let mut payload = BytesMut::with_capacity(5);
        payload.put_u16(wakeup_secs);
        // Macro id and orbBasic start line: none.
        payload.put_u8(0);
        payload.put_u16(0);
        self.fire(DEVICE_CORE, core_commands::SLEEP, payload.freeze())
    }

    pub fn get_voltage_trip_points(&self) -> Result<Reply<VoltageTripPoints>> {
        self.query(DEVICE_CORE, core_commands::GET_VOLTAGE_TRIP, VoltageTripPoints::parse)
    }

    /// Set the low and critical battery thresholds, in hundredths of a volt.
    pub fn set_voltage_trip_points(&self, points: VoltageTripPoints) -> Result<Reply<()>> {
        validate_trip_points(points)?;
        let mut payload = BytesMut::with_capacity(VoltageTripPoints::SIZE);
        payload.put_u16(points.low);
        payload.put_u16(points.critical);
        self.command(DEVICE_CORE, core_commands::SET_VOLTAGE_TRIP, payload.freeze())
    }

    /// Seconds of inactivity before the robot sleeps.
    pub fn set_inactivity_timeout(&self, secs: u16) -> Result<Reply<()>> {
        if secs < MIN_INACTIVITY_TIMEOUT_SECS {
            return Err(DeviceError::InvalidArgument(format!(
                "inactivity timeout must be at least {MIN_INACTIVITY_TIMEOUT_SECS}s, got {secs}"
            )));
        }
        self.command(
            DEVICE_CORE,
            core_commands::SET_INACTIVITY_TIMEOUT,
            Bytes::copy_from_slice(&secs.to_be_bytes()),
        )
    }

    /// Request the level-1 diagnostic dump.
    ///
    /// The device acknowledges nothing; the text arrives as an async message
    /// and is awaited for [`DeviceConfig::diagnostic_timeout`].
    pub fn l1_diagnostic(&self) -> Result<Reply<String>> {
        let pending = self.correlator.reserve_diagnostic()?;
        let envelope = Envelope::new(DEVICE_CORE, core_commands::L1_DIAGNOSTIC, Bytes::new());
        let response =
            self.invoker
                .send_and_await(&envelope, pending, self.config.diagnostic_timeout)?;
        Ok(response
            .into_result()
            .map(|dump| String::from_utf8_lossy(&dump).into_owned()))
    }

    /// Estimate clock offset and round-trip delay to the device.
    pub fn poll_packet_times(&self) -> Result<Reply<PacketTimes>> {
        let sent = wall_clock_ms();
        let reply = self.request(
            DEVICE_CORE,
            core_commands::POLL_PACKET_TIMES,
            Bytes::copy_from_slice(&sent.to_be_bytes()),
        )?;
        let received = wall_clock_ms();
        match reply {
            Ok(data) => PacketTimes::parse(&data, sent, received).map(Ok),
            Err(failure) => Ok(Err(failure)),
        }
    }

    // Sphero device

    /// Redefine the current orientation as `degrees`.
    pub fn set_heading(&self, degrees: u16) -> Result<Reply<()>> {
        validate_heading(degrees)?;
        self.command(
            DEVICE_SPHERO,
            sphero_commands::SET_HEADING,
            Bytes::copy_from_slice(&degrees.to_be_bytes()),
        )
    }

    pub fn set_stabilization(&self, enabled: bool) -> Result<Reply<()>> {
        self.command(
            DEVICE_SPHERO,
            sphero_commands::SET_STABILIZATION,
            vec![u8::from(enabled)],
        )
    }

    /// Rotation rate used to reach new headings, in degrees per second.
    pub fn set_rotation_rate(&self, degrees_per_sec: f64) -> Result<Reply<()>> {
        let raw = rotation_rate_raw(degrees_per_sec)?;
        self.command(DEVICE_SPHERO, sphero_commands::SET_ROTATION_RATE, vec![raw])
    }

    pub fn get_chassis_id(&self) -> Result<Reply<u16>> {
        self.query(DEVICE_SPHERO, sphero_commands::GET_CHASSIS_ID, |data| {
            require("chassis id", data, 2)?;
            Ok(u16::from_be_bytes([data[0], data[1]]))
        })
    }

    /// Configure sensor streaming.
    ///
    /// The decoder switches to `config` before the command is sent, so the
    /// first packets under the new layout decode correctly. `packet_count` 0
    /// streams until reconfigured.
    pub fn set_data_stream(
        &self,
        config: StreamConfig,
        sample_rate_hz: u16,
        packet_count: u8,
    ) -> Result<Reply<()>> {
        let payload = config.command_payload(sample_rate_hz, packet_count)?;
        debug!(
            groups = ?config.active_groups(),
            sample_rate_hz,
            packet_count,
            "configuring data stream"
        );
        *write(&self.decoder) = StreamDecoder::new(config);
        self.command(DEVICE_SPHERO, sphero_commands::SET_DATA_STREAM, payload)
    }

    /// Set the main LED. With `persist` the color also becomes the default
    /// shown on connect.
    pub fn set_color(&self, color: Color, persist: bool) -> Result<Reply<()>> {
        self.command(
            DEVICE_SPHERO,
            sphero_commands::SET_COLOR,
            vec![color.red, color.green, color.blue, u8::from(persist)],
        )
    }

    /// The persisted default color, not necessarily the one showing.
    pub fn get_color(&self) -> Result<Reply<Color>> {
        self.query(DEVICE_SPHERO, sphero_commands::GET_COLOR, Color::parse)
    }

    pub fn set_back_light(&self, brightness: u8) -> Result<Reply<()>> {
        self.command(DEVICE_SPHERO, sphero_commands::SET_BACK_LIGHT, vec![brightness])
    }

    /// Drive at `speed` toward `heading`. No reply is awaited.
    pub fn roll(&self, speed: u8, heading: u16, fast_rotate: bool) -> Result<()> {
        validate_heading(heading)?;
        let [heading_hi, heading_lo] = heading.to_be_bytes();
        let state = if fast_rotate { ROLL_FAST_ROTATE } else { ROLL_GO };
        self.fire(
            DEVICE_SPHERO,
            sphero_commands::ROLL,
            vec![speed, heading_hi, heading_lo, state],
        )
    }

    pub fn stop(&self) -> Result<()> {
        self.fire(DEVICE_SPHERO, sphero_commands::ROLL, vec![0, 0, 0, 0])
    }

    pub fn boost(&self, enabled: bool) -> Result<Reply<()>> {
        self.command(DEVICE_SPHERO, sphero_commands::BOOST, vec![u8::from(enabled)])
    }

    /// Drive each motor directly, bypassing stabilization. No reply is awaited.
    pub fn set_raw_motor_values(&self, left: MotorValue, right: MotorValue) -> Result<()> {
        self.fire(
            DEVICE_SPHERO,
            sphero_commands::SET_RAW_MOTORS,
            vec![left.mode as u8, left.power, right.mode as u8, right.power],
        )
    }

    /// Milliseconds before the last motion command expires. Only honored with
    /// [`PermanentOptions::MOTION_TIMEOUT`] set.
    pub fn set_motion_timeout(&self, millis: u16) -> Result<Reply<()>> {
        self.command(
            DEVICE_SPHERO,
            sphero_commands::SET_MOTION_TIMEOUT,
            Bytes::copy_from_slice(&millis.to_be_bytes()),
        )
    }

    pub fn set_permanent_options(&self, options: PermanentOptions) -> Result<Reply<()>> {
        self.command(
            DEVICE_SPHERO,
            sphero_commands::SET_PERMANENT_OPTIONS,
            Bytes::copy_from_slice(&options.bits().to_be_bytes()),
        )
    }

    pub fn get_permanent_options(&self) -> Result<Reply<PermanentOptions>> {
        self.query(DEVICE_SPHERO, sphero_commands::GET_PERMANENT_OPTIONS, |data| {
            require("permanent options", data, 8)?;
            let mut bits = [0u8; 8];
            bits.copy_from_slice(&data[..8]);
            Ok(PermanentOptions::from_bits_retain(u64::from_be_bytes(bits)))
        })
    }

    /// Stop the motors when the link drops. Cleared on every reconnect.
    pub fn set_stop_on_disconnect(&self, enabled: bool) -> Result<Reply<()>> {
        let flags = if enabled { STOP_ON_DISCONNECT } else { 0 };
        self.command(
            DEVICE_SPHERO,
            sphero_commands::SET_TEMPORARY_OPTIONS,
            Bytes::copy_from_slice(&flags.to_be_bytes()),
        )
    }

    pub fn will_stop_on_disconnect(&self) -> Result<Reply<bool>> {
        self.query(DEVICE_SPHERO, sphero_commands::GET_TEMPORARY_OPTIONS, |data| {
            require("temporary options", data, 4)?;
            let flags = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
            Ok(flags & STOP_ON_DISCONNECT != 0)
        })
    }

    /// Arm the collision detector with explicit thresholds.
    pub fn configure_collision_detection(&self, config: CollisionConfig) -> Result<Reply<()>> {
        self.command(
            DEVICE_SPHERO,
            sphero_commands::CONFIGURE_COLLISION,
            vec![
                COLLISION_ON,
                config.x_threshold,
                config.x_speed,
                config.y_threshold,
                config.y_speed,
                config.dead_time,
            ],
        )
    }

    /// Arm the collision detector with default thresholds.
    pub fn start_collision_detection(&self) -> Result<Reply<()>> {
        self.configure_collision_detection(CollisionConfig::default())
    }

    pub fn stop_collision_detection(&self) -> Result<Reply<()>> {
        self.command(
            DEVICE_SPHERO,
            sphero_commands::CONFIGURE_COLLISION,
            vec![COLLISION_OFF, 0, 0, 0, 0, 0],
        )
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("transport", &self.transport.transport_name())
            .field("connected", &self.is_connected())
            .field("outstanding", &self.correlator.outstanding())
            .field("router", &self.router)
            .finish()
    }
}

fn validate_heading(degrees: u16) -> Result<()> {
    if degrees > MAX_HEADING {
        return Err(DeviceError::InvalidArgument(format!(
            "heading must be 0..={MAX_HEADING}, got {degrees}"
        )));
    }
    Ok(())
}

fn rotation_rate_raw(degrees_per_sec: f64) -> Result<u8> {
    if !degrees_per_sec.is_finite() || degrees_per_sec < 0.0 {
        return Err(DeviceError::InvalidArgument(format!(
            "rotation rate must be a non-negative number, got {degrees_per_sec}"
        )));
    }
    let raw = (degrees_per_sec / ROTATION_RATE_UNIT).round();
    Ok(raw.min(f64::from(u8::MAX)) as u8)
}

fn validate_trip_points(points: VoltageTripPoints) -> Result<()> {
    if !LOW_TRIP_RANGE.contains(&points.low) {
        return Err(DeviceError::InvalidArgument(format!(
            "low trip point must be {}..={}, got {}",
            LOW_TRIP_RANGE.start(),
            LOW_TRIP_RANGE.end(),
            points.low
        )));
    }
    if !CRITICAL_TRIP_RANGE.contains(&points.critical) {
        return Err(DeviceError::InvalidArgument(format!(
            "critical trip point must be {}..={}, got {}",
            CRITICAL_TRIP_RANGE.start(),
            CRITICAL_TRIP_RANGE.end(),
            points.critical
        )));
    }
    if points.low < points.critical + MIN_TRIP_SEPARATION {
        return Err(DeviceError::InvalidArgument(format!(
            "trip points must be at least {MIN_TRIP_SEPARATION} apart, got {} and {}",
            points.low, points.critical
        )));
    }
    Ok(())
}

/// Host wall clock in milliseconds, truncated to the 32 bits the device echoes.
fn wall_clock_ms() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u32)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_range() {
        assert!(validate_heading(0).is_ok());
        assert!(validate_heading(359).is_ok());
        assert!(matches!(
            validate_heading(360),
            Err(DeviceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rotation_rate_scales_and_saturates() {
        assert_eq!(rotation_rate_raw(0.0).unwrap(), 0);
        assert_eq!(rotation_rate_raw(78.4).unwrap(), 100);
        assert_eq!(rotation_rate_raw(199.92).unwrap(), 255);
        assert_eq!(rotation_rate_raw(400.0).unwrap(), 255);
        assert!(rotation_rate_raw(-1.0).is_err());
        assert!(rotation_rate_raw(f64::NAN).is_err());
    }

    #[test]
    fn trip_point_limits() {
        let ok = VoltageTripPoints {
            low: 700,
            critical: 650,
        };
        assert!(validate_trip_points(ok).is_ok());

        let low_out_of_range = VoltageTripPoints { low: 730, ..ok };
        assert!(validate_trip_points(low_out_of_range).is_err());

        let critical_out_of_range = VoltageTripPoints { critical: 620, ..ok };
        assert!(validate_trip_points(critical_out_of_range).is_err());

        let too_close = VoltageTripPoints {
            low: 680,
            critical: 670,
        };
        assert!(validate_trip_points(too_close).is_err());

        let boundary = VoltageTripPoints {
            low: 700,
            critical: 675,
        };
        assert!(validate_trip_points(boundary).is_ok());
    }
}
