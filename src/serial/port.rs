//! Serial port configuration and connection management

use crate::config::{SerialSettings, DEFAULT_BAUD};
use crate::error::{Error, Result};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::Read;
use std::time::Duration;

/// Read slice handed to the driver. Blocking reads are built from these
/// slices so an interrupt is noticed between them.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for serial port connection
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Serial port path (e.g., /dev/ttyUSB0, /dev/ttyACM0)
    pub port_path: String,
    /// Baud rate (default: 115200)
    pub baud_rate: u32,
    /// Data bits (default: 8)
    pub data_bits: DataBits,
    /// Parity (default: None)
    pub parity: Parity,
    /// Stop bits (default: 1)
    pub stop_bits: StopBits,
    /// Flow control (default: None)
    pub flow_control: FlowControl,
    /// Quiet period that ends the capture (None = block indefinitely)
    pub idle_timeout: Option<Duration>,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            port_path: String::from("/dev/ttyUSB0"),
            baud_rate: DEFAULT_BAUD,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            idle_timeout: None,
        }
    }
}

impl PortConfig {
    /// Create a new configuration with default 115200 8N1 settings
    pub fn new(port_path: &str) -> Self {
        Self {
            port_path: port_path.to_string(),
            ..Default::default()
        }
    }

    /// Build a configuration from file settings for the given port
    pub fn from_settings(port_path: &str, settings: &SerialSettings) -> Result<Self> {
        Ok(Self {
            port_path: port_path.to_string(),
            baud_rate: settings.baud_rate,
            data_bits: parse_data_bits(settings.data_bits)?,
            parity: parse_parity(&settings.parity)?,
            stop_bits: parse_stop_bits(settings.stop_bits)?,
            flow_control: parse_flow_control(&settings.flow_control)?,
            idle_timeout: settings.timeout_ms.map(Duration::from_millis),
        })
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the idle timeout
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

fn parse_data_bits(bits: u8) -> Result<DataBits> {
    match bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        other => Err(Error::Config(format!("unsupported data bits: {}", other))),
    }
}

fn parse_parity(parity: &str) -> Result<Parity> {
    match parity.to_lowercase().as_str() {
        "none" => Ok(Parity::None),
        "odd" => Ok(Parity::Odd),
        "even" => Ok(Parity::Even),
        other => Err(Error::Config(format!("unsupported parity: {}", other))),
    }
}

fn parse_stop_bits(bits: u8) -> Result<StopBits> {
    match bits {
        1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        other => Err(Error::Config(format!("unsupported stop bits: {}", other))),
    }
}

fn parse_flow_control(flow: &str) -> Result<FlowControl> {
    match flow.to_lowercase().as_str() {
        "none" => Ok(FlowControl::None),
        "software" => Ok(FlowControl::Software),
        "hardware" => Ok(FlowControl::Hardware),
        other => Err(Error::Config(format!("unsupported flow control: {}", other))),
    }
}

/// Open serial connection
///
/// Reads time out every [`POLL_INTERVAL`]; the timeout surfaces as
/// `ErrorKind::TimedOut` for [`LineReader`](super::LineReader) to handle.
pub struct SerialConnection {
    port: Box<dyn SerialPort>,
    config: PortConfig,
}

impl SerialConnection {
    /// Open a serial connection with the given configuration
    pub fn open(config: PortConfig) -> Result<Self> {
        let port = serialport::new(&config.port_path, config.baud_rate)
            .data_bits(config.data_bits)
            .parity(config.parity)
            .stop_bits(config.stop_bits)
            .flow_control(config.flow_control)
            .timeout(POLL_INTERVAL)
            .open()
            .map_err(|source| Error::SerialOpen {
                port: config.port_path.clone(),
                source,
            })?;

        log::info!(
            "Opened serial port: {} at {} baud",
            config.port_path,
            config.baud_rate
        );

        Ok(Self { port, config })
    }

    /// Get the port configuration
    pub fn config(&self) -> &PortConfig {
        &self.config
    }
}

impl Read for SerialConnection {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port.read(buf)
    }
}
