//! Host-side lookup of Heartlink boards
//!
//! The bridge enumerates as a USB serial port whose manufacturer string
//! names Arduino. Boards are told apart by their USB serial number.

use serialport::{SerialPortInfo, SerialPortType};
use thiserror::Error;
use tracing::debug;

/// Manufacturer substring identifying a bridge board (case-insensitive)
pub const ARDUINO_MANUFACTURER: &str = "arduino";

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("no serial port found for serial number '{0}'")]
    NotFound(String),

    #[error("{count} serial ports found for serial number '{serial}'")]
    Multiple { serial: String, count: usize },

    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(#[from] serialport::Error),
}

/// A USB serial port and the identity strings it reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbSerialPort {
    /// Device path, e.g. `/dev/ttyACM0`
    pub device: String,
    pub manufacturer: Option<String>,
    pub serial_number: Option<String>,
}

impl UsbSerialPort {
    /// Extract the USB identity of a port, or `None` for non-USB ports
    pub fn from_info(info: &SerialPortInfo) -> Option<Self> {
        match &info.port_type {
            SerialPortType::UsbPort(usb) => Some(Self {
                device: info.port_name.clone(),
                manufacturer: usb.manufacturer.clone(),
                serial_number: usb.serial_number.clone(),
            }),
            _ => None,
        }
    }

    /// Check if the manufacturer string names Arduino
    pub fn is_arduino(&self) -> bool {
        self.manufacturer
            .as_deref()
            .map(|m| m.to_ascii_lowercase().contains(ARDUINO_MANUFACTURER))
            .unwrap_or(false)
    }
}

/// All USB serial ports currently attached
pub fn usb_ports() -> Result<Vec<UsbSerialPort>, LocateError> {
    let ports: Vec<_> = serialport::available_ports()?
        .iter()
        .filter_map(UsbSerialPort::from_info)
        .collect();
    debug!("{} USB serial port(s) attached", ports.len());
    Ok(ports)
}

/// Ports made by Arduino, in enumeration order
pub fn arduino_ports(ports: &[UsbSerialPort]) -> Vec<&UsbSerialPort> {
    ports.iter().filter(|p| p.is_arduino()).collect()
}

/// The single port reporting `serial`
///
/// Any USB serial port is considered, not only Arduino ones, so boards
/// with a rewritten manufacturer string can still be addressed directly.
pub fn find_by_serial<'a>(
    ports: &'a [UsbSerialPort],
    serial: &str,
) -> Result<&'a UsbSerialPort, LocateError> {
    let mut matching = ports
        .iter()
        .filter(|p| p.serial_number.as_deref() == Some(serial));

    match (matching.next(), matching.count()) {
        (None, _) => Err(LocateError::NotFound(serial.to_string())),
        (Some(port), 0) => Ok(port),
        (Some(_), rest) => Err(LocateError::Multiple {
            serial: serial.to_string(),
            count: rest + 1,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(device: &str, manufacturer: Option<&str>, serial: Option<&str>) -> UsbSerialPort {
        UsbSerialPort {
            device: device.to_string(),
            manufacturer: manufacturer.map(str::to_string),
            serial_number: serial.map(str::to_string),
        }
    }

    #[test]
    fn test_is_arduino_case_insensitive() {
        assert!(port("/dev/ttyACM0", Some("Arduino (www.arduino.cc)"), None).is_arduino());
        assert!(port("/dev/ttyACM0", Some("ARDUINO LLC"), None).is_arduino());
        assert!(!port("/dev/ttyUSB0", Some("FTDI"), None).is_arduino());
        assert!(!port("/dev/ttyUSB0", None, None).is_arduino());
    }

    #[test]
    fn test_arduino_ports_filters() {
        let ports = [
            port("/dev/ttyACM0", Some("Arduino"), Some("A1")),
            port("/dev/ttyUSB0", Some("Silicon Labs"), Some("B2")),
            port("/dev/ttyACM1", Some("arduino.cc"), Some("C3")),
        ];
        let found: Vec<_> = arduino_ports(&ports).iter().map(|p| p.device.as_str()).collect();
        assert_eq!(found, ["/dev/ttyACM0", "/dev/ttyACM1"]);
    }

    #[test]
    fn test_find_by_serial() {
        let ports = [
            port("/dev/ttyACM0", Some("Arduino"), Some("A1")),
            port("/dev/ttyUSB0", Some("FTDI"), Some("B2")),
        ];
        assert_eq!(find_by_serial(&ports, "B2").unwrap().device, "/dev/ttyUSB0");
    }

    #[test]
    fn test_find_by_serial_not_found() {
        let ports = [port("/dev/ttyACM0", Some("Arduino"), Some("A1"))];
        let err = find_by_serial(&ports, "Z9").unwrap_err();
        assert!(matches!(err, LocateError::NotFound(ref s) if s == "Z9"));
    }

    #[test]
    fn test_find_by_serial_multiple() {
        let ports = [
            port("/dev/ttyACM0", Some("Arduino"), Some("A1")),
            port("/dev/ttyACM1", Some("Arduino"), Some("A1")),
            port("/dev/ttyACM2", Some("Arduino"), Some("A1")),
        ];
        let err = find_by_serial(&ports, "A1").unwrap_err();
        assert!(matches!(err, LocateError::Multiple { count: 3, .. }));
    }

    #[test]
    fn test_missing_serial_never_matches() {
        let ports = [port("/dev/ttyACM0", Some("Arduino"), None)];
        assert!(find_by_serial(&ports, "").is_err());
    }
}
