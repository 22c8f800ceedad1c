//! Build script for heartlink-firmware
//!
//! - Validates board.toml at compile time
//! - Generates `board.rs` with the board configuration constant

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use heartlink_core::config::{BridgeConfig, Prescaler, ToggleConvention};
use heartlink_hal::spi::{ClockDivider, Mode};
use heartlink_hal::uart::{DataBits, Parity, StopBits};
use heartlink_hal::Patience;
use heartlink_hal_avr::pins::parse_pin_string;

fn main() {
    let config = validate_config();
    generate_board(&config);
}

/// Validate board.toml and turn it into a configuration
fn validate_config() -> BridgeConfig {
    // Re-run if board.toml changes
    println!("cargo:rerun-if-changed=board.toml");
    println!("cargo:rerun-if-changed=build.rs");

    let config_path = Path::new("board.toml");

    // Check if config file exists
    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: board.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a board.toml configuration file.          ║\n\
            ║  Please create one in the heartlink-firmware directory.          ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    // Read the config file
    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read board.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let value: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in board.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    validate_required_sections(&value);

    let mut errors = Vec::new();
    let config = read_config(&value, &mut errors);
    report("Invalid board configuration", &errors);

    // Same arithmetic the firmware checks again in a const context
    let validated = match config.validate() {
        Ok(validated) => validated,
        Err(e) => {
            report("Board configuration out of range", &[e.to_string()]);
            unreachable!();
        }
    };

    println!(
        "cargo:warning=board.toml validated: OCR1A={} UBRR0={} (~{} baud)",
        validated.compare_threshold(),
        validated.baud_divisor(),
        validated.actual_baud()
    );

    config
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Panic with a boxed list of errors, if there are any
fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Validate that required sections exist
fn validate_required_sections(config: &toml::Value) {
    let mut errors = Vec::new();

    for section in ["clock", "heartbeat", "uart", "spi"] {
        match config.get(section) {
            Some(toml::Value::Table(_)) => {}
            Some(_) => errors.push(format!("[{}] must be a table", section)),
            None => errors.push(format!("Missing [{}] section", section)),
        }
    }

    report("Missing required sections in board.toml", &errors);
}

/// Look up a non-negative integer, recording an error if it is unusable
fn get_u32(
    config: &toml::Value,
    section: &str,
    key: &str,
    default: Option<u32>,
    errors: &mut Vec<String>,
) -> u32 {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::Integer(v)) => match u32::try_from(*v) {
            Ok(v) => v,
            Err(_) => {
                errors.push(format!("[{}] {} must be 0-{}", section, key, u32::MAX));
                0
            }
        },
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            0
        }
        None => match default {
            Some(v) => v,
            None => {
                errors.push(format!("[{}] missing '{}'", section, key));
                0
            }
        },
    }
}

/// Look up a string, recording an error if it is unusable
fn get_str<'a>(
    config: &'a toml::Value,
    section: &str,
    key: &str,
    default: &'a str,
    errors: &mut Vec<String>,
) -> &'a str {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::String(s)) => s.as_str(),
        Some(_) => {
            errors.push(format!("[{}] {} must be a string", section, key));
            default
        }
        None => default,
    }
}

/// Translate board.toml into a configuration, collecting every problem
fn read_config(value: &toml::Value, errors: &mut Vec<String>) -> BridgeConfig {
    let clock_hz = get_u32(value, "clock", "frequency_hz", None, errors);
    let flash_hz = get_u32(value, "heartbeat", "flash_hz", None, errors);
    let baud = get_u32(value, "uart", "baud", None, errors);

    let mut config = BridgeConfig::new(clock_hz, flash_hz, baud);

    let toggles = get_u32(value, "heartbeat", "toggles_per_flash", Some(1), errors);
    match ToggleConvention::from_toggles(toggles) {
        Some(toggle) => config.toggle = toggle,
        None => errors.push("[heartbeat] toggles_per_flash must be 1 or 2".to_string()),
    }

    let prescaler = get_u32(value, "heartbeat", "prescaler", Some(256), errors);
    match Prescaler::from_factor(prescaler) {
        Some(prescaler) => config.prescaler = prescaler,
        None => errors.push("[heartbeat] prescaler must be 1, 8, 64, 256 or 1024".to_string()),
    }

    let pin = get_str(value, "heartbeat", "pin", "PB7", errors);
    match parse_pin_string(pin) {
        Some(pin) => config.heartbeat_pin = pin,
        None => errors.push(format!("[heartbeat] pin '{}' is not a port B pin", pin)),
    }

    config.uart.data_bits = match get_u32(value, "uart", "data_bits", Some(8), errors) {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        8 => DataBits::Eight,
        _ => {
            errors.push("[uart] data_bits must be 5-8".to_string());
            DataBits::Eight
        }
    };
    config.uart.parity = match get_str(value, "uart", "parity", "none", errors) {
        "none" => Parity::None,
        "even" => Parity::Even,
        "odd" => Parity::Odd,
        _ => {
            errors.push("[uart] parity must be 'none', 'even', or 'odd'".to_string());
            Parity::None
        }
    };
    config.uart.stop_bits = match get_u32(value, "uart", "stop_bits", Some(1), errors) {
        1 => StopBits::One,
        2 => StopBits::Two,
        _ => {
            errors.push("[uart] stop_bits must be 1 or 2".to_string());
            StopBits::One
        }
    };
    let allow_any = match value.get("uart").and_then(|s| s.get("allow_any_baud_error")) {
        Some(toml::Value::Boolean(b)) => *b,
        Some(_) => {
            errors.push("[uart] allow_any_baud_error must be true or false".to_string());
            false
        }
        None => false,
    };
    if allow_any {
        config.max_baud_error_permille = None;
    } else {
        let max_error = get_u32(value, "uart", "max_baud_error_permille", Some(25), errors);
        match u16::try_from(max_error) {
            Ok(max) if max < 1000 => config.max_baud_error_permille = Some(max),
            _ => errors.push("[uart] max_baud_error_permille must be 0-999".to_string()),
        }
    }

    let divider = get_u32(value, "spi", "clock_divider", Some(16), errors);
    match ClockDivider::from_factor(divider) {
        Some(clock) => config.spi.clock = clock,
        None => errors.push("[spi] clock_divider must be 4, 16, 64 or 128".to_string()),
    }
    let mode = get_u32(value, "spi", "mode", Some(0), errors);
    match u8::try_from(mode).ok().and_then(Mode::from_number) {
        Some(mode) => config.spi.mode = mode,
        None => errors.push("[spi] mode must be 0-3".to_string()),
    }

    if value.get("poll").is_some() {
        let spins = get_u32(value, "poll", "spins", None, errors);
        config.patience = Patience::Spins(spins);
    }

    config
}

/// Write `board.rs` into OUT_DIR
fn generate_board(config: &BridgeConfig) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

    let max_error = match config.max_baud_error_permille {
        Some(max) => format!("Some({})", max),
        None => "None".to_string(),
    };
    let patience = match config.patience {
        Patience::Forever => "::heartlink_hal::Patience::Forever".to_string(),
        Patience::Spins(n) => format!("::heartlink_hal::Patience::Spins({})", n),
    };

    let source = format!(
        "// Generated by build.rs from board.toml. Do not edit.\n\
         \n\
         /// Board configuration from board.toml\n\
         pub const CONFIG: ::heartlink_core::BridgeConfig = ::heartlink_core::BridgeConfig {{\n    \
             clock_hz: {clock_hz},\n    \
             flash_hz: {flash_hz},\n    \
             toggle: ::heartlink_core::ToggleConvention::{toggle:?},\n    \
             prescaler: ::heartlink_core::Prescaler::{prescaler:?},\n    \
             heartbeat_pin: ::heartlink_hal_avr::PortPin::{pin:?},\n    \
             uart: ::heartlink_hal::uart::UartConfig {{\n        \
                 baudrate: {baud},\n        \
                 data_bits: ::heartlink_hal::uart::DataBits::{data_bits:?},\n        \
                 parity: ::heartlink_hal::uart::Parity::{parity:?},\n        \
                 stop_bits: ::heartlink_hal::uart::StopBits::{stop_bits:?},\n    \
             }},\n    \
             max_baud_error_permille: {max_error},\n    \
             spi: ::heartlink_hal::spi::SpiConfig {{\n        \
                 clock: ::heartlink_hal::spi::ClockDivider::{clock:?},\n        \
                 mode: ::heartlink_hal::spi::Mode::{mode:?},\n    \
             }},\n    \
             patience: {patience},\n\
         }};\n",
        clock_hz = config.clock_hz,
        flash_hz = config.flash_hz,
        toggle = config.toggle,
        prescaler = config.prescaler,
        pin = config.heartbeat_pin,
        baud = config.uart.baudrate,
        data_bits = config.uart.data_bits,
        parity = config.uart.parity,
        stop_bits = config.uart.stop_bits,
        max_error = max_error,
        clock = config.spi.clock,
        mode = config.spi.mode,
        patience = patience,
    );

    fs::write(out_dir.join("board.rs"), source).expect("OUT_DIR is writable");
}
