use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing::debug;

use heartlink_locate::{arduino_ports, find_by_serial, usb_ports, LocateError, UsbSerialPort};

const EXIT_OK: u8 = 0;
const EXIT_NO_SERIAL: u8 = 1;

#[derive(Parser, Debug)]
#[command(author, version, about = "Find a Heartlink board's serial device", long_about = None)]
struct Cli {
    /// Board's USB serial number (run with --list to see connected boards)
    #[arg(short, long = "serialnum")]
    serialnum: Option<String>,

    /// List serial numbers of every connected Arduino board
    #[arg(short, long)]
    list: bool,

    /// Log port enumeration details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    let code = execute(&cli, usb_ports, &mut std::io::stdout().lock())?;
    Ok(ExitCode::from(code))
}

/// Carry out the request in `cli`, writing results to `out`
///
/// `ports` is only called when the request needs the attached ports.
fn execute<P, W>(cli: &Cli, ports: P, out: &mut W) -> anyhow::Result<u8>
where
    P: FnOnce() -> Result<Vec<UsbSerialPort>, LocateError>,
    W: Write,
{
    if cli.list {
        let ports = ports().context("listing serial ports")?;
        writeln!(out, "Connected Arduino Serial Numbers:")?;
        let boards = arduino_ports(&ports);
        if boards.is_empty() {
            writeln!(out, "    (none found)")?;
        }
        for board in boards {
            debug!("{:?}", board);
            writeln!(
                out,
                "    - {}",
                board.serial_number.as_deref().unwrap_or("(no serial)")
            )?;
        }
        return Ok(EXIT_OK);
    }

    let Some(serial) = cli.serialnum.as_deref() else {
        writeln!(out, "No serial number specified...")?;
        write!(out, "{}", Cli::command().render_help())?;
        return Ok(EXIT_NO_SERIAL);
    };

    let ports = ports().context("listing serial ports")?;
    let port = find_by_serial(&ports, serial)?;
    writeln!(out, "{}", port.device)?;
    Ok(EXIT_OK)
}
