//! `midir` backed input transport and port discovery

use midir::{MidiInput, MidiInputConnection, MidiInputPort};
use tracing::debug;

use super::transport::{InputPort, MidiTransport, PacketCallback, PortSelector, StopHandle};
use crate::error::TransportError;

/// Opens system MIDI inputs through midir
#[derive(Debug, Clone)]
pub struct MidirTransport {
    client_name: String,
}

impl MidirTransport {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }
}

impl Default for MidirTransport {
    fn default() -> Self {
        Self::new("midi-sliders")
    }
}

impl MidiTransport for MidirTransport {
    fn open(&self, selector: &PortSelector) -> Result<Box<dyn InputPort>, TransportError> {
        let input = MidiInput::new(&self.client_name)
            .map_err(|e| TransportError::Init(e.to_string()))?;

        let (port, name) = match selector {
            PortSelector::Index(index) => {
                let ports = input.ports();
                let port = ports.get(*index).cloned().ok_or(TransportError::IndexOutOfRange {
                    index: *index,
                    available: ports.len(),
                })?;
                let name = input
                    .port_name(&port)
                    .unwrap_or_else(|_| format!("port {}", index));
                (port, name)
            }
            PortSelector::Name(pattern) => find_input_port(&input, pattern)
                .ok_or_else(|| TransportError::NameNotFound(pattern.clone()))?,
        };

        Ok(Box::new(MidirPort { input, port, name }))
    }
}

/// Find an input port by case-insensitive substring match
fn find_input_port(midi_in: &MidiInput, pattern: &str) -> Option<(MidiInputPort, String)> {
    let pattern = pattern.to_lowercase();
    for port in midi_in.ports() {
        if let Ok(name) = midi_in.port_name(&port) {
            if name.to_lowercase().contains(&pattern) {
                debug!("Found port '{}' matching pattern '{}'", name, pattern);
                return Some((port, name));
            }
        }
    }
    None
}

struct MidirPort {
    input: MidiInput,
    port: MidiInputPort,
    name: String,
}

impl InputPort for MidirPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn listen(self: Box<Self>, mut callback: PacketCallback) -> Result<Box<dyn StopHandle>, TransportError> {
        let MidirPort { input, port, name } = *self;

        let connection = input
            .connect(
                &port,
                "midi-sliders-in",
                move |_timestamp, data, _| callback(data),
                (),
            )
            .map_err(|e| TransportError::Listen {
                port: name.clone(),
                reason: e.to_string(),
            })?;

        debug!(port = %name, "Listening on MIDI input");
        Ok(Box::new(MidirStopHandle { connection }))
    }
}

struct MidirStopHandle {
    connection: MidiInputConnection<()>,
}

impl StopHandle for MidirStopHandle {
    fn stop(self: Box<Self>) {
        let MidirStopHandle { connection } = *self;
        let _ = connection.close();
    }
}

/// Port discovery utilities
pub mod discovery {
    use super::*;
    use colored::Colorize;

    /// Information about a MIDI input port
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct PortInfo {
        pub index: usize,
        pub name: String,
    }

    /// List input ports with the index `midi.port` refers to
    pub fn discover_input_ports() -> Result<Vec<PortInfo>, TransportError> {
        let midi_in = MidiInput::new("midi-sliders-discovery")
            .map_err(|e| TransportError::Init(e.to_string()))?;

        let port_infos = midi_in
            .ports()
            .iter()
            .enumerate()
            .filter_map(|(index, port)| {
                midi_in
                    .port_name(port)
                    .ok()
                    .map(|name| PortInfo { index, name })
            })
            .collect();

        Ok(port_infos)
    }

    /// Print discovered ports
    pub fn print_ports() {
        println!("\n{}", "=== MIDI Input Ports ===".bold().cyan());
        match discover_input_ports() {
            Ok(ports) if ports.is_empty() => println!("  {}", "(none)".dimmed()),
            Ok(ports) => {
                for port in ports {
                    println!("  {}: {}", port.index.to_string().yellow(), port.name);
                }
            }
            Err(e) => println!("  {}", e.to_string().red()),
        }
        println!();
    }
}
