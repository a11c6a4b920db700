use crossbeam_channel::Sender;
use midir::{MidiInput, MidiInputConnection};

// Open MIDI input port. Raw messages are forwarded to the control thread;
// the port closes when this is dropped.
pub struct MidiInputDevice {
    name: String,
    _connection: MidiInputConnection<()>,
}

impl MidiInputDevice {
    pub fn list_ports() -> anyhow::Result<Vec<String>> {
        let midi_in = MidiInput::new("samplety-enumerate")
            .map_err(|e| anyhow::anyhow!("failed to create MIDI input: {e}"))?;
        Ok(midi_in
            .ports()
            .iter()
            .enumerate()
            .map(|(i, port)| midi_in.port_name(port).unwrap_or_else(|_| format!("port {i}")))
            .collect())
    }

    // Connect to the first port whose name contains `filter` (any port if
    // None). Ok(None) means there was nothing to connect to.
    pub fn connect(filter: Option<&str>, tx: Sender<Vec<u8>>) -> anyhow::Result<Option<Self>> {
        let midi_in = MidiInput::new("samplety-input")
            .map_err(|e| anyhow::anyhow!("failed to create MIDI input: {e}"))?;

        let ports = midi_in.ports();
        let wanted = filter.map(str::to_lowercase);
        let found = ports.iter().find_map(|port| {
            let name = midi_in.port_name(port).ok()?;
            match &wanted {
                Some(w) if !name.to_lowercase().contains(w.as_str()) => None,
                _ => Some((port.clone(), name)),
            }
        });
        let Some((port, name)) = found else {
            log::info!("no MIDI input port matching {filter:?} ({} ports seen)", ports.len());
            return Ok(None);
        };

        log::info!("connecting to MIDI input {name}");
        let connection = midi_in
            .connect(
                &port,
                "samplety-midi-in",
                move |_stamp, message, _| {
                    if !message.is_empty() && tx.try_send(message.to_vec()).is_err() {
                        log::trace!("MIDI queue full, message dropped");
                    }
                },
                (),
            )
            .map_err(|e| anyhow::anyhow!("failed to connect to MIDI input {name}: {e}"))?;

        Ok(Some(Self {
            name,
            _connection: connection,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
