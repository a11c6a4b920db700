// Raw MIDI bytes in, note triggers out. Stateless: there is no note-off
// handling, no channel filtering and no held-note bookkeeping.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff,
    Other,
}

pub fn parse(bytes: &[u8]) -> MidiMessage {
    let Some(&status) = bytes.first() else {
        return MidiMessage::Other;
    };
    // the low nibble is the channel, which nothing here cares about
    match (status >> 4, bytes.get(1), bytes.get(2)) {
        (0x9, Some(&note), Some(&velocity)) => MidiMessage::NoteOn { note, velocity },
        (0x8, Some(_), Some(_)) => MidiMessage::NoteOff,
        _ => MidiMessage::Other,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Route {
    Trigger { note: u8, velocity: f32 },
    Ignore,
}

pub fn route(bytes: &[u8]) -> Route {
    match parse(bytes) {
        // velocity 0 still triggers, the voice is just silent
        MidiMessage::NoteOn { note, velocity } => Route::Trigger {
            note: note & 0x7F,
            velocity: (velocity & 0x7F) as f32 / 127.0,
        },
        _ => Route::Ignore,
    }
}
