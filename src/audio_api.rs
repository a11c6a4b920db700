use crate::audio::Voice;

pub enum AudioCommand {
    // The engine can't build voices (allocation, FFT planning), so the
    // control thread builds a complete voice and hands it over; the engine
    // anchors it at its own clock and mixes it until it ends
    Connect(Box<Voice>),

    // An empty, larger voice list allocated on the control thread. The
    // engine moves its voices over and sends the old list back
    Reserve(Vec<Box<Voice>>),

    // Level of the output gain stage every voice is mixed into
    SetOutputGain(f32),
}

// What the engine hands back to the control thread to be freed
pub enum Retired {
    Voice(Box<Voice>),
    Slots(Vec<Box<Voice>>),
}
