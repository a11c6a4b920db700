mod device;

pub use device::MidiInputDevice;
