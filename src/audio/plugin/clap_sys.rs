//! `#[repr(C)]` mirror of the parts of the CLAP ABI an instrument host needs
//!
//! Layouts follow the C headers at https://github.com/free-audio/clap.
//! [`EventList`] is the host side of `clap_input_events`: channel messages
//! and system-exclusive data queued in delivery order.

use std::ffi::c_void;
use std::os::raw::c_char;

use crate::audio::midi::{message_len, unpack, MidiEvent};

// =============================================================================
// Version
// =============================================================================

pub const CLAP_VERSION_MAJOR: u32 = 1;
pub const CLAP_VERSION_MINOR: u32 = 2;
pub const CLAP_VERSION_REVISION: u32 = 0;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ClapVersion {
    pub major: u32,
    pub minor: u32,
    pub revision: u32,
}

impl ClapVersion {
    pub const fn new() -> Self {
        Self {
            major: CLAP_VERSION_MAJOR,
            minor: CLAP_VERSION_MINOR,
            revision: CLAP_VERSION_REVISION,
        }
    }

    /// Plugins built against CLAP 1.x can be hosted
    pub fn is_compatible(&self) -> bool {
        self.major >= 1
    }
}

impl Default for ClapVersion {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Plugin Entry
// =============================================================================

pub const CLAP_ENTRY_SYMBOL: &[u8] = b"clap_entry\0";
pub const CLAP_PLUGIN_FACTORY_ID: &[u8] = b"clap.plugin-factory\0";

#[repr(C)]
pub struct ClapPluginEntry {
    pub clap_version: ClapVersion,
    pub init: Option<unsafe extern "C" fn(plugin_path: *const c_char) -> bool>,
    pub deinit: Option<unsafe extern "C" fn()>,
    pub get_factory:
        Option<unsafe extern "C" fn(factory_id: *const c_char) -> *const c_void>,
}

// =============================================================================
// Plugin Factory
// =============================================================================

#[repr(C)]
pub struct ClapPluginFactory {
    pub get_plugin_count: Option<unsafe extern "C" fn(factory: *const ClapPluginFactory) -> u32>,
    pub get_plugin_descriptor: Option<
        unsafe extern "C" fn(
            factory: *const ClapPluginFactory,
            index: u32,
        ) -> *const ClapPluginDescriptor,
    >,
    pub create_plugin: Option<
        unsafe extern "C" fn(
            factory: *const ClapPluginFactory,
            host: *const ClapHost,
            plugin_id: *const c_char,
        ) -> *const ClapPlugin,
    >,
}

#[repr(C)]
pub struct ClapPluginDescriptor {
    pub clap_version: ClapVersion,
    pub id: *const c_char,
    pub name: *const c_char,
    pub vendor: *const c_char,
    pub url: *const c_char,
    pub manual_url: *const c_char,
    pub support_url: *const c_char,
    pub version: *const c_char,
    pub description: *const c_char,
    pub features: *const *const c_char,
}

// =============================================================================
// Host
// =============================================================================

#[repr(C)]
pub struct ClapHost {
    pub clap_version: ClapVersion,
    pub host_data: *mut c_void,
    pub name: *const c_char,
    pub vendor: *const c_char,
    pub url: *const c_char,
    pub version: *const c_char,
    pub get_extension: Option<
        unsafe extern "C" fn(host: *const ClapHost, extension_id: *const c_char) -> *const c_void,
    >,
    pub request_restart: Option<unsafe extern "C" fn(host: *const ClapHost)>,
    pub request_process: Option<unsafe extern "C" fn(host: *const ClapHost)>,
    pub request_callback: Option<unsafe extern "C" fn(host: *const ClapHost)>,
}

// =============================================================================
// Plugin
// =============================================================================

#[repr(C)]
pub struct ClapPlugin {
    pub desc: *const ClapPluginDescriptor,
    pub plugin_data: *mut c_void,
    pub init: Option<unsafe extern "C" fn(plugin: *const ClapPlugin) -> bool>,
    pub destroy: Option<unsafe extern "C" fn(plugin: *const ClapPlugin)>,
    pub activate: Option<
        unsafe extern "C" fn(
            plugin: *const ClapPlugin,
            sample_rate: f64,
            min_frames_count: u32,
            max_frames_count: u32,
        ) -> bool,
    >,
    pub deactivate: Option<unsafe extern "C" fn(plugin: *const ClapPlugin)>,
    pub start_processing: Option<unsafe extern "C" fn(plugin: *const ClapPlugin) -> bool>,
    pub stop_processing: Option<unsafe extern "C" fn(plugin: *const ClapPlugin)>,
    pub reset: Option<unsafe extern "C" fn(plugin: *const ClapPlugin)>,
    pub process:
        Option<unsafe extern "C" fn(plugin: *const ClapPlugin, process: *const ClapProcess) -> i32>,
    pub get_extension: Option<
        unsafe extern "C" fn(plugin: *const ClapPlugin, id: *const c_char) -> *const c_void,
    >,
    pub on_main_thread: Option<unsafe extern "C" fn(plugin: *const ClapPlugin)>,
}

// =============================================================================
// Audio Processing
// =============================================================================

pub const CLAP_PROCESS_ERROR: i32 = 0;
pub const CLAP_PROCESS_CONTINUE: i32 = 1;
pub const CLAP_PROCESS_CONTINUE_IF_NOT_QUIET: i32 = 2;
pub const CLAP_PROCESS_TAIL: i32 = 3;
pub const CLAP_PROCESS_SLEEP: i32 = 4;

#[repr(C)]
pub struct ClapProcess {
    pub steady_time: i64,
    pub frames_count: u32,
    /// `clap_event_transport`; always null, the host has no transport
    pub transport: *const c_void,
    pub audio_inputs: *const ClapAudioBuffer,
    pub audio_outputs: *mut ClapAudioBuffer,
    pub audio_inputs_count: u32,
    pub audio_outputs_count: u32,
    pub in_events: *const ClapInputEvents,
    pub out_events: *const ClapOutputEvents,
}

#[repr(C)]
pub struct ClapAudioBuffer {
    pub data32: *mut *mut f32,
    pub data64: *mut *mut f64,
    pub channel_count: u32,
    pub latency: u32,
    pub constant_mask: u64,
}

// =============================================================================
// Events
// =============================================================================

pub const CLAP_CORE_EVENT_SPACE_ID: u16 = 0;

pub const CLAP_EVENT_NOTE_ON: u16 = 0;
pub const CLAP_EVENT_NOTE_OFF: u16 = 1;
pub const CLAP_EVENT_MIDI: u16 = 10;
pub const CLAP_EVENT_MIDI_SYSEX: u16 = 11;

#[repr(C)]
pub struct ClapInputEvents {
    pub ctx: *mut c_void,
    pub size: Option<unsafe extern "C" fn(list: *const ClapInputEvents) -> u32>,
    pub get: Option<
        unsafe extern "C" fn(list: *const ClapInputEvents, index: u32) -> *const ClapEventHeader,
    >,
}

#[repr(C)]
pub struct ClapOutputEvents {
    pub ctx: *mut c_void,
    pub try_push:
        Option<unsafe extern "C" fn(list: *const ClapOutputEvents, event: *const ClapEventHeader) -> bool>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ClapEventHeader {
    pub size: u32,
    pub time: u32,
    pub space_id: u16,
    pub type_: u16,
    pub flags: u32,
}

impl ClapEventHeader {
    fn core<T>(type_: u16, time: u32) -> Self {
        Self {
            size: std::mem::size_of::<T>() as u32,
            time,
            space_id: CLAP_CORE_EVENT_SPACE_ID,
            type_,
            flags: 0,
        }
    }
}

#[repr(C)]
pub struct ClapEventNote {
    pub header: ClapEventHeader,
    pub note_id: i32,
    pub port_index: i16,
    pub channel: i16,
    pub key: i16,
    pub velocity: f64,
}

#[repr(C)]
pub struct ClapEventMidi {
    pub header: ClapEventHeader,
    pub port_index: u16,
    pub data: [u8; 3],
}

#[repr(C)]
pub struct ClapEventMidiSysex {
    pub header: ClapEventHeader,
    pub port_index: u16,
    pub buffer: *const u8,
    pub size: u32,
}

/// Output events are not consumed; pushes always succeed
pub unsafe extern "C" fn discard_output_events_push(
    _list: *const ClapOutputEvents,
    _event: *const ClapEventHeader,
) -> bool {
    true
}

// =============================================================================
// Ordered input event list
// =============================================================================

/// One event waiting for the next process call
pub enum QueuedEvent {
    Note(ClapEventNote),
    Midi(ClapEventMidi),
    Sysex(ClapEventMidiSysex),
}

impl QueuedEvent {
    pub fn header(&self) -> &ClapEventHeader {
        match self {
            Self::Note(e) => &e.header,
            Self::Midi(e) => &e.header,
            Self::Sysex(e) => &e.header,
        }
    }
}

/// Input events for one process call, kept in the order they were pushed.
///
/// Passed to the plugin through the `ClapInputEvents` ctx pointer.
#[derive(Default)]
pub struct EventList {
    events: Vec<QueuedEvent>,
    /// Owned copies of sysex payloads; each inner buffer stays put while its
    /// event is queued
    sysex_data: Vec<Vec<u8>>,
}

impl EventList {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(64),
            sysex_data: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.sysex_data.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&QueuedEvent> {
        self.events.get(index)
    }

    /// Queue a packed channel message. Note on/off become CLAP note events,
    /// everything else is passed through as raw MIDI.
    pub fn push_packed(&mut self, data: u32, time: u32) {
        match MidiEvent::from_packed(data) {
            Some(MidiEvent::NoteOn {
                note,
                velocity,
                channel,
            }) if velocity > 0 => self.push_note(CLAP_EVENT_NOTE_ON, note, velocity, channel, time),
            Some(MidiEvent::NoteOn { note, channel, .. }) => {
                self.push_note(CLAP_EVENT_NOTE_OFF, note, 0, channel, time)
            }
            Some(MidiEvent::NoteOff {
                note,
                velocity,
                channel,
            }) => self.push_note(CLAP_EVENT_NOTE_OFF, note, velocity, channel, time),
            Some(_) => {
                let mut bytes = unpack(data);
                if message_len(data) == 2 {
                    bytes[2] = 0;
                }
                self.events.push(QueuedEvent::Midi(ClapEventMidi {
                    header: ClapEventHeader::core::<ClapEventMidi>(CLAP_EVENT_MIDI, time),
                    port_index: 0,
                    data: bytes,
                }));
            }
            None => log::debug!("Dropping non-channel message {:#08x}", data),
        }
    }

    fn push_note(&mut self, type_: u16, note: u8, velocity: u8, channel: u8, time: u32) {
        self.events.push(QueuedEvent::Note(ClapEventNote {
            header: ClapEventHeader::core::<ClapEventNote>(type_, time),
            note_id: -1, // No specific note ID
            port_index: 0,
            channel: channel as i16,
            key: note as i16,
            velocity: velocity as f64 / 127.0, // CLAP uses 0.0-1.0
        }));
    }

    /// Queue a complete system-exclusive message (`F0 ... F7`)
    pub fn push_sysex(&mut self, message: &[u8], time: u32) {
        let payload = message.to_vec();
        let event = ClapEventMidiSysex {
            header: ClapEventHeader::core::<ClapEventMidiSysex>(CLAP_EVENT_MIDI_SYSEX, time),
            port_index: 0,
            buffer: payload.as_ptr(),
            size: payload.len() as u32,
        };
        self.sysex_data.push(payload);
        self.events.push(QueuedEvent::Sysex(event));
    }

    /// Plugin-facing view of this list. The returned struct borrows `self`
    /// through a raw pointer and must not outlive it.
    pub fn as_input_events(&self) -> ClapInputEvents {
        ClapInputEvents {
            ctx: self as *const EventList as *mut c_void,
            size: Some(event_list_size),
            get: Some(event_list_get),
        }
    }
}

/// Callback: return number of events in the list
unsafe extern "C" fn event_list_size(list: *const ClapInputEvents) -> u32 {
    let ctx = (*list).ctx as *const EventList;
    if ctx.is_null() {
        return 0;
    }
    (*ctx).len() as u32
}

/// Callback: return event at index
unsafe extern "C" fn event_list_get(
    list: *const ClapInputEvents,
    index: u32,
) -> *const ClapEventHeader {
    let ctx = (*list).ctx as *const EventList;
    if ctx.is_null() {
        return std::ptr::null();
    }
    match (*ctx).get(index as usize) {
        Some(event) => event.header() as *const ClapEventHeader,
        None => std::ptr::null(),
    }
}

// =============================================================================
// GUI Extension
// =============================================================================

pub const CLAP_EXT_GUI: &[u8] = b"clap.gui\0";

#[cfg(target_os = "macos")]
pub const CLAP_WINDOW_API_NATIVE: &[u8] = b"cocoa\0";

#[cfg(target_os = "windows")]
pub const CLAP_WINDOW_API_NATIVE: &[u8] = b"win32\0";

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const CLAP_WINDOW_API_NATIVE: &[u8] = b"x11\0";

#[repr(C)]
pub union ClapWindowHandle {
    pub ptr: *mut c_void,
    pub x11: u64,
}

#[repr(C)]
pub struct ClapWindow {
    pub api: *const c_char,
    pub handle: ClapWindowHandle,
}

#[repr(C)]
pub struct ClapGuiResizeHints {
    pub can_resize_horizontally: bool,
    pub can_resize_vertically: bool,
    pub preserve_aspect_ratio: bool,
    pub aspect_ratio_width: u32,
    pub aspect_ratio_height: u32,
}

#[repr(C)]
pub struct ClapPluginGui {
    pub is_api_supported: Option<
        unsafe extern "C" fn(plugin: *const ClapPlugin, api: *const c_char, is_floating: bool) -> bool,
    >,
    pub get_preferred_api: Option<
        unsafe extern "C" fn(
            plugin: *const ClapPlugin,
            api: *mut *const c_char,
            is_floating: *mut bool,
        ) -> bool,
    >,
    pub create: Option<
        unsafe extern "C" fn(plugin: *const ClapPlugin, api: *const c_char, is_floating: bool) -> bool,
    >,
    pub destroy: Option<unsafe extern "C" fn(plugin: *const ClapPlugin)>,
    pub set_scale: Option<unsafe extern "C" fn(plugin: *const ClapPlugin, scale: f64) -> bool>,
    pub get_size: Option<
        unsafe extern "C" fn(plugin: *const ClapPlugin, width: *mut u32, height: *mut u32) -> bool,
    >,
    pub can_resize: Option<unsafe extern "C" fn(plugin: *const ClapPlugin) -> bool>,
    pub get_resize_hints: Option<
        unsafe extern "C" fn(plugin: *const ClapPlugin, hints: *mut ClapGuiResizeHints) -> bool,
    >,
    pub adjust_size: Option<
        unsafe extern "C" fn(plugin: *const ClapPlugin, width: *mut u32, height: *mut u32) -> bool,
    >,
    pub set_size: Option<
        unsafe extern "C" fn(plugin: *const ClapPlugin, width: u32, height: u32) -> bool,
    >,
    pub set_parent: Option<
        unsafe extern "C" fn(plugin: *const ClapPlugin, window: *const ClapWindow) -> bool,
    >,
    pub set_transient: Option<
        unsafe extern "C" fn(plugin: *const ClapPlugin, window: *const ClapWindow) -> bool,
    >,
    /// Suggest a title for floating windows
    pub suggest_title: Option<
        unsafe extern "C" fn(plugin: *const ClapPlugin, title: *const c_char),
    >,
    pub show: Option<unsafe extern "C" fn(plugin: *const ClapPlugin) -> bool>,
    pub hide: Option<unsafe extern "C" fn(plugin: *const ClapPlugin) -> bool>,
}

// =============================================================================
// Host Params Extension
// =============================================================================

pub const CLAP_EXT_PARAMS: &[u8] = b"clap.params\0";

#[repr(C)]
pub struct ClapHostParams {
    pub rescan: Option<unsafe extern "C" fn(host: *const ClapHost, flags: u32)>,
    pub clear: Option<unsafe extern "C" fn(host: *const ClapHost, param_id: u32, flags: u32)>,
    pub request_flush: Option<unsafe extern "C" fn(host: *const ClapHost)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::midi::pack;

    fn type_at(list: &EventList, index: usize) -> u16 {
        list.get(index).unwrap().header().type_
    }

    #[test]
    fn test_events_keep_push_order() {
        let mut list = EventList::new();
        list.push_packed(pack(0xB0, 7, 100), 0);
        list.push_packed(pack(0x90, 60, 127), 0);
        list.push_packed(pack(0xC0, 5, 0), 0);
        list.push_packed(pack(0x80, 60, 64), 0);

        assert_eq!(list.len(), 4);
        assert_eq!(type_at(&list, 0), CLAP_EVENT_MIDI);
        assert_eq!(type_at(&list, 1), CLAP_EVENT_NOTE_ON);
        assert_eq!(type_at(&list, 2), CLAP_EVENT_MIDI);
        assert_eq!(type_at(&list, 3), CLAP_EVENT_NOTE_OFF);
    }

    #[test]
    fn test_note_conversion() {
        let mut list = EventList::new();
        list.push_packed(pack(0x93, 64, 127), 0);
        list.push_packed(pack(0x93, 64, 0), 0);

        match list.get(0) {
            Some(QueuedEvent::Note(note)) => {
                assert_eq!(note.channel, 3);
                assert_eq!(note.key, 64);
                assert!((note.velocity - 1.0).abs() < 1e-9);
                assert_eq!(note.header.size as usize, std::mem::size_of::<ClapEventNote>());
            }
            _ => panic!("Expected note event"),
        }
        // Zero velocity note on ends the note
        assert_eq!(type_at(&list, 1), CLAP_EVENT_NOTE_OFF);
    }

    #[test]
    fn test_raw_midi_bytes() {
        let mut list = EventList::new();
        list.push_packed(pack(0xE1, 0x00, 0x40), 0);
        list.push_packed(pack(0xD2, 0x30, 0x55), 0);
        match (list.get(0), list.get(1)) {
            (Some(QueuedEvent::Midi(bend)), Some(QueuedEvent::Midi(pressure))) => {
                assert_eq!(bend.data, [0xE1, 0x00, 0x40]);
                // Second data byte of a two-byte message is cleared
                assert_eq!(pressure.data, [0xD2, 0x30, 0x00]);
            }
            _ => panic!("Expected raw MIDI events"),
        }
    }

    #[test]
    fn test_sysex_event_owns_payload() {
        let mut list = EventList::new();
        {
            let message = vec![0xF0, 0x7E, 0x7F, 0x09, 0x01, 0xF7];
            list.push_sysex(&message, 0);
        }
        match list.get(0) {
            Some(QueuedEvent::Sysex(sysex)) => {
                assert_eq!(sysex.header.type_, CLAP_EVENT_MIDI_SYSEX);
                let bytes = unsafe { std::slice::from_raw_parts(sysex.buffer, sysex.size as usize) };
                assert_eq!(bytes, &[0xF0, 0x7E, 0x7F, 0x09, 0x01, 0xF7]);
            }
            _ => panic!("Expected sysex event"),
        }
    }

    #[test]
    fn test_input_event_callbacks() {
        let mut list = EventList::new();
        list.push_packed(pack(0x90, 60, 100), 0);
        list.push_packed(pack(0xB0, 64, 127), 0);
        let input = list.as_input_events();

        unsafe {
            assert_eq!(event_list_size(&input), 2);
            let header = event_list_get(&input, 1);
            assert!(!header.is_null());
            assert_eq!((*header).type_, CLAP_EVENT_MIDI);
            assert!(event_list_get(&input, 2).is_null());
        }

        list.clear();
        assert!(list.is_empty());
    }
}
