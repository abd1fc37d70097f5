//! CLAP Instrument Host
//!
//! Loads a CLAP binary, creates the first plugin it exports and drives it as
//! an [`Instrument`]: activation, ordered event delivery, module resets and
//! the floating editor window.

use super::clap_sys::*;
use super::Instrument;
use crate::error::HostError;
use libloading::{Library, Symbol};
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Largest block handed to the plugin in one process call
pub const BLOCK_FRAMES: u32 = 1024;

/// Time the plugin gets to apply a reset message
pub const RESET_SETTLE: Duration = Duration::from_millis(50);

const CHANNELS: usize = 2;

/// Set when a plugin calls request_callback(); serviced after the next
/// process call by invoking on_main_thread()
static CALLBACK_REQUESTED: AtomicBool = AtomicBool::new(false);

fn take_callback_request() -> bool {
    CALLBACK_REQUESTED.swap(false, Ordering::SeqCst)
}

/// Host name and version info
const HOST_NAME: &[u8] = b"smfsynth\0";
const HOST_VENDOR: &[u8] = b"smfsynth\0";
const HOST_URL: &[u8] = b"\0";
const HOST_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

/// Descriptor fields of the hosted plugin
#[derive(Debug, Clone, Default)]
pub struct PluginInfo {
    pub id: String,
    pub name: String,
    pub vendor: String,
    pub version: String,
}

/// A CLAP plugin driven as a MIDI instrument
pub struct ClapInstrument {
    entry: *const ClapPluginEntry,
    factory: *const ClapPluginFactory,
    /// Plugin instance, null while none is held
    plugin: *const ClapPlugin,
    /// Host structure (must be kept alive for callbacks)
    host: Box<ClapHost>,
    plugin_id: CString,
    info: PluginInfo,
    path: PathBuf,

    /// Destroy the instance on stop and create a fresh one on start
    reset_on_start: bool,

    sample_rate: f64,
    is_active: bool,
    is_processing: bool,
    editor_open: bool,
    steady_time: i64,

    // Audio buffers (pre-allocated, input stays silent)
    input_data: [Vec<f32>; CHANNELS],
    output_data: [Vec<f32>; CHANNELS],
    input_ptrs: [*mut f32; CHANNELS],
    output_ptrs: [*mut f32; CHANNELS],

    /// Events for the next process call
    events: EventList,

    /// Dropped after the plugin has been torn down in `Drop`
    _library: Library,
}

// Safety: the raw pointers are owned by this struct and only used through
// &mut self; playback drives one instrument from one thread at a time.
unsafe impl Send for ClapInstrument {}

impl ClapInstrument {
    /// Load a CLAP binary and initialize its entry point.
    ///
    /// Unless `reset_on_start` is set, the plugin instance is created right
    /// away and kept until the instrument is dropped.
    pub fn load(path: &Path, reset_on_start: bool) -> Result<Self, HostError> {
        log::info!("Loading CLAP instrument from: {:?}", path);

        let binary = resolve_binary_path(path);
        let library = unsafe { Library::new(&binary)? };

        let entry: *const ClapPluginEntry = unsafe {
            let symbol: Symbol<*const ClapPluginEntry> = library
                .get(CLAP_ENTRY_SYMBOL)
                .map_err(|_| HostError::MissingSymbol("clap_entry"))?;
            *symbol
        };
        if entry.is_null() {
            return Err(HostError::MissingSymbol("clap_entry"));
        }

        let entry_ref = unsafe { &*entry };
        let version = entry_ref.clap_version;
        log::info!(
            "Plugin CLAP version: {}.{}.{}",
            version.major,
            version.minor,
            version.revision
        );
        if !version.is_compatible() {
            return Err(HostError::Handshake(format!(
                "unsupported CLAP version {}.{}.{}",
                version.major, version.minor, version.revision
            )));
        }

        let path_cstr = CString::new(path.to_string_lossy().as_bytes())
            .map_err(|e| HostError::Handshake(format!("invalid plugin path: {}", e)))?;
        let init_fn = entry_ref
            .init
            .ok_or(HostError::MissingSymbol("clap_entry.init"))?;
        if !unsafe { init_fn(path_cstr.as_ptr()) } {
            return Err(HostError::Handshake("clap_entry.init() returned false".to_string()));
        }

        let host = Box::new(ClapHost {
            clap_version: ClapVersion::new(),
            host_data: ptr::null_mut(),
            name: HOST_NAME.as_ptr() as *const c_char,
            vendor: HOST_VENDOR.as_ptr() as *const c_char,
            url: HOST_URL.as_ptr() as *const c_char,
            version: HOST_VERSION.as_ptr() as *const c_char,
            get_extension: Some(host_get_extension),
            request_restart: Some(host_request_restart),
            request_process: Some(host_request_process),
            request_callback: Some(host_request_callback),
        });

        // From here on Drop deinitializes the entry if anything fails
        let mut instrument = Self {
            entry,
            factory: ptr::null(),
            plugin: ptr::null(),
            host,
            plugin_id: CString::default(),
            info: PluginInfo::default(),
            path: path.to_path_buf(),
            reset_on_start,
            sample_rate: 0.0,
            is_active: false,
            is_processing: false,
            editor_open: false,
            steady_time: 0,
            input_data: [vec![0.0; BLOCK_FRAMES as usize], vec![0.0; BLOCK_FRAMES as usize]],
            output_data: [vec![0.0; BLOCK_FRAMES as usize], vec![0.0; BLOCK_FRAMES as usize]],
            input_ptrs: [ptr::null_mut(); CHANNELS],
            output_ptrs: [ptr::null_mut(); CHANNELS],
            events: EventList::new(),
            _library: library,
        };

        instrument.open_factory()?;
        if !reset_on_start {
            instrument.create_instance()?;
        }
        Ok(instrument)
    }

    /// Find the factory and read the first plugin descriptor
    fn open_factory(&mut self) -> Result<(), HostError> {
        let entry_ref = unsafe { &*self.entry };
        let get_factory_fn = entry_ref
            .get_factory
            .ok_or(HostError::MissingSymbol("clap_entry.get_factory"))?;
        let factory = unsafe {
            get_factory_fn(CLAP_PLUGIN_FACTORY_ID.as_ptr() as *const c_char)
                as *const ClapPluginFactory
        };
        if factory.is_null() {
            return Err(HostError::Handshake("no plugin factory".to_string()));
        }
        self.factory = factory;

        let factory_ref = unsafe { &*factory };
        let get_count_fn = factory_ref
            .get_plugin_count
            .ok_or(HostError::MissingSymbol("clap_plugin_factory.get_plugin_count"))?;
        let plugin_count = unsafe { get_count_fn(factory) };
        if plugin_count == 0 {
            return Err(HostError::Handshake("no plugins in this binary".to_string()));
        }
        log::info!("Found {} plugin(s), using the first", plugin_count);

        let get_descriptor_fn = factory_ref
            .get_plugin_descriptor
            .ok_or(HostError::MissingSymbol("clap_plugin_factory.get_plugin_descriptor"))?;
        let descriptor = unsafe { get_descriptor_fn(factory, 0) };
        if descriptor.is_null() {
            return Err(HostError::Handshake("no plugin descriptor".to_string()));
        }

        let desc_ref = unsafe { &*descriptor };
        if desc_ref.id.is_null() {
            return Err(HostError::Handshake("plugin descriptor has no id".to_string()));
        }
        self.plugin_id = unsafe { CStr::from_ptr(desc_ref.id) }.to_owned();
        self.info = PluginInfo {
            id: self.plugin_id.to_string_lossy().into_owned(),
            name: unsafe { c_string_or(desc_ref.name, "Unknown Plugin") },
            vendor: unsafe { c_string_or(desc_ref.vendor, "Unknown") },
            version: unsafe { c_string_or(desc_ref.version, "0.0.0") },
        };

        log::info!(
            "Instrument: {} by {} (id: {}, version: {})",
            self.info.name,
            self.info.vendor,
            self.info.id,
            self.info.version
        );
        Ok(())
    }

    /// Create and initialize a plugin instance if none is held
    fn create_instance(&mut self) -> Result<(), HostError> {
        if !self.plugin.is_null() {
            return Ok(());
        }

        let factory_ref = unsafe { &*self.factory };
        let create_plugin_fn = factory_ref
            .create_plugin
            .ok_or(HostError::MissingSymbol("clap_plugin_factory.create_plugin"))?;
        let plugin = unsafe {
            create_plugin_fn(
                self.factory,
                self.host.as_ref() as *const ClapHost,
                self.plugin_id.as_ptr(),
            )
        };
        if plugin.is_null() {
            return Err(HostError::Handshake("failed to create plugin instance".to_string()));
        }

        let plugin_ref = unsafe { &*plugin };
        let initialized = match plugin_ref.init {
            Some(init_fn) => unsafe { init_fn(plugin) },
            None => false,
        };
        if !initialized {
            if let Some(destroy) = plugin_ref.destroy {
                unsafe { destroy(plugin) };
            }
            return Err(HostError::Handshake("plugin init() failed".to_string()));
        }

        self.plugin = plugin;
        log::info!("Created plugin instance: {}", self.info.name);
        Ok(())
    }

    /// Stop, deactivate and destroy the plugin instance
    fn destroy_instance(&mut self) {
        if self.plugin.is_null() {
            return;
        }
        self.close_editor();
        self.stop_processing();
        self.deactivate();

        let plugin_ref = unsafe { &*self.plugin };
        if let Some(destroy) = plugin_ref.destroy {
            unsafe { destroy(self.plugin) };
        }
        self.plugin = ptr::null();
        log::info!("Destroyed plugin instance: {}", self.info.name);
    }

    /// Activate the plugin for audio processing
    fn activate(&mut self, sample_rate: f64) -> Result<(), HostError> {
        if self.is_active {
            if self.sample_rate == sample_rate {
                return Ok(());
            }
            self.stop_processing();
            self.deactivate();
        }

        let plugin_ref = unsafe { &*self.plugin };
        let activate_fn = plugin_ref
            .activate
            .ok_or(HostError::MissingSymbol("clap_plugin.activate"))?;
        if !unsafe { activate_fn(self.plugin, sample_rate, 1, BLOCK_FRAMES) } {
            return Err(HostError::Handshake("plugin activate() failed".to_string()));
        }

        self.sample_rate = sample_rate;
        self.is_active = true;
        self.steady_time = 0;
        log::info!(
            "Plugin activated: {}Hz, max {} frames",
            sample_rate,
            BLOCK_FRAMES
        );
        Ok(())
    }

    fn deactivate(&mut self) {
        if !self.is_active {
            return;
        }
        let plugin_ref = unsafe { &*self.plugin };
        if let Some(deactivate) = plugin_ref.deactivate {
            unsafe { deactivate(self.plugin) };
        }
        self.is_active = false;
    }

    fn start_processing(&mut self) -> Result<(), HostError> {
        if !self.is_active {
            return Err(HostError::NotStarted);
        }
        if self.is_processing {
            return Ok(());
        }

        let plugin_ref = unsafe { &*self.plugin };
        if let Some(start_fn) = plugin_ref.start_processing {
            if !unsafe { start_fn(self.plugin) } {
                return Err(HostError::Handshake("plugin start_processing() failed".to_string()));
            }
        }
        self.is_processing = true;
        Ok(())
    }

    fn stop_processing(&mut self) {
        if !self.is_processing {
            return;
        }
        let plugin_ref = unsafe { &*self.plugin };
        if let Some(stop_fn) = plugin_ref.stop_processing {
            unsafe { stop_fn(self.plugin) };
        }
        self.is_processing = false;
    }

    /// Run one process call over the first `frames` frames of the output
    /// buffers, delivering and then clearing the queued events
    fn process(&mut self, frames: usize) -> Result<(), HostError> {
        let frames = frames.min(BLOCK_FRAMES as usize);

        // Never hand stale samples back to the caller
        for ch in &mut self.output_data {
            ch[..frames].fill(0.0);
        }
        for (ptr, ch) in self.input_ptrs.iter_mut().zip(self.input_data.iter_mut()) {
            *ptr = ch.as_mut_ptr();
        }
        for (ptr, ch) in self.output_ptrs.iter_mut().zip(self.output_data.iter_mut()) {
            *ptr = ch.as_mut_ptr();
        }

        let input_buffer = ClapAudioBuffer {
            data32: self.input_ptrs.as_mut_ptr(),
            data64: ptr::null_mut(),
            channel_count: CHANNELS as u32,
            latency: 0,
            constant_mask: u64::MAX,
        };
        let mut output_buffer = ClapAudioBuffer {
            data32: self.output_ptrs.as_mut_ptr(),
            data64: ptr::null_mut(),
            channel_count: CHANNELS as u32,
            latency: 0,
            constant_mask: 0,
        };

        let input_events = self.events.as_input_events();
        let output_events = ClapOutputEvents {
            ctx: ptr::null_mut(),
            try_push: Some(discard_output_events_push),
        };

        let process = ClapProcess {
            steady_time: self.steady_time,
            frames_count: frames as u32,
            transport: ptr::null(),
            audio_inputs: &input_buffer,
            audio_outputs: &mut output_buffer,
            audio_inputs_count: 1,
            audio_outputs_count: 1,
            in_events: &input_events,
            out_events: &output_events,
        };

        let plugin_ref = unsafe { &*self.plugin };
        let process_fn = plugin_ref
            .process
            .ok_or(HostError::MissingSymbol("clap_plugin.process"))?;
        let status = unsafe { process_fn(self.plugin, &process) };

        self.events.clear();
        self.steady_time += frames as i64;

        if take_callback_request() {
            if let Some(on_main_thread) = plugin_ref.on_main_thread {
                unsafe { on_main_thread(self.plugin) };
            }
        }

        if status == CLAP_PROCESS_ERROR {
            log::error!("{}: process() returned an error", self.info.name);
            return Err(HostError::ProcessFailed);
        }
        Ok(())
    }

    fn gui_extension(&self) -> Option<&ClapPluginGui> {
        if self.plugin.is_null() {
            return None;
        }
        let plugin_ref = unsafe { &*self.plugin };
        let get_ext = plugin_ref.get_extension?;
        let ext = unsafe { get_ext(self.plugin, CLAP_EXT_GUI.as_ptr() as *const c_char) };
        if ext.is_null() {
            None
        } else {
            Some(unsafe { &*(ext as *const ClapPluginGui) })
        }
    }

    /// Window API to create a floating editor with, if the plugin has one
    fn floating_api(&self, gui: &ClapPluginGui) -> Option<*const c_char> {
        if let Some(get_preferred_api) = gui.get_preferred_api {
            let mut api: *const c_char = ptr::null();
            let mut is_floating = false;
            let found = unsafe { get_preferred_api(self.plugin, &mut api, &mut is_floating) };
            if found && is_floating && !api.is_null() {
                return Some(api);
            }
        }
        let native = CLAP_WINDOW_API_NATIVE.as_ptr() as *const c_char;
        let supported = gui
            .is_api_supported
            .map(|f| unsafe { f(self.plugin, native, true) })
            .unwrap_or(false);
        supported.then_some(native)
    }

    pub fn has_editor(&self) -> bool {
        self.gui_extension().is_some()
    }

    pub fn is_editor_open(&self) -> bool {
        self.editor_open
    }

    /// Run a pending request_callback() outside of process(). Used while
    /// the editor is shown without audio running.
    pub fn service_main_thread(&mut self) {
        if self.plugin.is_null() || !take_callback_request() {
            return;
        }
        let plugin_ref = unsafe { &*self.plugin };
        if let Some(on_main_thread) = plugin_ref.on_main_thread {
            unsafe { on_main_thread(self.plugin) };
        }
    }

    pub fn close_editor(&mut self) {
        if !self.editor_open {
            return;
        }
        if let Some(gui) = self.gui_extension() {
            if let Some(hide) = gui.hide {
                unsafe { hide(self.plugin) };
            }
            if let Some(destroy) = gui.destroy {
                unsafe { destroy(self.plugin) };
            }
        }
        self.editor_open = false;
        log::info!("Editor closed");
    }

    pub fn info(&self) -> &PluginInfo {
        &self.info
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }
}

impl Instrument for ClapInstrument {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn start(&mut self, sample_rate: u32) -> Result<(), HostError> {
        let started = self
            .create_instance()
            .and_then(|_| self.activate(sample_rate as f64))
            .and_then(|_| self.start_processing());
        if let Err(e) = started {
            log::error!("{} failed to start: {}", self.info.name, e);
            // Release whatever part of the handshake succeeded
            self.stop();
            return Err(e);
        }
        log::info!("{} started at {}Hz", self.info.name, sample_rate);
        Ok(())
    }

    fn stop(&mut self) {
        if self.reset_on_start {
            self.destroy_instance();
        } else if !self.plugin.is_null() {
            self.stop_processing();
            self.deactivate();
        }
        self.events.clear();
        log::info!("{} stopped", self.info.name);
    }

    fn reset_instrument(&mut self, sysex: &[u8]) -> Result<(), HostError> {
        if self.plugin.is_null() || !self.is_active {
            return Err(HostError::NotStarted);
        }
        log::debug!("Resetting {} with {} byte message", self.info.name, sysex.len());

        self.stop_processing();
        let plugin_ref = unsafe { &*self.plugin };
        if let Some(reset) = plugin_ref.reset {
            unsafe { reset(self.plugin) };
        }
        self.start_processing()?;

        // CLAP only accepts events inside process(); the block it renders is thrown away
        self.events.clear();
        self.events.push_sysex(sysex, 0);
        self.process(BLOCK_FRAMES as usize)?;

        std::thread::sleep(RESET_SETTLE);
        for ch in &mut self.output_data {
            ch.fill(0.0);
        }
        Ok(())
    }

    fn render_block(&mut self, messages: &[u32], output: &mut [f32]) -> Result<(), HostError> {
        if self.plugin.is_null() || !self.is_processing {
            return Err(HostError::NotStarted);
        }
        for &message in messages {
            self.events.push_packed(message, 0);
        }
        if output.is_empty() {
            // Held back until audio is next requested
            return Ok(());
        }

        for chunk in output.chunks_mut(BLOCK_FRAMES as usize * CHANNELS) {
            let frames = chunk.len() / CHANNELS;
            if frames == 0 {
                continue;
            }
            self.process(frames)?;
            for (i, frame) in chunk.chunks_exact_mut(CHANNELS).enumerate() {
                frame[0] = self.output_data[0][i];
                frame[1] = self.output_data[1][i];
            }
        }
        Ok(())
    }

    fn show_editor(&mut self) -> Result<(), HostError> {
        self.create_instance()?;
        let gui = self.gui_extension().ok_or(HostError::NoEditor)?;

        if self.editor_open {
            if let Some(show) = gui.show {
                unsafe { show(self.plugin) };
            }
            return Ok(());
        }

        let api = self.floating_api(gui).ok_or(HostError::NoEditor)?;
        let create = gui.create.ok_or(HostError::NoEditor)?;
        if !unsafe { create(self.plugin, api, true) } {
            return Err(HostError::Handshake("editor create() failed".to_string()));
        }
        if let Some(suggest_title) = gui.suggest_title {
            if let Ok(title) = CString::new(self.info.name.as_bytes()) {
                unsafe { suggest_title(self.plugin, title.as_ptr()) };
            }
        }
        let shown = gui.show.map(|show| unsafe { show(self.plugin) }).unwrap_or(false);
        if !shown {
            if let Some(destroy) = gui.destroy {
                unsafe { destroy(self.plugin) };
            }
            return Err(HostError::Handshake("editor show() failed".to_string()));
        }

        self.editor_open = true;
        log::info!("Editor opened for {}", self.info.name);
        Ok(())
    }
}

impl Drop for ClapInstrument {
    fn drop(&mut self) {
        log::info!("Unloading instrument: {:?}", self.path);

        self.destroy_instance();

        let entry_ref = unsafe { &*self.entry };
        if let Some(deinit) = entry_ref.deinit {
            unsafe { deinit() };
        }

        log::info!("Instrument unloaded");
    }
}

/// Read a possibly null C string from a descriptor
unsafe fn c_string_or(ptr: *const c_char, default: &str) -> String {
    if ptr.is_null() {
        default.to_string()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

/// Locate the loadable binary for a plugin path.
///
/// On macOS a `.clap` is a bundle directory with the binary in
/// `Contents/MacOS`; elsewhere the path is the shared library itself.
fn resolve_binary_path(path: &Path) -> PathBuf {
    let macos_dir = path.join("Contents").join("MacOS");
    if !macos_dir.is_dir() {
        return path.to_path_buf();
    }

    if let Some(stem) = path.file_stem() {
        let binary = macos_dir.join(stem);
        if binary.is_file() {
            return binary;
        }
    }

    // Bundle name can differ from the binary name
    if let Ok(entries) = std::fs::read_dir(&macos_dir) {
        for entry in entries.flatten() {
            let candidate = entry.path();
            if candidate.extension().is_none() && candidate.is_file() {
                log::info!("Found plugin binary via scan: {:?}", candidate);
                return candidate;
            }
        }
    }
    path.to_path_buf()
}

// =============================================================================
// Host Callbacks
// =============================================================================

unsafe extern "C" fn host_get_extension(
    _host: *const ClapHost,
    extension_id: *const c_char,
) -> *const std::ffi::c_void {
    if extension_id.is_null() {
        return ptr::null();
    }

    let ext_id = CStr::from_ptr(extension_id);
    if ext_id.to_bytes_with_nul() == CLAP_EXT_PARAMS {
        return &HOST_PARAMS as *const ClapHostParams as *const std::ffi::c_void;
    }

    log::debug!("Plugin asked for unsupported host extension {:?}", ext_id);
    ptr::null()
}

// Static host params extension instance
static HOST_PARAMS: ClapHostParams = ClapHostParams {
    rescan: Some(host_params_rescan),
    clear: Some(host_params_clear),
    request_flush: Some(host_params_request_flush),
};

unsafe extern "C" fn host_params_rescan(_host: *const ClapHost, _flags: u32) {
    log::debug!("Plugin requested param rescan");
}

unsafe extern "C" fn host_params_clear(_host: *const ClapHost, _param_id: u32, _flags: u32) {
    log::debug!("Plugin requested param clear");
}

unsafe extern "C" fn host_params_request_flush(_host: *const ClapHost) {
    // Parameters are picked up by the next process() call
    log::debug!("Plugin requested param flush");
}

unsafe extern "C" fn host_request_restart(_host: *const ClapHost) {
    log::debug!("Plugin requested restart");
}

unsafe extern "C" fn host_request_process(_host: *const ClapHost) {
    log::debug!("Plugin requested process");
}

unsafe extern "C" fn host_request_callback(_host: *const ClapHost) {
    log::debug!("Plugin requested callback");
    CALLBACK_REQUESTED.store(true, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("smfsynth-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_load_missing_library() {
        let result = ClapInstrument::load(Path::new("/nonexistent/Missing.clap"), false);
        assert!(matches!(result, Err(HostError::Library(_))));
    }

    #[test]
    fn test_load_rejects_non_library() {
        let path = temp_path("garbage.clap");
        std::fs::write(&path, b"not a shared library").unwrap();
        let result = ClapInstrument::load(&path, true);
        assert!(matches!(result, Err(HostError::Library(_))));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_resolve_plain_file() {
        let path = Path::new("/usr/lib/clap/Synth.clap");
        assert_eq!(resolve_binary_path(path), path.to_path_buf());
    }

    #[test]
    fn test_resolve_bundle_layout() {
        let root = temp_path("bundle");
        let bundle = root.join("Synth.clap");
        let macos_dir = bundle.join("Contents").join("MacOS");
        std::fs::create_dir_all(&macos_dir).unwrap();
        std::fs::write(macos_dir.join("SynthBinary"), b"").unwrap();

        // Falls back to scanning when the binary name differs from the bundle
        assert_eq!(resolve_binary_path(&bundle), macos_dir.join("SynthBinary"));

        // A binary named after the bundle wins over the scan
        std::fs::write(macos_dir.join("Synth"), b"").unwrap();
        assert_eq!(resolve_binary_path(&bundle), macos_dir.join("Synth"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_callback_request_is_taken_once() {
        unsafe { host_request_callback(ptr::null()) };
        assert!(take_callback_request());
        assert!(!take_callback_request());
    }

    #[test]
    fn test_host_offers_params_extension() {
        unsafe {
            let params = host_get_extension(ptr::null(), CLAP_EXT_PARAMS.as_ptr() as *const c_char);
            assert!(!params.is_null());
            let gui = host_get_extension(ptr::null(), CLAP_EXT_GUI.as_ptr() as *const c_char);
            assert!(gui.is_null());
        }
    }
}
