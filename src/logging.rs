//! Logging to stderr and a log file
//!
//! `env_logger` filters with `RUST_LOG` (default `info`); every record is
//! written to stderr and appended to `smfsynth.log` in the user's local data
//! directory.

use once_cell::sync::Lazy;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

static LOG_PATH: Lazy<PathBuf> = Lazy::new(|| {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("smfsynth")
        .join("logs")
        .join("smfsynth.log")
});

/// Location of the log file
pub fn log_file_path() -> PathBuf {
    LOG_PATH.clone()
}

/// Copies everything written to stderr and, if it could be opened, the log file
struct Tee {
    file: Option<File>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = self.file.as_mut() {
            let _ = file.write_all(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

fn open_log_file() -> Option<File> {
    if let Some(parent) = LOG_PATH.parent() {
        let _ = fs::create_dir_all(parent);
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&*LOG_PATH)
        .ok()
}

/// Install the global logger. Calling it again has no effect.
pub fn init_logging() {
    let target = Tee {
        file: open_log_file(),
    };
    let result = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(target)))
        .try_init();

    if result.is_ok() {
        log::info!("smfsynth {} started", env!("CARGO_PKG_VERSION"));
    }
}

/// Truncate the log file
pub fn clear_log_file() -> io::Result<()> {
    if LOG_PATH.exists() {
        fs::write(&*LOG_PATH, "")?;
    }
    log::info!("Log file cleared");
    Ok(())
}

/// Size of the log file in bytes, 0 if it does not exist yet
pub fn log_file_size() -> u64 {
    fs::metadata(&*LOG_PATH).map(|m| m.len()).unwrap_or(0)
}
