use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Maximum log file size before rotation (5 MB)
const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;
/// Size to keep after rotation (1 MB of most recent logs)
const KEEP_SIZE: u64 = 1024 * 1024;

const LOG_FILE: &str = "stoltrade.log";

/// Trim the log file to its most recent `keep` bytes once it grows past `max`.
fn rotate_log_if_needed(log_path: &Path, max: u64, keep: u64) -> std::io::Result<()> {
    if !log_path.exists() {
        return Ok(());
    }

    let file_size = fs::metadata(log_path)?.len();
    if file_size <= max {
        return Ok(());
    }

    let mut file = File::open(log_path)?;
    file.seek(SeekFrom::Start(file_size.saturating_sub(keep)))?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    drop(file);

    // Drop the partial first line
    let skip = buffer
        .iter()
        .position(|&b| b == b'\n')
        .map_or(0, |i| i + 1);

    let mut file = File::create(log_path)?;
    file.write_all(b"--- Log rotated (older entries removed) ---\n")?;
    file.write_all(&buffer[skip..])?;
    Ok(())
}

/// Initialize logging to `{log_dir}/stoltrade.log`.
///
/// The filter comes from `RUST_LOG` when set, otherwise from `level` for both
/// crates. Writes go through a background worker; keep the returned guard
/// alive until exit so buffered lines are flushed.
pub fn init_logging(log_dir: &Path, level: &str) -> color_eyre::Result<WorkerGuard> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(LOG_FILE);

    if let Err(e) = rotate_log_if_needed(&log_path, MAX_LOG_SIZE, KEEP_SIZE) {
        eprintln!("Warning: Failed to rotate log file: {e}");
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let default_filter = format!("stoltrade={level},stoltrade_core={level}");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .try_init()?;

    tracing::info!(log_path = %log_path.display(), "stoltrade logging initialized");
    Ok(guard)
}
