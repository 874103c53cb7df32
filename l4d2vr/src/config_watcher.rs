// Live reload for the config file.
//
// The watcher thread wakes on directory change notifications (or a timeout),
// and the poller decides whether the file actually changed by comparing the
// modification time against the last one it parsed.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, SystemTime},
};

use notify::{RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use crate::{
    error::ConfigError,
    vr_config::{self, LiveConfig, LoadReport},
};

const SETTLE_DELAY: Duration = Duration::from_millis(100);
const NOTIFY_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug)]
pub enum PollResult {
    Unchanged,
    Reloaded(LoadReport),
    Failed(ConfigError),
    /// The file is gone; the watcher stops for good
    Vanished,
}

pub struct ConfigPoller {
    path: PathBuf,
    last_modified: Option<SystemTime>,
    reload_count: u32,
}

impl ConfigPoller {
    pub fn new(path: &Path) -> ConfigPoller {
        ConfigPoller {
            path: path.to_path_buf(),
            last_modified: None,
            reload_count: 0,
        }
    }

    /// Starts from an already-loaded file, so the first poll only reloads on a newer timestamp
    pub fn primed(path: &Path) -> ConfigPoller {
        let mut poller = ConfigPoller::new(path);
        poller.last_modified = fs::metadata(path).and_then(|m| m.modified()).ok();
        poller
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of times the file has been parsed
    pub fn reload_count(&self) -> u32 {
        self.reload_count
    }

    pub fn poll(&mut self) -> PollResult {
        let modified = match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return PollResult::Vanished,
            Err(source) => {
                return PollResult::Failed(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if self.last_modified.map_or(false, |last| modified <= last) {
            return PollResult::Unchanged;
        }

        // Record the timestamp even when parsing fails, so a broken file is not re-read every tick
        self.last_modified = Some(modified);
        self.reload_count += 1;

        match vr_config::load(&self.path) {
            Ok(report) => PollResult::Reloaded(report),
            Err(err) => PollResult::Failed(err),
        }
    }
}

///
/// Background thread that keeps a LiveConfig in sync with the file on disk.
///
pub struct ConfigWatcher {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl ConfigWatcher {
    pub fn spawn(poller: ConfigPoller, live: LiveConfig) -> Result<ConfigWatcher, ConfigError> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();

        let handle = thread::Builder::new()
            .name("config-watcher".to_owned())
            .spawn(move || watch_loop(poller, live, thread_stop))
            .map_err(|source| ConfigError::Io {
                path: PathBuf::new(),
                source,
            })?;

        Ok(ConfigWatcher {
            handle: Some(handle),
            stop,
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    /// Asks the thread to exit and waits for it
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("config watcher thread panicked");
            }
        }
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn watch_loop(mut poller: ConfigPoller, live: LiveConfig, stop: Arc<AtomicBool>) {
    let (tx, rx) = mpsc::channel::<notify::Result<notify::Event>>();

    // Without notifications the loop still re-checks on every timeout
    let _watcher = match notify::recommended_watcher(tx).and_then(|mut watcher| {
        let dir = poller
            .path()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        Ok(watcher)
    }) {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            warn!("{}; falling back to timed polling", ConfigError::Watch(err));
            None
        }
    };

    info!("watching config file {:?}", poller.path());

    while !stop.load(Ordering::Relaxed) {
        match poller.poll() {
            PollResult::Unchanged => {}
            PollResult::Reloaded(report) => {
                info!("reloaded config from {:?}", poller.path());
                live.replace(report.config);
            }
            PollResult::Failed(err) => {
                warn!("config reload failed, keeping previous values: {err}");
            }
            PollResult::Vanished => {
                error!(
                    "config file {:?} not found, no longer watching for changes",
                    poller.path()
                );
                return;
            }
        }

        match rx.recv_timeout(NOTIFY_TIMEOUT) {
            Ok(Ok(event)) => debug!("config directory event: {:?}", event.kind),
            Ok(Err(err)) => warn!("config watch error: {err}"),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => thread::sleep(NOTIFY_TIMEOUT),
        }

        // Let the writer finish before reading
        thread::sleep(SETTLE_DELAY);
    }
}
