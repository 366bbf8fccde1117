//! Running the patcher in the background and observing its outcome.
//!
//! A [`PatchSession`] runs [`IndexPatcher::patch`] once on a dedicated worker
//! thread. The outcome is published exactly once to a shared
//! [`PatchStatusCell`]; any number of threads may poll it. `Ready` is only
//! published after the merged index has been written and renamed into place,
//! so a reader that observes `Ready` can open the output immediately.

use crate::error::Result;
use crate::patcher::{IndexPatcher, PatchReport};
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Sleep between status checks in [`PatchSession::wait`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long a caller of [`PatchSession::redirect_target`] should be prepared
/// to wait.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

const WORKER_THREAD_NAME: &str = "replicant-patch";

/// Outcome of a patch run as seen by pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PatchStatus {
    /// Still running, or never became ready within a wait.
    Incomplete = 0,
    /// The merged index is on disk.
    Ready = 1,
    /// The run failed; the game should keep using its own index.
    Error = 2,
}

impl PatchStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => PatchStatus::Incomplete,
            1 => PatchStatus::Ready,
            _ => PatchStatus::Error,
        }
    }

    pub fn is_final(self) -> bool {
        self != PatchStatus::Incomplete
    }
}

/// Single-writer status slot.
#[derive(Debug)]
pub struct PatchStatusCell(AtomicU8);

impl Default for PatchStatusCell {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchStatusCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(PatchStatus::Incomplete as u8))
    }

    pub fn get(&self) -> PatchStatus {
        PatchStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move from `Incomplete` to a final status.
    ///
    /// Returns `false` if a status was already published or `status` is
    /// `Incomplete`.
    pub fn publish(&self, status: PatchStatus) -> bool {
        if !status.is_final() {
            return false;
        }
        self.0
            .compare_exchange(
                PatchStatus::Incomplete as u8,
                status as u8,
                Ordering::Release,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    /// Poll until a final status is published or `timeout` elapses.
    ///
    /// Returns `Incomplete` on timeout. A timeout too large to represent as a
    /// deadline waits without limit.
    pub fn wait(&self, timeout: Duration, interval: Duration) -> PatchStatus {
        let status = self.get();
        if status.is_final() {
            return status;
        }

        let deadline = Instant::now().checked_add(timeout);
        loop {
            let sleep_for = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return PatchStatus::Incomplete;
                    }
                    interval.min(deadline - now)
                }
                None => interval,
            };
            std::thread::sleep(sleep_for);

            let status = self.get();
            if status.is_final() {
                return status;
            }
        }
    }
}

/// Publishes `Error` when the worker exits without publishing, e.g. on panic.
struct PublishOnExit(Arc<PatchStatusCell>);

impl Drop for PublishOnExit {
    fn drop(&mut self) {
        if self.0.publish(PatchStatus::Error) {
            tracing::error!("Patch worker exited without publishing a status");
        }
    }
}

/// One background patch run.
pub struct PatchSession {
    status: Arc<PatchStatusCell>,
    output_path: Utf8PathBuf,
    has_mods: bool,
    handle: Option<JoinHandle<Option<PatchReport>>>,
}

impl PatchSession {
    /// Start patching on a worker thread.
    ///
    /// With no mods the status is `Ready` immediately and nothing is read or
    /// written.
    pub fn start(patcher: IndexPatcher) -> Result<Self> {
        let status = Arc::new(PatchStatusCell::new());
        let output_path = patcher.output_path().to_path_buf();
        let has_mods = !patcher.mods().is_empty();

        if !has_mods {
            tracing::info!("No mods supplied, keeping the game's index");
            status.publish(PatchStatus::Ready);
            return Ok(Self {
                status,
                output_path,
                has_mods,
                handle: None,
            });
        }

        let worker_status = Arc::clone(&status);
        let handle = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let guard = PublishOnExit(worker_status);
                match patcher.patch() {
                    Ok(report) => {
                        guard.0.publish(PatchStatus::Ready);
                        Some(report)
                    }
                    Err(err) => {
                        tracing::error!("Patch failed: {}", err);
                        guard.0.publish(PatchStatus::Error);
                        None
                    }
                }
            })?;

        Ok(Self {
            status,
            output_path,
            has_mods,
            handle: Some(handle),
        })
    }

    pub fn status(&self) -> PatchStatus {
        self.status.get()
    }

    /// Shared handle for pollers on other threads.
    pub fn status_cell(&self) -> Arc<PatchStatusCell> {
        Arc::clone(&self.status)
    }

    pub fn wait(&self, timeout: Duration) -> PatchStatus {
        self.status.wait(timeout, DEFAULT_POLL_INTERVAL)
    }

    /// Path the game's index lookup should be redirected to.
    ///
    /// `None` unless at least one mod was supplied and the run became `Ready`
    /// within `timeout`.
    pub fn redirect_target(&self, timeout: Duration) -> Option<&Utf8Path> {
        if !self.has_mods {
            return None;
        }
        match self.wait(timeout) {
            PatchStatus::Ready => Some(&self.output_path),
            status => {
                tracing::warn!("Not redirecting index lookups, patch status {:?}", status);
                None
            }
        }
    }

    /// Wait for the worker and take its report.
    pub fn join(mut self) -> Option<PatchReport> {
        let handle = self.handle.take()?;
        handle.join().ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patcher::tests::{init_tracing, utf8_dir, write_base, write_mod};
    use crate::ModDescriptor;

    #[test]
    fn test_publish_once() {
        let cell = PatchStatusCell::new();
        assert_eq!(cell.get(), PatchStatus::Incomplete);
        assert!(!cell.publish(PatchStatus::Incomplete));

        assert!(cell.publish(PatchStatus::Ready));
        assert!(!cell.publish(PatchStatus::Error));
        assert_eq!(cell.get(), PatchStatus::Ready);
    }

    #[test]
    fn test_wait_times_out_while_incomplete() {
        let cell = PatchStatusCell::new();
        let start = Instant::now();
        let status = cell.wait(Duration::from_millis(30), Duration::from_millis(5));
        assert_eq!(status, PatchStatus::Incomplete);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_wait_with_unbounded_timeout() {
        let cell = PatchStatusCell::new();
        cell.publish(PatchStatus::Ready);
        assert_eq!(
            cell.wait(Duration::MAX, DEFAULT_POLL_INTERVAL),
            PatchStatus::Ready
        );

        let cell = Arc::new(PatchStatusCell::new());
        let writer = Arc::clone(&cell);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            writer.publish(PatchStatus::Error);
        });
        let status = cell.wait(Duration::MAX, Duration::from_millis(1));
        handle.join().unwrap();
        assert_eq!(status, PatchStatus::Error);
    }

    #[test]
    fn test_wait_sees_publish_from_other_thread() {
        let cell = Arc::new(PatchStatusCell::new());
        let writer = Arc::clone(&cell);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            writer.publish(PatchStatus::Error);
        });

        let status = cell.wait(Duration::from_secs(5), Duration::from_millis(1));
        handle.join().unwrap();
        assert_eq!(status, PatchStatus::Error);
    }

    #[test]
    fn test_empty_mod_list_is_ready_without_io() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8_dir(&dir);

        let session = PatchSession::start(IndexPatcher::for_game_root(&root)).unwrap();
        assert_eq!(session.status(), PatchStatus::Ready);
        assert_eq!(session.redirect_target(Duration::ZERO), None);
        assert!(!root.join("LunarTear").exists());
        assert!(session.join().is_none());
    }

    #[test]
    fn test_missing_base_publishes_error() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let root = utf8_dir(&dir);

        let mut patcher = IndexPatcher::for_game_root(&root);
        patcher.set_mods(vec![ModDescriptor::from_mod_dir("m", &root.join("mods/m"))]);
        let session = PatchSession::start(patcher).unwrap();

        assert_eq!(session.wait(Duration::from_secs(10)), PatchStatus::Error);
        assert_eq!(session.redirect_target(Duration::ZERO), None);
        assert!(session.join().is_none());
    }

    #[test]
    fn test_corrupted_mod_still_publishes_ready() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let root = utf8_dir(&dir);
        write_base(&root, &[("a.dat", 0)]);
        let good = write_mod(&root, "good", &[("a.dat", 12)]);

        let bad_dir = root.join("mods/bad");
        std::fs::create_dir_all(&bad_dir).unwrap();
        std::fs::write(bad_dir.join("info.arc"), [0xFFu8; 64]).unwrap();
        let bad = ModDescriptor::from_mod_dir("bad", &bad_dir);

        let mut patcher = IndexPatcher::for_game_root(&root);
        patcher.set_mods(vec![bad, good]);
        let session = PatchSession::start(patcher).unwrap();

        assert_eq!(session.wait(Duration::from_secs(10)), PatchStatus::Ready);
        let report = session.join().unwrap();
        assert_eq!(report.merged_mods, vec!["good"]);
        assert_eq!(report.skipped_mods[0].id, "bad");
    }

    #[test]
    fn test_successful_run_redirects_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8_dir(&dir);
        write_base(&root, &[("a.dat", 0)]);
        let descriptor = write_mod(&root, "m1", &[("a.dat", 12)]);

        let mut patcher = IndexPatcher::for_game_root(&root);
        patcher.set_mods(vec![descriptor]);
        let session = PatchSession::start(patcher).unwrap();

        let target = session
            .redirect_target(Duration::from_secs(10))
            .map(Utf8Path::to_path_buf);
        assert_eq!(target, Some(root.join("LunarTear/LunarTear.arc")));
        assert!(root.join("LunarTear/LunarTear.arc").is_file());

        let report = session.join().unwrap();
        assert_eq!(report.merged_mods, vec!["m1"]);
    }
}
