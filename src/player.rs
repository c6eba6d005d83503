use std::fs::{self, OpenOptions};
use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde_json::json;

#[cfg(any(unix, target_os = "windows"))]
use rand::{distributions::Alphanumeric, Rng};
#[cfg(unix)]
use std::os::unix::net::UnixStream;

use crate::feed::FeedItem;

fn video_debug_enabled() -> bool {
    static FLAG: OnceCell<bool> = OnceCell::new();
    *FLAG.get_or_init(|| {
        std::env::var("REEL_DEBUG_VIDEO")
            .map(|val| {
                let trimmed = val.trim();
                !(trimmed.is_empty()
                    || trimmed.eq_ignore_ascii_case("0")
                    || trimmed.eq_ignore_ascii_case("false")
                    || trimmed.eq_ignore_ascii_case("no")
                    || trimmed.eq_ignore_ascii_case("off"))
            })
            .unwrap_or(false)
    })
}

fn video_debug_writer() -> Option<&'static Mutex<std::fs::File>> {
    static WRITER: OnceCell<Option<Mutex<std::fs::File>>> = OnceCell::new();
    WRITER
        .get_or_init(|| {
            std::env::var("REEL_DEBUG_VIDEO_LOG")
                .ok()
                .and_then(|path| {
                    OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(path)
                        .map(Mutex::new)
                        .ok()
                })
        })
        .as_ref()
}

pub fn debug_log(message: impl AsRef<str>) {
    if !video_debug_enabled() {
        return;
    }
    if let Some(writer) = video_debug_writer() {
        let mut file = writer.lock();
        let _ = writeln!(file, "{}", message.as_ref());
        return;
    }
    eprintln!("{}", message.as_ref());
}

/// Lifecycle of one embedded player bound to one slide position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No live player behind the handle (not yet started, or failed for good).
    Unloaded,
    Loading,
    Ready,
    Playing,
    Paused,
}

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("inline player controls are not supported on this platform")]
    Unsupported,
    #[error("player IPC endpoint unavailable: {0}")]
    Unreachable(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    Play,
    Pause,
    Rewind,
    SetVolume(u8),
    SetMuted(bool),
}

/// Terminal-cell rectangle a player renders into, plus its pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlideLayout {
    pub col: u16,
    pub row: u16,
    pub cols: i32,
    pub rows: i32,
    pub pixel_width: i32,
    pub pixel_height: i32,
}

/// Opaque handle to one embedded player. Created and destroyed by the
/// registry only; commands against a handle that is not `Ready` yet are
/// inert rather than errors, so a slide whose player never loads stays
/// harmless.
pub trait PlayerHandle {
    fn state(&self) -> PlayerState;
    /// Drives `Loading -> Ready` and detects a dead player. Called from the
    /// event-loop tick.
    fn poll(&mut self) -> PlayerState;
    fn play(&mut self) -> Result<(), ControlError>;
    fn pause(&mut self) -> Result<(), ControlError>;
    fn rewind(&mut self) -> Result<(), ControlError>;
    fn set_volume(&mut self, percent: u8) -> Result<(), ControlError>;
    fn set_muted(&mut self, muted: bool) -> Result<(), ControlError>;
}

/// Injected capability that produces players. The registry never talks to
/// mpv (or any other engine) directly.
pub trait PlayerFactory {
    fn spawn(&self, item: &FeedItem, layout: SlideLayout) -> Result<Box<dyn PlayerHandle>>;
}

pub const MAX_VOLUME: u8 = 100;

fn push_http_headers(args: &mut Vec<String>) {
    let ua = std::env::var("REEL_MPV_USER_AGENT").unwrap_or_else(|_| {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36"
            .to_string()
    });
    args.push(format!("--http-header-fields=User-Agent: {}", ua));
    if let Ok(referer) = std::env::var("REEL_MPV_REFERER") {
        if !referer.trim().is_empty() {
            args.push(format!("--http-header-fields=Referer: {}", referer.trim()));
        }
    } else {
        args.push("--http-header-fields=Referer: https://noticias.lat/".to_string());
    }
}

#[derive(Debug, Clone)]
pub struct MpvFactory {
    pub mpv_path: String,
    pub loop_videos: bool,
}

impl MpvFactory {
    pub fn new(mpv_path: impl Into<String>, loop_videos: bool) -> Self {
        Self {
            mpv_path: mpv_path.into(),
            loop_videos,
        }
    }
}

impl PlayerFactory for MpvFactory {
    fn spawn(&self, item: &FeedItem, layout: SlideLayout) -> Result<Box<dyn PlayerHandle>> {
        let player = MpvPlayer::spawn(SpawnOptions {
            mpv_path: &self.mpv_path,
            url: &item.video_url,
            title: &item.title,
            loop_video: self.loop_videos,
            layout,
        })?;
        Ok(Box::new(player))
    }
}

struct SpawnOptions<'a> {
    mpv_path: &'a str,
    url: &'a str,
    title: &'a str,
    loop_video: bool,
    layout: SlideLayout,
}

/// One inline mpv process rendered over the slide area through the kitty
/// graphics protocol, commanded over its JSON IPC socket. The watchdog
/// thread owns the child; the handle owns a kill channel and the IPC path.
pub struct MpvPlayer {
    state: PlayerState,
    kill_tx: Sender<()>,
    status_rx: Receiver<Result<ExitStatus>>,
    handle: Option<thread::JoinHandle<()>>,
    ipc_path: Option<Arc<String>>,
}

impl MpvPlayer {
    fn spawn(opts: SpawnOptions<'_>) -> Result<Self> {
        if opts.url.trim().is_empty() {
            return Err(anyhow!("video URL missing"));
        }

        let (kill_tx, kill_rx) = bounded::<()>(1);
        let (status_tx, status_rx) = bounded::<Result<ExitStatus>>(1);

        let mpv_path = opts.mpv_path.to_string();
        let url = opts.url.to_string();
        let title = opts.title.to_string();
        let loop_video = opts.loop_video;
        let layout = opts.layout;
        let debug_enabled = video_debug_enabled();
        #[cfg(any(unix, target_os = "windows"))]
        let ipc_path = unique_ipc_path();
        #[cfg(all(not(unix), not(target_os = "windows")))]
        let ipc_path: Option<String> = None;
        let ipc_path_for_handle = ipc_path.clone();
        debug_log(format!(
            "spawning inline mpv cells={}x{}@{},{} pixels={}x{} url={} ipc={}",
            layout.cols,
            layout.rows,
            layout.col,
            layout.row,
            layout.pixel_width,
            layout.pixel_height,
            url,
            ipc_path.as_deref().unwrap_or("n/a")
        ));
        #[cfg(unix)]
        if let Some(path) = &ipc_path {
            if let Err(err) = fs::remove_file(path) {
                if err.kind() != std::io::ErrorKind::NotFound && video_debug_enabled() {
                    debug_log(format!("failed to remove stale mpv ipc path {path}: {err}"));
                }
            }
        }
        let ipc_arg = ipc_path
            .as_ref()
            .map(|path| format!("--input-ipc-server={path}"));
        let handle = thread::spawn(move || {
            let ipc_cleanup = ipc_path.clone();
            let result = (|| -> Result<ExitStatus> {
                let mut args = Vec::new();
                args.push(url.clone());
                args.push("--vo=kitty".to_string());
                args.push(format!("--vo-kitty-cols={}", layout.cols.max(1)));
                args.push(format!("--vo-kitty-rows={}", layout.rows.max(1)));
                let left = u32::from(layout.col).saturating_add(1);
                let top = u32::from(layout.row).saturating_add(1);
                args.push(format!("--vo-kitty-left={}", left));
                args.push(format!("--vo-kitty-top={}", top));
                args.push(format!("--vo-kitty-width={}", layout.pixel_width.max(1)));
                args.push(format!("--vo-kitty-height={}", layout.pixel_height.max(1)));
                args.push("--vo-kitty-config-clear=no".to_string());
                // Spawned armed: paused and muted until the feed makes the
                // slide active, so a preloaded neighbour never makes noise.
                args.push("--pause".to_string());
                args.push("--mute=yes".to_string());
                args.push("--force-window=no".to_string());
                args.push("--keep-open=yes".to_string());
                if loop_video {
                    args.push("--loop-file=inf".to_string());
                }
                args.push("--really-quiet".to_string());
                args.push("--idle=no".to_string());
                args.push("--terminal=no".to_string());
                args.push("--input-terminal=no".to_string());
                args.push("--no-config".to_string());
                args.push("--ytdl=no".to_string());
                args.push("--osc=no".to_string());
                args.push("--osd-level=0".to_string());
                args.push("--osd-duration=0".to_string());
                if let Some(arg) = &ipc_arg {
                    args.push(arg.clone());
                }

                if !title.is_empty() {
                    args.push(format!("--force-media-title={}", title));
                }

                push_http_headers(&mut args);

                if debug_enabled {
                    debug_log(format!("mpv args: {:?}", args));
                }

                let mut command = Command::new(&mpv_path);
                for arg in &args {
                    command.arg(arg);
                }

                command.stdin(Stdio::null());
                #[cfg(unix)]
                {
                    use std::os::unix::io::{AsRawFd, FromRawFd};

                    let stdout = std::io::stdout();
                    let fd = stdout.as_raw_fd();
                    let dup_fd = unsafe { libc::dup(fd) };
                    if dup_fd >= 0 {
                        let stdio = unsafe { Stdio::from_raw_fd(dup_fd) };
                        command.stdout(stdio);
                    } else {
                        command.stdout(Stdio::inherit());
                    }
                }
                #[cfg(not(unix))]
                {
                    command.stdout(Stdio::inherit());
                }
                command.stderr(Stdio::null());

                let mut child = command
                    .spawn()
                    .with_context(|| format!("launch mpv to play {}", url))?;

                loop {
                    if kill_rx.try_recv().is_ok() {
                        let _ = child.kill();
                        let status = child.wait().context("wait for mpv after stop request")?;
                        if debug_enabled {
                            debug_log(format!("mpv stopped with status {:?}", status.code()));
                        }
                        return Ok(status);
                    }

                    match child.try_wait() {
                        Ok(Some(status)) => {
                            if debug_enabled {
                                debug_log(format!("mpv exited with status {:?}", status.code()));
                            }
                            return Ok(status);
                        }
                        Ok(None) => thread::sleep(Duration::from_millis(30)),
                        Err(err) => {
                            return Err(anyhow!(err)).context("poll mpv status");
                        }
                    }
                }
            })();
            #[cfg(unix)]
            if let Some(path) = ipc_cleanup {
                cleanup_ipc_path(&path);
            }
            #[cfg(not(unix))]
            let _ = ipc_cleanup;

            let _ = status_tx.send(result);
        });

        Ok(Self {
            state: PlayerState::Loading,
            kill_tx,
            status_rx,
            handle: Some(handle),
            ipc_path: ipc_path_for_handle.map(Arc::new),
        })
    }

    fn finalize(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn process_exited(&mut self) -> bool {
        match self.status_rx.try_recv() {
            Ok(_) => {
                self.finalize();
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.finalize();
                true
            }
        }
    }

    /// mpv has no readiness callback over one-way IPC; the socket accepting
    /// a connection is the earliest observable signal that its event loop
    /// is up.
    fn ipc_reachable(&self) -> bool {
        match &self.ipc_path {
            Some(path) => ipc_endpoint_reachable(path),
            None => false,
        }
    }

    fn send(&self, command: PlayerCommand) -> Result<(), ControlError> {
        let Some(path) = &self.ipc_path else {
            return Err(ControlError::Unsupported);
        };
        let payload = json!({
            "command": command_payload(command),
        });
        let serialized = serde_json::to_string(&payload)
            .map_err(|err| ControlError::Unreachable(err.to_string()))?;
        send_ipc_command(path, &serialized)
    }

    fn command(&mut self, command: PlayerCommand, on_ok: PlayerState) -> Result<(), ControlError> {
        match self.state {
            PlayerState::Unloaded | PlayerState::Loading => Ok(()),
            _ => {
                self.send(command)?;
                self.state = on_ok;
                Ok(())
            }
        }
    }
}

impl PlayerHandle for MpvPlayer {
    fn state(&self) -> PlayerState {
        self.state
    }

    fn poll(&mut self) -> PlayerState {
        if self.state != PlayerState::Unloaded && self.process_exited() {
            self.state = PlayerState::Unloaded;
        } else if self.state == PlayerState::Loading && self.ipc_reachable() {
            self.state = PlayerState::Ready;
        }
        self.state
    }

    fn play(&mut self) -> Result<(), ControlError> {
        self.command(PlayerCommand::Play, PlayerState::Playing)
    }

    fn pause(&mut self) -> Result<(), ControlError> {
        self.command(PlayerCommand::Pause, PlayerState::Paused)
    }

    fn rewind(&mut self) -> Result<(), ControlError> {
        let state = self.state;
        self.command(PlayerCommand::Rewind, state)
    }

    fn set_volume(&mut self, percent: u8) -> Result<(), ControlError> {
        let state = self.state;
        self.command(PlayerCommand::SetVolume(percent.min(MAX_VOLUME)), state)
    }

    fn set_muted(&mut self, muted: bool) -> Result<(), ControlError> {
        let state = self.state;
        self.command(PlayerCommand::SetMuted(muted), state)
    }
}

impl Drop for MpvPlayer {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.kill_tx.send(());
            let _ = self.status_rx.recv().ok();
            self.finalize();
        }
    }
}

fn command_payload(command: PlayerCommand) -> serde_json::Value {
    match command {
        PlayerCommand::Play => json!(["set_property", "pause", false]),
        PlayerCommand::Pause => json!(["set_property", "pause", true]),
        PlayerCommand::Rewind => json!(["seek", 0.0, "absolute"]),
        PlayerCommand::SetVolume(percent) => json!(["set_property", "volume", percent]),
        PlayerCommand::SetMuted(muted) => json!(["set_property", "mute", muted]),
    }
}

#[cfg(unix)]
fn ipc_endpoint_reachable(path: &str) -> bool {
    UnixStream::connect(path).is_ok()
}

#[cfg(target_os = "windows")]
fn ipc_endpoint_reachable(path: &str) -> bool {
    OpenOptions::new().read(true).write(true).open(path).is_ok()
}

#[cfg(all(not(unix), not(target_os = "windows")))]
fn ipc_endpoint_reachable(_path: &str) -> bool {
    false
}

#[cfg(unix)]
fn send_ipc_command(path: &str, serialized: &str) -> Result<(), ControlError> {
    let mut stream = UnixStream::connect(path)
        .map_err(|err| ControlError::Unreachable(format!("{path}: {err}")))?;
    stream
        .write_all(serialized.as_bytes())
        .and_then(|()| stream.write_all(b"\n"))
        .map_err(|err| ControlError::Unreachable(format!("{path}: {err}")))?;
    Ok(())
}

#[cfg(target_os = "windows")]
fn send_ipc_command(path: &str, serialized: &str) -> Result<(), ControlError> {
    use std::io::ErrorKind;

    const PIPE_RETRIES: usize = 5;
    const PIPE_RETRY_DELAY: Duration = Duration::from_millis(100);

    for attempt in 0..PIPE_RETRIES {
        match OpenOptions::new().read(true).write(true).open(path) {
            Ok(mut pipe) => {
                pipe.write_all(serialized.as_bytes())
                    .and_then(|()| pipe.write_all(b"\n"))
                    .map_err(|err| ControlError::Unreachable(format!("{path}: {err}")))?;
                pipe.flush().ok();
                return Ok(());
            }
            Err(err) if err.kind() == ErrorKind::NotFound && attempt + 1 < PIPE_RETRIES => {
                thread::sleep(PIPE_RETRY_DELAY);
            }
            Err(err) => {
                return Err(ControlError::Unreachable(format!("{path}: {err}")));
            }
        }
    }

    Err(ControlError::Unreachable(path.to_string()))
}

#[cfg(all(not(unix), not(target_os = "windows")))]
fn send_ipc_command(_path: &str, _serialized: &str) -> Result<(), ControlError> {
    Err(ControlError::Unsupported)
}

#[cfg(unix)]
fn unique_ipc_path() -> Option<String> {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    let mut path = std::env::temp_dir();
    path.push(format!("reel-mpv-{}-{suffix}.sock", std::process::id()));
    Some(path.to_string_lossy().to_string())
}

#[cfg(target_os = "windows")]
fn unique_ipc_path() -> Option<String> {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    Some(format!(r"\\.\pipe\reel-mpv-{}-{suffix}", std::process::id()))
}

#[cfg(unix)]
fn cleanup_ipc_path(path: &str) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != std::io::ErrorKind::NotFound && video_debug_enabled() {
            debug_log(format!("failed to remove mpv ipc path {path}: {err}"));
        }
    }
}

#[derive(Debug, Default)]
pub struct StubLog {
    pub spawned: Vec<String>,
    pub commands: Vec<(String, PlayerCommand)>,
}

/// In-memory player factory for tests and offline runs. Every spawn and
/// command is recorded against the item id; ids listed in `fail_ids` produce
/// players that never become ready.
#[derive(Clone, Default)]
pub struct StubFactory {
    log: Arc<Mutex<StubLog>>,
    fail_ids: Vec<String>,
}

impl StubFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(ids: &[&str]) -> Self {
        Self {
            log: Arc::default(),
            fail_ids: ids.iter().map(|id| id.to_string()).collect(),
        }
    }

    pub fn spawned(&self) -> Vec<String> {
        self.log.lock().spawned.clone()
    }

    pub fn commands_for(&self, id: &str) -> Vec<PlayerCommand> {
        self.log
            .lock()
            .commands
            .iter()
            .filter(|(item, _)| item == id)
            .map(|(_, command)| *command)
            .collect()
    }
}

impl PlayerFactory for StubFactory {
    fn spawn(&self, item: &FeedItem, _layout: SlideLayout) -> Result<Box<dyn PlayerHandle>> {
        self.log.lock().spawned.push(item.id.clone());
        Ok(Box::new(StubPlayer {
            id: item.id.clone(),
            state: PlayerState::Loading,
            fail: self.fail_ids.iter().any(|id| id == &item.id),
            log: self.log.clone(),
        }))
    }
}

pub struct StubPlayer {
    id: String,
    state: PlayerState,
    fail: bool,
    log: Arc<Mutex<StubLog>>,
}

impl StubPlayer {
    fn record(&mut self, command: PlayerCommand, on_ok: PlayerState) -> Result<(), ControlError> {
        match self.state {
            PlayerState::Unloaded | PlayerState::Loading => Ok(()),
            _ => {
                self.log.lock().commands.push((self.id.clone(), command));
                self.state = on_ok;
                Ok(())
            }
        }
    }
}

impl PlayerHandle for StubPlayer {
    fn state(&self) -> PlayerState {
        self.state
    }

    fn poll(&mut self) -> PlayerState {
        if self.state == PlayerState::Loading {
            self.state = if self.fail {
                PlayerState::Unloaded
            } else {
                PlayerState::Ready
            };
        }
        self.state
    }

    fn play(&mut self) -> Result<(), ControlError> {
        self.record(PlayerCommand::Play, PlayerState::Playing)
    }

    fn pause(&mut self) -> Result<(), ControlError> {
        self.record(PlayerCommand::Pause, PlayerState::Paused)
    }

    fn rewind(&mut self) -> Result<(), ControlError> {
        let state = self.state;
        self.record(PlayerCommand::Rewind, state)
    }

    fn set_volume(&mut self, percent: u8) -> Result<(), ControlError> {
        let state = self.state;
        self.record(PlayerCommand::SetVolume(percent), state)
    }

    fn set_muted(&mut self, muted: bool) -> Result<(), ControlError> {
        let state = self.state;
        self.record(PlayerCommand::SetMuted(muted), state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedItem;

    fn sample_item(id: &str) -> FeedItem {
        FeedItem {
            id: id.to_string(),
            title: format!("Story {id}"),
            category: "politica".into(),
            video_url: format!("https://cdn.test/videos/{id}.mp4"),
            body: String::new(),
            published_at: chrono::Utc::now(),
            source: "Agencia".into(),
        }
    }

    #[test]
    fn play_pause_payloads_toggle_the_pause_property() {
        assert_eq!(
            command_payload(PlayerCommand::Play),
            json!(["set_property", "pause", false])
        );
        assert_eq!(
            command_payload(PlayerCommand::Pause),
            json!(["set_property", "pause", true])
        );
    }

    #[test]
    fn rewind_seeks_to_absolute_zero() {
        assert_eq!(
            command_payload(PlayerCommand::Rewind),
            json!(["seek", 0.0, "absolute"])
        );
    }

    #[test]
    fn volume_and_mute_payloads_carry_their_values() {
        assert_eq!(
            command_payload(PlayerCommand::SetVolume(100)),
            json!(["set_property", "volume", 100])
        );
        assert_eq!(
            command_payload(PlayerCommand::SetMuted(true)),
            json!(["set_property", "mute", true])
        );
    }

    #[test]
    fn stub_player_becomes_ready_after_poll() {
        let factory = StubFactory::new();
        let mut player = factory
            .spawn(&sample_item("a"), SlideLayout::default())
            .unwrap();
        assert_eq!(player.state(), PlayerState::Loading);
        assert_eq!(player.poll(), PlayerState::Ready);
    }

    #[test]
    fn failing_stub_never_reaches_ready_and_stays_inert() {
        let factory = StubFactory::failing(&["a"]);
        let mut player = factory
            .spawn(&sample_item("a"), SlideLayout::default())
            .unwrap();
        assert_eq!(player.poll(), PlayerState::Unloaded);
        player.play().unwrap();
        assert_eq!(player.state(), PlayerState::Unloaded);
        assert!(factory.commands_for("a").is_empty());
    }

    #[test]
    fn stub_records_commands_in_order() {
        let factory = StubFactory::new();
        let mut player = factory
            .spawn(&sample_item("a"), SlideLayout::default())
            .unwrap();
        player.poll();
        player.set_volume(100).unwrap();
        player.set_muted(false).unwrap();
        player.play().unwrap();
        player.pause().unwrap();
        assert_eq!(
            factory.commands_for("a"),
            vec![
                PlayerCommand::SetVolume(100),
                PlayerCommand::SetMuted(false),
                PlayerCommand::Play,
                PlayerCommand::Pause,
            ]
        );
        assert_eq!(player.state(), PlayerState::Paused);
    }

    #[test]
    fn spawn_rejects_missing_url() {
        let factory = MpvFactory::new("mpv", true);
        let mut item = sample_item("a");
        item.video_url = String::new();
        assert!(factory.spawn(&item, SlideLayout::default()).is_err());
    }
}
