use std::path::PathBuf;

const APP_DIR: &str = "radiodeck";

/// IPC endpoint for the mpv process that plays `player`.
#[cfg(unix)]
pub fn mpv_socket_name(player: &str) -> String {
    format!(
        "{}/radiodeck-mpv-{}.sock",
        std::env::temp_dir().display(),
        sanitize(player)
    )
}

#[cfg(windows)]
pub fn mpv_socket_name(player: &str) -> String {
    format!("radiodeck-mpv-{}", sanitize(player))
}

#[cfg(unix)]
pub fn mpv_socket_arg(player: &str) -> String {
    format!("--input-ipc-server={}", mpv_socket_name(player))
}

#[cfg(windows)]
pub fn mpv_socket_arg(player: &str) -> String {
    format!("--input-ipc-server=\\\\.\\pipe\\{}", mpv_socket_name(player))
}

fn sanitize(player: &str) -> String {
    player
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/radiodeck/ (XDG standard)
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join(APP_DIR)
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn config_dir() -> PathBuf {
    // On macOS and Linux, always use ~/.config/radiodeck/
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join(APP_DIR)
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

#[cfg(unix)]
fn mpv_binary_names() -> &'static [&'static str] {
    &["mpv"]
}

#[cfg(windows)]
fn mpv_binary_names() -> &'static [&'static str] {
    &["mpv.exe", "mpv"]
}

#[cfg(unix)]
fn ffmpeg_binary_names() -> &'static [&'static str] {
    &["ffmpeg"]
}

#[cfg(windows)]
fn ffmpeg_binary_names() -> &'static [&'static str] {
    &["ffmpeg.exe", "ffmpeg"]
}

fn find_beside_exe(names: &[&str]) -> Option<PathBuf> {
    let current_exe = std::env::current_exe().ok()?;
    let dir = current_exe.parent()?;
    for name in names {
        let p = dir.join(name);
        if p.exists() {
            return Some(p);
        }
        let p = dir.join("external").join(name);
        if p.exists() {
            return Some(p);
        }
    }
    None
}

fn find_on_path(names: &[&str]) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        for name in names {
            let p = dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }
    None
}

/// Find the mpv binary used for audible playback.
/// Checks `MPV_PATH`, beside the current exe, then PATH.
pub fn find_mpv_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("MPV_PATH") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }
    find_beside_exe(mpv_binary_names()).or_else(|| find_on_path(mpv_binary_names()))
}

/// Find the ffmpeg binary used to tap PCM for the visualizer.
/// Checks `FFMPEG_PATH`, beside the current exe, then PATH.
pub fn find_ffmpeg_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("FFMPEG_PATH") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }
    find_beside_exe(ffmpeg_binary_names()).or_else(|| find_on_path(ffmpeg_binary_names()))
}
