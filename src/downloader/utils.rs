// Shared helpers: filename sanitization and subprocess plumbing

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration};

lazy_static::lazy_static! {
    // Filesystem-illegal characters on the platforms we target
    static ref ILLEGAL_RE: regex::Regex = regex::Regex::new(r#"[\\/*?:"<>|]"#).unwrap();
}

/// Strip filesystem-illegal characters from a video title.
///
/// Idempotent: one pass removes everything the pattern matches.
pub fn sanitize_title(title: &str) -> String {
    ILLEGAL_RE.replace_all(title, "").to_string()
}

/// Build the final output path: `{sanitized_title}_{resolution}.mp4` in `dir`
pub fn output_path(dir: &Path, title: &str, resolution: &str) -> PathBuf {
    dir.join(format!("{}_{}.mp4", sanitize_title(title), resolution))
}

/// Per-invocation unique temporary path in `dir`, e.g. `v_3f2a….mp4`.
///
/// Unique names let two downloads run side by side without clobbering each
/// other's intermediate tracks.
pub fn temp_path(dir: &Path, prefix: &str, token: &uuid::Uuid) -> PathBuf {
    dir.join(format!("{}_{}.mp4", prefix, token.simple()))
}

/// Drain one child pipe to completion on its own task
fn capture_pipe<R>(name: &'static str, mut pipe: R) -> tokio::task::JoinHandle<Result<Vec<u8>, String>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)
            .await
            .map_err(|e| format!("Failed to read {}: {}", name, e))?;
        Ok(buf)
    })
}

/// Run a command, capture stdout/stderr, and kill it past `timeout_secs`
pub async fn run_output_with_timeout(
    program: &str,
    args: Vec<String>,
    timeout_secs: u64,
) -> Result<std::process::Output, String> {
    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to start {}: {}", program, e))?;

    let stdout_task = child
        .stdout
        .take()
        .map(|pipe| capture_pipe("stdout", pipe))
        .ok_or_else(|| format!("Failed to capture stdout from {}", program))?;
    let stderr_task = child
        .stderr
        .take()
        .map(|pipe| capture_pipe("stderr", pipe))
        .ok_or_else(|| format!("Failed to capture stderr from {}", program))?;

    let status = match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
        Ok(status_res) => {
            status_res.map_err(|e| format!("Failed to wait for {}: {}", program, e))?
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            return Err(format!("Timed out after {}s", timeout_secs));
        }
    };

    let stdout = stdout_task
        .await
        .map_err(|e| format!("stdout task failed: {}", e))??;
    let stderr = stderr_task
        .await
        .map_err(|e| format!("stderr task failed: {}", e))??;

    Ok(std::process::Output {
        status,
        stdout,
        stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_illegal_chars() {
        assert_eq!(
            sanitize_title(r#"What: a "great" <video>? | yes\no/maybe*"#),
            "What a great video  yesnomaybe"
        );
    }

    #[test]
    fn test_sanitize_idempotent() {
        let once = sanitize_title(r#"a\b/c*d?e:f"g<h>i|j"#);
        assert_eq!(sanitize_title(&once), once);
    }

    #[test]
    fn test_output_path() {
        let p = output_path(Path::new("."), "My: Video", "1080p");
        assert_eq!(p, PathBuf::from("./My Video_1080p.mp4"));
    }

    #[test]
    fn test_temp_paths_unique_per_token() {
        let a = uuid::Uuid::new_v4();
        let b = uuid::Uuid::new_v4();
        let dir = Path::new(".");
        assert_ne!(temp_path(dir, "v", &a), temp_path(dir, "v", &b));
        assert_ne!(temp_path(dir, "v", &a), temp_path(dir, "a", &a));
    }
}
