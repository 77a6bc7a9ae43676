//! # External Process Runner
//!
//! Questo modulo esegue i tool esterni (ffmpeg, aomenc, MP4Box, photonnoise,
//! jpegtran) e ne interpreta l'esito.
//!
//! ## Responsabilità:
//! - Esecuzione subprocess con argv strutturato (niente shell, niente quoting)
//! - Cattura di stdout/stderr per diagnostica
//! - Exit code non-zero -> `ConvertError::Subprocess` con stderr allegato
//! - Pinning best-effort del processo figlio su un set di CPU logiche
//! - Pipeline a due stadi: lo stdout del decoder diventa lo stdin dell'encoder
//!
//! ## Affinity:
//! Il pinning usa `sched_setaffinity` sul PID del figlio (solo Linux).
//! Un fallimento del pinning viene loggato a livello debug e non fallisce
//! mai il job: il contratto è best-effort.
//!
//! Nessun retry e nessun timeout a questo livello: un encoder appeso tiene
//! occupato il suo worker, per contratto.

use crate::error::ConvertError;
use crate::platform::PlatformCommands;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::debug;

/// Run one external tool to completion.
///
/// On exit code 0 returns the captured stdout; on a non-zero exit returns
/// `ConvertError::Subprocess` carrying the exit code and captured stderr.
pub async fn run(
    tool: &str,
    args: &[String],
    affinity: Option<&[usize]>,
) -> Result<String, ConvertError> {
    let platform = PlatformCommands::instance();
    let command = platform.get_command(tool);

    debug!("Running {} {:?}", command, args);

    let mut child = Command::new(command)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    pin_child(&child, tool, affinity);

    let output = child.wait_with_output().await?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        Err(ConvertError::Subprocess {
            tool: tool.to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Run a two-stage pipeline: `producer | consumer`.
///
/// The producer's stdout is wired directly into the consumer's stdin through
/// an OS pipe. Either stage exiting non-zero fails the call with that
/// stage's captured stderr; the consumer is checked first since its
/// diagnostics are usually the relevant ones.
pub async fn run_piped(
    producer: &str,
    producer_args: &[String],
    consumer: &str,
    consumer_args: &[String],
    affinity: Option<&[usize]>,
) -> Result<(), ConvertError> {
    let platform = PlatformCommands::instance();

    debug!(
        "Running {} {:?} | {} {:?}",
        producer, producer_args, consumer, consumer_args
    );

    let mut producer_child = Command::new(platform.get_command(producer))
        .args(producer_args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let pipe = producer_child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("producer stdout was not captured"))?;
    let pipe: Stdio = pipe.try_into()?;

    let consumer_child = Command::new(platform.get_command(consumer))
        .args(consumer_args)
        .stdin(pipe)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    pin_child(&producer_child, producer, affinity);
    pin_child(&consumer_child, consumer, affinity);

    let (producer_out, consumer_out) = tokio::join!(
        producer_child.wait_with_output(),
        consumer_child.wait_with_output()
    );
    let producer_out = producer_out?;
    let consumer_out = consumer_out?;

    if !consumer_out.status.success() {
        return Err(ConvertError::Subprocess {
            tool: consumer.to_string(),
            code: consumer_out.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&consumer_out.stderr).to_string(),
        });
    }

    if !producer_out.status.success() {
        return Err(ConvertError::Subprocess {
            tool: producer.to_string(),
            code: producer_out.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&producer_out.stderr).to_string(),
        });
    }

    Ok(())
}

/// Best-effort pin of a spawned child to a CPU set.
fn pin_child(child: &Child, tool: &str, affinity: Option<&[usize]>) {
    let Some(cpus) = affinity else { return };
    let Some(pid) = child.id() else { return };

    match affinity_impl::pin_process(pid, cpus) {
        Ok(()) => debug!("Pinned {} (pid {}) to CPUs {:?}", tool, pid, cpus),
        Err(e) => debug!(
            "Affinity pinning failed for {} (pid {}, CPUs {:?}): {} - continuing unpinned",
            tool, pid, cpus, e
        ),
    }
}

#[cfg(target_os = "linux")]
mod affinity_impl {
    /// Restrict a process to the given logical CPUs via `sched_setaffinity`.
    pub fn pin_process(pid: u32, cpus: &[usize]) -> std::io::Result<()> {
        if cpus.is_empty() {
            return Ok(());
        }

        // SAFETY: cpu_set_t is a plain bitmask; zeroed is its empty state.
        unsafe {
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            libc::CPU_ZERO(&mut set);
            for &cpu in cpus {
                if cpu < libc::CPU_SETSIZE as usize {
                    libc::CPU_SET(cpu, &mut set);
                }
            }
            if libc::sched_setaffinity(
                pid as libc::pid_t,
                std::mem::size_of::<libc::cpu_set_t>(),
                &set,
            ) != 0
            {
                return Err(std::io::Error::last_os_error());
            }
        }
        Ok(())
    }
}

#[cfg(not(target_os = "linux"))]
mod affinity_impl {
    /// Affinity pinning is Linux-only; elsewhere the caller proceeds unpinned.
    pub fn pin_process(_pid: u32, _cpus: &[usize]) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "process affinity pinning is not supported on this platform",
        ))
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use crate::utils::to_string_vec;

    #[tokio::test]
    async fn test_run_captures_stdout_on_success() {
        let out = run("echo", &to_string_vec(["hello"]), None).await.unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_surfaces_exit_code_and_stderr() {
        let args = to_string_vec(["-c", "echo boom >&2; exit 3"]);
        let err = run("sh", &args, None).await.unwrap_err();
        match err {
            ConvertError::Subprocess { tool, code, stderr } => {
                assert_eq!(tool, "sh");
                assert_eq!(code, 3);
                assert!(stderr.contains("boom"));
            }
            other => panic!("expected Subprocess error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_affinity_set_does_not_fail_the_job() {
        // CPU index far beyond any real machine; pinning fails, the run must not.
        let out = run("echo", &to_string_vec(["still fine"]), Some(&[999_999]))
            .await
            .unwrap();
        assert_eq!(out.trim(), "still fine");
    }

    #[tokio::test]
    async fn test_run_piped_connects_stdout_to_stdin() {
        let args = to_string_vec(["piped"]);
        run_piped("echo", &args, "cat", &[], None).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_piped_consumer_failure_wins() {
        let producer_args = to_string_vec(["data"]);
        let consumer_args = to_string_vec(["-c", "cat >/dev/null; exit 4"]);
        let err = run_piped("echo", &producer_args, "sh", &consumer_args, None)
            .await
            .unwrap_err();
        match err {
            ConvertError::Subprocess { tool, code, .. } => {
                assert_eq!(tool, "sh");
                assert_eq!(code, 4);
            }
            other => panic!("expected Subprocess error, got {other:?}"),
        }
    }
}
