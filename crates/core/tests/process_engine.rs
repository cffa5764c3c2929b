//! Supervisor runs against the real process engine.
//!
//! The engine program is a small shell script that answers the `-version`
//! probe and prints ffmpeg-style log lines, so these tests need `/bin/sh`
//! but no ffmpeg install.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use transcoder_core::{
    engine::EngineError, AudioPreset, Config, EngineConfig, Observers, RunState, Supervisor,
    SupervisorConfig, TranscodeError, TranscodeJob,
};

fn fake_engine(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-ffmpeg");
    let script = format!(
        "#!/bin/sh\nif [ \"$1\" = \"-version\" ]; then echo \"fake-ffmpeg 1.0\"; exit 0; fi\n{}\n",
        body
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn config_for(temp: &TempDir, body: &str) -> Config {
    let program = fake_engine(temp.path(), body);
    Config {
        engine: EngineConfig::with_program(program.to_string_lossy())
            .with_temp_dir(temp.path().join("namespaces")),
        supervisor: SupervisorConfig::default(),
    }
}

fn job() -> TranscodeJob {
    AudioPreset::default()
        .job("input.wav", b"RIFF fake wave".to_vec(), "output.mp3")
        .unwrap()
}

/// Runs a job, retrying while a freshly written script is still busy.
async fn run_job(supervisor: &Supervisor) -> Result<Vec<u8>, TranscodeError> {
    for _ in 0..20 {
        let result = tokio::time::timeout(Duration::from_secs(10), supervisor.run(job()))
            .await
            .expect("run must settle once the engine exits");
        match result {
            Err(TranscodeError::EngineUnavailable(EngineError::InitFailed { .. })) => {
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
            other => return other,
        }
    }
    supervisor.run(job()).await
}

const SUCCESS_BODY: &str = r#"for last; do :; done
echo "Input #0, wav, from 'input.wav':" >&2
echo "  Duration: 00:00:04.00, start: 0.000000, bitrate: 1411 kb/s" >&2
printf 'size=       1kB time=00:00:02.00 bitrate=   4.0kbits/s speed=2x\r' >&2
cat input.wav > "$last"
echo "video:0kB audio:1kB subtitle:0kB other streams:0kB global headers:0kB muxing overhead: 0.5%" >&2"#;

#[tokio::test]
async fn test_from_config_success_run() {
    let temp = TempDir::new().unwrap();
    let config = config_for(&temp, SUCCESS_BODY);

    let durations = Arc::new(Mutex::new(Vec::new()));
    let progress = Arc::new(Mutex::new(Vec::new()));
    let (d, p) = (durations.clone(), progress.clone());
    let supervisor = Supervisor::from_config(&config).with_observers(
        Observers::new()
            .on_duration(move |secs| d.lock().unwrap().push(secs))
            .on_progress(move |value| p.lock().unwrap().push(value)),
    );

    let output = run_job(&supervisor).await.unwrap();

    assert_eq!(output, b"RIFF fake wave");
    assert_eq!(*durations.lock().unwrap(), vec![4.0]);
    assert_eq!(*progress.lock().unwrap(), vec![50.0, 100.0]);
    assert_eq!(supervisor.state(), RunState::Idle);
    let leftovers = std::fs::read_dir(temp.path().join("namespaces")).unwrap().count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_failure_marker_from_process() {
    let temp = TempDir::new().unwrap();
    let config = config_for(
        &temp,
        "echo 'input.wav: Invalid data found when processing input' >&2\nexit 1",
    );
    let supervisor = Supervisor::from_config(&config);

    match run_job(&supervisor).await {
        Err(TranscodeError::RunFailed { message }) => {
            assert_eq!(message, "input.wav: Invalid data found when processing input");
        }
        other => panic!("expected RunFailed, got {:?}", other),
    }
    assert_eq!(supervisor.state(), RunState::Idle);
}

#[tokio::test]
async fn test_clean_exit_without_marker_fails_run() {
    let temp = TempDir::new().unwrap();
    let config = config_for(&temp, "echo 'ffmpeg version n6.0' >&2");
    let supervisor = Supervisor::from_config(&config);

    match run_job(&supervisor).await {
        Err(TranscodeError::RunFailed { message }) => {
            assert!(message.contains("without a completion marker"));
        }
        other => panic!("expected RunFailed, got {:?}", other),
    }
    assert_eq!(supervisor.state(), RunState::Idle);
}

#[tokio::test]
async fn test_timeout_kills_hung_process() {
    let temp = TempDir::new().unwrap();
    let config = config_for(&temp, "echo '  Duration: 00:00:04.00, start: 0.0' >&2\nexec sleep 30");
    let supervisor = Supervisor::from_config(&config);

    // Warm up until the script is executable, then time out a hung run.
    let mut result = Err(TranscodeError::AlreadyRunning);
    for _ in 0..20 {
        result = supervisor
            .run_with_timeout(job(), Duration::from_millis(500))
            .await;
        if !matches!(
            result,
            Err(TranscodeError::EngineUnavailable(EngineError::InitFailed { .. }))
        ) {
            break;
        }
    }

    assert!(matches!(result, Err(TranscodeError::Timeout { timeout_ms: 500 })));
    assert_eq!(supervisor.state(), RunState::Disposed);
    let leftovers = std::fs::read_dir(temp.path().join("namespaces")).unwrap().count();
    assert_eq!(leftovers, 0);
}
