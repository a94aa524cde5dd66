//! Runtime installer.
//!
//! Ensures a usable Python interpreter exists at the configured install path,
//! bootstrapping one when absent. Windows installs via the official prebuilt
//! installer in silent mode; other platforms build CPython from source
//! (configure → make → make install). Interpreter-side libraries needed by the
//! generated preamble are provisioned on every call.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::paths::RuntimeDirs;

const DOWNLOAD_ATTEMPTS: u32 = 3;
const DOWNLOAD_BACKOFF: Duration = Duration::from_millis(500);

/// Ensure a usable interpreter exists, installing one when missing.
///
/// Idempotent: an existing installation skips every download and build step.
pub async fn ensure(config: &BridgeConfig) -> Result<PathBuf> {
    let dirs = RuntimeDirs::create(&config.install_dir)?;
    let python = dirs.python_path();

    if dirs.is_installed() {
        tracing::debug!("python runtime already present at {}", python.display());
    } else {
        install(&config.python_version, &dirs).await?;
        tracing::info!(
            "python {} installed to {}",
            config.python_version,
            dirs.root.display()
        );
    }

    provision_dependencies(&python, &dirs.root).await?;
    Ok(python)
}

/// Platform dispatch for a fresh install.
async fn install(version: &str, dirs: &RuntimeDirs) -> Result<()> {
    if cfg!(windows) {
        install_prebuilt(version, &dirs.root).await
    } else {
        install_from_source(version, &dirs.root).await
    }
}

/// Windows: fetch the official installer and run it silently into the target.
async fn install_prebuilt(version: &str, install_dir: &Path) -> Result<()> {
    let url =
        format!("https://www.python.org/ftp/python/{version}/python-{version}-amd64.exe");
    let installer = std::env::temp_dir().join(format!("python-{version}-installer.exe"));
    download(&url, &installer).await?;

    tracing::info!("running python installer");
    let status = Command::new(&installer)
        .arg("/quiet")
        .arg("InstallAllUsers=1")
        .arg(format!("TargetDir={}", install_dir.display()))
        .status()
        .await
        .map_err(|e| Error::Bootstrap(format!("failed to run installer: {e}")))?;
    if !status.success() {
        return Err(Error::Bootstrap(format!("installer exited with {status}")));
    }
    Ok(())
}

/// Unix: fetch the source tarball and run the three-stage build.
async fn install_from_source(version: &str, install_dir: &Path) -> Result<()> {
    preflight_build_tools()?;

    let url = format!("https://www.python.org/ftp/python/{version}/Python-{version}.tgz");
    let tarball = std::env::temp_dir().join(format!("Python-{version}.tgz"));
    download(&url, &tarball).await?;

    tracing::info!("extracting python sources");
    extract_tarball(&tarball, &std::env::temp_dir()).await?;

    let src_dir = std::env::temp_dir().join(format!("Python-{version}"));
    build_from_source(&src_dir, install_dir).await
}

/// Fail before any download when the build toolchain is missing.
fn preflight_build_tools() -> Result<()> {
    for tool in ["tar", "make", "cc"] {
        which::which(tool).map_err(|_| {
            Error::Bootstrap(format!(
                "'{tool}' not found in PATH; it is required to build python from source"
            ))
        })?;
    }
    Ok(())
}

/// Download a file with bounded retry and exponential backoff.
async fn download(url: &str, dest: &Path) -> Result<()> {
    let mut delay = DOWNLOAD_BACKOFF;
    let mut last_error = String::new();

    for attempt in 1..=DOWNLOAD_ATTEMPTS {
        match try_download(url, dest).await {
            Ok(()) => return Ok(()),
            Err(message) => {
                tracing::warn!("download attempt {attempt}/{DOWNLOAD_ATTEMPTS} failed: {message}");
                last_error = message;
                if attempt < DOWNLOAD_ATTEMPTS {
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }

    Err(Error::Download {
        url: url.to_string(),
        message: last_error,
    })
}

async fn try_download(url: &str, dest: &Path) -> std::result::Result<(), String> {
    tracing::info!("downloading {url}");
    let response = reqwest::get(url).await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }
    let bytes = response.bytes().await.map_err(|e| e.to_string())?;

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| e.to_string())?;
    file.write_all(&bytes).await.map_err(|e| e.to_string())?;
    Ok(())
}

/// Unpack a .tgz with the system tar tool.
async fn extract_tarball(tarball: &Path, dest: &Path) -> Result<()> {
    let output = Command::new("tar")
        .arg("-xzf")
        .arg(tarball)
        .arg("-C")
        .arg(dest)
        .output()
        .await
        .map_err(|e| Error::Bootstrap(format!("failed to run tar: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Bootstrap(format!("tar failed: {stderr}")));
    }
    Ok(())
}

/// configure → make → make install; the first failed stage aborts the rest.
async fn build_from_source(src_dir: &Path, install_dir: &Path) -> Result<()> {
    let prefix = format!("--prefix={}", install_dir.display());
    run_build_stage(
        "configure",
        Command::new("./configure").arg(&prefix).current_dir(src_dir),
    )
    .await?;
    run_build_stage("make", Command::new("make").current_dir(src_dir)).await?;
    run_build_stage(
        "make install",
        Command::new("make").arg("install").current_dir(src_dir),
    )
    .await
}

async fn run_build_stage(stage: &str, command: &mut Command) -> Result<()> {
    tracing::info!("running build stage: {stage}");
    let output = command
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| Error::Bootstrap(format!("failed to run {stage}: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Bootstrap(format!(
            "{stage} exited with {}: {stderr}",
            output.status
        )));
    }
    Ok(())
}

/// Install the interpreter-side libraries the generated preamble imports.
async fn provision_dependencies(python: &Path, workdir: &Path) -> Result<()> {
    tracing::debug!("provisioning interpreter dependencies");
    let output = Command::new(python)
        .args(["-m", "pip", "install", "requests"])
        .current_dir(workdir)
        .output()
        .await
        .map_err(|e| Error::Provision(format!("failed to run pip: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Provision(format!(
            "pip exited with {}: {stderr}",
            output.status
        )));
    }
    Ok(())
}
