use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::registry::ProxyRegistry;
use crate::service::ServiceProxy;

/// A backend process started by [`Launcher::launch`].
#[derive(Debug, Clone)]
pub struct LaunchedProxy {
    pub path: PathBuf,
    pub pid: Option<u32>,
    pub proxy: ServiceProxy,
}

/// Discovers backend executables and wires each one to the shared registry.
pub struct Launcher {
    config: ProxyConfig,
    registry: Arc<ProxyRegistry>,
}

impl Launcher {
    pub fn new(config: ProxyConfig, registry: Arc<ProxyRegistry>) -> Self {
        Self { config, registry }
    }

    pub fn registry(&self) -> &Arc<ProxyRegistry> {
        &self.registry
    }

    /// Executables in the proxy directory whose name ends with the configured suffix, sorted.
    pub fn discover(&self) -> Result<Vec<PathBuf>, ProxyError> {
        let suffix = self.config.executable_suffix();
        let mut found = Vec::new();
        for entry in std::fs::read_dir(&self.config.proxy_dir)? {
            let entry = entry?;
            let path = entry.path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.len() > suffix.len() && n.ends_with(&suffix));
            if !matches {
                continue;
            }
            let meta = entry.metadata()?;
            if meta.is_file() && is_executable(&meta) {
                found.push(path);
            } else {
                debug!(path = %path.display(), "skipping non-executable proxy candidate");
            }
        }
        found.sort();
        Ok(found)
    }

    /// Spawns `path` and attaches a proxy to its stdio. Registration calls from
    /// the child land in the shared registry.
    pub fn launch(&self, path: &Path) -> Result<LaunchedProxy, ProxyError> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProxyError::Launch {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let launch_err = |message: &str| ProxyError::Launch {
            path: path.to_path_buf(),
            message: message.to_string(),
        };
        let stdin = child.stdin.take().ok_or_else(|| launch_err("stdin not captured"))?;
        let stdout = child.stdout.take().ok_or_else(|| launch_err("stdout not captured"))?;
        let pid = child.id();

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let proxy = ServiceProxy::builder(name.clone())
            .call_timeout(self.config.call_timeout())
            .max_frame_len(self.config.max_frame_len)
            .on_call(self.registry.registration_handler())
            .attach(stdout, stdin);
        info!(proxy = %name, pid = ?pid, "proxy launched");

        let watched = proxy.clone();
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => match status {
                    Ok(status) => warn!(proxy = %name, %status, "proxy process exited"),
                    Err(e) => warn!(proxy = %name, error = %e, "failed to wait on proxy process"),
                },
                _ = watched.closed() => {
                    debug!(proxy = %name, "proxy stream closed, stopping process");
                    if let Err(e) = child.kill().await {
                        debug!(proxy = %name, error = %e, "kill failed");
                    }
                }
            }
            watched.shutdown();
            registry.unregister_proxy(&watched);
        });

        Ok(LaunchedProxy {
            path: path.to_path_buf(),
            pid,
            proxy,
        })
    }

    /// Launches every discovered proxy. Failures are logged and skipped.
    pub fn launch_all(&self) -> Result<Vec<LaunchedProxy>, ProxyError> {
        let mut launched = Vec::new();
        for path in self.discover()? {
            match self.launch(&path) {
                Ok(p) => launched.push(p),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping proxy"),
            }
        }
        Ok(launched)
    }

    /// Polls the registry until every name is registered or `timeout` passes.
    pub async fn wait_for_services(
        &self,
        names: &[String],
        timeout: Duration,
    ) -> Result<(), ProxyError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let missing = names.iter().find(|n| !self.registry.contains(n));
            match missing {
                None => return Ok(()),
                Some(name) if tokio::time::Instant::now() >= deadline => {
                    return Err(ProxyError::ProxyNotFound(name.clone()));
                }
                Some(_) => tokio::time::sleep(Duration::from_millis(20)).await,
            }
        }
    }
}

#[cfg(unix)]
fn is_executable(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &std::fs::Metadata) -> bool {
    true
}
