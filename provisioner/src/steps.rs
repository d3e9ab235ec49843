//! The fixed provisioning step sequence and each step's remote commands.

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::config::ProvisionerConfig;
use crate::session::RemoteSession;

/// github.com may not be in known_hosts yet on a fresh box.
const KEYSCAN_CMD: &str = "ssh-keyscan github.com >> ~/.ssh/known_hosts";

/// One provisioning step. Steps always run in [`Step::SEQUENCE`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CloneRepository,
    InstallRuntime,
    PrefetchAssets,
}

impl Step {
    pub const SEQUENCE: [Step; 3] = [
        Step::CloneRepository,
        Step::InstallRuntime,
        Step::PrefetchAssets,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Step::CloneRepository => "repository clone",
            Step::InstallRuntime => "docker install",
            Step::PrefetchAssets => "image pull",
        }
    }

    /// Progress line printed before this step's verification in check mode.
    pub fn check_heading(self) -> &'static str {
        match self {
            Step::CloneRepository => "Checking that repository is cloned...",
            Step::InstallRuntime => "Checking that docker is installed...",
            Step::PrefetchAssets => "Checking that docker images have been built/pulled...",
        }
    }
}

/// Run one step's remote commands over `session` and report the exit status
/// of its gating command.
///
/// [`Step::PrefetchAssets`] is fire-and-forget: the pull script is dispatched
/// detached and this function returns without observing its completion, so
/// the reported status is always zero. `indent` prefixes the progress lines
/// (remediations triggered from a check are printed one level deep).
pub fn execute(
    session: &mut dyn RemoteSession,
    step: Step,
    cfg: &ProvisionerConfig,
    indent: &str,
) -> Result<i32> {
    let timeout = cfg.command_timeout();
    match step {
        Step::CloneRepository => {
            println!("{indent}Cloning repository '{}'...", cfg.repo_name);
            let keyscan = session
                .exec(KEYSCAN_CMD, timeout)
                .context("pre-register github host key")?;
            if keyscan.status != 0 {
                debug!(status = keyscan.status, "keyscan exited non-zero");
            }

            let clone = session
                .exec(&format!("git clone {}", cfg.repo_url), timeout)
                .context("clone repository")?;
            if clone.status != 0 {
                println!("{indent}\tError {}", clone.status);
                return Ok(clone.status);
            }

            let chmod = session
                .exec(
                    &format!("chmod +x {}/scripts/*.sh", cfg.repo_name),
                    timeout,
                )
                .context("mark scripts executable")?;
            if chmod.status != 0 {
                warn!(status = chmod.status, "chmod on cloned scripts exited non-zero");
            }
            println!("{indent}\tRepository cloned");
            Ok(0)
        }
        Step::InstallRuntime => {
            println!("{indent}Installing docker...");
            let install = session
                .exec(
                    &format!("./{}/scripts/{}", cfg.repo_name, cfg.install_script),
                    timeout,
                )
                .context("run install script")?;
            if install.status == 0 {
                println!("{indent}\tDocker installed");
            } else {
                println!("{indent}\tError {}", install.status);
            }
            Ok(install.status)
        }
        Step::PrefetchAssets => {
            println!("{indent}Starting pull of docker images in background...");
            let mkdir = session
                .exec("mkdir -p logs", timeout)
                .context("create remote logs directory")?;
            if mkdir.status != 0 {
                warn!(status = mkdir.status, "mkdir logs exited non-zero");
            }

            let stem = cfg.pull_script.trim_end_matches(".sh");
            session
                .exec_detached(&format!(
                    "nohup ./{}/scripts/{} > logs/{stem}.out 2> logs/{stem}.err &",
                    cfg.repo_name, cfg.pull_script
                ))
                .context("dispatch image pull")?;
            Ok(0)
        }
    }
}
