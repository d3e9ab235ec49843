//! Per-host provisioning workflow: the verify-then-remediate state machine.

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::config::ProvisionerConfig;
use crate::roster::HostRecord;
use crate::session::{SessionFactory, SessionHandle};
use crate::steps::{Step, execute};
use crate::verify::{Verification, verify};

/// Which workflow to run for each host.
///
/// `Setup` is `Check` with every verification hard-wired to "absent": all
/// three remediations run unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Setup,
    Check,
}

impl Mode {
    pub fn banner(self) -> &'static str {
        match self {
            Mode::Setup => "Setting up",
            Mode::Check => "Checking",
        }
    }
}

/// Terminal state of one host's workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOutcome {
    Provisioned,
    /// The initial connection failed; no steps were attempted.
    ConnectFailed,
    /// `step` (its check or its remediation) failed; later steps were not
    /// attempted.
    StepFailed(Step),
}

/// Runs the step sequence for one host. Owns the retry policy: a failed
/// verification is remediated at most once, and a remediation is trusted on
/// zero exit status rather than re-verified.
pub struct HostProvisioner<'a> {
    factory: &'a dyn SessionFactory,
    cfg: &'a ProvisionerConfig,
    mode: Mode,
}

impl<'a> HostProvisioner<'a> {
    pub fn new(factory: &'a dyn SessionFactory, cfg: &'a ProvisionerConfig, mode: Mode) -> Self {
        Self { factory, cfg, mode }
    }

    /// Run the full workflow for `host`. Failures are contained here: they
    /// are printed and folded into the returned [`HostOutcome`], never
    /// propagated to the caller.
    pub fn run(&self, host: &HostRecord) -> HostOutcome {
        println!("Connecting to host {}...", host.address);
        let mut session = match self.factory.connect(host) {
            Ok(session) => session,
            Err(err) => {
                println!("\tConnection failed: {err:#}");
                return HostOutcome::ConnectFailed;
            }
        };

        for step in Step::SEQUENCE {
            if let Err(err) = self.verify_or_remediate(&mut session, host, step) {
                println!("\t{err:#}");
                return HostOutcome::StepFailed(step);
            }
        }
        HostOutcome::Provisioned
    }

    /// Run one step: check whether its effect is already present and, if
    /// not, remediate once. Non-zero remediation status is an error; the
    /// asset pre-fetch is the exception, its remediation is dispatched
    /// detached and always counts as accepted.
    ///
    /// Installing docker changes what the remote shell can see (binary on
    /// PATH, group membership), so after that remediation the session is
    /// replaced with a fresh connection before any later command runs.
    fn verify_or_remediate(
        &self,
        session: &mut SessionHandle,
        host: &HostRecord,
        step: Step,
    ) -> Result<()> {
        let indent = match self.mode {
            Mode::Setup => "",
            Mode::Check => {
                println!("{}", step.check_heading());
                match verify(session.as_mut(), step, self.cfg)? {
                    Verification::Present => {
                        debug!(step = step.label(), "already present, skipping remediation");
                        return Ok(());
                    }
                    Verification::Absent(lines) => {
                        for line in &lines {
                            println!("\t{line}");
                        }
                        "\t"
                    }
                    Verification::Ambiguous(stderr) => {
                        bail!(
                            "Error checking {}: remote stderr: {}",
                            step.label(),
                            stderr.trim()
                        );
                    }
                }
            }
        };

        let status = execute(session.as_mut(), step, self.cfg, indent)?;
        if status != 0 {
            bail!("{} exited with status {status}", step.label());
        }

        if step == Step::InstallRuntime {
            println!("{indent}Reconnecting for the install to take effect...");
            *session = self
                .factory
                .connect(host)
                .context("reconnect after install")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        ScriptedConnect, ScriptedFactory, fail, host_record, ok, with_stderr,
    };

    fn cfg() -> ProvisionerConfig {
        ProvisionerConfig::default()
    }

    const FULL_LISTING: &str =
        "REPOSITORY TAG\nconf-hive-metastore x\nprestodb/presto x\nminio/minio x\nmysql x\n";

    #[test]
    fn ambiguous_check_abandons_host() {
        let factory = ScriptedFactory::new(vec![ScriptedConnect::Session(vec![with_stderr(
            "ls ~",
            "ls: boom",
        )])]);

        let outcome = HostProvisioner::new(&factory, &cfg(), Mode::Check).run(&host_record(1));
        assert_eq!(outcome, HostOutcome::StepFailed(Step::CloneRepository));
        assert!(!factory.log_contains("git clone"));
    }

    #[test]
    fn failed_remediation_stops_the_sequence() {
        let factory = ScriptedFactory::new(vec![ScriptedConnect::Session(vec![
            ok("ls ~", ""),
            ok("ssh-keyscan", ""),
            fail("git clone", 128),
        ])]);

        let outcome = HostProvisioner::new(&factory, &cfg(), Mode::Check).run(&host_record(1));
        assert_eq!(outcome, HostOutcome::StepFailed(Step::CloneRepository));
        assert!(!factory.log_contains("which docker"));
    }

    #[test]
    fn healthy_host_runs_checks_only() {
        let factory = ScriptedFactory::new(vec![ScriptedConnect::Session(vec![
            ok("ls ~", "presto-iceberg-lab\n"),
            ok("which docker", "/usr/bin/docker\n"),
            ok("docker image list", FULL_LISTING),
        ])]);

        let outcome = HostProvisioner::new(&factory, &cfg(), Mode::Check).run(&host_record(1));
        assert_eq!(outcome, HostOutcome::Provisioned);
        assert!(!factory.log_contains("git clone"));
        assert!(!factory.log_contains("docker-install"));
        assert!(!factory.log_contains("detached"));
    }
}
