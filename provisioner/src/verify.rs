//! Read-only predicates deciding whether a step's effect is already present.

use anyhow::{Context, Result};

use crate::config::ProvisionerConfig;
use crate::session::RemoteSession;
use crate::steps::Step;

pub const LIST_HOME_CMD: &str = "ls ~";
pub const LOCATE_DOCKER_CMD: &str = "which docker";
pub const LIST_IMAGES_CMD: &str = "docker image list";

/// Marker some shells print on stdout when a binary cannot be located.
const NOT_FOUND_MARKER: &str = "not found";

/// Result of checking one step's effect on the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The step's effect is present; nothing to do.
    Present,
    /// The step's effect is missing. Carries one operator-facing line per
    /// missing item (a single line for clone/install, one per absent image
    /// for the asset check).
    Absent(Vec<String>),
    /// The inspection command wrote to stderr; remote state is unknown.
    Ambiguous(String),
}

/// Check whether `step`'s effect is already present. Read-only: issues only
/// inspection commands, never mutates remote state.
pub fn verify(
    session: &mut dyn RemoteSession,
    step: Step,
    cfg: &ProvisionerConfig,
) -> Result<Verification> {
    let timeout = cfg.command_timeout();
    match step {
        Step::CloneRepository => {
            let out = session
                .exec(LIST_HOME_CMD, timeout)
                .context("list home directory")?;
            if !out.stderr.trim().is_empty() {
                return Ok(Verification::Ambiguous(out.stderr));
            }
            if out.stdout.contains(&cfg.repo_name) {
                Ok(Verification::Present)
            } else {
                Ok(Verification::Absent(vec![
                    "Repository not present in home directory".to_string(),
                ]))
            }
        }
        Step::InstallRuntime => {
            let out = session
                .exec(LOCATE_DOCKER_CMD, timeout)
                .context("locate docker binary")?;
            if !out.stderr.trim().is_empty() {
                return Ok(Verification::Ambiguous(out.stderr));
            }
            let path = out.stdout.trim();
            if path.is_empty() || path.contains(NOT_FOUND_MARKER) {
                Ok(Verification::Absent(vec!["Docker not installed".to_string()]))
            } else {
                Ok(Verification::Present)
            }
        }
        Step::PrefetchAssets => {
            let out = session
                .exec(LIST_IMAGES_CMD, timeout)
                .context("list docker images")?;
            if !out.stderr.trim().is_empty() {
                return Ok(Verification::Ambiguous(out.stderr));
            }
            let missing: Vec<String> = cfg
                .expected_images
                .iter()
                .filter(|image| !out.stdout.contains(image.as_str()))
                .map(|image| format!("Image '{image}' not installed"))
                .collect();
            if missing.is_empty() {
                Ok(Verification::Present)
            } else {
                Ok(Verification::Absent(missing))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedSession, ok, shared_log, with_stderr};

    fn cfg() -> ProvisionerConfig {
        ProvisionerConfig::default()
    }

    fn check(replies: Vec<crate::test_support::ScriptedExec>, step: Step) -> Verification {
        let mut session = ScriptedSession::new(replies, shared_log());
        verify(&mut session, step, &cfg()).expect("verify")
    }

    #[test]
    fn repo_in_home_listing_is_present() {
        let verdict = check(
            vec![ok("ls ~", "logs\npresto-iceberg-lab\nsnap\n")],
            Step::CloneRepository,
        );
        assert_eq!(verdict, Verification::Present);
    }

    #[test]
    fn repo_missing_from_home_listing_is_absent() {
        let verdict = check(vec![ok("ls ~", "logs\nsnap\n")], Step::CloneRepository);
        assert!(matches!(verdict, Verification::Absent(_)));
    }

    #[test]
    fn stderr_during_home_listing_is_ambiguous() {
        let verdict = check(
            vec![with_stderr("ls ~", "ls: cannot access home")],
            Step::CloneRepository,
        );
        assert!(matches!(verdict, Verification::Ambiguous(_)));
    }

    #[test]
    fn docker_path_is_present() {
        let verdict = check(
            vec![ok("which docker", "/usr/bin/docker\n")],
            Step::InstallRuntime,
        );
        assert_eq!(verdict, Verification::Present);
    }

    #[test]
    fn empty_locate_output_is_absent() {
        let verdict = check(vec![ok("which docker", "")], Step::InstallRuntime);
        assert_eq!(
            verdict,
            Verification::Absent(vec!["Docker not installed".to_string()])
        );
    }

    #[test]
    fn not_found_marker_is_absent() {
        let verdict = check(
            vec![ok("which docker", "docker not found\n")],
            Step::InstallRuntime,
        );
        assert!(matches!(verdict, Verification::Absent(_)));
    }

    #[test]
    fn full_inventory_is_present() {
        let listing = "REPOSITORY TAG\nconf-hive-metastore latest\nprestodb/presto 0.288\nminio/minio latest\nmysql 8\n";
        let verdict = check(vec![ok("docker image list", listing)], Step::PrefetchAssets);
        assert_eq!(verdict, Verification::Present);
    }

    #[test]
    fn one_missing_image_is_named() {
        let listing = "REPOSITORY TAG\nprestodb/presto 0.288\nminio/minio latest\nmysql 8\n";
        let verdict = check(vec![ok("docker image list", listing)], Step::PrefetchAssets);
        assert_eq!(
            verdict,
            Verification::Absent(vec![
                "Image 'conf-hive-metastore' not installed".to_string()
            ])
        );
    }

    #[test]
    fn every_missing_image_is_named() {
        let verdict = check(
            vec![ok("docker image list", "REPOSITORY TAG\n")],
            Step::PrefetchAssets,
        );
        match verdict {
            Verification::Absent(lines) => assert_eq!(lines.len(), 4),
            other => panic!("expected Absent, got {other:?}"),
        }
    }
}
