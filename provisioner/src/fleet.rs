//! Fleet driver: one host at a time, failures contained per host.

use tracing::warn;

use crate::config::ProvisionerConfig;
use crate::provision::{HostOutcome, HostProvisioner, Mode};
use crate::roster::HostRecord;
use crate::session::SessionFactory;

/// Drive every roster host through the per-host workflow, strictly
/// sequentially. A failed host is logged and the driver moves on; nothing is
/// aggregated and nothing stops the run early. Progress goes to stdout.
pub fn run_fleet(
    factory: &dyn SessionFactory,
    hosts: &[HostRecord],
    cfg: &ProvisionerConfig,
    mode: Mode,
) {
    let provisioner = HostProvisioner::new(factory, cfg, mode);
    for host in hosts {
        println!(
            "-------------------- {} env {} --------------------",
            mode.banner(),
            host.env_num
        );
        match provisioner.run(host) {
            HostOutcome::Provisioned => {}
            HostOutcome::ConnectFailed => {
                warn!(env = host.env_num, address = %host.address, "connection failed");
            }
            HostOutcome::StepFailed(step) => {
                warn!(env = host.env_num, step = step.label(), "host abandoned");
            }
        }
        println!();
    }
}
