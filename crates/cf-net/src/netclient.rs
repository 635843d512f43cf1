use std::sync::Arc;

use cf_core::{Backend, Result};
use cf_exec::HostExecutor;

use crate::{linux_bridge, ovs};

/// The finite set of kernel-primitive operations the fabric core needs,
/// dispatched to one of two backends chosen once at construction time
/// (SPEC_FULL.md 4.B). Argv assembly lives in `linux_bridge`/`ovs`; this
/// type only wires the chosen backend's argv to a `HostExecutor`.
#[derive(Debug, Clone)]
pub struct NetClient {
    backend: Backend,
    executor: Arc<dyn HostExecutor>,
}

impl NetClient {
    pub fn new(backend: Backend, executor: Arc<dyn HostExecutor>) -> Self {
        Self { backend, executor }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    async fn run(&self, argv: Vec<String>) -> Result<()> {
        if argv.is_empty() {
            return Ok(());
        }
        self.executor.run(&argv, None).await?;
        Ok(())
    }

    pub async fn create_bridge(&self, name: &str) -> Result<()> {
        match self.backend {
            Backend::LinuxBridge => {
                self.run(linux_bridge::create_bridge(name)).await?;
                self.run(linux_bridge::set_stp_off(name)).await?;
                self.run(linux_bridge::set_forward_delay_zero(name)).await?;
                self.run(linux_bridge::link_up(name)).await
            }
            Backend::Ovs => {
                self.run(ovs::create_bridge(name)).await?;
                self.run(ovs::set_stp_off(name)).await?;
                self.run(ovs::link_up(name)).await
            }
        }
    }

    pub async fn delete_bridge(&self, name: &str) -> Result<()> {
        match self.backend {
            Backend::LinuxBridge => {
                self.run(linux_bridge::link_down(name)).await?;
                self.run(linux_bridge::delete_link(name)).await
            }
            Backend::Ovs => self.run(ovs::delete_link(name)).await,
        }
    }

    /// True iff any bridge whose name starts with `b.<id>.` exists.
    pub async fn existing_bridges(&self, id_prefix: &str) -> Result<bool> {
        let argv = vec!["ip".to_string(), "-o".to_string(), "link".to_string(), "show".to_string(), "type".to_string(), "bridge".to_string()];
        let out = self.executor.run(&argv, None).await?;
        Ok(out.stdout.lines().any(|line| line.contains(id_prefix)))
    }

    pub async fn set_interface_master(&self, bridge: &str, ifname: &str) -> Result<()> {
        match self.backend {
            Backend::LinuxBridge => self.run(linux_bridge::set_master(ifname, bridge)).await,
            Backend::Ovs => self.run(ovs::set_master(ifname, bridge)).await,
        }
    }

    pub async fn delete_interface(&self, _bridge: &str, ifname: &str) -> Result<()> {
        match self.backend {
            Backend::LinuxBridge => self.run(linux_bridge::set_nomaster(ifname)).await,
            Backend::Ovs => self.run(ovs::set_nomaster(ifname)).await,
        }
    }

    pub async fn create_address(&self, ifname: &str, cidr: &str) -> Result<()> {
        match self.backend {
            Backend::LinuxBridge => self.run(linux_bridge::add_address(ifname, cidr)).await,
            Backend::Ovs => self.run(ovs::add_address(ifname, cidr)).await,
        }
    }

    pub async fn disable_mac_learning(&self, bridge: &str) -> Result<()> {
        match self.backend {
            Backend::LinuxBridge => self.run(linux_bridge::disable_mac_learning(bridge)).await,
            Backend::Ovs => self.run(ovs::disable_mac_learning(bridge)).await,
        }
    }

    pub async fn create_veth(&self, local: &str, remote: &str) -> Result<()> {
        match self.backend {
            Backend::LinuxBridge => self.run(linux_bridge::create_veth(local, remote)).await,
            Backend::Ovs => self.run(ovs::create_veth(local, remote)).await,
        }
    }

    pub async fn create_gretap(&self, name: &str, remote: &str, local: Option<&str>, ttl: u8, key: u32) -> Result<()> {
        match self.backend {
            Backend::LinuxBridge => self.run(linux_bridge::create_gretap(name, remote, local, ttl, key)).await,
            Backend::Ovs => self.run(ovs::create_gretap(name, remote, local, ttl, key)).await,
        }
    }

    pub async fn link_up(&self, name: &str) -> Result<()> {
        match self.backend {
            Backend::LinuxBridge => self.run(linux_bridge::link_up(name)).await,
            Backend::Ovs => self.run(ovs::link_up(name)).await,
        }
    }

    pub async fn link_down(&self, name: &str) -> Result<()> {
        match self.backend {
            Backend::LinuxBridge => self.run(linux_bridge::link_down(name)).await,
            Backend::Ovs => self.run(ovs::link_down(name)).await,
        }
    }

    pub async fn delete_link(&self, name: &str) -> Result<()> {
        match self.backend {
            Backend::LinuxBridge => self.run(linux_bridge::delete_link(name)).await,
            Backend::Ovs => self.run(ovs::delete_link(name)).await,
        }
    }

    pub async fn qdisc_replace_tbf(&self, ifname: &str, rate_bps: i64, burst: i64, limit: i64) -> Result<()> {
        let argv = match self.backend {
            Backend::LinuxBridge => linux_bridge::qdisc_replace_tbf(ifname, rate_bps, burst, limit),
            Backend::Ovs => ovs::qdisc_replace_tbf(ifname, rate_bps, burst, limit),
        };
        self.run(argv).await
    }

    pub async fn qdisc_delete_tbf(&self, ifname: &str) -> Result<()> {
        let argv = match self.backend {
            Backend::LinuxBridge => linux_bridge::qdisc_delete_tbf(ifname),
            Backend::Ovs => ovs::qdisc_delete_tbf(ifname),
        };
        self.run(argv).await
    }

    pub async fn qdisc_replace_netem(&self, ifname: &str, parent: &str, spec: &str) -> Result<()> {
        let argv = match self.backend {
            Backend::LinuxBridge => linux_bridge::qdisc_replace_netem(ifname, parent, spec),
            Backend::Ovs => ovs::qdisc_replace_netem(ifname, parent, spec),
        };
        self.run(argv).await
    }

    pub async fn qdisc_delete_netem(&self, ifname: &str) -> Result<()> {
        let argv = match self.backend {
            Backend::LinuxBridge => linux_bridge::qdisc_delete_netem(ifname),
            Backend::Ovs => ovs::qdisc_delete_netem(ifname),
        };
        self.run(argv).await
    }

    // --- filter-chain primitives, used only by cf-filter's chain builder ---

    pub fn new_chain_argv(&self, bridge: &str, default_policy: &str, atomic_file: &str) -> Vec<String> {
        substitute(
            match self.backend {
                Backend::LinuxBridge => linux_bridge::new_chain(bridge, default_policy),
                Backend::Ovs => ovs::new_chain(bridge, default_policy),
            },
            atomic_file,
        )
    }

    pub fn flush_chain_argv(&self, bridge: &str, atomic_file: &str) -> Vec<String> {
        substitute(
            match self.backend {
                Backend::LinuxBridge => linux_bridge::flush_chain(bridge),
                Backend::Ovs => ovs::flush_chain(bridge),
            },
            atomic_file,
        )
    }

    pub fn forward_jump_argv(&self, bridge: &str, atomic_file: &str) -> Vec<String> {
        substitute(
            match self.backend {
                Backend::LinuxBridge => linux_bridge::forward_jump(bridge),
                Backend::Ovs => ovs::forward_jump(bridge),
            },
            atomic_file,
        )
    }

    pub fn accept_rule_argv(&self, bridge: &str, from_if: &str, to_if: &str, atomic_file: &str) -> Vec<String> {
        substitute(
            match self.backend {
                Backend::LinuxBridge => linux_bridge::accept_rule(bridge, from_if, to_if),
                Backend::Ovs => ovs::accept_rule(bridge, from_if, to_if),
            },
            atomic_file,
        )
    }

    pub fn drop_rule_argv(&self, bridge: &str, from_if: &str, to_if: &str, atomic_file: &str) -> Vec<String> {
        substitute(
            match self.backend {
                Backend::LinuxBridge => linux_bridge::drop_rule(bridge, from_if, to_if),
                Backend::Ovs => ovs::drop_rule(bridge, from_if, to_if),
            },
            atomic_file,
        )
    }

    pub fn delete_forward_jump_argv(&self, bridge: &str) -> Vec<String> {
        match self.backend {
            Backend::LinuxBridge => linux_bridge::delete_forward_jump(bridge),
            Backend::Ovs => ovs::delete_forward_jump(bridge),
        }
    }

    pub fn destroy_chain_argv(&self, bridge: &str) -> Vec<String> {
        match self.backend {
            Backend::LinuxBridge => linux_bridge::destroy_chain(bridge),
            Backend::Ovs => ovs::destroy_chain(bridge),
        }
    }

    pub fn atomic_save_argv(&self, bridge_or_file: &str) -> Vec<String> {
        match self.backend {
            Backend::LinuxBridge => linux_bridge::atomic_save(bridge_or_file),
            Backend::Ovs => ovs::atomic_save(bridge_or_file),
        }
    }

    pub fn atomic_commit_argv(&self, bridge_or_file: &str) -> Vec<String> {
        match self.backend {
            Backend::LinuxBridge => linux_bridge::atomic_commit(bridge_or_file),
            Backend::Ovs => ovs::atomic_commit(bridge_or_file),
        }
    }

    pub async fn exec_argv(&self, argv: Vec<String>) -> Result<cf_exec::CommandOutput> {
        self.executor.run(&argv, None).await
    }
}

fn substitute(argv: Vec<String>, atomic_file: &str) -> Vec<String> {
    argv.into_iter()
        .map(|arg| {
            if arg == linux_bridge::ATOMIC_PLACEHOLDER {
                atomic_file.to_string()
            } else {
                arg
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_exec::RecordingExecutor;

    #[tokio::test]
    async fn create_bridge_issues_four_commands_on_linux_backend() {
        let exec = Arc::new(RecordingExecutor::new());
        let client = NetClient::new(Backend::LinuxBridge, exec.clone());
        client.create_bridge("b.1.sess").await.unwrap();
        assert_eq!(exec.invocation_count(), 4);
    }

    #[tokio::test]
    async fn create_bridge_on_ovs_backend_uses_ovs_vsctl() {
        let exec = Arc::new(RecordingExecutor::new());
        let client = NetClient::new(Backend::Ovs, exec.clone());
        client.create_bridge("b.1.sess").await.unwrap();
        let invocations = exec.invocations();
        assert!(invocations[0].contains(&"ovs-vsctl".to_string()));
    }

    #[test]
    fn atomic_placeholder_is_substituted() {
        let exec = Arc::new(RecordingExecutor::new());
        let client = NetClient::new(Backend::LinuxBridge, exec);
        let argv = client.new_chain_argv("b.1.sess", "DROP", "/tmp/atomic");
        assert!(argv.contains(&"/tmp/atomic".to_string()));
        assert!(!argv.iter().any(|a| a == linux_bridge::ATOMIC_PLACEHOLDER));
    }
}
