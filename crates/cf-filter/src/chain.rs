use cf_core::{NetworkBase, Policy};
use cf_net::NetClient;

fn policy_str(policy: Policy) -> &'static str {
    match policy {
        Policy::Accept => "ACCEPT",
        Policy::Drop => "DROP",
    }
}

/// Rebuilds the filter-chain command list for one network from its current
/// adjacency map (SPEC_FULL.md 4.F "Chain build"). Sets `has_filter_chain`
/// on first build, matching the original's "flag it before you're done"
/// ordering. Each returned `Vec<String>` is one command to run during the
/// atomic-edit phase; callers skip empty ones (a no-op for backends like
/// OVS that express chain structure differently).
pub fn build_chain_commands(base: &mut NetworkBase, net: &NetClient, atomic_file: &str) -> Vec<Vec<String>> {
    let bridge = base.bridge_name.clone();
    let mut cmds = Vec::new();

    if base.has_filter_chain {
        cmds.push(net.flush_chain_argv(&bridge, atomic_file));
    } else {
        base.has_filter_chain = true;
        cmds.push(net.new_chain_argv(&bridge, policy_str(base.policy), atomic_file));
        cmds.push(net.forward_jump_argv(&bridge, atomic_file));
    }

    for (a, b, linked) in base.adjacency_entries() {
        let (Some(name_a), Some(name_b)) = (base.get(a).map(|i| i.name.clone()), base.get(b).map(|i| i.name.clone())) else {
            continue;
        };
        match (base.policy, linked) {
            (Policy::Drop, true) => {
                cmds.push(net.accept_rule_argv(&bridge, &name_a, &name_b, atomic_file));
                cmds.push(net.accept_rule_argv(&bridge, &name_b, &name_a, atomic_file));
            }
            (Policy::Accept, false) => {
                cmds.push(net.drop_rule_argv(&bridge, &name_a, &name_b, atomic_file));
                cmds.push(net.drop_rule_argv(&bridge, &name_b, &name_a, atomic_file));
            }
            _ => {}
        }
    }

    cmds
}
