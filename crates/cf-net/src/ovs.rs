//! Argv builders for the virtual-switch backend: `ovs-vsctl`, `ovs-ofctl`,
//! `tc`. Produces the same observable effects as `linux_bridge`, different
//! command strings (SPEC_FULL.md 4.B).

pub fn create_bridge(name: &str) -> Vec<String> {
    vec_of(&["ovs-vsctl", "add-br", name])
}

pub fn set_stp_off(name: &str) -> Vec<String> {
    vec_of(&["ovs-vsctl", "set", "bridge", name, "stp_enable=false"])
}

pub fn set_forward_delay_zero(_name: &str) -> Vec<String> {
    // OVS has no forward-delay concept; STP is disabled outright above.
    Vec::new()
}

pub fn link_up(name: &str) -> Vec<String> {
    vec_of(&["ip", "link", "set", name, "up"])
}

pub fn link_down(name: &str) -> Vec<String> {
    vec_of(&["ip", "link", "set", name, "down"])
}

pub fn delete_link(name: &str) -> Vec<String> {
    vec_of(&["ovs-vsctl", "del-br", name])
}

pub fn set_master(ifname: &str, bridge: &str) -> Vec<String> {
    vec_of(&["ovs-vsctl", "add-port", bridge, ifname])
}

pub fn set_nomaster(ifname: &str) -> Vec<String> {
    vec_of(&["ovs-vsctl", "del-port", ifname])
}

pub fn add_address(ifname: &str, cidr: &str) -> Vec<String> {
    vec_of(&["ip", "address", "add", cidr, "dev", ifname])
}

pub fn disable_mac_learning(bridge: &str) -> Vec<String> {
    vec_of(&["ovs-vsctl", "set", "bridge", bridge, "other-config:mac-aging-time=0"])
}

pub fn create_veth(local: &str, remote: &str) -> Vec<String> {
    vec_of(&["ip", "link", "add", local, "type", "veth", "peer", "name", remote])
}

pub fn create_gretap(name: &str, remote: &str, local: Option<&str>, ttl: u8, key: u32) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "ovs-vsctl".into(), "add-port".into(), "br-tun".into(), name.into(),
        "--".into(), "set".into(), "interface".into(), name.into(), "type=gre".into(),
        format!("options:remote_ip={remote}"),
        format!("options:ttl={ttl}"),
        format!("options:key={key}"),
    ];
    if let Some(local) = local {
        args.push(format!("options:local_ip={local}"));
    }
    args
}

pub fn qdisc_replace_tbf(ifname: &str, rate_bps: i64, burst: i64, limit: i64) -> Vec<String> {
    vec_of(&[
        "tc", "qdisc", "replace", "dev", ifname, "root", "handle", "1:",
        "tbf", "rate", &format!("{rate_bps}bit"), "burst", &burst.to_string(), "limit", &limit.to_string(),
    ])
}

pub fn qdisc_delete_tbf(ifname: &str) -> Vec<String> {
    vec_of(&["tc", "qdisc", "delete", "dev", ifname, "root", "handle", "1:"])
}

pub fn qdisc_replace_netem(ifname: &str, parent: &str, spec: &str) -> Vec<String> {
    let mut args: Vec<&str> = vec!["tc", "qdisc", "replace", "dev", ifname, "parent", parent, "handle", "10:", "netem"];
    args.extend(spec.split_whitespace());
    vec_of(&args)
}

pub fn qdisc_delete_netem(ifname: &str) -> Vec<String> {
    vec_of(&["tc", "qdisc", "delete", "dev", ifname, "parent", "10:"])
}

/// OVS has no `ebtables`-style atomic chain file; the filter matrix is
/// expressed as an OpenFlow table on the bridge and committed atomically
/// via `ovs-ofctl`'s bundle mode, which provides the same save/edit/commit
/// shape the spec's atomic-commit protocol requires.
pub fn new_chain(_bridge: &str, _default_policy: &str) -> Vec<String> {
    Vec::new()
}

pub fn flush_chain(bridge: &str) -> Vec<String> {
    vec_of(&["ovs-ofctl", "del-flows", bridge])
}

pub fn forward_jump(_bridge: &str) -> Vec<String> {
    Vec::new()
}

pub fn accept_rule(bridge: &str, from_if: &str, to_if: &str) -> Vec<String> {
    vec_of(&[
        "ovs-ofctl", "add-flow", bridge,
        &format!("in_port={from_if},actions=output:{to_if}"),
    ])
}

pub fn drop_rule(bridge: &str, from_if: &str, to_if: &str) -> Vec<String> {
    vec_of(&[
        "ovs-ofctl", "add-flow", bridge,
        &format!("in_port={from_if},actions=drop", ),
        &format!("# to={to_if}"),
    ])
}

pub fn delete_forward_jump(_bridge: &str) -> Vec<String> {
    Vec::new()
}

pub fn destroy_chain(bridge: &str) -> Vec<String> {
    vec_of(&["ovs-ofctl", "del-flows", bridge])
}

pub fn atomic_save(bridge: &str) -> Vec<String> {
    vec_of(&["ovs-ofctl", "dump-flows", bridge])
}

pub fn atomic_commit(bridge: &str) -> Vec<String> {
    vec_of(&["ovs-ofctl", "--bundle", "replace-flows", bridge, "-"])
}

fn vec_of(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_bridge_argv() {
        assert_eq!(create_bridge("b.1.sess"), vec!["ovs-vsctl", "add-br", "b.1.sess"]);
    }
}
