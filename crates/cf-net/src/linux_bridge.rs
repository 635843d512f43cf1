//! Argv builders for the native Linux bridge backend: `ip`, `tc`, `ebtables`.
//! Each function is a pure string-assembly helper; `NetClient` hands the
//! result to a `HostExecutor`.

pub fn create_bridge(name: &str) -> Vec<String> {
    vec_of(&["ip", "link", "add", "name", name, "type", "bridge"])
}

pub fn set_stp_off(name: &str) -> Vec<String> {
    vec_of(&["ip", "link", "set", name, "type", "bridge", "stp_state", "0"])
}

pub fn set_forward_delay_zero(name: &str) -> Vec<String> {
    vec_of(&["ip", "link", "set", name, "type", "bridge", "forward_delay", "0"])
}

pub fn link_up(name: &str) -> Vec<String> {
    vec_of(&["ip", "link", "set", name, "up"])
}

pub fn link_down(name: &str) -> Vec<String> {
    vec_of(&["ip", "link", "set", name, "down"])
}

pub fn delete_link(name: &str) -> Vec<String> {
    vec_of(&["ip", "link", "delete", name])
}

pub fn set_master(ifname: &str, bridge: &str) -> Vec<String> {
    vec_of(&["ip", "link", "set", ifname, "master", bridge])
}

pub fn set_nomaster(ifname: &str) -> Vec<String> {
    vec_of(&["ip", "link", "set", ifname, "nomaster"])
}

pub fn add_address(ifname: &str, cidr: &str) -> Vec<String> {
    vec_of(&["ip", "address", "add", cidr, "dev", ifname])
}

pub fn disable_mac_learning(bridge: &str) -> Vec<String> {
    vec_of(&["ip", "link", "set", bridge, "type", "bridge", "ageing_time", "0"])
}

pub fn create_veth(local: &str, remote: &str) -> Vec<String> {
    vec_of(&[
        "ip", "link", "add", local, "type", "veth", "peer", "name", remote,
    ])
}

pub fn create_gretap(name: &str, remote: &str, local: Option<&str>, ttl: u8, key: u32) -> Vec<String> {
    let ttl_s = ttl.to_string();
    let key_s = key.to_string();
    let mut args: Vec<&str> = vec![
        "ip", "link", "add", name, "type", "gretap", "remote", remote,
    ];
    if let Some(local) = local {
        args.push("local");
        args.push(local);
    }
    args.push("ttl");
    args.push(&ttl_s);
    args.push("key");
    args.push(&key_s);
    vec_of(&args)
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

pub fn new_chain(bridge: &str, default_policy: &str) -> Vec<String> {
    vec_of(&["ebtables", "--atomic-file", ATOMIC_PLACEHOLDER, "-N", bridge, "-P", default_policy])
}

pub fn flush_chain(bridge: &str) -> Vec<String> {
    vec_of(&["ebtables", "--atomic-file", ATOMIC_PLACEHOLDER, "-F", bridge])
}

pub fn forward_jump(bridge: &str) -> Vec<String> {
    vec_of(&[
        "ebtables", "--atomic-file", ATOMIC_PLACEHOLDER, "-A", "FORWARD", "--logical-in", bridge, "-j", bridge,
    ])
}

pub fn accept_rule(bridge: &str, from_if: &str, to_if: &str) -> Vec<String> {
    vec_of(&[
        "ebtables", "--atomic-file", ATOMIC_PLACEHOLDER, "-A", bridge,
        "-i", from_if, "-o", to_if, "-j", "ACCEPT",
    ])
}

pub fn drop_rule(bridge: &str, from_if: &str, to_if: &str) -> Vec<String> {
    vec_of(&[
        "ebtables", "--atomic-file", ATOMIC_PLACEHOLDER, "-A", bridge,
        "-i", from_if, "-o", to_if, "-j", "DROP",
    ])
}

pub fn delete_forward_jump(bridge: &str) -> Vec<String> {
    vec_of(&["ebtables", "-D", "FORWARD", "--logical-in", bridge, "-j", bridge])
}

pub fn destroy_chain(bridge: &str) -> Vec<String> {
    vec_of(&["ebtables", "-X", bridge])
}

pub fn atomic_save(atomic_file: &str) -> Vec<String> {
    vec_of(&["ebtables", "--atomic-file", atomic_file, "--atomic-save"])
}

pub fn atomic_commit(atomic_file: &str) -> Vec<String> {
    vec_of(&["ebtables", "--atomic-file", atomic_file, "--atomic-commit"])
}

/// Placeholder substituted with the real atomic-file path by `NetClient`
/// before the command is run, so these builders stay pure functions of
/// their domain arguments.
pub const ATOMIC_PLACEHOLDER: &str = "__ATOMIC_FILE__";

fn vec_of(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_bridge_argv() {
        assert_eq!(
            create_bridge("b.1.sess"),
            vec!["ip", "link", "add", "name", "b.1.sess", "type", "bridge"]
        );
    }

    #[test]
    fn accept_rule_argv_has_both_interfaces() {
        let argv = accept_rule("b.1.sess", "veth0", "veth1");
        assert!(argv.contains(&"veth0".to_string()));
        assert!(argv.contains(&"veth1".to_string()));
        assert!(argv.contains(&"ACCEPT".to_string()));
    }
}
