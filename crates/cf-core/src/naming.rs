use crate::error::{FabricError, Result};

/// Linux kernel interface-name limit (IFNAMSIZ - 1 for the NUL terminator).
pub const IFNAMSIZ: usize = 16;

pub fn validate_name_len(name: &str) -> Result<()> {
    let len = name.len();
    if len >= IFNAMSIZ {
        return Err(FabricError::NameTooLong {
            name: name.to_string(),
            len,
            limit: IFNAMSIZ,
        });
    }
    Ok(())
}

/// `b.<id>.<session-short-id>`
pub fn bridge_name(network_id: u32, session_short_id: &str) -> Result<String> {
    let name = format!("b.{network_id}.{session_short_id}");
    validate_name_len(&name)?;
    Ok(name)
}

/// The two veth-pair endpoint names for a bridge-to-bridge link between
/// `self_id` and `peer_id`: `veth<self-hex>.<peer-hex>.<sess>` on this side,
/// `veth<peer-hex>.<self-hex>.<sess>` on the peer's side.
pub fn veth_pair_names(self_id: u32, peer_id: u32, session_short_id: &str) -> Result<(String, String)> {
    let local = format!("veth{self_id:x}.{peer_id:x}.{session_short_id}");
    let remote = format!("veth{peer_id:x}.{self_id:x}.{session_short_id}");
    validate_name_len(&local)?;
    validate_name_len(&remote)?;
    Ok((local, remote))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_name_has_expected_shape() {
        assert_eq!(bridge_name(7, "ab12").unwrap(), "b.7.ab12");
    }

    #[test]
    fn bridge_name_rejects_overlong() {
        let err = bridge_name(7, "this-session-id-is-way-too-long").unwrap_err();
        assert!(matches!(err, FabricError::NameTooLong { .. }));
    }

    #[test]
    fn veth_pair_names_are_mirrored() {
        let (local, remote) = veth_pair_names(1, 2, "s1").unwrap();
        assert_eq!(local, "veth1.2.s1");
        assert_eq!(remote, "veth2.1.s1");
    }

    #[test]
    fn veth_pair_names_rejects_overlong() {
        let err = veth_pair_names(0xdead, 0xbeef, "toolongsessionid").unwrap_err();
        assert!(matches!(err, FabricError::NameTooLong { .. }));
    }
}
