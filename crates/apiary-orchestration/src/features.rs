//! Which key-bearing volumes a node gets.
//!
//! Presence of each key is computed once per node; translators filter the static
//! [`KEY_VOLUMES`] table with it.

use crate::spec::NodeKeys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Clef,
    Libp2p,
    Swarm,
}

/// Secret backing a key volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySecret {
    /// the shared `<name>-keys` secret
    Keys,
    /// the `<name>-clef` secret
    Clef,
}

impl KeySecret {
    pub fn name(&self, node: &str) -> String {
        match self {
            Self::Keys => format!("{node}-keys"),
            Self::Clef => format!("{node}-clef"),
        }
    }
}

/// How one key reaches the bee container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyVolume {
    pub kind: KeyKind,
    pub volume: &'static str,
    pub secret: KeySecret,
    /// entry in the backing secret
    pub secret_key: &'static str,
    /// file name under the keys directory
    pub file: &'static str,
    pub mount_path: &'static str,
}

pub static KEY_VOLUMES: [KeyVolume; 3] = [
    KeyVolume {
        kind: KeyKind::Clef,
        volume: "clef-key",
        secret: KeySecret::Clef,
        secret_key: "key",
        file: "clef.key",
        mount_path: "/home/bee/.bee/keys/clef.key",
    },
    KeyVolume {
        kind: KeyKind::Libp2p,
        volume: "libp2p-key",
        secret: KeySecret::Keys,
        secret_key: "libp2p",
        file: "libp2p.key",
        mount_path: "/home/bee/.bee/keys/libp2p.key",
    },
    KeyVolume {
        kind: KeyKind::Swarm,
        volume: "swarm-key",
        secret: KeySecret::Keys,
        secret_key: "swarm",
        file: "swarm.key",
        mount_path: "/home/bee/.bee/keys/swarm.key",
    },
];

/// Key presence of one node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyFeatures {
    clef: bool,
    libp2p: bool,
    swarm: bool,
}

impl KeyFeatures {
    pub fn from_keys(keys: &NodeKeys) -> Self {
        Self {
            clef: !keys.clef.is_empty(),
            libp2p: !keys.libp2p.is_empty(),
            swarm: !keys.swarm.is_empty(),
        }
    }

    pub fn enabled(&self, kind: KeyKind) -> bool {
        match kind {
            KeyKind::Clef => self.clef,
            KeyKind::Libp2p => self.libp2p,
            KeyKind::Swarm => self.swarm,
        }
    }

    /// key volumes to include, in table order
    pub fn volumes(self) -> impl Iterator<Item = &'static KeyVolume> {
        KEY_VOLUMES
            .iter()
            .filter(move |volume| self.enabled(volume.kind))
    }

    /// key volumes backed by the shared keys secret
    pub fn shared_volumes(self) -> impl Iterator<Item = &'static KeyVolume> {
        self.volumes()
            .filter(|volume| volume.secret == KeySecret::Keys)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_features_follow_keys() {
        let features = KeyFeatures::from_keys(&NodeKeys::swarm("abc"));
        assert!(features.enabled(KeyKind::Swarm));
        assert!(!features.enabled(KeyKind::Clef));
        assert!(!features.enabled(KeyKind::Libp2p));

        let volumes: Vec<&str> = features.volumes().map(|v| v.volume).collect();
        assert_eq!(volumes, vec!["swarm-key"]);
    }

    #[test]
    fn test_no_keys_no_volumes() {
        let features = KeyFeatures::from_keys(&NodeKeys::default());
        assert_eq!(features.volumes().count(), 0);
    }

    #[test]
    fn test_clef_is_not_shared() {
        let keys = NodeKeys {
            clef: "{}".to_owned(),
            libp2p: "{}".to_owned(),
            ..Default::default()
        };
        let features = KeyFeatures::from_keys(&keys);
        let shared: Vec<&str> = features.shared_volumes().map(|v| v.volume).collect();
        assert_eq!(shared, vec!["libp2p-key"]);
        assert_eq!(KeySecret::Clef.name("bee-0"), "bee-0-clef");
    }
}
