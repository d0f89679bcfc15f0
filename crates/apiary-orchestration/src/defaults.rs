// bee application
pub const BEE_APP_NAME: &str = "bee";
pub const BEE_CONTAINER: &str = "bee";
pub const BEE_IMAGE: &str = "ethersphere/bee:latest";
pub const BEE_DATA_DIR: &str = "/home/bee/.bee";
pub const BEE_KEYS_DIR: &str = "/home/bee/.bee/keys";
pub const BEE_CONFIG_FILE: &str = ".bee.yaml";
pub const BEE_CONFIG_PATH: &str = "/home/bee/.bee.yaml";
pub const BEE_NETWORK_ID: u64 = 1987;
pub const BEE_VERBOSITY: u8 = 5;

// listen addresses
pub const API_ADDR: &str = ":1633";
pub const P2P_ADDR: &str = ":1634";
pub const DEBUG_API_ADDR: &str = ":1635";

// named container and service ports
pub const API_PORT_NAME: &str = "api";
pub const P2P_PORT_NAME: &str = "p2p";
pub const DEBUG_PORT_NAME: &str = "debug";

// clef signer sidecar
pub const CLEF_CONTAINER: &str = "clef";
pub const CLEF_IMAGE: &str = "ethersphere/clef:latest";
pub const CLEF_ENDPOINT: &str = "http://localhost:8550";
pub const CLEF_DATA_DIR: &str = "/app/data";
pub const CLEF_KEY_PATH: &str = "/app/data/keystore/clef.key";
pub const CLEF_PASSWORD_PATH: &str = "/app/data/password";

// init container
pub const INIT_CONTAINER: &str = "init-bee";
pub const INIT_IMAGE: &str = "busybox:1.36";
pub const INIT_KEYS_DIR: &str = "/tmp/keys";
pub const INIT_STAGE_DIR: &str = "/tmp/staged";

// pod security
pub const FS_GROUP: i64 = 999;

// workload policy
pub const REPLICAS: i32 = 1;
pub const UPDATE_STRATEGY: &str = "OnDelete";
pub const POD_MANAGEMENT_POLICY: &str = "OrderedReady";
pub const IMAGE_PULL_POLICY: &str = "IfNotPresent";

// persistence
pub const DATA_VOLUME: &str = "data";
pub const STORAGE_REQUEST: &str = "34Gi";
pub const ACCESS_MODE: &str = "ReadWriteOnce";

// probes
pub const HEALTH_PATH: &str = "/health";
pub const READINESS_PATH: &str = "/readiness";

// cluster
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_NODE_TIMEOUT_SECS: u64 = 300;
pub const BOOTNODE_GROUP: &str = "bootnode";
pub const FULL_NODE_GROUP: &str = "bee";
pub const LIGHT_NODE_GROUP: &str = "light";

// common labels
pub const NAME_LABEL: &str = "app.kubernetes.io/name";
pub const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";
pub const PART_OF_LABEL: &str = "app.kubernetes.io/part-of";
