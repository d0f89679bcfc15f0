use crate::config::NodeConfig;
use crate::error::{PortError, PortParseError};

/// Port of a `<host>:<port>` address; the host may be empty
pub fn parse_port(addr: &str) -> Result<i32, PortError> {
    let (_, port) = addr.rsplit_once(':').ok_or(PortError::Missing)?;
    Ok(port.parse::<i32>()?)
}

fn field_port(field: &'static str, value: &str) -> Result<i32, PortParseError> {
    parse_port(value).map_err(|source| PortParseError {
        field,
        value: value.to_owned(),
        source,
    })
}

/// Ports a node listens on, derived from its configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePorts {
    pub api: i32,
    pub debug: i32,
    pub p2p: i32,
    /// externally exposed p2p port, only when a NAT address is configured
    pub nat: Option<i32>,
}

impl NodePorts {
    pub fn derive(config: &NodeConfig) -> Result<Self, PortParseError> {
        let nat = if config.nat_addr.is_empty() {
            None
        } else {
            Some(field_port("nat-addr", &config.nat_addr)?)
        };

        Ok(Self {
            api: field_port("api-addr", &config.api_addr)?,
            debug: field_port("debug-api-addr", &config.debug_api_addr)?,
            p2p: field_port("p2p-addr", &config.p2p_addr)?,
            nat,
        })
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("0.0.0.0:1634"), Ok(1634));
        assert_eq!(parse_port(":8080"), Ok(8080));
        assert_eq!(parse_port("[::1]:1633"), Ok(1633));
        assert_eq!(parse_port("invalid"), Err(PortError::Missing));
        assert!(matches!(parse_port("host:"), Err(PortError::Invalid(_))));
        assert!(matches!(parse_port("host:api"), Err(PortError::Invalid(_))));
    }

    #[test]
    fn test_derive_ports() {
        let config = NodeConfig::default();
        let ports = NodePorts::derive(&config).expect("ports");
        assert_eq!(ports.api, 1633);
        assert_eq!(ports.p2p, 1634);
        assert_eq!(ports.debug, 1635);
        assert_eq!(ports.nat, None);

        let config = NodeConfig {
            nat_addr: "203.0.113.7:31634".to_owned(),
            ..Default::default()
        };
        assert_eq!(NodePorts::derive(&config).expect("ports").nat, Some(31634));
    }

    #[test]
    fn test_derive_names_bad_field() {
        let config = NodeConfig {
            debug_api_addr: "localhost".to_owned(),
            ..Default::default()
        };
        let err = NodePorts::derive(&config).expect_err("bad debug address");
        assert_eq!(err.field, "debug-api-addr");
        assert_eq!(err.value, "localhost");
        assert_eq!(
            err.to_string(),
            "parsing port of debug-api-addr from \"localhost\": no port segment"
        );
    }
}
