//! Bee node configuration and its rendered `.bee.yaml` form.

use handlebars::Handlebars;
use handlebars::handlebars_helper;
use serde::Serialize;

use crate::defaults::*;
use crate::error::OrchestrationError;

const CONFIG_TEMPLATE_NAME: &str = "bee-config";

const CONFIG_TEMPLATE: &str = r#"api-addr: {{quote api_addr}}
block-time: {{block_time}}
bootnode: {{quote bootnodes}}
bootnode-mode: {{bootnode_mode}}
cache-capacity: {{cache_capacity}}
clef-signer-enable: {{clef_signer_enable}}
clef-signer-endpoint: {{quote clef_signer_endpoint}}
cors-allowed-origins: {{quote cors_allowed_origins}}
data-dir: {{quote data_dir}}
db-open-files-limit: {{db_open_files_limit}}
db-block-cache-capacity: {{db_block_cache_capacity}}
db-write-buffer-size: {{db_write_buffer_size}}
db-disable-seeks-compaction: {{db_disable_seeks_compaction}}
debug-api-addr: {{quote debug_api_addr}}
debug-api-enable: {{debug_api_enable}}
full-node: {{full_node}}
mainnet: {{mainnet}}
nat-addr: {{quote nat_addr}}
network-id: {{network_id}}
p2p-addr: {{quote p2p_addr}}
p2p-ws-enable: {{p2p_ws_enable}}
password: {{quote password}}
payment-early-percent: {{payment_early}}
payment-threshold: {{payment_threshold}}
payment-tolerance-percent: {{payment_tolerance}}
postage-stamp-address: {{quote postage_stamp_address}}
price-oracle-address: {{quote price_oracle_address}}
resolver-options: {{quote resolver_options}}
restricted: {{restricted}}
swap-enable: {{swap_enable}}
swap-endpoint: {{quote swap_endpoint}}
swap-factory-address: {{quote swap_factory_address}}
swap-initial-deposit: {{swap_initial_deposit}}
tracing-enable: {{tracing_enable}}
tracing-endpoint: {{quote tracing_endpoint}}
tracing-service-name: {{quote tracing_service_name}}
verbosity: {{verbosity}}
warmup-time: {{quote warmup_time}}
welcome-message: {{quote welcome_message}}
"#;

// double-quoted JSON strings are valid YAML scalars
handlebars_helper!(yaml_quote: |value: str| serde_json::to_string(value).unwrap_or_default());

/// Application configuration of a bee node.
///
/// String fields render quoted; empty strings render as `""`, which bee treats as unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeConfig {
    pub api_addr: String,
    pub block_time: u64,
    /// space separated multiaddrs
    pub bootnodes: String,
    pub bootnode_mode: bool,
    pub cache_capacity: u64,
    pub clef_signer_enable: bool,
    pub clef_signer_endpoint: String,
    pub cors_allowed_origins: String,
    pub data_dir: String,
    pub db_open_files_limit: u64,
    pub db_block_cache_capacity: u64,
    pub db_write_buffer_size: u64,
    pub db_disable_seeks_compaction: bool,
    pub debug_api_addr: String,
    pub debug_api_enable: bool,
    pub full_node: bool,
    pub mainnet: bool,
    pub nat_addr: String,
    pub network_id: u64,
    pub p2p_addr: String,
    pub p2p_ws_enable: bool,
    pub password: String,
    pub payment_early: u64,
    pub payment_threshold: u64,
    pub payment_tolerance: u64,
    pub postage_stamp_address: String,
    pub price_oracle_address: String,
    pub resolver_options: String,
    pub restricted: bool,
    pub swap_enable: bool,
    pub swap_endpoint: String,
    pub swap_factory_address: String,
    pub swap_initial_deposit: u64,
    pub tracing_enable: bool,
    pub tracing_endpoint: String,
    pub tracing_service_name: String,
    pub verbosity: u8,
    pub warmup_time: String,
    pub welcome_message: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            api_addr: API_ADDR.to_owned(),
            block_time: 15,
            bootnodes: String::new(),
            bootnode_mode: false,
            cache_capacity: 1_000_000,
            clef_signer_enable: false,
            clef_signer_endpoint: CLEF_ENDPOINT.to_owned(),
            cors_allowed_origins: String::new(),
            data_dir: BEE_DATA_DIR.to_owned(),
            db_open_files_limit: 200,
            db_block_cache_capacity: 4_194_304,
            db_write_buffer_size: 4_194_304,
            db_disable_seeks_compaction: false,
            debug_api_addr: DEBUG_API_ADDR.to_owned(),
            debug_api_enable: true,
            full_node: true,
            mainnet: false,
            nat_addr: String::new(),
            network_id: BEE_NETWORK_ID,
            p2p_addr: P2P_ADDR.to_owned(),
            p2p_ws_enable: false,
            password: "beekeeper".to_owned(),
            payment_early: 50,
            payment_threshold: 13_500_000,
            payment_tolerance: 25,
            postage_stamp_address: String::new(),
            price_oracle_address: String::new(),
            resolver_options: String::new(),
            restricted: false,
            swap_enable: false,
            swap_endpoint: String::new(),
            swap_factory_address: String::new(),
            swap_initial_deposit: 0,
            tracing_enable: false,
            tracing_endpoint: String::new(),
            tracing_service_name: BEE_APP_NAME.to_owned(),
            verbosity: BEE_VERBOSITY,
            warmup_time: "0s".to_owned(),
            welcome_message: String::new(),
        }
    }
}

impl NodeConfig {
    /// Render the configuration file mounted at `/home/bee/.bee.yaml`
    pub fn render(&self) -> Result<String, OrchestrationError> {
        let mut reg = Handlebars::new();
        reg.set_strict_mode(true);
        reg.register_escape_fn(handlebars::no_escape);
        reg.register_helper("quote", Box::new(yaml_quote));
        reg.register_template_string(CONFIG_TEMPLATE_NAME, CONFIG_TEMPLATE)?;

        Ok(reg.render(CONFIG_TEMPLATE_NAME, self)?)
    }
}

#[cfg(test)]
mod test {

    use std::collections::BTreeMap;

    use super::*;

    fn parse(rendered: &str) -> BTreeMap<String, serde_yaml::Value> {
        serde_yaml::from_str(rendered).expect("valid yaml")
    }

    #[test]
    fn test_render_defaults() {
        let rendered = NodeConfig::default().render().expect("render");

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), CONFIG_TEMPLATE.lines().count());
        assert!(lines.contains(&r#"api-addr: ":1633""#));
        assert!(lines.contains(&r#"p2p-addr: ":1634""#));
        assert!(lines.contains(&r#"debug-api-addr: ":1635""#));
        assert!(lines.contains(&r#"clef-signer-endpoint: "http://localhost:8550""#));
        assert!(lines.contains(&"network-id: 1987"));
        assert!(lines.contains(&"full-node: true"));
        assert!(lines.contains(&r#"nat-addr: """#));
        // every line is a flat key: value pair
        assert!(lines.iter().all(|line| line.contains(": ")));

        let values = parse(&rendered);
        assert_eq!(values.len(), lines.len());
        assert_eq!(values["network-id"].as_u64(), Some(1987));
        assert_eq!(values["nat-addr"].as_str(), Some(""));
    }

    #[test]
    fn test_render_is_not_html_escaped() {
        let config = NodeConfig {
            bootnodes: "/dns4/bootnode-0-headless.swarm.svc.cluster.local/tcp/1634/p2p/16Uiu2".to_owned(),
            welcome_message: "<hello & welcome>".to_owned(),
            ..Default::default()
        };
        let rendered = config.render().expect("render");

        assert!(rendered.contains(
            "bootnode: \"/dns4/bootnode-0-headless.swarm.svc.cluster.local/tcp/1634/p2p/16Uiu2\"\n"
        ));
        assert!(rendered.contains("welcome-message: \"<hello & welcome>\"\n"));
    }

    #[test]
    fn test_free_text_survives_yaml() {
        let messages = [
            "hi # there",
            "a: b",
            "say \"hello\"",
            "back\\slash",
            "line\nbreak",
            "- dash",
            "true",
        ];

        for message in messages {
            let config = NodeConfig {
                welcome_message: message.to_owned(),
                password: message.to_owned(),
                ..Default::default()
            };
            let rendered = config.render().expect("render");
            assert_eq!(rendered.lines().count(), CONFIG_TEMPLATE.lines().count());

            let values = parse(&rendered);
            assert_eq!(values["welcome-message"].as_str(), Some(message), "{rendered}");
            assert_eq!(values["password"].as_str(), Some(message));
            assert_eq!(values["full-node"].as_bool(), Some(true));
        }
    }
}
