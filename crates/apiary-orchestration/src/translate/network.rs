use std::collections::HashMap;

use apiary_k8::objects::ObjectLabels;
use apiary_k8::objects::ingress::{IngressOptions, IngressRule, IngressSpec};
use apiary_k8::objects::service::{
    CLUSTER_IP_NONE, ExternalTrafficPolicy, ServiceOptions, ServicePort, ServiceSpec, ServiceType,
};

use crate::defaults::*;
use crate::port::NodePorts;
use crate::spec::NodeSpec;

use super::{NodeNames, object_labels, selector_labels};

fn cluster_ip_service(spec: &NodeSpec, port: ServicePort) -> ServiceOptions {
    ServiceOptions {
        meta: object_labels(spec),
        spec: ServiceSpec {
            ports: vec![port],
            selector: selector_labels(spec),
            service_type: Some(ServiceType::ClusterIP),
            ..Default::default()
        },
    }
}

pub fn api_service(spec: &NodeSpec, ports: &NodePorts) -> ServiceOptions {
    cluster_ip_service(spec, ServicePort::named(API_PORT_NAME, ports.api))
}

pub fn debug_service(spec: &NodeSpec, ports: &NodePorts) -> ServiceOptions {
    cluster_ip_service(spec, ServicePort::named(DEBUG_PORT_NAME, ports.debug))
}

/// NodePort service for p2p traffic; the node port is pinned when a NAT address is set
pub fn p2p_service(spec: &NodeSpec, ports: &NodePorts) -> ServiceOptions {
    let mut port = ServicePort::named(P2P_PORT_NAME, ports.p2p);
    port.node_port = ports.nat;

    ServiceOptions {
        meta: object_labels(spec),
        spec: ServiceSpec {
            ports: vec![port],
            selector: selector_labels(spec),
            service_type: Some(ServiceType::NodePort),
            external_traffic_policy: Some(ExternalTrafficPolicy::Local),
            ..Default::default()
        },
    }
}

/// Governing service of the statefulset, resolving pods before they are ready
pub fn headless_service(spec: &NodeSpec, ports: &NodePorts) -> ServiceOptions {
    ServiceOptions {
        meta: object_labels(spec),
        spec: ServiceSpec {
            cluster_ip: Some(CLUSTER_IP_NONE.to_owned()),
            ports: vec![
                ServicePort::named(API_PORT_NAME, ports.api),
                ServicePort::named(DEBUG_PORT_NAME, ports.debug),
                ServicePort::named(P2P_PORT_NAME, ports.p2p),
            ],
            selector: selector_labels(spec),
            publish_not_ready_addresses: Some(true),
            ..Default::default()
        },
    }
}

fn ingress(
    spec: &NodeSpec,
    class: &str,
    host: &str,
    annotations: &HashMap<String, String>,
    service: &str,
    port_name: &str,
) -> IngressOptions {
    let mut meta: ObjectLabels = object_labels(spec);
    meta.annotations.extend(annotations.clone());

    IngressOptions {
        meta,
        spec: IngressSpec {
            ingress_class_name: Some(class.to_owned()).filter(|class| !class.is_empty()),
            rules: vec![IngressRule::route(host, "/", service, port_name)],
            ..Default::default()
        },
    }
}

pub fn api_ingress(spec: &NodeSpec) -> IngressOptions {
    let names = NodeNames::new(&spec.name);
    ingress(
        spec,
        &spec.ingress.class,
        &spec.ingress.host,
        &spec.ingress.annotations,
        &names.api_service,
        API_PORT_NAME,
    )
}

pub fn debug_ingress(spec: &NodeSpec) -> IngressOptions {
    let names = NodeNames::new(&spec.name);
    ingress(
        spec,
        &spec.ingress.debug_class,
        &spec.ingress.debug_host,
        &spec.ingress.debug_annotations,
        &names.debug_service,
        DEBUG_PORT_NAME,
    )
}
