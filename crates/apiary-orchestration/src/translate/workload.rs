use std::collections::BTreeMap;

use apiary_k8::objects::{LabelSelector, LocalObjectReference};
use apiary_k8::objects::pod::{
    ContainerPort, ContainerSecurityContext, ContainerSpec, KeyToPath, PersistentVolumeClaim,
    PersistentVolumeClaimSpec, PodSecurityContext, PodSpec, PodTemplateSpec, Probe, TemplateMeta,
    VolumeMount, VolumeResourceRequirements, VolumeSpec,
};
use apiary_k8::objects::statefulset::{StatefulSetOptions, StatefulSetSpec, StatefulSetUpdateStrategy};

use crate::defaults::*;
use crate::features::{KeyFeatures, KeyKind, KeySecret};
use crate::port::NodePorts;
use crate::spec::NodeSpec;

use super::{NodeNames, object_labels, selector_labels};

const CONFIG_VOLUME: &str = "config";
const KEYS_VOLUME: &str = "keys";
const CLEF_PASSWORD_VOLUME: &str = "clef-password";
const CLEF_PORT: i32 = 8550;

/// Script of the init container.
///
/// Derives the replica ordinal from the hostname and stages each shared key into
/// its own volume, preferring the per-replica `<ordinal>-<file>` projection over
/// the plain `<file>` one.
fn init_script(features: KeyFeatures) -> String {
    let mut script = format!(
        "set -e\nORDINAL=${{HOSTNAME##*-}}\nmkdir -p {BEE_KEYS_DIR}\n"
    );

    for volume in features.shared_volumes() {
        let file = volume.file;
        let dest = format!("{INIT_STAGE_DIR}/{}/{file}", volume.volume);
        script.push_str(&format!(
            r#"if [ -f {INIT_KEYS_DIR}/$ORDINAL-{file} ]; then
  cp {INIT_KEYS_DIR}/$ORDINAL-{file} {dest}
else
  cp {INIT_KEYS_DIR}/{file} {dest}
fi
"#
        ));
    }

    script.push_str(&format!("chown -R {FS_GROUP}:{FS_GROUP} {BEE_DATA_DIR}\n"));
    script
}

/// Projection of the shared keys secret seen by the init container: every entry
/// once per replica ordinal and once under its plain file name
fn staged_key_items(features: KeyFeatures) -> Vec<KeyToPath> {
    let mut items = Vec::new();
    for volume in features.shared_volumes() {
        for ordinal in 0..REPLICAS {
            items.push(KeyToPath::new(
                volume.secret_key,
                &format!("{ordinal}-{}", volume.file),
            ));
        }
        items.push(KeyToPath::new(volume.secret_key, volume.file));
    }
    items
}

/// bee container, plus the clef signer when a clef key is configured
pub fn containers(spec: &NodeSpec, ports: &NodePorts) -> Vec<ContainerSpec> {
    let mut containers = vec![ContainerSpec {
        name: BEE_CONTAINER.to_owned(),
        image: Some(spec.image.clone()),
        image_pull_policy: Some(spec.image_pull_policy.clone()),
        command: vec![
            "bee".to_owned(),
            "start".to_owned(),
            format!("--config={BEE_CONFIG_PATH}"),
        ],
        ports: vec![
            ContainerPort::tcp(API_PORT_NAME, ports.api),
            ContainerPort::tcp(DEBUG_PORT_NAME, ports.debug),
            ContainerPort::tcp(P2P_PORT_NAME, ports.p2p),
        ],
        resources: spec.resources.requirements(),
        volume_mounts: volume_mounts(spec),
        liveness_probe: Some(Probe::http(HEALTH_PATH, DEBUG_PORT_NAME)),
        readiness_probe: Some(Probe::http(READINESS_PATH, DEBUG_PORT_NAME)),
        security_context: Some(ContainerSecurityContext {
            allow_privilege_escalation: Some(false),
            run_as_user: Some(FS_GROUP),
            ..Default::default()
        }),
        ..Default::default()
    }];

    if KeyFeatures::from_keys(&spec.keys).enabled(KeyKind::Clef) {
        containers.push(ContainerSpec {
            name: CLEF_CONTAINER.to_owned(),
            image: Some(spec.clef_image.clone()),
            image_pull_policy: Some(spec.image_pull_policy.clone()),
            command: vec!["sh".to_owned(), "-c".to_owned()],
            args: vec![format!(
                "clef --configdir {CLEF_DATA_DIR} --keystore {CLEF_DATA_DIR}/keystore --stdio-ui --http --http.addr 0.0.0.0 --http.port {CLEF_PORT} --http.vhosts '*' --suppress-bootwarn --password {CLEF_PASSWORD_PATH}"
            )],
            ports: vec![ContainerPort::tcp(CLEF_CONTAINER, CLEF_PORT)],
            volume_mounts: vec![
                VolumeMount::file("clef-key", CLEF_KEY_PATH, "clef.key"),
                VolumeMount::file(CLEF_PASSWORD_VOLUME, CLEF_PASSWORD_PATH, "password"),
            ],
            ..Default::default()
        });
    }

    containers
}

/// `init-bee`, staging per-replica key material for the bee container
pub fn init_containers(spec: &NodeSpec) -> Vec<ContainerSpec> {
    let features = KeyFeatures::from_keys(&spec.keys);

    let mut volume_mounts = vec![VolumeMount::new(DATA_VOLUME, BEE_DATA_DIR)];
    if features.shared_volumes().next().is_some() {
        volume_mounts.push(VolumeMount {
            read_only: Some(true),
            ..VolumeMount::new(KEYS_VOLUME, INIT_KEYS_DIR)
        });
    }
    volume_mounts.extend(features.shared_volumes().map(|volume| {
        VolumeMount::new(volume.volume, &format!("{INIT_STAGE_DIR}/{}", volume.volume))
    }));

    vec![ContainerSpec {
        name: INIT_CONTAINER.to_owned(),
        image: Some(INIT_IMAGE.to_owned()),
        image_pull_policy: Some(spec.image_pull_policy.clone()),
        command: vec!["sh".to_owned(), "-c".to_owned(), init_script(features)],
        volume_mounts,
        ..Default::default()
    }]
}

/// Pod volumes.
///
/// Key volumes appear only for configured keys. Shared keys reach the bee container
/// through `emptyDir` volumes the init container fills from the `keys` projection;
/// the clef key is projected straight from its secret. `data` is an `emptyDir` only
/// when persistence is disabled, otherwise it comes from the claim template.
pub fn volumes(spec: &NodeSpec) -> Vec<VolumeSpec> {
    let names = NodeNames::new(&spec.name);
    let features = KeyFeatures::from_keys(&spec.keys);

    let mut volumes = vec![VolumeSpec::config_map(CONFIG_VOLUME, &names.config_map)];

    let staged = staged_key_items(features);
    if !staged.is_empty() {
        volumes.push(VolumeSpec::secret(
            KEYS_VOLUME,
            &KeySecret::Keys.name(&spec.name),
            staged,
        ));
    }

    volumes.extend(features.volumes().map(|volume| match volume.secret {
        KeySecret::Keys => VolumeSpec::empty_dir(volume.volume),
        KeySecret::Clef => VolumeSpec::secret_item(
            volume.volume,
            &volume.secret.name(&spec.name),
            volume.secret_key,
            volume.file,
        ),
    }));

    if features.enabled(KeyKind::Clef) {
        volumes.push(VolumeSpec::secret_item(
            CLEF_PASSWORD_VOLUME,
            &names.clef_secret,
            "password",
            "password",
        ));
    }

    if !spec.persistence.enabled {
        volumes.push(VolumeSpec::empty_dir(DATA_VOLUME));
    }

    volumes
}

/// Mounts of the bee container
pub fn volume_mounts(spec: &NodeSpec) -> Vec<VolumeMount> {
    let features = KeyFeatures::from_keys(&spec.keys);

    let mut mounts = vec![
        VolumeMount::file(CONFIG_VOLUME, BEE_CONFIG_PATH, BEE_CONFIG_FILE),
        VolumeMount::new(DATA_VOLUME, BEE_DATA_DIR),
    ];

    mounts.extend(
        features
            .volumes()
            .map(|volume| VolumeMount::file(volume.volume, volume.mount_path, volume.file)),
    );

    mounts
}

fn data_claim(spec: &NodeSpec) -> PersistentVolumeClaim {
    let mut requests = BTreeMap::new();
    requests.insert("storage".to_owned(), spec.persistence.storage_request.clone());

    PersistentVolumeClaim {
        metadata: TemplateMeta {
            name: Some(DATA_VOLUME.to_owned()),
            labels: selector_labels(spec),
            ..Default::default()
        },
        spec: PersistentVolumeClaimSpec {
            access_modes: vec![ACCESS_MODE.to_owned()],
            storage_class_name: Some(spec.persistence.storage_class.clone())
                .filter(|class| !class.is_empty()),
            resources: VolumeResourceRequirements { requests },
        },
    }
}

pub fn statefulset_spec(spec: &NodeSpec, ports: &NodePorts) -> StatefulSetSpec {
    let names = NodeNames::new(&spec.name);

    let mut pod_labels = selector_labels(spec);
    pod_labels.extend(spec.labels.clone());

    StatefulSetSpec {
        replicas: Some(REPLICAS),
        selector: LabelSelector::new_labels(selector_labels(spec)),
        service_name: names.headless_service,
        template: PodTemplateSpec {
            metadata: TemplateMeta {
                name: None,
                labels: pod_labels,
                annotations: spec.annotations.clone().into_iter().collect(),
            },
            spec: PodSpec {
                containers: containers(spec, ports),
                init_containers: init_containers(spec),
                volumes: volumes(spec),
                service_account_name: Some(names.service_account),
                node_selector: spec.node_selector.clone(),
                tolerations: spec.tolerations.clone(),
                security_context: Some(PodSecurityContext {
                    fs_group: Some(FS_GROUP),
                    ..Default::default()
                }),
                image_pull_secrets: spec
                    .image_pull_secrets
                    .iter()
                    .map(|name| LocalObjectReference { name: name.clone() })
                    .collect(),
                ..Default::default()
            },
        },
        update_strategy: Some(StatefulSetUpdateStrategy {
            strategy_type: spec.update_strategy.clone(),
        }),
        pod_management_policy: Some(spec.pod_management_policy.clone()),
        volume_claim_templates: if spec.persistence.enabled {
            vec![data_claim(spec)]
        } else {
            vec![]
        },
    }
}

pub fn statefulset(spec: &NodeSpec, ports: &NodePorts) -> StatefulSetOptions {
    StatefulSetOptions {
        meta: object_labels(spec),
        spec: statefulset_spec(spec, ports),
    }
}
