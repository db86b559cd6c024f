use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use k8s_openapi::api::apps::v1::Deployment;
use tracing::{info, warn};

use crate::extensions::option::OptionStringExt;
use crate::kubernetes::model::SharedK8sClient;
use crate::resources::error::{ResourceError, ValidationError, Verb};
use crate::resources::request::{validated_key, ResourceKind};

/// Pod template annotation `kubectl rollout restart` uses to trigger a new rollout.
pub const RESTARTED_AT_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

/// Targeted mutations of existing deployments.
///
/// Each operation reads the deployment and writes it back with the
/// resourceVersion it was read at. A concurrent write in between makes the
/// cluster reject the update, which surfaces as [`ResourceError::Conflict`].
/// Nothing is retried.
pub struct ResourceUpdater {
    k8s_client: SharedK8sClient,
}

impl ResourceUpdater {
    pub fn new(k8s_client: SharedK8sClient) -> ResourceUpdater {
        ResourceUpdater { k8s_client }
    }

    pub async fn scale_deployment(
        &self,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Result<(), ResourceError> {
        if replicas < 0 {
            return Err(ValidationError::NegativeReplicas(replicas).into());
        }
        self.modify(namespace, name, "scaled", |deployment| {
            deployment.spec.get_or_insert_with(Default::default).replicas = Some(replicas);
            Ok(())
        })
        .await
    }

    pub async fn update_deployment_image(
        &self,
        namespace: &str,
        name: &str,
        image: &str,
    ) -> Result<(), ResourceError> {
        let image = Some(image.to_string())
            .non_blank()
            .ok_or(ValidationError::MissingField {
                kind: ResourceKind::Deployment.as_str(),
                field: "image",
            })?;
        self.modify(namespace, name, "image updated", |deployment| {
            let container = deployment
                .spec
                .as_mut()
                .and_then(|spec| spec.template.spec.as_mut())
                .and_then(|pod_spec| pod_spec.containers.first_mut())
                .ok_or_else(|| ResourceError::NoContainers {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                })?;
            container.image = Some(image);
            Ok(())
        })
        .await
    }

    pub async fn restart_deployment(&self, namespace: &str, name: &str) -> Result<(), ResourceError> {
        let restarted_at = restart_timestamp();
        self.modify(namespace, name, "restarted", |deployment| {
            let template_meta = deployment
                .spec
                .get_or_insert_with(Default::default)
                .template
                .metadata
                .get_or_insert_with(Default::default);
            template_meta
                .annotations
                .get_or_insert_with(BTreeMap::new)
                .insert(RESTARTED_AT_ANNOTATION.to_string(), restarted_at);
            Ok(())
        })
        .await
    }

    async fn modify<F>(
        &self,
        namespace: &str,
        name: &str,
        action: &str,
        mutate: F,
    ) -> Result<(), ResourceError>
    where
        F: FnOnce(&mut Deployment) -> Result<(), ResourceError> + Send,
    {
        let kind = ResourceKind::Deployment;
        let key = validated_key(kind, namespace, name)?;

        let mut deployment = self
            .k8s_client
            .get_deployment(&key)
            .await
            .map_err(|source| ResourceError::from_call(Verb::Get, kind, &key, source))?;

        mutate(&mut deployment)?;

        self.k8s_client
            .replace_deployment(&key, &deployment)
            .await
            .map_err(|source| {
                warn!(namespace = %key.namespace, name = %key.name, error = %source, "deployment update rejected");
                ResourceError::from_call(Verb::Update, kind, &key, source)
            })?;

        info!(namespace = %key.namespace, name = %key.name, "deployment {action}");
        Ok(())
    }
}

fn restart_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
