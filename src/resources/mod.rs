//! Resource orchestration: normalized requests in, native cluster objects out,
//! and flat summaries back.

pub mod creator;
pub mod deleter;
pub mod error;
pub mod lister;
pub mod request;
pub mod summary;
pub mod updater;

use crate::kubernetes::model::SharedK8sClient;

/// The four resource components, all sharing one cluster handle.
pub struct ControlPlane {
    pub creator: creator::ResourceCreator,
    pub lister: lister::ResourceLister,
    pub deleter: deleter::ResourceDeleter,
    pub updater: updater::ResourceUpdater,
}

impl ControlPlane {
    pub fn new(k8s_client: SharedK8sClient) -> ControlPlane {
        ControlPlane {
            creator: creator::ResourceCreator::new(k8s_client.clone()),
            lister: lister::ResourceLister::new(k8s_client.clone()),
            deleter: deleter::ResourceDeleter::new(k8s_client.clone()),
            updater: updater::ResourceUpdater::new(k8s_client),
        }
    }
}
