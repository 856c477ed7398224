use std::sync::Arc;

use crate::{ClassList, ClassLoader, ClassRef, Extension, Properties, SyntheticBean, TypeMetadata};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DiscoveryMode {
    #[default]
    Enabled,
    Disabled,
}

/// How a class became part of the deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Declared on the builder, directly or through an enablement list.
    Synthetic,
    /// Only referenced by an annotated type override.
    Override,
    /// Found by package scanning or bean archive discovery.
    Discovered,
}

#[derive(Clone, Debug)]
pub enum BeanSource {
    Class {
        class: ClassRef,
        origin: Origin,
        metadata: Option<TypeMetadata>,
    },
    Bean(SyntheticBean),
}

impl BeanSource {
    /// Returns the implementation class of the source.
    pub fn class(&self) -> &ClassRef {
        match self {
            BeanSource::Class { class, .. } => class,
            BeanSource::Bean(bean) => bean.class(),
        }
    }

    pub fn metadata(&self) -> Option<&TypeMetadata> {
        match self {
            BeanSource::Class { metadata, .. } => metadata.as_ref(),
            BeanSource::Bean(_) => None,
        }
    }

    pub fn as_bean(&self) -> Option<&SyntheticBean> {
        match self {
            BeanSource::Bean(bean) => Some(bean),
            BeanSource::Class { .. } => None,
        }
    }
}

/// Frozen result of assembling a deployment.
pub struct DeploymentModel {
    pub(crate) container_id: Option<String>,
    pub(crate) discovery: DiscoveryMode,
    pub(crate) class_loader: ClassLoader,
    pub(crate) sources: Vec<BeanSource>,
    pub(crate) interceptors: ClassList,
    pub(crate) decorators: ClassList,
    pub(crate) alternatives: ClassList,
    pub(crate) alternative_stereotypes: ClassList,
    pub(crate) extensions: Vec<Arc<dyn Extension>>,
    pub(crate) properties: Properties,
}

impl DeploymentModel {
    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    pub fn discovery(&self) -> DiscoveryMode {
        self.discovery
    }

    pub fn class_loader(&self) -> &ClassLoader {
        &self.class_loader
    }

    pub fn sources(&self) -> &[BeanSource] {
        &self.sources
    }

    /// Returns the implementation classes of class sources, in deployment order.
    pub fn bean_classes(&self) -> impl Iterator<Item = &ClassRef> {
        self.sources.iter().filter_map(|v| match v {
            BeanSource::Class { class, .. } => Some(class),
            BeanSource::Bean(_) => None,
        })
    }

    pub fn synthetic_beans(&self) -> impl Iterator<Item = &SyntheticBean> {
        self.sources.iter().filter_map(BeanSource::as_bean)
    }

    pub fn interceptors(&self) -> &ClassList {
        &self.interceptors
    }

    pub fn decorators(&self) -> &ClassList {
        &self.decorators
    }

    pub fn alternatives(&self) -> &ClassList {
        &self.alternatives
    }

    pub fn alternative_stereotypes(&self) -> &ClassList {
        &self.alternative_stereotypes
    }

    pub fn extensions(&self) -> &[Arc<dyn Extension>] {
        &self.extensions
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

impl std::fmt::Debug for DeploymentModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentModel")
            .field("container_id", &self.container_id)
            .field("discovery", &self.discovery)
            .field("class_loader", &self.class_loader)
            .field("sources", &self.sources)
            .field("interceptors", &self.interceptors)
            .field("decorators", &self.decorators)
            .field("alternatives", &self.alternatives)
            .field("alternative_stereotypes", &self.alternative_stereotypes)
            .field(
                "extensions",
                &self.extensions.iter().map(|v| v.name()).collect::<Vec<_>>(),
            )
            .field("properties", &self.properties)
            .finish()
    }
}
