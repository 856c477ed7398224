use std::any::type_name;

use crate::{BeanSource, ClassRef, ContainerLease, DeploymentModel};

/// Lifecycle notification delivered to extensions.
#[derive(Debug)]
pub enum ContainerEvent<'a> {
    /// Bean sources are merged, validation has not run yet.
    AfterBeanDiscovery { sources: &'a [BeanSource] },
    /// The deployment is valid and the container is about to be returned.
    AfterDeploymentValidation { model: &'a DeploymentModel },
    /// The container is shutting down.
    BeforeShutdown { container_id: Option<&'a str> },
    /// Event fired through [`Container::fire`].
    Custom {
        name: &'a str,
        payload: &'a serde_json::Value,
    },
}

/// Observer of the bootstrap lifecycle.
///
/// Extensions are notified in registration order.
pub trait Extension: Send + Sync + 'static {
    fn observe(&self, event: &ContainerEvent<'_>) {
        let _ = event;
    }

    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Live container produced by [`ContainerBuilder::initialize`](crate::ContainerBuilder::initialize).
///
/// Dropping the container shuts it down: extensions receive
/// [`ContainerEvent::BeforeShutdown`] and the container identifier is released.
pub struct Container {
    model: DeploymentModel,
    _lease: Option<ContainerLease>,
}

impl Container {
    pub(crate) fn assemble(model: DeploymentModel, lease: Option<ContainerLease>) -> Self {
        let container = Self {
            model,
            _lease: lease,
        };
        container.notify(&ContainerEvent::AfterDeploymentValidation {
            model: &container.model,
        });
        tracing::info!(
            container_id = container.id(),
            sources = container.model.sources.len(),
            "Container initialized"
        );
        container
    }

    pub fn id(&self) -> Option<&str> {
        self.model.container_id()
    }

    pub fn model(&self) -> &DeploymentModel {
        &self.model
    }

    /// Looks up the source deployed for a class.
    ///
    /// Class sources are preferred over synthetic beans implemented by the
    /// same class.
    pub fn select(&self, class: &ClassRef) -> Option<&BeanSource> {
        let mut candidates = self
            .model
            .sources
            .iter()
            .filter(|v| selectable_by(v, class));
        let first = candidates.next()?;
        if matches!(first, BeanSource::Class { .. }) {
            return Some(first);
        }
        candidates
            .find(|v| matches!(v, BeanSource::Class { .. }))
            .or(Some(first))
    }

    /// Returns every source that can be selected by the class: class sources of
    /// that class and synthetic beans listing it among their types.
    pub fn select_all<'a>(
        &'a self,
        class: &'a ClassRef,
    ) -> impl Iterator<Item = &'a BeanSource> + 'a {
        self.model
            .sources
            .iter()
            .filter(move |v| selectable_by(v, class))
    }

    pub fn beans_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a BeanSource> + 'a {
        self.model
            .sources
            .iter()
            .filter(move |v| v.as_bean().and_then(|b| b.name()) == Some(name))
    }

    /// Delivers a custom event to every extension.
    pub fn fire(&self, name: &str, payload: &serde_json::Value) {
        tracing::trace!(event = name, "Firing container event");
        self.notify(&ContainerEvent::Custom { name, payload });
    }

    /// Shuts the container down.
    pub fn shutdown(self) {
        drop(self);
    }

    fn notify(&self, event: &ContainerEvent<'_>) {
        for extension in &self.model.extensions {
            extension.observe(event);
        }
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        self.notify(&ContainerEvent::BeforeShutdown {
            container_id: self.id(),
        });
        tracing::info!(container_id = self.id(), "Container shut down");
    }
}

fn selectable_by(source: &BeanSource, class: &ClassRef) -> bool {
    match source {
        BeanSource::Class { class: c, .. } => c == class,
        BeanSource::Bean(bean) => bean.types().contains(class),
    }
}
