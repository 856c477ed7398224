use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use tracing::Instrument;

use crate::builder::{Deployment, PendingBean};
use crate::environment::DynEnvironment;
use crate::{
    AnnotatedTypeConfigurator, AnnotatedTypeOverride, AnnotationTarget, BeanSource,
    BootstrapError, ClassList, ClassLoader, ClassRef, Container, ContainerEvent,
    ContainerRegistry, DefinitionError, DeploymentModel, DiscoveryMode, Origin, PackageRef,
    Problem, Properties, SyntheticBean,
};

pub(crate) async fn assemble(
    deployment: Deployment,
    params: Properties,
    environment: Arc<dyn DynEnvironment>,
    registry: Arc<ContainerRegistry>,
) -> Result<Container, BootstrapError> {
    if environment.is_managed() {
        return Err(BootstrapError::UnsupportedOperation(
            "Cannot initialize a container inside a managed environment".into(),
        ));
    }
    let span = tracing::info_span!(
        "bootstrap",
        container_id = deployment.container_id.as_deref()
    );
    Assembly::new(deployment, params, environment.as_ref(), &registry)
        .run()
        .instrument(span)
        .await
}

struct Assembly<'a> {
    deployment: Deployment,
    params: Properties,
    environment: &'a dyn DynEnvironment,
    registry: &'a Arc<ContainerRegistry>,
    problems: Vec<Problem>,
}

impl<'a> Assembly<'a> {
    fn new(
        deployment: Deployment,
        params: Properties,
        environment: &'a dyn DynEnvironment,
        registry: &'a Arc<ContainerRegistry>,
    ) -> Self {
        Self {
            deployment,
            params,
            environment,
            registry,
            problems: Vec::new(),
        }
    }

    async fn run(mut self) -> Result<Container, BootstrapError> {
        let class_loader = match self.deployment.class_loader.take() {
            Some(v) => v,
            None => self.environment.default_class_loader(),
        };
        if class_loader.is_closed() {
            self.problems
                .push(Problem::ClassLoaderClosed(class_loader.name().to_string()));
        }
        // Pull the nested builders.
        let overrides = merge_overrides(std::mem::take(&mut self.deployment.annotated_types));
        let beans = build_beans(std::mem::take(&mut self.deployment.beans));
        let discovered = match self.deployment.discovery {
            DiscoveryMode::Enabled if !class_loader.is_closed() => {
                self.discover(&class_loader).await
            }
            _ => Vec::new(),
        };
        let sources = self.merge_sources(discovered, &overrides, beans);
        tracing::debug!(sources = sources.len(), "Bean sources merged");
        for extension in &self.deployment.extensions {
            extension.observe(&ContainerEvent::AfterBeanDiscovery { sources: &sources });
        }
        self.validate_enablement();
        self.validate_overrides(&overrides);
        self.validate_bean_names(&sources);
        let lease = match &self.deployment.container_id {
            Some(id) => match self.registry.reserve(id) {
                Some(v) => Some(v),
                None => {
                    self.problems.push(Problem::DuplicateContainerId(id.clone()));
                    None
                }
            },
            None => None,
        };
        if !self.problems.is_empty() {
            tracing::warn!(problems = self.problems.len(), "Deployment validation failed");
            return Err(DefinitionError::new(self.problems).into());
        }
        let Deployment {
            container_id,
            interceptors,
            decorators,
            alternatives,
            alternative_stereotypes,
            extensions,
            mut properties,
            discovery,
            ..
        } = self.deployment;
        properties.merge_from(self.params);
        let model = DeploymentModel {
            container_id,
            discovery,
            class_loader,
            sources,
            interceptors,
            decorators,
            alternatives,
            alternative_stereotypes,
            extensions,
            properties,
        };
        Ok(Container::assemble(model, lease))
    }

    async fn discover(&mut self, loader: &ClassLoader) -> Vec<ClassRef> {
        let mut discovered = Vec::new();
        for package in &self.deployment.packages {
            tracing::debug!(
                package = package.name(),
                recursive = package.is_recursive(),
                "Scanning package"
            );
            match self.environment.scan_package(loader, package).await {
                Ok(classes) => discovered.extend(classes),
                Err(err) => {
                    tracing::warn!(package = package.name(), "Cannot scan package: {err}");
                    self.problems.push(Problem::ScanFailed {
                        target: describe_package(package),
                        source: err,
                    });
                }
            }
        }
        tracing::debug!(loader = loader.name(), "Scanning bean archives");
        match self.environment.scan_bean_archives(loader).await {
            Ok(classes) => discovered.extend(classes),
            Err(err) => {
                tracing::warn!(loader = loader.name(), "Cannot scan bean archives: {err}");
                self.problems.push(Problem::ScanFailed {
                    target: format!("bean archives of {:?}", loader.name()),
                    source: err,
                });
            }
        }
        tracing::debug!(classes = discovered.len(), "Discovery finished");
        discovered
    }

    fn merge_sources(
        &self,
        discovered: Vec<ClassRef>,
        overrides: &[AnnotatedTypeOverride],
        beans: Vec<SyntheticBean>,
    ) -> Vec<BeanSource> {
        let mut sources = Vec::new();
        let mut index = HashMap::new();
        let mut push_class = |class: ClassRef, origin: Origin| {
            if let Entry::Vacant(v) = index.entry(class.clone()) {
                v.insert(sources.len());
                sources.push(BeanSource::Class {
                    class,
                    origin,
                    metadata: None,
                });
            }
        };
        for class in &self.deployment.bean_classes {
            push_class(class.clone(), Origin::Synthetic);
        }
        for class in discovered {
            push_class(class, Origin::Discovered);
        }
        for v in overrides {
            push_class(v.class().clone(), Origin::Override);
        }
        for v in overrides {
            if let Some(&i) = index.get(v.class())
                && let BeanSource::Class { metadata, .. } = &mut sources[i]
            {
                *metadata = Some(v.apply());
            }
        }
        sources.extend(beans.into_iter().map(BeanSource::Bean));
        sources
    }

    fn validate_enablement(&mut self) {
        let deployment = &self.deployment;
        check_markers(&mut self.problems, &deployment.interceptors, |c| {
            (!c.markers().interceptor).then(|| Problem::NotAnInterceptor(c.clone()))
        });
        check_markers(&mut self.problems, &deployment.decorators, |c| {
            (!c.markers().decorator).then(|| Problem::NotADecorator(c.clone()))
        });
        check_markers(&mut self.problems, &deployment.alternatives, |c| {
            (!c.markers().alternative).then(|| Problem::NotAnAlternative(c.clone()))
        });
        check_markers(&mut self.problems, &deployment.alternative_stereotypes, |c| {
            (!c.markers().stereotype).then(|| Problem::NotAStereotype(c.clone()))
        });
    }

    fn validate_overrides(&mut self, overrides: &[AnnotatedTypeOverride]) {
        for v in overrides {
            let empty_member = v
                .edits()
                .iter()
                .any(|e| matches!(e.target(), AnnotationTarget::Member(m) if m.is_empty()));
            if empty_member {
                self.problems.push(Problem::EmptyMemberName(v.class().clone()));
            }
        }
    }

    fn validate_bean_names(&mut self, sources: &[BeanSource]) {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for name in sources
            .iter()
            .filter_map(|v| v.as_bean().and_then(|b| b.name()))
            .filter(|v| !v.is_empty())
        {
            match counts.iter_mut().find(|(n, _)| *n == name) {
                Some((_, count)) => *count += 1,
                None => counts.push((name, 1)),
            }
        }
        for (name, count) in counts {
            if count > 1 {
                self.problems
                    .push(Problem::AmbiguousBeanName(name.to_string()));
            }
        }
    }
}

fn check_markers<F>(problems: &mut Vec<Problem>, list: &ClassList, check: F)
where
    F: Fn(&ClassRef) -> Option<Problem>,
{
    problems.extend(list.iter().filter_map(check));
}

fn describe_package(package: &PackageRef) -> String {
    if package.name().is_empty() {
        "root package".to_string()
    } else {
        format!("package {:?}", package.name())
    }
}

/// Merges configurators targeting the same class, keeping call order.
fn merge_overrides(configurators: Vec<AnnotatedTypeConfigurator>) -> Vec<AnnotatedTypeOverride> {
    let mut merged: Vec<AnnotatedTypeOverride> = Vec::new();
    let mut index = HashMap::<ClassRef, usize>::new();
    for configurator in configurators {
        let pending = configurator.finish();
        match index.entry(pending.class().clone()) {
            Entry::Occupied(v) => merged[*v.get()].merge(pending),
            Entry::Vacant(v) => {
                v.insert(merged.len());
                merged.push(pending);
            }
        }
    }
    merged
}

fn build_beans(pending: Vec<PendingBean>) -> Vec<SyntheticBean> {
    pending
        .into_iter()
        .map(|v| match v {
            PendingBean::Configured(configurator) => configurator.build(),
            PendingBean::Built(bean) => bean,
        })
        .collect()
}
