use std::mem::take;
use std::sync::Arc;

use serde::Serialize;

use crate::assembly::assemble;
use crate::environment::DynEnvironment;
use crate::{
    AnnotatedTypeConfigurator, AnnotatedTypeOverride, BeanConfigurator, BootstrapError,
    ClassList, ClassLoader, ClassRef, Container, ContainerRegistry, DiscoveryMode, Environment,
    Extension, PackageRef, Properties, StaticEnvironment, SyntheticBean,
};

/// Builder accumulating the description of a deployment.
///
/// Every mutator appends to the state recorded so far and returns the builder
/// for chaining. Nothing is validated until [`initialize`](Self::initialize),
/// which assembles the deployment exactly once. After that, or after a failed
/// initialization, every mutator fails with [`BootstrapError::IllegalState`].
///
/// # Examples
///
/// ```rust
/// use kiln::{ClassLoader, ClassRef, Container, Markers};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let loader = ClassLoader::new("app");
/// let repository = ClassRef::new("app::Repository", loader.clone());
/// let audit = ClassRef::new("app::Audit", loader.clone())
///     .with_markers(Markers::new().interceptor());
///
/// let container = Container::builder()
///     .disable_discovery()?
///     .set_class_loader(loader)?
///     .add_bean_class(repository.clone())?
///     .add_interceptor(audit.clone())?
///     .property("pool_size", 8)?
///     .initialize()
///     .await?;
///
/// assert!(container.select(&repository).is_some());
/// assert!(container.select(&audit).is_some());
/// # Ok(())
/// # }
/// ```
pub struct ContainerBuilder {
    state: BuilderState,
    deployment: Deployment,
    environment: Arc<dyn DynEnvironment>,
    registry: Arc<ContainerRegistry>,
}

/// Alternative name of [`ContainerBuilder`].
pub type ContainerInitializer = ContainerBuilder;

#[derive(Clone, Copy, PartialEq, Eq)]
enum BuilderState {
    Configuring,
    Initialized,
    Failed,
}

#[derive(Default)]
pub(crate) struct Deployment {
    pub(crate) container_id: Option<String>,
    pub(crate) bean_classes: ClassList,
    pub(crate) packages: Vec<PackageRef>,
    pub(crate) annotated_types: Vec<AnnotatedTypeConfigurator>,
    pub(crate) extensions: Vec<Arc<dyn Extension>>,
    pub(crate) interceptors: ClassList,
    pub(crate) decorators: ClassList,
    pub(crate) alternatives: ClassList,
    pub(crate) alternative_stereotypes: ClassList,
    pub(crate) properties: Properties,
    pub(crate) beans: Vec<PendingBean>,
    pub(crate) discovery: DiscoveryMode,
    pub(crate) class_loader: Option<ClassLoader>,
}

pub(crate) enum PendingBean {
    Configured(BeanConfigurator),
    Built(SyntheticBean),
}

impl Container {
    /// Creates a new builder using the process-wide container registry and an
    /// empty [`StaticEnvironment`].
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            state: BuilderState::Configuring,
            deployment: Deployment::default(),
            environment: Arc::new(StaticEnvironment::new()),
            registry: ContainerRegistry::global(),
        }
    }

    /// Sets the identifier of the container.
    ///
    /// An empty identifier restores the default, which is not reserved in the
    /// registry and can be shared by any number of containers.
    pub fn set_container_id(&mut self, id: impl Into<String>) -> Result<&mut Self, BootstrapError> {
        self.ensure_configuring()?;
        let id = id.into();
        self.deployment.container_id = if id.is_empty() { None } else { Some(id) };
        Ok(self)
    }

    /// Returns the explicit container identifier, if one was set.
    pub fn container_id(&self) -> Option<&str> {
        self.deployment.container_id.as_deref()
    }

    /// Adds classes to the synthetic bean archive.
    ///
    /// Calls accumulate: the resulting set is the union of every class passed
    /// so far, without duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::IllegalArgument`] if a class has an empty name.
    pub fn bean_classes<I>(&mut self, classes: I) -> Result<&mut Self, BootstrapError>
    where
        I: IntoIterator<Item = ClassRef>,
    {
        self.ensure_configuring()?;
        let classes = checked_classes(classes)?;
        self.deployment.bean_classes.extend(classes);
        Ok(self)
    }

    pub fn add_bean_class(&mut self, class: ClassRef) -> Result<&mut Self, BootstrapError> {
        self.bean_classes([class])
    }

    /// Requests a non-recursive scan of the packages of the given classes.
    pub fn packages<I>(&mut self, classes: I) -> Result<&mut Self, BootstrapError>
    where
        I: IntoIterator<Item = ClassRef>,
    {
        self.add_packages(false, classes)
    }

    /// Requests a scan of the packages of the given classes.
    ///
    /// A package requested both recursively and non-recursively is scanned
    /// recursively, whatever the order of the requests. Requests are keyed by
    /// package name only: all scans go through the deployment class loader.
    pub fn add_packages<I>(&mut self, recursive: bool, classes: I) -> Result<&mut Self, BootstrapError>
    where
        I: IntoIterator<Item = ClassRef>,
    {
        self.ensure_configuring()?;
        for class in checked_classes(classes)? {
            let request = PackageRef::of(&class, recursive);
            match self
                .deployment
                .packages
                .iter_mut()
                .find(|v| v.name() == request.name())
            {
                Some(v) => v.upgrade(recursive),
                None => self.deployment.packages.push(request),
            }
        }
        Ok(self)
    }

    pub fn add_package(&mut self, recursive: bool, class: ClassRef) -> Result<&mut Self, BootstrapError> {
        self.add_packages(recursive, [class])
    }

    /// Returns a configurator whose edits are applied to the class when the
    /// builder is initialized.
    ///
    /// Several configurators for one class are merged: their edits are
    /// replayed in the order the configurators were requested.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kiln::{Annotation, ClassLoader, ClassRef, Container};
    ///
    /// # fn example() -> Result<(), kiln::BootstrapError> {
    /// let class = ClassRef::new("app::Service", ClassLoader::new("app"));
    /// let mut builder = Container::builder();
    /// builder
    ///     .configure_annotated_type(class)?
    ///     .add(Annotation::new("Singleton"))
    ///     .add_to_member("repository", Annotation::new("Inject"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn configure_annotated_type(
        &mut self,
        class: ClassRef,
    ) -> Result<&mut AnnotatedTypeConfigurator, BootstrapError> {
        self.ensure_configuring()?;
        check_class(&class)?;
        let annotated_types = &mut self.deployment.annotated_types;
        annotated_types.push(AnnotatedTypeConfigurator::new(class));
        Ok(annotated_types.last_mut().unwrap())
    }

    /// Adds ready-made overrides. They are merged with configurators for the
    /// same class in call order.
    pub fn add_annotated_types<I>(&mut self, overrides: I) -> Result<&mut Self, BootstrapError>
    where
        I: IntoIterator<Item = AnnotatedTypeOverride>,
    {
        self.ensure_configuring()?;
        let overrides: Vec<_> = overrides.into_iter().collect();
        for v in &overrides {
            check_class(v.class())?;
        }
        self.deployment
            .annotated_types
            .extend(overrides.into_iter().map(AnnotatedTypeConfigurator::from));
        Ok(self)
    }

    /// Adds extensions. An extension instance already added is skipped.
    pub fn extensions<I>(&mut self, extensions: I) -> Result<&mut Self, BootstrapError>
    where
        I: IntoIterator<Item = Arc<dyn Extension>>,
    {
        self.ensure_configuring()?;
        for extension in extensions {
            let exists = self
                .deployment
                .extensions
                .iter()
                .any(|v| std::ptr::addr_eq(Arc::as_ptr(v), Arc::as_ptr(&extension)));
            if !exists {
                self.deployment.extensions.push(extension);
            }
        }
        Ok(self)
    }

    pub fn add_extension(&mut self, extension: Arc<dyn Extension>) -> Result<&mut Self, BootstrapError> {
        self.extensions([extension])
    }

    /// Enables interceptors in the given priority order.
    ///
    /// Interceptor classes are added to the bean classes as well.
    pub fn interceptors<I>(&mut self, classes: I) -> Result<&mut Self, BootstrapError>
    where
        I: IntoIterator<Item = ClassRef>,
    {
        self.ensure_configuring()?;
        for class in checked_classes(classes)? {
            self.deployment.interceptors.insert(class.clone());
            self.deployment.bean_classes.insert(class);
        }
        Ok(self)
    }

    pub fn add_interceptor(&mut self, class: ClassRef) -> Result<&mut Self, BootstrapError> {
        self.interceptors([class])
    }

    /// Enables decorators in the given priority order.
    ///
    /// Decorator classes are added to the bean classes as well.
    pub fn decorators<I>(&mut self, classes: I) -> Result<&mut Self, BootstrapError>
    where
        I: IntoIterator<Item = ClassRef>,
    {
        self.ensure_configuring()?;
        for class in checked_classes(classes)? {
            self.deployment.decorators.insert(class.clone());
            self.deployment.bean_classes.insert(class);
        }
        Ok(self)
    }

    pub fn add_decorator(&mut self, class: ClassRef) -> Result<&mut Self, BootstrapError> {
        self.decorators([class])
    }

    pub fn alternatives<I>(&mut self, classes: I) -> Result<&mut Self, BootstrapError>
    where
        I: IntoIterator<Item = ClassRef>,
    {
        self.ensure_configuring()?;
        let classes = checked_classes(classes)?;
        self.deployment.alternatives.extend(classes);
        Ok(self)
    }

    pub fn add_alternative(&mut self, class: ClassRef) -> Result<&mut Self, BootstrapError> {
        self.alternatives([class])
    }

    pub fn alternative_stereotypes<I>(&mut self, classes: I) -> Result<&mut Self, BootstrapError>
    where
        I: IntoIterator<Item = ClassRef>,
    {
        self.ensure_configuring()?;
        let classes = checked_classes(classes)?;
        self.deployment.alternative_stereotypes.extend(classes);
        Ok(self)
    }

    pub fn add_alternative_stereotype(&mut self, class: ClassRef) -> Result<&mut Self, BootstrapError> {
        self.alternative_stereotypes([class])
    }

    /// Sets a configuration property, replacing a previous value of the key.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::IllegalArgument`] if the key is empty or the
    /// value can not be serialized.
    pub fn property<T>(&mut self, key: impl Into<String>, value: T) -> Result<&mut Self, BootstrapError>
    where
        T: Serialize,
    {
        self.ensure_configuring()?;
        let key = key.into();
        if key.is_empty() {
            return Err(BootstrapError::IllegalArgument(
                "Property key must not be empty".into(),
            ));
        }
        let value = serde_json::to_value(value).map_err(|err| {
            BootstrapError::IllegalArgument(format!("Cannot serialize property {key:?}: {err}"))
        })?;
        self.deployment.properties.values.insert(key, value);
        Ok(self)
    }

    /// Merges properties key by key. Keys missing from `properties` are kept.
    pub fn properties(&mut self, properties: Properties) -> Result<&mut Self, BootstrapError> {
        self.ensure_configuring()?;
        if properties.values.contains_key("") {
            return Err(BootstrapError::IllegalArgument(
                "Property key must not be empty".into(),
            ));
        }
        self.deployment.properties.merge_from(properties);
        Ok(self)
    }

    /// Returns a configurator for an additional bean, built when the builder
    /// is initialized.
    pub fn configure_bean(&mut self, class: ClassRef) -> Result<&mut BeanConfigurator, BootstrapError> {
        self.ensure_configuring()?;
        check_class(&class)?;
        let beans = &mut self.deployment.beans;
        beans.push(PendingBean::Configured(BeanConfigurator::new(class)));
        match beans.last_mut() {
            Some(PendingBean::Configured(v)) => Ok(v),
            _ => unreachable!(),
        }
    }

    /// Adds synthetic beans. A bean already added is skipped.
    pub fn add_beans<I>(&mut self, beans: I) -> Result<&mut Self, BootstrapError>
    where
        I: IntoIterator<Item = SyntheticBean>,
    {
        self.ensure_configuring()?;
        for bean in beans {
            let exists = self
                .deployment
                .beans
                .iter()
                .any(|v| matches!(v, PendingBean::Built(b) if b.same(&bean)));
            if !exists {
                self.deployment.beans.push(PendingBean::Built(bean));
            }
        }
        Ok(self)
    }

    pub fn add_bean(&mut self, bean: SyntheticBean) -> Result<&mut Self, BootstrapError> {
        self.add_beans([bean])
    }

    pub fn enable_discovery(&mut self) -> Result<&mut Self, BootstrapError> {
        self.ensure_configuring()?;
        self.deployment.discovery = DiscoveryMode::Enabled;
        Ok(self)
    }

    /// Disables discovery so that only the synthetic bean archive is deployed.
    ///
    /// Toggling discovery never clears classes or beans added so far.
    pub fn disable_discovery(&mut self) -> Result<&mut Self, BootstrapError> {
        self.ensure_configuring()?;
        self.deployment.discovery = DiscoveryMode::Disabled;
        Ok(self)
    }

    pub fn is_discovery_enabled(&self) -> bool {
        self.deployment.discovery == DiscoveryMode::Enabled
    }

    /// Sets the loader scanned for bean archives. Defaults to the loader
    /// provided by the environment.
    pub fn set_class_loader(&mut self, loader: ClassLoader) -> Result<&mut Self, BootstrapError> {
        self.ensure_configuring()?;
        self.deployment.class_loader = Some(loader);
        Ok(self)
    }

    pub fn set_environment<T>(&mut self, environment: T) -> Result<&mut Self, BootstrapError>
    where
        T: Environment + 'static,
    {
        self.ensure_configuring()?;
        self.environment = Arc::new(environment);
        Ok(self)
    }

    /// Sets the registry in which the container identifier is reserved.
    pub fn set_registry(&mut self, registry: Arc<ContainerRegistry>) -> Result<&mut Self, BootstrapError> {
        self.ensure_configuring()?;
        self.registry = registry;
        Ok(self)
    }

    /// Assembles the deployment and returns the container.
    ///
    /// # Errors
    ///
    /// * [`BootstrapError::IllegalState`] if the builder was already initialized
    ///   or a previous initialization failed.
    /// * [`BootstrapError::UnsupportedOperation`] inside a managed environment.
    /// * [`BootstrapError::Definition`] listing every problem found while
    ///   validating the deployment.
    ///
    /// Any failure leaves the builder in a terminal state, and so does
    /// dropping the returned future before it completes.
    pub async fn initialize(&mut self) -> Result<Container, BootstrapError> {
        self.initialize_with(Properties::new()).await
    }

    /// Same as [`initialize`](Self::initialize), with extra properties that
    /// take precedence over the ones set on the builder.
    pub async fn initialize_with(&mut self, params: Properties) -> Result<Container, BootstrapError> {
        self.ensure_configuring()?;
        // Stays failed if the returned future is dropped before completion.
        self.state = BuilderState::Failed;
        let deployment = take(&mut self.deployment);
        let container = assemble(
            deployment,
            params,
            self.environment.clone(),
            self.registry.clone(),
        )
        .await?;
        self.state = BuilderState::Initialized;
        Ok(container)
    }

    pub fn is_initialized(&self) -> bool {
        self.state == BuilderState::Initialized
    }

    fn ensure_configuring(&self) -> Result<(), BootstrapError> {
        match self.state {
            BuilderState::Configuring => Ok(()),
            BuilderState::Initialized => Err(BootstrapError::IllegalState(
                "Container builder is already initialized".into(),
            )),
            BuilderState::Failed => Err(BootstrapError::IllegalState(
                "Container builder failed to initialize".into(),
            )),
        }
    }
}

fn check_class(class: &ClassRef) -> Result<(), BootstrapError> {
    if class.name().is_empty() {
        return Err(BootstrapError::IllegalArgument(
            "Class name must not be empty".into(),
        ));
    }
    Ok(())
}

fn checked_classes<I>(classes: I) -> Result<Vec<ClassRef>, BootstrapError>
where
    I: IntoIterator<Item = ClassRef>,
{
    let classes: Vec<_> = classes.into_iter().collect();
    for class in &classes {
        check_class(class)?;
    }
    Ok(classes)
}
