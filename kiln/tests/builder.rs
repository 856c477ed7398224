use std::sync::{Arc, Mutex};

use kiln::{
    BeanSource, BootstrapError, ClassLoader, ClassRef, Container, ContainerBuilder,
    ContainerEvent, Environment, Extension, Markers, Origin, PackageRef, Properties,
    StaticEnvironment, StdError,
};

fn loader() -> ClassLoader {
    ClassLoader::new("test")
}

fn class(loader: &ClassLoader, name: &str) -> ClassRef {
    ClassRef::new(name, loader.clone())
}

fn builder(loader: &ClassLoader) -> ContainerBuilder {
    let mut builder = Container::builder();
    builder
        .disable_discovery()
        .unwrap()
        .set_class_loader(loader.clone())
        .unwrap();
    builder
}

#[tokio::test]
async fn test_bean_classes_union() {
    let loader = loader();
    let a = class(&loader, "app::A");
    let b = class(&loader, "app::B");
    let c = class(&loader, "app::C");
    let container = builder(&loader)
        .bean_classes([a.clone(), b.clone()])
        .unwrap()
        .bean_classes([b.clone(), c.clone()])
        .unwrap()
        .add_bean_class(a.clone())
        .unwrap()
        .initialize()
        .await
        .unwrap();
    let classes: Vec<_> = container.model().bean_classes().cloned().collect();
    assert_eq!(classes, vec![a, b, c]);
}

#[tokio::test]
async fn test_discovery_disabled_uses_synthetic_archive() {
    let loader = loader();
    let a = class(&loader, "app::A");
    let b = class(&loader, "app::B");
    let environment = Arc::new(StaticEnvironment::new());
    environment
        .add_archived_class(class(&loader, "lib::Archived"))
        .add_class(class(&loader, "app::Scanned"));
    let container = builder(&loader)
        .set_environment(environment)
        .unwrap()
        .add_package(true, a.clone())
        .unwrap()
        .bean_classes([a.clone(), b.clone()])
        .unwrap()
        .initialize()
        .await
        .unwrap();
    let classes: Vec<_> = container.model().bean_classes().cloned().collect();
    assert_eq!(classes, vec![a, b]);
    assert!(
        container
            .model()
            .sources()
            .iter()
            .all(|v| matches!(v, BeanSource::Class { origin: Origin::Synthetic, .. }))
    );
}

#[tokio::test]
async fn test_discovery_enabled_merges_sources() {
    let loader = loader();
    let a = class(&loader, "app::A");
    let environment = Arc::new(StaticEnvironment::new());
    environment
        .add_archived_class(class(&loader, "lib::Archived"))
        .add_archived_class(a.clone())
        .add_class(class(&loader, "app::Scanned"))
        .add_class(class(&loader, "other::Ignored"));
    let mut builder = Container::builder();
    builder
        .set_class_loader(loader.clone())
        .unwrap()
        .set_environment(environment)
        .unwrap()
        .add_bean_class(a.clone())
        .unwrap()
        .add_package(false, a.clone())
        .unwrap();
    assert!(builder.is_discovery_enabled());
    let container = builder.initialize().await.unwrap();
    let names: Vec<_> = container
        .model()
        .sources()
        .iter()
        .map(|v| v.class().name().to_string())
        .collect();
    assert_eq!(names, vec!["app::A", "app::Scanned", "lib::Archived"]);
    assert!(matches!(
        container.select(&a),
        Some(BeanSource::Class {
            origin: Origin::Synthetic,
            ..
        })
    ));
}

#[tokio::test]
async fn test_package_recursive_is_absorbing() {
    for recursive_first in [true, false] {
        let loader = loader();
        let main = class(&loader, "app::Main");
        let environment = Arc::new(StaticEnvironment::new());
        environment
            .add_class(class(&loader, "app::Service"))
            .add_class(class(&loader, "app::web::Handler"));
        let mut builder = Container::builder();
        builder
            .set_class_loader(loader.clone())
            .unwrap()
            .set_environment(environment)
            .unwrap();
        if recursive_first {
            builder.add_package(true, main.clone()).unwrap();
            builder.packages([main.clone()]).unwrap();
        } else {
            builder.packages([main.clone()]).unwrap();
            builder.add_packages(true, [main.clone()]).unwrap();
        }
        let container = builder.initialize().await.unwrap();
        assert!(
            container
                .select(&class(&loader, "app::web::Handler"))
                .is_some()
        );
        assert!(container.select(&class(&loader, "app::Service")).is_some());
    }
}

#[tokio::test]
async fn test_interceptors_and_decorators_are_bean_classes() {
    let loader = loader();
    let interceptor =
        class(&loader, "app::Audit").with_markers(Markers::new().interceptor());
    let decorator =
        class(&loader, "app::Cached").with_markers(Markers::new().decorator());
    let container = builder(&loader)
        .add_interceptor(interceptor.clone())
        .unwrap()
        .add_decorator(decorator.clone())
        .unwrap()
        .initialize()
        .await
        .unwrap();
    let classes: Vec<_> = container.model().bean_classes().cloned().collect();
    assert_eq!(classes, vec![interceptor.clone(), decorator.clone()]);
    assert_eq!(container.model().interceptors().as_slice(), &[interceptor]);
    assert_eq!(container.model().decorators().as_slice(), &[decorator]);
}

#[tokio::test]
async fn test_enablement_order() {
    let loader = loader();
    let markers = Markers::new().interceptor();
    let c1 = class(&loader, "app::C1").with_markers(markers);
    let c2 = class(&loader, "app::C2").with_markers(markers);
    let c3 = class(&loader, "app::C3").with_markers(markers);
    let container = builder(&loader)
        .interceptors([c1.clone(), c2.clone()])
        .unwrap()
        .add_interceptor(c3.clone())
        .unwrap()
        .add_interceptor(c1.clone())
        .unwrap()
        .initialize()
        .await
        .unwrap();
    assert_eq!(container.model().interceptors().as_slice(), &[c1, c2, c3]);
}

#[tokio::test]
async fn test_alternatives() {
    let loader = loader();
    let alternative = class(&loader, "app::Mock").with_markers(Markers::new().alternative());
    let stereotype = class(&loader, "app::Testing").with_markers(Markers::new().stereotype());
    let container = builder(&loader)
        .alternatives([alternative.clone(), alternative.clone()])
        .unwrap()
        .add_alternative_stereotype(stereotype.clone())
        .unwrap()
        .initialize()
        .await
        .unwrap();
    assert_eq!(container.model().alternatives().as_slice(), &[alternative]);
    assert_eq!(
        container.model().alternative_stereotypes().as_slice(),
        &[stereotype]
    );
    // Alternatives are not implicitly bean classes.
    assert_eq!(container.model().bean_classes().count(), 0);
}

#[tokio::test]
async fn test_properties_last_write_wins() {
    let loader = loader();
    let container = builder(&loader)
        .property("x", 1)
        .unwrap()
        .property("x", 2)
        .unwrap()
        .properties(Properties::new().with("y", 3).unwrap())
        .unwrap()
        .initialize()
        .await
        .unwrap();
    let properties = container.model().properties();
    assert_eq!(properties.len(), 2);
    assert_eq!(properties.get::<i32>("x").unwrap(), 2);
    assert_eq!(properties.get::<i32>("y").unwrap(), 3);
}

#[tokio::test]
async fn test_initialize_with_params() {
    let loader = loader();
    let container = builder(&loader)
        .property("x", 1)
        .unwrap()
        .property("y", "kept")
        .unwrap()
        .initialize_with(Properties::new().with("x", 10).unwrap())
        .await
        .unwrap();
    let properties = container.model().properties();
    assert_eq!(properties.get::<i32>("x").unwrap(), 10);
    assert_eq!(properties.get::<String>("y").unwrap(), "kept");
}

#[tokio::test]
async fn test_invalid_arguments() {
    let loader = loader();
    let mut builder = builder(&loader);
    assert!(matches!(
        builder.add_bean_class(class(&loader, "")),
        Err(BootstrapError::IllegalArgument(_))
    ));
    assert!(matches!(
        builder.property("", 1),
        Err(BootstrapError::IllegalArgument(_))
    ));
    // A rejected call leaves no partial state behind.
    assert!(matches!(
        builder.bean_classes([class(&loader, "app::A"), class(&loader, "")]),
        Err(BootstrapError::IllegalArgument(_))
    ));
    let container = builder.initialize().await.unwrap();
    assert_eq!(container.model().bean_classes().count(), 0);
}

#[tokio::test]
async fn test_empty_inputs_are_noop() {
    let loader = loader();
    let container = builder(&loader)
        .bean_classes(Vec::new())
        .unwrap()
        .interceptors(Vec::new())
        .unwrap()
        .extensions(Vec::new())
        .unwrap()
        .properties(Properties::new())
        .unwrap()
        .initialize()
        .await
        .unwrap();
    assert!(container.model().sources().is_empty());
    assert!(container.model().properties().is_empty());
}

#[tokio::test]
async fn test_single_use() {
    let loader = loader();
    let mut builder = builder(&loader);
    builder.add_bean_class(class(&loader, "app::A")).unwrap();
    assert!(!builder.is_initialized());
    let _container = builder.initialize().await.unwrap();
    assert!(builder.is_initialized());
    assert!(matches!(
        builder.add_bean_class(class(&loader, "app::B")),
        Err(BootstrapError::IllegalState(_))
    ));
    assert!(matches!(
        builder.disable_discovery(),
        Err(BootstrapError::IllegalState(_))
    ));
    assert!(matches!(
        builder.property("x", 1),
        Err(BootstrapError::IllegalState(_))
    ));
    assert!(matches!(
        builder.configure_bean(class(&loader, "app::C")),
        Err(BootstrapError::IllegalState(_))
    ));
    assert!(matches!(
        builder.initialize().await,
        Err(BootstrapError::IllegalState(_))
    ));
    assert!(builder.is_initialized());
}

#[tokio::test]
async fn test_failed_initialize_is_terminal() {
    let loader = loader();
    let mut builder = builder(&loader);
    builder
        .add_interceptor(class(&loader, "app::NotAnInterceptor"))
        .unwrap();
    assert!(matches!(
        builder.initialize().await,
        Err(BootstrapError::Definition(_))
    ));
    assert!(!builder.is_initialized());
    assert!(matches!(
        builder.add_bean_class(class(&loader, "app::A")),
        Err(BootstrapError::IllegalState(_))
    ));
    assert!(matches!(
        builder.initialize().await,
        Err(BootstrapError::IllegalState(_))
    ));
}

#[tokio::test]
async fn test_managed_environment() {
    let mut builder = Container::builder();
    builder.set_environment(StaticEnvironment::managed()).unwrap();
    assert!(matches!(
        builder.initialize().await,
        Err(BootstrapError::UnsupportedOperation(_))
    ));
    assert!(matches!(
        builder.initialize().await,
        Err(BootstrapError::IllegalState(_))
    ));
}

#[tokio::test]
async fn test_discovery_toggle_keeps_synthetic_state() {
    let loader = loader();
    let a = class(&loader, "app::A");
    let mut builder = builder(&loader);
    builder.add_bean_class(a.clone()).unwrap();
    builder.enable_discovery().unwrap().enable_discovery().unwrap();
    assert!(builder.is_discovery_enabled());
    builder.disable_discovery().unwrap();
    assert!(!builder.is_discovery_enabled());
    let container = builder.initialize().await.unwrap();
    assert!(container.select(&a).is_some());
}

#[tokio::test]
async fn test_container_id_accessors() {
    let mut builder = Container::builder();
    assert_eq!(builder.container_id(), None);
    builder.set_container_id("orders").unwrap();
    assert_eq!(builder.container_id(), Some("orders"));
    builder.set_container_id("").unwrap();
    assert_eq!(builder.container_id(), None);
}

struct Recorder {
    label: &'static str,
    events: Arc<Mutex<Vec<String>>>,
}

impl Extension for Recorder {
    fn observe(&self, event: &ContainerEvent<'_>) {
        let event = match event {
            ContainerEvent::AfterBeanDiscovery { sources } => {
                format!("discovery:{}", sources.len())
            }
            ContainerEvent::AfterDeploymentValidation { .. } => "validation".to_string(),
            ContainerEvent::BeforeShutdown { .. } => "shutdown".to_string(),
            ContainerEvent::Custom { name, payload } => format!("{name}:{payload}"),
        };
        self.events
            .lock()
            .unwrap()
            .push(format!("{}/{event}", self.label));
    }
}

#[tokio::test]
async fn test_extensions() {
    let loader = loader();
    let events = Arc::new(Mutex::new(Vec::new()));
    let first = Arc::new(Recorder {
        label: "first",
        events: events.clone(),
    });
    let second = Arc::new(Recorder {
        label: "second",
        events: events.clone(),
    });
    let container = builder(&loader)
        .add_extension(first.clone())
        .unwrap()
        .add_extension(second.clone())
        .unwrap()
        .add_extension(first.clone())
        .unwrap()
        .add_bean_class(class(&loader, "app::A"))
        .unwrap()
        .initialize()
        .await
        .unwrap();
    assert_eq!(container.model().extensions().len(), 2);
    container.fire("ping", &serde_json::json!(1));
    container.shutdown();
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            "first/discovery:1",
            "second/discovery:1",
            "first/validation",
            "second/validation",
            "first/ping:1",
            "second/ping:1",
            "first/shutdown",
            "second/shutdown",
        ]
    );
}

struct PendingArchives;

impl Environment for PendingArchives {
    async fn scan_package(
        &self,
        _loader: &ClassLoader,
        _package: &PackageRef,
    ) -> Result<Vec<ClassRef>, StdError> {
        Ok(Vec::new())
    }

    async fn scan_bean_archives(&self, _loader: &ClassLoader) -> Result<Vec<ClassRef>, StdError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_cancelled_initialize_is_terminal() {
    let loader = loader();
    let a = class(&loader, "app::A");
    let mut builder = builder(&loader);
    builder
        .enable_discovery()
        .unwrap()
        .set_environment(PendingArchives)
        .unwrap()
        .add_bean_class(a.clone())
        .unwrap()
        .property("x", 1)
        .unwrap();
    tokio::select! {
        biased;
        _ = builder.initialize() => panic!("bean archive scan never completes"),
        _ = std::future::ready(()) => {}
    }
    assert!(!builder.is_initialized());
    assert!(matches!(
        builder.initialize().await,
        Err(BootstrapError::IllegalState(_))
    ));
    assert!(matches!(
        builder.add_bean_class(a),
        Err(BootstrapError::IllegalState(_))
    ));
}
