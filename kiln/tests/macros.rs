use kiln::{BeanType, ClassLoader, ClassRef, Container, Markers};

#[derive(BeanType)]
struct Repository;

#[derive(BeanType)]
#[bean(interceptor)]
struct Audit;

#[derive(BeanType)]
#[bean(decorator, name = "app::CachedRepository")]
struct Cached;

#[derive(BeanType)]
#[bean(alternative)]
#[bean(stereotype)]
struct Mock;

struct Manual;

impl BeanType for Manual {}

#[test]
fn test_derive_class_name() {
    assert_eq!(Repository::class_name(), concat!(module_path!(), "::Repository"));
    assert_eq!(Cached::class_name(), "app::CachedRepository");
    assert_eq!(Manual::class_name(), std::any::type_name::<Manual>());
}

#[test]
fn test_derive_markers() {
    assert_eq!(Repository::markers(), Markers::default());
    assert_eq!(Audit::markers(), Markers::new().interceptor());
    assert_eq!(Cached::markers(), Markers::new().decorator());
    assert_eq!(Mock::markers(), Markers::new().alternative().stereotype());
}

#[test]
fn test_class_ref_of() {
    let audit = ClassRef::of::<Audit>();
    assert_eq!(audit.loader(), &ClassLoader::system());
    assert!(audit.markers().interceptor);
    assert_eq!(audit.package(), module_path!());
    assert_eq!(audit, ClassRef::new(Audit::class_name(), ClassLoader::system()));
    assert_ne!(audit, ClassRef::new(Audit::class_name(), ClassLoader::new("system")));
}

#[tokio::test]
async fn test_derived_types_in_container() {
    let container = Container::builder()
        .disable_discovery()
        .unwrap()
        .add_bean_class(ClassRef::of::<Repository>())
        .unwrap()
        .add_interceptor(ClassRef::of::<Audit>())
        .unwrap()
        .add_decorator(ClassRef::of::<Cached>())
        .unwrap()
        .add_alternative(ClassRef::of::<Mock>())
        .unwrap()
        .add_alternative_stereotype(ClassRef::of::<Mock>())
        .unwrap()
        .initialize()
        .await
        .unwrap();
    let classes: Vec<_> = container.model().bean_classes().cloned().collect();
    assert_eq!(
        classes,
        vec![
            ClassRef::of::<Repository>(),
            ClassRef::of::<Audit>(),
            ClassRef::of::<Cached>(),
        ]
    );
}
