use std::collections::HashSet;

use kiln::{ClassList, ClassLoader, ClassRef, Markers, PackageRef};

#[test]
fn test_class_ref_equality() {
    let loader = ClassLoader::new("test");
    let other = ClassLoader::new("test");
    let plain = ClassRef::new("app::A", loader.clone());
    let marked = ClassRef::new("app::A", loader.clone()).with_markers(Markers::new().decorator());
    assert_eq!(plain, marked);
    assert_ne!(plain, ClassRef::new("app::A", other));
    assert_ne!(plain, ClassRef::new("app::B", loader));
    let set: HashSet<_> = [plain.clone(), marked].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_class_ref_package() {
    let loader = ClassLoader::system();
    assert_eq!(ClassRef::new("app::web::Handler", loader.clone()).package(), "app::web");
    assert_eq!(ClassRef::new("Root", loader.clone()).package(), "");
    assert_eq!(ClassRef::new("app::web::Handler", loader).to_string(), "app::web::Handler");
}

#[test]
fn test_package_contains() {
    let loader = ClassLoader::system();
    let handler = ClassRef::new("app::web::Handler", loader.clone());
    let routes = ClassRef::new("app::web::api::Routes", loader.clone());
    let lookalike = ClassRef::new("app::webhooks::Sink", loader.clone());
    let root = ClassRef::new("Root", loader);

    let flat = PackageRef::of(&handler, false);
    assert_eq!(flat.name(), "app::web");
    assert!(flat.contains(&handler));
    assert!(!flat.contains(&routes));

    let deep = PackageRef::new("app::web", true);
    assert!(deep.contains(&handler));
    assert!(deep.contains(&routes));
    assert!(!deep.contains(&lookalike));

    assert!(PackageRef::new("", true).contains(&routes));
    assert!(PackageRef::new("", false).contains(&root));
    assert!(!PackageRef::new("", false).contains(&routes));
}

#[test]
fn test_class_loader_close() {
    let loader = ClassLoader::new("plugins");
    let alias = loader.clone();
    assert!(!alias.is_closed());
    loader.close();
    assert!(alias.is_closed());
    assert_eq!(alias.name(), "plugins");
}

#[test]
fn test_class_list_order() {
    let loader = ClassLoader::system();
    let a = ClassRef::new("app::A", loader.clone());
    let b = ClassRef::new("app::B", loader);
    let mut list = ClassList::new();
    assert!(list.insert(b.clone()));
    assert!(list.insert(a.clone()));
    assert!(!list.insert(b.clone()));
    assert_eq!(list.as_slice(), &[b.clone(), a.clone()]);
    assert!(list.contains(&a));
    assert_eq!(list.len(), 2);
    let collected: ClassList = [a.clone(), a, b].into_iter().collect();
    assert_eq!(collected.len(), 2);
}
