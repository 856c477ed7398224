use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::{ClassLoader, ClassRef, PackageRef, StdError};

/// Host capabilities consumed while bootstrapping a container.
///
/// Scanning is synchronous from the point of view of bootstrap: every scan is
/// awaited before assembly continues, and may be slow.
pub trait Environment: Send + Sync {
    /// Lists the classes found in a package, honoring the recursive flag.
    fn scan_package(
        &self,
        loader: &ClassLoader,
        package: &PackageRef,
    ) -> impl Future<Output = Result<Vec<ClassRef>, StdError>> + Send;

    /// Lists the classes of every bean archive visible to the loader.
    fn scan_bean_archives(
        &self,
        loader: &ClassLoader,
    ) -> impl Future<Output = Result<Vec<ClassRef>, StdError>> + Send;

    /// Reports whether a host container already manages this process.
    fn is_managed(&self) -> bool {
        false
    }

    /// Loader used when the builder was not given one explicitly.
    fn default_class_loader(&self) -> ClassLoader {
        ClassLoader::system()
    }
}

#[async_trait]
pub(crate) trait DynEnvironment: Send + Sync {
    async fn scan_package(
        &self,
        loader: &ClassLoader,
        package: &PackageRef,
    ) -> Result<Vec<ClassRef>, StdError>;

    async fn scan_bean_archives(&self, loader: &ClassLoader) -> Result<Vec<ClassRef>, StdError>;

    fn is_managed(&self) -> bool;

    fn default_class_loader(&self) -> ClassLoader;
}

#[async_trait]
impl<T> DynEnvironment for T
where
    T: Environment,
{
    async fn scan_package(
        &self,
        loader: &ClassLoader,
        package: &PackageRef,
    ) -> Result<Vec<ClassRef>, StdError> {
        Environment::scan_package(self, loader, package).await
    }

    async fn scan_bean_archives(&self, loader: &ClassLoader) -> Result<Vec<ClassRef>, StdError> {
        Environment::scan_bean_archives(self, loader).await
    }

    fn is_managed(&self) -> bool {
        Environment::is_managed(self)
    }

    fn default_class_loader(&self) -> ClassLoader {
        Environment::default_class_loader(self)
    }
}

/// In-memory environment backed by a fixed class index.
///
/// Classes are registered up front; package scans filter the index by
/// package and loader, archive scans return the classes registered as
/// members of a bean archive.
#[derive(Default)]
pub struct StaticEnvironment {
    index: RwLock<Vec<IndexedClass>>,
    managed: bool,
}

struct IndexedClass {
    class: ClassRef,
    archived: bool,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an environment that reports itself as a managed host.
    pub fn managed() -> Self {
        Self {
            managed: true,
            ..Default::default()
        }
    }

    /// Registers a class that is only reachable through package scans.
    pub fn add_class(&self, class: ClassRef) -> &Self {
        self.insert(class, false)
    }

    /// Registers a class that belongs to a bean archive.
    pub fn add_archived_class(&self, class: ClassRef) -> &Self {
        self.insert(class, true)
    }

    fn insert(&self, class: ClassRef, archived: bool) -> &Self {
        let mut index = self.index.write().unwrap();
        match index.iter_mut().find(|v| v.class == class) {
            Some(v) => v.archived |= archived,
            None => index.push(IndexedClass { class, archived }),
        }
        self
    }
}

impl Environment for StaticEnvironment {
    fn scan_package(
        &self,
        loader: &ClassLoader,
        package: &PackageRef,
    ) -> impl Future<Output = Result<Vec<ClassRef>, StdError>> + Send {
        let classes: Vec<ClassRef> = self
            .index
            .read()
            .unwrap()
            .iter()
            .filter(|v| v.class.loader() == loader && package.contains(&v.class))
            .map(|v| v.class.clone())
            .collect();
        std::future::ready(Ok::<_, StdError>(classes))
    }

    fn scan_bean_archives(
        &self,
        loader: &ClassLoader,
    ) -> impl Future<Output = Result<Vec<ClassRef>, StdError>> + Send {
        let classes: Vec<ClassRef> = self
            .index
            .read()
            .unwrap()
            .iter()
            .filter(|v| v.archived && v.class.loader() == loader)
            .map(|v| v.class.clone())
            .collect();
        std::future::ready(Ok::<_, StdError>(classes))
    }

    fn is_managed(&self) -> bool {
        self.managed
    }
}

impl<T> Environment for Arc<T>
where
    T: Environment,
{
    fn scan_package(
        &self,
        loader: &ClassLoader,
        package: &PackageRef,
    ) -> impl Future<Output = Result<Vec<ClassRef>, StdError>> + Send {
        <T as Environment>::scan_package(self, loader, package)
    }

    fn scan_bean_archives(
        &self,
        loader: &ClassLoader,
    ) -> impl Future<Output = Result<Vec<ClassRef>, StdError>> + Send {
        <T as Environment>::scan_bean_archives(self, loader)
    }

    fn is_managed(&self) -> bool {
        <T as Environment>::is_managed(self)
    }

    fn default_class_loader(&self) -> ClassLoader {
        <T as Environment>::default_class_loader(self)
    }
}
