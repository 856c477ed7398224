use std::any::type_name;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Handle to the loader that owns a set of classes.
///
/// Two handles are equal only when they point at the same loader instance, so
/// two loaders with the same name stay distinct.
#[derive(Clone)]
pub struct ClassLoader {
    inner: Arc<ClassLoaderInner>,
}

struct ClassLoaderInner {
    name: Box<str>,
    closed: AtomicBool,
}

impl ClassLoader {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ClassLoaderInner {
                name: name.into().into_boxed_str(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the process default loader.
    pub fn system() -> Self {
        static SYSTEM: OnceLock<ClassLoader> = OnceLock::new();
        SYSTEM.get_or_init(|| ClassLoader::new("system")).clone()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Marks the loader as closed. Containers can not be bootstrapped from a
    /// closed loader.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl PartialEq for ClassLoader {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ClassLoader {}

impl Hash for ClassLoader {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl fmt::Debug for ClassLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassLoader")
            .field("name", &self.name())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Capability markers declared by a type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Markers {
    pub interceptor: bool,
    pub decorator: bool,
    pub alternative: bool,
    pub stereotype: bool,
}

impl Markers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interceptor(mut self) -> Self {
        self.interceptor = true;
        self
    }

    pub fn decorator(mut self) -> Self {
        self.decorator = true;
        self
    }

    pub fn alternative(mut self) -> Self {
        self.alternative = true;
        self
    }

    pub fn stereotype(mut self) -> Self {
        self.stereotype = true;
        self
    }
}

/// Opaque descriptor of a loadable type.
///
/// Equality and hashing use the `(name, loader)` pair only. Markers describe
/// the type but never distinguish two references to it.
///
/// # Examples
///
/// ```rust
/// use kiln::{ClassLoader, ClassRef, Markers};
///
/// let loader = ClassLoader::new("app");
/// let logging = ClassRef::new("app::aspects::Logging", loader.clone())
///     .with_markers(Markers::new().interceptor());
///
/// assert_eq!(logging.package(), "app::aspects");
/// assert!(logging.markers().interceptor);
/// assert_eq!(logging, ClassRef::new("app::aspects::Logging", loader));
/// ```
#[derive(Clone)]
pub struct ClassRef {
    name: Arc<str>,
    loader: ClassLoader,
    markers: Markers,
}

impl ClassRef {
    pub fn new(name: impl Into<Arc<str>>, loader: ClassLoader) -> Self {
        Self {
            name: name.into(),
            loader,
            markers: Markers::default(),
        }
    }

    /// Builds a descriptor for a Rust type owned by the system loader.
    pub fn of<T>() -> Self
    where
        T: BeanType,
    {
        Self::new(T::class_name(), ClassLoader::system()).with_markers(T::markers())
    }

    pub fn with_markers(mut self, markers: Markers) -> Self {
        self.markers = markers;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn loader(&self) -> &ClassLoader {
        &self.loader
    }

    pub fn markers(&self) -> Markers {
        self.markers
    }

    /// Returns the package path, i.e. everything before the last `::`.
    /// Types declared at the root have an empty package.
    pub fn package(&self) -> &str {
        match self.name.rfind(PACKAGE_SEPARATOR) {
            Some(pos) => &self.name[..pos],
            None => "",
        }
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.loader == other.loader
    }
}

impl Eq for ClassRef {}

impl Hash for ClassRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.loader.hash(state);
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.loader.name())
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

const PACKAGE_SEPARATOR: &str = "::";

/// A request to scan one package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageRef {
    name: Arc<str>,
    recursive: bool,
}

impl PackageRef {
    pub fn new(name: impl Into<Arc<str>>, recursive: bool) -> Self {
        Self {
            name: name.into(),
            recursive,
        }
    }

    /// Builds a scan request for the package of the given class.
    pub fn of(class: &ClassRef, recursive: bool) -> Self {
        Self::new(class.package(), recursive)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub(crate) fn upgrade(&mut self, recursive: bool) {
        self.recursive |= recursive;
    }

    /// Checks whether the class lies in this package, or in one of its
    /// sub-packages when the request is recursive.
    pub fn contains(&self, class: &ClassRef) -> bool {
        let package = class.package();
        if package == self.name() {
            return true;
        }
        if !self.recursive {
            return false;
        }
        if self.name.is_empty() {
            return true;
        }
        package
            .strip_prefix(self.name())
            .is_some_and(|rest| rest.starts_with(PACKAGE_SEPARATOR))
    }
}

/// Trait for Rust types that can be described as bean classes.
///
/// Usually derived with `#[derive(BeanType)]`.
pub trait BeanType: 'static {
    fn class_name() -> &'static str {
        type_name::<Self>()
    }

    fn markers() -> Markers {
        Markers::default()
    }
}
