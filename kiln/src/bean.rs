use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{Annotation, ClassRef, StdError};

/// Opaque production logic of a synthetic bean.
pub type Producer =
    Arc<dyn Fn() -> Result<Box<dyn Any + Send + Sync>, StdError> + Send + Sync + 'static>;

const DEFAULT_SCOPE: &str = "dependent";

/// Bean descriptor constructed by the caller instead of being discovered.
///
/// Identity is by reference: cloning a `SyntheticBean` yields the same bean,
/// while two beans built separately stay distinct even when they share an
/// implementation class.
#[derive(Clone)]
pub struct SyntheticBean {
    inner: Arc<BeanDefinition>,
}

struct BeanDefinition {
    class: ClassRef,
    scope: String,
    name: Option<String>,
    qualifiers: Vec<Annotation>,
    types: Vec<ClassRef>,
    alternative: bool,
    producer: Option<Producer>,
}

impl SyntheticBean {
    /// Starts configuring a bean implemented by the given class.
    pub fn builder(class: ClassRef) -> BeanConfigurator {
        BeanConfigurator::new(class)
    }

    pub fn class(&self) -> &ClassRef {
        &self.inner.class
    }

    pub fn scope(&self) -> &str {
        &self.inner.scope
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn qualifiers(&self) -> &[Annotation] {
        &self.inner.qualifiers
    }

    /// Returns the bean types. The implementation class is always the first one.
    pub fn types(&self) -> &[ClassRef] {
        &self.inner.types
    }

    pub fn is_alternative(&self) -> bool {
        self.inner.alternative
    }

    /// Runs the production logic, if the bean has any.
    pub fn produce(&self) -> Option<Result<Box<dyn Any + Send + Sync>, StdError>> {
        self.inner.producer.as_ref().map(|f| f())
    }

    /// Checks whether both handles refer to the same bean.
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for SyntheticBean {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for SyntheticBean {}

impl fmt::Debug for SyntheticBean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntheticBean")
            .field("class", self.class())
            .field("scope", &self.scope())
            .field("name", &self.name())
            .field("alternative", &self.is_alternative())
            .finish_non_exhaustive()
    }
}

/// Nested builder producing exactly one [`SyntheticBean`].
///
/// When obtained from
/// [`ContainerBuilder::configure_bean`](crate::ContainerBuilder::configure_bean)
/// the bean is built when the owning builder is initialized, never before.
pub struct BeanConfigurator {
    class: ClassRef,
    scope: String,
    name: Option<String>,
    qualifiers: Vec<Annotation>,
    types: Vec<ClassRef>,
    alternative: bool,
    producer: Option<Producer>,
}

impl BeanConfigurator {
    pub(crate) fn new(class: ClassRef) -> Self {
        Self {
            types: vec![class.clone()],
            class,
            scope: DEFAULT_SCOPE.to_string(),
            name: None,
            qualifiers: Vec::new(),
            alternative: false,
            producer: None,
        }
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    pub fn scope(&mut self, scope: impl Into<String>) -> &mut Self {
        self.scope = scope.into();
        self
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn qualifier(&mut self, qualifier: Annotation) -> &mut Self {
        self.qualifiers.push(qualifier);
        self
    }

    /// Adds a type the bean can be selected by.
    pub fn add_type(&mut self, ty: ClassRef) -> &mut Self {
        if !self.types.contains(&ty) {
            self.types.push(ty);
        }
        self
    }

    pub fn alternative(&mut self, alternative: bool) -> &mut Self {
        self.alternative = alternative;
        self
    }

    pub fn produce_with<F, T>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> Result<T, StdError> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        self.producer = Some(Arc::new(move || {
            f().map(|v| Box::new(v) as Box<dyn Any + Send + Sync>)
        }));
        self
    }

    pub fn build(self) -> SyntheticBean {
        SyntheticBean {
            inner: Arc::new(BeanDefinition {
                class: self.class,
                scope: self.scope,
                name: self.name,
                qualifiers: self.qualifiers,
                types: self.types,
                alternative: self.alternative,
                producer: self.producer,
            }),
        }
    }
}
