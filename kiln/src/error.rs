use std::fmt;

use crate::ClassRef;

/// Type alias for boxed errors that can be sent across threads.
///
/// Collaborators such as [`Environment`](crate::Environment) and bean
/// producers report failures with this type.
pub type StdError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by the container builder.
#[derive(Debug)]
pub enum BootstrapError {
    /// A mutator received an argument it can not accept.
    IllegalArgument(String),
    /// The builder was used after it had been initialized or had failed.
    IllegalState(String),
    /// Initialization was requested inside a host that already owns a container.
    UnsupportedOperation(String),
    /// Assembly found one or more problems with the deployment.
    Definition(DefinitionError),
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapError::IllegalArgument(v) => write!(f, "Illegal argument: {v}"),
            BootstrapError::IllegalState(v) => write!(f, "Illegal state: {v}"),
            BootstrapError::UnsupportedOperation(v) => write!(f, "Unsupported operation: {v}"),
            BootstrapError::Definition(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for BootstrapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BootstrapError::Definition(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DefinitionError> for BootstrapError {
    fn from(value: DefinitionError) -> Self {
        Self::Definition(value)
    }
}

/// Aggregate of every problem found while validating a deployment.
#[derive(Debug)]
pub struct DefinitionError {
    problems: Vec<Problem>,
}

impl DefinitionError {
    pub(crate) fn new(problems: Vec<Problem>) -> Self {
        Self { problems }
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn into_problems(self) -> Vec<Problem> {
        self.problems
    }
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Definition error ({} problems)", self.problems.len())?;
        for problem in &self.problems {
            write!(f, "\n  - {problem}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DefinitionError {}

/// A single structural problem with a deployment.
#[derive(Debug)]
pub enum Problem {
    /// Another live container already holds the identifier.
    DuplicateContainerId(String),
    /// The class loader used for the deployment has been closed.
    ClassLoaderClosed(String),
    /// A scanning collaborator failed.
    ScanFailed { target: String, source: StdError },
    /// An enabled interceptor is not marked as an interceptor.
    NotAnInterceptor(ClassRef),
    /// An enabled decorator is not marked as a decorator.
    NotADecorator(ClassRef),
    /// A selected alternative is not marked as an alternative.
    NotAnAlternative(ClassRef),
    /// A selected alternative stereotype is not marked as a stereotype.
    NotAStereotype(ClassRef),
    /// An annotated type override edits a member without a name.
    EmptyMemberName(ClassRef),
    /// Several synthetic beans share one name.
    AmbiguousBeanName(String),
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::DuplicateContainerId(id) => {
                write!(f, "Container id {id:?} is already in use")
            }
            Problem::ClassLoaderClosed(name) => write!(f, "Class loader {name:?} is closed"),
            Problem::ScanFailed { target, source } => {
                write!(f, "Cannot scan {target}: {source}")
            }
            Problem::NotAnInterceptor(class) => write!(f, "{class} is not an interceptor"),
            Problem::NotADecorator(class) => write!(f, "{class} is not a decorator"),
            Problem::NotAnAlternative(class) => write!(f, "{class} is not an alternative"),
            Problem::NotAStereotype(class) => write!(f, "{class} is not a stereotype"),
            Problem::EmptyMemberName(class) => {
                write!(f, "Annotated type {class} edits a member with an empty name")
            }
            Problem::AmbiguousBeanName(name) => {
                write!(f, "Bean name {name:?} is used by several synthetic beans")
            }
        }
    }
}
