use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::{ClassRef, StdError};

/// Annotation attached to a type or to one of its members.
///
/// The name identifies the annotation kind; values are free-form.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    name: Arc<str>,
    values: BTreeMap<String, serde_json::Value>,
}

impl Annotation {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with<T>(mut self, key: impl Into<String>, value: T) -> Result<Self, StdError>
    where
        T: Serialize,
    {
        self.values.insert(key.into(), serde_json::to_value(value)?);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }
}

/// Element of a type an edit applies to.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnnotationTarget {
    Type,
    Member(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum AnnotationEdit {
    /// Adds an annotation, replacing one with the same name.
    Add {
        target: AnnotationTarget,
        annotation: Annotation,
    },
    /// Removes the annotation with the given name.
    Remove {
        target: AnnotationTarget,
        name: String,
    },
    /// Removes every annotation of the target.
    RemoveAll { target: AnnotationTarget },
}

impl AnnotationEdit {
    pub fn target(&self) -> &AnnotationTarget {
        match self {
            AnnotationEdit::Add { target, .. }
            | AnnotationEdit::Remove { target, .. }
            | AnnotationEdit::RemoveAll { target } => target,
        }
    }
}

/// Caller supplied metadata edits for one class.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatedTypeOverride {
    class: ClassRef,
    edits: Vec<AnnotationEdit>,
}

impl AnnotatedTypeOverride {
    pub fn new(class: ClassRef) -> Self {
        Self {
            class,
            edits: Vec::new(),
        }
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    pub fn edits(&self) -> &[AnnotationEdit] {
        &self.edits
    }

    pub fn add(mut self, annotation: Annotation) -> Self {
        self.push(AnnotationEdit::Add {
            target: AnnotationTarget::Type,
            annotation,
        });
        self
    }

    pub fn add_to_member(mut self, member: impl Into<String>, annotation: Annotation) -> Self {
        self.push(AnnotationEdit::Add {
            target: AnnotationTarget::Member(member.into()),
            annotation,
        });
        self
    }

    pub fn remove(mut self, name: impl Into<String>) -> Self {
        self.push(AnnotationEdit::Remove {
            target: AnnotationTarget::Type,
            name: name.into(),
        });
        self
    }

    pub fn push(&mut self, edit: AnnotationEdit) {
        self.edits.push(edit);
    }

    /// Appends the edits of a later override for the same class.
    pub(crate) fn merge(&mut self, other: Self) {
        debug_assert_eq!(self.class, other.class);
        self.edits.extend(other.edits);
    }

    /// Replays every edit in order.
    pub fn apply(&self) -> TypeMetadata {
        let mut metadata = TypeMetadata::default();
        for edit in &self.edits {
            metadata.apply(edit);
        }
        metadata
    }
}

/// Effective annotations of a type after overrides are applied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeMetadata {
    annotations: BTreeMap<AnnotationTarget, Vec<Annotation>>,
}

impl TypeMetadata {
    fn apply(&mut self, edit: &AnnotationEdit) {
        match edit {
            AnnotationEdit::Add { target, annotation } => {
                let annotations = self.annotations.entry(target.clone()).or_default();
                match annotations.iter_mut().find(|v| v.name == annotation.name) {
                    Some(v) => *v = annotation.clone(),
                    None => annotations.push(annotation.clone()),
                }
            }
            AnnotationEdit::Remove { target, name } => {
                if let Some(annotations) = self.annotations.get_mut(target) {
                    annotations.retain(|v| v.name() != name);
                }
            }
            AnnotationEdit::RemoveAll { target } => {
                self.annotations.remove(target);
            }
        }
    }

    pub fn type_annotations(&self) -> &[Annotation] {
        self.annotations(&AnnotationTarget::Type)
    }

    pub fn member_annotations(&self, member: &str) -> &[Annotation] {
        self.annotations(&AnnotationTarget::Member(member.to_string()))
    }

    pub fn annotations(&self, target: &AnnotationTarget) -> &[Annotation] {
        self.annotations
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_annotation(&self, target: &AnnotationTarget, name: &str) -> bool {
        self.annotations(target).iter().any(|v| v.name() == name)
    }
}

/// Nested builder that collects edits for one class.
///
/// Obtained from
/// [`ContainerBuilder::configure_annotated_type`](crate::ContainerBuilder::configure_annotated_type).
/// The edits only take effect when the owning builder is initialized;
/// dropping the builder discards them.
#[derive(Debug)]
pub struct AnnotatedTypeConfigurator {
    pending: AnnotatedTypeOverride,
}

impl AnnotatedTypeConfigurator {
    pub(crate) fn new(class: ClassRef) -> Self {
        Self {
            pending: AnnotatedTypeOverride::new(class),
        }
    }

    pub fn class(&self) -> &ClassRef {
        self.pending.class()
    }

    pub fn add(&mut self, annotation: Annotation) -> &mut Self {
        self.edit(AnnotationEdit::Add {
            target: AnnotationTarget::Type,
            annotation,
        })
    }

    pub fn remove(&mut self, name: impl Into<String>) -> &mut Self {
        self.edit(AnnotationEdit::Remove {
            target: AnnotationTarget::Type,
            name: name.into(),
        })
    }

    pub fn remove_all(&mut self) -> &mut Self {
        self.edit(AnnotationEdit::RemoveAll {
            target: AnnotationTarget::Type,
        })
    }

    pub fn add_to_member(&mut self, member: impl Into<String>, annotation: Annotation) -> &mut Self {
        self.edit(AnnotationEdit::Add {
            target: AnnotationTarget::Member(member.into()),
            annotation,
        })
    }

    pub fn remove_from_member(
        &mut self,
        member: impl Into<String>,
        name: impl Into<String>,
    ) -> &mut Self {
        self.edit(AnnotationEdit::Remove {
            target: AnnotationTarget::Member(member.into()),
            name: name.into(),
        })
    }

    pub fn edit(&mut self, edit: AnnotationEdit) -> &mut Self {
        self.pending.push(edit);
        self
    }

    pub(crate) fn finish(self) -> AnnotatedTypeOverride {
        self.pending
    }
}

impl From<AnnotatedTypeOverride> for AnnotatedTypeConfigurator {
    fn from(value: AnnotatedTypeOverride) -> Self {
        Self { pending: value }
    }
}
