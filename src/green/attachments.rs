use crate::{
    annotation::{Diagnostic, SyntaxAnnotation},
    green::NodeFlags,
};

/// Annotations and diagnostics carried by a single value node or token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct Attachments {
    pub(super) annotations: Vec<SyntaxAnnotation>,
    pub(super) diagnostics: Vec<Diagnostic>,
}

impl Attachments {
    pub(super) fn flags(this: Option<&Self>) -> NodeFlags {
        let mut flags = NodeFlags::empty();
        if let Some(this) = this {
            flags.set(NodeFlags::CONTAINS_ANNOTATIONS, !this.annotations.is_empty());
            flags.set(NodeFlags::CONTAINS_DIAGNOSTICS, !this.diagnostics.is_empty());
        }
        flags
    }

    pub(super) fn annotations(this: Option<&Self>) -> &[SyntaxAnnotation] {
        this.map_or(&[], |this| &this.annotations)
    }

    pub(super) fn diagnostics(this: Option<&Self>) -> &[Diagnostic] {
        this.map_or(&[], |this| &this.diagnostics)
    }

    /// Adds every annotation in `added` that is not present yet.
    pub(super) fn with_annotations<I>(this: Option<&Self>, added: I) -> Option<Box<Self>>
    where
        I: IntoIterator<Item = SyntaxAnnotation>,
    {
        let mut next = this.cloned().unwrap_or_default();
        for annotation in added {
            if !next.annotations.contains(&annotation) {
                next.annotations.push(annotation);
            }
        }
        next.into_option()
    }

    pub(super) fn without_annotations(this: Option<&Self>, removed: &[SyntaxAnnotation]) -> Option<Box<Self>> {
        let mut next = this.cloned().unwrap_or_default();
        next.annotations.retain(|annotation| !removed.contains(annotation));
        next.into_option()
    }

    pub(super) fn with_diagnostics<I>(this: Option<&Self>, added: I) -> Option<Box<Self>>
    where
        I: IntoIterator<Item = Diagnostic>,
    {
        let mut next = this.cloned().unwrap_or_default();
        next.diagnostics.extend(added);
        next.into_option()
    }

    fn into_option(self) -> Option<Box<Self>> {
        if self.annotations.is_empty() && self.diagnostics.is_empty() {
            None
        } else {
            Some(Box::new(self))
        }
    }
}
