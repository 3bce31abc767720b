//! Opaque values that can be attached to value nodes and tokens.

use std::{
    any::Any,
    fmt,
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

static NEXT_ANNOTATION_ID: AtomicU64 = AtomicU64::new(1);

/// A marker that survives tree rewrites.
///
/// Two annotations are equal only if one is a clone of the other, regardless of their kind or data.
#[derive(Clone)]
pub struct SyntaxAnnotation {
    inner: Arc<AnnotationData>,
}

struct AnnotationData {
    id:   u64,
    kind: Option<Box<str>>,
    data: Option<Box<str>>,
}

impl SyntaxAnnotation {
    /// Creates a fresh annotation without kind or data.
    pub fn new() -> Self {
        Self::from_parts(None, None)
    }

    /// Creates a fresh annotation of the given `kind`.
    pub fn with_kind(kind: &str) -> Self {
        Self::from_parts(Some(kind.into()), None)
    }

    /// Creates a fresh annotation of the given `kind` that carries `data`.
    pub fn with_data(kind: &str, data: &str) -> Self {
        Self::from_parts(Some(kind.into()), Some(data.into()))
    }

    fn from_parts(kind: Option<Box<str>>, data: Option<Box<str>>) -> Self {
        let id = NEXT_ANNOTATION_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            inner: Arc::new(AnnotationData { id, kind, data }),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[inline]
    pub fn kind(&self) -> Option<&str> {
        self.inner.kind.as_deref()
    }

    #[inline]
    pub fn data(&self) -> Option<&str> {
        self.inner.data.as_deref()
    }
}

impl Default for SyntaxAnnotation {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for SyntaxAnnotation {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for SyntaxAnnotation {}

impl Hash for SyntaxAnnotation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for SyntaxAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxAnnotation")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("data", &self.data())
            .finish()
    }
}

/// A diagnostic attached to a value node or token.
///
/// The tree stores and propagates diagnostics but never looks inside them. Equality is by identity.
#[derive(Clone)]
pub struct Diagnostic {
    inner: Arc<dyn Any + Send + Sync>,
}

impl Diagnostic {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self { inner: Arc::new(value) }
    }

    /// Returns the attached value if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Diagnostic {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Diagnostic {}

impl fmt::Debug for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Diagnostic(..)")
    }
}
