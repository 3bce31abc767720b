use crate::{
    green::{GreenNode, GreenToken, NodeFlags},
    NodeOrToken, RawSyntaxKind, TextSize,
};

/// A child of a [`GreenNode`]: either a node or a token.
pub type GreenElement = NodeOrToken<GreenNode, GreenToken>;

/// A borrowed [`GreenElement`].
pub type GreenElementRef<'a> = NodeOrToken<&'a GreenNode, &'a GreenToken>;

impl From<GreenNode> for GreenElement {
    #[inline]
    fn from(node: GreenNode) -> GreenElement {
        NodeOrToken::Node(node)
    }
}

impl From<GreenToken> for GreenElement {
    #[inline]
    fn from(token: GreenToken) -> GreenElement {
        NodeOrToken::Token(token)
    }
}

impl<'a> From<&'a GreenNode> for GreenElementRef<'a> {
    #[inline]
    fn from(node: &'a GreenNode) -> GreenElementRef<'a> {
        NodeOrToken::Node(node)
    }
}

impl<'a> From<&'a GreenToken> for GreenElementRef<'a> {
    #[inline]
    fn from(token: &'a GreenToken) -> GreenElementRef<'a> {
        NodeOrToken::Token(token)
    }
}

impl GreenElement {
    /// Returns kind of this element.
    #[inline]
    pub fn kind(&self) -> RawSyntaxKind {
        self.as_ref().kind()
    }

    /// Returns the length of the text covered by this element, including trivia.
    #[inline]
    pub fn full_width(&self) -> TextSize {
        self.as_ref().full_width()
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.as_ref().flags()
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.as_ref().is_missing()
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        self.as_ref().is_list()
    }
}

impl GreenElementRef<'_> {
    /// Returns kind of this element.
    #[inline]
    pub fn kind(&self) -> RawSyntaxKind {
        match self {
            NodeOrToken::Node(node) => node.kind(),
            NodeOrToken::Token(token) => token.kind(),
        }
    }

    /// Returns the length of the text covered by this element, including trivia.
    #[inline]
    pub fn full_width(&self) -> TextSize {
        match self {
            NodeOrToken::Node(node) => node.full_width(),
            NodeOrToken::Token(token) => token.full_width(),
        }
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        match self {
            NodeOrToken::Node(node) => node.flags(),
            NodeOrToken::Token(token) => token.flags(),
        }
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.flags().contains(NodeFlags::IS_MISSING)
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        self.flags().contains(NodeFlags::IS_LIST)
    }

    /// Whether both elements are the same allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &GreenElementRef<'_>) -> bool {
        match (self, other) {
            (NodeOrToken::Node(a), NodeOrToken::Node(b)) => a.ptr_eq(b),
            (NodeOrToken::Token(a), NodeOrToken::Token(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}
