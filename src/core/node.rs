//! Read-only navigation and search
//!
//! [`TexNode`] is a cheap `Copy` view of one node of a [`TexTree`]. It does not
//! own anything; it borrows the tree for as long as it lives.
//!
//! ## Example
//!
//! ```rust
//! use texloom::{parse, Attr};
//!
//! let tree = parse(r"\section{Intro}\label{sec:intro} see \ref{sec:intro}").unwrap();
//! assert_eq!(tree.count("ref", &[]), 1);
//! let label = tree.find("label", &[Attr::Arg("sec:intro")]).unwrap();
//! assert_eq!(label.string().as_deref(), Some("sec:intro"));
//! ```

use std::fmt;

use crate::core::tree::{EnvKind, Expr, GroupKind, NodeId, TexTree};
use crate::utils::position::Location;

/// What kind of expression a node holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Command,
    Environment(EnvKind),
    Group(GroupKind),
    Text,
}

/// Extra conditions for [`TexNode::find`] and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attr<'s> {
    /// The node's [`string`](TexNode::string) equals this text
    String(&'s str),
    /// Some argument's contents equal this text
    Arg(&'s str),
    /// The node has exactly this many arguments
    ArgCount(usize),
}

/// A borrowed view of a node.
#[derive(Clone, Copy)]
pub struct TexNode<'a> {
    tree: &'a TexTree,
    id: NodeId,
}

impl<'a> TexNode<'a> {
    pub(crate) fn new(tree: &'a TexTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a TexTree {
        self.tree
    }

    pub fn expr(&self) -> &'a Expr {
        self.tree.expr(self.id)
    }

    fn wrap(&self, id: NodeId) -> TexNode<'a> {
        TexNode::new(self.tree, id)
    }

    /// Command or environment name; groups are `BraceGroup`/`BracketGroup`
    /// and text leaves are `text`.
    pub fn name(&self) -> &'a str {
        self.expr().name()
    }

    pub fn kind(&self) -> NodeKind {
        match self.expr() {
            Expr::Command { .. } => NodeKind::Command,
            Expr::Environment { kind, .. } => NodeKind::Environment(*kind),
            Expr::Group { kind, .. } => NodeKind::Group(*kind),
            Expr::Text(_) => NodeKind::Text,
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind() == NodeKind::Text
    }

    /// Argument groups, in order.
    pub fn args(&self) -> impl Iterator<Item = TexNode<'a>> + 'a {
        let tree = self.tree;
        self.expr()
            .args()
            .into_iter()
            .flat_map(|args| args.parsed().iter())
            .map(move |&id| TexNode::new(tree, id))
    }

    pub fn arg(&self, index: usize) -> Option<TexNode<'a>> {
        let id = self.expr().args()?.get(index)?;
        Some(self.wrap(id))
    }

    pub fn arg_count(&self) -> usize {
        self.expr().args().map_or(0, |args| args.len())
    }

    /// Text of a text leaf.
    pub fn text(&self) -> Option<&'a str> {
        match self.expr() {
            Expr::Text(token) => Some(token.text()),
            _ => None,
        }
    }

    /// Plain-text value of the node.
    ///
    /// The contents of the only argument of a single-argument command, the
    /// body of an environment or group holding a single text leaf, or the
    /// text of a text leaf.
    pub fn string(&self) -> Option<String> {
        match self.expr() {
            Expr::Text(token) => Some(token.text().to_string()),
            Expr::Command { args, .. } if args.len() == 1 => {
                args.get(0).map(|arg| self.tree.inner_source(arg))
            }
            Expr::Command { .. } => None,
            Expr::Environment { contents, .. } | Expr::Group { contents, .. } => {
                match contents.as_slice() {
                    [only] => self.wrap(*only).text().map(str::to_string),
                    _ => None,
                }
            }
        }
    }

    /// The body that follows an `\item`.
    pub fn extra(&self) -> impl Iterator<Item = TexNode<'a>> + 'a {
        let tree = self.tree;
        let extra: &'a [NodeId] = match self.expr() {
            Expr::Command { extra, .. } => extra,
            _ => &[],
        };
        extra.iter().map(move |&id| TexNode::new(tree, id))
    }

    pub fn parent(&self) -> Option<TexNode<'a>> {
        self.tree.get(self.id).parent.map(|id| self.wrap(id))
    }

    /// Everything the node contains, text included.
    ///
    /// For environments and groups this is the body. For commands it is
    /// the contents of every argument followed by the item body.
    pub fn contents(&self) -> impl Iterator<Item = TexNode<'a>> + 'a {
        let tree = self.tree;
        let ids: Vec<NodeId> = match self.expr() {
            Expr::Command { args, extra, .. } => args
                .iter()
                .flat_map(|arg| tree.expr(arg).contents().iter().copied())
                .chain(extra.iter().copied())
                .collect(),
            other => other.contents().to_vec(),
        };
        ids.into_iter().map(move |id| TexNode::new(tree, id))
    }

    /// [`contents`](Self::contents) without text leaves.
    pub fn children(&self) -> impl Iterator<Item = TexNode<'a>> + 'a {
        self.contents().filter(|node| !node.is_text())
    }

    /// Every node below this one, in document order.
    pub fn descendants(&self) -> Descendants<'a> {
        let mut stack: Vec<NodeId> = self.expr().child_ids().collect();
        stack.reverse();
        Descendants {
            tree: self.tree,
            stack,
        }
    }

    /// First descendant named `name` that satisfies every attribute.
    ///
    /// A name containing `{` or `[` is compared against the node's full
    /// source text instead, and a leading `\` is ignored.
    pub fn find(&self, name: &str, attrs: &[Attr<'_>]) -> Option<TexNode<'a>> {
        self.descendants().find(|node| node.matches(name, attrs))
    }

    /// Lazily yield every matching descendant in document order.
    pub fn find_all<'t>(&self, name: &'t str, attrs: &'t [Attr<'t>]) -> FindAll<'t>
    where
        'a: 't,
    {
        FindAll {
            inner: Descendants {
                tree: self.tree,
                stack: self.descendants().stack,
            },
            name,
            attrs,
        }
    }

    pub fn count(&self, name: &str, attrs: &[Attr<'_>]) -> usize {
        self.descendants()
            .filter(|node| node.matches(name, attrs))
            .count()
    }

    pub fn matches(&self, name: &str, attrs: &[Attr<'_>]) -> bool {
        if self.is_text() {
            return false;
        }
        let name_matches = if name.contains('{') || name.contains('[') {
            self.to_string() == name
        } else {
            let name = name.strip_prefix('\\').unwrap_or(name);
            name.is_empty() || self.name() == name
        };
        name_matches && attrs.iter().all(|attr| self.has_attr(attr))
    }

    fn has_attr(&self, attr: &Attr<'_>) -> bool {
        match *attr {
            Attr::String(value) => self.string().as_deref() == Some(value),
            Attr::Arg(value) => self
                .args()
                .any(|arg| self.tree.inner_source(arg.id) == value),
            Attr::ArgCount(n) => self.arg_count() == n,
        }
    }

    /// Byte offset in the parsed source; `None` for inserted nodes.
    pub fn position(&self) -> Option<usize> {
        self.tree.get(self.id).position
    }

    /// 0-indexed `(line, column)` of the node's first character.
    pub fn line_col(&self) -> Option<(usize, usize)> {
        self.position()
            .map(|offset| self.tree.char_offset_to_line_col(offset))
    }

    pub fn location(&self) -> Option<Location> {
        self.position().map(|offset| self.tree.locate(offset))
    }

    /// Text leaves at or below this node, in document order.
    pub(crate) fn text_leaves(&self) -> Vec<&'a str> {
        std::iter::once(*self)
            .chain(self.descendants())
            .filter_map(|node| node.text())
            .collect()
    }
}

impl fmt::Display for TexNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tree.node_source(self.id))
    }
}

impl fmt::Debug for TexNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TexNode({} {}: {:?})", self.id, self.name(), self.to_string())
    }
}

impl PartialEq for TexNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

/// Pre-order walk below a node: arguments before body.
pub struct Descendants<'a> {
    tree: &'a TexTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = TexNode<'a>;

    fn next(&mut self) -> Option<TexNode<'a>> {
        let id = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(self.tree.expr(id).child_ids());
        self.stack[start..].reverse();
        Some(TexNode::new(self.tree, id))
    }
}

/// Lazy search results; see [`TexNode::find_all`].
pub struct FindAll<'a> {
    inner: Descendants<'a>,
    name: &'a str,
    attrs: &'a [Attr<'a>],
}

impl<'a> Iterator for FindAll<'a> {
    type Item = TexNode<'a>;

    fn next(&mut self) -> Option<TexNode<'a>> {
        let (name, attrs) = (self.name, self.attrs);
        self.inner.find(|node| node.matches(name, attrs))
    }
}
