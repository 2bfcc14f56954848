//! Expression tree
//!
//! Parsed documents live in a [`TexTree`], an arena of nodes addressed by
//! [`NodeId`]. Each node records its parent as a plain index, so a child can
//! find its container without the tree holding reference cycles. Writing a
//! tree back out reproduces the parsed source exactly: every delimiter and
//! every whitespace run is kept somewhere in the tree.
//!
//! Nodes that are detached by a mutation stay in the arena until the tree is
//! dropped; they are simply no longer reachable from the root.

pub mod args;
pub mod mutate;

use std::fmt;

use fxhash::FxHashMap;

use crate::core::node::{Attr, FindAll, TexNode};
use crate::core::reader::{ParseOptions, Parser};
use crate::core::token::Token;
use crate::data::constants::ROOT_NAME;
use crate::utils::error::{ParseWarning, TexError, TexResult};
use crate::utils::position::{LineIndex, Location};

pub use args::{ArgSlot, TexArgs};
pub use mutate::{Child, TexNodeMut};

/// Index of a node inside its [`TexTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[cfg(test)]
    pub(crate) fn new(index: usize) -> Self {
        NodeId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Delimiters of an argument or body-level group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// `{...}`
    Brace,
    /// `[...]`
    Bracket,
    /// A required argument given as a single token, e.g. the `1` in `\frac12`
    Implicit,
}

impl GroupKind {
    pub fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            GroupKind::Brace => ("{", "}"),
            GroupKind::Bracket => ("[", "]"),
            GroupKind::Implicit => ("", ""),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GroupKind::Brace | GroupKind::Implicit => "BraceGroup",
            GroupKind::Bracket => "BracketGroup",
        }
    }

    /// Whether the group counts as a required argument.
    pub fn is_required(self) -> bool {
        !matches!(self, GroupKind::Bracket)
    }
}

/// The flavour of an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvKind {
    /// The synthetic environment wrapping a whole document
    Root,
    /// `\begin{name}...\end{name}`
    Named,
    /// `$...$`
    InlineMath,
    /// `$$...$$`
    DisplayMath,
    /// `\(...\)`
    ParenMath,
    /// `\[...\]`
    BracketMath,
}

impl EnvKind {
    pub fn is_math(self) -> bool {
        !matches!(self, EnvKind::Root | EnvKind::Named)
    }

    /// Name and delimiters of the symmetric math forms.
    pub fn math_delimiters(self) -> Option<(&'static str, &'static str, &'static str)> {
        match self {
            EnvKind::InlineMath => Some(("$", "$", "$")),
            EnvKind::DisplayMath => Some(("$$", "$$", "$$")),
            EnvKind::ParenMath => Some(("math", r"\(", r"\)")),
            EnvKind::BracketMath => Some(("displaymath", r"\[", r"\]")),
            EnvKind::Root | EnvKind::Named => None,
        }
    }
}

/// A parsed expression.
#[derive(Debug, Clone)]
pub enum Expr {
    Command {
        /// Name without the escape, e.g. `section*` or `,`
        name: String,
        args: TexArgs,
        /// Trailing body, only populated for `\item`
        extra: Vec<NodeId>,
    },
    Environment {
        name: String,
        kind: EnvKind,
        /// Exact opening text, e.g. `\begin{itemize}` or `$`
        begin: String,
        /// Exact closing text; empty while an environment is left unclosed
        end: String,
        args: TexArgs,
        contents: Vec<NodeId>,
    },
    Group {
        kind: GroupKind,
        contents: Vec<NodeId>,
    },
    Text(Token),
}

impl Expr {
    /// A named environment with canonical delimiters.
    pub fn environment(name: impl Into<String>) -> Expr {
        let name = name.into();
        Expr::Environment {
            begin: format!("\\begin{{{}}}", name),
            end: format!("\\end{{{}}}", name),
            name,
            kind: EnvKind::Named,
            args: TexArgs::new(),
            contents: Vec::new(),
        }
    }

    pub fn command(name: impl Into<String>) -> Expr {
        Expr::Command {
            name: name.into(),
            args: TexArgs::new(),
            extra: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Expr::Command { name, .. } | Expr::Environment { name, .. } => name,
            Expr::Group { kind, .. } => kind.name(),
            Expr::Text(_) => "text",
        }
    }

    pub fn args(&self) -> Option<&TexArgs> {
        match self {
            Expr::Command { args, .. } | Expr::Environment { args, .. } => Some(args),
            _ => None,
        }
    }

    pub(crate) fn args_mut(&mut self) -> Option<&mut TexArgs> {
        match self {
            Expr::Command { args, .. } | Expr::Environment { args, .. } => Some(args),
            _ => None,
        }
    }

    /// Body nodes: environment contents, item body or group contents.
    pub fn contents(&self) -> &[NodeId] {
        match self {
            Expr::Command { extra, .. } => extra,
            Expr::Environment { contents, .. } | Expr::Group { contents, .. } => contents,
            Expr::Text(_) => &[],
        }
    }

    pub(crate) fn contents_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            Expr::Command { extra, .. } => Some(extra),
            Expr::Environment { contents, .. } | Expr::Group { contents, .. } => Some(contents),
            Expr::Text(_) => None,
        }
    }

    /// Every directly owned node: arguments first, then body.
    pub fn child_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.args()
            .into_iter()
            .flat_map(TexArgs::iter)
            .chain(self.contents().iter().copied())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Expr::Text(_))
    }

    pub(crate) fn remap(&mut self, mut f: impl FnMut(NodeId) -> NodeId) {
        if let Some(args) = self.args_mut() {
            args.remap(&mut f);
        }
        if let Some(contents) = self.contents_mut() {
            for id in contents.iter_mut() {
                *id = f(*id);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) expr: Expr,
    pub(crate) parent: Option<NodeId>,
    /// Byte offset in the parsed source; `None` for nodes built from fragments
    pub(crate) position: Option<usize>,
}

/// A parsed document.
#[derive(Debug, Clone)]
pub struct TexTree {
    nodes: Vec<Node>,
    root: NodeId,
    lines: LineIndex,
    warnings: Vec<ParseWarning>,
    options: ParseOptions,
}

impl TexTree {
    /// An empty tree whose root is allocated when parsing finishes.
    pub(crate) fn empty(source: &str, options: &ParseOptions) -> Self {
        Self {
            nodes: Vec::new(),
            root: NodeId(0),
            lines: LineIndex::new(source),
            warnings: Vec::new(),
            options: options.clone(),
        }
    }

    /// Allocate a node and adopt every node it references.
    pub(crate) fn alloc(&mut self, expr: Expr, position: Option<usize>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let children: Vec<NodeId> = expr.child_ids().collect();
        self.nodes.push(Node {
            expr,
            parent: None,
            position,
        });
        for child in children {
            self.nodes[child.0].parent = Some(id);
        }
        id
    }

    /// Wrap `contents` in the root environment.
    pub(crate) fn finish(&mut self, contents: Vec<NodeId>) {
        let root = Expr::Environment {
            name: ROOT_NAME.to_string(),
            kind: EnvKind::Root,
            begin: String::new(),
            end: String::new(),
            args: TexArgs::new(),
            contents,
        };
        self.root = self.alloc(root, Some(0));
    }

    pub(crate) fn push_warning(&mut self, warning: ParseWarning) {
        self.warnings.push(warning);
    }

    pub(crate) fn truncate_warnings(&mut self, len: usize) {
        self.warnings.truncate(len);
    }

    /// Number of nodes in the arena, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub(crate) fn check(&self, id: NodeId) -> TexResult<NodeId> {
        if id.0 < self.nodes.len() {
            Ok(id)
        } else {
            Err(TexError::UnknownNode { id: id.0 })
        }
    }

    pub(crate) fn expr(&self, id: NodeId) -> &Expr {
        &self.nodes[id.0].expr
    }

    pub fn root(&self) -> TexNode<'_> {
        TexNode::new(self, self.root)
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Read-only view of a node; `None` if the id belongs to another tree.
    pub fn node(&self, id: NodeId) -> Option<TexNode<'_>> {
        self.check(id).ok().map(|id| TexNode::new(self, id))
    }

    /// Mutable view of a node; `None` if the id belongs to another tree.
    pub fn node_mut(&mut self, id: NodeId) -> Option<TexNodeMut<'_>> {
        self.check(id).ok()?;
        Some(TexNodeMut::new(self, id))
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Problems that lenient parsing recovered from.
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn find(&self, name: &str, attrs: &[Attr<'_>]) -> Option<TexNode<'_>> {
        self.root().find(name, attrs)
    }

    pub fn find_all<'t>(&'t self, name: &'t str, attrs: &'t [Attr<'t>]) -> FindAll<'t> {
        self.root().find_all(name, attrs)
    }

    pub fn count(&self, name: &str, attrs: &[Attr<'_>]) -> usize {
        self.root().count(name, attrs)
    }

    /// Text leaves of the whole document, in document order.
    pub fn text(&self) -> Vec<&str> {
        self.root().text_leaves()
    }

    /// 0-indexed `(line, column)` of a byte offset in the parsed source.
    pub fn char_offset_to_line_col(&self, offset: usize) -> (usize, usize) {
        self.lines.char_offset_to_line_col(offset)
    }

    pub fn locate(&self, offset: usize) -> Location {
        self.lines.locate(offset)
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub(crate) fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.nodes[node.0].parent;
        }
        false
    }

    /// Deep-copy a subtree; the copy starts out detached.
    pub fn clone_subtree(&mut self, id: NodeId) -> TexResult<NodeId> {
        self.check(id)?;
        Ok(self.copy_within(id))
    }

    fn copy_within(&mut self, id: NodeId) -> NodeId {
        let Node {
            mut expr, position, ..
        } = self.nodes[id.0].clone();
        let children: Vec<NodeId> = expr.child_ids().collect();
        let mut map = FxHashMap::default();
        for child in children {
            let copy = self.copy_within(child);
            map.insert(child, copy);
        }
        expr.remap(|old| map.get(&old).copied().unwrap_or(old));
        self.alloc(expr, position)
    }

    /// Copy a subtree of another tree into this one, dropping positions.
    pub(crate) fn graft(&mut self, source: &TexTree, id: NodeId) -> NodeId {
        let mut expr = source.expr(id).clone();
        let children: Vec<NodeId> = expr.child_ids().collect();
        let mut map = FxHashMap::default();
        for child in children {
            let copy = self.graft(source, child);
            map.insert(child, copy);
        }
        expr.remap(|old| map.get(&old).copied().unwrap_or(old));
        self.alloc(expr, None)
    }

    /// Parse `source` with this tree's options and add its top-level nodes
    /// to the arena, detached.
    pub fn new_fragment(&mut self, source: &str) -> TexResult<Vec<NodeId>> {
        let fragment = Parser::parse(source, &self.options)?;
        let tops: Vec<NodeId> = fragment.root().expr().contents().to_vec();
        Ok(tops
            .into_iter()
            .map(|id| self.graft(&fragment, id))
            .collect())
    }

    /// Parse `source` as a single `{...}` or `[...]` argument.
    pub(crate) fn new_argument(&mut self, source: &str) -> TexResult<NodeId> {
        let fragment = Parser::parse_argument(source, &self.options)?;
        let top = fragment
            .root()
            .expr()
            .contents()
            .first()
            .copied()
            .ok_or_else(|| TexError::malformed(source))?;
        Ok(self.graft(&fragment, top))
    }

    /// Append the exact source text of a node to `out`.
    pub(crate) fn write_node(&self, id: NodeId, out: &mut String) {
        match self.expr(id) {
            Expr::Command { name, args, extra } => {
                out.push('\\');
                out.push_str(name);
                self.write_args(args, out);
                for &child in extra {
                    self.write_node(child, out);
                }
            }
            Expr::Environment {
                begin,
                end,
                args,
                contents,
                ..
            } => {
                out.push_str(begin);
                self.write_args(args, out);
                for &child in contents {
                    self.write_node(child, out);
                }
                out.push_str(end);
            }
            Expr::Group { kind, contents } => {
                let (open, close) = kind.delimiters();
                out.push_str(open);
                for &child in contents {
                    self.write_node(child, out);
                }
                out.push_str(close);
            }
            Expr::Text(token) => out.push_str(token.text()),
        }
    }

    fn write_args(&self, args: &TexArgs, out: &mut String) {
        for slot in args.all() {
            match slot {
                ArgSlot::Arg(id) => self.write_node(*id, out),
                ArgSlot::Raw(token) => out.push_str(token.text()),
            }
        }
    }

    /// Source text of a node.
    pub(crate) fn node_source(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Source text of a node's body, without its own delimiters.
    pub(crate) fn inner_source(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.expr(id).contents() {
            self.write_node(child, &mut out);
        }
        out
    }
}

impl fmt::Display for TexTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node_source(self.root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::token::TokenCode;
    use crate::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_alloc_sets_parents() {
        let mut tree = TexTree::empty("", &ParseOptions::default());
        let text = tree.alloc(Expr::Text(Token::new("x", 0, TokenCode::Text)), Some(0));
        let group = tree.alloc(
            Expr::Group {
                kind: GroupKind::Brace,
                contents: vec![text],
            },
            Some(0),
        );
        tree.finish(vec![group]);
        assert_eq!(tree.get(text).parent, Some(group));
        assert_eq!(tree.get(group).parent, Some(tree.root_id()));
        assert_eq!(tree.to_string(), "{x}");
    }

    #[test]
    fn test_environment_constructor() {
        let env = Expr::environment("center");
        assert_eq!(env.name(), "center");
        match env {
            Expr::Environment { begin, end, .. } => {
                assert_eq!(begin, r"\begin{center}");
                assert_eq!(end, r"\end{center}");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_math_delimiters() {
        assert_eq!(EnvKind::ParenMath.math_delimiters(), Some(("math", r"\(", r"\)")));
        assert!(EnvKind::DisplayMath.is_math());
        assert!(!EnvKind::Named.is_math());
    }

    #[test]
    fn test_clone_subtree_is_detached_copy() {
        let mut tree = parse(r"\textbf{a \emph{b}}").unwrap();
        let bold = tree.find("textbf", &[]).map(|n| n.id()).unwrap();
        let copy = tree.clone_subtree(bold).unwrap();
        assert_ne!(copy, bold);
        assert_eq!(tree.node_source(copy), r"\textbf{a \emph{b}}");
        assert_eq!(tree.get(copy).parent, None);
        assert!(!tree.is_ancestor_or_self(bold, copy));
    }

    #[test]
    fn test_new_fragment_nodes_have_no_position() {
        let mut tree = parse("x").unwrap();
        let ids = tree.new_fragment(r"\a{b} c").unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(tree.node_source(ids[0]), r"\a{b}");
        assert_eq!(tree.node_source(ids[1]), " c");
        assert_eq!(tree.get(ids[0]).position, None);
    }

    #[test]
    fn test_unknown_node() {
        let tree = parse("x").unwrap();
        assert!(tree.node(NodeId::new(999)).is_none());
        assert_eq!(
            tree.check(NodeId::new(999)),
            Err(TexError::UnknownNode { id: 999 })
        );
    }

    #[test]
    fn test_inner_source() {
        let tree = parse(r"\begin{center}hi\end{center}").unwrap();
        let env = tree.find("center", &[]).map(|n| n.id()).unwrap();
        assert_eq!(tree.inner_source(env), "hi");
    }
}
