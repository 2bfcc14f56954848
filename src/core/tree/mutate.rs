//! Tree mutation
//!
//! Every edit goes through a [`TexNodeMut`]. Edits touch only the node list
//! or argument list they target, so the rest of the document keeps its exact
//! source text.
//!
//! New content is given as [`Child`] values: either LaTeX source, which is
//! parsed as a fragment with the tree's own options, or an existing node,
//! which is moved (detached from wherever it was first).

use crate::core::node::TexNode;
use crate::data::constants::{BEGIN_KEYWORD, END_KEYWORD, ITEM_KEYWORD};
use crate::utils::error::{TexError, TexResult};

use super::{EnvKind, Expr, GroupKind, NodeId, TexTree};

/// Content to attach to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    /// LaTeX source, parsed on insertion
    Source(String),
    /// A node of the same tree, moved on insertion
    Node(NodeId),
}

impl From<&str> for Child {
    fn from(source: &str) -> Self {
        Child::Source(source.to_string())
    }
}

impl From<String> for Child {
    fn from(source: String) -> Self {
        Child::Source(source)
    }
}

impl From<NodeId> for Child {
    fn from(id: NodeId) -> Self {
        Child::Node(id)
    }
}

/// Where a node sits inside its parent.
enum Slot {
    /// Index into the parent's body
    Content(usize),
    /// One of the parent's arguments
    Arg,
}

impl TexTree {
    fn slot_of(&self, id: NodeId) -> TexResult<(NodeId, Slot)> {
        let parent = self.get(id).parent.ok_or(TexError::Detached)?;
        let expr = self.expr(parent);
        if let Some(index) = expr.contents().iter().position(|&c| c == id) {
            return Ok((parent, Slot::Content(index)));
        }
        if expr.args().is_some_and(|args| args.contains(id)) {
            return Ok((parent, Slot::Arg));
        }
        Err(TexError::Detached)
    }

    /// Remove a node from its parent, keeping it in the arena.
    pub(crate) fn detach(&mut self, id: NodeId) -> TexResult<()> {
        let (parent, slot) = self.slot_of(id)?;
        let expr = &mut self.get_mut(parent).expr;
        match slot {
            Slot::Content(index) => {
                if let Some(contents) = expr.contents_mut() {
                    contents.remove(index);
                }
            }
            Slot::Arg => {
                if let Some(args) = expr.args_mut() {
                    args.remove(id);
                }
            }
        }
        self.get_mut(id).parent = None;
        Ok(())
    }

    /// Fail if attaching any of `children` below `target` would form a cycle.
    fn check_moves(&self, children: &[Child], target: NodeId) -> TexResult<()> {
        for child in children {
            if let Child::Node(id) = child {
                self.check(*id)?;
                if self.is_ancestor_or_self(*id, target) {
                    return Err(TexError::CyclicMove);
                }
            }
        }
        Ok(())
    }

    /// Turn children into detached node ids.
    fn resolve(&mut self, children: Vec<Child>) -> TexResult<Vec<NodeId>> {
        let mut ids = Vec::new();
        for child in children {
            match child {
                Child::Source(source) => ids.extend(self.new_fragment(&source)?),
                Child::Node(id) => {
                    if self.get(id).parent.is_some() {
                        self.detach(id)?;
                    }
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
        }
        Ok(ids)
    }

    /// Turn an argument into a detached group node.
    fn resolve_arg(&mut self, arg: Child, target: NodeId) -> TexResult<NodeId> {
        match arg {
            Child::Source(source) => self.new_argument(&source),
            Child::Node(id) => {
                self.check_moves(&[Child::Node(id)], target)?;
                if !matches!(self.expr(id), Expr::Group { .. }) {
                    return Err(TexError::malformed(self.node_source(id)));
                }
                if self.get(id).parent.is_some() {
                    self.detach(id)?;
                }
                Ok(id)
            }
        }
    }

    fn adopt(&mut self, parent: NodeId, ids: &[NodeId]) {
        for &id in ids {
            self.get_mut(id).parent = Some(parent);
        }
    }
}

/// Display name of a node in capability errors.
fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Command { name, .. } => format!("\\{}", name),
        other => other.name().to_string(),
    }
}

/// A mutable handle on one node.
pub struct TexNodeMut<'a> {
    tree: &'a mut TexTree,
    id: NodeId,
}

impl<'a> TexNodeMut<'a> {
    pub(crate) fn new(tree: &'a mut TexTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Read-only view of the same node.
    pub fn as_node(&self) -> TexNode<'_> {
        TexNode::new(self.tree, self.id)
    }

    /// Only environments, `\item` commands and groups hold content.
    fn require_content(&self) -> TexResult<()> {
        match self.tree.expr(self.id) {
            Expr::Environment { .. } | Expr::Group { .. } => Ok(()),
            Expr::Command { name, .. } if name == ITEM_KEYWORD => Ok(()),
            other => Err(TexError::capability(describe(other))),
        }
    }

    fn require_args(&self) -> TexResult<()> {
        match self.tree.expr(self.id) {
            Expr::Command { .. } | Expr::Environment { .. } => Ok(()),
            other => Err(TexError::capability(describe(other))),
        }
    }

    /// Add children at the end of the body.
    pub fn append<I, C>(&mut self, children: I) -> TexResult<Vec<NodeId>>
    where
        I: IntoIterator<Item = C>,
        C: Into<Child>,
    {
        self.insert(usize::MAX, children)
    }

    /// Add children to the body so the first one lands at `index`.
    ///
    /// An index past the end appends.
    pub fn insert<I, C>(&mut self, index: usize, children: I) -> TexResult<Vec<NodeId>>
    where
        I: IntoIterator<Item = C>,
        C: Into<Child>,
    {
        self.require_content()?;
        let children: Vec<Child> = children.into_iter().map(Into::into).collect();
        self.tree.check_moves(&children, self.id)?;
        let ids = self.tree.resolve(children)?;

        if let Some(contents) = self.tree.get_mut(self.id).expr.contents_mut() {
            let index = index.min(contents.len());
            contents.splice(index..index, ids.iter().copied());
        }
        self.tree.adopt(self.id, &ids);
        Ok(ids)
    }

    /// Remove this node from its parent.
    pub fn delete(self) -> TexResult<()> {
        self.tree.detach(self.id)
    }

    /// Put zero or more children where this node is, then detach it.
    pub fn replace_with<I, C>(self, children: I) -> TexResult<Vec<NodeId>>
    where
        I: IntoIterator<Item = C>,
        C: Into<Child>,
    {
        self.tree.slot_of(self.id)?;
        let children: Vec<Child> = children.into_iter().map(Into::into).collect();
        self.tree.check_moves(&children, self.id)?;
        let ids = self.tree.resolve(children)?;

        // Resolving may have moved siblings, so look the slot up again.
        let (parent, slot) = self.tree.slot_of(self.id)?;
        match slot {
            Slot::Content(index) => {
                if let Some(contents) = self.tree.get_mut(parent).expr.contents_mut() {
                    contents.splice(index..=index, ids.iter().copied());
                }
            }
            Slot::Arg => {
                if let Some(id) = ids
                    .iter()
                    .find(|&&id| !matches!(self.tree.expr(id), Expr::Group { .. }))
                {
                    return Err(TexError::malformed(self.tree.node_source(*id)));
                }
                if let Some(args) = self.tree.get_mut(parent).expr.args_mut() {
                    match ids.split_first() {
                        Some((&first, rest)) => {
                            let index = args.index_of(self.id).unwrap_or(args.len());
                            args.replace(self.id, first);
                            for (offset, &id) in rest.iter().enumerate() {
                                args.insert(index + 1 + offset, id);
                            }
                        }
                        None => {
                            args.remove(self.id);
                        }
                    }
                }
            }
        }
        self.tree.adopt(parent, &ids);
        self.tree.get_mut(self.id).parent = None;
        Ok(ids)
    }

    /// Add an argument after the existing ones.
    pub fn append_arg(&mut self, arg: impl Into<Child>) -> TexResult<NodeId> {
        self.insert_arg(usize::MAX, arg)
    }

    /// Insert an argument so it becomes argument number `index`.
    ///
    /// Source text must be exactly one `{...}` or `[...]` group.
    pub fn insert_arg(&mut self, index: usize, arg: impl Into<Child>) -> TexResult<NodeId> {
        self.require_args()?;
        let id = self.tree.resolve_arg(arg.into(), self.id)?;
        if let Some(args) = self.tree.get_mut(self.id).expr.args_mut() {
            args.insert(index, id);
        }
        self.tree.adopt(self.id, &[id]);
        Ok(id)
    }

    /// Remove an argument by identity; returns false if it is not one.
    pub fn remove_arg(&mut self, arg: NodeId) -> TexResult<bool> {
        self.require_args()?;
        let removed = self
            .tree
            .get_mut(self.id)
            .expr
            .args_mut()
            .is_some_and(|args| args.remove(arg));
        if removed {
            self.tree.get_mut(arg).parent = None;
        }
        Ok(removed)
    }

    /// Rename a command or named environment.
    ///
    /// Environment delimiters are regenerated in canonical form.
    pub fn set_name(&mut self, name: &str) -> TexResult<()> {
        let name = name.strip_prefix('\\').unwrap_or(name);
        match &mut self.tree.get_mut(self.id).expr {
            Expr::Command { name: current, .. } => {
                *current = name.to_string();
                Ok(())
            }
            Expr::Environment {
                name: current,
                kind: EnvKind::Named,
                begin,
                end,
                ..
            } => {
                *current = name.to_string();
                *begin = format!("\\{}{{{}}}", BEGIN_KEYWORD, name);
                *end = format!("\\{}{{{}}}", END_KEYWORD, name);
                Ok(())
            }
            other => Err(TexError::capability(describe(other))),
        }
    }

    /// Turn an argument group into `{...}` or `[...]` form.
    pub fn set_group_kind(&mut self, kind: GroupKind) -> TexResult<()> {
        match &mut self.tree.get_mut(self.id).expr {
            Expr::Group { kind: current, .. } => {
                *current = kind;
                Ok(())
            }
            other => Err(TexError::capability(describe(other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::ArgSlot;
    use crate::parse;
    use pretty_assertions::assert_eq;

    fn id_of(tree: &TexTree, name: &str) -> NodeId {
        tree.find(name, &[]).map(|n| n.id()).unwrap()
    }

    #[test]
    fn test_delete_command_between_siblings() {
        let mut tree = parse(r"\textit{X}\textbf{Y}\textit{Z}").unwrap();
        let bold = id_of(&tree, "textbf");
        tree.node_mut(bold).unwrap().delete().unwrap();
        assert_eq!(tree.to_string(), r"\textit{X}\textit{Z}");
        assert!(tree.node(bold).unwrap().parent().is_none());
    }

    #[test]
    fn test_delete_inside_argument() {
        let mut tree = parse(r"\section{A \emph{B} C}").unwrap();
        let emph = id_of(&tree, "emph");
        tree.node_mut(emph).unwrap().delete().unwrap();
        assert_eq!(tree.to_string(), r"\section{A  C}");
    }

    #[test]
    fn test_delete_detached_fails() {
        let mut tree = parse("x").unwrap();
        let root = tree.root_id();
        let err = tree.node_mut(root).unwrap().delete().unwrap_err();
        assert_eq!(err, TexError::Detached);
    }

    #[test]
    fn test_append_to_environment() {
        let src = "\\begin{itemize}\n\\item a\n\\end{itemize}";
        let mut tree = parse(src).unwrap();
        let list = id_of(&tree, "itemize");
        tree.node_mut(list).unwrap().append(["\\item b\n"]).unwrap();
        assert_eq!(
            tree.to_string(),
            "\\begin{itemize}\n\\item a\n\\item b\n\\end{itemize}"
        );
        assert_eq!(tree.count("item", &[]), 2);
    }

    #[test]
    fn test_insert_into_item() {
        let mut tree = parse(r"\begin{itemize}\item a\end{itemize}").unwrap();
        let item = id_of(&tree, "item");
        tree.node_mut(item).unwrap().insert(0, [" new"]).unwrap();
        assert_eq!(tree.to_string(), r"\begin{itemize}\item new a\end{itemize}");
    }

    #[test]
    fn test_plain_command_rejects_content() {
        let mut tree = parse(r"\textbf{x}").unwrap();
        let bold = id_of(&tree, "textbf");
        let err = tree.node_mut(bold).unwrap().append(["y"]).unwrap_err();
        assert_eq!(err, TexError::capability(r"\textbf"));
        assert_eq!(tree.to_string(), r"\textbf{x}");
    }

    #[test]
    fn test_replace_with_many() {
        let mut tree = parse(r"a \b c").unwrap();
        let b = id_of(&tree, "b");
        let ids = tree
            .node_mut(b)
            .unwrap()
            .replace_with([r"\x", r"\y"])
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(tree.to_string(), r"a \x\y c");
    }

    #[test]
    fn test_replace_with_nothing() {
        let mut tree = parse(r"a\b c").unwrap();
        let b = id_of(&tree, "b");
        tree.node_mut(b).unwrap().replace_with(Vec::<Child>::new()).unwrap();
        assert_eq!(tree.to_string(), "a c");
    }

    #[test]
    fn test_move_node() {
        let mut tree = parse(r"\begin{a}\begin{b}\end{b}\end{a}\x").unwrap();
        let x = id_of(&tree, "x");
        let b = id_of(&tree, "b");
        tree.node_mut(b).unwrap().append([x]).unwrap();
        assert_eq!(tree.to_string(), r"\begin{a}\begin{b}\x\end{b}\end{a}");
        assert_eq!(tree.node(x).unwrap().parent().map(|p| p.id()), Some(b));
    }

    #[test]
    fn test_cyclic_move_rejected() {
        let mut tree = parse(r"\begin{a}\begin{b}\end{b}\end{a}").unwrap();
        let a = id_of(&tree, "a");
        let b = id_of(&tree, "b");
        let err = tree.node_mut(b).unwrap().append([a]).unwrap_err();
        assert_eq!(err, TexError::CyclicMove);
        assert_eq!(tree.to_string(), r"\begin{a}\begin{b}\end{b}\end{a}");
    }

    #[test]
    fn test_argument_mutation_keeps_both_views() {
        let mut tree = parse(r"\cmd{a} {b}").unwrap();
        let cmd = id_of(&tree, "cmd");
        let new = tree.node_mut(cmd).unwrap().insert_arg(1, "[opt]").unwrap();
        assert_eq!(tree.to_string(), r"\cmd{a} [opt]{b}");

        let second = tree.node(cmd).unwrap().arg(2).map(|a| a.id()).unwrap();
        assert!(tree.node_mut(cmd).unwrap().remove_arg(second).unwrap());
        assert_eq!(tree.to_string(), r"\cmd{a} [opt]");

        let args = tree.expr(cmd).args().unwrap();
        let in_all: Vec<NodeId> = args.all().iter().filter_map(ArgSlot::arg).collect();
        assert_eq!(in_all, args.parsed());
        assert_eq!(args.get(1), Some(new));
    }

    #[test]
    fn test_malformed_argument() {
        let mut tree = parse(r"\cmd{a}").unwrap();
        let cmd = id_of(&tree, "cmd");
        let err = tree.node_mut(cmd).unwrap().append_arg("{b]").unwrap_err();
        assert_eq!(err, TexError::malformed("{b]"));
        let text = tree.new_fragment("plain").unwrap()[0];
        let err = tree.node_mut(cmd).unwrap().append_arg(text).unwrap_err();
        assert!(matches!(err, TexError::MalformedArgument { .. }));
    }

    #[test]
    fn test_set_name() {
        let mut tree = parse(r"\begin {itemize}\item x\end{itemize}\textbf{y}").unwrap();
        let list = id_of(&tree, "itemize");
        tree.node_mut(list).unwrap().set_name("enumerate").unwrap();
        let bold = id_of(&tree, "textbf");
        tree.node_mut(bold).unwrap().set_name(r"\emph").unwrap();
        assert_eq!(
            tree.to_string(),
            r"\begin{enumerate}\item x\end{enumerate}\emph{y}"
        );
    }

    #[test]
    fn test_set_group_kind() {
        let mut tree = parse(r"\cmd{a}").unwrap();
        let group = tree.find("cmd", &[]).and_then(|n| n.arg(0)).map(|a| a.id()).unwrap();
        tree.node_mut(group).unwrap().set_group_kind(GroupKind::Bracket).unwrap();
        assert_eq!(tree.to_string(), r"\cmd[a]");
    }
}
