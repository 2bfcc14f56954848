//! Argument lists
//!
//! [`TexArgs`] keeps two synchronized views of a command's arguments: the
//! parsed argument groups alone, and the same groups interleaved with the raw
//! whitespace that separated them in source. The second view is what gets
//! written back out, so inter-argument spacing survives a round trip.

use crate::core::token::Token;

use super::NodeId;

/// One entry of the source-ordered argument view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgSlot {
    /// A parsed argument group
    Arg(NodeId),
    /// Whitespace between arguments
    Raw(Token),
}

impl ArgSlot {
    pub fn arg(&self) -> Option<NodeId> {
        match self {
            ArgSlot::Arg(id) => Some(*id),
            ArgSlot::Raw(_) => None,
        }
    }
}

/// Arguments attached to a command or environment.
///
/// `all` always contains every id of `parsed`, in the same relative order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TexArgs {
    parsed: Vec<NodeId>,
    all: Vec<ArgSlot>,
}

impl TexArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.parsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsed.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.parsed.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.parsed.iter().copied()
    }

    /// The parsed arguments only.
    pub fn parsed(&self) -> &[NodeId] {
        &self.parsed
    }

    /// Arguments and separating whitespace, in source order.
    pub fn all(&self) -> &[ArgSlot] {
        &self.all
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.parsed.contains(&id)
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.parsed.iter().position(|&a| a == id)
    }

    /// Append an argument after everything else.
    pub fn push(&mut self, id: NodeId) {
        self.parsed.push(id);
        self.all.push(ArgSlot::Arg(id));
    }

    /// Append separating whitespace.
    pub fn push_raw(&mut self, token: Token) {
        if !token.is_empty() {
            self.all.push(ArgSlot::Raw(token));
        }
    }

    /// Insert an argument so it becomes `parsed[index]`.
    ///
    /// The new argument is placed directly before the argument it displaces,
    /// after any whitespace that preceded that argument.
    pub fn insert(&mut self, index: usize, id: NodeId) {
        let index = index.min(self.parsed.len());
        let slot = match self.parsed.get(index) {
            Some(&next) => self.slot_of(next).unwrap_or(self.all.len()),
            None => self.all.len(),
        };
        self.parsed.insert(index, id);
        self.all.insert(slot, ArgSlot::Arg(id));
    }

    /// Remove an argument by identity, along with the whitespace before it.
    ///
    /// Returns false if `id` is not one of the arguments.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.parsed.remove(index);
        if let Some(slot) = self.slot_of(id) {
            self.all.remove(slot);
            if slot > 0 && matches!(self.all[slot - 1], ArgSlot::Raw(_)) {
                self.all.remove(slot - 1);
            }
        }
        true
    }

    /// Remove and return the argument at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<NodeId> {
        let id = self.get(index)?;
        self.remove(id);
        Some(id)
    }

    /// Remove and return the last argument.
    pub fn pop(&mut self) -> Option<NodeId> {
        self.remove_at(self.parsed.len().checked_sub(1)?)
    }

    /// Replace one argument id with another in both views.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> bool {
        let Some(index) = self.index_of(old) else {
            return false;
        };
        self.parsed[index] = new;
        if let Some(slot) = self.slot_of(old) {
            self.all[slot] = ArgSlot::Arg(new);
        }
        true
    }

    /// Rewrite every id, e.g. after copying nodes between arenas.
    pub(crate) fn remap(&mut self, mut f: impl FnMut(NodeId) -> NodeId) {
        for id in &mut self.parsed {
            *id = f(*id);
        }
        for slot in &mut self.all {
            if let ArgSlot::Arg(id) = slot {
                *id = f(*id);
            }
        }
    }

    fn slot_of(&self, id: NodeId) -> Option<usize> {
        self.all.iter().position(|s| s.arg() == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::token::TokenCode;

    fn id(i: usize) -> NodeId {
        NodeId::new(i)
    }

    fn space() -> Token {
        Token::new(" ", 0, TokenCode::Spacer)
    }

    /// `all` holds every parsed id, in order.
    fn assert_consistent(args: &TexArgs) {
        let in_all: Vec<NodeId> = args.all().iter().filter_map(ArgSlot::arg).collect();
        assert_eq!(in_all, args.parsed());
        assert!(args.all().len() >= args.len());
    }

    #[test]
    fn test_push_and_raw() {
        let mut args = TexArgs::new();
        args.push(id(1));
        args.push_raw(space());
        args.push(id(2));
        assert_eq!(args.len(), 2);
        assert_eq!(args.all().len(), 3);
        assert_consistent(&args);
    }

    #[test]
    fn test_empty_raw_is_ignored() {
        let mut args = TexArgs::new();
        args.push_raw(Token::new("", 0, TokenCode::Spacer));
        assert!(args.all().is_empty());
    }

    #[test]
    fn test_remove_drops_preceding_whitespace() {
        let mut args = TexArgs::new();
        args.push(id(1));
        args.push_raw(space());
        args.push(id(2));
        assert!(args.remove(id(2)));
        assert_eq!(args.all(), &[ArgSlot::Arg(id(1))]);
        assert!(!args.remove(id(2)));
        assert_consistent(&args);
    }

    #[test]
    fn test_remove_is_by_identity() {
        let mut args = TexArgs::new();
        args.push(id(4));
        args.push(id(5));
        args.remove(id(5));
        assert_eq!(args.parsed(), &[id(4)]);
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut args = TexArgs::new();
        args.push_raw(space());
        args.push(id(1));
        args.push(id(3));
        args.insert(1, id(2));
        args.insert(0, id(0));
        args.insert(99, id(4));
        assert_eq!(args.parsed(), &[id(0), id(1), id(2), id(3), id(4)]);
        assert_eq!(args.all()[0], ArgSlot::Raw(space()));
        assert_consistent(&args);
    }

    #[test]
    fn test_pop_and_remove_at() {
        let mut args = TexArgs::new();
        args.push(id(1));
        args.push(id(2));
        assert_eq!(args.pop(), Some(id(2)));
        assert_eq!(args.remove_at(5), None);
        assert_eq!(args.remove_at(0), Some(id(1)));
        assert_eq!(args.pop(), None);
        assert_consistent(&args);
    }

    #[test]
    fn test_mixed_sequence_stays_consistent() {
        let mut args = TexArgs::new();
        for i in 0..6 {
            args.push_raw(space());
            args.push(id(i));
        }
        args.remove(id(3));
        args.insert(2, id(10));
        args.pop();
        args.replace(id(0), id(11));
        assert_eq!(args.parsed(), &[id(11), id(1), id(10), id(2), id(4)]);
        assert_consistent(&args);
    }
}
