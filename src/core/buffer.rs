//! Seekable cursor over a lazy stream
//!
//! [`Buffer`] pulls elements from an iterator on demand and caches every
//! element it has seen, so the reader can move backward after a failed attempt
//! (for example when a would-be argument turns out to be absent). The cache
//! lives as long as the buffer does.

use crate::utils::error::{TexError, TexResult};

use super::token::Token;

/// A position-tracked, bidirectionally seekable view over an iterator.
#[derive(Debug)]
pub struct Buffer<I: Iterator> {
    iter: I,
    queue: Vec<I::Item>,
    index: usize,
}

impl<I: Iterator> Buffer<I> {
    pub fn new(iter: I) -> Self {
        Self {
            iter,
            queue: Vec::new(),
            index: 0,
        }
    }

    /// Number of elements consumed so far.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Pull from the iterator until `queue[i]` exists; false if it never will.
    fn fill(&mut self, i: usize) -> bool {
        while self.queue.len() <= i {
            match self.iter.next() {
                Some(item) => self.queue.push(item),
                None => return false,
            }
        }
        true
    }

    pub fn has_next(&mut self) -> bool {
        self.fill(self.index)
    }

    /// The next element, without consuming it.
    pub fn peek(&mut self) -> Option<&I::Item> {
        self.peek_at(0)
    }

    /// The element `offset` steps from the cursor; negative offsets look behind.
    pub fn peek_at(&mut self, offset: isize) -> Option<&I::Item> {
        let i = self.index.checked_add_signed(offset)?;
        if self.fill(i) {
            self.queue.get(i)
        } else {
            None
        }
    }

    /// Elements in `[cursor + start, cursor + end)`, truncated at the end of input.
    ///
    /// Returns `None` when the range starts before the beginning or past the end.
    pub fn peek_range(&mut self, start: isize, end: isize) -> Option<&[I::Item]> {
        let lo = self.index.checked_add_signed(start)?;
        let hi = self.index.checked_add_signed(end)?.max(lo);
        if !self.fill(lo) {
            return None;
        }
        self.fill(hi.saturating_sub(1));
        let hi = hi.min(self.queue.len());
        Some(&self.queue[lo..hi])
    }

    /// Consume up to `n` elements and return them.
    pub fn forward(&mut self, n: usize) -> &[I::Item] {
        let start = self.index;
        if n > 0 {
            self.fill(start + n - 1);
        }
        self.index = (start + n).min(self.queue.len());
        &self.queue[start..self.index]
    }

    /// Un-consume `n` elements and return them.
    pub fn backward(&mut self, n: usize) -> TexResult<&[I::Item]> {
        if n > self.index {
            return Err(TexError::Backtrack {
                requested: n,
                position: self.index,
            });
        }
        self.index -= n;
        Ok(&self.queue[self.index..self.index + n])
    }

    /// Move the cursor back to an earlier position.
    pub fn rewind_to(&mut self, position: usize) -> TexResult<()> {
        let n = self.index.saturating_sub(position);
        self.backward(n).map(|_| ())
    }

    /// Consume elements until `condition` holds for the next one.
    ///
    /// The matching element is not consumed and the condition never sees it
    /// as part of the returned run.
    pub fn forward_until<F>(&mut self, mut condition: F) -> &[I::Item]
    where
        F: FnMut(&I::Item) -> bool,
    {
        let start = self.index;
        while self.fill(self.index) && !condition(&self.queue[self.index]) {
            self.index += 1;
        }
        &self.queue[start..self.index]
    }

    /// How many elements `forward_until` would consume, without consuming them.
    pub fn num_forward_until<F>(&mut self, mut condition: F) -> usize
    where
        F: FnMut(&I::Item) -> bool,
    {
        let mut i = self.index;
        while self.fill(i) && !condition(&self.queue[i]) {
            i += 1;
        }
        i - self.index
    }

    /// Drop every cached element at or after the cursor and hand out the
    /// underlying iterator so it can be repositioned.
    pub fn discard_lookahead(&mut self) -> &mut I {
        self.queue.truncate(self.index);
        &mut self.iter
    }
}

impl<I> Buffer<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    /// Whether the text from the cursor onward begins with `s`.
    pub fn startswith(&mut self, s: &str) -> bool {
        let mut text = String::new();
        let mut i = self.index;
        while text.len() < s.len() && self.fill(i) {
            text.push_str(self.queue[i].as_ref());
            i += 1;
        }
        text.starts_with(s)
    }

    /// Whether the text consumed so far ends with `s`.
    pub fn endswith(&mut self, s: &str) -> bool {
        let mut text = String::new();
        let mut i = self.index;
        while text.len() < s.len() && i > 0 {
            i -= 1;
            text.insert_str(0, self.queue[i].as_ref());
        }
        text.ends_with(s)
    }
}

impl<C: Copy, I: Iterator<Item = Token<C>>> Buffer<I> {
    /// Split the next token at byte index `at` into two cached tokens.
    ///
    /// Returns false (leaving the buffer untouched) if there is no next token
    /// or `at` does not fall strictly inside it.
    pub fn split_next(&mut self, at: usize) -> bool {
        if !self.fill(self.index) {
            return false;
        }
        match self.queue[self.index].split_at(at) {
            Some((head, tail)) => {
                self.queue[self.index] = head;
                self.queue.insert(self.index + 1, tail);
                true
            }
            None => false,
        }
    }

    /// Merge the next `n` cached tokens into one token with `code`.
    ///
    /// Returns false (leaving the buffer untouched) if fewer than two tokens
    /// would be merged or the stream ends first.
    pub fn join_next(&mut self, n: usize, code: C) -> bool {
        if n < 2 || !self.fill(self.index + n - 1) {
            return false;
        }
        let range = self.index..self.index + n;
        let position = self.queue[self.index].position();
        let merged = Token::join(&self.queue[range.clone()], position, code);
        self.queue.splice(range, std::iter::once(merged));
        true
    }
}

impl<I> Iterator for Buffer<I>
where
    I: Iterator,
    I::Item: Clone,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if !self.fill(self.index) {
            return None;
        }
        self.index += 1;
        Some(self.queue[self.index - 1].clone())
    }
}
