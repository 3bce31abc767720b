//! Green tree iterators.

use std::{iter::FusedIterator, slice};

use super::{GreenElement, GreenElementRef};
use crate::NodeOrToken;

type Slots<'a> = slice::Iter<'a, Option<GreenElement>>;

/// An iterator over a [`GreenNode`](crate::GreenNode)'s children, with list slots flattened.
#[derive(Debug, Clone)]
pub struct GreenNodeChildren<'a> {
    slots:     Slots<'a>,
    front:     Slots<'a>,
    back:      Slots<'a>,
    remaining: usize,
}

impl<'a> GreenNodeChildren<'a> {
    pub(super) fn new(slots: &'a [Option<GreenElement>], len: usize) -> Self {
        let empty: &'a [Option<GreenElement>] = &[];
        Self {
            slots:     slots.iter(),
            front:     empty.iter(),
            back:      empty.iter(),
            remaining: len,
        }
    }
}

/// The elements of a list slot, or `None` if the slot holds a single element.
#[inline]
fn list_elements(element: &GreenElement) -> Option<Slots<'_>> {
    match element {
        NodeOrToken::Node(node) if node.is_list() => Some(node.data.slots.iter()),
        _ => None,
    }
}

// NB: forward everything stable that iter::Slice specializes as of Rust 1.39.0
impl ExactSizeIterator for GreenNodeChildren<'_> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<'a> Iterator for GreenNodeChildren<'a> {
    type Item = GreenElementRef<'a>;

    #[inline]
    fn next(&mut self) -> Option<GreenElementRef<'a>> {
        loop {
            if let Some(element) = self.front.by_ref().flatten().next() {
                self.remaining -= 1;
                return Some(element.as_ref());
            }
            match self.slots.next() {
                Some(Some(element)) => match list_elements(element) {
                    Some(elements) => self.front = elements,
                    None => {
                        self.remaining -= 1;
                        return Some(element.as_ref());
                    }
                },
                Some(None) => continue,
                None => {
                    let element = self.back.by_ref().flatten().next()?;
                    self.remaining -= 1;
                    return Some(element.as_ref());
                }
            }
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }

    #[inline]
    fn count(self) -> usize
    where
        Self: Sized,
    {
        self.remaining
    }

    #[inline]
    fn last(mut self) -> Option<Self::Item>
    where
        Self: Sized,
    {
        self.next_back()
    }
}

impl<'a> DoubleEndedIterator for GreenNodeChildren<'a> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(element) = self.back.by_ref().rev().flatten().next() {
                self.remaining -= 1;
                return Some(element.as_ref());
            }
            match self.slots.next_back() {
                Some(Some(element)) => match list_elements(element) {
                    Some(elements) => self.back = elements,
                    None => {
                        self.remaining -= 1;
                        return Some(element.as_ref());
                    }
                },
                Some(None) => continue,
                None => {
                    let element = self.front.by_ref().rev().flatten().next()?;
                    self.remaining -= 1;
                    return Some(element.as_ref());
                }
            }
        }
    }
}

impl FusedIterator for GreenNodeChildren<'_> {}
