use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// A persistent singly linked list whose nodes are shared between clones.
/// Pushing onto a clone never affects the original, but mutating an element
/// through one list is visible through every list that shares the node.
pub struct SharedList<T> {
    head: Link<T>,
}

type Link<T> = Option<Rc<RefCell<Node<T>>>>;

struct Node<T> {
    elem: T,
    next: Link<T>,
}

impl<T> Node<T> {
    fn new(elem: T, next: Link<T>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Node { elem, next }))
    }
}

impl<T> Clone for SharedList<T> {
    fn clone(&self) -> SharedList<T> {
        SharedList {
            head: self.head.clone(),
        }
    }
}

impl<T> SharedList<T> {
    pub fn new() -> Self {
        SharedList { head: None }
    }

    pub fn push(&mut self, elem: T) {
        self.head = Some(Node::new(elem, self.head.take()));
    }

    pub fn peek(&self) -> Option<Ref<T>> {
        self.head
            .as_ref()
            .map(|node| Ref::map(node.borrow(), |node| &node.elem))
    }

    pub fn peek_mut(&mut self) -> Option<RefMut<T>> {
        self.head
            .as_ref()
            .map(|node| RefMut::map(node.borrow_mut(), |node| &mut node.elem))
    }

    pub fn pop(&mut self) {
        if let Some(old_head) = self.head.take() {
            self.head = old_head.borrow().next.clone();
        }
    }

    pub fn tail(&self) -> SharedList<T> {
        SharedList {
            head: self
                .head
                .as_ref()
                .and_then(|old_head| old_head.borrow().next.clone()),
        }
    }

    pub fn empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut link = self.head.clone();
        while let Some(node) = link {
            count += 1;
            link = node.borrow().next.clone();
        }
        count
    }

    /// Walks from the head towards the tail and returns the first `Some`
    /// produced by `f`.
    pub fn find_map<R>(&self, mut f: impl FnMut(&T) -> Option<R>) -> Option<R> {
        let mut link = self.head.clone();
        while let Some(node) = link {
            if let Some(found) = f(&node.borrow().elem) {
                return Some(found);
            }
            link = node.borrow().next.clone();
        }
        None
    }

    /// Like `find_map`, with mutable access to each element in turn.
    pub fn find_map_mut<R>(&mut self, mut f: impl FnMut(&mut T) -> Option<R>) -> Option<R> {
        let mut link = self.head.clone();
        while let Some(node) = link {
            if let Some(found) = f(&mut node.borrow_mut().elem) {
                return Some(found);
            }
            link = node.borrow().next.clone();
        }
        None
    }

    pub fn equals(&self, other: &SharedList<T>) -> bool {
        match (&self.head, &other.head) {
            (None, None) => true,
            (Some(l), Some(r)) => Rc::ptr_eq(l, r),
            _ => false,
        }
    }
}

impl<T> Drop for SharedList<T> {
    // Unlink iteratively so long chains don't overflow the stack on drop.
    fn drop(&mut self) {
        let mut link = self.head.take();
        while let Some(node) = link {
            match Rc::try_unwrap(node) {
                Ok(node) => link = node.into_inner().next,
                Err(_) => break,
            }
        }
    }
}
