//! Slab-backed doubly-linked recency list.
//!
//! 使用下标链接代替指针，空闲槽位通过 free list 复用。
//! 头部 (front) 为最久未访问 (LRU)，尾部 (back) 为最近访问 (MRU)。

/// 链表节点下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SlotId(usize);

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

#[derive(Debug)]
pub(crate) struct RecencyList<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
}

impl<T> RecencyList<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// 追加到尾部 (MRU)，返回槽位下标
    pub(crate) fn push_back(&mut self, value: T) -> SlotId {
        let node = Node {
            value,
            prev: self.tail,
            next: None,
        };
        let id = match self.free.pop() {
            Some(i) => {
                self.slots[i] = Some(node);
                SlotId(i)
            }
            None => {
                self.slots.push(Some(node));
                SlotId(self.slots.len() - 1)
            }
        };

        match self.tail {
            Some(old_tail) => {
                if let Some(n) = self.node_mut(old_tail) {
                    n.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
        id
    }

    /// 移除并返回头部 (LRU) 的值
    pub(crate) fn pop_front(&mut self) -> Option<T> {
        let head = self.head?;
        self.remove(head)
    }

    /// 按下标摘除节点
    pub(crate) fn remove(&mut self, id: SlotId) -> Option<T> {
        let node = self.slots.get_mut(id.0)?.take()?;
        self.link(node.prev, node.next);
        self.free.push(id.0);
        self.len -= 1;
        Some(node.value)
    }

    /// 移动到尾部 (MRU)
    pub(crate) fn move_to_back(&mut self, id: SlotId) {
        if self.tail == Some(id) {
            return;
        }
        let (prev, next) = match self.node(id) {
            Some(n) => (n.prev, n.next),
            None => return,
        };
        self.link(prev, next);

        let old_tail = self.tail;
        if let Some(t) = old_tail.and_then(|t| self.node_mut(t)) {
            t.next = Some(id);
        }
        if let Some(n) = self.node_mut(id) {
            n.prev = old_tail;
            n.next = None;
        }
        if self.head.is_none() {
            self.head = Some(id);
        }
        self.tail = Some(id);
    }

    pub(crate) fn get(&self, id: SlotId) -> Option<&T> {
        self.node(id).map(|n| &n.value)
    }

    pub(crate) fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.node_mut(id).map(|n| &mut n.value)
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// 从 LRU 到 MRU 遍历
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            current: self.head,
        }
    }

    /// 将 `prev` 与 `next` 互相链接，跳过二者之间的节点
    fn link(&mut self, prev: Option<SlotId>, next: Option<SlotId>) {
        match prev {
            Some(p) => {
                if let Some(n) = self.node_mut(p) {
                    n.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(nx) => {
                if let Some(n) = self.node_mut(nx) {
                    n.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    #[inline]
    fn node(&self, id: SlotId) -> Option<&Node<T>> {
        self.slots.get(id.0).and_then(|s| s.as_ref())
    }

    #[inline]
    fn node_mut(&mut self, id: SlotId) -> Option<&mut Node<T>> {
        self.slots.get_mut(id.0).and_then(|s| s.as_mut())
    }
}

pub(crate) struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    current: Option<SlotId>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node(self.current?)?;
        self.current = node.next;
        Some(&node.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(list: &RecencyList<u32>) -> Vec<u32> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_push_and_pop_order() {
        let mut list = RecencyList::with_capacity(4);
        list.push_back(1);
        list.push_back(2);
        list.push_back(3);
        assert_eq!(collect(&list), vec![1, 2, 3]);
        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(collect(&list), vec![2, 3]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_move_to_back_from_head_and_middle() {
        let mut list = RecencyList::with_capacity(4);
        let a = list.push_back(1);
        let b = list.push_back(2);
        list.push_back(3);

        list.move_to_back(a);
        assert_eq!(collect(&list), vec![2, 3, 1]);

        list.move_to_back(b);
        assert_eq!(collect(&list), vec![3, 1, 2]);

        // 已在尾部，不变
        list.move_to_back(b);
        assert_eq!(collect(&list), vec![3, 1, 2]);
    }

    #[test]
    fn test_remove_reuses_slot() {
        let mut list = RecencyList::with_capacity(2);
        let a = list.push_back(1);
        list.push_back(2);
        assert_eq!(list.remove(a), Some(1));
        assert_eq!(list.remove(a), None);

        let c = list.push_back(3);
        assert_eq!(c, a);
        assert_eq!(collect(&list), vec![2, 3]);
    }

    #[test]
    fn test_remove_only_element_empties_list() {
        let mut list = RecencyList::with_capacity(1);
        let a = list.push_back(7);
        list.remove(a);
        assert_eq!(list.len(), 0);
        assert_eq!(list.pop_front(), None);
        list.push_back(8);
        assert_eq!(collect(&list), vec![8]);
    }
}
