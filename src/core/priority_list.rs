//! Pipeline-stage ordering
//!
//! Higher priority values are served first; equal priorities keep their
//! insertion order.

/// Pipeline priority used when none is given
pub const DEFAULT_PIPELINE_PRIORITY: i32 = 1;

struct Slot<T> {
    priority: i32,
    item: T,
}

/// Stable priority-ordered collection
pub struct PriorityList<T> {
    slots: Vec<Slot<T>>,
}

impl<T> PriorityList<T> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Insert `item`, placing it after every item with a priority >= its own
    pub fn insert(&mut self, item: T, priority: i32) {
        // slots stay sorted by priority desc, then insertion order
        let idx = self.slots.partition_point(|slot| slot.priority >= priority);
        self.slots.insert(idx, Slot { priority, item });
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Items in serving order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().map(|slot| &slot.item)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().map(|slot| &mut slot.item)
    }

    /// Items paired with their pipeline priority, in serving order
    pub fn entries(&self) -> impl Iterator<Item = (i32, &T)> {
        self.slots.iter().map(|slot| (slot.priority, &slot.item))
    }
}

impl<T> Default for PriorityList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(T, i32)> for PriorityList<T> {
    fn from_iter<I: IntoIterator<Item = (T, i32)>>(iter: I) -> Self {
        let mut list = PriorityList::new();
        for (item, priority) in iter {
            list.insert(item, priority);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_higher_priority_first() {
        let list: PriorityList<&str> = [("low", 1), ("high", 10), ("mid", 5)]
            .into_iter()
            .collect();
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut list = PriorityList::new();
        list.insert("a", 1);
        list.insert("b", 3);
        list.insert("c", 1);
        list.insert("d", 3);
        list.insert("e", 1);

        assert_eq!(
            list.iter().copied().collect::<Vec<_>>(),
            vec!["b", "d", "a", "c", "e"]
        );
        assert_eq!(list.entries().next(), Some((3, &"b")));
    }
}
