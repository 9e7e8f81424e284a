use std::collections::VecDeque;

use crate::scroll::ScrollPosition;

/// Work scheduled for the next UI pass, after the current layout has been applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Deferred {
    ScrollToItem {
        index: usize,
        position: ScrollPosition,
        animated: bool,
    },
}

/// FIFO of deferred work. Nothing is ever cancelled: every queued task runs once.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    tasks: VecDeque<Deferred>,
}

impl DeferredQueue {
    pub fn push(&mut self, task: Deferred) {
        self.tasks.push_back(task);
    }

    pub fn take(&mut self) -> Vec<Deferred> {
        self.tasks.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_drains_in_order() {
        let mut queue = DeferredQueue::default();
        for index in [3, 1] {
            queue.push(Deferred::ScrollToItem {
                index,
                position: ScrollPosition::CenteredBoth,
                animated: true,
            });
        }
        assert_eq!(queue.len(), 2);

        let indices: Vec<usize> = queue
            .take()
            .into_iter()
            .map(|Deferred::ScrollToItem { index, .. }| index)
            .collect();
        assert_eq!(indices, vec![3, 1]);
        assert!(queue.is_empty());
    }
}
