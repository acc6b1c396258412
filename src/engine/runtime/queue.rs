//! ### English
//! FIFO of deferred callables run on the render thread.
//!
//! ### 中文
//! 在渲染线程上运行的延迟可调用对象 FIFO 队列。

use std::collections::VecDeque;

/// ### English
/// A deferred unit of work for the render thread.
///
/// ### 中文
/// 交给渲染线程执行的延迟工作单元。
pub(crate) type Callable = Box<dyn FnOnce() + Send + 'static>;

/// ### English
/// Callable queue guarded by the arbiter monitor (so no atomics here).
///
/// Once closed it rejects new work; anything still queued is dropped unrun.
///
/// ### 中文
/// 受仲裁器监视器保护的可调用对象队列（因此这里不需要原子操作）。
///
/// 关闭后拒绝新工作；仍在队列中的工作会被直接丢弃而不执行。
#[derive(Default)]
pub(crate) struct CallableQueue {
    queue: VecDeque<Callable>,
    closed: bool,
}

impl CallableQueue {
    /// ### English
    /// Appends `callable`; returns `false` if the queue is closed.
    ///
    /// ### 中文
    /// 追加 `callable`；若队列已关闭则返回 `false`。
    pub(crate) fn try_push(&mut self, callable: Callable) -> bool {
        if self.closed {
            return false;
        }
        self.queue.push_back(callable);
        true
    }

    pub(crate) fn pop(&mut self) -> Option<Callable> {
        self.queue.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    /// ### English
    /// Closes the queue and drops pending callables. Returns how many were dropped.
    ///
    /// ### 中文
    /// 关闭队列并丢弃待执行的可调用对象。返回被丢弃的数量。
    pub(crate) fn close(&mut self) -> usize {
        self.closed = true;
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn pops_in_submission_order_and_rejects_after_close() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut queue = CallableQueue::default();
        for i in 0..3 {
            let log = log.clone();
            assert!(queue.try_push(Box::new(move || log.lock().unwrap().push(i))));
        }
        assert_eq!(queue.len(), 3);

        queue.pop().unwrap()();
        queue.pop().unwrap()();
        assert_eq!(*log.lock().unwrap(), vec![0, 1]);

        assert_eq!(queue.close(), 1);
        assert!(!queue.try_push(Box::new(|| {})));
        assert!(queue.pop().is_none());
    }
}
