use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Mutex;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tracing::trace;

/// A FIFO with a fixed capacity that is safe to share between threads. Insertion never waits:
///  if the queue is full, the element is handed back to the caller. Removal is available both
///  as a non-blocking `try_pop` and as an async `pop` that waits for an element to arrive.
pub struct BoundedQueue<T> {
    capacity: usize,
    queue: Mutex<VecDeque<T>>,
    not_empty: Notify,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> BoundedQueue<T> {
        BoundedQueue {
            capacity,
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            not_empty: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }

    /// Appends `value` if there is room, returning it back as `Err` otherwise.
    pub fn try_push(&self, value: T) -> Result<(), T> {
        {
            let mut queue = self.queue.lock().unwrap();
            if queue.len() >= self.capacity {
                trace!("bounded queue is full at {} elements", self.capacity);
                return Err(value);
            }
            queue.push_back(value);
        }

        // one wakeup per element: a waiter that is woken and then cancelled passes its
        //  notification on to the next waiter
        self.not_empty.notify_one();
        Ok(())
    }

    pub fn try_pop(&self) -> Option<T> {
        self.queue.lock().unwrap().pop_front()
    }

    /// Waits until an element is available and removes it. Cancel safe: if the returned future
    ///  is dropped before completion, no element is lost.
    pub async fn pop(&self) -> T {
        loop {
            let notified = self.not_empty.notified();
            tokio::pin!(notified);
            if let Some(value) = self.try_pop_or_register(notified.as_mut()) {
                return value;
            }
            notified.await;
        }
    }

    /// Registers `notified` as a waiter and only then checks the queue. A push after the check
    ///  wakes this waiter directly rather than leaving a single stored permit that several
    ///  consumers would have to share.
    fn try_pop_or_register<'a>(&'a self, notified: Pin<&mut Notified<'a>>) -> Option<T> {
        notified.enable();
        self.try_pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::runtime::Builder;
    use tokio::time;

    #[rstest]
    #[case::empty(3, vec![], vec![])]
    #[case::partial(3, vec![1, 2], vec![])]
    #[case::full(3, vec![1, 2, 3], vec![])]
    #[case::overflow_1(3, vec![1, 2, 3, 4], vec![4])]
    #[case::overflow_2(2, vec![1, 2, 3, 4], vec![3, 4])]
    #[case::capacity_1(1, vec![5, 6], vec![6])]
    fn test_try_push_try_pop(#[case] capacity: usize, #[case] pushed: Vec<u32>, #[case] expected_rejected: Vec<u32>) {
        let queue = BoundedQueue::new(capacity);

        let mut rejected = Vec::new();
        for value in pushed.iter() {
            if let Err(v) = queue.try_push(*value) {
                rejected.push(v);
            }
        }
        assert_eq!(rejected, expected_rejected);
        assert!(queue.len() <= queue.capacity());

        let mut popped = Vec::new();
        while let Some(v) = queue.try_pop() {
            popped.push(v);
        }
        let expected_popped = pushed.into_iter()
            .filter(|v| !expected_rejected.contains(v))
            .collect::<Vec<_>>();
        assert_eq!(popped, expected_popped);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_waits_for_push() {
        let rt = Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build().unwrap();
        rt.block_on(async {
            let queue = Arc::new(BoundedQueue::new(2));

            let queue2 = queue.clone();
            let handle = tokio::spawn(async move {
                queue2.pop().await
            });

            time::sleep(Duration::from_millis(10)).await;
            assert!(!handle.is_finished());

            queue.try_push(17).unwrap();
            assert_eq!(handle.await.unwrap(), 17);
            assert!(queue.is_empty());
        });
    }

    #[test]
    fn test_two_waiters_registered_before_pushes_both_wake() {
        let rt = Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build().unwrap();
        rt.block_on(async {
            let queue = BoundedQueue::new(4);

            // both consumers find the queue empty before anything is pushed
            let a = queue.not_empty.notified();
            tokio::pin!(a);
            assert_eq!(queue.try_pop_or_register(a.as_mut()), None);
            let b = queue.not_empty.notified();
            tokio::pin!(b);
            assert_eq!(queue.try_pop_or_register(b.as_mut()), None);

            queue.try_push(1).unwrap();
            queue.try_push(2).unwrap();

            assert!(time::timeout(Duration::from_millis(200), a).await.is_ok());
            assert!(time::timeout(Duration::from_millis(200), b).await.is_ok());

            let mut popped = vec![queue.try_pop().unwrap(), queue.try_pop().unwrap()];
            popped.sort();
            assert_eq!(popped, vec![1, 2]);
            assert!(queue.is_empty());
        });
    }

    #[test]
    fn test_pop_cancelled_does_not_lose_element() {
        let rt = Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build().unwrap();
        rt.block_on(async {
            let queue = BoundedQueue::new(2);

            let result = time::timeout(Duration::from_millis(5), queue.pop()).await;
            assert!(result.is_err());

            queue.try_push(3).unwrap();
            assert_eq!(queue.pop().await, 3);
        });
    }

    #[test]
    fn test_many_waiters() {
        let rt = Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build().unwrap();
        rt.block_on(async {
            let queue = Arc::new(BoundedQueue::new(100));

            let mut handles = Vec::new();
            for _ in 0..10 {
                let queue = queue.clone();
                handles.push(tokio::spawn(async move { queue.pop().await }));
            }

            for i in 0..10 {
                queue.try_push(i).unwrap();
            }

            let mut received = Vec::new();
            for handle in handles {
                received.push(handle.await.unwrap());
            }
            received.sort();
            assert_eq!(received, (0..10).collect::<Vec<_>>());
        });
    }
}
