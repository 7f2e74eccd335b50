// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! One slot of a timing wheel.

use parking_lot::Mutex;
use std::sync::Weak;

use super::TimerTask;

/// Mutex-protected list of the tasks due at one wheel position.
#[derive(Default)]
pub(crate) struct TimerBucket {
    tasks: Mutex<Vec<Weak<TimerTask>>>,
}

impl TimerBucket {
    pub(crate) fn add_task(&self, task: Weak<TimerTask>) {
        self.tasks.lock().push(task);
    }

    /// Take every task out of the bucket. Critical section stays short; the
    /// caller processes the drained list without the bucket lock.
    pub(crate) fn drain(&self) -> Vec<Weak<TimerTask>> {
        std::mem::take(&mut *self.tasks.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn drain_empties_the_bucket() {
        let bucket = TimerBucket::default();
        let task = Arc::new(TimerTask::new(1, 10, false));
        bucket.add_task(Arc::downgrade(&task));
        bucket.add_task(Arc::downgrade(&task));

        assert_eq!(bucket.drain().len(), 2);
        assert!(bucket.drain().is_empty());
    }
}
