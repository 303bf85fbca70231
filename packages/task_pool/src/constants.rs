// A poisoned lock means a task or worker panicked while holding pool state. We cannot know
// whether the queue or a result cell is still consistent, so we refuse to continue.
pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned lock - continued execution \
    is not safe because the pool can no longer guarantee that every task runs exactly once";
