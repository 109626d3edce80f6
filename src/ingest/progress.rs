//! Progress reporting and cooperative cancellation for one ingestion call.

/// Totals announced before any group is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestBegin {
    /// Number of groups in this call.
    pub total_groups: usize,
    /// Sum of member counts across all groups.
    pub total_files: usize,
}

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestProgress {
    /// 1-based position of the current group.
    pub group_index: usize,
    /// Name of the current group.
    pub group_name: String,
    /// Number of groups in this call.
    pub total_groups: usize,
    /// Files registered so far across the whole call.
    pub processed_files: usize,
    /// Sum of member counts across all groups.
    pub total_files: usize,
}

type BeginFn<'a> = Box<dyn FnMut(&IngestBegin) + 'a>;
type ProgressFn<'a> = Box<dyn FnMut(&IngestProgress) + 'a>;
type AbortFn<'a> = Box<dyn Fn() -> bool + 'a>;

/// Caller hooks threaded through one ingestion call.
///
/// Every hook is optional. The abort predicate is polled before each group
/// and before each file; work already handed to the engine is never undone.
#[derive(Default)]
pub struct IngestContext<'a> {
    on_begin: Option<BeginFn<'a>>,
    on_progress: Option<ProgressFn<'a>>,
    is_aborted: Option<AbortFn<'a>>,
}

impl<'a> IngestContext<'a> {
    /// A context with no hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `f` once with the call totals.
    pub fn on_begin(mut self, f: impl FnMut(&IngestBegin) + 'a) -> Self {
        self.on_begin = Some(Box::new(f));
        self
    }

    /// Call `f` for every progress notification.
    pub fn on_progress(mut self, f: impl FnMut(&IngestProgress) + 'a) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    /// Poll `f` to learn whether the caller wants to stop.
    pub fn abort_when(mut self, f: impl Fn() -> bool + 'a) -> Self {
        self.is_aborted = Some(Box::new(f));
        self
    }

    /// Whether the caller asked to stop.
    pub fn is_aborted(&self) -> bool {
        self.is_aborted.as_ref().map(|f| f()).unwrap_or(false)
    }

    pub(crate) fn begin(&mut self, begin: &IngestBegin) {
        if let Some(f) = self.on_begin.as_mut() {
            f(begin);
        }
    }

    pub(crate) fn progress(&mut self, progress: &IngestProgress) {
        if let Some(f) = self.on_progress.as_mut() {
            f(progress);
        }
    }
}

/// Counters for one ingestion call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    /// Number of groups in this call.
    pub total_groups: usize,
    /// Sum of member counts across all groups.
    pub total_files: usize,
    /// 1-based position of the current group, 0 before the first.
    pub group_index: usize,
    /// Name of the current group.
    pub group_name: String,
    /// Files registered so far, never reset between groups.
    pub processed_files: usize,
}

impl ProgressState {
    /// Fresh counters for a call.
    pub fn new(total_groups: usize, total_files: usize) -> Self {
        Self {
            total_groups,
            total_files,
            ..Self::default()
        }
    }

    /// Totals for the begin notification.
    pub fn begin(&self) -> IngestBegin {
        IngestBegin {
            total_groups: self.total_groups,
            total_files: self.total_files,
        }
    }

    /// Move on to the group at `index` (1-based).
    pub fn start_group(&mut self, index: usize, name: &str) {
        self.group_index = index;
        self.group_name = name.to_string();
    }

    /// Count one registered file.
    pub fn file_registered(&mut self) {
        self.processed_files += 1;
    }

    /// Current counters as a notification.
    pub fn snapshot(&self) -> IngestProgress {
        IngestProgress {
            group_index: self.group_index,
            group_name: self.group_name.clone(),
            total_groups: self.total_groups,
            processed_files: self.processed_files,
            total_files: self.total_files,
        }
    }
}
