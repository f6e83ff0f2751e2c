use crate::error::PoolError;

use std::fmt;

/// One slot of a corresponding-results run.
///
/// In corresponding mode the result sequence has exactly one slot per
/// source item, at the same position the item has in the source
/// collection. Slots for items that never ran or whose task failed carry
/// the matching marker instead of a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult<R> {
  /// The task settled successfully with this value.
  Value(R),
  /// The task was never dispatched (the run stopped first).
  NotRun,
  /// The task settled with an error.
  Failed,
}

impl<R> TaskResult<R> {
  pub fn is_value(&self) -> bool {
    matches!(self, TaskResult::Value(_))
  }

  pub fn value(&self) -> Option<&R> {
    match self {
      TaskResult::Value(value) => Some(value),
      _ => None,
    }
  }

  pub fn into_value(self) -> Option<R> {
    match self {
      TaskResult::Value(value) => Some(value),
      _ => None,
    }
  }
}

/// The results of a run, in the shape the run was configured for.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolResults<R> {
  /// Settled values only, in completion order.
  Collected(Vec<R>),
  /// One slot per source item, in source order.
  Corresponding(Vec<TaskResult<R>>),
}

impl<R> PoolResults<R> {
  pub fn len(&self) -> usize {
    match self {
      PoolResults::Collected(values) => values.len(),
      PoolResults::Corresponding(slots) => slots.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn as_collected(&self) -> Option<&[R]> {
    match self {
      PoolResults::Collected(values) => Some(values),
      PoolResults::Corresponding(_) => None,
    }
  }

  pub fn as_corresponding(&self) -> Option<&[TaskResult<R>]> {
    match self {
      PoolResults::Collected(_) => None,
      PoolResults::Corresponding(slots) => Some(slots),
    }
  }

  pub fn into_collected(self) -> Option<Vec<R>> {
    match self {
      PoolResults::Collected(values) => Some(values),
      PoolResults::Corresponding(_) => None,
    }
  }

  pub fn into_corresponding(self) -> Option<Vec<TaskResult<R>>> {
    match self {
      PoolResults::Collected(_) => None,
      PoolResults::Corresponding(slots) => Some(slots),
    }
  }
}

/// One entry of the error list: the failure and the item that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFailure<T> {
  pub error: PoolError,
  pub item: T,
}

impl<T> TaskFailure<T> {
  pub(crate) fn new(error: PoolError, item: T) -> Self {
    Self { error, item }
  }

  /// The normalized failure message.
  pub fn message(&self) -> String {
    self.error.to_string()
  }
}

impl<T> fmt::Display for TaskFailure<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.error)
  }
}

/// Everything a completed run returns.
#[derive(Debug)]
pub struct PoolOutput<T, R> {
  pub results: PoolResults<R>,
  pub errors: Vec<TaskFailure<T>>,
  /// Every item whose task settled, in settlement order. Items skipped by
  /// a stop never appear here.
  pub processed_items: Vec<T>,
}

/// Accumulates results and errors for one run.
///
/// In corresponding mode the slot sequence is created at full length up
/// front, every slot `NotRun`, and individual slots are overwritten as
/// tasks settle; the sequence length never changes after that.
pub(crate) struct ResultStore<T, R> {
  results: PoolResults<R>,
  errors: Vec<TaskFailure<T>>,
}

impl<T, R> ResultStore<T, R> {
  pub(crate) fn new(corresponding: bool, item_count: usize) -> Self {
    let results = if corresponding {
      let mut slots = Vec::with_capacity(item_count);
      slots.resize_with(item_count, || TaskResult::NotRun);
      PoolResults::Corresponding(slots)
    } else {
      PoolResults::Collected(Vec::new())
    };
    Self {
      results,
      errors: Vec::new(),
    }
  }

  pub(crate) fn is_corresponding(&self) -> bool {
    matches!(self.results, PoolResults::Corresponding(_))
  }

  pub(crate) fn save(&mut self, index: usize, value: R) {
    match &mut self.results {
      PoolResults::Collected(values) => values.push(value),
      PoolResults::Corresponding(slots) => slots[index] = TaskResult::Value(value),
    }
  }

  /// Marks the slot for `index` as failed. No-op in collected mode.
  pub(crate) fn mark_failed(&mut self, index: usize) {
    if let PoolResults::Corresponding(slots) = &mut self.results {
      slots[index] = TaskResult::Failed;
    }
  }

  pub(crate) fn record_error(&mut self, error: PoolError, item: T) {
    self.errors.push(TaskFailure::new(error, item));
  }

  pub(crate) fn into_output(self, processed_items: Vec<T>) -> PoolOutput<T, R> {
    PoolOutput {
      results: self.results,
      errors: self.errors,
      processed_items,
    }
  }
}
