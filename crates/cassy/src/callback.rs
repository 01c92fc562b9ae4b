//! Per-statement callbacks and execution results.

use cassy_core::{Error, Row};

/// What a success callback receives for one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Nothing was executed (empty statement list).
    Nothing,
    /// The rows returned by the statement, possibly empty.
    Rows(Vec<Row>),
    /// The row key(s) the statement addressed, for mutations that return
    /// no rows.
    Key(Vec<String>),
}

impl Response {
    /// The dispatched rows, if any.
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Response::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// The dispatched row keys, if any.
    pub fn key(&self) -> Option<&[String]> {
        match self {
            Response::Key(key) => Some(key),
            _ => None,
        }
    }

    /// Pick what to hand a success callback: non-empty rows first, then the
    /// statement's row key, then the (empty) rows.
    pub(crate) fn dispatch(rows: Vec<Row>, key: Option<&[String]>) -> Self {
        match key {
            Some(key) if rows.is_empty() => Response::Key(key.to_vec()),
            _ => Response::Rows(rows),
        }
    }
}

/// How an error callback disposes of a driver failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorAction {
    /// Re-signal the failure to the caller.
    #[default]
    Propagate,
    /// The failure is dealt with; stop quietly.
    Handled,
}

/// Callback invoked with one statement's successful response.
pub type SuccessFn = Box<dyn FnOnce(Response) + Send>;

/// Callback invoked with one statement's driver failure.
pub type ErrorFn = Box<dyn FnOnce(&Error) -> ErrorAction + Send>;

/// Callbacks for a statement sequence.
pub enum Callbacks<F> {
    /// No callbacks.
    None,
    /// A single callback for the final statement only.
    Last(F),
    /// One optional callback per statement; padded with `None` or truncated
    /// to the number of statements.
    Each(Vec<Option<F>>),
}

impl<F> Default for Callbacks<F> {
    fn default() -> Self {
        Callbacks::None
    }
}

impl<F> std::fmt::Debug for Callbacks<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callbacks::None => f.write_str("Callbacks::None"),
            Callbacks::Last(_) => f.write_str("Callbacks::Last(..)"),
            Callbacks::Each(slots) => write!(f, "Callbacks::Each({} slots)", slots.len()),
        }
    }
}

impl<F> Callbacks<F> {
    /// One slot per statement.
    pub fn into_slots(self, statements: usize) -> Vec<Option<F>> {
        match self {
            Callbacks::None => std::iter::repeat_with(|| None).take(statements).collect(),
            Callbacks::Last(callback) => {
                let mut slots: Vec<Option<F>> = std::iter::repeat_with(|| None)
                    .take(statements.saturating_sub(1))
                    .collect();
                if statements > 0 {
                    slots.push(Some(callback));
                }
                slots
            }
            Callbacks::Each(mut slots) => {
                slots.resize_with(statements, || None);
                slots
            }
        }
    }

    /// The final callback, regardless of statement count.
    pub fn into_last(self) -> Option<F> {
        match self {
            Callbacks::None => None,
            Callbacks::Last(callback) => Some(callback),
            Callbacks::Each(mut slots) => slots.pop().flatten(),
        }
    }
}

impl Callbacks<SuccessFn> {
    /// Wrap a closure as the final statement's success callback.
    pub fn on_last<C>(callback: C) -> Self
    where
        C: FnOnce(Response) + Send + 'static,
    {
        Callbacks::Last(Box::new(callback))
    }
}

impl Callbacks<ErrorFn> {
    /// Wrap a closure as the final statement's error callback.
    pub fn on_last_error<C>(callback: C) -> Self
    where
        C: FnOnce(&Error) -> ErrorAction + Send + 'static,
    {
        Callbacks::Last(Box::new(callback))
    }
}

/// What happened to a statement sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// The sequence was empty; nothing ran and the connection was untouched.
    Nothing,
    /// Every statement succeeded.
    Completed { statements: usize },
    /// A statement failed, its error callback handled it, and the remaining
    /// statements were skipped.
    Halted { completed: usize, failed_at: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_maps_to_final_slot() {
        let slots = Callbacks::Last(7).into_slots(3);
        assert_eq!(slots, vec![None, None, Some(7)]);
        assert!(Callbacks::Last(7).into_slots(0).is_empty());
    }

    #[test]
    fn test_each_is_padded_or_truncated() {
        assert_eq!(
            Callbacks::Each(vec![Some(1)]).into_slots(3),
            vec![Some(1), None, None]
        );
        assert_eq!(
            Callbacks::Each(vec![Some(1), Some(2), Some(3)]).into_slots(2),
            vec![Some(1), Some(2)]
        );
        assert_eq!(Callbacks::<i32>::None.into_slots(2), vec![None, None]);
    }

    #[test]
    fn test_into_last() {
        assert_eq!(Callbacks::Each(vec![Some(1), Some(2)]).into_last(), Some(2));
        assert_eq!(Callbacks::Each(vec![Some(1), None]).into_last(), None);
        assert_eq!(Callbacks::Last(5).into_last(), Some(5));
    }

    #[test]
    fn test_dispatch_priority() {
        let key = vec!["u1".to_string()];
        let row = Row::empty("u1");
        assert_eq!(
            Response::dispatch(vec![row.clone()], Some(key.as_slice())),
            Response::Rows(vec![row])
        );
        assert_eq!(Response::dispatch(vec![], Some(key.as_slice())), Response::Key(key));
        assert_eq!(Response::dispatch(vec![], None), Response::Rows(vec![]));
    }
}
