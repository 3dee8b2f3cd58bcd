use crate::collate::locale_cmp;
use meterview_common::Record;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
    #[default]
    None,
}

/// Column sort of a table view. Header clicks go through [`SortState::toggle`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SortState {
    pub field: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn by(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: Some(field.into()),
            direction,
        }
    }

    /// Next state after a click on `field`.
    ///
    /// Same field: ascending -> descending -> unsorted. Any other field
    /// (or a click while unsorted) starts again at ascending.
    pub fn toggle(&self, field: &str) -> SortState {
        if self.field.as_deref() == Some(field) {
            match self.direction {
                SortDirection::Ascending => SortState::by(field, SortDirection::Descending),
                SortDirection::Descending => SortState::default(),
                SortDirection::None => SortState::by(field, SortDirection::Ascending),
            }
        } else {
            SortState::by(field, SortDirection::Ascending)
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.field.is_some() && self.direction != SortDirection::None
    }

    /// Direction to show on `field`'s header.
    pub fn direction_of(&self, field: &str) -> SortDirection {
        if self.field.as_deref() == Some(field) {
            self.direction
        } else {
            SortDirection::None
        }
    }
}

/// Ordering of two cell values.
///
/// Numbers compare numerically. A null or missing value on either side
/// compares equal to anything, so rows with gaps stay where they are
/// relative to their neighbours. Everything else compares as text.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) if !a.is_null() && !b.is_null() => (a, b),
        _ => return Ordering::Equal,
    };
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    locale_cmp(&display_text(a), &display_text(b))
}

fn display_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Records in the order `state` asks for. Unsorted keeps input order.
pub fn sort<'a, R, I>(records: I, state: &SortState) -> Vec<&'a R>
where
    R: Record + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let rows: Vec<&'a R> = records.into_iter().collect();
    let Some(field) = state.field.as_deref() else {
        return rows;
    };
    match state.direction {
        SortDirection::None => rows,
        SortDirection::Ascending => {
            stable_sort_by(rows, |a, b| compare_values(a.field(field), b.field(field)))
        }
        SortDirection::Descending => {
            stable_sort_by(rows, |a, b| compare_values(b.field(field), a.field(field)))
        }
    }
}

/// Top-down merge sort.
///
/// `compare_values` is not a total order (null equals everything), and the
/// std sorts may panic on such comparators; this one just produces some
/// stable order.
fn stable_sort_by<T, F>(items: Vec<T>, mut cmp: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    fn go<T, F: FnMut(&T, &T) -> Ordering>(mut items: Vec<T>, cmp: &mut F) -> Vec<T> {
        if items.len() <= 1 {
            return items;
        }
        let right = items.split_off(items.len() / 2);
        let left = go(items, cmp);
        let right = go(right, cmp);

        let mut out = Vec::with_capacity(left.len() + right.len());
        let mut left = left.into_iter().peekable();
        let mut right = right.into_iter().peekable();
        loop {
            let take_left = match (left.peek(), right.peek()) {
                (Some(l), Some(r)) => cmp(l, r) != Ordering::Greater,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let next = if take_left { left.next() } else { right.next() };
            out.extend(next);
        }
        out
    }
    go(items, &mut cmp)
}
