/// Result state of a query that ran successfully.
///
/// `NoData` means the filters matched nothing (or named a column the table
/// doesn't have). It is distinct from a load failure, which is reported by
/// [`crate::LoadReport`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Found(T),
    NoData,
}

impl<T> Outcome<T> {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Outcome::NoData)
    }

    pub fn found(self) -> Option<T> {
        match self {
            Outcome::Found(value) => Some(value),
            Outcome::NoData => None,
        }
    }
}

impl<T> Outcome<Vec<T>> {
    pub fn from_rows(rows: Vec<T>) -> Self {
        if rows.is_empty() {
            Outcome::NoData
        } else {
            Outcome::Found(rows)
        }
    }
}
