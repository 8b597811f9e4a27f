//! Presence-aware field patches.
//!
//! The store keeps zero values (`""`, `0`, `false`, `NULL`) as ordinary data,
//! so a patch cannot use them to mean "leave this column alone". Every mutable
//! column in a patch is wrapped in [`Field`], which distinguishes a column the
//! event never mentioned from one it explicitly resets.

/// A single column of a patch: either untouched or overwritten with a value.
///
/// `Set` with a zero value is a real write. Nullable columns use
/// `Field<Option<T>>`, where `Set(None)` writes `NULL`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field<T> {
    #[default]
    Unset,
    Set(T),
}

impl<T> Field<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Field::Set(_))
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Field::Set(value) => Some(value),
            Field::Unset => None,
        }
    }

    /// Overwrite `target` when set; otherwise leave it as it is.
    #[cfg(test)]
    pub fn apply_to(&self, target: &mut T)
    where
        T: Clone,
    {
        if let Field::Set(value) = self {
            *target = value.clone();
        }
    }
}

/// Audit columns stamped on every write, taken from the triggering event's
/// block and transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStamp {
    pub update_at: i64,
    pub update_tx_hash: String,
    pub update_time: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_leaves_target_alone() {
        let mut quota = 42_i64;
        Field::<i64>::Unset.apply_to(&mut quota);
        assert_eq!(quota, 42);
    }

    #[test]
    fn set_to_zero_overwrites() {
        let mut quota = 42_i64;
        Field::Set(0).apply_to(&mut quota);
        assert_eq!(quota, 0);

        let mut start: Option<i64> = Some(1_700_000_000);
        Field::Set(None).apply_to(&mut start);
        assert_eq!(start, None);
    }

    #[test]
    fn default_is_unset() {
        let field: Field<String> = Field::default();
        assert!(!field.is_set());
        assert_eq!(field.as_set(), None);
        assert_eq!(Field::Set(String::new()).as_set(), Some(&String::new()));
    }
}
