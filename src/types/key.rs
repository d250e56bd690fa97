use std::sync::Arc;

use super::type_info::{TypeInfo, TypeInfoSource};

/// Export key used by keyed registrations and keyed lookups
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Str(Arc<str>),
    Type(TypeInfo),
}

impl Key {
    /// Key made from a marker type
    pub fn of<TMarker: ?Sized + 'static>() -> Self {
        Key::Type(TMarker::type_info())
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Int(val) => write!(f, "{val}"),
            Key::Str(val) => write!(f, "\"{val}\""),
            Key::Type(ty) => write!(f, "{ty}"),
        }
    }
}

macro_rules! impl_int_key {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(val: $ty) -> Self {
                    Key::Int(val as i64)
                }
            }
        )*
    };
}

impl_int_key!(i8, i16, i32, i64, u8, u16, u32, isize);

impl From<usize> for Key {
    fn from(val: usize) -> Self {
        Key::Int(i64::try_from(val).unwrap_or(i64::MAX))
    }
}

impl From<u64> for Key {
    fn from(val: u64) -> Self {
        Key::Int(i64::try_from(val).unwrap_or(i64::MAX))
    }
}

impl From<&str> for Key {
    fn from(val: &str) -> Self {
        Key::Str(Arc::from(val))
    }
}

impl From<String> for Key {
    fn from(val: String) -> Self {
        Key::Str(Arc::from(val))
    }
}

impl From<TypeInfo> for Key {
    fn from(val: TypeInfo) -> Self {
        Key::Type(val)
    }
}

#[cfg(test)]
mod tests {
    use super::Key;

    #[test]
    fn integer_keys_compare_across_widths() {
        assert_eq!(Key::from(5i32), Key::from(5u64));
        assert_ne!(Key::from(5), Key::from(10));
    }

    #[test]
    fn string_keys() {
        assert_eq!(Key::from("a"), Key::from("a".to_string()));
        assert_eq!(Key::from("a").to_string(), "\"a\"");
    }
}
