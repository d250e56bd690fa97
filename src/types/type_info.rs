use std::any::{TypeId, type_name};

#[derive(Debug, Clone, Copy, Eq, PartialOrd, Ord)]
pub struct TypeInfo {
    pub id: TypeId,
    pub name: &'static str,
}

impl std::hash::Hash for TypeInfo {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id.eq(&other.id)
    }
}

impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

impl TypeInfo {
    pub fn of<TType: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<TType>(),
            name: type_name::<TType>(),
        }
    }
}

pub trait TypeInfoSource {
    fn type_info() -> TypeInfo;
}

impl<T: ?Sized + 'static> TypeInfoSource for T {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<T>()
    }
}
