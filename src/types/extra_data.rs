use std::{borrow::Cow, sync::Arc};

use ahash::AHashMap;

use super::{instance::Instance, type_info::TypeInfo};

/// Ambient named values passed along with a locate call.
///
/// Used as backup resolution when no strategy satisfies a service dependency.
#[derive(Debug, Clone, Default)]
pub struct ExtraData {
    values: AHashMap<Cow<'static, str>, Instance>,
    order: Vec<Cow<'static, str>>,
}

impl ExtraData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, it is exposed to dependencies as `Arc<TValue>`
    pub fn with<TValue: Send + Sync + 'static>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        value: TValue,
    ) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert<TValue: Send + Sync + 'static>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        value: TValue,
    ) {
        self.insert_instance(name, Instance::from_arc(Arc::new(value)));
    }

    pub fn insert_instance(&mut self, name: impl Into<Cow<'static, str>>, instance: Instance) {
        let name = name.into();

        if self.values.insert(name.clone(), instance).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.values.get(name)
    }

    /// Match by name first, then by the first value of the requested type
    pub fn find(&self, name: Option<&str>, ty: TypeInfo) -> Option<&Instance> {
        if let Some(found) = name.and_then(|name| self.values.get(name)).filter(|x| x.ty() == ty) {
            return Some(found);
        }

        self.order
            .iter()
            .filter_map(|name| self.values.get(name))
            .find(|x| x.ty() == ty)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::ExtraData;
    use crate::types::type_info::TypeInfoSource;

    #[test]
    fn find_prefers_name() {
        let data = ExtraData::new().with("first", 1i32).with("second", 2i32);

        let found = data.find(Some("second"), Arc::<i32>::type_info()).unwrap();
        assert_eq!(*found.to_arc::<i32>().unwrap(), 2);

        let found = data.find(Some("missing"), Arc::<i32>::type_info()).unwrap();
        assert_eq!(*found.to_arc::<i32>().unwrap(), 1);

        assert!(data.find(None, Arc::<String>::type_info()).is_none());
    }
}
