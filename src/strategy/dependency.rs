use std::borrow::Cow;

use crate::{
    activation::request::Request,
    types::{instance::Instance, key::Key, type_info::TypeInfo},
};

/// One constructor parameter or injected member of a strategy
#[derive(Debug, Clone)]
pub struct Dependency {
    pub(crate) request: Request,
    pub(crate) position: usize,
    pub(crate) is_member: bool,
    pub(crate) name: Option<Cow<'static, str>>,
    pub(crate) key: Option<Key>,
    pub(crate) markers: Vec<TypeInfo>,
    pub(crate) default: Option<Instance>,
    pub(crate) value: Option<Instance>,
}

impl Dependency {
    pub(crate) fn parameter(position: usize, request: Request) -> Self {
        Self {
            request,
            position,
            is_member: false,
            name: None,
            key: None,
            markers: Vec::new(),
            default: None,
            value: None,
        }
    }

    pub(crate) fn member(position: usize, request: Request) -> Self {
        Self {
            is_member: true,
            ..Self::parameter(position, request)
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn markers(&self) -> &[TypeInfo] {
        &self.markers
    }
}
