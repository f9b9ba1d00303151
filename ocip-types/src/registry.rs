//! The process-wide type registry.
//!
//! Maps wire type tags to entity descriptors. Built once, immutable
//! afterwards, and shared by handle: sessions hold a `&'static Registry`
//! rather than reaching for a global.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::{
    commands,
    descriptor::Descriptor,
    utils::highest_version,
};

#[derive(Debug, Default)]
pub struct Registry {
    by_tag: HashMap<&'static str, &'static Descriptor>,
}

impl Registry {
    pub fn new<I>(descriptors: I) -> Self
    where
        I: IntoIterator<Item = &'static Descriptor>,
    {
        Self {
            by_tag: descriptors
                .into_iter()
                .map(|descriptor| (descriptor.tag, descriptor))
                .collect(),
        }
    }

    /// The registry over every catalog entity this crate ships.
    pub fn builtin() -> &'static Self {
        static BUILTIN: OnceLock<Registry> = OnceLock::new();
        BUILTIN.get_or_init(|| Registry::new(commands::descriptors()))
    }

    /// Resolve a wire tag. The tag may carry a namespace prefix
    /// (`c:ErrorResponse`); only the local part is significant.
    pub fn get(&self, tag: &str) -> Option<&'static Descriptor> {
        let local = tag.rsplit(':').next().unwrap_or(tag);
        self.by_tag.get(local).copied()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    /// Every registered wire tag.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_tag.keys().copied()
    }

    /// The most recent registered version of a command base name.
    pub fn highest(&self, base: &str) -> Option<&'static str> {
        highest_version(base, self.tags())
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::EntityKind;

    #[test]
    fn test_builtin_lookup() {
        let registry = Registry::builtin();

        let tests = [
            ("AuthenticationRequest", Some(EntityKind::Request)),
            ("ErrorResponse", Some(EntityKind::ErrorResponse)),
            ("SuccessResponse", Some(EntityKind::SuccessResponse)),
            ("UserGetRegistrationListResponse", Some(EntityKind::DataResponse)),
            ("AccessDevice", Some(EntityKind::Type)),
            ("NoSuchRequest", None),
        ];

        for (tag, expected) in tests {
            let got = registry.get(tag).map(|descriptor| descriptor.kind);
            assert_eq!(expected, got);
        }
    }

    #[test]
    fn test_prefixed_tag_resolves() {
        let registry = Registry::builtin();
        assert!(registry.get("c:ErrorResponse").is_some());
    }

    #[test]
    fn test_highest_registered_login() {
        let registry = Registry::builtin();
        assert_eq!(Some("LoginRequest22V5"), registry.highest("LoginRequest"));
    }

    #[test]
    fn test_builtin_is_shared() {
        assert!(std::ptr::eq(Registry::builtin(), Registry::builtin()));
    }
}
