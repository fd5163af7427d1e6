//! Name-keyed registry of capture backends.
//!
//! The registry owns the list of selectable backends. Ordinals are
//! positional: the first registered entry is method 1, the second
//! method 2, and so on. Everything outside `MIN < m < max()` is
//! rejected before a backend is ever constructed.

use ledcast_core::CaptureError;

use crate::{CaptureBackend, CaptureMethod, X11ArgbBackend, X11Backend};

/// Constructor for a fresh, uninitialized backend.
pub type BackendFactory = fn() -> Box<dyn CaptureBackend>;

/// One selectable backend: its public name and how to build it.
pub struct RegistryEntry {
    pub name:  &'static str,
    pub build: BackendFactory,
}

/// Ordered collection of registered capture backends.
pub struct CaptureRegistry {
    entries: Vec<RegistryEntry>,
}

impl CaptureRegistry {
    /// Registry with every backend this crate ships.
    pub fn builtin() -> Self {
        Self::from_entries(vec![
            RegistryEntry {
                name:  X11Backend::NAME,
                build: || Box::new(X11Backend::new()),
            },
            RegistryEntry {
                name:  X11ArgbBackend::NAME,
                build: || Box::new(X11ArgbBackend::new()),
            },
        ])
    }

    /// Registry over an explicit entry list, first entry = method 1.
    pub fn from_entries(entries: Vec<RegistryEntry>) -> Self {
        Self { entries }
    }

    /// Registered names, in ordinal order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Upper sentinel; one past the last registered ordinal.
    pub fn max(&self) -> CaptureMethod {
        CaptureMethod(self.entries.len() as i32 + 1)
    }

    /// True when `method` names a registered backend.
    pub fn validate(&self, method: CaptureMethod) -> bool {
        method > CaptureMethod::MIN && method < self.max()
    }

    /// Ordinal for a backend name, if registered.
    pub fn method_from_name(&self, name: &str) -> Option<CaptureMethod> {
        self.entries
            .iter()
            .position(|e| e.name == name)
            .map(|i| CaptureMethod(i as i32 + 1))
    }

    /// Name behind an ordinal.
    pub fn name_of(&self, method: CaptureMethod) -> Result<&'static str, CaptureError> {
        if !self.validate(method) {
            return Err(CaptureError::InvalidMethod { method: method.to_string() });
        }
        Ok(self.entries[(method.0 - 1) as usize].name)
    }

    /// Builds a fresh, uninitialized backend for an ordinal.
    pub fn create(&self, method: CaptureMethod) -> Result<Box<dyn CaptureBackend>, CaptureError> {
        if !self.validate(method) {
            return Err(CaptureError::InvalidMethod { method: method.to_string() });
        }
        Ok((self.entries[(method.0 - 1) as usize].build)())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledcast_core::{FrameBuffer, PixelFormat};

    struct NullBackend;

    impl CaptureBackend for NullBackend {
        fn init(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }
        fn deinit(&mut self) {}
        fn capture(&mut self, _: &mut FrameBuffer, _: i32, _: i32) -> Result<(), CaptureError> {
            Ok(())
        }
        fn format(&self) -> Result<PixelFormat, CaptureError> {
            Ok(PixelFormat::ArgbU8)
        }
        fn is_big_endian(&self) -> Result<bool, CaptureError> {
            Ok(false)
        }
        fn name(&self) -> &'static str {
            "null"
        }
    }

    fn two_entry_registry() -> CaptureRegistry {
        CaptureRegistry::from_entries(vec![
            RegistryEntry { name: "first", build: || Box::new(NullBackend) },
            RegistryEntry { name: "second", build: || Box::new(NullBackend) },
        ])
    }

    #[test]
    fn validate_holds_strictly_between_sentinels() {
        let registry = two_entry_registry();
        assert_eq!(registry.max(), CaptureMethod(3));

        for ordinal in -2..=4 {
            let method = CaptureMethod(ordinal);
            let expected = method > CaptureMethod::MIN && method < registry.max();
            assert_eq!(registry.validate(method), expected, "ordinal {ordinal}");
        }
        assert!(!registry.validate(CaptureMethod::MIN));
        assert!(!registry.validate(registry.max()));
    }

    #[test]
    fn names_round_trip_through_ordinals() {
        let registry = CaptureRegistry::builtin();

        for name in registry.names() {
            let method = registry.method_from_name(name).expect("registered name");
            assert!(registry.validate(method));
            assert_eq!(registry.name_of(method).expect("valid ordinal"), name);
        }
    }

    #[test]
    fn unknown_name_is_not_found() {
        let registry = CaptureRegistry::builtin();
        assert_eq!(registry.method_from_name("DoesNotExist"), None);
    }

    #[test]
    fn sentinel_ordinals_have_no_name() {
        let registry = two_entry_registry();

        for method in [CaptureMethod::MIN, registry.max(), CaptureMethod(-7)] {
            let err = registry.name_of(method).expect_err("sentinels are invalid");
            assert!(err.to_string().starts_with("Invalid capture method"));
        }
    }

    #[test]
    fn builtin_order_is_stable() {
        let registry = CaptureRegistry::builtin();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, ["x11", "x11-argb"]);
    }

    #[test]
    fn create_rejects_out_of_range_ordinals() {
        let registry = two_entry_registry();

        assert!(registry.create(CaptureMethod(1)).is_ok());
        assert!(registry.create(CaptureMethod(2)).is_ok());
        assert!(matches!(
            registry.create(CaptureMethod(3)),
            Err(CaptureError::InvalidMethod { .. })
        ));
        assert!(matches!(
            registry.create(CaptureMethod(0)),
            Err(CaptureError::InvalidMethod { .. })
        ));
    }
}
