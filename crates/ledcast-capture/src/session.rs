//! Capture session lifecycle.
//!
//! A [`CaptureSession`] exists only in the initialized state: `open`
//! builds the backend and runs `init` before handing the session out,
//! and `close` consumes the session, so `deinit` runs exactly once.

use tracing::{debug, info};

use ledcast_core::CaptureError;

use crate::{CaptureBackend, CaptureMethod, CaptureRegistry};

/// An initialized capture backend plus the identity it was opened under.
pub struct CaptureSession {
    method:  CaptureMethod,
    name:    &'static str,
    backend: Box<dyn CaptureBackend>,
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("method", &self.method)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl CaptureSession {
    /// Builds and initializes the backend behind `method`.
    ///
    /// On init failure no session is created and nothing needs tearing
    /// down; the uninitialized backend is simply dropped.
    pub fn open(registry: &CaptureRegistry, method: CaptureMethod) -> Result<Self, CaptureError> {
        let name = registry.name_of(method)?;
        let mut backend = registry.create(method)?;

        info!("Initializing capture method \"{name}\"");
        backend.init()?;
        debug!("Capture method \"{name}\" ready");

        Ok(Self { method, name, backend })
    }

    /// Wraps an already-built backend, initializing it first. Used by
    /// tests and embedders that bypass the registry.
    pub fn with_backend(
        name: &'static str,
        mut backend: Box<dyn CaptureBackend>,
    ) -> Result<Self, CaptureError> {
        backend.init()?;
        Ok(Self { method: CaptureMethod(1), name, backend })
    }

    pub fn method(&self) -> CaptureMethod {
        self.method
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn backend(&self) -> &dyn CaptureBackend {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn CaptureBackend {
        self.backend.as_mut()
    }

    /// Tears the backend down. Consumes the session, so a closed
    /// session cannot capture and cannot be closed twice.
    pub fn close(mut self) {
        debug!("Closing capture method \"{}\"", self.name);
        self.backend.deinit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use ledcast_core::{FrameBuffer, PixelFormat};
    use crate::registry::RegistryEntry;

    #[derive(Default)]
    struct Counters {
        inits:   AtomicUsize,
        deinits: AtomicUsize,
    }

    struct CountingBackend {
        counters:  Arc<Counters>,
        fail_init: bool,
    }

    impl CaptureBackend for CountingBackend {
        fn init(&mut self) -> Result<(), CaptureError> {
            self.counters.inits.fetch_add(1, Ordering::SeqCst);
            if self.fail_init {
                return Err(CaptureError::SessionInit { reason: "display unavailable".into() });
            }
            Ok(())
        }

        fn deinit(&mut self) {
            self.counters.deinits.fetch_add(1, Ordering::SeqCst);
        }

        fn capture(
            &mut self,
            frame: &mut FrameBuffer,
            _x: i32,
            _y: i32,
        ) -> Result<(), CaptureError> {
            frame.data_mut().fill(0xAB);
            Ok(())
        }

        fn format(&self) -> Result<PixelFormat, CaptureError> {
            Ok(PixelFormat::ArgbU8)
        }

        fn is_big_endian(&self) -> Result<bool, CaptureError> {
            Ok(false)
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[test]
    fn open_initializes_and_close_deinitializes_once() {
        let counters = Arc::new(Counters::default());
        let backend = CountingBackend { counters: Arc::clone(&counters), fail_init: false };

        let session = CaptureSession::with_backend("counting", Box::new(backend))
            .expect("init succeeds");
        assert_eq!(counters.inits.load(Ordering::SeqCst), 1);
        assert_eq!(counters.deinits.load(Ordering::SeqCst), 0);
        assert_eq!(session.name(), "counting");

        session.close();
        assert_eq!(counters.inits.load(Ordering::SeqCst), 1);
        assert_eq!(counters.deinits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_init_never_creates_a_session() {
        let counters = Arc::new(Counters::default());
        let backend = CountingBackend { counters: Arc::clone(&counters), fail_init: true };

        let err = CaptureSession::with_backend("counting", Box::new(backend))
            .expect_err("init fails");
        assert!(matches!(err, CaptureError::SessionInit { .. }));
        assert_eq!(counters.inits.load(Ordering::SeqCst), 1);
        assert_eq!(counters.deinits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn open_rejects_unvalidated_ordinals() {
        let registry = CaptureRegistry::from_entries(Vec::new());

        let err = CaptureSession::open(&registry, CaptureMethod(1)).expect_err("empty registry");
        assert!(matches!(err, CaptureError::InvalidMethod { .. }));
    }

    #[test]
    fn open_runs_the_factory_through_the_registry() {
        fn build() -> Box<dyn CaptureBackend> {
            Box::new(CountingBackend { counters: Arc::new(Counters::default()), fail_init: false })
        }
        let registry =
            CaptureRegistry::from_entries(vec![RegistryEntry { name: "counting", build }]);

        let session = CaptureSession::open(&registry, CaptureMethod(1)).expect("valid ordinal");
        assert_eq!(session.method(), CaptureMethod(1));
        assert_eq!(session.name(), "counting");
        session.close();
    }

    #[test]
    fn capture_fills_exactly_the_buffer() {
        let counters = Arc::new(Counters::default());
        let backend = CountingBackend { counters, fail_init: false };

        let mut session = CaptureSession::with_backend("counting", Box::new(backend))
            .expect("init succeeds");
        let mut frame = FrameBuffer::new(4, 2, PixelFormat::ArgbU8);

        session.backend_mut().capture(&mut frame, 0, 0).expect("capture succeeds");
        assert_eq!(frame.len(), 32);
        assert!(frame.data().iter().all(|&b| b == 0xAB));
        session.close();
    }
}
