use crate::kernel::services::ports::{Backend, BackendError, BackendKind};

/// Degraded medium installed when the real one failed its probe.
///
/// Every write fails and every read finds nothing, so callers get their
/// defaults without special-casing the missing medium.
#[derive(Debug, Clone, Copy)]
pub struct UnavailableBackend {
    kind: BackendKind,
}

impl UnavailableBackend {
    pub fn new(kind: BackendKind) -> Self {
        Self { kind }
    }
}

impl Backend for UnavailableBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        false
    }

    fn get_item(&self, _key: &str) -> Result<Option<String>, BackendError> {
        Ok(None)
    }

    fn set_item(&mut self, _key: &str, _value: String) -> Result<(), BackendError> {
        Err(BackendError::Unavailable(self.kind))
    }

    fn remove_item(&mut self, _key: &str) -> Result<Option<String>, BackendError> {
        Ok(None)
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        Ok(Vec::new())
    }
}
