//! Couple pairing service

use tracing::info;
use valentine_core::domain::couple::CoupleId;

use crate::error::Result;
use crate::repository::LocalRepository;

/// Reads and replaces the couple ID that keys the shared cloud record
#[derive(Clone)]
pub struct CoupleService {
    local: LocalRepository,
}

impl CoupleService {
    pub fn new(local: LocalRepository) -> Self {
        Self { local }
    }

    /// Current couple ID, generated on first use
    pub fn current(&self) -> Result<CoupleId> {
        self.local.couple_id()
    }

    /// Adopts a partner's couple ID
    ///
    /// Surrounding whitespace is trimmed. Pages already stored locally are
    /// kept; the next load reads the joined couple's record.
    ///
    /// # Errors
    /// Blank input is rejected and the stored ID is left unchanged.
    pub fn join(&self, input: &str) -> Result<CoupleId> {
        let id = CoupleId::parse(input)?;
        self.local.set_couple_id(&id)?;
        info!(couple_id = %id, "Joined couple");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::repository::MemoryStore;
    use std::sync::Arc;
    use valentine_core::CoreError;

    fn service() -> CoupleService {
        CoupleService::new(LocalRepository::new(Arc::new(MemoryStore::new())))
    }

    #[test]
    fn test_current_is_stable() {
        let service = service();
        let id = service.current().unwrap();
        assert!(id.as_str().starts_with("couple_"));
        assert_eq!(service.current().unwrap(), id);
    }

    #[test]
    fn test_join_trims_input() {
        let service = service();
        let id = service.join("  couple_1700000000000_abc123xyz \n").unwrap();
        assert_eq!(id.as_str(), "couple_1700000000000_abc123xyz");
        assert_eq!(service.current().unwrap(), id);
    }

    #[test]
    fn test_join_rejects_blank_input() {
        let service = service();
        let before = service.current().unwrap();
        let result = service.join("   ");
        assert!(matches!(
            result,
            Err(SyncError::Domain(CoreError::EmptyCoupleId))
        ));
        assert_eq!(service.current().unwrap(), before);
    }

    #[test]
    fn test_join_rejects_path_like_input() {
        let service = service();
        let before = service.current().unwrap();
        let result = service.join("partner/my");
        assert!(matches!(
            result,
            Err(SyncError::Domain(CoreError::InvalidCoupleId('/')))
        ));
        assert_eq!(service.current().unwrap(), before);
    }
}
