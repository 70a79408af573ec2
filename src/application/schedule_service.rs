// Schedule service - Use cases for querying and replacing the active schedule
use crate::application::repository::ScheduleRepository;
use crate::domain::schedule::{
    resolve, sort_breakpoints, ModeQueryResult, ScheduleBreakpoint, StoredBreakpoint,
};
use crate::domain::validation::{validate_with_horizon, ScheduleConflict, DEFAULT_CHARGER_HORIZON};
use anyhow::anyhow;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Conflict(#[from] ScheduleConflict),

    #[error("failed to store schedule: {0:#}")]
    Storage(anyhow::Error),
}

#[derive(Clone)]
pub struct ScheduleService {
    repository: Arc<dyn ScheduleRepository>,
    active: Arc<RwLock<Arc<[ScheduleBreakpoint]>>>,
    writer: Arc<Mutex<()>>,
    charger_horizon: TimeDelta,
}

impl ScheduleService {
    pub fn new(repository: Arc<dyn ScheduleRepository>) -> Self {
        Self {
            repository,
            active: Arc::new(RwLock::new(Arc::from(Vec::new()))),
            writer: Arc::new(Mutex::new(())),
            charger_horizon: DEFAULT_CHARGER_HORIZON,
        }
    }

    pub fn with_charger_horizon(mut self, horizon: TimeDelta) -> Self {
        self.charger_horizon = horizon;
        self
    }

    /// Load the persisted schedule into memory
    pub async fn load(&self) -> anyhow::Result<usize> {
        let _guard = self.writer.lock().await;
        let stored = self.repository.load_schedule().await?;
        let breakpoints: Vec<ScheduleBreakpoint> =
            stored.iter().map(StoredBreakpoint::breakpoint).collect();
        let count = breakpoints.len();
        self.swap(breakpoints)?;
        Ok(count)
    }

    /// Snapshot of the active schedule
    pub fn snapshot(&self) -> anyhow::Result<Arc<[ScheduleBreakpoint]>> {
        let active = self
            .active
            .read()
            .map_err(|_| anyhow!("schedule lock poisoned"))?;
        Ok(Arc::clone(&active))
    }

    pub fn current_mode(&self, at: DateTime<Utc>) -> anyhow::Result<ModeQueryResult> {
        Ok(resolve(&self.snapshot()?, at))
    }

    pub async fn stored_schedule(&self) -> anyhow::Result<Vec<StoredBreakpoint>> {
        self.repository.load_schedule().await
    }

    /// Validate, persist and activate a new schedule. Nothing changes if
    /// validation or persistence fails.
    pub async fn submit(&self, mut breakpoints: Vec<ScheduleBreakpoint>) -> Result<(), ScheduleError> {
        sort_breakpoints(&mut breakpoints);
        validate_with_horizon(&breakpoints, self.charger_horizon)?;

        let _guard = self.writer.lock().await;
        self.repository
            .replace_schedule(&breakpoints)
            .await
            .map_err(ScheduleError::Storage)?;

        let count = breakpoints.len();
        self.swap(breakpoints).map_err(ScheduleError::Storage)?;
        tracing::info!(breakpoints = count, "Schedule replaced");
        Ok(())
    }

    fn swap(&self, breakpoints: Vec<ScheduleBreakpoint>) -> anyhow::Result<()> {
        let mut active = self
            .active
            .write()
            .map_err(|_| anyhow!("schedule lock poisoned"))?;
        *active = Arc::from(breakpoints);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mode::Mode;
    use crate::infrastructure::sqlite_repository::SqliteRepository;
    use async_trait::async_trait;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, hour, minute, 0).unwrap()
    }

    fn service() -> (ScheduleService, Arc<SqliteRepository>) {
        let repository = Arc::new(SqliteRepository::open_in_memory().unwrap());
        (ScheduleService::new(repository.clone()), repository)
    }

    struct FailingRepository;

    #[async_trait]
    impl ScheduleRepository for FailingRepository {
        async fn replace_schedule(&self, _: &[ScheduleBreakpoint]) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }

        async fn load_schedule(&self) -> anyhow::Result<Vec<StoredBreakpoint>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_submit_then_resolve() {
        let (service, _) = service();
        service
            .submit(vec![
                ScheduleBreakpoint::new(at(10, 0), Mode::Passive),
                ScheduleBreakpoint::new(at(8, 0), Mode::GridCharge),
            ])
            .await
            .unwrap();

        assert_eq!(service.current_mode(at(7, 59)).unwrap().mode, Mode::Passive);

        let charging = service.current_mode(at(8, 0)).unwrap();
        assert_eq!(charging.mode, Mode::GridCharge);
        assert_eq!(charging.next_change_at, Some(at(10, 0)));
        assert_eq!(charging.next_mode, Some(Mode::Passive));

        assert_eq!(service.current_mode(at(9, 30)).unwrap().mode, Mode::GridCharge);

        let after = service.current_mode(at(10, 0)).unwrap();
        assert_eq!(after.mode, Mode::Passive);
        assert_eq!(after.next_change_at, None);
    }

    #[tokio::test]
    async fn test_conflicting_schedule_is_rejected_and_not_stored() {
        let (service, repository) = service();
        service
            .submit(vec![ScheduleBreakpoint::new(at(8, 0), Mode::GridCharge)])
            .await
            .unwrap();

        let result = service
            .submit(vec![
                ScheduleBreakpoint::new(at(10, 0), Mode::GarageCharger),
                ScheduleBreakpoint::new(at(10, 30), Mode::OutdoorCharger),
                ScheduleBreakpoint::new(at(10, 30), Mode::GarageCharger),
            ])
            .await;

        match result {
            Err(ScheduleError::Conflict(conflict)) => assert_eq!(conflict.at, at(10, 30)),
            other => panic!("expected conflict, got {other:?}"),
        }

        assert_eq!(service.current_mode(at(11, 0)).unwrap().mode, Mode::GridCharge);
        assert_eq!(repository.load_schedule().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_active_schedule() {
        let service = ScheduleService::new(Arc::new(FailingRepository));
        let result = service
            .submit(vec![ScheduleBreakpoint::new(at(8, 0), Mode::Discharge)])
            .await;

        assert!(matches!(result, Err(ScheduleError::Storage(_))));
        assert_eq!(service.current_mode(at(9, 0)).unwrap().mode, Mode::Passive);
    }

    #[tokio::test]
    async fn test_load_restores_persisted_schedule() {
        let (service, repository) = service();
        service
            .submit(vec![ScheduleBreakpoint::new(at(8, 0), Mode::Discharge)])
            .await
            .unwrap();

        let restarted = ScheduleService::new(repository);
        assert_eq!(restarted.current_mode(at(9, 0)).unwrap().mode, Mode::Passive);
        assert_eq!(restarted.load().await.unwrap(), 1);
        assert_eq!(restarted.current_mode(at(9, 0)).unwrap().mode, Mode::Discharge);
    }

    #[tokio::test]
    async fn test_readers_see_whole_snapshots() {
        let (service, _) = service();
        let old: Vec<_> = (0..8)
            .map(|h| ScheduleBreakpoint::new(at(h, 0), Mode::GridCharge))
            .collect();
        let new: Vec<_> = (0..4)
            .map(|h| ScheduleBreakpoint::new(at(h, 30), Mode::Discharge))
            .collect();
        service.submit(old.clone()).await.unwrap();

        let reader = {
            let service = service.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    let snapshot = service.snapshot().unwrap();
                    assert!(snapshot.as_ref() == old.as_slice() || snapshot.len() == 4);
                    assert!(snapshot.iter().all(|b| b.mode == snapshot[0].mode));
                    tokio::task::yield_now().await;
                }
            })
        };

        service.submit(new.clone()).await.unwrap();
        reader.await.unwrap();
        assert_eq!(service.snapshot().unwrap().as_ref(), new.as_slice());
    }
}
