use crate::application::ports::{RemoteError, RemoteStore};
use crate::domain::entities::ActionRecord;
use crate::domain::value_objects::{ActionKind, EntityId};
use crate::shared::error::SyncError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Debug)]
pub enum DispatchOutcome {
    /// The remote store accepted the action. Creates report the id the remote store assigned.
    Delivered { remote_id: Option<EntityId> },
    /// Either `SyncError::TransientDelivery` or `SyncError::PermanentDelivery`.
    Failed(SyncError),
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered { .. })
    }
}

/// Applies single actions to the remote store, each bounded by `timeout`.
pub struct Dispatcher {
    remote: Arc<dyn RemoteStore>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(remote: Arc<dyn RemoteStore>, timeout: Duration) -> Self {
        Self { remote, timeout }
    }

    pub async fn apply(&self, record: &ActionRecord) -> DispatchOutcome {
        let call = async {
            match record.kind {
                ActionKind::Create => self
                    .remote
                    .create(&record.entity, &record.payload)
                    .await
                    .map(Some),
                ActionKind::Update => self
                    .remote
                    .update(&record.entity, &record.entity_id, &record.payload)
                    .await
                    .map(|_| None),
                ActionKind::Delete => self
                    .remote
                    .delete(&record.entity, &record.entity_id)
                    .await
                    .map(|_| None),
            }
        };

        match timeout(self.timeout, call).await {
            Ok(Ok(remote_id)) => DispatchOutcome::Delivered { remote_id },
            Ok(Err(RemoteError::Transient(reason))) => {
                DispatchOutcome::Failed(SyncError::TransientDelivery(reason))
            }
            Ok(Err(RemoteError::Permanent(reason))) => {
                DispatchOutcome::Failed(SyncError::PermanentDelivery(reason))
            }
            Err(_) => DispatchOutcome::Failed(SyncError::TransientDelivery(format!(
                "remote {} of {} {} timed out after {}ms",
                record.kind,
                record.entity,
                record.entity_id,
                self.timeout.as_millis()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ActionInput;
    use crate::domain::value_objects::{ActionId, ActionPayload, EntityKind};
    use async_trait::async_trait;
    use mockall::{mock, predicate::*};

    mock! {
        pub Remote {}

        #[async_trait]
        impl RemoteStore for Remote {
            async fn create(
                &self,
                entity: &EntityKind,
                fields: &ActionPayload,
            ) -> Result<EntityId, RemoteError>;
            async fn update(
                &self,
                entity: &EntityKind,
                id: &EntityId,
                fields: &ActionPayload,
            ) -> Result<(), RemoteError>;
            async fn delete(&self, entity: &EntityKind, id: &EntityId) -> Result<(), RemoteError>;
        }
    }

    fn record(input: ActionInput) -> ActionRecord {
        ActionRecord::from_input(input, ActionId::generate(), 0)
    }

    fn entity_id(value: &str) -> EntityId {
        EntityId::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn create_passes_payload_and_returns_remote_id() {
        let mut remote = MockRemote::new();
        remote
            .expect_create()
            .withf(|entity, fields| {
                *entity == EntityKind::Task
                    && fields.get("title").and_then(|v| v.as_str()) == Some("Buy milk")
            })
            .times(1)
            .returning(|_, _| Ok(EntityId::new("t-100".into()).unwrap()));

        let dispatcher = Dispatcher::new(Arc::new(remote), Duration::from_secs(1));
        let outcome = dispatcher
            .apply(&record(ActionInput::create(
                EntityKind::Task,
                entity_id("temp-1"),
                ActionPayload::default().with("title", "Buy milk"),
            )))
            .await;

        match outcome {
            DispatchOutcome::Delivered { remote_id } => {
                assert_eq!(remote_id, Some(entity_id("t-100")));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_and_delete_target_entity_id() {
        let mut remote = MockRemote::new();
        remote
            .expect_update()
            .with(eq(EntityKind::Task), eq(entity_id("t1")), always())
            .times(1)
            .returning(|_, _, _| Ok(()));
        remote
            .expect_delete()
            .with(eq(EntityKind::TaskList), eq(entity_id("l1")))
            .times(1)
            .returning(|_, _| Ok(()));

        let dispatcher = Dispatcher::new(Arc::new(remote), Duration::from_secs(1));
        let update = dispatcher
            .apply(&record(ActionInput::update(
                EntityKind::Task,
                entity_id("t1"),
                ActionPayload::default().with("completed", true),
            )))
            .await;
        let delete = dispatcher
            .apply(&record(ActionInput::delete(
                EntityKind::TaskList,
                entity_id("l1"),
            )))
            .await;

        assert!(update.is_delivered());
        assert!(delete.is_delivered());
    }

    #[tokio::test]
    async fn classifies_remote_errors() {
        let mut remote = MockRemote::new();
        remote
            .expect_delete()
            .returning(|_, _| Err(RemoteError::Permanent("not found".into())));
        remote
            .expect_update()
            .returning(|_, _, _| Err(RemoteError::Transient("503".into())));

        let dispatcher = Dispatcher::new(Arc::new(remote), Duration::from_secs(1));
        let delete = dispatcher
            .apply(&record(ActionInput::delete(EntityKind::Task, entity_id("t1"))))
            .await;
        let update = dispatcher
            .apply(&record(ActionInput::update(
                EntityKind::Task,
                entity_id("t1"),
                ActionPayload::default(),
            )))
            .await;

        assert!(matches!(
            delete,
            DispatchOutcome::Failed(SyncError::PermanentDelivery(_))
        ));
        assert!(matches!(
            update,
            DispatchOutcome::Failed(SyncError::TransientDelivery(_))
        ));
    }

    struct StalledRemote;

    #[async_trait]
    impl RemoteStore for StalledRemote {
        async fn create(
            &self,
            _entity: &EntityKind,
            _fields: &ActionPayload,
        ) -> Result<EntityId, RemoteError> {
            std::future::pending().await
        }

        async fn update(
            &self,
            _entity: &EntityKind,
            _id: &EntityId,
            _fields: &ActionPayload,
        ) -> Result<(), RemoteError> {
            std::future::pending().await
        }

        async fn delete(&self, _entity: &EntityKind, _id: &EntityId) -> Result<(), RemoteError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_a_transient_failure() {
        let dispatcher = Dispatcher::new(Arc::new(StalledRemote), Duration::from_millis(250));
        let outcome = dispatcher
            .apply(&record(ActionInput::delete(EntityKind::Task, entity_id("t1"))))
            .await;

        match outcome {
            DispatchOutcome::Failed(err) => {
                assert!(err.is_transient());
                assert!(err.to_string().contains("timed out after 250ms"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
