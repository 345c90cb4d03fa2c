use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};

use crate::core::config::NotificationConfig;
use crate::features::cases::models::Case;
use crate::features::notifications::services::NotificationService;

/// Background notification work, enqueued only after the originating commit
#[derive(Debug, Clone)]
pub enum DispatchJob {
    CaseCreated(Case),
}

impl DispatchJob {
    fn describe(&self) -> String {
        match self {
            DispatchJob::CaseCreated(case) => format!("new {} {}", case.kind, case.id),
        }
    }
}

/// Producer side of the notification queue.
///
/// Jobs are drained by a fixed pool of workers. A full queue never blocks
/// the caller: the job is handed to a task that waits for capacity.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::Sender<DispatchJob>,
}

impl NotificationDispatcher {
    /// Start the worker pool and return the producer handle
    pub fn spawn(config: &NotificationConfig, service: Arc<NotificationService>) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        for worker_id in 0..config.workers.max(1) {
            let worker = NotificationWorker {
                id: worker_id,
                receiver: receiver.clone(),
                service: service.clone(),
            };
            tokio::spawn(worker.run());
        }

        tracing::info!(
            "Notification dispatcher started with {} workers, queue capacity {}",
            config.workers.max(1),
            config.queue_capacity.max(1)
        );

        Self { sender }
    }

    pub fn enqueue(&self, job: DispatchJob) {
        match self.sender.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                tracing::warn!("Notification queue full; deferring {}", job.describe());
                let sender = self.sender.clone();
                tokio::spawn(async move {
                    if let Err(e) = sender.send(job).await {
                        tracing::error!("Dropped notification job {}: queue closed", e.0.describe());
                    }
                });
            }
            Err(TrySendError::Closed(job)) => {
                tracing::error!(
                    "Dropped notification job {}: queue closed",
                    job.describe()
                );
            }
        }
    }
}

struct NotificationWorker {
    id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<DispatchJob>>>,
    service: Arc<NotificationService>,
}

impl NotificationWorker {
    async fn run(self) {
        tracing::debug!("Notification worker {} started", self.id);

        loop {
            let job = { self.receiver.lock().await.recv().await };
            let Some(job) = job else {
                break;
            };

            let description = job.describe();
            let outcome = AssertUnwindSafe(self.process(job)).catch_unwind().await;
            match outcome {
                Ok(()) => {}
                Err(_) => tracing::error!(
                    "Notification worker {} panicked while handling {}",
                    self.id,
                    description
                ),
            }
        }

        tracing::debug!("Notification worker {} stopped", self.id);
    }

    async fn process(&self, job: DispatchJob) {
        match job {
            DispatchJob::CaseCreated(case) => {
                if let Err(e) = self.service.notify_case_created(&case).await {
                    tracing::error!(
                        "Failed to notify staff of new {} {}: {:?}",
                        case.kind,
                        case.id,
                        e
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::Role;
    use crate::features::cases::models::{ApologyCategory, CaseCategory, NewCase};
    use crate::modules::store::{CaseStore, StoreTransaction};
    use crate::shared::test_helpers::{wait_for_notifications, MemoryCaseStore};
    use uuid::Uuid;

    async fn apology(store: &MemoryCaseStore, owner_id: Uuid) -> Case {
        let mut tx = store.begin().await.unwrap();
        let case = tx
            .insert_case(NewCase {
                id: Uuid::new_v4(),
                owner_id,
                student_identifier: None,
                category: CaseCategory::Apology(ApologyCategory::Outing),
                title: None,
                description: "Returned late".to_string(),
                details: None,
                priority: None,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        case
    }

    #[tokio::test]
    async fn test_jobs_are_processed_in_background() {
        let store = MemoryCaseStore::new();
        let student = store.add_student("D").await;
        let admin = store.add_account(Role::Admin, Some("D")).await;
        let case = apology(&store, student.id).await;

        let service = Arc::new(NotificationService::new(Arc::new(store.clone())));
        let dispatcher = NotificationDispatcher::spawn(&NotificationConfig::default(), service);
        dispatcher.enqueue(DispatchJob::CaseCreated(case));

        let delivered = wait_for_notifications(&store, admin.id, 1).await;
        assert!(delivered);
        assert_eq!(
            store.snapshot().await.notifications_for(admin.id)[0].title,
            "New Apology Submitted"
        );
    }

    #[tokio::test]
    async fn test_full_queue_defers_instead_of_dropping() {
        let store = MemoryCaseStore::new();
        let student = store.add_student("E").await;
        let admin = store.add_account(Role::Admin, Some("E")).await;

        let service = Arc::new(NotificationService::new(Arc::new(store.clone())));
        let config = NotificationConfig {
            queue_capacity: 1,
            workers: 1,
        };
        let dispatcher = NotificationDispatcher::spawn(&config, service);

        for _ in 0..5 {
            let case = apology(&store, student.id).await;
            dispatcher.enqueue(DispatchJob::CaseCreated(case));
        }

        let delivered = wait_for_notifications(&store, admin.id, 5).await;
        assert!(delivered);
    }

    #[tokio::test]
    async fn test_worker_survives_failed_job() {
        let store = MemoryCaseStore::new();
        let student = store.add_student("F").await;
        let admin = store.add_account(Role::Admin, Some("F")).await;

        let service = Arc::new(NotificationService::new(Arc::new(store.clone())));
        let config = NotificationConfig {
            queue_capacity: 4,
            workers: 1,
        };
        let dispatcher = NotificationDispatcher::spawn(&config, service);

        store.set_fail_notification_inserts(true).await;
        dispatcher.enqueue(DispatchJob::CaseCreated(apology(&store, student.id).await));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        store.set_fail_notification_inserts(false).await;
        dispatcher.enqueue(DispatchJob::CaseCreated(apology(&store, student.id).await));

        let delivered = wait_for_notifications(&store, admin.id, 1).await;
        assert!(delivered);
    }
}
