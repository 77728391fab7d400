//! Task board view-model.
//!
//! Holds the tasks loaded from the task service and derives the five lifecycle columns
//! from them on demand. Writes go straight to the backend; callers reload afterwards.

use crate::api::{PatientApi, TaskApi};
use crate::constants::EMPTY_COLUMN_PLACEHOLDER;
use crate::filters::TaskFilter;
use crate::lifecycle::EstadoTarea;
use crate::reconcile::{reconcile_patient, Reconciliation, TaskForm};
use crate::reminder::Reminder;
use crate::session::SessionStore;
use crate::task::{sort_history, HistoryEntry, Task, TaskPayload};
use crate::{DeskError, DeskResult};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

/// One lifecycle column.
#[derive(Debug)]
pub struct BoardColumn<'a> {
    pub estado: EstadoTarea,
    pub tasks: Vec<&'a Task>,
}

impl BoardColumn<'_> {
    /// Text shown in place of cards when the column is empty.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.tasks.is_empty().then_some(EMPTY_COLUMN_PLACEHOLDER)
    }
}

/// Result of saving the task dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveOutcome {
    pub patient: Reconciliation,
    /// `true` when an existing task was updated rather than created.
    pub updated: bool,
}

/// Single-flight guard for the save action.
#[derive(Debug, Default)]
struct SubmitLock(AtomicBool);

struct SubmitGuard<'a>(&'a AtomicBool);

impl SubmitLock {
    fn try_acquire(&self) -> Option<SubmitGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmitGuard(&self.0))
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default)]
pub struct TaskBoard {
    tasks: Vec<Task>,
    submit_lock: SubmitLock,
}

impl TaskBoard {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            submit_lock: SubmitLock::default(),
        }
    }

    /// Fetch every task.
    ///
    /// A 401/403 clears the stored session before the error is returned.
    pub async fn load(api: &dyn TaskApi, session: &SessionStore) -> DeskResult<Self> {
        let mut board = Self::default();
        board.refresh(api, session).await?;
        Ok(board)
    }

    /// Replace the in-memory tasks with a fresh fetch.
    pub async fn refresh(&mut self, api: &dyn TaskApi, session: &SessionStore) -> DeskResult<()> {
        match api.list().await {
            Ok(tasks) => {
                tracing::debug!(count = tasks.len(), "tasks loaded");
                self.tasks = tasks;
                Ok(())
            }
            Err(e) if e.is_auth_failure() => {
                tracing::warn!("task service rejected the session; logging out");
                session.clear()?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Partition the filtered tasks into the five columns, in lifecycle order.
    pub fn columns(&self, filter: &TaskFilter) -> Vec<BoardColumn<'_>> {
        let visible = filter.apply(&self.tasks);
        EstadoTarea::ALL
            .into_iter()
            .map(|estado| BoardColumn {
                estado,
                tasks: visible
                    .iter()
                    .copied()
                    .filter(|t| t.estado == estado)
                    .collect(),
            })
            .collect()
    }

    pub fn find(&self, id: i64) -> DeskResult<&Task> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| DeskError::NotFound {
                resource: "task",
                key: id.to_string(),
            })
    }

    /// Distinct specialties of the loaded tasks, sorted.
    pub fn especialidades(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter_map(|t| t.especialidad.as_deref())
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Move a task one step along the lifecycle.
    ///
    /// Sends the whole task with only `estado` changed. For a completed task nothing is sent
    /// and `Ok(None)` is returned.
    pub async fn advance(&self, api: &dyn TaskApi, id: i64) -> DeskResult<Option<EstadoTarea>> {
        let task = self.find(id)?;
        let Some(next) = task.estado.next() else {
            tracing::debug!(task_id = id, "task already completed");
            return Ok(None);
        };
        api.update(id, &TaskPayload::from_task(task, next)).await?;
        tracing::info!(task_id = id, from = %task.estado, to = %next, "task advanced");
        Ok(Some(next))
    }

    /// Save the task dialog: reconcile the patient, then create or update the task.
    ///
    /// # Errors
    ///
    /// - `SaveInProgress` if another save is still running
    /// - `InvalidTransition` if an edited task would skip or go back a state
    /// - reconciliation and write errors from the services
    pub async fn save(
        &self,
        patients: &dyn PatientApi,
        tasks: &dyn TaskApi,
        form: &TaskForm,
    ) -> DeskResult<SaveOutcome> {
        let _guard = self
            .submit_lock
            .try_acquire()
            .ok_or(DeskError::SaveInProgress)?;

        if let Some(id) = form.editing {
            let current = self.find(id)?.estado;
            let target = form.estado();
            if !current.can_transition_to(target) {
                return Err(DeskError::InvalidTransition {
                    task_id: id,
                    from: current,
                    to: target,
                });
            }
        }

        let patient = reconcile_patient(patients, &form.patient).await?;
        let payload = form.to_payload(&patient.numero);
        match form.editing {
            Some(id) => {
                tasks.update(id, &payload).await?;
                tracing::info!(task_id = id, "task updated");
            }
            None => {
                tasks.create(&payload).await?;
                tracing::info!(patient = %patient.numero, "task created");
            }
        }
        Ok(SaveOutcome {
            patient,
            updated: form.editing.is_some(),
        })
    }

    /// Delete a task on the backend and drop it from the board.
    pub async fn delete(&mut self, api: &dyn TaskApi, id: i64) -> DeskResult<()> {
        self.find(id)?;
        api.delete(id).await?;
        self.tasks.retain(|t| t.id != id);
        tracing::info!(task_id = id, "task deleted");
        Ok(())
    }

    /// State-change history of a task, oldest first.
    pub async fn history(api: &dyn TaskApi, id: i64) -> DeskResult<Vec<HistoryEntry>> {
        let mut entries = api.history(id).await?;
        sort_history(&mut entries);
        Ok(entries)
    }

    pub fn reminder(&self) -> Reminder {
        Reminder::evaluate(&self.tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fakes::{FakePatients, FakeTasks, TaskCall};
    use crate::reconcile::PatientForm;
    use crate::task::tests::sample_task;
    use tempfile::TempDir;

    fn board_of(states: &[EstadoTarea]) -> TaskBoard {
        TaskBoard::new(
            states
                .iter()
                .enumerate()
                .map(|(i, s)| sample_task(i as i64 + 1, *s))
                .collect(),
        )
    }

    #[tokio::test]
    async fn advance_sends_exactly_the_successor() {
        for estado in EstadoTarea::ALL {
            let board = board_of(&[estado]);
            let api = FakeTasks::default();
            let result = board.advance(&api, 1).await.unwrap();
            assert_eq!(result, estado.next());
            match estado.next() {
                Some(next) => {
                    let expected = TaskPayload::from_task(&board.tasks()[0], next);
                    assert_eq!(api.calls(), vec![TaskCall::Update(1, expected)]);
                }
                None => assert!(api.calls().is_empty()),
            }
        }
    }

    #[tokio::test]
    async fn advance_keeps_every_other_field() {
        let board = board_of(&[EstadoTarea::Pendiente]);
        let api = FakeTasks::default();
        board.advance(&api, 1).await.unwrap();
        let TaskCall::Update(_, sent) = &api.calls()[0] else {
            panic!("expected an update");
        };
        let mut expected = TaskPayload::from_task(&board.tasks()[0], EstadoTarea::Pendiente);
        expected.estado = EstadoTarea::EnProgreso;
        assert_eq!(*sent, expected);
    }

    #[test]
    fn columns_follow_lifecycle_order_with_placeholders() {
        let board = board_of(&[
            EstadoTarea::Enviada,
            EstadoTarea::Pendiente,
            EstadoTarea::Pendiente,
        ]);
        let columns = board.columns(&TaskFilter::default());
        let order: Vec<_> = columns.iter().map(|c| c.estado).collect();
        assert_eq!(order, EstadoTarea::ALL.to_vec());
        assert_eq!(columns[0].tasks.len(), 2);
        assert_eq!(columns[1].placeholder(), Some("No hay tareas"));
        assert_eq!(columns[3].placeholder(), None);
    }

    #[tokio::test]
    async fn load_takes_every_task_from_the_service() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let api = FakeTasks::with(vec![
            sample_task(1, EstadoTarea::Pendiente),
            sample_task(2, EstadoTarea::Enviada),
            sample_task(3, EstadoTarea::EnProgreso),
        ]);
        let board = TaskBoard::load(&api, &store).await.unwrap();
        let ids: Vec<i64> = board.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let reminder = board.reminder();
        assert_eq!((reminder.pendientes, reminder.en_progreso), (1, 1));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn unauthorized_load_clears_session() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store
            .save(&crate::session::Session {
                token: "t".into(),
                user_info: Default::default(),
            })
            .unwrap();
        let api = FakeTasks {
            list_status: Some(401),
            ..Default::default()
        };
        let err = TaskBoard::load(&api, &store).await.unwrap_err();
        assert!(err.is_auth_failure());
        assert!(store.load().unwrap().is_none());

        let other = FakeTasks {
            list_status: Some(500),
            ..Default::default()
        };
        store
            .save(&crate::session::Session {
                token: "t".into(),
                user_info: Default::default(),
            })
            .unwrap();
        assert!(TaskBoard::load(&other, &store).await.is_err());
        assert!(store.load().unwrap().is_some());
    }

    fn new_task_form() -> TaskForm {
        TaskForm {
            patient: PatientForm {
                numero_identificacion: "555".into(),
                nombre_completo: Some("Rosa Díaz".into()),
                ..Default::default()
            },
            especialidad: Some("Ortopedia".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn save_creates_patient_then_task() {
        let board = TaskBoard::default();
        let patients = FakePatients::default();
        let tasks = FakeTasks::default();
        let outcome = board
            .save(&patients, &tasks, &new_task_form())
            .await
            .unwrap();
        assert!(!outcome.updated);
        assert_eq!(patients.writes().len(), 1);
        match &tasks.calls()[..] {
            [TaskCall::Create(p)] => {
                assert_eq!(p.paciente_numero_identificacion.as_deref(), Some("555"));
                assert_eq!(p.estado, EstadoTarea::Pendiente);
            }
            other => panic!("unexpected task calls: {other:?}"),
        }
    }

    #[tokio::test]
    async fn edited_task_cannot_skip_states() {
        let board = board_of(&[EstadoTarea::Pendiente]);
        let mut form = TaskForm::from_task(&board.tasks()[0]);
        form.estado = Some(EstadoTarea::Enviada);
        let patients = FakePatients::default();
        let tasks = FakeTasks::default();
        let err = board.save(&patients, &tasks, &form).await.unwrap_err();
        assert!(matches!(
            err,
            DeskError::InvalidTransition {
                task_id: 1,
                from: EstadoTarea::Pendiente,
                to: EstadoTarea::Enviada
            }
        ));
        assert!(patients.calls().is_empty());
        assert!(tasks.calls().is_empty());
    }

    #[tokio::test]
    async fn concurrent_save_is_refused() {
        let board = TaskBoard::default();
        let _held = board.submit_lock.try_acquire().unwrap();
        let err = board
            .save(&FakePatients::default(), &FakeTasks::default(), &new_task_form())
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::SaveInProgress));
    }

    #[tokio::test]
    async fn lock_is_released_after_a_failed_save() {
        let board = TaskBoard::default();
        let mut form = new_task_form();
        form.patient.numero_identificacion.clear();
        assert!(board
            .save(&FakePatients::default(), &FakeTasks::default(), &form)
            .await
            .is_err());
        assert!(board.submit_lock.try_acquire().is_some());
    }

    #[tokio::test]
    async fn delete_removes_task() {
        let mut board = board_of(&[EstadoTarea::Pendiente, EstadoTarea::Enviada]);
        let api = FakeTasks::default();
        board.delete(&api, 2).await.unwrap();
        assert_eq!(board.tasks().len(), 1);
        assert!(matches!(
            board.delete(&api, 9).await,
            Err(DeskError::NotFound { .. })
        ));
        assert_eq!(api.calls(), vec![TaskCall::Delete(2)]);
    }

    #[test]
    fn specialties_are_distinct_and_sorted() {
        let mut board = board_of(&[EstadoTarea::Pendiente, EstadoTarea::Pendiente]);
        board.tasks[1].especialidad = Some("Cardiología".into());
        board.tasks[0].especialidad = Some("  ".into());
        let mut extra = sample_task(3, EstadoTarea::Enviada);
        extra.especialidad = Some("Cardiología".into());
        board.tasks.push(extra);
        assert_eq!(board.especialidades(), vec!["Cardiología".to_string()]);
    }
}
