//! Note list screen.

use std::collections::VecDeque;

use crate::models::Note;
use crate::repository::NoteRepository;
use crate::screens::user_message;

/// What the list does around a delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Delete, then reload the whole list whatever the outcome.
    #[default]
    Reload,
    /// Remove the row at once; reload only if the delete fails.
    Optimistic,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListState {
    pub notes: Vec<Note>,
    pub error_message: Option<String>,
    pub loading: bool,
    /// Id of the delete in flight, if any.
    pub deleting: Option<String>,
    pub delete_policy: DeletePolicy,
}

impl ListState {
    #[must_use]
    pub fn with_delete_policy(delete_policy: DeletePolicy) -> Self {
        Self {
            delete_policy,
            ..Self::default()
        }
    }

    /// Nothing to show and nothing loading.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && !self.loading
    }

    /// Whether the delete control for `id` should be enabled.
    #[must_use]
    pub fn can_delete(&self, id: &str) -> bool {
        self.deleting.is_none() && self.notes.iter().any(|note| note.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    Mounted,
    Refresh,
    NotesLoaded(Result<Vec<Note>, String>),
    DeleteRequested { id: String },
    DeleteCompleted { id: String, result: Result<(), String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEffect {
    LoadNotes,
    DeleteNote { id: String },
}

fn start_load(mut state: ListState) -> (ListState, Vec<ListEffect>) {
    state.loading = true;
    (state, vec![ListEffect::LoadNotes])
}

/// Pure list transition.
#[must_use]
pub fn reduce(mut state: ListState, event: ListEvent) -> (ListState, Vec<ListEffect>) {
    match event {
        ListEvent::Mounted | ListEvent::Refresh => {
            state.error_message = None;
            start_load(state)
        }
        ListEvent::NotesLoaded(_) if !state.loading => (state, Vec::new()),
        ListEvent::NotesLoaded(result) => {
            state.loading = false;
            match result {
                Ok(notes) => state.notes = notes,
                Err(message) => state.error_message = Some(message),
            }
            (state, Vec::new())
        }
        ListEvent::DeleteRequested { id } => {
            if id.trim().is_empty() || state.deleting.is_some() {
                return (state, Vec::new());
            }
            if state.delete_policy == DeletePolicy::Optimistic {
                state.notes.retain(|note| note.id != id);
            }
            state.error_message = None;
            state.deleting = Some(id.clone());
            (state, vec![ListEffect::DeleteNote { id }])
        }
        ListEvent::DeleteCompleted { id, .. } if state.deleting.as_deref() != Some(id.as_str()) => {
            (state, Vec::new())
        }
        ListEvent::DeleteCompleted { result, .. } => {
            state.deleting = None;
            match (state.delete_policy, result) {
                (DeletePolicy::Optimistic, Ok(())) => (state, Vec::new()),
                (_, Ok(())) => start_load(state),
                (_, Err(message)) => {
                    state.error_message = Some(message);
                    start_load(state)
                }
            }
        }
    }
}

/// Drives [`ListState`] against a repository.
#[derive(Debug)]
pub struct ListController<R> {
    repository: R,
    state: ListState,
}

impl<R: NoteRepository> ListController<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            state: ListState::default(),
        }
    }

    #[must_use]
    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.state.delete_policy = policy;
        self
    }

    pub const fn state(&self) -> &ListState {
        &self.state
    }

    pub const fn repository(&self) -> &R {
        &self.repository
    }

    pub async fn mount(&mut self) {
        self.dispatch(ListEvent::Mounted).await;
    }

    pub async fn refresh(&mut self) {
        self.dispatch(ListEvent::Refresh).await;
    }

    pub async fn delete(&mut self, id: impl Into<String>) {
        self.dispatch(ListEvent::DeleteRequested { id: id.into() })
            .await;
    }

    /// Feed `event` through the reducer and run effects until none remain.
    pub async fn dispatch(&mut self, event: ListEvent) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            let (state, effects) = reduce(std::mem::take(&mut self.state), event);
            self.state = state;
            for effect in effects {
                queue.push_back(self.run(effect).await);
            }
        }
    }

    async fn run(&self, effect: ListEffect) -> ListEvent {
        tracing::debug!(?effect, "Running list effect");
        match effect {
            ListEffect::LoadNotes => {
                let result = self.repository.list().await.map_err(|error| {
                    tracing::warn!(%error, "Failed to load notes");
                    user_message(&error)
                });
                ListEvent::NotesLoaded(result)
            }
            ListEffect::DeleteNote { id } => {
                let result = self.repository.delete(&id).await.map_err(|error| {
                    tracing::warn!(id = %id, %error, "Failed to delete note");
                    user_message(&error)
                });
                ListEvent::DeleteCompleted { id, result }
            }
        }
    }
}
