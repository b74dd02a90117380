//! Add/edit note form.
//!
//! Submitting runs as a chain of effects: upload the picked image (if any),
//! then save the note carrying the resolved image URL, then navigate back. A
//! failed upload ends the chain before the save is issued, and any failure
//! leaves the entered fields and the picked image in place for a retry.

use std::collections::VecDeque;

use crate::models::{validate_required, Note, PickedImage};
use crate::repository::NoteRepository;
use crate::screens::{user_message, NOTE_NOT_FOUND_MESSAGE};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormMode {
    #[default]
    Add,
    Edit {
        id: String,
    },
}

/// Operation the form is waiting on. Submit is disabled while one is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOp {
    Loading,
    Uploading,
    Saving,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub mode: FormMode,
    pub title: String,
    pub content: String,
    pub picked_image: Option<PickedImage>,
    pub existing_image_url: Option<String>,
    pub error_message: Option<String>,
    pub pending: Option<PendingOp>,
    /// Edit mode only: the note being edited was read back from the store.
    pub loaded: bool,
    /// Set once a save succeeded.
    pub saved: Option<Note>,
}

/// Image the form should preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource<'a> {
    Picked(&'a PickedImage),
    Remote(&'a str),
}

impl FormState {
    #[must_use]
    pub fn add() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn edit(id: impl Into<String>) -> Self {
        Self {
            mode: FormMode::Edit { id: id.into() },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// An edit form has nothing to save until its note loaded.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.mode, FormMode::Add) || self.loaded
    }

    /// Both fields filled in, the note loaded and nothing in flight.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.is_ready()
            && !self.is_pending()
            && validate_required(&self.title, &self.content).is_ok()
    }

    /// A freshly picked image wins over the note's current one.
    #[must_use]
    pub fn display_image(&self) -> Option<ImageSource<'_>> {
        self.picked_image.as_ref().map_or_else(
            || self.existing_image_url.as_deref().map(ImageSource::Remote),
            |image| Some(ImageSource::Picked(image)),
        )
    }

    /// Note to persist, with `image_url` already resolved.
    #[must_use]
    pub fn note_with_image(&self, image_url: Option<String>) -> Note {
        let id = match &self.mode {
            FormMode::Add => String::new(),
            FormMode::Edit { id } => id.clone(),
        };
        Note {
            id,
            title: self.title.clone(),
            content: self.content.clone(),
            image_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    Mounted,
    TitleChanged(String),
    ContentChanged(String),
    ImagePicked(PickedImage),
    ImageCleared,
    Submit,
    NoteLoaded(Result<Option<Note>, String>),
    ImageUploaded(Result<String, String>),
    NoteSaved(Result<Note, String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEffect {
    LoadNote { id: String },
    UploadImage(PickedImage),
    SaveNote(Note),
    NavigateBack,
}

/// What the caller should do after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Stay,
    Back,
}

fn fail(mut state: FormState, message: String) -> (FormState, Vec<FormEffect>) {
    state.pending = None;
    state.error_message = Some(message);
    (state, Vec::new())
}

fn expects(state: &FormState, op: PendingOp) -> bool {
    state.pending == Some(op)
}

/// Pure form transition.
#[must_use]
pub fn reduce(mut state: FormState, event: FormEvent) -> (FormState, Vec<FormEffect>) {
    match event {
        FormEvent::Mounted => match state.mode.clone() {
            FormMode::Add => (state, Vec::new()),
            FormMode::Edit { id } => {
                state.loaded = false;
                state.pending = Some(PendingOp::Loading);
                (state, vec![FormEffect::LoadNote { id }])
            }
        },
        FormEvent::TitleChanged(title) => {
            state.title = title;
            (state, Vec::new())
        }
        FormEvent::ContentChanged(content) => {
            state.content = content;
            (state, Vec::new())
        }
        FormEvent::ImagePicked(image) => {
            state.picked_image = Some(image);
            (state, Vec::new())
        }
        FormEvent::ImageCleared => {
            state.picked_image = None;
            state.existing_image_url = None;
            (state, Vec::new())
        }
        FormEvent::Submit if state.is_pending() || !state.is_ready() => (state, Vec::new()),
        FormEvent::Submit => {
            if let Err(error) = validate_required(&state.title, &state.content) {
                return fail(state, user_message(&error));
            }
            state.error_message = None;
            if let Some(image) = state.picked_image.clone() {
                state.pending = Some(PendingOp::Uploading);
                (state, vec![FormEffect::UploadImage(image)])
            } else {
                state.pending = Some(PendingOp::Saving);
                let note = state.note_with_image(state.existing_image_url.clone());
                (state, vec![FormEffect::SaveNote(note)])
            }
        }
        FormEvent::NoteLoaded(_) if !expects(&state, PendingOp::Loading) => (state, Vec::new()),
        FormEvent::NoteLoaded(result) => match result {
            Ok(Some(note)) => {
                state.pending = None;
                state.loaded = true;
                state.title = note.title;
                state.content = note.content;
                state.existing_image_url = note.image_url;
                (state, Vec::new())
            }
            Ok(None) => fail(state, NOTE_NOT_FOUND_MESSAGE.to_string()),
            Err(message) => fail(state, message),
        },
        FormEvent::ImageUploaded(_) if !expects(&state, PendingOp::Uploading) => {
            (state, Vec::new())
        }
        FormEvent::ImageUploaded(result) => match result {
            Ok(url) => {
                state.pending = Some(PendingOp::Saving);
                let note = state.note_with_image(Some(url));
                (state, vec![FormEffect::SaveNote(note)])
            }
            Err(message) => fail(state, message),
        },
        FormEvent::NoteSaved(_) if !expects(&state, PendingOp::Saving) => (state, Vec::new()),
        FormEvent::NoteSaved(result) => match result {
            Ok(note) => {
                state.pending = None;
                state.picked_image = None;
                state.existing_image_url.clone_from(&note.image_url);
                state.mode = FormMode::Edit {
                    id: note.id.clone(),
                };
                state.loaded = true;
                state.saved = Some(note);
                (state, vec![FormEffect::NavigateBack])
            }
            Err(message) => fail(state, message),
        },
    }
}

/// Drives [`FormState`] against a repository.
#[derive(Debug)]
pub struct FormController<R> {
    repository: R,
    state: FormState,
}

impl<R: NoteRepository> FormController<R> {
    pub fn add(repository: R) -> Self {
        Self {
            repository,
            state: FormState::add(),
        }
    }

    pub fn edit(repository: R, id: impl Into<String>) -> Self {
        Self {
            repository,
            state: FormState::edit(id),
        }
    }

    pub const fn state(&self) -> &FormState {
        &self.state
    }

    pub const fn repository(&self) -> &R {
        &self.repository
    }

    pub async fn mount(&mut self) -> Navigation {
        self.dispatch(FormEvent::Mounted).await
    }

    pub async fn submit(&mut self) -> Navigation {
        self.dispatch(FormEvent::Submit).await
    }

    /// Feed `event` through the reducer and run effects until none remain.
    pub async fn dispatch(&mut self, event: FormEvent) -> Navigation {
        let mut navigation = Navigation::Stay;
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            let (state, effects) = reduce(std::mem::take(&mut self.state), event);
            self.state = state;
            for effect in effects {
                match self.run(effect).await {
                    Some(event) => queue.push_back(event),
                    None => navigation = Navigation::Back,
                }
            }
        }
        navigation
    }

    /// Run one effect. `None` means the effect is a signal for the caller.
    async fn run(&self, effect: FormEffect) -> Option<FormEvent> {
        tracing::debug!(?effect, "Running form effect");
        let event = match effect {
            FormEffect::LoadNote { id } => {
                let result = self.repository.get_by_id(&id).await.map_err(|error| {
                    tracing::warn!(id = %id, %error, "Failed to load note");
                    user_message(&error)
                });
                FormEvent::NoteLoaded(result)
            }
            FormEffect::UploadImage(image) => {
                let result = self.repository.upload_image(&image).await.map_err(|error| {
                    tracing::warn!(file = %image.file_name, %error, "Failed to upload image");
                    user_message(&error)
                });
                FormEvent::ImageUploaded(result)
            }
            FormEffect::SaveNote(note) => {
                let result = self.repository.save(&note).await.map_err(|error| {
                    tracing::warn!(id = %note.id, %error, "Failed to save note");
                    user_message(&error)
                });
                FormEvent::NoteSaved(result)
            }
            FormEffect::NavigateBack => return None,
        };
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::repository::{RemoteNoteRepository, DEFAULT_COLLECTION};
    use crate::store::{MemoryBlobStore, MemoryDocumentStore, StoreOp};

    type Repo = RemoteNoteRepository<MemoryDocumentStore, MemoryBlobStore>;

    fn repository() -> (MemoryDocumentStore, MemoryBlobStore, Repo) {
        let store = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new("https://cdn");
        let repository = RemoteNoteRepository::new(store.clone(), blobs.clone());
        (store, blobs, repository)
    }

    fn loaded(id: &str) -> FormState {
        FormState {
            loaded: true,
            ..FormState::edit(id)
        }
    }

    fn image() -> PickedImage {
        PickedImage::new("img1.png", None, vec![0x89, 0x50]).unwrap()
    }

    fn filled(title: &str, content: &str) -> FormState {
        FormState {
            title: title.to_string(),
            content: content.to_string(),
            ..FormState::add()
        }
    }

    #[test]
    fn blank_fields_fail_validation_without_effects() {
        let (state, effects) = reduce(filled("  ", "body"), FormEvent::Submit);
        assert!(effects.is_empty());
        assert_eq!(
            state.error_message.as_deref(),
            Some("Title and content cannot be empty")
        );
        assert!(!state.can_submit());
    }

    #[test]
    fn submit_with_picked_image_uploads_first() {
        let state = FormState {
            picked_image: Some(image()),
            ..filled("Trip", "Pack")
        };
        let (state, effects) = reduce(state, FormEvent::Submit);
        assert_eq!(state.pending, Some(PendingOp::Uploading));
        assert_eq!(effects, vec![FormEffect::UploadImage(image())]);
    }

    #[test]
    fn submit_is_ignored_while_pending() {
        let state = FormState {
            pending: Some(PendingOp::Saving),
            ..filled("a", "b")
        };
        assert!(!state.can_submit());
        let (next, effects) = reduce(state.clone(), FormEvent::Submit);
        assert_eq!(next, state);
        assert!(effects.is_empty());
    }

    #[test]
    fn upload_failure_keeps_fields_and_image() {
        let state = FormState {
            picked_image: Some(image()),
            pending: Some(PendingOp::Uploading),
            ..filled("Trip", "Pack")
        };
        let (state, effects) = reduce(state, FormEvent::ImageUploaded(Err("denied".into())));
        assert!(effects.is_empty());
        assert_eq!(state.pending, None);
        assert_eq!(state.title, "Trip");
        assert_eq!(state.picked_image, Some(image()));
        assert_eq!(state.error_message.as_deref(), Some("denied"));
    }

    #[test]
    fn uploaded_url_replaces_existing_image() {
        let state = FormState {
            existing_image_url: Some("https://cdn/old.png".into()),
            picked_image: Some(image()),
            pending: Some(PendingOp::Uploading),
            ..loaded("n1")
        };
        let (_, effects) = reduce(
            state,
            FormEvent::ImageUploaded(Ok("https://cdn/img1.png".into())),
        );
        let [FormEffect::SaveNote(note)] = effects.as_slice() else {
            panic!("expected a single save, got {effects:?}");
        };
        assert_eq!(note.id, "n1");
        assert_eq!(note.image_url.as_deref(), Some("https://cdn/img1.png"));
    }

    #[test]
    fn missing_note_reports_not_found() {
        let state = FormState {
            pending: Some(PendingOp::Loading),
            ..FormState::edit("gone")
        };
        let (state, _) = reduce(state, FormEvent::NoteLoaded(Ok(None)));
        assert_eq!(state.error_message.as_deref(), Some(NOTE_NOT_FOUND_MESSAGE));
    }

    #[test]
    fn edit_submit_is_ignored_until_note_loads() {
        for outcome in [Ok(None), Err("service unavailable".to_string())] {
            let state = FormState {
                pending: Some(PendingOp::Loading),
                ..FormState::edit("n1")
            };
            let (state, _) = reduce(state, FormEvent::NoteLoaded(outcome));
            let (state, _) = reduce(state, FormEvent::TitleChanged("Typed".into()));
            let (state, _) = reduce(state, FormEvent::ContentChanged("anyway".into()));
            let message = state.error_message.clone();
            assert!(message.is_some());
            assert!(!state.can_submit());

            let (state, effects) = reduce(state, FormEvent::Submit);
            assert!(effects.is_empty());
            assert_eq!(state.pending, None);
            assert_eq!(state.error_message, message);
        }
    }

    #[test]
    fn loaded_edit_form_can_submit() {
        let state = FormState {
            title: "a".into(),
            content: "b".into(),
            ..loaded("n1")
        };
        assert!(state.can_submit());
        let (_, effects) = reduce(state, FormEvent::Submit);
        assert!(matches!(effects.as_slice(), [FormEffect::SaveNote(note)] if note.id == "n1"));
    }

    #[test]
    fn stale_completions_are_ignored() {
        let state = filled("a", "b");
        let (next, effects) = reduce(
            state.clone(),
            FormEvent::NoteSaved(Ok(Note::new("x", "y"))),
        );
        assert_eq!(next, state);
        assert!(effects.is_empty());
    }

    #[test]
    fn display_image_prefers_picked_image() {
        let mut state = FormState {
            existing_image_url: Some("https://cdn/a.png".into()),
            ..FormState::edit("1")
        };
        assert_eq!(
            state.display_image(),
            Some(ImageSource::Remote("https://cdn/a.png"))
        );

        let picked = image();
        state.picked_image = Some(picked.clone());
        assert_eq!(state.display_image(), Some(ImageSource::Picked(&picked)));

        let (state, _) = reduce(state, FormEvent::ImageCleared);
        assert_eq!(state.display_image(), None);
    }

    #[tokio::test]
    async fn add_without_image_creates_note_and_navigates_back() {
        let (store, blobs, repository) = repository();
        let mut form = FormController::add(repository);
        form.dispatch(FormEvent::TitleChanged("Groceries".into())).await;
        form.dispatch(FormEvent::ContentChanged("Milk, eggs".into())).await;

        assert_eq!(form.submit().await, Navigation::Back);
        assert_eq!(blobs.upload_count(), 0);

        let notes = form.repository().list().await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Groceries");
        assert_eq!(notes[0].content, "Milk, eggs");
        assert_eq!(notes[0].image_url, None);
        assert!(!notes[0].id.is_empty());
        assert_eq!(store.calls(StoreOp::Upsert), 1);
    }

    #[tokio::test]
    async fn editing_with_new_image_stores_uploaded_url() {
        let (_, _, repository) = repository();
        let saved = repository
            .save(&Note::new("Groceries", "Milk, eggs"))
            .await
            .unwrap();

        let mut form = FormController::edit(repository, saved.id.clone());
        assert_eq!(form.mount().await, Navigation::Stay);
        assert_eq!(form.state().title, "Groceries");

        form.dispatch(FormEvent::ImagePicked(image())).await;
        assert_eq!(form.submit().await, Navigation::Back);

        let notes = form.repository().list().await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, saved.id);
        assert_eq!(notes[0].image_url.as_deref(), Some("https://cdn/img1.png"));
    }

    #[tokio::test]
    async fn editing_without_new_image_keeps_existing_url() {
        let (_, _, repository) = repository();
        let saved = repository
            .save(&Note::new("A", "B").with_image_url("https://cdn/keep.png"))
            .await
            .unwrap();

        let mut form = FormController::edit(repository, saved.id);
        form.mount().await;
        form.dispatch(FormEvent::TitleChanged("A2".into())).await;
        form.submit().await;

        let notes = form.repository().list().await.unwrap();
        assert_eq!(notes[0].title, "A2");
        assert_eq!(notes[0].image_url.as_deref(), Some("https://cdn/keep.png"));
    }

    #[tokio::test]
    async fn upload_failure_never_reaches_save() {
        let (store, blobs, repository) = repository();
        blobs.fail_uploads("bucket unreachable");
        let mut form = FormController::add(repository);
        form.dispatch(FormEvent::TitleChanged("T".into())).await;
        form.dispatch(FormEvent::ContentChanged("C".into())).await;
        form.dispatch(FormEvent::ImagePicked(image())).await;

        assert_eq!(form.submit().await, Navigation::Stay);
        assert_eq!(store.calls(StoreOp::Upsert), 0);
        assert!(form.state().error_message.is_some());
        assert_eq!(form.state().picked_image, Some(image()));
        assert_eq!(form.state().content, "C");
    }

    #[tokio::test]
    async fn validation_failure_makes_no_store_calls() {
        let (store, blobs, repository) = repository();
        let mut form = FormController::add(repository);
        form.dispatch(FormEvent::ContentChanged("body only".into())).await;

        assert_eq!(form.submit().await, Navigation::Stay);
        assert_eq!(store.total_calls(), 0);
        assert_eq!(blobs.upload_count(), 0);
    }

    #[tokio::test]
    async fn save_failure_shows_message_and_allows_retry() {
        let (store, _, repository) = repository();
        store.fail_on(StoreOp::Upsert, "write rejected");
        let mut form = FormController::add(repository);
        form.dispatch(FormEvent::TitleChanged("T".into())).await;
        form.dispatch(FormEvent::ContentChanged("C".into())).await;

        assert_eq!(form.submit().await, Navigation::Stay);
        assert_eq!(form.state().error_message.as_deref(), Some("write rejected"));
        assert!(form.state().can_submit());

        store.clear_failures();
        assert_eq!(form.submit().await, Navigation::Back);
        assert_eq!(form.repository().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn edit_of_unknown_id_shows_not_found() {
        let (_, _, repository) = repository();
        let mut form = FormController::edit(repository, "nope");
        form.mount().await;
        assert_eq!(
            form.state().error_message.as_deref(),
            Some(NOTE_NOT_FOUND_MESSAGE)
        );
        assert_eq!(form.state().pending, None);
    }

    #[tokio::test]
    async fn edit_of_unknown_id_never_writes() {
        let (store, _, repository) = repository();
        let mut form = FormController::edit(repository, "ghost");
        form.mount().await;
        form.dispatch(FormEvent::TitleChanged("Typed".into())).await;
        form.dispatch(FormEvent::ContentChanged("anyway".into())).await;

        assert!(!form.state().can_submit());
        assert_eq!(form.submit().await, Navigation::Stay);
        assert_eq!(store.calls(StoreOp::Upsert), 0);
        assert!(store.documents(DEFAULT_COLLECTION).is_empty());
    }

    #[tokio::test]
    async fn edit_after_failed_load_never_overwrites() {
        let (store, _, repository) = repository();
        let saved = repository.save(&Note::new("Real", "note")).await.unwrap();
        store.fail_on(StoreOp::Get, "service unavailable");

        let mut form = FormController::edit(repository, saved.id.clone());
        form.mount().await;
        store.clear_failures();
        form.dispatch(FormEvent::TitleChanged("Blind".into())).await;
        form.dispatch(FormEvent::ContentChanged("write".into())).await;

        assert_eq!(form.submit().await, Navigation::Stay);
        assert_eq!(
            form.state().error_message.as_deref(),
            Some("service unavailable")
        );
        assert_eq!(form.repository().get_by_id(&saved.id).await.unwrap(), Some(saved));
    }
}
