use std::path::Path;

use stickies_core::screens::{FormController, FormEvent};
use stickies_core::{NoteRepository, PickedImage};

use crate::commands::common::submit_form;
use crate::error::CliError;

pub async fn run_add<R: NoteRepository>(
    repository: R,
    title: &str,
    content: &str,
    image_path: Option<&Path>,
) -> Result<(), CliError> {
    let picked = match image_path {
        Some(path) => Some(PickedImage::from_path(path).await?),
        None => None,
    };

    let mut form = FormController::add(repository);
    form.mount().await;
    form.dispatch(FormEvent::TitleChanged(title.to_string()))
        .await;
    form.dispatch(FormEvent::ContentChanged(content.to_string()))
        .await;
    if let Some(image) = picked {
        form.dispatch(FormEvent::ImagePicked(image)).await;
    }

    let note = submit_form(&mut form).await?;
    println!("{}", note.id);
    Ok(())
}
