//! The track form: editing metadata, replacing audio or cover, and
//! uploading new tracks.
//!
//! A form is plain text fields; [`TrackForm::submit`] validates them and
//! turns them into the API calls to make.

use std::path::{Path, PathBuf};

use crate::api::{NewTrack, TrackDetail, TrackId, TrackUpdate};

/// Largest audio file the server accepts.
pub const MAX_AUDIO_BYTES: u64 = 50 * 1024 * 1024;
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac"];
const COVER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Genre,
    Tags,
    AiProvider,
    AiModel,
    CoverUrl,
    AudioFile,
    CoverFile,
}

impl FormField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Description => "Description",
            Self::Genre => "Genre",
            Self::Tags => "Tags",
            Self::AiProvider => "AI provider",
            Self::AiModel => "AI model",
            Self::CoverUrl => "Cover URL",
            Self::AudioFile => "Audio file",
            Self::CoverFile => "Cover image",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormTarget {
    Edit(TrackId),
    Upload,
}

/// What a valid form asks for.
#[derive(Clone, Debug, PartialEq)]
pub enum Submission {
    Edit {
        id: TrackId,
        /// Only the fields that changed.
        update: TrackUpdate,
        audio: Option<PathBuf>,
        cover: Option<PathBuf>,
    },
    Upload(NewTrack),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackForm {
    pub target: FormTarget,
    pub fields: Vec<(FormField, String)>,
    pub focus: usize,
    initial: Vec<(FormField, String)>,
}

impl TrackForm {
    /// Form prefilled from `detail`. The file fields start empty and are
    /// only used when filled in.
    pub fn edit(detail: &TrackDetail) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let fields = vec![
            (FormField::Title, detail.summary.title.clone()),
            (FormField::Description, text(&detail.summary.description)),
            (FormField::Genre, text(&detail.genre)),
            (FormField::Tags, text(&detail.tags)),
            (FormField::AiProvider, text(&detail.ai_provider)),
            (FormField::AiModel, text(&detail.ai_model)),
            (FormField::CoverUrl, text(&detail.summary.cover_url)),
            (FormField::AudioFile, String::new()),
            (FormField::CoverFile, String::new()),
        ];
        Self {
            target: FormTarget::Edit(detail.summary.id),
            initial: fields.clone(),
            fields,
            focus: 0,
        }
    }

    pub fn upload() -> Self {
        let fields: Vec<(FormField, String)> = [
            FormField::AudioFile,
            FormField::Title,
            FormField::Description,
            FormField::Genre,
            FormField::Tags,
            FormField::AiProvider,
            FormField::AiModel,
            FormField::CoverUrl,
        ]
        .into_iter()
        .map(|f| (f, String::new()))
        .collect();
        Self {
            target: FormTarget::Upload,
            initial: fields.clone(),
            fields,
            focus: 0,
        }
    }

    pub fn value(&self, field: FormField) -> &str {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map_or("", |(_, v)| v.as_str())
    }

    fn trimmed(&self, field: FormField) -> &str {
        self.value(field).trim()
    }

    pub fn focused(&self) -> FormField {
        self.fields[self.focus].0
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        self.focus = self.focus.checked_sub(1).unwrap_or(self.fields.len() - 1);
    }

    pub fn push_char(&mut self, c: char) {
        self.fields[self.focus].1.push(c);
    }

    pub fn pop_char(&mut self) {
        self.fields[self.focus].1.pop();
    }

    /// Validate the fields and build the request.
    ///
    /// # Errors
    /// Returns a message for the first field that is missing or invalid.
    pub fn submit(&self) -> Result<Submission, String> {
        let audio = self.path(FormField::AudioFile);
        let mut title = self.trimmed(FormField::Title).to_string();
        if title.is_empty()
            && self.target == FormTarget::Upload
            && let Some(stem) = audio.as_deref().and_then(Path::file_stem)
        {
            title = stem.to_string_lossy().into_owned();
        }

        if title.is_empty() {
            return Err("Enter a title.".to_string());
        }
        if self.trimmed(FormField::AiProvider).is_empty() {
            return Err("Enter the AI provider.".to_string());
        }
        if self.trimmed(FormField::AiModel).is_empty() {
            return Err("Enter the AI model.".to_string());
        }
        if let Some(path) = &audio {
            check_audio_file(path)?;
        }
        let cover = self.path(FormField::CoverFile);
        if let Some(path) = &cover {
            check_cover_file(path)?;
        }

        match self.target {
            FormTarget::Upload => {
                let file = audio.ok_or_else(|| "Choose an audio file to upload.".to_string())?;
                Ok(Submission::Upload(NewTrack {
                    file,
                    title,
                    ai_provider: self.trimmed(FormField::AiProvider).to_string(),
                    ai_model: self.trimmed(FormField::AiModel).to_string(),
                    description: self.optional(FormField::Description),
                    genre: self.optional(FormField::Genre),
                    tags: self.optional(FormField::Tags),
                    cover_url: self.optional(FormField::CoverUrl),
                }))
            }
            FormTarget::Edit(id) => Ok(Submission::Edit {
                id,
                update: TrackUpdate {
                    title: self.changed(FormField::Title),
                    description: self.changed(FormField::Description),
                    genre: self.changed(FormField::Genre),
                    tags: self.changed(FormField::Tags),
                    ai_provider: self.changed(FormField::AiProvider),
                    ai_model: self.changed(FormField::AiModel),
                    cover_url: self.changed(FormField::CoverUrl),
                },
                audio,
                cover,
            }),
        }
    }

    fn optional(&self, field: FormField) -> Option<String> {
        Some(self.trimmed(field).to_string()).filter(|v| !v.is_empty())
    }

    /// The trimmed value when it differs from what the form was opened with.
    fn changed(&self, field: FormField) -> Option<String> {
        let before = self
            .initial
            .iter()
            .find(|(f, _)| *f == field)
            .map_or("", |(_, v)| v.trim());
        let now = self.trimmed(field);
        (now != before).then(|| now.to_string())
    }

    fn path(&self, field: FormField) -> Option<PathBuf> {
        let raw = self.trimmed(field);
        (!raw.is_empty()).then(|| expand_home(raw))
    }
}

/// Expand a leading `~/` to `$HOME`.
fn expand_home(raw: &str) -> PathBuf {
    match (raw.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(raw),
    }
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| allowed.iter().any(|a| a.eq_ignore_ascii_case(e)))
}

fn check_audio_file(path: &Path) -> Result<(), String> {
    let meta = std::fs::metadata(path).map_err(|e| format!("Cannot read {}: {e}", path.display()))?;
    if !meta.is_file() {
        return Err(format!("{} is not a file.", path.display()));
    }
    if !has_extension(path, AUDIO_EXTENSIONS) {
        return Err("Unsupported audio format. Use mp3, wav or flac.".to_string());
    }
    if meta.len() > MAX_AUDIO_BYTES {
        return Err(format!(
            "Audio files must be {} MB or smaller.",
            MAX_AUDIO_BYTES / (1024 * 1024)
        ));
    }
    Ok(())
}

fn check_cover_file(path: &Path) -> Result<(), String> {
    let meta = std::fs::metadata(path).map_err(|e| format!("Cannot read {}: {e}", path.display()))?;
    if !meta.is_file() {
        return Err(format!("{} is not a file.", path.display()));
    }
    if !has_extension(path, COVER_EXTENSIONS) {
        return Err("Unsupported cover format. Use png, jpg, webp or gif.".to_string());
    }
    Ok(())
}
