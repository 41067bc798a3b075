// Resolution session: one resolved URL and its selectable choices.
//
// A Session is an immutable value produced by the resolver and handed intact
// into download tasks, so a later resolve can never pull the choices out from
// under an in-flight download.

use std::collections::HashMap;

use super::models::{StreamChoice, StreamFormat, VideoInfo};

#[derive(Debug, Clone)]
pub struct Session {
    video: VideoInfo,
    choices: Vec<StreamChoice>,
    by_label: HashMap<String, usize>,
    /// Best audio-only track, paired with adaptive choices at download time.
    /// Fixed at resolve time so the size estimates stay consistent.
    best_audio: Option<StreamFormat>,
}

impl Session {
    /// Build a session from choices in descending-resolution order.
    ///
    /// Duplicate labels collapse to the first occurrence, which favors the
    /// highest-resolution candidate for that label text.
    pub fn new(
        video: VideoInfo,
        candidates: Vec<StreamChoice>,
        best_audio: Option<StreamFormat>,
    ) -> Self {
        let mut choices: Vec<StreamChoice> = Vec::with_capacity(candidates.len());
        let mut by_label = HashMap::new();

        for choice in candidates {
            if by_label.contains_key(&choice.label) {
                continue;
            }
            by_label.insert(choice.label.clone(), choices.len());
            choices.push(choice);
        }

        Self {
            video,
            choices,
            by_label,
            best_audio,
        }
    }

    pub fn video(&self) -> &VideoInfo {
        &self.video
    }

    pub fn best_audio(&self) -> Option<&StreamFormat> {
        self.best_audio.as_ref()
    }

    pub fn choices(&self) -> &[StreamChoice] {
        &self.choices
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.choices.iter().map(|c| c.label.as_str())
    }

    /// Look up a choice by its display label
    pub fn get(&self, label: &str) -> Option<&StreamChoice> {
        self.by_label.get(label).map(|&i| &self.choices[i])
    }

    /// The pre-selected entry: first in order, i.e. highest resolution
    pub fn default_choice(&self) -> Option<&StreamChoice> {
        self.choices.first()
    }

    /// A download is only valid against a session with at least one choice
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}
