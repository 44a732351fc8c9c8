use std::path::{Path, PathBuf};

use image::Rgba;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{InvalidLabel, Result};
use crate::meta::{sidecar_path, Insert, InsertSet, MemeMeta, Point};
use crate::preview::{outline_color, Preview};

pub const HELP_TEXT: &str = "Click to make meme inserts. Ctrl+S to save and exit.";

/// Modal questions the session needs answered by whatever UI hosts it.
pub trait Dialogs {
    /// `None` when the prompt is cancelled.
    fn prompt_for_label(&mut self) -> Option<String>;
    /// `true` to go ahead and write `prompt.target`.
    fn confirm_overwrite(&mut self, prompt: &SavePrompt) -> bool;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavePrompt {
    pub target: PathBuf,
    pub exists: bool,
}

impl SavePrompt {
    pub const TITLE: &'static str = "Save Meme Meta";

    pub fn message(&self) -> String {
        let mut msg = format!(
            "Do you want to save as\n{}\nPlease confirm.",
            self.target.display()
        );
        if self.exists {
            msg.push_str("\n\nWARNING: FILE ALREADY EXISTS! WILL OVERWRITE");
        }
        msg
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    AwaitingFirstClick,
    AwaitingSecondClick { first: Point },
}

/// A rectangle whose two corners are in, waiting for its label.
/// Corners are in preview space, ordered by x.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingInsert {
    pub corners: [Point; 2],
    pub color: Rgba<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ClickOutcome {
    FirstCorner,
    Inserted(String),
    Rejected(InvalidLabel),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    Declined,
}

/// Everything one run of the tool mutates: the click parity, the labelled
/// inserts and the working image the outlines are drawn on.
pub struct Session {
    image_path: PathBuf,
    preview: Preview,
    selection: Selection,
    inserts: InsertSet,
    status: String,
    revision: u64,
    hue_step: u16,
    outline_width: u32,
}

impl Session {
    pub fn open(image_path: PathBuf, config: &Config) -> Result<Self> {
        let preview = Preview::open(&image_path, config.display_height)?;
        let (w, h) = preview.original_size();
        let (dw, dh) = preview.display_size();
        info!(
            "Opened {} ({}x{}), preview {}x{} (ratio {:.4})",
            image_path.display(),
            w,
            h,
            dw,
            dh,
            preview.scale().ratio()
        );
        Ok(Self::new(image_path, preview, config))
    }

    pub fn new(image_path: PathBuf, preview: Preview, config: &Config) -> Self {
        Self {
            image_path,
            preview,
            selection: Selection::AwaitingFirstClick,
            inserts: InsertSet::new(),
            status: HELP_TEXT.to_string(),
            revision: 0,
            hue_step: config.hue_step,
            outline_width: config.outline_width,
        }
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn inserts(&self) -> &InsertSet {
        &self.inserts
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Bumped whenever the working image changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Feeds one click (preview coordinates) into the selection state
    /// machine. The second click of a pair draws the outline and returns
    /// the rectangle, which must then go through [`Session::resolve`].
    pub fn click(&mut self, p: Point) -> Option<PendingInsert> {
        match self.selection {
            Selection::AwaitingFirstClick => {
                debug!("First corner at {:?}", p);
                self.selection = Selection::AwaitingSecondClick { first: p };
                None
            }
            Selection::AwaitingSecondClick { first } => {
                self.selection = Selection::AwaitingFirstClick;
                let (c1, c2) = if first.x > p.x { (p, first) } else { (first, p) };
                debug!("Second corner at {:?}, rectangle {:?} {:?}", p, c1, c2);

                let color = outline_color(self.inserts.len(), self.hue_step);
                self.preview.draw_outline(c1, c2, color, self.outline_width);
                self.revision += 1;

                Some(PendingInsert {
                    corners: [c1, c2],
                    color,
                })
            }
        }
    }

    /// Asks for the label of `pending` and records it if acceptable.
    pub fn resolve(&mut self, pending: PendingInsert, dialogs: &mut dyn Dialogs) -> ClickOutcome {
        let label = dialogs.prompt_for_label();
        match self.commit(pending, label) {
            Ok(label) => ClickOutcome::Inserted(label),
            Err(e) => ClickOutcome::Rejected(e),
        }
    }

    /// One click, prompting straight away when it completes a rectangle.
    pub fn handle_click(&mut self, p: Point, dialogs: &mut dyn Dialogs) -> ClickOutcome {
        match self.click(p) {
            None => ClickOutcome::FirstCorner,
            Some(pending) => self.resolve(pending, dialogs),
        }
    }

    fn commit(
        &mut self,
        pending: PendingInsert,
        label: Option<String>,
    ) -> std::result::Result<String, InvalidLabel> {
        let label = match validate_label(label) {
            Ok(label) => label,
            Err(e) => {
                warn!("Error! {}", e);
                return Err(e);
            }
        };

        let scale = self.preview.scale();
        let [c1, c2] = pending.corners;
        let insert = Insert {
            coords: [scale.to_original(c1), scale.to_original(c2)],
        };
        info!("Insert '{}' at {:?}", label, insert.coords);
        if self.inserts.insert(label.clone(), insert).is_some() {
            debug!("Replaced previous coordinates of '{}'", label);
        }

        match serde_json::to_string(&self.inserts) {
            Ok(json) => self.status = json,
            Err(e) => warn!("Could not render inserts for display: {}", e),
        }
        Ok(label)
    }

    /// Writes `{"inserts": ...}` next to the image once the user agrees.
    pub fn handle_save(&self, dialogs: &mut dyn Dialogs) -> Result<SaveOutcome> {
        let meta = MemeMeta {
            inserts: self.inserts.clone(),
        };
        let json = meta.to_json()?;
        let target = sidecar_path(&self.image_path);
        debug!("{}", json);

        let prompt = SavePrompt {
            exists: target.exists(),
            target,
        };
        if !dialogs.confirm_overwrite(&prompt) {
            info!("Cancel. Did not save.");
            return Ok(SaveOutcome::Declined);
        }

        meta.save(&prompt.target)?;
        info!("Saved {} inserts to {}", self.inserts.len(), prompt.target.display());
        Ok(SaveOutcome::Saved(prompt.target))
    }
}

pub fn validate_label(label: Option<String>) -> std::result::Result<String, InvalidLabel> {
    match label {
        None => Err(InvalidLabel::Cancelled),
        Some(s) if s.is_empty() => Err(InvalidLabel::Empty),
        Some(s) if s.chars().any(char::is_whitespace) => Err(InvalidLabel::ContainsWhitespace(s)),
        Some(s) => Ok(s),
    }
}
