use std::cell::RefCell;
use std::rc::Rc;

use eframe::egui;
use tracing::{debug, error, info};

use crate::meta::Point;
use crate::session::{ClickOutcome, Dialogs, PendingInsert, SaveOutcome, SavePrompt, Session};

// ── Dialogs ─────────────────────────────────────────────────────────────────

/// Confirmation goes through a native message box. The label is typed
/// into an egui modal, which stores its answer here before the session
/// asks for it.
#[derive(Default)]
struct NativeDialogs {
    label: Option<String>,
}

impl Dialogs for NativeDialogs {
    fn prompt_for_label(&mut self) -> Option<String> {
        self.label.take()
    }

    fn confirm_overwrite(&mut self, prompt: &SavePrompt) -> bool {
        let level = if prompt.exists {
            rfd::MessageLevel::Warning
        } else {
            rfd::MessageLevel::Info
        };
        let result = rfd::MessageDialog::new()
            .set_level(level)
            .set_title(SavePrompt::TITLE)
            .set_description(prompt.message())
            .set_buttons(rfd::MessageButtons::OkCancel)
            .show();
        matches!(
            result,
            rfd::MessageDialogResult::Ok | rfd::MessageDialogResult::Yes
        )
    }
}

/// What the label modal decided this frame.
enum LabelAnswer {
    Open,
    Done(Option<String>),
}

// ── App ─────────────────────────────────────────────────────────────────────

/// Where the app leaves an error that should fail the process once the
/// window is gone.
pub type FatalSlot = Rc<RefCell<Option<anyhow::Error>>>;

pub struct MemeInsertsApp {
    session: Session,
    dialogs: NativeDialogs,
    texture: Option<egui::TextureHandle>,
    texture_revision: u64,
    fatal: FatalSlot,

    // label modal state
    pending: Option<PendingInsert>,
    label_buf: String,
}

impl MemeInsertsApp {
    pub fn new(session: Session, fatal: FatalSlot) -> Self {
        Self {
            session,
            dialogs: NativeDialogs::default(),
            texture: None,
            texture_revision: 0,
            fatal,
            pending: None,
            label_buf: String::new(),
        }
    }

    /// Re-uploads the preview whenever a new outline lands on the working image.
    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() && self.texture_revision == self.session.revision() {
            return;
        }
        let rgba = self.session.preview().display_image();
        let size = [rgba.width() as usize, rgba.height() as usize];
        let pixels = rgba.as_flat_samples();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
        if let Some(tex) = &mut self.texture {
            tex.set(color_image, egui::TextureOptions::LINEAR);
        } else {
            self.texture =
                Some(ctx.load_texture("preview", color_image, egui::TextureOptions::LINEAR));
        }
        self.texture_revision = self.session.revision();
    }

    /// Closes the window unless the write failed in a way the user can retry.
    fn save_and_exit(&mut self, ctx: &egui::Context) {
        match self.session.handle_save(&mut self.dialogs) {
            Ok(SaveOutcome::Saved(path)) => info!("Saved {}", path.display()),
            Ok(SaveOutcome::Declined) => {}
            Err(e) if e.is_fatal() => {
                error!("Save failed: {}", e);
                *self.fatal.borrow_mut() = Some(anyhow::Error::from(e));
            }
            Err(e) => {
                let e = anyhow::Error::from(e);
                error!("Save failed: {:#}", e);
                rfd::MessageDialog::new()
                    .set_level(rfd::MessageLevel::Error)
                    .set_title(SavePrompt::TITLE)
                    .set_description(format!("{:#}\n\nNothing was saved.", e))
                    .set_buttons(rfd::MessageButtons::Ok)
                    .show();
                return;
            }
        }
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn show_label_modal(&mut self, ctx: &egui::Context) {
        let Some(color) = self.pending.as_ref().map(|p| p.color) else {
            return;
        };
        let [r, g, b, _] = color.0;
        let swatch = egui::Color32::from_rgb(r, g, b);

        let response = egui::Modal::new(egui::Id::new("insert_label")).show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(swatch, "■");
                ui.heading("Insert Label");
            });
            ui.label("What should this insert be called?");
            let te = ui.text_edit_singleline(&mut self.label_buf);
            let entered = te.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            te.request_focus();

            let mut answer = LabelAnswer::Open;
            ui.horizontal(|ui| {
                if ui.button("OK").clicked() || entered {
                    answer = LabelAnswer::Done(Some(self.label_buf.clone()));
                }
                if ui.button("Cancel").clicked() {
                    answer = LabelAnswer::Done(None);
                }
            });
            answer
        });

        let dismissed = response.should_close();
        let answer = match response.inner {
            LabelAnswer::Open if dismissed => Some(None),
            LabelAnswer::Open => None,
            LabelAnswer::Done(label) => Some(label),
        };
        if let Some(label) = answer {
            if let Some(pending) = self.pending.take() {
                self.dialogs.label = label;
                if let ClickOutcome::Inserted(label) =
                    self.session.resolve(pending, &mut self.dialogs)
                {
                    debug!("Status now shows '{}'", label);
                }
            }
            self.label_buf.clear();
        }
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for MemeInsertsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_texture(ctx);

        if self.pending.is_none() && ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::S))
        {
            self.save_and_exit(ctx);
            return;
        }

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(self.session.status());
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let (w, h) = self.session.preview().display_size();
            egui::ScrollArea::both().show(ui, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(egui::vec2(w as f32, h as f32), egui::Sense::click());
                if let Some(ref tex) = self.texture {
                    ui.painter().image(
                        tex.id(),
                        rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }

                if self.pending.is_none() && response.clicked() {
                    if let Some(pos) = response.interact_pointer_pos() {
                        let local = pos - rect.min;
                        let p = Point::new(
                            (local.x.max(0.0) as u32).min(w.saturating_sub(1)),
                            (local.y.max(0.0) as u32).min(h.saturating_sub(1)),
                        );
                        if let Some(pending) = self.session.click(p) {
                            self.pending = Some(pending);
                            self.label_buf.clear();
                        }
                    }
                }
            });
        });

        self.show_label_modal(ctx);
    }
}
