use egui::{Color32, Rect, Sense, Slider, Vec2};
use log::{debug, warn};
use vignette_core::clip::{ClipId, ClipState, LibraryError};
use vignette_core::playlist::format_time;
use vignette_core::remote::{RemotePlayerHandle, TransportState};

use crate::app::VignettePlayerApp;

enum ClipAction {
    Toggle(ClipId),
    Remove(ClipId),
}

impl VignettePlayerApp {
    pub fn draw(&mut self, ctx: &egui::Context) {
        self.playlist_bar(ctx);
        self.queue_panel(ctx);
        self.vignette_panel(ctx);
        self.transport_bar(ctx);
        self.visualizer_panel(ctx);
    }

    fn queue_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("queue")
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                ui.heading("Queue");
                if ui.button("Add tracks…").clicked() {
                    if let Some(paths) = rfd::FileDialog::new()
                        .add_filter("Audio", &["mp3", "wav", "ogg", "flac"])
                        .pick_files()
                    {
                        self.session.remote.add_tracks(paths);
                    }
                }
                ui.separator();

                let current = self.session.remote.current_index();
                let mut play = None;
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for (i, track) in self.session.remote.tracks().iter().enumerate() {
                        let selected = current == Some(i);
                        let label = if track.duration > 0.0 {
                            format!("{} ({})", track.name, format_time(track.duration))
                        } else {
                            track.name.clone()
                        };
                        if ui.selectable_label(selected, label).clicked() {
                            play = Some(i);
                        }
                    }
                });
                if let Some(i) = play {
                    self.session.remote.start_track(i);
                }
            });
    }

    fn playlist_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("playlist_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.label("Playlist:");
                let input = ui.add(
                    egui::TextEdit::singleline(&mut self.playlist_input)
                        .hint_text("Paste a playlist URL or ID")
                        .desired_width(360.0),
                );
                let submitted =
                    input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Load").clicked() || submitted {
                    let now = self.now();
                    let input = self.playlist_input.clone();
                    self.session.load_playlist_input(&input, now);
                }
                if let Some(notice) = &self.session.notice {
                    ui.colored_label(Color32::from_rgb(230, 80, 80), &notice.text);
                }
            });
            ui.add_space(4.0);
        });
    }

    fn vignette_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("vignettes")
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                ui.heading("Vignettes");
                if ui.button("Upload clips…").clicked() {
                    self.upload_clips();
                }
                ui.separator();

                let mut action = None;
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for clip in self.session.library.clips() {
                        ui.horizontal(|ui| {
                            let playing = clip.state == ClipState::Playing;
                            let label = if playing {
                                format!("▶ {}", clip.name)
                            } else {
                                clip.name.clone()
                            };
                            if ui.selectable_label(playing, label).clicked() {
                                action = Some(ClipAction::Toggle(clip.id));
                            }
                            if ui.small_button("✕").clicked() {
                                action = Some(ClipAction::Remove(clip.id));
                            }
                        });
                    }
                });

                match action {
                    Some(ClipAction::Toggle(id)) => self.session.library.toggle(id),
                    Some(ClipAction::Remove(id)) => self.session.library.remove(id),
                    None => {}
                }
            });
    }

    fn upload_clips(&mut self) {
        let Some(paths) = rfd::FileDialog::new()
            .add_filter("Audio", &["mp3", "wav", "ogg", "flac"])
            .pick_files()
        else {
            return;
        };
        for path in paths {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match self.session.library.upload(name, &path) {
                Ok(_) => {}
                Err(LibraryError::DuplicateName(name)) => {
                    debug!("skipping duplicate clip {name:?}");
                }
                Err(e) => warn!("{e}"),
            }
        }
    }

    fn transport_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("transport").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui.button("⏮").clicked() {
                    self.session.remote.previous();
                }
                let playing =
                    self.session.remote.transport_state() == TransportState::Playing;
                let toggle = if playing { "⏸" } else { "▶" };
                if ui.button(toggle).clicked() {
                    if playing {
                        self.session.remote.pause();
                    } else {
                        self.session.remote.play();
                    }
                }
                if ui.button("⏭").clicked() {
                    self.session.remote.next();
                }
                if ui.button("⏹").clicked() {
                    // No dedicated stop on the remote surface: park at the start.
                    self.session.remote.pause();
                    self.session.remote.seek_to_fraction(0.0);
                }

                ui.label(format_time(self.session.progress.current));
                let mut fraction = self.session.progress.fraction();
                let slider = ui.add(
                    Slider::new(&mut fraction, 0.0..=1.0)
                        .show_value(false)
                        .trailing_fill(true),
                );
                if slider.drag_stopped() || (slider.changed() && !slider.dragged()) {
                    self.session.remote.seek_to_fraction(f64::from(fraction));
                }
                ui.label(format_time(self.session.progress.duration));

                ui.separator();
                ui.label("🔊");
                let mut volume = self.session.remote.volume();
                if ui.add(Slider::new(&mut volume, 0..=100)).changed() {
                    self.session.remote.set_volume(volume);
                }
            });
            ui.add_space(4.0);
        });
    }

    fn visualizer_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(track) = self.session.remote.current_track() {
                ui.label(&track.name);
            }
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), Sense::hover());
            let rect = response.rect;
            let now = self.now();
            let Some(bars) = self.session.visualizer_frame(now, rect.height() / 2.0) else {
                return;
            };
            if bars.is_empty() {
                return;
            }
            let bar_width = rect.width() / bars.len() as f32;
            let center_y = rect.center().y;
            let t = now.as_secs_f32();
            for (i, &height) in bars.iter().enumerate() {
                let hue = (i as f32 / bars.len() as f32) * 360.0 + t * 30.0;
                let color = hsl_to_rgb(hue % 360.0, 0.8, 0.55);
                let x = rect.left() + i as f32 * bar_width;
                // Mirror each bar around the center line.
                let bar = Rect::from_min_size(
                    egui::pos2(x + 1.0, center_y - height),
                    Vec2::new((bar_width - 2.0).max(1.0), height * 2.0),
                );
                painter.rect_filled(bar, 1.0, color);
            }
        });
    }
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Color32 {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = match h as u32 {
        0..=59 => (c, x, 0.0),
        60..=119 => (x, c, 0.0),
        120..=179 => (0.0, c, x),
        180..=239 => (0.0, x, c),
        240..=299 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    Color32::from_rgb(
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}
