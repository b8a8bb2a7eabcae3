// Main UI App - Metronome face, tempo controls and trial prompt

use crate::audio::engine::AudioEngine;
use crate::audio::status::StreamState;
use crate::sequencer::clock::{FrameTicks, MonotonicClock};
use crate::sequencer::metronome::Variant;
use crate::sequencer::ramp::{Direction, InputSource, RampTier};
use crate::sequencer::transport::{FrameView, PENDULUM_ARM_LENGTH, Transport};
use crate::trial::store::KeyValueStore;
use crate::ui::visual::DotPosition;
use eframe::egui;
use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke};

const FACE_SIZE: f32 = 280.0;
const DOT_RADIUS: f32 = 18.0;

pub struct MetronomeApp {
    transport: Transport<Option<AudioEngine>>,
    ticks: FrameTicks<MonotonicClock>,
    store: Box<dyn KeyValueStore>,
    // Source currently holding each +/- control
    increase_held: Option<InputSource>,
    decrease_held: Option<InputSource>,
}

impl MetronomeApp {
    pub fn new(
        transport: Transport<Option<AudioEngine>>,
        ticks: FrameTicks<MonotonicClock>,
        store: Box<dyn KeyValueStore>,
    ) -> Self {
        Self {
            transport,
            ticks,
            store,
            increase_held: None,
            decrease_held: None,
        }
    }

    fn draw_face(&mut self, ui: &mut egui::Ui, frame: &FrameView, now: f64) {
        let (response, painter) =
            ui.allocate_painter(egui::vec2(FACE_SIZE, FACE_SIZE), Sense::click());
        let rect = response.rect;

        // The face itself is the play/stop toggle region
        if response.clicked() {
            self.transport.toggle_play(now);
        }

        painter.rect_filled(rect, 8.0, Color32::from_gray(30));
        let face = rect.shrink(DOT_RADIUS + 4.0);

        let dot_color = if frame.slowing_down {
            Color32::from_rgb(255, 165, 0)
        } else if frame.is_playing {
            Color32::from_rgb(100, 150, 255)
        } else {
            Color32::from_gray(160)
        };

        match self.transport.variant() {
            Variant::Circular => {
                painter.circle_stroke(
                    face.center(),
                    face.width() / 2.0,
                    Stroke::new(2.0, Color32::from_gray(90)),
                );
            }
            Variant::Pendulum => {
                // Triangular body, arm pivoting at the bottom centre
                let body = vec![
                    to_screen(face, DotPosition { x: 50.0, y: 0.0 }),
                    to_screen(face, DotPosition { x: 100.0, y: 100.0 }),
                    to_screen(face, DotPosition { x: 0.0, y: 100.0 }),
                ];
                painter.add(egui::Shape::closed_line(
                    body,
                    Stroke::new(2.0, Color32::from_gray(90)),
                ));
                painter.line_segment(
                    [
                        to_screen(face, DotPosition { x: 50.0, y: 100.0 }),
                        to_screen(face, frame.dot),
                    ],
                    Stroke::new(3.0, Color32::from_gray(200)),
                );
            }
        }

        painter.circle_filled(
            to_screen(face, frame.dot),
            DOT_RADIUS * frame.scale as f32,
            dot_color,
        );

        let label_pos = match self.transport.variant() {
            Variant::Circular => face.center(),
            Variant::Pendulum => to_screen(
                face,
                DotPosition {
                    x: 50.0,
                    y: 100.0 - PENDULUM_ARM_LENGTH / 4.0,
                },
            ),
        };
        painter.text(
            label_pos,
            Align2::CENTER_CENTER,
            frame.bpm.bpm().to_string(),
            FontId::proportional(40.0),
            Color32::WHITE,
        );
    }

    /// Press-and-hold button feeding the hold ramp
    /// A disabled button (tempo at its bound) releases any hold in progress
    fn hold_button(
        &mut self,
        ui: &mut egui::Ui,
        label: &str,
        direction: Direction,
        enabled: bool,
        now: f64,
    ) {
        let response = ui.add_enabled(
            enabled,
            egui::Button::new(label)
                .min_size(egui::vec2(64.0, 48.0))
                .sense(Sense::click_and_drag()),
        );

        let down = response.is_pointer_button_down_on();
        let touching = ui.input(|i| i.any_touches());
        let held = match direction {
            Direction::Increase => self.increase_held,
            Direction::Decrease => self.decrease_held,
        };

        let next = match (down, held) {
            (true, None) => {
                let source = if touching {
                    InputSource::Touch
                } else {
                    InputSource::Pointer
                };
                self.transport.press(direction, source, now);
                Some(source)
            }
            (false, Some(source)) => {
                self.transport.release(direction, source);
                None
            }
            (_, held) => held,
        };

        match direction {
            Direction::Increase => self.increase_held = next,
            Direction::Decrease => self.decrease_held = next,
        }
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui, frame: &FrameView, now: f64) {
        ui.horizontal(|ui| {
            self.hold_button(ui, "−", Direction::Decrease, !frame.bpm.is_min(), now);

            let play_label = if frame.is_playing { "⏹ Stop" } else { "▶ Play" };
            if ui
                .add(egui::Button::new(play_label).min_size(egui::vec2(96.0, 48.0)))
                .clicked()
            {
                self.transport.toggle_play(now);
            }

            self.hold_button(ui, "+", Direction::Increase, !frame.bpm.is_max(), now);
        });

        ui.add_space(8.0);

        ui.horizontal(|ui| {
            if ui
                .add(egui::Button::new("Tap").min_size(egui::vec2(96.0, 40.0)))
                .clicked()
            {
                self.transport.tap(now);
            }
            if frame.tap_mode {
                ui.colored_label(Color32::from_rgb(100, 150, 255), "Tap mode");
            }
            if let Some(tier) = frame.hold_tier {
                let text = match tier {
                    RampTier::Normal => "›",
                    RampTier::Fast => "»",
                    RampTier::Fastest => "⏩",
                };
                ui.label(text);
            }
        });

        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.label("Face:");
            let mut variant = self.transport.variant();
            ui.selectable_value(&mut variant, Variant::Circular, "Circle");
            ui.selectable_value(&mut variant, Variant::Pendulum, "Pendulum");
            self.transport.set_variant(variant, now);
        });

        ui.add_space(8.0);
        self.draw_audio_status(ui);
    }

    fn draw_audio_status(&self, ui: &mut egui::Ui) {
        let (text, color) = match self.transport.audio().as_ref().map(AudioEngine::state) {
            Some(StreamState::Running) => ("● Audio", Color32::GREEN),
            Some(StreamState::Suspended) => ("○ Audio", Color32::GRAY),
            Some(StreamState::Failed) => ("● Audio error", Color32::RED),
            None => ("○ No audio device", Color32::GRAY),
        };
        ui.colored_label(color, text);
    }

    fn draw_upgrade_prompt(&mut self, ctx: &egui::Context) {
        egui::Window::new("Trial ended")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("Your trial sessions are used up.");
                ui.label("Upgrade to play without the slowdown.");
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if ui.button("Upgrade").clicked() {
                        if let Err(e) = self.transport.mark_upgraded(self.store.as_mut()) {
                            log::error!("Failed to save upgrade: {}", e);
                        }
                    }
                    if ui.button("Not now").clicked() {
                        self.transport.dismiss_upgrade_prompt();
                    }
                });
            });
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context, now: f64) {
        if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.transport.toggle_play(now);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::T)) {
            self.transport.tap(now);
        }
    }
}

/// Percentage coordinates of the face to screen coordinates
fn to_screen(rect: Rect, dot: DotPosition) -> Pos2 {
    egui::pos2(
        rect.left() + rect.width() * dot.x as f32 / 100.0,
        rect.top() + rect.height() * dot.y as f32 / 100.0,
    )
}

impl eframe::App for MetronomeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Animation is driven by continuous repaints, one tick per frame
        ctx.request_repaint();

        let now = self.ticks.next().unwrap_or_default();
        let frame = self.transport.tick(now);

        self.handle_keyboard(ctx, now);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("Metronome");
                ui.add_space(10.0);
                self.draw_face(ui, &frame, now);
                ui.add_space(16.0);
                self.draw_controls(ui, &frame, now);
            });
        });

        if self.transport.upgrade_prompt() {
            self.draw_upgrade_prompt(ctx);
        }
    }
}
