use crate::device_dialog::interface::{Advisory, Answer, DeviceDialog, DeviceDialogEvent, Prompt};
use crate::library::logger::interface::Logger;
use std::error::Error;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

const ADVISORY_DURATION: Duration = Duration::from_secs(4);
const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

struct Pending {
    prompt: Prompt,
    reply: Sender<Answer>,
}

#[derive(Default)]
struct WindowState {
    pending: Option<Pending>,
    advisories: Vec<(Advisory, Instant)>,
    close_at: Option<Instant>,
}

impl WindowState {
    /// A newer prompt withdraws the one on screen.
    fn offer(&mut self, prompt: &Prompt) -> Receiver<Answer> {
        let (reply, answer) = channel();
        self.pending = Some(Pending {
            prompt: prompt.clone(),
            reply,
        });
        answer
    }

    fn answer(&mut self, answer: Answer) {
        if let Some(pending) = self.pending.take() {
            let _ = pending.reply.send(answer);
        }
    }

    fn expire_advisories(&mut self, now: Instant) {
        self.advisories
            .retain(|(_, shown_at)| now.duration_since(*shown_at) < ADVISORY_DURATION);
    }
}

struct DialogWindow {
    state: Arc<Mutex<WindowState>>,
    events: Sender<DeviceDialogEvent>,
}

impl eframe::App for DialogWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        state.expire_advisories(now);
        if state.close_at.is_some_and(|close_at| now >= close_at) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        let mut replay = false;
        let mut answered = None;

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("WhatsIt");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Play again").clicked() {
                        replay = true;
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            for (advisory, _) in &state.advisories {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    if let Some(title) = &advisory.title {
                        ui.label(egui::RichText::new(title).strong());
                    }
                    ui.label(&advisory.message);
                });
                ui.add_space(8.0);
            }

            match &state.pending {
                Some(pending) => {
                    ui.vertical_centered(|ui| {
                        ui.add_space(12.0);
                        ui.label(egui::RichText::new(&pending.prompt.title).size(20.0).strong());
                        ui.add_space(8.0);
                        ui.label(&pending.prompt.message);
                        ui.add_space(16.0);
                        ui.horizontal(|ui| {
                            if ui.button(&pending.prompt.positive).clicked() {
                                answered = Some(Answer::Positive);
                            }
                            if ui.button(&pending.prompt.negative).clicked() {
                                answered = Some(Answer::Negative);
                            }
                        });
                    });
                }
                None => {
                    ui.vertical_centered(|ui| {
                        ui.add_space(40.0);
                        ui.weak("...");
                    });
                }
            }
        });

        if let Some(answer) = answered {
            state.answer(answer);
        }
        if replay {
            state.pending.take();
            let _ = self.events.send(DeviceDialogEvent::Replay);
        }

        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}

/// egui window front end. The window must be driven from the main thread
/// with `run_window`; `ask` and `notify` may be called from any thread.
pub struct DeviceDialogGui {
    state: Arc<Mutex<WindowState>>,
    event_sender: Sender<DeviceDialogEvent>,
    event_receiver: Mutex<Option<Receiver<DeviceDialogEvent>>>,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl DeviceDialogGui {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>) -> Self {
        let (event_sender, event_receiver) = channel();
        Self {
            state: Arc::new(Mutex::new(WindowState::default())),
            event_sender,
            event_receiver: Mutex::new(Some(event_receiver)),
            logger: logger.with_namespace("dialog").with_namespace("gui"),
        }
    }

    /// Blocks until the window is closed, then reports `Closed`.
    pub fn run_window(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_title("WhatsIt")
                .with_inner_size([420.0, 320.0]),
            ..Default::default()
        };

        let window = DialogWindow {
            state: self.state.clone(),
            events: self.event_sender.clone(),
        };

        self.logger.info("Opening window")?;
        let result = eframe::run_native("WhatsIt", options, Box::new(|_cc| Box::new(window)));
        self.logger.info("Window closed")?;

        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .take();
        let _ = self.event_sender.send(DeviceDialogEvent::Closed);

        result.map_err(|e| e.to_string().into())
    }

    /// Lets remaining advisories show for a moment, then closes the window.
    pub fn close_after(&self, delay: Duration) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .close_at = Some(Instant::now() + delay);
    }
}

impl DeviceDialog for DeviceDialogGui {
    fn ask(&self, prompt: &Prompt) -> Result<Answer, Box<dyn Error + Send + Sync>> {
        self.logger.info(&format!("ask {:?}", prompt.title))?;
        let answer = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .offer(prompt);
        answer.recv().map_err(|_| "Prompt withdrawn".into())
    }

    fn notify(&self, advisory: &Advisory) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.logger.info(&format!("notify {:?}", advisory.message))?;
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .advisories
            .push((advisory.clone(), Instant::now()));
        Ok(())
    }

    fn events(&self) -> Option<Receiver<DeviceDialogEvent>> {
        self.event_receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
