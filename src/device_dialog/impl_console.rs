use crate::device_dialog::interface::{Advisory, Answer, DeviceDialog, DeviceDialogEvent, Prompt};
use crate::library::logger::interface::Logger;
use std::error::Error;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const DEFAULT_ANSWER_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Answer(Answer),
    Replay,
    Quit,
    Unknown,
}

pub fn parse_line(line: &str, prompt: Option<&Prompt>) -> Line {
    let line = line.trim().to_lowercase();
    match line.as_str() {
        "r" | "replay" => return Line::Replay,
        "q" | "quit" | "exit" => return Line::Quit,
        "y" | "yes" | "1" => return Line::Answer(Answer::Positive),
        "n" | "no" | "2" => return Line::Answer(Answer::Negative),
        _ => {}
    }
    match prompt {
        Some(prompt) if line == prompt.positive.to_lowercase() => Line::Answer(Answer::Positive),
        Some(prompt) if line == prompt.negative.to_lowercase() => Line::Answer(Answer::Negative),
        _ => Line::Unknown,
    }
}

struct Pending {
    prompt: Prompt,
    reply: Sender<Answer>,
}

#[derive(Default)]
struct Slot {
    pending: Option<Pending>,
}

type Output = Arc<Mutex<Box<dyn Write + Send>>>;

/// Terminal front end. Lines are read on a background thread so that
/// `replay` and `quit` work even while no prompt is open.
pub struct DeviceDialogConsole {
    slot: Arc<(Mutex<Slot>, Condvar)>,
    output: Output,
    event_receiver: Mutex<Option<Receiver<DeviceDialogEvent>>>,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl DeviceDialogConsole {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self::with_io(
            Box::new(BufReader::new(io::stdin())),
            Box::new(io::stdout()),
            DEFAULT_ANSWER_WAIT,
            logger,
        )
    }

    /// `answer_wait` bounds how long a typed answer waits for a prompt to
    /// open before it is discarded.
    pub fn with_io(
        input: Box<dyn BufRead + Send>,
        output: Box<dyn Write + Send>,
        answer_wait: Duration,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Self {
        let (event_sender, event_receiver) = channel();
        let slot = Arc::new((Mutex::new(Slot::default()), Condvar::new()));
        let output: Output = Arc::new(Mutex::new(output));
        let logger = logger.with_namespace("dialog").with_namespace("console");

        let reader = Reader {
            slot: slot.clone(),
            output: output.clone(),
            events: event_sender,
            answer_wait,
            logger: logger.clone(),
        };
        std::thread::spawn(move || reader.run(input));

        Self {
            slot,
            output,
            event_receiver: Mutex::new(Some(event_receiver)),
            logger,
        }
    }

    fn write(&self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        write_to(&self.output, text)
    }
}

fn write_to(output: &Output, text: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut output = output.lock().unwrap_or_else(PoisonError::into_inner);
    output.write_all(text.as_bytes())?;
    output.flush()?;
    Ok(())
}

struct Reader {
    slot: Arc<(Mutex<Slot>, Condvar)>,
    output: Output,
    events: Sender<DeviceDialogEvent>,
    answer_wait: Duration,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl Reader {
    fn run(self, input: Box<dyn BufRead + Send>) {
        for line in input.lines() {
            let Ok(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            match parse_line(&line, None) {
                Line::Replay => {
                    self.withdraw();
                    let _ = self.events.send(DeviceDialogEvent::Replay);
                }
                Line::Quit => {
                    self.withdraw();
                    let _ = self.events.send(DeviceDialogEvent::Closed);
                    return;
                }
                Line::Answer(_) | Line::Unknown => self.answer(&line),
            }
        }

        // Input is gone: the next prompt can never be answered.
        let _ = self.logger.info("Input closed");
        drop(self.wait_for_prompt());
        self.withdraw();
        let _ = self.events.send(DeviceDialogEvent::Closed);
    }

    fn wait_for_prompt(&self) -> MutexGuard<'_, Slot> {
        let (lock, condvar) = &*self.slot;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = condvar
            .wait_timeout_while(guard, self.answer_wait, |slot| slot.pending.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        guard
    }

    fn answer(&self, line: &str) {
        let mut slot = self.wait_for_prompt();

        let parsed = slot
            .pending
            .as_ref()
            .map(|pending| parse_line(line, Some(&pending.prompt)));

        let hint = match parsed {
            Some(Line::Answer(answer)) => {
                if let Some(pending) = slot.pending.take() {
                    let _ = pending.reply.send(answer);
                }
                return;
            }
            Some(_) => "Please answer 1 or 2 (or 'replay', 'quit').\n> ",
            None => "Nothing to answer right now. Type 'replay' or 'quit'.\n",
        };
        drop(slot);
        let _ = write_to(&self.output, hint);
    }

    fn withdraw(&self) {
        let (lock, _) = &*self.slot;
        lock.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .take();
    }
}

impl DeviceDialog for DeviceDialogConsole {
    fn ask(&self, prompt: &Prompt) -> Result<Answer, Box<dyn Error + Send + Sync>> {
        self.write(&format!(
            "\n== {} ==\n{}\n  [1] {}   [2] {}\n> ",
            prompt.title, prompt.message, prompt.positive, prompt.negative
        ))?;

        let (reply, answer) = channel();
        {
            let (lock, condvar) = &*self.slot;
            let mut slot = lock.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.pending.is_some() {
                self.logger.warn("Replacing an unanswered prompt")?;
            }
            slot.pending = Some(Pending {
                prompt: prompt.clone(),
                reply,
            });
            condvar.notify_all();
        }

        answer.recv().map_err(|_| "Prompt withdrawn".into())
    }

    fn notify(&self, advisory: &Advisory) -> Result<(), Box<dyn Error + Send + Sync>> {
        match &advisory.title {
            Some(title) => self.write(&format!("\n-- {}: {}\n", title, advisory.message)),
            None => self.write(&format!("\n-- {}\n", advisory.message)),
        }
    }

    fn events(&self) -> Option<Receiver<DeviceDialogEvent>> {
        self.event_receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
