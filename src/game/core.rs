use crate::device_connectivity::interface::DeviceConnectivityEvent;
use crate::device_dialog::interface::{Answer, DeviceDialogEvent};
use crate::device_image_source::interface::{Image, ImageSourceKind};
use crate::image_classifier::interface::{Classification, ClassifyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    pub right: u32,
    pub wrong: u32,
}

impl Score {
    pub fn rounds(&self) -> u32 {
        self.right + self.wrong
    }

    /// Strictly more right than wrong guesses; a tie counts against us.
    pub fn we_win(&self) -> bool {
        self.right > self.wrong
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Requesting,
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq)]
pub enum State {
    Idle {
        permission: Permission,
    },
    AwaitingSourceChoice,
    AwaitingImage {
        source: ImageSourceKind,
        request: u64,
    },
    Classifying {
        image: Image,
        round: u64,
    },
    ClassificationFailed {
        image: Image,
        message: String,
    },
    AwaitingConfirmation {
        label: String,
    },
    ShowingResults,
    Terminated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub state: State,
    pub score: Score,
    /// Last classification round handed out. Never reset, so completions
    /// from an earlier session can't match.
    pub round: u64,
    /// Last capture or pick handed out, stamped the same way as rounds.
    pub request: u64,
}

impl Model {
    fn with_state(self, state: State) -> Self {
        Self { state, ..self }
    }
}

fn is_granted(state: &State) -> bool {
    !matches!(
        state,
        State::Idle {
            permission: Permission::Requesting | Permission::Denied
        } | State::Terminated
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    Start,
    SourceChoice,
    Guess { label: String },
    Results { score: Score },
    ClassificationFailed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    PermissionsRequired,
    NoImage,
    NotConnected,
    ClassificationAbandoned,
    ThanksForPlaying,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SubscribeToConnectivity,
    SubscribeToDialogEvents,
    RequestPermission,
    ShowDialog(Dialog),
    ShowNotice(Notice),
    Capture { request: u64 },
    Pick { request: u64 },
    Classify { image: Image, round: u64 },
    CancelClassification,
    Exit,
}

#[derive(Debug)]
pub enum Event {
    PermissionDone(Result<bool, Box<dyn std::error::Error + Send + Sync>>),
    StartAnswered(Answer),
    SourceAnswered(Answer),
    GuessAnswered(Answer),
    ResultsAnswered(Answer),
    FailureAnswered(Answer),
    ImageDone {
        request: u64,
        result: Result<Option<Image>, Box<dyn std::error::Error + Send + Sync>>,
    },
    ClassifyDone {
        round: u64,
        result: Result<Classification, ClassifyError>,
    },
    ConnectivityEvent(DeviceConnectivityEvent),
    DialogEvent(DeviceDialogEvent),
    Teardown,
}

pub fn init() -> (Model, Vec<Effect>) {
    (
        Model {
            state: State::Idle {
                permission: Permission::Requesting,
            },
            score: Score::default(),
            round: 0,
            request: 0,
        },
        vec![
            Effect::SubscribeToConnectivity,
            Effect::SubscribeToDialogEvents,
            Effect::RequestPermission,
        ],
    )
}

fn choose_source(model: Model) -> (Model, Vec<Effect>) {
    (
        model.with_state(State::AwaitingSourceChoice),
        vec![Effect::ShowDialog(Dialog::SourceChoice)],
    )
}

fn classify(model: Model, image: Image) -> (Model, Vec<Effect>) {
    let round = model.round + 1;
    (
        Model {
            state: State::Classifying {
                image: image.clone(),
                round,
            },
            round,
            ..model
        },
        vec![Effect::Classify { image, round }],
    )
}

fn fetch_image(model: Model, source: ImageSourceKind) -> (Model, Vec<Effect>) {
    let request = model.request + 1;
    let effect = match source {
        ImageSourceKind::Camera => Effect::Capture { request },
        ImageSourceKind::Gallery => Effect::Pick { request },
    };
    (
        Model {
            state: State::AwaitingImage { source, request },
            request,
            ..model
        },
        vec![effect],
    )
}

fn back_to_source_choice(model: Model, notice: Notice) -> (Model, Vec<Effect>) {
    let (model, mut effects) = choose_source(model);
    effects.insert(0, Effect::ShowNotice(notice));
    (model, effects)
}

pub fn transition(mut model: Model, event: Event) -> (Model, Vec<Effect>) {
    // Moved out so image bytes aren't copied; arms that keep it put it back.
    let state = std::mem::replace(&mut model.state, State::Terminated);

    match (state, event) {
        (State::Terminated, _) => (model, vec![]),

        // Leaving the screen
        (State::Classifying { .. }, Event::Teardown)
        | (State::Classifying { .. }, Event::DialogEvent(DeviceDialogEvent::Closed)) => (
            model.with_state(State::Terminated),
            vec![Effect::CancelClassification, Effect::Exit],
        ),
        (_, Event::Teardown) | (_, Event::DialogEvent(DeviceDialogEvent::Closed)) => {
            (model.with_state(State::Terminated), vec![Effect::Exit])
        }

        // Replay starts a fresh session
        (
            State::Idle {
                permission: Permission::Denied,
            },
            Event::DialogEvent(DeviceDialogEvent::Replay),
        ) => (
            model.with_state(State::Idle {
                permission: Permission::Requesting,
            }),
            vec![Effect::RequestPermission],
        ),
        (state, Event::DialogEvent(DeviceDialogEvent::Replay)) if is_granted(&state) => {
            let fresh = Model {
                score: Score::default(),
                ..model
            };
            let (fresh, mut effects) = choose_source(fresh);
            if matches!(state, State::Classifying { .. }) {
                effects.insert(0, Effect::CancelClassification);
            }
            (fresh, effects)
        }

        // Connectivity is advisory only
        (state, Event::ConnectivityEvent(DeviceConnectivityEvent::Disconnected)) => (
            model.with_state(state),
            vec![Effect::ShowNotice(Notice::NotConnected)],
        ),

        // Permission
        (
            State::Idle {
                permission: Permission::Requesting,
            },
            Event::PermissionDone(Ok(true)),
        ) => (
            model.with_state(State::Idle {
                permission: Permission::Granted,
            }),
            vec![Effect::ShowDialog(Dialog::Start)],
        ),
        (
            State::Idle {
                permission: Permission::Requesting,
            },
            Event::PermissionDone(_),
        ) => (
            model.with_state(State::Idle {
                permission: Permission::Denied,
            }),
            vec![Effect::ShowNotice(Notice::PermissionsRequired)],
        ),

        // Start
        (
            State::Idle {
                permission: Permission::Granted,
            },
            Event::StartAnswered(Answer::Positive),
        ) => choose_source(model),
        (
            state @ State::Idle {
                permission: Permission::Granted,
            },
            Event::StartAnswered(Answer::Negative),
        ) => (model.with_state(state), vec![]),

        // Source choice
        (State::AwaitingSourceChoice, Event::SourceAnswered(Answer::Positive)) => {
            fetch_image(model, ImageSourceKind::Camera)
        }
        (State::AwaitingSourceChoice, Event::SourceAnswered(Answer::Negative)) => {
            fetch_image(model, ImageSourceKind::Gallery)
        }

        // Image
        (State::AwaitingImage { request, .. }, Event::ImageDone { request: done, result })
            if request == done =>
        {
            match result {
                Ok(Some(image)) => classify(model, image),
                _ => back_to_source_choice(model, Notice::NoImage),
            }
        }

        // Classification
        (State::Classifying { image, round }, Event::ClassifyDone { round: done, result })
            if round == done =>
        {
            match result {
                Ok(classification) => (
                    model.with_state(State::AwaitingConfirmation {
                        label: classification.label.clone(),
                    }),
                    vec![Effect::ShowDialog(Dialog::Guess {
                        label: classification.label,
                    })],
                ),
                Err(error) => {
                    let message = error.to_string();
                    (
                        model.with_state(State::ClassificationFailed {
                            image,
                            message: message.clone(),
                        }),
                        vec![Effect::ShowDialog(Dialog::ClassificationFailed { message })],
                    )
                }
            }
        }
        (State::ClassificationFailed { image, .. }, Event::FailureAnswered(Answer::Positive)) => {
            classify(model, image)
        }
        (State::ClassificationFailed { .. }, Event::FailureAnswered(Answer::Negative)) => {
            back_to_source_choice(model, Notice::ClassificationAbandoned)
        }

        // Guess
        (State::AwaitingConfirmation { .. }, Event::GuessAnswered(answer)) => {
            let mut score = model.score;
            match answer {
                Answer::Positive => score.right += 1,
                Answer::Negative => score.wrong += 1,
            }
            (
                Model {
                    state: State::ShowingResults,
                    score,
                    ..model
                },
                vec![Effect::ShowDialog(Dialog::Results { score })],
            )
        }

        // Results
        (State::ShowingResults, Event::ResultsAnswered(Answer::Positive)) => choose_source(model),
        (State::ShowingResults, Event::ResultsAnswered(Answer::Negative)) => (
            model.with_state(State::Terminated),
            vec![Effect::ShowNotice(Notice::ThanksForPlaying), Effect::Exit],
        ),

        (state, _) => (model.with_state(state), vec![]),
    }
}
