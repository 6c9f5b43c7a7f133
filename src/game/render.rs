use crate::device_dialog::interface::{Advisory, Prompt};
use crate::game::core::{Dialog, Notice, Score};
use rand::Rng;

const APP_TITLE: &str = "WhatsIt";

pub const WE_WIN: [&str; 10] = [
    "I told you I was smart.",
    "Machines 1, humans 0.",
    "Not bad for a bunch of numbers, huh?",
    "You can't fool me that easily.",
    "My neurons are on fire today.",
    "Maybe try something harder next time?",
    "I'm getting the hang of this.",
    "Another win for artificial intelligence.",
    "Was that too easy for me?",
    "I could do this all day.",
];

pub const I_GUESSED_WRONG: [&str; 10] = [
    "I'll do better next time, I promise.",
    "Even the smartest machines have off days.",
    "You got me there.",
    "Hmm, that looked different in my training data.",
    "Okay, you win this round.",
    "I need more coffee. Or electricity.",
    "Give me another chance?",
    "I guess I'm still learning.",
    "That was a tricky one.",
    "Don't tell my programmers about this.",
];

pub fn closing_comment<R: Rng + ?Sized>(score: &Score, rng: &mut R) -> &'static str {
    let comments = if score.we_win() {
        &WE_WIN
    } else {
        &I_GUESSED_WRONG
    };
    comments[rng.random_range(0..comments.len())]
}

pub fn results_message(score: &Score, comment: &str) -> String {
    format!(
        "Right guesses: {}\nWrong guesses: {}\n\n{}\n\n Do you want to play again?",
        score.right, score.wrong, comment
    )
}

fn prompt(title: &str, message: String, positive: &str, negative: &str) -> Prompt {
    Prompt {
        title: title.to_string(),
        message,
        positive: positive.to_string(),
        negative: negative.to_string(),
    }
}

pub fn render_dialog<R: Rng + ?Sized>(dialog: &Dialog, rng: &mut R) -> Prompt {
    match dialog {
        Dialog::Start => prompt(
            APP_TITLE,
            "I'm an artificial intelligence being. Want to see how smart I am? \
             You show me a picture, and I'll guess what it is."
                .to_string(),
            "I'll play",
            "I'll skip",
        ),
        Dialog::SourceChoice => prompt(
            APP_TITLE,
            "Camera or photo library?".to_string(),
            "Camera",
            "Photo Library",
        ),
        Dialog::Guess { label } => prompt(APP_TITLE, format!("Is it a {} ?", label), "Yes", "No"),
        Dialog::Results { score } => prompt(
            "Results",
            results_message(score, closing_comment(score, rng)),
            "I'll play",
            "I'll skip",
        ),
        Dialog::ClassificationFailed { message } => prompt(
            "I couldn't make it out",
            format!("{}\n\nShall I try that picture again?", message),
            "Retry",
            "Abandon",
        ),
    }
}

pub fn render_notice(notice: Notice) -> Advisory {
    match notice {
        Notice::PermissionsRequired => Advisory {
            title: Some("Please grant those permissions".to_string()),
            message: "Camera and storage access are required to play. \
                      Install the capture program, then choose Play again."
                .to_string(),
        },
        Notice::NoImage => Advisory {
            title: None,
            message: "No photos were found or selected".to_string(),
        },
        Notice::NotConnected => Advisory {
            title: Some("You are not connected to the network".to_string()),
            message: "Please turn on WiFi for best performance".to_string(),
        },
        Notice::ClassificationAbandoned => Advisory {
            title: None,
            message: "Let's try a different picture".to_string(),
        },
        Notice::ThanksForPlaying => Advisory {
            title: None,
            message: "Thanks for playing!".to_string(),
        },
    }
}
