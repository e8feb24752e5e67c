//! Message templates for every reply the bot can send
//!
//! All outbound text lives here so that exact-text assertions stay in one place.

use crate::catalog::{PlantRecord, FEATURED_PLANTS};

/// Footer appended to replies that leave the conversation open
pub const NAVIGATION_HINT: &str =
    "You can type 'Menu' to start over or 'Exit' to end the conversation.";

const WELCOME: &str = "🌿 *Welcome to Doctor Roots!* 🌿 \n\nI'm your friendly medicinal plant bot.\n\n📸*Send me a clear photo of a plant - I'll try to identify it and share fun facts about it!*📸\n\nOr choose one of these options:\n1️⃣ Learn more about other plants\n2️⃣ Contact the developer\n\n🚨Important Disclaimer🚨\nThe information disseminated here is for educational purposes only and should not be taken as medical advice.";

const FAREWELL: &str = "Thank you for trying out Doctor Roots! If you have any feedback or questions, feel free to reach out. Have a great day!";

const DEVELOPER_CONTACT: &str = "This project was created by Ruva, a passionate CS student, with the aim of helping Africa where 80% of people use traditional medicinal plants (per UN data). There's a critical lack of reliable, accessible tools for accurate plant identification. \n\nWant to contribute to the knowledge base? Reach out using the following: \n👩‍💻 GitHub:https://github.com/RuvaS20 \n📧 Email: ruvarashe.sadya@gmail.com";

const INVALID_SELECTION: &str = "Invalid selection. Please select a number from the list of plants. Or type 'Menu' to start over or 'Exit' to end the conversation.";

pub const PLANT_NOT_FOUND: &str = "Plant not found in database";

/// Every reply the dispatcher can produce
#[derive(Debug, Clone, PartialEq)]
pub enum Template {
    Welcome,
    Farewell,
    DeveloperContact,
    PlantList,
    InvalidSelection,
    /// Full profile of a plant picked from the list
    PlantProfile(PlantRecord),
    /// Classifier result above the confidence threshold
    Identified {
        confidence: f32,
        plant_name: String,
        record: Option<PlantRecord>,
    },
    LowConfidence,
    TextFirst,
    MediaMissing,
    DownloadStatus(u16),
    DownloadFailed(String),
    NotAnImage,
    MediaTooLarge,
    FormatNotRecognized,
    FormatNotSupported,
    ProcessingError,
    PlantNotFound,
}

impl Template {
    /// Render the template to the exact text sent to the user
    pub fn render(&self) -> String {
        match self {
            Template::Welcome => WELCOME.to_string(),
            Template::Farewell => FAREWELL.to_string(),
            Template::DeveloperContact => DEVELOPER_CONTACT.to_string(),
            Template::PlantList => format!(
                "🌿 *Eeny, meeny, miny, grow!* 🌿\n\nWhich lucky plant will you get to know?\n\n{} \n\n{NAVIGATION_HINT}",
                format_plant_list()
            ),
            Template::InvalidSelection => INVALID_SELECTION.to_string(),
            Template::PlantProfile(record) => record.render_profile(),
            Template::Identified {
                confidence,
                plant_name,
                record,
            } => {
                let info = record
                    .as_ref()
                    .map(PlantRecord::render_profile)
                    .unwrap_or_else(|| PLANT_NOT_FOUND.to_string());
                format!(
                    "*Leaf it to me! 🔍 I'm {} confident this is {plant_name}!* 🌿\n\n{info} \n\n{NAVIGATION_HINT}",
                    format_confidence(*confidence)
                )
            }
            Template::LowConfidence => format!(
                "I'm not confident enough to identify this plant. Please try another image. \n\n{NAVIGATION_HINT}"
            ),
            Template::TextFirst => "Please send a text message first.".to_string(),
            Template::MediaMissing => {
                "Sorry, I couldn't find the image you sent. Please try sending it again.".to_string()
            }
            Template::DownloadStatus(status) => {
                format!("Failed to download image. HTTP status code: {status}")
            }
            Template::DownloadFailed(detail) => {
                format!("Sorry, I had trouble downloading the image. Error: {detail}")
            }
            Template::NotAnImage => {
                "The URL does not point to a valid image. Please try sending an image.".to_string()
            }
            Template::MediaTooLarge => {
                "Sorry, that image is too large for me to process. Please send a smaller photo."
                    .to_string()
            }
            Template::FormatNotRecognized => {
                "Sorry, the image format is not recognized. Please try a different image."
                    .to_string()
            }
            Template::FormatNotSupported => {
                "Sorry, the image format is not supported. Please try a different image."
                    .to_string()
            }
            Template::ProcessingError => {
                "Sorry, there was an error processing your image. Please try again with a different photo."
                    .to_string()
            }
            Template::PlantNotFound => PLANT_NOT_FOUND.to_string(),
        }
    }
}

/// Format a confidence in [0,1] as a percentage with one decimal place
pub fn format_confidence(confidence: f32) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// Format the featured plants as a keycap-numbered list
fn format_plant_list() -> String {
    FEATURED_PLANTS
        .iter()
        .enumerate()
        .map(|(i, plant)| format!("{}\u{fe0f}\u{20e3} {}", i + 1, plant.display_name))
        .collect::<Vec<_>>()
        .join("\n")
}
