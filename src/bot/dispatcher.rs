//! Dispatcher module: the per-event conversation state machine

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::catalog::{ClassMapping, PlantCatalog};
use crate::classifier::{ImageClassifier, Prediction};
use crate::config::BotConfig;
use crate::conversation::{
    normalize_input, parse_global_command, parse_plant_selection, ConversationState,
    GlobalCommand,
};
use crate::conversation_store::{ConversationStore, SenderLocks};
use crate::errors::PipelineError;
use crate::image_pipeline;
use crate::media::MediaFetcher;
use crate::templates::Template;

/// One inbound event from the messaging platform
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundMessage {
    /// Opaque sender identifier, e.g. `whatsapp:+263771234567`
    pub sender: String,
    pub body: String,
    pub num_media: u32,
    /// URL of the first attachment
    pub media_url: Option<String>,
    /// Content type the platform declared for the first attachment
    pub media_content_type: Option<String>,
}

impl InboundMessage {
    pub fn text(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn media(sender: impl Into<String>, media_url: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            num_media: 1,
            media_url: Some(media_url.into()),
            ..Default::default()
        }
    }
}

/// Routes inbound events through the conversation state machine
pub struct Dispatcher {
    catalog: Arc<PlantCatalog>,
    mapping: Arc<ClassMapping>,
    classifier: Arc<dyn ImageClassifier>,
    store: Arc<dyn ConversationStore>,
    locks: SenderLocks,
    fetcher: MediaFetcher,
    confidence_threshold: f32,
    input_size: u32,
}

impl Dispatcher {
    pub fn new(
        config: &BotConfig,
        catalog: Arc<PlantCatalog>,
        mapping: Arc<ClassMapping>,
        classifier: Arc<dyn ImageClassifier>,
        store: Arc<dyn ConversationStore>,
    ) -> Result<Self> {
        Ok(Self {
            catalog,
            mapping,
            classifier,
            store,
            locks: SenderLocks::new(&config.conversation),
            fetcher: MediaFetcher::new(&config.media)?,
            confidence_threshold: config.classifier.confidence_threshold,
            input_size: config.classifier.input_size,
        })
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Handle one inbound event and produce the reply
    ///
    /// Events from the same sender are handled one at a time. Every failure is
    /// turned into a reply; nothing here can fail the request.
    pub async fn handle(&self, msg: &InboundMessage) -> Template {
        let lock = self.locks.lock_for(&msg.sender);
        let _guard = lock.lock().await;

        let input = normalize_input(&msg.body);
        debug!(sender = %msg.sender, num_media = msg.num_media, "Handling inbound message");

        match parse_global_command(&input) {
            Some(GlobalCommand::Restart) => {
                info!(sender = %msg.sender, "Conversation restarted");
                self.store.set_state(&msg.sender, ConversationState::Default);
                return Template::Welcome;
            }
            Some(GlobalCommand::Exit) => {
                info!(sender = %msg.sender, "Conversation ended");
                self.store.remove(&msg.sender);
                return Template::Farewell;
            }
            None => {}
        }

        let state = self.store.get_or_create(&msg.sender);

        if msg.num_media > 0 {
            return self.handle_media_message(msg, state).await;
        }

        match state {
            ConversationState::Menu => {
                self.store.set_state(&msg.sender, ConversationState::Default);
                Template::Welcome
            }
            ConversationState::Default => self.handle_menu_option(&msg.sender, &input),
            ConversationState::SelectingPlant => self.handle_plant_selection(&msg.sender, &input),
        }
    }

    fn handle_menu_option(&self, sender: &str, input: &str) -> Template {
        match input {
            "1" => {
                self.store.set_state(sender, ConversationState::SelectingPlant);
                Template::PlantList
            }
            "2" => Template::DeveloperContact,
            _ => Template::Welcome,
        }
    }

    fn handle_plant_selection(&self, sender: &str, input: &str) -> Template {
        let Some(selection) = parse_plant_selection(input) else {
            debug!(sender = %sender, "Invalid plant selection");
            return Template::InvalidSelection;
        };

        self.store.set_state(sender, ConversationState::Default);
        match self.catalog.featured(selection) {
            Some(record) => Template::PlantProfile(record.clone()),
            None => {
                error!(
                    sender = %sender,
                    selection,
                    "data integrity: featured plant has no record"
                );
                Template::PlantNotFound
            }
        }
    }

    async fn handle_media_message(&self, msg: &InboundMessage, state: ConversationState) -> Template {
        if state == ConversationState::Menu {
            return Template::TextFirst;
        }

        let Some(media_url) = msg.media_url.as_deref().filter(|url| !url.trim().is_empty()) else {
            warn!(sender = %msg.sender, "Media announced but no media URL present");
            return Template::MediaMissing;
        };

        debug!(
            sender = %msg.sender,
            declared_content_type = msg.media_content_type.as_deref().unwrap_or("unknown"),
            "Received image from user"
        );

        match self.identify(media_url).await {
            Ok(prediction) => self.reply_for_prediction(&msg.sender, prediction),
            Err(e) => {
                if e.is_internal() {
                    error!(sender = %msg.sender, error = %e, "Image identification failed");
                } else {
                    warn!(sender = %msg.sender, error = %e, "Image rejected");
                }
                e.template()
            }
        }
    }

    /// Fetch, decode, preprocess and classify the image at `media_url`
    async fn identify(&self, media_url: &str) -> Result<Prediction, PipelineError> {
        let bytes = self.fetcher.fetch(media_url).await?;
        let classifier = Arc::clone(&self.classifier);
        let input_size = self.input_size;

        tokio::task::spawn_blocking(move || {
            let input = image_pipeline::prepare(&bytes, input_size)?;
            classifier.classify(input)
        })
        .await?
    }

    fn reply_for_prediction(&self, sender: &str, prediction: Prediction) -> Template {
        info!(
            sender = %sender,
            class_index = prediction.class_index,
            confidence = prediction.confidence,
            "Classifier prediction"
        );

        if prediction.confidence < self.confidence_threshold {
            return Template::LowConfidence;
        }

        let Some(plant_name) = self.mapping.resolve(prediction.class_index) else {
            error!(
                sender = %sender,
                class_index = prediction.class_index,
                "data integrity: class index has no mapping"
            );
            return Template::PlantNotFound;
        };

        let record = self.catalog.lookup(plant_name).cloned();
        if record.is_none() {
            error!(
                sender = %sender,
                scientific_name = %plant_name,
                "data integrity: mapped plant has no record"
            );
        }

        Template::Identified {
            confidence: prediction.confidence,
            plant_name: plant_name.to_string(),
            record,
        }
    }
}
