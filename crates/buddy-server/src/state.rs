use anyhow::Result;
use buddy::agent::Agent;
use buddy::notifier::{DisabledNotifier, Notifier, PushoverNotifier};
use buddy::persona::PersonaContext;
use buddy::providers::configs::ProviderConfig;
use buddy::providers::factory::get_provider;
use buddy::registry::ToolRegistry;
use buddy::research::{OpenAiWebSearcher, ReportWriter, ResearchManager, WebResearchManager};
use std::sync::Arc;

use crate::configuration::Settings;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
    pub persona: Arc<PersonaContext>,
    pub writer: Arc<ReportWriter>,
    pub research: Arc<dyn ResearchManager>,
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let persona = PersonaContext::load(
            &settings.persona.name,
            &settings.persona.summary_path,
            &settings.persona.profile_path,
        )?;

        let notifier: Arc<dyn Notifier> = match settings.notifier.pushover() {
            Some(config) => Arc::new(PushoverNotifier::new(config)?),
            None => {
                tracing::warn!("Pushover credentials not configured, notifications are disabled");
                Arc::new(DisabledNotifier)
            }
        };

        let openai_config = settings.provider.openai_config();
        let provider = get_provider(ProviderConfig::OpenAi(openai_config.clone()))?;
        let registry = ToolRegistry::new(notifier)
            .with_unknown_tool_policy(settings.agent.unknown_tool);
        let agent = Agent::new(provider.clone(), registry).with_max_turns(settings.agent.max_turns);

        let writer = Arc::new(ReportWriter::new(provider.clone()));
        let research = WebResearchManager::new(
            provider,
            Arc::new(OpenAiWebSearcher::new(&openai_config)?),
            writer.clone(),
        )
        .with_search_count(settings.research.search_count);

        Ok(Self {
            agent: Arc::new(agent),
            persona: Arc::new(persona),
            writer,
            research: Arc::new(research),
        })
    }
}
