// ABOUTME: Common test utilities for analyzer integration tests
// ABOUTME: Provides a scripted model client that replays queued responses and records prompts

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uieasy_ai::{ModelClient, ProviderError, ProviderResult};
use uieasy_analyzer::RequirementAnalyzer;
use uieasy_config::ModuleConfig;
use uieasy_prompts::PromptManager;

/// Model client that answers from a queue of scripted responses
pub struct ScriptedClient {
    responses: Mutex<VecDeque<ProviderResult<String>>>,
    prompts: Mutex<Vec<String>>,
    images: Mutex<Vec<bool>>,
    supports_images: bool,
    /// Raise this flag once the given number of calls has completed
    cancel_after: Option<(usize, Arc<AtomicBool>)>,
}

impl ScriptedClient {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
            images: Mutex::new(Vec::new()),
            supports_images: true,
            cancel_after: None,
        }
    }

    pub fn with_results(responses: Vec<ProviderResult<String>>) -> Self {
        let client = Self::new(Vec::<String>::new());
        *client.responses.lock().unwrap() = responses.into_iter().collect();
        client
    }

    pub fn without_images(mut self) -> Self {
        self.supports_images = false;
        self
    }

    pub fn cancel_after(mut self, calls: usize, flag: Arc<AtomicBool>) -> Self {
        self.cancel_after = Some((calls, flag));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn images(&self) -> Vec<bool> {
        self.images.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    fn provider(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    fn supports_images(&self) -> bool {
        self.supports_images
    }

    async fn send(&self, prompt: &str, image: Option<&[u8]>) -> ProviderResult<String> {
        let calls = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };
        self.images.lock().unwrap().push(image.is_some());

        if let Some((after, flag)) = &self.cancel_after {
            if calls >= *after {
                flag.store(true, Ordering::SeqCst);
            }
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ProviderError::InvalidResponse))
    }
}

pub const OVERVIEW_RESPONSE: &str =
    r#"{"project_overview": "A task manager for small teams", "target_audience": "Team leads"}"#;

pub const REQUIREMENTS_RESPONSE: &str = r#"Here is the analysis:
```json
{
  "requirements": [
    {
      "id": "req-login",
      "title": "User login",
      "description": "Users must sign in with email and password",
      "type": "functional",
      "priority": "critical",
      "acceptance_criteria": ["Wrong password shows an error"]
    },
    {
      "id": "req-button",
      "title": "Submit button",
      "description": "Primary button that submits the task form",
      "type": "ui_component",
      "priority": "high",
      "dependencies": ["User login"]
    }
  ]
}
```"#;

pub const COMPONENT_RESPONSE: &str =
    r#"{"name": "SubmitButton", "type": "button", "events": ["click"], "properties": {"variant": "primary"}}"#;

/// Analyzer over a scripted client with built-in prompts
pub fn analyzer(client: Arc<ScriptedClient>, detail_passes: bool) -> RequirementAnalyzer {
    let module = ModuleConfig {
        detail_passes,
        ..Default::default()
    };
    RequirementAnalyzer::new(client, PromptManager::builtin().unwrap(), module)
}
