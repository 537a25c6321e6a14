//! `llmgate ask` — Run one prompt through the pipeline without the HTTP layer.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use llmgate_core::message::{GenerationRequest, StreamChunk};
use llmgate_inference::OllamaClient;
use llmgate_pipeline::{Generator, PromptComposer, PromptLabels};

#[derive(clap::Args)]
pub struct AskArgs {
    /// The prompt to send
    pub prompt: String,

    /// Model to use instead of the configured default
    #[arg(short, long)]
    pub model: Option<String>,

    /// System text placed at the top of the prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Extra context placed after the knowledge block
    #[arg(long)]
    pub context: Option<String>,

    /// Only inject knowledge from this category
    #[arg(long)]
    pub category: Option<String>,

    /// Do not inject stored knowledge
    #[arg(long)]
    pub no_knowledge: bool,

    /// Maximum tokens to generate (-1 for no limit)
    #[arg(long, default_value_t = 100, allow_negative_numbers = true)]
    pub max_length: i32,

    /// Sampling temperature
    #[arg(short, long, default_value_t = 0.7)]
    pub temperature: f32,

    /// Wait for the complete answer instead of streaming it
    #[arg(long)]
    pub no_stream: bool,
}

impl AskArgs {
    fn into_request(self) -> GenerationRequest {
        let mut request = GenerationRequest::new(self.prompt);
        request.model = self.model;
        request.system = self.system;
        request.context = self.context;
        request.knowledge_category = self.category;
        request.use_knowledge = !self.no_knowledge;
        request.max_length = self.max_length;
        request.temperature = self.temperature;
        request.stream = !self.no_stream;
        request
    }
}

pub async fn run(
    config_path: Option<&Path>,
    args: AskArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    let store = llmgate_knowledge::open_store(&config.knowledge).await?;
    let backend = Arc::new(OllamaClient::from_config(&config.backend)?);
    let composer = PromptComposer::new(store, PromptLabels::for_locale(&config.prompt.locale));
    let generator = Generator::new(backend, composer, &config.backend.default_model);

    let request = args.into_request();

    if !request.stream {
        let response = generator.generate(&request).await?;
        println!("{}", response.generated_text);
        return Ok(());
    }

    let mut chunks = generator.stream(&request).await?;
    let mut stdout = std::io::stdout();
    while let Some(chunk) = chunks.next().await {
        match chunk {
            StreamChunk::Delta { text, .. } => {
                write!(stdout, "{text}")?;
                stdout.flush()?;
            }
            StreamChunk::Error { error } => {
                writeln!(stdout)?;
                return Err(format!("Generation failed: {error}").into());
            }
        }
    }
    writeln!(stdout)?;

    Ok(())
}
