use crate::core::archive::ArchiveBuilder;
use crate::core::materializer::{ProjectLayout, ProjectMaterializer};
use crate::core::parser::{ArtifactParser, DEFAULT_SEPARATOR};
use crate::core::prompts::{GenerationRequest, PromptSet};
use crate::core::workspace::Workspace;
use crate::domain::model::Schema;
use crate::domain::ports::CompletionService;
use crate::utils::error::{CodegenError, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

static RUN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// 單次執行的線性狀態機；`Failed` 可由任何非終止狀態進入
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    BriefRequested,
    BriefReceived,
    ArtifactsRequested,
    ArtifactsReceived,
    Parsed,
    Materialized,
    Archived,
    Done,
    Failed(String),
}

impl PipelineState {
    pub fn successor(&self) -> Option<PipelineState> {
        use PipelineState::*;
        match self {
            Idle => Some(BriefRequested),
            BriefRequested => Some(BriefReceived),
            BriefReceived => Some(ArtifactsRequested),
            ArtifactsRequested => Some(ArtifactsReceived),
            ArtifactsReceived => Some(Parsed),
            Parsed => Some(Materialized),
            Materialized => Some(Archived),
            Archived => Some(Done),
            Done | Failed(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Failed(reason) => write!(f, "Failed({})", reason),
            other => write!(f, "{:?}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub state: PipelineState,
    pub elapsed: Duration,
}

/// 單次執行的上下文，記錄狀態歷程
#[derive(Debug, Clone)]
pub struct RunContext {
    pub execution_id: String,
    started_at: Instant,
    history: Vec<StateTransition>,
}

impl RunContext {
    pub fn new() -> Self {
        let execution_id = format!(
            "run-{}-{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%S"),
            RUN_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        Self::with_id(execution_id)
    }

    pub fn with_id(execution_id: String) -> Self {
        Self {
            execution_id,
            started_at: Instant::now(),
            history: vec![StateTransition {
                state: PipelineState::Idle,
                elapsed: Duration::ZERO,
            }],
        }
    }

    pub fn state(&self) -> &PipelineState {
        // history 至少包含 Idle
        &self.history[self.history.len() - 1].state
    }

    pub fn states(&self) -> Vec<PipelineState> {
        self.history.iter().map(|t| t.state.clone()).collect()
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    fn push(&mut self, state: PipelineState) {
        tracing::debug!("[{}] {} -> {}", self.execution_id, self.state(), state);
        self.history.push(StateTransition {
            state,
            elapsed: self.started_at.elapsed(),
        });
    }

    fn advance(&mut self) {
        if let Some(next) = self.state().successor() {
            self.push(next);
        }
    }

    fn fail(&mut self, error: &CodegenError) {
        if !self.state().is_terminal() {
            self.push(PipelineState::Failed(error.to_string()));
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// 專案樹寫入方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceMode {
    InMemory,
    TempDir { parent: Option<PathBuf> },
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub separator: String,
    pub layout: ProjectLayout,
    pub prompts: PromptSet,
    pub workspace: WorkspaceMode,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            layout: ProjectLayout::default(),
            prompts: PromptSet::default(),
            workspace: WorkspaceMode::TempDir { parent: None },
        }
    }
}

impl Validate for PipelineOptions {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("generation.separator", &self.separator)?;
        self.layout.validate()?;
        self.prompts.validate()
    }
}

/// 兩階段生成管線：schema → brief → artifact bundle → 專案樹 → ZIP
pub struct CodegenPipeline<G: CompletionService> {
    generator: G,
    prompts: PromptSet,
    parser: ArtifactParser,
    materializer: ProjectMaterializer,
    archiver: ArchiveBuilder,
    workspace: WorkspaceMode,
}

impl<G: CompletionService> CodegenPipeline<G> {
    pub fn new(generator: G) -> Self {
        Self::from_parts(generator, PipelineOptions::default())
    }

    pub fn with_options(generator: G, options: PipelineOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::from_parts(generator, options))
    }

    fn from_parts(generator: G, options: PipelineOptions) -> Self {
        Self {
            generator,
            prompts: options.prompts.with_separator(&options.separator),
            parser: ArtifactParser::new(options.separator),
            materializer: ProjectMaterializer::new(options.layout),
            archiver: ArchiveBuilder::new(),
            workspace: options.workspace,
        }
    }

    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    pub fn layout(&self) -> &ProjectLayout {
        self.materializer.layout()
    }

    /// 產生專案 ZIP 的位元組；失敗時不會回傳任何部分結果
    pub async fn generate(&self, schema: &Schema) -> Result<Vec<u8>> {
        let mut context = RunContext::new();
        self.run(schema, &mut context).await
    }

    pub async fn run(&self, schema: &Schema, context: &mut RunContext) -> Result<Vec<u8>> {
        tracing::info!(
            "🚀 [{}] Starting generation for root package {}",
            context.execution_id,
            schema.root_package()
        );

        match self.execute(schema, context).await {
            Ok(archive) => {
                context.advance();
                tracing::info!(
                    "✅ [{}] Generation finished: {} bytes in {:?}",
                    context.execution_id,
                    archive.len(),
                    context.elapsed()
                );
                Ok(archive)
            }
            Err(e) => {
                let failed_after = context.state().clone();
                context.fail(&e);
                tracing::error!(
                    "❌ [{}] Generation failed after {}: {} (Category: {:?})",
                    context.execution_id,
                    failed_after,
                    e,
                    e.category()
                );
                Err(e)
            }
        }
    }

    async fn execute(&self, schema: &Schema, context: &mut RunContext) -> Result<Vec<u8>> {
        // 工作目錄在函式結束時釋放，不論成功或失敗
        let workspace = match &self.workspace {
            WorkspaceMode::TempDir { parent } => Some(Workspace::acquire(parent.as_deref())?),
            WorkspaceMode::InMemory => None,
        };
        let schema_input = schema.to_prompt_input()?;

        context.advance();
        let brief = self.request(self.prompts.brief_request(&schema_input)).await?;
        context.advance();

        if brief.contains(self.parser.separator()) {
            tracing::warn!(
                "[{}] Brief contains the artifact separator; continuing",
                context.execution_id
            );
        }

        context.advance();
        let bundle_text = self.request(self.prompts.bundle_request(&brief)).await?;
        context.advance();

        let bundle = self.parser.parse(&bundle_text)?;
        context.advance();

        let tree = self.materializer.materialize(&bundle, schema.root_package())?;
        if let Some(workspace) = &workspace {
            workspace.write_tree(&tree)?;
        }
        context.advance();
        tracing::info!(
            "📁 [{}] Materialized {} files",
            context.execution_id,
            tree.len()
        );

        let archive = match &workspace {
            Some(workspace) => self.archiver.build_from_workspace(&tree, workspace)?,
            None => self.archiver.build(&tree)?,
        };
        context.advance();

        Ok(archive)
    }

    async fn request(&self, request: GenerationRequest<'_>) -> Result<String> {
        let prompt = request.render();
        tracing::info!("🤖 Requesting {} ({} chars)", request.stage, prompt.len());

        let started = Instant::now();
        let response = self.generator.complete(&prompt).await?;
        tracing::debug!(
            "Received {} response: {} chars in {:?}",
            request.stage,
            response.len(),
            started.elapsed()
        );

        if response.trim().is_empty() {
            return Err(CodegenError::GenerationError {
                stage: request.stage.to_string(),
                message: "empty response".to_string(),
            });
        }

        Ok(response)
    }
}
