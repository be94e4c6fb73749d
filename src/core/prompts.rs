use crate::utils::error::{CodegenError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const INPUT_PLACEHOLDER: &str = "{{input}}";
pub const SEPARATOR_PLACEHOLDER: &str = "{{separator}}";

pub const DEFAULT_BRIEF_TEMPLATE: &str = r#"You are an expert Spring Boot developer.
Summarize the structure of this JSON schema: {{input}}

Describe each class name, its attributes and their types.
Call out relationships such as one-to-many or many-to-one and any inner classes,
and group related attributes together.
State the root package name.
Reply with the summary only, as plain text without markdown fences."#;

pub const DEFAULT_BUNDLE_TEMPLATE: &str = r#"You are an expert Spring Boot developer.
Build a project from this structure summary: {{input}}

Produce exactly seven files in the order below. After each file write the line
{{separator}}
and then start the next file. Every Java file must begin with its package declaration
and nothing may precede it. The pom.xml and application.properties files must begin with
their actual content.

1. The model class under <root package>.model with fields, constructors, getters, setters,
   toString, and the Spanner mapping annotations (com.google.cloud.spring.data.spanner.core.mapping).
2. The Spanner repository interface under <root package>.repository.
3. The service class under <root package>.service implementing create, read, update, delete
   and getAll on top of the repository.
4. The REST controller under <root package>.controller exposing the service operations,
   annotated with @RestController, @RequestMapping and @CrossOrigin.
5. The @SpringBootApplication class named Application in the root package.
6. A complete pom.xml for a Spring Boot web project with the
   spring-cloud-gcp-starter-data-spanner dependency, using current Spring Boot and Java versions.
   It must start with <?xml version="1.0" encoding="UTF-8"?>.
7. An application.properties file with Spanner settings for the credentials location,
   project id, instance id and database id.

Include all required imports. Reply with code only, without markdown fences."#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    Brief,
    Bundle,
}

impl GenerationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStage::Brief => "brief",
            GenerationStage::Bundle => "artifact bundle",
        }
    }
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 單一階段的生成請求，建立後不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest<'a> {
    pub stage: GenerationStage,
    template: &'a str,
    input: &'a str,
}

impl<'a> GenerationRequest<'a> {
    pub fn new(stage: GenerationStage, template: &'a str, input: &'a str) -> Self {
        Self {
            stage,
            template,
            input,
        }
    }

    pub fn render(&self) -> String {
        self.template.replacen(INPUT_PLACEHOLDER, self.input, 1)
    }
}

/// Brief 與 bundle 兩個階段的 prompt 樣板
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSet {
    pub brief: String,
    pub bundle: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            brief: DEFAULT_BRIEF_TEMPLATE.to_string(),
            bundle: DEFAULT_BUNDLE_TEMPLATE.to_string(),
        }
    }
}

impl PromptSet {
    /// 每個樣板必須剛好有一個輸入佔位符；bundle 樣板還要告訴模型分隔符號
    pub fn validate(&self) -> Result<()> {
        check_placeholder("prompts.brief", &self.brief)?;
        check_placeholder("prompts.bundle", &self.bundle)?;

        if !self.bundle.contains(SEPARATOR_PLACEHOLDER) {
            return Err(CodegenError::ConfigValidationError {
                field: "prompts.bundle".to_string(),
                message: format!(
                    "template must contain the {} placeholder",
                    SEPARATOR_PLACEHOLDER
                ),
            });
        }
        Ok(())
    }

    /// 將分隔符號填入 bundle 樣板
    pub fn with_separator(mut self, separator: &str) -> Self {
        self.bundle = self.bundle.replace(SEPARATOR_PLACEHOLDER, separator);
        self
    }

    pub fn brief_request<'a>(&'a self, schema_input: &'a str) -> GenerationRequest<'a> {
        GenerationRequest::new(GenerationStage::Brief, &self.brief, schema_input)
    }

    pub fn bundle_request<'a>(&'a self, brief: &'a str) -> GenerationRequest<'a> {
        GenerationRequest::new(GenerationStage::Bundle, &self.bundle, brief)
    }
}

fn check_placeholder(field: &str, template: &str) -> Result<()> {
    let count = template.matches(INPUT_PLACEHOLDER).count();
    if count != 1 {
        return Err(CodegenError::ConfigValidationError {
            field: field.to_string(),
            message: format!(
                "template must contain exactly one {} placeholder, found {}",
                INPUT_PLACEHOLDER, count
            ),
        });
    }
    Ok(())
}
