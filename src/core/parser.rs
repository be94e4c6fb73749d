use crate::domain::model::ArtifactBundle;
use crate::utils::error::{CodegenError, Result};

/// 預設的 artifact 分隔符號，bundle prompt 會要求模型在每個檔案之間輸出它
pub const DEFAULT_SEPARATOR: &str = "codegenseparator";

/// 將單次生成回應切成固定順序的 7 個 artifact
#[derive(Debug, Clone)]
pub struct ArtifactParser {
    separator: String,
}

impl ArtifactParser {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn parse(&self, response: &str) -> Result<ArtifactBundle> {
        let segments: Vec<&str> = response.split(self.separator.as_str()).map(str::trim).collect();

        tracing::debug!(
            "Split generation response into {} segments (expected {})",
            segments.len(),
            ArtifactBundle::ARITY
        );

        if segments.len() < ArtifactBundle::ARITY {
            return Err(CodegenError::IncompleteGeneration {
                expected: ArtifactBundle::ARITY,
                found: segments.len(),
            });
        }

        if segments.len() > ArtifactBundle::ARITY {
            // 多出的片段（通常是結尾多餘的分隔符號）直接忽略
            tracing::debug!(
                "Ignoring {} trailing segment(s)",
                segments.len() - ArtifactBundle::ARITY
            );
        }

        let ordered: [String; 7] = std::array::from_fn(|i| segments[i].to_string());
        ArtifactBundle::from_ordered(ordered)
    }
}

impl Default for ArtifactParser {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ArtifactKind;

    fn join(parts: &[&str]) -> String {
        parts.join(&format!("\n{}\n", DEFAULT_SEPARATOR))
    }

    #[test]
    fn test_parse_seven_segments_in_order() {
        let response = join(&[
            "  package a; class Model {}  ",
            "package a; interface Repo {}",
            "package a; class Svc {}",
            "package a; class Ctl {}",
            "package a; class Application {}",
            "<project/>",
            "server.port=8080\n",
        ]);

        let bundle = ArtifactParser::default().parse(&response).unwrap();

        assert_eq!(bundle.get(ArtifactKind::Model), "package a; class Model {}");
        assert_eq!(bundle.get(ArtifactKind::Application), "package a; class Application {}");
        assert_eq!(bundle.get(ArtifactKind::BuildDescriptor), "<project/>");
        assert_eq!(bundle.get(ArtifactKind::RuntimeProperties), "server.port=8080");
    }

    #[test]
    fn test_fewer_segments_is_incomplete() {
        let response = join(&["a", "b", "c", "d", "e"]);
        let err = ArtifactParser::default().parse(&response).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::IncompleteGeneration {
                expected: 7,
                found: 5
            }
        ));
    }

    #[test]
    fn test_response_without_separator_is_incomplete() {
        let err = ArtifactParser::default()
            .parse("package a;\npublic class Only {}")
            .unwrap_err();
        assert!(matches!(err, CodegenError::IncompleteGeneration { found: 1, .. }));
    }

    #[test]
    fn test_extra_segments_are_ignored() {
        let mut response = join(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        response.push_str(&format!("\n{}\n", DEFAULT_SEPARATOR));

        let bundle = ArtifactParser::default().parse(&response).unwrap();
        assert_eq!(bundle.get(ArtifactKind::RuntimeProperties), "g");
    }

    #[test]
    fn test_blank_segment_within_arity_is_incomplete() {
        let response = join(&["a", "b", "   ", "d", "e", "f", "g"]);
        let err = ArtifactParser::default().parse(&response).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::IncompleteGeneration {
                expected: 7,
                found: 6
            }
        ));
    }

    #[test]
    fn test_custom_separator() {
        let parser = ArtifactParser::new("@@FILE@@");
        let response = "a@@FILE@@b@@FILE@@c@@FILE@@d@@FILE@@e@@FILE@@f@@FILE@@g";
        let bundle = parser.parse(response).unwrap();
        assert_eq!(bundle.get(ArtifactKind::Controller), "d");
        assert_eq!(parser.separator(), "@@FILE@@");
    }
}
