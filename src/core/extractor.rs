//! 從生成的原始碼文字中取出宣告的 package 與型別名稱。
//!
//! 每次擷取只看一行宣告：
//!
//! ```text
//! namespace-decl := "package" WS dotted-ident [";"]
//! type-decl      := { modifier WS } type-keyword WS ident [generics | params] ... "{" ...
//! type-keyword   := "class" | "interface" | "enum" | "record"
//! ```
//!
//! 第一個符合的行勝出，所以之後出現的內部類別不會影響結果。

use crate::domain::model::ArtifactKind;
use crate::utils::error::CodegenError;
use thiserror::Error;

pub const NAMESPACE_KEYWORD: &str = "package";
pub const TYPE_KEYWORDS: [&str; 4] = ["class", "interface", "enum", "record"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no line starts with 'package'")]
    MissingNamespace,

    #[error("invalid package name '{0}'")]
    InvalidNamespace(String),

    #[error("no type declaration line with an opening brace")]
    MissingTypeDeclaration,
}

impl ExtractError {
    pub fn into_malformed(self, kind: ArtifactKind) -> CodegenError {
        CodegenError::MalformedArtifact {
            artifact: kind.label().to_string(),
            reason: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHeader {
    pub namespace: String,
    pub type_name: String,
}

impl SourceHeader {
    pub fn parse(source: &str) -> Result<Self, ExtractError> {
        Ok(Self {
            namespace: extract_namespace(source)?,
            type_name: extract_type_name(source)?,
        })
    }

    /// `com.acme.shop` → `com/acme/shop`
    pub fn namespace_path(&self) -> String {
        self.namespace.replace('.', "/")
    }
}

pub fn extract_namespace(source: &str) -> Result<String, ExtractError> {
    let declaration = source
        .lines()
        .map(str::trim)
        .find_map(strip_namespace_keyword)
        .ok_or(ExtractError::MissingNamespace)?;

    let name = declaration
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    if name.split('.').all(is_identifier) {
        Ok(name)
    } else {
        Err(ExtractError::InvalidNamespace(name))
    }
}

pub fn extract_type_name(source: &str) -> Result<String, ExtractError> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !is_comment(line) && line.contains('{'))
        .find_map(type_name_on_line)
        .ok_or(ExtractError::MissingTypeDeclaration)
}

fn strip_namespace_keyword(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(NAMESPACE_KEYWORD)?;
    rest.starts_with(char::is_whitespace).then_some(rest)
}

fn type_name_on_line(line: &str) -> Option<String> {
    let mut tokens = line.split_whitespace();
    tokens.find(|token| TYPE_KEYWORDS.contains(token))?;

    let candidate = tokens.next()?;
    let end = candidate
        .find(|c: char| !is_identifier_char(c))
        .unwrap_or(candidate.len());
    let name = &candidate[..end];

    is_identifier(name).then(|| name.to_string())
}

fn is_comment(line: &str) -> bool {
    line.starts_with("//") || line.starts_with("/*") || line.starts_with('*')
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {
            chars.all(is_identifier_char)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEM_MODEL: &str = r#"package com.acme.shop.model;

import com.google.cloud.spring.data.spanner.core.mapping.Table;

@Table(name = "items")
public class Item {
    private String name;

    public static class Builder {
        private String name;
    }
}
"#;

    #[test]
    fn test_extract_header_ignores_inner_types() {
        let header = SourceHeader::parse(ITEM_MODEL).unwrap();
        assert_eq!(header.namespace, "com.acme.shop.model");
        assert_eq!(header.type_name, "Item");
        assert_eq!(header.namespace_path(), "com/acme/shop/model");
    }

    #[test]
    fn test_extract_type_name_with_modifiers_and_generics() {
        let source = "package com.acme;\n\npublic abstract class Repo<T, ID> extends Base<T> {\n}";
        assert_eq!(extract_type_name(source).unwrap(), "Repo");

        let source = "package com.acme;\npublic interface ItemRepository extends SpannerRepository<Item, String> {}";
        assert_eq!(extract_type_name(source).unwrap(), "ItemRepository");

        let source = "package com.acme;\npublic record Price(String currency, long cents) {}";
        assert_eq!(extract_type_name(source).unwrap(), "Price");

        let source = "package com.acme;\nfinal class Compact{";
        assert_eq!(extract_type_name(source).unwrap(), "Compact");
    }

    #[test]
    fn test_declaration_without_brace_on_same_line_is_skipped() {
        let source = "package com.acme;\npublic class Split\n{\n}\nclass Later {\n}";
        assert_eq!(extract_type_name(source).unwrap(), "Later");
    }

    #[test]
    fn test_keyword_must_be_a_whole_token() {
        let source = "package com.acme;\npublic subclass Foo {\n}";
        assert_eq!(
            extract_type_name(source),
            Err(ExtractError::MissingTypeDeclaration)
        );
    }

    #[test]
    fn test_comments_do_not_count_as_declarations() {
        let source = "package com.acme;\n// this class { is documented\npublic class Real {\n}";
        assert_eq!(extract_type_name(source).unwrap(), "Real");
    }

    #[test]
    fn test_missing_namespace() {
        let source = "import java.util.List;\npublic class Item {\n}";
        assert_eq!(extract_namespace(source), Err(ExtractError::MissingNamespace));

        // 關鍵字必須獨立成詞
        let source = "packages com.acme;\npublic class Item {\n}";
        assert_eq!(extract_namespace(source), Err(ExtractError::MissingNamespace));
    }

    #[test]
    fn test_namespace_without_terminator_and_with_indentation() {
        let source = "   package com.acme.shop\npublic class Item {}";
        assert_eq!(extract_namespace(source).unwrap(), "com.acme.shop");
    }

    #[test]
    fn test_invalid_namespace_is_rejected() {
        let source = "package ../../etc;\npublic class Item {}";
        assert!(matches!(
            extract_namespace(source),
            Err(ExtractError::InvalidNamespace(_))
        ));

        let source = "package ;\npublic class Item {}";
        assert!(matches!(
            extract_namespace(source),
            Err(ExtractError::InvalidNamespace(_))
        ));
    }

    #[test]
    fn test_into_malformed_names_the_artifact() {
        let err = ExtractError::MissingNamespace.into_malformed(ArtifactKind::Service);
        match err {
            CodegenError::MalformedArtifact { artifact, reason } => {
                assert_eq!(artifact, "service");
                assert!(reason.contains("package"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
