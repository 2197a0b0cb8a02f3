//! Template-backed components.
//!
//! Templates are markup with `{{ path }}` interpolations. A path is a dotted
//! lookup such as `msg`, `user.name` or `items.0`. Bare names resolve props
//! first, then instance data, then globals; `$props.`, `$data.` and
//! `$globals.` pin the lookup to one scope. Interpolated values are escaped.

use async_trait::async_trait;
use serde_json::Value;

use crate::component::{escape_html, Component, RenderContext};
use crate::props::Props;

/// Errors produced while parsing a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unclosed interpolation starting at byte {0}")]
    Unclosed(usize),

    #[error("empty interpolation at byte {0}")]
    EmptyExpression(usize),

    #[error("invalid path '{path}' at byte {offset}")]
    InvalidPath { path: String, offset: usize },
}

/// Lookup scope of an interpolation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Any,
    Props,
    Data,
    Globals,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Path {
    scope: Scope,
    keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Expr(Path),
}

/// A component rendering a parsed markup template.
#[derive(Debug, Clone)]
pub struct TemplateComponent {
    name: String,
    segments: Vec<Segment>,
    props: Vec<String>,
    data: Props,
}

impl TemplateComponent {
    /// Parse a template.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            name: "Template".to_string(),
            segments: parse_segments(template)?,
            props: Vec::new(),
            data: Props::new(),
        })
    }

    /// Set the component name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declare required props.
    pub fn with_props<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.props = props.into_iter().map(Into::into).collect();
        self
    }

    /// Set the initial instance state.
    pub fn with_data(mut self, data: Props) -> Self {
        self.data = data;
        self
    }
}

#[async_trait]
impl Component for TemplateComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn props(&self) -> &[String] {
        &self.props
    }

    fn data(&self) -> Props {
        self.data.clone()
    }

    async fn render(&self, cx: &mut RenderContext<'_>) -> anyhow::Result<()> {
        for segment in &self.segments {
            let markup = match segment {
                Segment::Text(text) => text.clone(),
                Segment::Expr(path) => resolve(path, cx).map(display_value).unwrap_or_default(),
            };
            cx.write(markup).await?;
        }
        Ok(())
    }
}

fn parse_segments(template: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut rest = template;
    let mut offset = 0;

    while let Some(open) = rest.find("{{") {
        if open > 0 {
            segments.push(Segment::Text(rest[..open].to_string()));
        }
        let start = offset + open;
        let after = &rest[open + 2..];
        let close = after.find("}}").ok_or(TemplateError::Unclosed(start))?;
        let expr = after[..close].trim();
        if expr.is_empty() {
            return Err(TemplateError::EmptyExpression(start));
        }
        segments.push(Segment::Expr(parse_path(expr, start)?));

        let consumed = open + 2 + close + 2;
        rest = &rest[consumed..];
        offset += consumed;
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }

    Ok(segments)
}

fn parse_path(expr: &str, offset: usize) -> Result<Path, TemplateError> {
    let invalid = || TemplateError::InvalidPath {
        path: expr.to_string(),
        offset,
    };

    let mut keys: Vec<String> = expr.split('.').map(str::to_string).collect();
    let valid_key = |k: &String| {
        !k.is_empty()
            && k
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '$')
    };
    if !keys.iter().all(valid_key) {
        return Err(invalid());
    }

    let scope = match keys[0].as_str() {
        "$props" => Scope::Props,
        "$data" => Scope::Data,
        "$globals" => Scope::Globals,
        _ => Scope::Any,
    };
    if scope != Scope::Any {
        keys.remove(0);
        if keys.is_empty() {
            return Err(invalid());
        }
    }

    Ok(Path { scope, keys })
}

fn resolve<'v>(path: &Path, cx: &'v RenderContext<'_>) -> Option<&'v Value> {
    let (first, rest) = path.keys.split_first()?;
    let root = match path.scope {
        Scope::Props => cx.props().get(first),
        Scope::Data => cx.data().get(first),
        Scope::Globals => cx.globals().get(first),
        Scope::Any => cx
            .props()
            .get(first)
            .or_else(|| cx.data().get(first))
            .or_else(|| cx.globals().get(first)),
    }?;

    rest.iter().try_fold(root, |value, key| match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => escape_html(s),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => escape_html(&other.to_string()),
    }
}
