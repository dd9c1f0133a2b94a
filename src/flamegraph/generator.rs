//! SVG flamegraph generation using the inferno library.
//!
//! The call tree is flattened into folded stacks (one line per node with own
//! time, weighted in microseconds) and handed to `inferno::flamegraph`.

use crate::aggregator::stack_builder::build_collapsed_stacks;
use crate::tree::CallTree;
use crate::utils::error::FlamegraphError;
use inferno::flamegraph::{self, Options};
use log::info;

/// Flamegraph configuration
#[derive(Debug, Clone, PartialEq)]
pub struct FlamegraphConfig {
    pub title: String,

    /// Image width in pixels
    pub width: usize,

    /// Shown under the title, e.g. the sampled thread
    pub subtitle: Option<String>,
}

impl Default for FlamegraphConfig {
    fn default() -> Self {
        Self {
            title: "Sampled Call Tree".to_string(),
            width: 1200,
            subtitle: None,
        }
    }
}

impl FlamegraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

/// Folded-stack lines (`a;b;c 1500`) for every node with own time
///
/// Usable directly with external flamegraph tooling.
pub fn to_folded_lines(tree: &CallTree) -> Vec<String> {
    build_collapsed_stacks(tree)
        .iter()
        .map(|stack| stack.to_line())
        .collect()
}

/// Generate an SVG flamegraph from a call tree
///
/// **Public** - main entry point for flamegraph generation
///
/// # Arguments
/// * `tree` - Call tree, usually after transformations
/// * `config` - Optional configuration (uses defaults if None)
///
/// # Returns
/// SVG document as a string
///
/// # Errors
/// * `FlamegraphError::EmptyTree` - No node carries own time
/// * `FlamegraphError::Render` - inferno failed to render the folded stacks
/// * `FlamegraphError::InvalidUtf8` - inferno produced non UTF-8 output
pub fn generate_flamegraph(
    tree: &CallTree,
    config: Option<&FlamegraphConfig>,
) -> Result<String, FlamegraphError> {
    let lines = to_folded_lines(tree);
    if lines.is_empty() {
        return Err(FlamegraphError::EmptyTree);
    }

    let config = config.cloned().unwrap_or_default();
    info!("Generating flamegraph with {} stacks", lines.len());

    let mut options = Options::default();
    options.title = config.title;
    options.subtitle = config.subtitle;
    options.count_name = "us".to_string();
    options.image_width = Some(config.width);

    let mut svg = Vec::new();
    flamegraph::from_lines(&mut options, lines.iter().map(String::as_str), &mut svg)
        .map_err(|e| FlamegraphError::Render(e.to_string()))?;
    let svg = String::from_utf8(svg)?;

    info!("Flamegraph generated successfully ({} bytes)", svg.len());
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::Frame;
    use crate::tree::Node;
    use std::time::Duration;

    fn tree() -> CallTree {
        CallTree::new(
            vec![Node::new(
                Frame::new("app.Main"),
                Duration::ZERO,
                2,
                vec![
                    Node::leaf(Frame::new("app.Parse"), Duration::from_millis(3), 1),
                    Node::leaf(Frame::new("app.Write"), Duration::from_millis(1), 1),
                ],
            )],
            Duration::from_millis(4),
            2,
        )
    }

    #[test]
    fn test_folded_lines() {
        assert_eq!(
            to_folded_lines(&tree()),
            vec!["app.Main;app.Parse 3000", "app.Main;app.Write 1000"]
        );
    }

    #[test]
    fn test_generate_flamegraph() {
        let config = FlamegraphConfig::new().with_title("Unit Test");
        let svg = generate_flamegraph(&tree(), Some(&config)).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Unit Test"));
        assert!(svg.contains("app.Parse"));
    }

    #[test]
    fn test_markup_in_symbols_renders() {
        let tree = CallTree::new(
            vec![Node::leaf(
                Frame::new("app.Cache<K, V>.get&put"),
                Duration::from_millis(2),
                1,
            )],
            Duration::from_millis(2),
            1,
        );
        let svg = generate_flamegraph(&tree, None).unwrap();
        assert!(svg.contains("app.Cache&lt;K, V&gt;.get&amp;put"));
    }

    #[test]
    fn test_render_error_message() {
        let err = FlamegraphError::Render("unexpected end of stream".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to render flamegraph: unexpected end of stream"
        );
    }

    #[test]
    fn test_empty_tree_is_rejected() {
        let empty = CallTree::new(Vec::new(), Duration::from_millis(10), 0);
        assert!(matches!(
            generate_flamegraph(&empty, None),
            Err(FlamegraphError::EmptyTree)
        ));
    }
}
